use crate::{
    access_list::charge_account_access,
    common::{u256_to_address, StatusCode},
    config::Config,
    frame::Frame,
    host::Host,
    refund::RefundAccumulator,
};

const SELFDESTRUCT_REFUND: i64 = 24000;

fn host_err(_: anyhow::Error) -> StatusCode {
    StatusCode::InternalError
}

pub(crate) fn selfdestruct(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
    refund: &mut RefundAccumulator,
) -> Result<(), StatusCode> {
    if frame.is_static {
        return Err(StatusCode::WriteProtection);
    }

    let beneficiary = u256_to_address(frame.stack.pop()?);
    charge_account_access(frame, host, config, beneficiary)?;

    // After Tangerine Whistle, sending non-zero value to a previously
    // unknown account carries the new-account surcharge, same as CALL.
    if config.gas_suicide_new_account > 0 {
        let balance = host.get_balance(frame.contract_address).map_err(host_err)?;
        if !balance.is_zero() && !host.account_exists(beneficiary).map_err(host_err)? {
            frame.charge_gas(config.gas_suicide_new_account)?;
        }
    }

    let was_created_in_tx = host
        .was_created_in_tx(frame.contract_address)
        .map_err(host_err)?;

    if config.selfdestruct_only_in_same_tx && !was_created_in_tx {
        // EIP-6780: outside the creating transaction, SELFDESTRUCT only
        // transfers the balance, it does not delete the account.
        host.mark_for_destruction(frame.contract_address, beneficiary)
            .map_err(host_err)?;
    } else {
        host.selfdestruct(frame.contract_address, beneficiary)
            .map_err(host_err)?;
        if !config.has_reduced_refunds {
            refund.add(SELFDESTRUCT_REFUND);
        }
    }

    Err(StatusCode::Stop)
}
