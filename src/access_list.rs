//! Thin gas-charging layer over the Host's own warm/cold bookkeeping
//! (EIP-2929). There is no separate core-owned access-list structure: the
//! Host already owns `access_account`/`access_storage` and reports the
//! previous status, so all the core needs is to turn a cold result into
//! the correct extra gas charge.

use ethereum_types::{Address, H256};

use crate::{
    common::StatusCode, config::Config, frame::Frame, host::Host,
    message::AccessStatus, metadata::ADDITIONAL_COLD_ACCOUNT_ACCESS_COST,
    metadata::ADDITIONAL_COLD_SLOAD_COST,
};

fn host_err(_: anyhow::Error) -> StatusCode {
    StatusCode::InternalError
}

fn charge(frame: &mut Frame, amount: u64) -> Result<(), StatusCode> {
    let amount = amount as i64;
    if frame.gas_remaining < amount {
        return Err(StatusCode::OutOfGas);
    }
    frame.gas_remaining -= amount;
    Ok(())
}

/// Charges the EIP-2929 cold-access surcharge for touching `address`, if
/// the access list is active at this revision and the address is cold.
/// No-op (and no gas charge) before Berlin, since the opcode's constant
/// cost already reflects the pre-Berlin flat price.
pub fn charge_account_access(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
    address: Address,
) -> Result<(), StatusCode> {
    if !config.has_access_list {
        return Ok(());
    }
    let status = host.access_account(address).map_err(host_err)?;
    if status == AccessStatus::Cold {
        charge(frame, ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
    }
    Ok(())
}

/// Charges the EIP-2929 cold-access surcharge for `(address, key)`.
pub fn charge_storage_access(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
    address: Address,
    key: H256,
) -> Result<(), StatusCode> {
    if !config.has_access_list {
        return Ok(());
    }
    let status = host.access_storage(address, key).map_err(host_err)?;
    if status == AccessStatus::Cold {
        charge(frame, ADDITIONAL_COLD_SLOAD_COST)?;
    }
    Ok(())
}
