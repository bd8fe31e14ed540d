//! SLOAD/SSTORE (EIP-2200/1283/2929 metered) and TLOAD/TSTORE (EIP-1153
//! transient storage, unmetered beyond the opcode's flat cost).

use ethereum_types::{H256, U256};

use crate::{
    access_list::charge_storage_access,
    common::{Revision, StatusCode},
    config::Config,
    frame::Frame,
    host::Host,
    message::StorageStatus,
    metadata::{COLD_SLOAD_COST, WARM_STORAGE_READ_COST},
    refund::RefundAccumulator,
};

fn host_err(_: anyhow::Error) -> StatusCode {
    StatusCode::InternalError
}

pub(crate) fn sload(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
) -> Result<(), StatusCode> {
    let key = H256(frame.stack.pop()?.into());
    let address = frame.contract_address;

    charge_storage_access(frame, host, config, address, key)?;

    let value = host.get_storage(address, key).map_err(host_err)?;
    frame.stack.push(U256::from_big_endian(value.as_bytes()))
}

/// EIP-2200/1283/2929 net-metered SSTORE.
pub(crate) fn sstore(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
    revision: Revision,
    refund: &mut RefundAccumulator,
) -> Result<(), StatusCode> {
    if frame.is_static {
        return Err(StatusCode::WriteProtection);
    }
    // EIP-1706: under net-metered SSTORE, fail fast if the call stipend is
    // already exhausted rather than letting a later underflow mask it.
    if config.sstore_gas_metering && frame.gas_remaining <= 2300 {
        return Err(StatusCode::OutOfGas);
    }

    let key = H256(frame.stack.pop()?.into());
    let value = H256(frame.stack.pop()?.into());

    let mut cost = 0u64;
    if config.has_access_list {
        let status = host
            .access_storage(frame.contract_address, key)
            .map_err(host_err)?;
        if status == crate::message::AccessStatus::Cold {
            cost = COLD_SLOAD_COST;
        }
    }

    let status = host
        .set_storage(frame.contract_address, key, value)
        .map_err(host_err)?;

    let total_cost = match status {
        StorageStatus::Unchanged | StorageStatus::ModifiedAgain => {
            if config.has_access_list {
                cost + WARM_STORAGE_READ_COST
            } else if revision == Revision::Istanbul {
                800
            } else if revision == Revision::Constantinople {
                200
            } else {
                5000
            }
        }
        StorageStatus::Modified | StorageStatus::Deleted => {
            if config.has_access_list {
                cost + 5000 - COLD_SLOAD_COST
            } else {
                5000
            }
        }
        StorageStatus::Added => cost + 20000,
    };
    frame.charge_gas(total_cost)?;

    if config.sstore_gas_metering {
        apply_sstore_refund(host, frame.contract_address, key, status, revision, refund)
            .map_err(host_err)?;
    } else if status == StorageStatus::Deleted {
        refund.add(config.refund_sstore_clears);
    }

    Ok(())
}

/// EIP-2200's refund schedule compares the slot's current/original values.
fn apply_sstore_refund(
    host: &mut dyn Host,
    address: ethereum_types::Address,
    key: H256,
    status: StorageStatus,
    revision: Revision,
    refund: &mut RefundAccumulator,
) -> anyhow::Result<()> {
    let clear_refund: i64 = if revision >= Revision::London { 4800 } else { 15000 };

    match status {
        StorageStatus::Added | StorageStatus::Unchanged => {}
        StorageStatus::Deleted => refund.add(clear_refund),
        StorageStatus::Modified | StorageStatus::ModifiedAgain => {
            let original = host.get_original_storage(address, key)?;
            let current = host.get_storage(address, key)?;
            if !original.is_zero() && current.is_zero() {
                refund.add(clear_refund);
            }
        }
    }
    Ok(())
}

pub(crate) fn tload(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    let key = H256(frame.stack.pop()?.into());
    let value = host
        .get_transient_storage(frame.contract_address, key)
        .map_err(host_err)?;
    frame.stack.push(U256::from_big_endian(value.as_bytes()))
}

pub(crate) fn tstore(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    if frame.is_static {
        return Err(StatusCode::WriteProtection);
    }
    let key = H256(frame.stack.pop()?.into());
    let value = H256(frame.stack.pop()?.into());
    host.set_transient_storage(frame.contract_address, key, value)
        .map_err(host_err)
}
