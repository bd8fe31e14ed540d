use ethereum_types::U256;

use crate::{
    common::{address_to_u256, u256_to_address, StatusCode},
    config::Config,
    frame::Frame,
    host::Host,
    message::TxContext,
};

fn host_err(_: anyhow::Error) -> StatusCode {
    StatusCode::InternalError
}

pub(crate) fn address(frame: &mut Frame) -> Result<(), StatusCode> {
    frame.stack.push(address_to_u256(frame.contract_address))
}

pub(crate) fn caller(frame: &mut Frame) -> Result<(), StatusCode> {
    frame.stack.push(address_to_u256(frame.caller))
}

pub(crate) fn callvalue(frame: &mut Frame) -> Result<(), StatusCode> {
    frame.stack.push(frame.value)
}

pub(crate) fn origin(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(address_to_u256(tx.tx_origin))
}

pub(crate) fn coinbase(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(address_to_u256(tx.block_coinbase))
}

pub(crate) fn gasprice(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(tx.tx_gas_price)
}

pub(crate) fn timestamp(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(U256::from(tx.block_timestamp))
}

pub(crate) fn number(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(U256::from(tx.block_number))
}

pub(crate) fn difficulty(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(tx.block_difficulty)
}

pub(crate) fn gaslimit(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(U256::from(tx.block_gas_limit))
}

pub(crate) fn chainid(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(tx.chain_id)
}

pub(crate) fn basefee(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(tx.block_base_fee)
}

pub(crate) fn blobbasefee(frame: &mut Frame, tx: &TxContext) -> Result<(), StatusCode> {
    frame.stack.push(tx.blob_base_fee)
}

pub(crate) fn blobhash(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    let index = frame.stack.pop()?;
    let hash = if index > U256::from(usize::MAX) {
        None
    } else {
        host.blob_hash(index.as_usize()).map_err(host_err)?
    };
    frame.stack.push(match hash {
        Some(h) => U256::from_big_endian(h.as_bytes()),
        None => U256::zero(),
    })
}

pub(crate) fn selfbalance(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    let balance = host.get_balance(frame.contract_address).map_err(host_err)?;
    frame.stack.push(balance)
}

/// Charges the EIP-2929 cold-access surcharge for `address` if active;
/// shared by BALANCE, EXTCODESIZE, EXTCODECOPY, EXTCODEHASH, SELFDESTRUCT.
fn charge_cold_account(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
    address: ethereum_types::Address,
) -> Result<(), StatusCode> {
    crate::access_list::charge_account_access(frame, host, config, address)
}

pub(crate) fn balance(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
) -> Result<(), StatusCode> {
    let address = u256_to_address(frame.stack.pop()?);
    charge_cold_account(frame, host, config, address)?;
    let balance = host.get_balance(address).map_err(host_err)?;
    frame.stack.push(balance)
}

pub(crate) fn extcodesize(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
) -> Result<(), StatusCode> {
    let address = u256_to_address(frame.stack.pop()?);
    charge_cold_account(frame, host, config, address)?;
    let size = host.get_code_size(address).map_err(host_err)?;
    frame.stack.push(U256::from(size))
}

pub(crate) fn extcodehash(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
) -> Result<(), StatusCode> {
    let address = u256_to_address(frame.stack.pop()?);
    charge_cold_account(frame, host, config, address)?;
    let hash = host.get_code_hash(address).map_err(host_err)?;
    frame.stack.push(U256::from_big_endian(hash.as_bytes()))
}

pub(crate) fn extcodecopy(
    frame: &mut Frame,
    host: &mut dyn Host,
    config: &Config,
) -> Result<(), StatusCode> {
    let address = u256_to_address(frame.stack.pop()?);
    let dst = frame.stack.pop()?;
    let src_offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;

    frame.charge_memory(dst, size)?;
    if !size.is_zero() {
        let words = (crate::frame::word_to_u64(size) + 31) / 32;
        frame.charge_gas(3 * words)?;
    }
    charge_cold_account(frame, host, config, address)?;

    if size.is_zero() {
        return Ok(());
    }
    let code = host.get_code(address).map_err(host_err)?;
    let len = crate::frame::word_to_u64(size) as usize;
    let start = core::cmp::min(U256::from(code.len()), src_offset).as_usize();
    let copy_len = core::cmp::min(len, code.len().saturating_sub(start));

    let mut buf = vec![0u8; len];
    if copy_len > 0 {
        buf[..copy_len].copy_from_slice(&code[start..start + copy_len]);
    }
    frame.memory.write(crate::frame::word_to_u64(dst), &buf)
}

/// Only the last 256 block hashes are available, matching the base
/// protocol's BLOCKHASH window.
pub(crate) fn blockhash(
    frame: &mut Frame,
    host: &mut dyn Host,
    tx: &TxContext,
) -> Result<(), StatusCode> {
    let number = frame.stack.pop()?;
    let upper_bound = tx.block_number;
    let lower_bound = upper_bound.saturating_sub(256);

    let hash = if number <= U256::from(u64::MAX) {
        let n = number.as_u64();
        if (lower_bound..upper_bound).contains(&n) {
            host.get_block_hash(n).map_err(host_err)?
        } else {
            ethereum_types::H256::zero()
        }
    } else {
        ethereum_types::H256::zero()
    };

    frame.stack.push(U256::from_big_endian(hash.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::Address;
    use hex_literal::hex;

    #[test]
    fn u256_to_address_conversion() {
        assert_eq!(
            u256_to_address(0x42.into()),
            Address::from(hex!("0000000000000000000000000000000000000042"))
        );
    }
}
