//! CALL/CALLCODE/DELEGATECALL/STATICCALL and CREATE/CREATE2: everything that
//! hands control to a freshly recursed `Evm::call` rather than just mutating
//! the current frame.

use std::cmp::min;

use ethereum_types::{H256, U256};

use crate::{
    common::{address_to_u256, u256_to_address, CallKind, Revision, StatusCode},
    evm::Evm,
    frame::{word_to_u64, Frame},
    host::Host,
    message::CallParams,
    metadata::ADDITIONAL_COLD_ACCOUNT_ACCESS_COST,
};

const CALL_VALUE_COST: u64 = 9000;
const CALL_STIPEND: i64 = 2300;
const NEW_ACCOUNT_COST: u64 = 25000;

fn host_err(_: anyhow::Error) -> StatusCode {
    StatusCode::InternalError
}

pub(crate) fn call(
    frame: &mut Frame,
    evm: &mut Evm,
    host: &mut dyn Host,
    kind: CallKind,
    block_correction: i64,
) -> Result<(), StatusCode> {
    let gas = frame.stack.pop()?;
    let dst = u256_to_address(frame.stack.pop()?);
    // Whether `value` is even on the stack depends on the opcode itself
    // (STATICCALL/DELEGATECALL never carry one), not on whether the current
    // frame happens to be static — a plain CALL/CALLCODE executed inside a
    // STATICCALL subtree still pops its value operand; it just isn't
    // allowed to be non-zero (checked below).
    let value = if matches!(kind, CallKind::DelegateCall | CallKind::StaticCall) {
        U256::zero()
    } else {
        frame.stack.pop()?
    };
    let has_value = !value.is_zero();
    let input_offset = frame.stack.pop()?;
    let input_size = frame.stack.pop()?;
    let output_offset = frame.stack.pop()?;
    let output_size = frame.stack.pop()?;

    // Assume failure; overwritten on success below.
    frame.stack.push(U256::zero())?;

    if has_value && frame.is_static && matches!(kind, CallKind::Call | CallKind::CallCode) {
        return Err(StatusCode::WriteProtection);
    }

    if evm.config().has_access_list {
        let status = host.access_account(dst).map_err(host_err)?;
        if status == crate::message::AccessStatus::Cold {
            frame.charge_gas(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
        }
    }

    frame.charge_memory(input_offset, input_size)?;
    let input = if input_size.is_zero() {
        bytes::Bytes::new()
    } else {
        bytes::Bytes::copy_from_slice(
            frame
                .memory
                .read(word_to_u64(input_offset), word_to_u64(input_size)),
        )
    };
    frame.charge_memory(output_offset, output_size)?;

    let is_delegate = matches!(kind, CallKind::DelegateCall);
    let is_callcode = matches!(kind, CallKind::CallCode);
    let caller = if is_delegate { frame.caller } else { frame.contract_address };
    let call_value = if is_delegate { frame.value } else { value };
    // ADDRESS/storage/balance context: stays on the current frame's own
    // address for CALLCODE/DELEGATECALL, moves to the callee for CALL and
    // STATICCALL.
    let to = if is_delegate || is_callcode { frame.contract_address } else { dst };

    let mut cost = if has_value { CALL_VALUE_COST } else { 0 };
    if matches!(kind, CallKind::Call)
        && (has_value || evm.revision() < Revision::Spurious)
        && !host.account_exists(dst).map_err(host_err)?
    {
        cost += NEW_ACCOUNT_COST;
    }
    frame.charge_gas(cost)?;

    // `frame.gas_remaining` was debited for the whole basic block's static
    // cost up front at `BeginBlock`, including any instructions after this
    // CALL (CALL is not a block boundary). `block_correction` is the slice
    // of that prepayment not yet "really" spent as of this instruction;
    // adding it back gives the gas the caller would actually have left
    // under pure per-instruction charging, which is what EIP-150's 63/64
    // rule must be computed against (Testable Property 8).
    let available_gas = frame.gas_remaining + block_correction;

    let mut child_gas = if gas > U256::from(i64::MAX) { i64::MAX } else { gas.as_u64() as i64 };
    if evm.revision() >= Revision::Tangerine {
        // EIP-150: a call may only forward 63/64 of the remaining gas.
        child_gas = min(child_gas, available_gas - available_gas / 64);
    } else if child_gas > available_gas {
        return Err(StatusCode::OutOfGas);
    }

    if has_value {
        child_gas += CALL_STIPEND;
        frame.gas_remaining += CALL_STIPEND;
    }

    let is_static = frame.is_static || matches!(kind, CallKind::StaticCall);

    let params = CallParams {
        kind,
        caller,
        to,
        code_address: dst,
        value: call_value,
        input,
        gas: child_gas,
        is_static,
    };

    let result = evm.call(host, params, frame.depth + 1);

    frame.return_data = result.output.clone();
    *frame.stack.get_mut(0)? = if result.is_success() { U256::one() } else { U256::zero() };

    if !output_size.is_zero() {
        let copy_len = min(word_to_u64(output_size) as usize, result.output.len());
        if copy_len > 0 {
            frame
                .memory
                .write(word_to_u64(output_offset), &result.output[..copy_len])?;
        }
    }

    let gas_used = child_gas - result.gas_left;
    frame.charge_gas(gas_used.max(0) as u64)?;

    Ok(())
}

pub(crate) fn create(
    frame: &mut Frame,
    evm: &mut Evm,
    host: &mut dyn Host,
    create2: bool,
    block_correction: i64,
) -> Result<(), StatusCode> {
    if frame.is_static {
        return Err(StatusCode::WriteProtection);
    }

    let endowment = frame.stack.pop()?;
    let init_code_offset = frame.stack.pop()?;
    let init_code_size = frame.stack.pop()?;

    if let Some(max_initcode_size) = evm.config().max_initcode_size {
        if init_code_size > U256::from(max_initcode_size) {
            return Err(StatusCode::OutOfGas);
        }
    }

    frame.charge_memory(init_code_offset, init_code_size)?;

    let words = (word_to_u64(init_code_size) + 31) / 32;
    if evm.config().max_initcode_size.is_some() {
        // EIP-3860: metered regardless of CREATE vs CREATE2, on top of
        // CREATE2's own per-word hashing cost below.
        frame.charge_gas(words * 2)?;
    }

    let kind = if create2 {
        let salt = frame.stack.pop()?;
        frame.charge_gas(words * 6)?;
        CallKind::Create2 { salt: H256(salt.into()) }
    } else {
        CallKind::Create
    };

    frame.stack.push(U256::zero())?;
    frame.return_data = bytes::Bytes::new();

    let init_code = if init_code_size.is_zero() {
        bytes::Bytes::new()
    } else {
        bytes::Bytes::copy_from_slice(
            frame
                .memory
                .read(word_to_u64(init_code_offset), word_to_u64(init_code_size)),
        )
    };

    // Same block-prepayment correction as `call` above: CREATE/CREATE2 are
    // not block boundaries either, so later instructions in this block may
    // already be baked into `frame.gas_remaining`'s deduction.
    let available_gas = frame.gas_remaining + block_correction;
    let child_gas = if evm.config().gas_create_divisor.is_some() {
        available_gas - available_gas / 64
    } else {
        available_gas
    };

    let params = CallParams {
        kind,
        caller: frame.contract_address,
        to: ethereum_types::Address::zero(),
        code_address: ethereum_types::Address::zero(),
        value: endowment,
        input: init_code,
        gas: child_gas,
        is_static: false,
    };

    let result = evm.call(host, params, frame.depth + 1);

    frame.charge_gas((child_gas - result.gas_left).max(0) as u64)?;
    frame.return_data = result.output;

    if result.is_success() {
        if let Some(address) = result.created_address {
            *frame.stack.get_mut(0)? = address_to_u256(address);
        }
    }

    Ok(())
}
