//! The dispatch loop: walks one frame's pre-decoded instruction stream.
//!
//! `BeginBlock` prepays the whole basic block's constant gas in one charge
//! and prechecks the block's stack bounds once, instead of paying for and
//! checking every instruction individually. The one place that prepayment
//! would otherwise leak into observable behavior is `GAS`: by the time it
//! runs, the block's remaining instructions have already been paid for, so
//! `frame.gas_remaining` alone under-reports what a per-instruction charge
//! model would show. `block_total`/`block_consumed` track how much of the
//! current block's prepayment has been "spent" so far in execution order,
//! so `GAS` can add back the unspent remainder and report the same value
//! it would under naive per-instruction charging.
use ethereum_types::U256;

use crate::{
    common::{CallKind, Revision, StatusCode},
    config::Config,
    evm::{Evm, StepAction},
    frame::Frame,
    host::Host,
    instruction::{Argument, Instruction, Op},
    instructions::{
        arithmetic, bitwise, boolean, call, control, external, log as log_ops, memory as mem,
        stack_manip, storage, sudo,
    },
    message::TxContext,
    metadata,
    opcode::OpCode,
};

pub fn interpret(frame: &mut Frame, evm: &mut Evm, host: &mut dyn Host) -> StatusCode {
    let revision = evm.revision();
    let config = evm.config().clone();
    let tx_context = match host.get_tx_context() {
        Ok(tx) => tx,
        Err(_) => return StatusCode::InternalError,
    };

    let mut block_total: u64 = 0;
    let mut block_consumed: u64 = 0;

    loop {
        let Some(instruction) = frame.analysis.instructions.get(frame.ip).copied() else {
            return StatusCode::Stop;
        };

        match instruction.op {
            Op::BeginBlock => {
                let info = instruction.block_info().unwrap_or_default();
                let height = frame.stack.len() as i16;
                if height < info.stack_req {
                    return StatusCode::StackUnderflow;
                }
                if height + info.stack_max_growth > 1024 {
                    return StatusCode::StackOverflow;
                }
                if let Err(status) = frame.charge_gas(info.gas_cost) {
                    return status;
                }
                block_total = info.gas_cost;
                block_consumed = 0;
                frame.ip += 1;
            }

            Op::Nop => frame.ip += 1,

            Op::PushJump => {
                let target = instruction
                    .jump_target()
                    .expect("analyzer only tags PushJump with a resolved target");
                if let Err(status) = control::fused_jump(frame, target) {
                    return status;
                }
            }

            Op::PushJumpi => {
                let target = instruction
                    .jump_target()
                    .expect("analyzer only tags PushJumpi with a resolved target");
                if let Err(status) = control::fused_jumpi(frame, target) {
                    return status;
                }
            }

            Op::Real(opcode) => {
                if let Some(hooks) = evm.hooks_mut() {
                    match hooks.on_step(frame, frame.ip, Some(opcode)) {
                        StepAction::Continue => {}
                        StepAction::Pause | StepAction::Abort => return StatusCode::DebugAbort,
                    }
                }

                if opcode == OpCode::STOP {
                    return StatusCode::Stop;
                }
                if opcode == OpCode::RETURN {
                    return match control::capture_output(frame) {
                        Ok(()) => StatusCode::Return,
                        Err(status) => status,
                    };
                }
                if opcode == OpCode::REVERT {
                    return match control::capture_output(frame) {
                        Ok(()) => StatusCode::Revert,
                        Err(status) => status,
                    };
                }

                let cost = match metadata::lookup(revision, opcode) {
                    Some(meta) => meta.constant_gas,
                    None => return StatusCode::InvalidOpcode,
                };

                if opcode == OpCode::GAS {
                    let true_remaining = frame.gas_remaining + block_total as i64
                        - block_consumed as i64
                        - cost as i64;
                    if let Err(status) =
                        frame.stack.push(U256::from(true_remaining.max(0) as u64))
                    {
                        return status;
                    }
                    block_consumed += cost;
                    frame.ip += 1;
                    continue;
                }
                block_consumed += cost;
                let block_correction = block_total as i64 - block_consumed as i64;

                let result = execute(
                    frame,
                    evm,
                    host,
                    &tx_context,
                    &config,
                    revision,
                    instruction,
                    opcode,
                    block_correction,
                );
                match result {
                    Ok(()) => {
                        if !matches!(opcode, OpCode::JUMP | OpCode::JUMPI) {
                            frame.ip += 1;
                        }
                    }
                    Err(status) => return status,
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn execute(
    frame: &mut Frame,
    evm: &mut Evm,
    host: &mut dyn Host,
    tx: &TxContext,
    config: &Config,
    revision: Revision,
    instruction: Instruction,
    opcode: OpCode,
    block_correction: i64,
) -> Result<(), StatusCode> {
    match opcode {
        OpCode::ADD => arithmetic::add(&mut frame.stack),
        OpCode::MUL => arithmetic::mul(&mut frame.stack),
        OpCode::SUB => arithmetic::sub(&mut frame.stack),
        OpCode::DIV => arithmetic::div(&mut frame.stack),
        OpCode::SDIV => arithmetic::sdiv(&mut frame.stack),
        OpCode::MOD => arithmetic::modulo(&mut frame.stack),
        OpCode::SMOD => arithmetic::smod(&mut frame.stack),
        OpCode::ADDMOD => arithmetic::addmod(&mut frame.stack),
        OpCode::MULMOD => arithmetic::mulmod(&mut frame.stack),
        OpCode::EXP => arithmetic::exp(frame, revision),
        OpCode::SIGNEXTEND => arithmetic::signextend(&mut frame.stack),

        OpCode::LT => boolean::lt(&mut frame.stack),
        OpCode::GT => boolean::gt(&mut frame.stack),
        OpCode::SLT => boolean::slt(&mut frame.stack),
        OpCode::SGT => boolean::sgt(&mut frame.stack),
        OpCode::EQ => boolean::eq(&mut frame.stack),
        OpCode::ISZERO => boolean::iszero(&mut frame.stack),
        OpCode::AND => boolean::and(&mut frame.stack),
        OpCode::OR => boolean::or(&mut frame.stack),
        OpCode::XOR => boolean::xor(&mut frame.stack),
        OpCode::NOT => boolean::not(&mut frame.stack),
        OpCode::BYTE => bitwise::byte(&mut frame.stack),
        OpCode::SHL => bitwise::shl(&mut frame.stack),
        OpCode::SHR => bitwise::shr(&mut frame.stack),
        OpCode::SAR => bitwise::sar(&mut frame.stack),

        OpCode::KECCAK256 => mem::keccak256(frame),

        OpCode::ADDRESS => external::address(frame),
        OpCode::BALANCE => external::balance(frame, host, config),
        OpCode::ORIGIN => external::origin(frame, tx),
        OpCode::CALLER => external::caller(frame),
        OpCode::CALLVALUE => external::callvalue(frame),
        OpCode::CALLDATALOAD => mem::calldataload(frame),
        OpCode::CALLDATASIZE => mem::calldatasize(frame),
        OpCode::CALLDATACOPY => mem::calldatacopy(frame),
        OpCode::CODESIZE => mem::codesize(frame),
        OpCode::CODECOPY => mem::codecopy(frame),
        OpCode::GASPRICE => external::gasprice(frame, tx),
        OpCode::EXTCODESIZE => external::extcodesize(frame, host, config),
        OpCode::EXTCODECOPY => external::extcodecopy(frame, host, config),
        OpCode::RETURNDATASIZE => mem::returndatasize(frame),
        OpCode::RETURNDATACOPY => mem::returndatacopy(frame),
        OpCode::EXTCODEHASH => external::extcodehash(frame, host, config),

        OpCode::BLOCKHASH => external::blockhash(frame, host, tx),
        OpCode::COINBASE => external::coinbase(frame, tx),
        OpCode::TIMESTAMP => external::timestamp(frame, tx),
        OpCode::NUMBER => external::number(frame, tx),
        // Same byte as PREVRANDAO post-Merge; the Host decides what value a
        // given block actually puts there.
        OpCode::DIFFICULTY => external::difficulty(frame, tx),
        OpCode::GASLIMIT => external::gaslimit(frame, tx),
        OpCode::CHAINID => external::chainid(frame, tx),
        OpCode::SELFBALANCE => external::selfbalance(frame, host),
        OpCode::BASEFEE => external::basefee(frame, tx),
        OpCode::BLOBHASH => external::blobhash(frame, host),
        OpCode::BLOBBASEFEE => external::blobbasefee(frame, tx),

        OpCode::POP => stack_manip::pop(&mut frame.stack),
        OpCode::MLOAD => mem::mload(frame),
        OpCode::MSTORE => mem::mstore(frame),
        OpCode::MSTORE8 => mem::mstore8(frame),
        OpCode::SLOAD => storage::sload(frame, host, config),
        OpCode::SSTORE => storage::sstore(frame, host, config, revision, evm.refund_mut()),
        OpCode::JUMP => control::jump(frame),
        OpCode::JUMPI => control::jumpi(frame),
        OpCode::PC => {
            let offset = instruction.pc().expect("analyzer tags PC with its own offset");
            frame.stack.push(U256::from(offset))
        }
        OpCode::MSIZE => mem::msize(frame),
        OpCode::JUMPDEST => Ok(()),
        OpCode::TLOAD => storage::tload(frame, host),
        OpCode::TSTORE => storage::tstore(frame, host),
        OpCode::MCOPY => mem::mcopy(frame),

        OpCode::CREATE => call::create(frame, evm, host, false, block_correction),
        OpCode::CALL => call::call(frame, evm, host, CallKind::Call, block_correction),
        OpCode::CALLCODE => call::call(frame, evm, host, CallKind::CallCode, block_correction),
        OpCode::DELEGATECALL => {
            call::call(frame, evm, host, CallKind::DelegateCall, block_correction)
        }
        OpCode::CREATE2 => call::create(frame, evm, host, true, block_correction),
        OpCode::STATICCALL => call::call(frame, evm, host, CallKind::StaticCall, block_correction),
        OpCode::SELFDESTRUCT => sudo::selfdestruct(frame, host, config, evm.refund_mut()),

        op if op.is_push() => {
            let value = match instruction.argument {
                Argument::Push(v) => v,
                _ => U256::zero(),
            };
            stack_manip::push(&mut frame.stack, value)
        }
        op if op.dup_index().is_some() => {
            stack_manip::dup(&mut frame.stack, op.dup_index().unwrap())
        }
        op if op.swap_index().is_some() => {
            stack_manip::swap(&mut frame.stack, op.swap_index().unwrap())
        }
        op if op.log_topics().is_some() => match op.log_topics().unwrap() {
            0 => log_ops::log0(frame, host),
            1 => log_ops::log1(frame, host),
            2 => log_ops::log2(frame, host),
            3 => log_ops::log3(frame, host),
            _ => log_ops::log4(frame, host),
        },

        _ => Err(StatusCode::InvalidOpcode),
    }
}
