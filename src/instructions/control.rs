use ethereum_types::U256;

use crate::{common::StatusCode, frame::Frame};

/// Resolves a popped JUMP/JUMPI destination to its instruction-stream index,
/// rejecting anything that is not a valid JUMPDEST.
fn resolve_target(frame: &Frame, dest: U256) -> Result<usize, StatusCode> {
    if dest > U256::from(usize::MAX) {
        return Err(StatusCode::InvalidJump);
    }
    let offset = dest.as_usize();
    if !frame.analysis.is_jumpdest(offset) {
        return Err(StatusCode::InvalidJump);
    }
    frame
        .analysis
        .jumpdest_instruction(offset)
        .ok_or(StatusCode::InvalidJump)
}

/// Unconditional dynamic jump (target not resolved at analysis time).
pub(crate) fn jump(frame: &mut Frame) -> Result<(), StatusCode> {
    let dest = frame.stack.pop()?;
    frame.ip = resolve_target(frame, dest)?;
    Ok(())
}

/// Conditional dynamic jump; falls through to the next instruction when the
/// condition is zero.
pub(crate) fn jumpi(frame: &mut Frame) -> Result<(), StatusCode> {
    let dest = frame.stack.pop()?;
    let cond = frame.stack.pop()?;
    if cond.is_zero() {
        frame.ip += 1;
    } else {
        frame.ip = resolve_target(frame, dest)?;
    }
    Ok(())
}

/// Resolves a fused `PUSH <dest>; JUMPI` pair: only the condition remains on
/// the stack, the destination having already been validated at analysis
/// time and recorded as `target`.
pub(crate) fn fused_jumpi(frame: &mut Frame, target: usize) -> Result<(), StatusCode> {
    let cond = frame.stack.pop()?;
    frame.ip = if cond.is_zero() { frame.ip + 1 } else { target };
    Ok(())
}

/// Resolves a fused `PUSH <dest>; JUMP` pair: the destination was already
/// validated at analysis time, so this is unconditional and infallible.
pub(crate) fn fused_jump(frame: &mut Frame, target: usize) -> Result<(), StatusCode> {
    frame.ip = target;
    Ok(())
}

/// RETURN/REVERT: captures `[offset, offset+size)` of memory as the frame's
/// output before the interpreter halts.
pub(crate) fn capture_output(frame: &mut Frame) -> Result<(), StatusCode> {
    let offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;
    frame.charge_memory(offset, size)?;
    if size.is_zero() {
        frame.output = bytes::Bytes::new();
        return Ok(());
    }
    let offset = crate::frame::word_to_u64(offset);
    let len = crate::frame::word_to_u64(size);
    frame.output = bytes::Bytes::copy_from_slice(frame.memory.read(offset, len));
    Ok(())
}
