use ethereum_types::U256;

use crate::{common::StatusCode, stack::Stack};

/// The analyzer already decoded the immediate into `Argument::Push`, so
/// PUSH0..PUSH32 all reduce to pushing a constant.
pub(crate) fn push(stack: &mut Stack, value: U256) -> Result<(), StatusCode> {
    stack.push(value)
}

pub(crate) fn dup(stack: &mut Stack, height: u8) -> Result<(), StatusCode> {
    stack.dup(height as usize)
}

pub(crate) fn swap(stack: &mut Stack, height: u8) -> Result<(), StatusCode> {
    stack.swap(height as usize)
}

pub(crate) fn pop(stack: &mut Stack) -> Result<(), StatusCode> {
    stack.pop().map(drop)
}
