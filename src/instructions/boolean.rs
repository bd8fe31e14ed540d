use ethereum_types::U256;
use i256::I256;

use crate::{common::StatusCode, stack::Stack};

#[inline]
pub(crate) fn lt(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(if a.lt(&b) { U256::one() } else { U256::zero() })
}

#[inline]
pub(crate) fn gt(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(if a.gt(&b) { U256::one() } else { U256::zero() })
}

#[inline]
pub(crate) fn slt(stack: &mut Stack) -> Result<(), StatusCode> {
    let a: I256 = stack.pop()?.into();
    let b: I256 = stack.pop()?.into();
    stack.push(if a.lt(&b) { U256::one() } else { U256::zero() })
}

#[inline]
pub(crate) fn sgt(stack: &mut Stack) -> Result<(), StatusCode> {
    let a: I256 = stack.pop()?.into();
    let b: I256 = stack.pop()?.into();
    stack.push(if a.gt(&b) { U256::one() } else { U256::zero() })
}

#[inline]
pub(crate) fn eq(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(if a.eq(&b) { U256::one() } else { U256::zero() })
}

#[inline]
pub(crate) fn iszero(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    stack.push(if a.is_zero() { U256::one() } else { U256::zero() })
}

#[inline]
pub(crate) fn and(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(a & b)
}

#[inline]
pub(crate) fn or(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(a | b)
}

#[inline]
pub(crate) fn xor(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(a ^ b)
}

#[inline]
pub(crate) fn not(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    stack.push(!a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slt_respects_sign() {
        let mut s = Stack::new();
        s.push(U256::one()).unwrap(); // b = 1
        s.push(U256::MAX).unwrap(); // a = -1
        slt(&mut s).unwrap();
        assert_eq!(s.pop().unwrap(), U256::one());
    }

    #[test]
    fn iszero_of_zero() {
        let mut s = Stack::new();
        s.push(U256::zero()).unwrap();
        iszero(&mut s).unwrap();
        assert_eq!(s.pop().unwrap(), U256::one());
    }
}
