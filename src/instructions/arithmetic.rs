use core::convert::TryInto;

use ethereum_types::{U256, U512};
use i256::I256;

use crate::{common::Revision, common::StatusCode, frame::Frame, stack::Stack};

pub(crate) fn add(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(a.overflowing_add(b).0)
}

pub(crate) fn mul(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(a.overflowing_mul(b).0)
}

pub(crate) fn sub(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(a.overflowing_sub(b).0)
}

pub(crate) fn div(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(if b.is_zero() { U256::zero() } else { a / b })
}

pub(crate) fn sdiv(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = I256::from(stack.pop()?);
    let b = I256::from(stack.pop()?);
    stack.push((a / b).into())
}

pub(crate) fn modulo(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    stack.push(if b.is_zero() { U256::zero() } else { a % b })
}

pub(crate) fn smod(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;
    let v = if b.is_zero() {
        U256::zero()
    } else {
        (I256::from(a) % I256::from(b)).into()
    };
    stack.push(v)
}

pub(crate) fn addmod(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = U512::from(stack.pop()?);
    let b = U512::from(stack.pop()?);
    let c = U512::from(stack.pop()?);
    let v = if c.is_zero() {
        U256::zero()
    } else {
        ((a + b) % c).try_into().unwrap()
    };
    stack.push(v)
}

pub(crate) fn mulmod(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = U512::from(stack.pop()?);
    let b = U512::from(stack.pop()?);
    let c = U512::from(stack.pop()?);
    let v = if c.is_zero() {
        U256::zero()
    } else {
        ((a * b) % c).try_into().unwrap()
    };
    stack.push(v)
}

fn log2floor(value: U256) -> u64 {
    debug_assert!(!value.is_zero());
    let mut l: u64 = 256;
    for i in 0..4 {
        let i = 3 - i;
        if value.0[i] == 0u64 {
            l -= 64;
        } else {
            l -= value.0[i].leading_zeros() as u64;
            return if l == 0 { l } else { l - 1 };
        }
    }
    l
}

/// EXP's dynamic gas scales with the byte length of the exponent: 50
/// gas/byte post-Spurious (EIP-160), 10 gas/byte before.
pub(crate) fn exp(frame: &mut Frame, revision: Revision) -> Result<(), StatusCode> {
    let mut base = frame.stack.pop()?;
    let mut power = frame.stack.pop()?;

    if !power.is_zero() {
        let per_byte = if revision >= Revision::Spurious { 50 } else { 10 };
        let additional_gas = per_byte * (log2floor(power) / 8 + 1);
        frame.charge_gas(additional_gas)?;
    }

    let mut v = U256::one();
    while !power.is_zero() {
        if !(power & U256::one()).is_zero() {
            v = v.overflowing_mul(base).0;
        }
        power >>= 1;
        base = base.overflowing_mul(base).0;
    }

    frame.stack.push(v)
}

pub(crate) fn signextend(stack: &mut Stack) -> Result<(), StatusCode> {
    let a = stack.pop()?;
    let b = stack.pop()?;

    let v = if a > U256::from(32) {
        b
    } else {
        let mut v = U256::zero();
        let len: usize = a.as_usize();
        let t: usize = 8 * (len + 1) - 1;
        let t_bit_mask = U256::one() << t;
        let t_value = (b & t_bit_mask) >> t;
        for i in 0..256 {
            let bit_mask = U256::one() << i;
            let i_value = (b & bit_mask) >> i;
            if i <= t {
                v = v.overflowing_add(i_value << i).0;
            } else {
                v = v.overflowing_add(t_value << i).0;
            }
        }
        v
    };

    stack.push(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_by_zero_is_zero() {
        let mut s = Stack::new();
        s.push(U256::zero()).unwrap();
        s.push(U256::from(10)).unwrap();
        div(&mut s).unwrap();
        assert_eq!(s.pop().unwrap(), U256::zero());
    }

    #[test]
    fn signextend_sign_propagates() {
        let mut s = Stack::new();
        s.push(U256::from(0xff)).unwrap(); // value with high bit of byte 0 set
        s.push(U256::zero()).unwrap(); // extend from byte 0
        signextend(&mut s).unwrap();
        assert_eq!(s.pop().unwrap(), U256::MAX);
    }
}
