use ethereum_types::U256;
use sha3::{Digest, Keccak256};

use crate::{common::StatusCode, frame::word_to_u64, frame::Frame};

fn num_words(len: u64) -> u64 {
    (len + 31) / 32
}

pub(crate) fn mload(frame: &mut Frame) -> Result<(), StatusCode> {
    let offset = frame.stack.pop()?;
    frame.charge_memory(offset, U256::from(32))?;
    let offset = word_to_u64(offset);
    let value = U256::from_big_endian(frame.memory.read(offset, 32));
    frame.stack.push(value)
}

pub(crate) fn mstore(frame: &mut Frame) -> Result<(), StatusCode> {
    let offset = frame.stack.pop()?;
    let value = frame.stack.pop()?;
    frame.charge_memory(offset, U256::from(32))?;
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    frame.memory.write(word_to_u64(offset), &buf)
}

pub(crate) fn mstore8(frame: &mut Frame) -> Result<(), StatusCode> {
    let offset = frame.stack.pop()?;
    let value = frame.stack.pop()?;
    frame.charge_memory(offset, U256::one())?;
    frame.memory.write_byte(word_to_u64(offset), value.low_u32() as u8)
}

pub(crate) fn msize(frame: &mut Frame) -> Result<(), StatusCode> {
    frame.stack.push(U256::from(frame.memory.len()))
}

/// EIP-5656.
pub(crate) fn mcopy(frame: &mut Frame) -> Result<(), StatusCode> {
    let dst = frame.stack.pop()?;
    let src = frame.stack.pop()?;
    let len = frame.stack.pop()?;
    let max_offset = dst.max(src);
    frame.charge_memory(max_offset, len)?;
    if len.is_zero() {
        return Ok(());
    }
    let cost = 3 * num_words(word_to_u64(len));
    frame.charge_gas(cost)?;
    frame
        .memory
        .copy_within(word_to_u64(src), word_to_u64(dst), word_to_u64(len))
}

pub(crate) fn keccak256(frame: &mut Frame) -> Result<(), StatusCode> {
    let offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;
    frame.charge_memory(offset, size)?;
    if !size.is_zero() {
        let cost = 6 * num_words(word_to_u64(size));
        frame.charge_gas(cost)?;
    }
    let data = frame.memory.read(word_to_u64(offset), word_to_u64(size));
    let hash = Keccak256::digest(data);
    frame.stack.push(U256::from_big_endian(&hash))
}

pub(crate) fn calldataload(frame: &mut Frame) -> Result<(), StatusCode> {
    let index = frame.stack.pop()?;
    let input = &frame.input;
    let value = if index > U256::from(input.len()) {
        U256::zero()
    } else {
        let start = index.as_usize();
        let end = core::cmp::min(start + 32, input.len());
        let mut buf = [0u8; 32];
        buf[..end - start].copy_from_slice(&input[start..end]);
        U256::from_big_endian(&buf)
    };
    frame.stack.push(value)
}

pub(crate) fn calldatasize(frame: &mut Frame) -> Result<(), StatusCode> {
    frame.stack.push(U256::from(frame.input.len()))
}

/// Shared by CALLDATACOPY/CODECOPY/RETURNDATACOPY: copies `size` bytes from
/// `src` starting at `src_offset` into memory at `dst_offset`, zero-filling
/// past the end of `src`.
fn copy_padded(frame: &mut Frame, dst_offset: U256, src_offset: U256, size: U256, src: &[u8]) -> Result<(), StatusCode> {
    frame.charge_memory(dst_offset, size)?;
    if size.is_zero() {
        return Ok(());
    }
    let cost = 3 * num_words(word_to_u64(size));
    frame.charge_gas(cost)?;

    let dst = word_to_u64(dst_offset) as usize;
    let len = word_to_u64(size) as usize;
    let start = core::cmp::min(U256::from(src.len()), src_offset).as_usize();
    let copy_len = core::cmp::min(len, src.len().saturating_sub(start));

    let mut buf = vec![0u8; len];
    if copy_len > 0 {
        buf[..copy_len].copy_from_slice(&src[start..start + copy_len]);
    }
    frame.memory.write(dst as u64, &buf)
}

pub(crate) fn calldatacopy(frame: &mut Frame) -> Result<(), StatusCode> {
    let dst = frame.stack.pop()?;
    let src_offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;
    let input = frame.input.clone();
    copy_padded(frame, dst, src_offset, size, &input)
}

pub(crate) fn codesize(frame: &mut Frame) -> Result<(), StatusCode> {
    frame.stack.push(U256::from(frame.analysis.code.len()))
}

pub(crate) fn codecopy(frame: &mut Frame) -> Result<(), StatusCode> {
    let dst = frame.stack.pop()?;
    let src_offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;
    let code = frame.analysis.code.clone();
    copy_padded(frame, dst, src_offset, size, &code)
}

pub(crate) fn returndatasize(frame: &mut Frame) -> Result<(), StatusCode> {
    frame.stack.push(U256::from(frame.return_data.len()))
}

pub(crate) fn returndatacopy(frame: &mut Frame) -> Result<(), StatusCode> {
    let dst = frame.stack.pop()?;
    let src_offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;

    if src_offset > U256::from(frame.return_data.len())
        || src_offset + size > U256::from(frame.return_data.len())
    {
        return Err(StatusCode::OutOfOffset);
    }

    let return_data = frame.return_data.clone();
    frame.charge_memory(dst, size)?;
    if size.is_zero() {
        return Ok(());
    }
    let cost = 3 * num_words(word_to_u64(size));
    frame.charge_gas(cost)?;
    let start = word_to_u64(src_offset) as usize;
    let len = word_to_u64(size) as usize;
    frame.memory.write(word_to_u64(dst), &return_data[start..start + len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{analyzer::AnalyzedCode, common::Revision};

    fn frame() -> Frame {
        let analysis = Arc::new(
            AnalyzedCode::analyze(bytes::Bytes::new(), Revision::Cancun, 0x6000).unwrap(),
        );
        Frame::new(
            analysis,
            Default::default(),
            Default::default(),
            U256::zero(),
            bytes::Bytes::new(),
            1_000_000,
            0,
            false,
        )
    }

    #[test]
    fn mstore_then_mload_round_trips() {
        let mut f = frame();
        f.stack.push(U256::from(42)).unwrap();
        f.stack.push(U256::zero()).unwrap();
        mstore(&mut f).unwrap();
        f.stack.push(U256::zero()).unwrap();
        mload(&mut f).unwrap();
        assert_eq!(f.stack.pop().unwrap(), U256::from(42));
    }

    #[test]
    fn calldataload_past_end_is_zero_padded() {
        let mut f = frame();
        f.input = bytes::Bytes::from_static(&[0xff; 4]);
        f.stack.push(U256::from(2)).unwrap();
        calldataload(&mut f).unwrap();
        let mut expected = [0u8; 32];
        expected[0] = 0xff;
        expected[1] = 0xff;
        assert_eq!(f.stack.pop().unwrap(), U256::from_big_endian(&expected));
    }
}
