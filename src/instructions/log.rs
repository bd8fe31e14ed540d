use arrayvec::ArrayVec;
use ethereum_types::H256;

use crate::{common::StatusCode, frame::word_to_u64, frame::Frame, host::Host};

fn host_err(_: anyhow::Error) -> StatusCode {
    StatusCode::InternalError
}

fn log(frame: &mut Frame, host: &mut dyn Host, num_topics: usize) -> Result<(), StatusCode> {
    if frame.is_static {
        return Err(StatusCode::WriteProtection);
    }

    let offset = frame.stack.pop()?;
    let size = frame.stack.pop()?;

    frame.charge_memory(offset, size)?;
    if !size.is_zero() {
        let cost = 8 * word_to_u64(size);
        frame.charge_gas(cost)?;
    }

    let mut topics = ArrayVec::<H256, 4>::new();
    for _ in 0..num_topics {
        topics.push(H256(frame.stack.pop()?.into()));
    }

    let data = if size.is_zero() {
        bytes::Bytes::new()
    } else {
        bytes::Bytes::copy_from_slice(frame.memory.read(word_to_u64(offset), word_to_u64(size)))
    };

    host.emit_log(frame.contract_address, data, &topics)
        .map_err(host_err)
}

pub(crate) fn log0(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    log(frame, host, 0)
}

pub(crate) fn log1(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    log(frame, host, 1)
}

pub(crate) fn log2(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    log(frame, host, 2)
}

pub(crate) fn log3(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    log(frame, host, 3)
}

pub(crate) fn log4(frame: &mut Frame, host: &mut dyn Host) -> Result<(), StatusCode> {
    log(frame, host, 4)
}
