use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::{analyzer::AnalyzedCode, common::StatusCode, memory::Memory, stack::Stack};

/// Caps a 256-bit offset/length to `u64`, saturating rather than wrapping.
/// Any value this large will already blow `Memory::MAX_MEMORY_SIZE`, so
/// saturation (instead of a fallible conversion) keeps every call site a
/// plain expression.
pub(crate) fn word_to_u64(v: U256) -> u64 {
    if v > U256::from(u64::MAX) {
        u64::MAX
    } else {
        v.as_u64()
    }
}

/// Per-call execution state: everything an opcode handler may read or
/// mutate while the interpreter walks one frame's instruction stream.
#[derive(Debug)]
pub struct Frame {
    pub gas_remaining: i64,
    pub is_static: bool,
    pub depth: u16,

    pub contract_address: Address,
    pub caller: Address,
    pub value: U256,

    pub input: Bytes,
    pub output: Bytes,

    pub stack: Stack,
    pub memory: Memory,
    pub return_data: Bytes,

    pub ip: usize,
    pub analysis: Arc<AnalyzedCode>,
}

impl Frame {
    pub fn new(
        analysis: Arc<AnalyzedCode>,
        contract_address: Address,
        caller: Address,
        value: U256,
        input: Bytes,
        gas: i64,
        depth: u16,
        is_static: bool,
    ) -> Self {
        Self {
            gas_remaining: gas,
            is_static,
            depth,
            contract_address,
            caller,
            value,
            input,
            output: Bytes::new(),
            stack: Stack::new(),
            memory: Memory::new(),
            return_data: Bytes::new(),
            ip: 0,
            analysis,
        }
    }

    /// Deducts a flat gas amount, without touching memory.
    pub fn charge_gas(&mut self, amount: u64) -> Result<(), StatusCode> {
        let amount = amount as i64;
        if self.gas_remaining < amount {
            self.gas_remaining = 0;
            return Err(StatusCode::OutOfGas);
        }
        self.gas_remaining -= amount;
        Ok(())
    }

    /// Prices and performs the memory expansion needed to cover
    /// `[offset, offset+len)`, per the quadratic formula in 4.2/4.8. Callers
    /// read/write memory only after this succeeds.
    pub fn charge_memory(&mut self, offset: U256, len: U256) -> Result<(), StatusCode> {
        if len.is_zero() {
            return Ok(());
        }
        let offset = word_to_u64(offset);
        let len = word_to_u64(len);
        let cost = self.memory.expansion_cost(offset, len)?;
        self.charge_gas(cost)?;
        self.memory.ensure_capacity(offset, len)?;
        Ok(())
    }
}
