//! Bytecode analysis: one linear pass over a contract's code producing a
//! pre-decoded instruction stream, a jump-destination set, and per-block
//! gas/stack bounds.

use bytes::Bytes;
use ethereum_types::U256;
use log::trace;

use crate::{
    common::{Revision, StatusCode},
    instruction::{Argument, BlockInfo, Instruction, Op},
    metadata,
    opcode::OpCode,
};

/// Deployed-code size limit, EIP-170.
pub const MAX_CODE_SIZE: usize = 0x6000;
/// Initcode size limit, EIP-3860 (Shanghai+); callers select this instead
/// of `MAX_CODE_SIZE` when analyzing a CREATE/CREATE2 payload.
pub const MAX_INITCODE_SIZE: usize = 2 * 0x6000;

/// The result of analyzing one bytecode under one revision: immutable,
/// cheaply shareable (`Arc`-wrapped by the cache) between frames running
/// the same contract concurrently.
#[derive(Debug)]
pub struct AnalyzedCode {
    pub instructions: Vec<Instruction>,
    jumpdest: Vec<bool>,
    jumpdest_instr: std::collections::HashMap<usize, usize>,
    pub code: Bytes,
}

impl AnalyzedCode {
    /// Whether `offset` is a valid JUMPDEST target.
    pub fn is_jumpdest(&self, offset: usize) -> bool {
        self.jumpdest.get(offset).copied().unwrap_or(false)
    }

    /// Resolves a byte offset that is a valid JUMPDEST to its index in
    /// `instructions`, for dynamic (non-fused) JUMP/JUMPI targets.
    pub fn jumpdest_instruction(&self, offset: usize) -> Option<usize> {
        self.jumpdest_instr.get(&offset).copied()
    }

    pub fn analyze(code: Bytes, revision: Revision, max_code_size: usize) -> Result<Self, StatusCode> {
        if code.len() > max_code_size {
            trace!("analysis rejected: {} bytes exceeds limit {}", code.len(), max_code_size);
            return Err(StatusCode::InvalidSize);
        }

        let mut instructions: Vec<Instruction> = Vec::with_capacity(code.len() + 1);
        let mut jumpdest = vec![false; code.len()];
        // byte offset of a JUMPDEST -> index of its instruction in the stream.
        let mut jumpdest_index = std::collections::HashMap::new();

        let mut block = BlockBuilder::default();
        block.open(&mut instructions);

        let mut pc = 0usize;
        while pc < code.len() {
            let opcode = OpCode::from_u8(code[pc]);
            let meta = metadata::lookup(revision, opcode);
            let (required, change) = meta
                .map(|m| (m.stack_height_required, m.stack_height_change))
                .unwrap_or((0, 0));
            let gas_cost = meta.map(|m| m.constant_gas).unwrap_or(0);

            if let Some(push_len) = opcode.push_size() {
                block.account(gas_cost, required, change);
                let mut buf = [0u8; 32];
                let avail = (code.len() - pc - 1).min(push_len as usize);
                buf[32 - push_len as usize..32 - push_len as usize + avail]
                    .copy_from_slice(&code[pc + 1..pc + 1 + avail]);
                let value = U256::from_big_endian(&buf);
                instructions.push(Instruction::new(Op::Real(opcode), Argument::Push(value)));
                pc += 1 + push_len as usize;
                continue;
            }

            match opcode {
                OpCode::JUMPDEST => {
                    // JUMPDEST is the first instruction of the block it
                    // opens, not the last of the block it closes: close the
                    // old block, open the new one (emitting its BEGIN_BLOCK)
                    // *before* accounting JUMPDEST's own gas/stack shape and
                    // emitting it, and record the jump target as the
                    // BEGIN_BLOCK index so jumping in always pays the new
                    // block's prepaid gas.
                    jumpdest[pc] = true;
                    block.close(&mut instructions);
                    block.open(&mut instructions);
                    let begin_block_idx = block.begin_idx;
                    block.account(gas_cost, required, change);
                    instructions.push(Instruction::new(Op::Real(opcode), Argument::None));
                    jumpdest_index.insert(pc, begin_block_idx);
                }
                OpCode::PC => {
                    block.account(gas_cost, required, change);
                    instructions.push(Instruction::new(Op::Real(opcode), Argument::Pc(pc)));
                }
                OpCode::JUMP | OpCode::STOP | OpCode::RETURN | OpCode::REVERT
                | OpCode::SELFDESTRUCT | OpCode::INVALID => {
                    block.account(gas_cost, required, change);
                    instructions.push(Instruction::new(Op::Real(opcode), Argument::None));
                    block.close(&mut instructions);
                    if pc + 1 < code.len() {
                        block.open(&mut instructions);
                    }
                }
                OpCode::JUMPI => {
                    block.account(gas_cost, required, change);
                    instructions.push(Instruction::new(Op::Real(opcode), Argument::None));
                    block.close(&mut instructions);
                    block.open(&mut instructions);
                }
                _ => {
                    block.account(gas_cost, required, change);
                    instructions.push(Instruction::new(Op::Real(opcode), Argument::None));
                }
            }

            pc += 1;
        }

        block.close(&mut instructions);

        resolve_jump_targets(&mut instructions, &jumpdest, &jumpdest_index);
        fuse_push_jump(&mut instructions);

        Ok(Self {
            instructions,
            jumpdest,
            jumpdest_instr: jumpdest_index,
            code,
        })
    }
}

/// Tracks the aggregate gas/stack shape of a basic block as it is built,
/// mirroring the accumulation rules in the analyzer algorithm: stack
/// requirement on entry grows as operands are consumed ahead of pushes
/// already accounted for earlier in the block.
#[derive(Default)]
struct BlockBuilder {
    begin_idx: usize,
    gas_cost: u64,
    stack_req: i16,
    stack_change: i16,
    stack_max_growth: i16,
}

impl BlockBuilder {
    fn open(&mut self, instructions: &mut Vec<Instruction>) {
        self.begin_idx = instructions.len();
        self.gas_cost = 0;
        self.stack_req = 0;
        self.stack_change = 0;
        self.stack_max_growth = 0;
        instructions.push(Instruction::new(Op::BeginBlock, Argument::None));
    }

    fn account(&mut self, gas_cost: u64, required: i16, change: i16) {
        self.gas_cost += gas_cost;
        let required_on_entry = required - self.stack_change;
        self.stack_req = self.stack_req.max(required_on_entry);
        self.stack_change += change;
        self.stack_max_growth = self.stack_max_growth.max(self.stack_change);
    }

    fn close(&mut self, instructions: &mut [Instruction]) {
        instructions[self.begin_idx].argument = Argument::BlockInfo(BlockInfo {
            gas_cost: self.gas_cost,
            stack_req: self.stack_req.max(0),
            stack_max_growth: self.stack_max_growth.max(0),
        });
    }
}

/// Step 5: for each JUMP/JUMPI directly preceded by a PUSH whose value
/// names a valid JUMPDEST, record the resolved instruction index so the
/// interpreter (and the fusion pass below) never has to re-validate a
/// constant target at runtime.
fn resolve_jump_targets(
    instructions: &mut [Instruction],
    jumpdest: &[bool],
    jumpdest_index: &std::collections::HashMap<usize, usize>,
) {
    for idx in 1..instructions.len() {
        let is_jump = matches!(
            instructions[idx].op,
            Op::Real(op) if op == OpCode::JUMP || op == OpCode::JUMPI
        );
        if !is_jump {
            continue;
        }
        let Some(pushed) = instructions[idx - 1].push_value() else {
            continue;
        };
        if pushed > U256::from(usize::MAX) {
            continue;
        }
        let target = pushed.as_usize();
        if target < jumpdest.len() && jumpdest[target] {
            if let Some(&target_idx) = jumpdest_index.get(&target) {
                instructions[idx].argument = Argument::JumpTarget(target_idx);
            }
        }
    }
}

/// Step 6: peephole-merge a resolved `PUSH` + `JUMP`/`JUMPI` pair into a
/// single fused instruction, leaving a `Nop` at the consumed PUSH's
/// position so every other already-resolved index stays valid.
fn fuse_push_jump(instructions: &mut [Instruction]) {
    for idx in 1..instructions.len() {
        let target = match instructions[idx].argument {
            Argument::JumpTarget(t) => t,
            _ => continue,
        };
        let fused_op = match instructions[idx].op {
            Op::Real(op) if op == OpCode::JUMP => Op::PushJump,
            Op::Real(op) if op == OpCode::JUMPI => Op::PushJumpi,
            _ => continue,
        };
        if instructions[idx - 1].push_value().is_none() {
            continue;
        }
        instructions[idx - 1] = Instruction::new(Op::Nop, Argument::None);
        instructions[idx] = Instruction::new(fused_op, Argument::JumpTarget(target));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(code: &[u8]) -> AnalyzedCode {
        AnalyzedCode::analyze(Bytes::copy_from_slice(code), Revision::Cancun, MAX_CODE_SIZE).unwrap()
    }

    #[test]
    fn rejects_oversized_code() {
        let code = Bytes::from(vec![0u8; MAX_CODE_SIZE + 1]);
        assert_eq!(
            AnalyzedCode::analyze(code, Revision::Cancun, MAX_CODE_SIZE).unwrap_err(),
            StatusCode::InvalidSize
        );
    }

    #[test]
    fn truncated_push_pads_with_zero() {
        // PUSH2 with only one immediate byte present.
        let a = analyze(&[0x61, 0xff]);
        let push = a.instructions.iter().find_map(|i| i.push_value());
        assert_eq!(push, Some(U256::from(0xff00)));
    }

    #[test]
    fn jumpdest_set_excludes_push_immediate_bytes() {
        // PUSH1 0x5b (a byte equal to JUMPDEST, but it's data) then JUMPDEST.
        let a = analyze(&[0x60, 0x5b, 0x5b]);
        assert!(!a.is_jumpdest(1));
        assert!(a.is_jumpdest(2));
    }

    #[test]
    fn constant_jump_target_gets_fused() {
        // PUSH1 4, JUMP, STOP, JUMPDEST, STOP
        let a = analyze(&[0x60, 0x04, 0x56, 0x00, 0x5b, 0x00]);
        let fused = a.instructions.iter().any(|i| matches!(i.op, Op::PushJump));
        assert!(fused, "expected PUSH+JUMP to fuse into PushJump");
    }

    #[test]
    fn jumping_into_a_jumpdest_lands_on_its_begin_block() {
        // STOP, JUMPDEST, JUMPDEST's own block: JUMPDEST must be the first
        // real instruction *after* its block's BEGIN_BLOCK, not the last
        // instruction folded into the block that precedes it.
        let a = analyze(&[0x00, 0x5b, 0x00]);
        let idx = a.jumpdest_instruction(1).unwrap();
        assert!(matches!(a.instructions[idx].op, Op::BeginBlock));
        assert!(matches!(a.instructions[idx + 1].op, Op::Real(op) if op == OpCode::JUMPDEST));
    }

    #[test]
    fn jumpdest_gas_is_accounted_into_its_own_block() {
        // STOP, JUMPDEST: the JUMPDEST's flat gas cost must show up in the
        // block it opens, not the block that closed right before it.
        let a = analyze(&[0x00, 0x5b]);
        let idx = a.jumpdest_instruction(1).unwrap();
        let info = a.instructions[idx].block_info().unwrap();
        let jumpdest_cost = metadata::lookup(Revision::Cancun, OpCode::JUMPDEST)
            .unwrap()
            .constant_gas;
        assert_eq!(info.gas_cost, jumpdest_cost);
    }

    #[test]
    fn block_info_tracks_stack_requirement() {
        // ADD needs 2 items on entry; nothing pushed before it in the block.
        let a = analyze(&[0x01]);
        let info = a.instructions[0].block_info().unwrap();
        assert_eq!(info.stack_req, 2);
    }
}
