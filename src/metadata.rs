//! Per-opcode static metadata: constant gas cost and stack effect, by
//! revision.
//!
//! This is the successor to the teacher's separate `properties` (stack
//! shape) and `instruction_table` (gas cost) modules, merged into one table
//! because the analyzer needs both at once to build a `BEGIN_BLOCK` marker.

use once_cell::sync::Lazy;

use crate::{common::Revision, opcode::OpCode};

pub const COLD_SLOAD_COST: u64 = 2100;
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2600;
pub const WARM_STORAGE_READ_COST: u64 = 100;
pub const ADDITIONAL_COLD_ACCOUNT_ACCESS_COST: u64 =
    COLD_ACCOUNT_ACCESS_COST - WARM_STORAGE_READ_COST;
pub const ADDITIONAL_COLD_SLOAD_COST: u64 = COLD_SLOAD_COST - WARM_STORAGE_READ_COST;

/// Static shape of a single opcode: how many stack items it needs, how the
/// stack height changes, and its constant (non-dynamic) gas cost.
///
/// Dynamic gas (memory expansion, SSTORE's storage-dependent cost, CALL's
/// 63/64 forwarding, LOG's per-byte cost, ...) is charged separately by the
/// opcode's handler; this table only covers the part the analyzer can know
/// up front.
#[derive(Clone, Copy, Debug)]
pub struct OpMetadata {
    pub name: &'static str,
    pub constant_gas: u64,
    pub stack_height_required: i16,
    pub stack_height_change: i16,
}

impl OpMetadata {
    const fn new(name: &'static str, gas: u64, required: i16, change: i16) -> Self {
        Self {
            name,
            constant_gas: gas,
            stack_height_required: required,
            stack_height_change: change,
        }
    }
}

type OpTable = [Option<OpMetadata>; 256];

const fn base_shapes() -> OpTable {
    let mut t: OpTable = [None; 256];
    macro_rules! set {
        ($op:expr, $name:expr, $required:expr, $change:expr) => {
            t[$op.to_usize()] = Some(OpMetadata::new($name, 0, $required, $change));
        };
    }

    set!(OpCode::STOP, "STOP", 0, 0);
    set!(OpCode::ADD, "ADD", 2, -1);
    set!(OpCode::MUL, "MUL", 2, -1);
    set!(OpCode::SUB, "SUB", 2, -1);
    set!(OpCode::DIV, "DIV", 2, -1);
    set!(OpCode::SDIV, "SDIV", 2, -1);
    set!(OpCode::MOD, "MOD", 2, -1);
    set!(OpCode::SMOD, "SMOD", 2, -1);
    set!(OpCode::ADDMOD, "ADDMOD", 3, -2);
    set!(OpCode::MULMOD, "MULMOD", 3, -2);
    set!(OpCode::EXP, "EXP", 2, -1);
    set!(OpCode::SIGNEXTEND, "SIGNEXTEND", 2, -1);

    set!(OpCode::LT, "LT", 2, -1);
    set!(OpCode::GT, "GT", 2, -1);
    set!(OpCode::SLT, "SLT", 2, -1);
    set!(OpCode::SGT, "SGT", 2, -1);
    set!(OpCode::EQ, "EQ", 2, -1);
    set!(OpCode::ISZERO, "ISZERO", 1, 0);
    set!(OpCode::AND, "AND", 2, -1);
    set!(OpCode::OR, "OR", 2, -1);
    set!(OpCode::XOR, "XOR", 2, -1);
    set!(OpCode::NOT, "NOT", 1, 0);
    set!(OpCode::BYTE, "BYTE", 2, -1);
    set!(OpCode::SHL, "SHL", 2, -1);
    set!(OpCode::SHR, "SHR", 2, -1);
    set!(OpCode::SAR, "SAR", 2, -1);

    set!(OpCode::KECCAK256, "KECCAK256", 2, -1);

    set!(OpCode::ADDRESS, "ADDRESS", 0, 1);
    set!(OpCode::BALANCE, "BALANCE", 1, 0);
    set!(OpCode::ORIGIN, "ORIGIN", 0, 1);
    set!(OpCode::CALLER, "CALLER", 0, 1);
    set!(OpCode::CALLVALUE, "CALLVALUE", 0, 1);
    set!(OpCode::CALLDATALOAD, "CALLDATALOAD", 1, 0);
    set!(OpCode::CALLDATASIZE, "CALLDATASIZE", 0, 1);
    set!(OpCode::CALLDATACOPY, "CALLDATACOPY", 3, -3);
    set!(OpCode::CODESIZE, "CODESIZE", 0, 1);
    set!(OpCode::CODECOPY, "CODECOPY", 3, -3);
    set!(OpCode::GASPRICE, "GASPRICE", 0, 1);
    set!(OpCode::EXTCODESIZE, "EXTCODESIZE", 1, 0);
    set!(OpCode::EXTCODECOPY, "EXTCODECOPY", 4, -4);
    set!(OpCode::RETURNDATASIZE, "RETURNDATASIZE", 0, 1);
    set!(OpCode::RETURNDATACOPY, "RETURNDATACOPY", 3, -3);
    set!(OpCode::EXTCODEHASH, "EXTCODEHASH", 1, 0);

    set!(OpCode::BLOCKHASH, "BLOCKHASH", 1, 0);
    set!(OpCode::COINBASE, "COINBASE", 0, 1);
    set!(OpCode::TIMESTAMP, "TIMESTAMP", 0, 1);
    set!(OpCode::NUMBER, "NUMBER", 0, 1);
    set!(OpCode::DIFFICULTY, "DIFFICULTY", 0, 1);
    set!(OpCode::GASLIMIT, "GASLIMIT", 0, 1);
    set!(OpCode::CHAINID, "CHAINID", 0, 1);
    set!(OpCode::SELFBALANCE, "SELFBALANCE", 0, 1);
    set!(OpCode::BASEFEE, "BASEFEE", 0, 1);
    set!(OpCode::BLOBHASH, "BLOBHASH", 1, 0);
    set!(OpCode::BLOBBASEFEE, "BLOBBASEFEE", 0, 1);

    set!(OpCode::POP, "POP", 1, -1);
    set!(OpCode::MLOAD, "MLOAD", 1, 0);
    set!(OpCode::MSTORE, "MSTORE", 2, -2);
    set!(OpCode::MSTORE8, "MSTORE8", 2, -2);
    set!(OpCode::SLOAD, "SLOAD", 1, 0);
    set!(OpCode::SSTORE, "SSTORE", 2, -2);
    set!(OpCode::JUMP, "JUMP", 1, -1);
    set!(OpCode::JUMPI, "JUMPI", 2, -2);
    set!(OpCode::PC, "PC", 0, 1);
    set!(OpCode::MSIZE, "MSIZE", 0, 1);
    set!(OpCode::GAS, "GAS", 0, 1);
    set!(OpCode::JUMPDEST, "JUMPDEST", 0, 0);
    set!(OpCode::TLOAD, "TLOAD", 1, 0);
    set!(OpCode::TSTORE, "TSTORE", 2, -2);
    set!(OpCode::MCOPY, "MCOPY", 3, -3);
    set!(OpCode::PUSH0, "PUSH0", 0, 1);

    // PUSH1..PUSH32: stack_height_required = 0, change = +1.
    let mut b = OpCode::PUSH1.to_usize();
    while b <= OpCode::PUSH32.to_usize() {
        t[b] = Some(OpMetadata::new("PUSH", 0, 0, 1));
        b += 1;
    }

    // DUPn: requires n, produces one more.
    let mut n: usize = 1;
    while n <= 16 {
        let idx = OpCode::DUP1.to_usize() + n - 1;
        t[idx] = Some(OpMetadata::new("DUP", 0, n as i16, 1));
        n += 1;
    }

    // SWAPn: requires n + 1, height unchanged.
    let mut n: usize = 1;
    while n <= 16 {
        let idx = OpCode::SWAP1.to_usize() + n - 1;
        t[idx] = Some(OpMetadata::new("SWAP", 0, n as i16 + 1, 0));
        n += 1;
    }

    // LOGn: 2 + n required, -(2 + n) change.
    let mut n: usize = 0;
    while n <= 4 {
        let idx = OpCode::LOG0.to_usize() + n;
        t[idx] = Some(OpMetadata::new("LOG", 0, 2 + n as i16, -(2 + n as i16)));
        n += 1;
    }

    set!(OpCode::CREATE, "CREATE", 3, -2);
    set!(OpCode::CALL, "CALL", 7, -6);
    set!(OpCode::CALLCODE, "CALLCODE", 7, -6);
    set!(OpCode::RETURN, "RETURN", 2, -2);
    set!(OpCode::DELEGATECALL, "DELEGATECALL", 6, -5);
    set!(OpCode::CREATE2, "CREATE2", 4, -3);
    set!(OpCode::STATICCALL, "STATICCALL", 6, -5);
    set!(OpCode::REVERT, "REVERT", 2, -2);
    set!(OpCode::SELFDESTRUCT, "SELFDESTRUCT", 1, -1);

    t
}

/// Frontier constant-gas costs. Every later fork starts from a copy of its
/// predecessor and overrides only what changed, mirroring `Config`.
fn frontier_costs() -> OpTable {
    let mut t = base_shapes();
    macro_rules! gas {
        ($op:expr, $cost:expr) => {
            if let Some(m) = &mut t[$op.to_usize()] {
                m.constant_gas = $cost;
            }
        };
    }

    gas!(OpCode::STOP, 0);
    gas!(OpCode::ADD, 3);
    gas!(OpCode::MUL, 5);
    gas!(OpCode::SUB, 3);
    gas!(OpCode::DIV, 5);
    gas!(OpCode::SDIV, 5);
    gas!(OpCode::MOD, 5);
    gas!(OpCode::SMOD, 5);
    gas!(OpCode::ADDMOD, 8);
    gas!(OpCode::MULMOD, 8);
    gas!(OpCode::EXP, 10);
    gas!(OpCode::SIGNEXTEND, 5);

    gas!(OpCode::LT, 3);
    gas!(OpCode::GT, 3);
    gas!(OpCode::SLT, 3);
    gas!(OpCode::SGT, 3);
    gas!(OpCode::EQ, 3);
    gas!(OpCode::ISZERO, 3);
    gas!(OpCode::AND, 3);
    gas!(OpCode::OR, 3);
    gas!(OpCode::XOR, 3);
    gas!(OpCode::NOT, 3);
    gas!(OpCode::BYTE, 3);

    gas!(OpCode::KECCAK256, 30);

    gas!(OpCode::ADDRESS, 2);
    gas!(OpCode::BALANCE, 20);
    gas!(OpCode::ORIGIN, 2);
    gas!(OpCode::CALLER, 2);
    gas!(OpCode::CALLVALUE, 2);
    gas!(OpCode::CALLDATALOAD, 3);
    gas!(OpCode::CALLDATASIZE, 2);
    gas!(OpCode::CALLDATACOPY, 3);
    gas!(OpCode::CODESIZE, 2);
    gas!(OpCode::CODECOPY, 3);
    gas!(OpCode::GASPRICE, 2);
    gas!(OpCode::EXTCODESIZE, 20);
    gas!(OpCode::EXTCODECOPY, 20);

    gas!(OpCode::BLOCKHASH, 20);
    gas!(OpCode::COINBASE, 2);
    gas!(OpCode::TIMESTAMP, 2);
    gas!(OpCode::NUMBER, 2);
    gas!(OpCode::DIFFICULTY, 2);
    gas!(OpCode::GASLIMIT, 2);

    gas!(OpCode::POP, 2);
    gas!(OpCode::MLOAD, 3);
    gas!(OpCode::MSTORE, 3);
    gas!(OpCode::MSTORE8, 3);
    gas!(OpCode::SLOAD, 50);
    gas!(OpCode::SSTORE, 0);
    gas!(OpCode::JUMP, 8);
    gas!(OpCode::JUMPI, 10);
    gas!(OpCode::PC, 2);
    gas!(OpCode::MSIZE, 2);
    gas!(OpCode::GAS, 2);
    gas!(OpCode::JUMPDEST, 1);

    let mut b = OpCode::PUSH1.to_usize();
    while b <= OpCode::PUSH32.to_usize() {
        if let Some(m) = &mut t[b] {
            m.constant_gas = 3;
        }
        b += 1;
    }
    let mut idx = OpCode::DUP1.to_usize();
    while idx <= OpCode::DUP16.to_usize() {
        if let Some(m) = &mut t[idx] {
            m.constant_gas = 3;
        }
        idx += 1;
    }
    let mut idx = OpCode::SWAP1.to_usize();
    while idx <= OpCode::SWAP16.to_usize() {
        if let Some(m) = &mut t[idx] {
            m.constant_gas = 3;
        }
        idx += 1;
    }
    for (i, idx) in (OpCode::LOG0.to_usize()..=OpCode::LOG4.to_usize()).enumerate() {
        if let Some(m) = &mut t[idx] {
            m.constant_gas = (1 + i as u64) * 375;
        }
    }

    gas!(OpCode::CREATE, 32000);
    gas!(OpCode::CALL, 40);
    gas!(OpCode::CALLCODE, 40);
    gas!(OpCode::RETURN, 0);
    gas!(OpCode::SELFDESTRUCT, 0);

    t
}

fn homestead_costs() -> OpTable {
    let mut t = frontier_costs();
    if let Some(m) = &mut t[OpCode::DELEGATECALL.to_usize()] {
        m.constant_gas = 40;
    }
    t
}

fn tangerine_costs() -> OpTable {
    let mut t = homestead_costs();
    macro_rules! gas {
        ($op:expr, $cost:expr) => {
            if let Some(m) = &mut t[$op.to_usize()] {
                m.constant_gas = $cost;
            }
        };
    }
    gas!(OpCode::BALANCE, 400);
    gas!(OpCode::EXTCODESIZE, 700);
    gas!(OpCode::EXTCODECOPY, 700);
    gas!(OpCode::SLOAD, 200);
    gas!(OpCode::CALL, 700);
    gas!(OpCode::CALLCODE, 700);
    gas!(OpCode::DELEGATECALL, 700);
    gas!(OpCode::SELFDESTRUCT, 5000);
    t
}

fn spurious_costs() -> OpTable {
    tangerine_costs()
}

fn byzantium_costs() -> OpTable {
    let mut t = spurious_costs();
    macro_rules! gas {
        ($op:expr, $cost:expr) => {
            if let Some(m) = &mut t[$op.to_usize()] {
                m.constant_gas = $cost;
            }
        };
    }
    gas!(OpCode::RETURNDATASIZE, 2);
    gas!(OpCode::RETURNDATACOPY, 3);
    gas!(OpCode::STATICCALL, 700);
    gas!(OpCode::REVERT, 0);
    t
}

fn constantinople_costs() -> OpTable {
    let mut t = byzantium_costs();
    macro_rules! gas {
        ($op:expr, $cost:expr) => {
            if let Some(m) = &mut t[$op.to_usize()] {
                m.constant_gas = $cost;
            }
        };
    }
    gas!(OpCode::SHL, 3);
    gas!(OpCode::SHR, 3);
    gas!(OpCode::SAR, 3);
    gas!(OpCode::EXTCODEHASH, 400);
    gas!(OpCode::CREATE2, 32000);
    t
}

fn petersburg_costs() -> OpTable {
    constantinople_costs()
}

fn istanbul_costs() -> OpTable {
    let mut t = petersburg_costs();
    macro_rules! gas {
        ($op:expr, $cost:expr) => {
            if let Some(m) = &mut t[$op.to_usize()] {
                m.constant_gas = $cost;
            }
        };
    }
    gas!(OpCode::BALANCE, 700);
    gas!(OpCode::CHAINID, 2);
    gas!(OpCode::EXTCODEHASH, 700);
    gas!(OpCode::SELFBALANCE, 5);
    gas!(OpCode::SLOAD, 800);
    t
}

fn berlin_costs() -> OpTable {
    let mut t = istanbul_costs();
    macro_rules! gas {
        ($op:expr, $cost:expr) => {
            if let Some(m) = &mut t[$op.to_usize()] {
                m.constant_gas = $cost;
            }
        };
    }
    gas!(OpCode::EXTCODESIZE, WARM_STORAGE_READ_COST);
    gas!(OpCode::EXTCODECOPY, WARM_STORAGE_READ_COST);
    gas!(OpCode::EXTCODEHASH, WARM_STORAGE_READ_COST);
    gas!(OpCode::BALANCE, WARM_STORAGE_READ_COST);
    gas!(OpCode::CALL, WARM_STORAGE_READ_COST);
    gas!(OpCode::CALLCODE, WARM_STORAGE_READ_COST);
    gas!(OpCode::DELEGATECALL, WARM_STORAGE_READ_COST);
    gas!(OpCode::STATICCALL, WARM_STORAGE_READ_COST);
    gas!(OpCode::SLOAD, WARM_STORAGE_READ_COST);
    t
}

fn london_costs() -> OpTable {
    let mut t = berlin_costs();
    if let Some(m) = &mut t[OpCode::BASEFEE.to_usize()] {
        m.constant_gas = 2;
    }
    t
}

fn merge_costs() -> OpTable {
    london_costs()
}

fn shanghai_costs() -> OpTable {
    let mut t = merge_costs();
    if let Some(m) = &mut t[OpCode::PUSH0.to_usize()] {
        m.constant_gas = 2;
    }
    t
}

fn cancun_costs() -> OpTable {
    let mut t = shanghai_costs();
    macro_rules! gas {
        ($op:expr, $cost:expr) => {
            if let Some(m) = &mut t[$op.to_usize()] {
                m.constant_gas = $cost;
            }
        };
    }
    gas!(OpCode::TLOAD, WARM_STORAGE_READ_COST);
    gas!(OpCode::TSTORE, 100);
    gas!(OpCode::MCOPY, 3);
    gas!(OpCode::BLOBHASH, 3);
    gas!(OpCode::BLOBBASEFEE, 2);
    t
}

static TABLES: Lazy<[OpTable; Revision::len()]> = Lazy::new(|| {
    [
        frontier_costs(),
        homestead_costs(),
        tangerine_costs(),
        spurious_costs(),
        byzantium_costs(),
        constantinople_costs(),
        petersburg_costs(),
        istanbul_costs(),
        berlin_costs(),
        london_costs(),
        merge_costs(),
        shanghai_costs(),
        cancun_costs(),
    ]
});

/// Metadata for `op` under `revision`, or `None` if the opcode is undefined
/// at that revision (e.g. `PUSH0` before Shanghai, `SAR` before
/// Constantinople).
pub fn lookup(revision: Revision, op: OpCode) -> Option<OpMetadata> {
    let base = TABLES[revision as usize][op.to_usize()]?;
    if !is_defined_at(revision, op) {
        return None;
    }
    Some(base)
}

/// Opcodes whose existence (not just gas cost) is revision-gated.
fn is_defined_at(revision: Revision, op: OpCode) -> bool {
    use Revision::*;
    match op {
        OpCode::DELEGATECALL => revision >= Homestead,
        OpCode::REVERT | OpCode::RETURNDATASIZE | OpCode::RETURNDATACOPY | OpCode::STATICCALL => {
            revision >= Byzantium
        }
        OpCode::SHL | OpCode::SHR | OpCode::SAR | OpCode::CREATE2 | OpCode::EXTCODEHASH => {
            revision >= Constantinople
        }
        OpCode::CHAINID | OpCode::SELFBALANCE => revision >= Istanbul,
        OpCode::BASEFEE => revision >= London,
        OpCode::PUSH0 => revision >= Shanghai,
        OpCode::TLOAD | OpCode::TSTORE | OpCode::MCOPY => revision >= Cancun,
        OpCode::BLOBHASH | OpCode::BLOBBASEFEE => revision >= Cancun,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push0_undefined_before_shanghai() {
        assert!(lookup(Revision::London, OpCode::PUSH0).is_none());
        assert!(lookup(Revision::Shanghai, OpCode::PUSH0).is_some());
    }

    #[test]
    fn sload_gas_tracks_eip2929() {
        assert_eq!(lookup(Revision::Istanbul, OpCode::SLOAD).unwrap().constant_gas, 800);
        assert_eq!(
            lookup(Revision::Berlin, OpCode::SLOAD).unwrap().constant_gas,
            WARM_STORAGE_READ_COST
        );
    }

    #[test]
    fn dup_stack_requirements_scale_with_depth() {
        assert_eq!(
            lookup(Revision::Cancun, OpCode::DUP16).unwrap().stack_height_required,
            16
        );
        assert_eq!(
            lookup(Revision::Cancun, OpCode::SWAP16).unwrap().stack_height_required,
            17
        );
    }

    #[test]
    fn mcopy_undefined_before_cancun() {
        assert!(lookup(Revision::Shanghai, OpCode::MCOPY).is_none());
        assert!(lookup(Revision::Cancun, OpCode::MCOPY).is_some());
    }
}
