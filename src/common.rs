use ethereum_types::{Address, H256, U256};
use strum_macros::Display;

/// Ethereum protocol revision, in chronological order.
///
/// Ordering matters: callers frequently write `revision >= Revision::Berlin`
/// to gate an EIP bundle rather than matching every variant.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Revision {
    Frontier = 0,
    Homestead = 1,
    Tangerine = 2,
    Spurious = 3,
    Byzantium = 4,
    Constantinople = 5,
    Petersburg = 6,
    Istanbul = 7,
    Berlin = 8,
    London = 9,
    Merge = 10,
    Shanghai = 11,
    Cancun = 12,
}

impl Revision {
    pub fn iter() -> impl Iterator<Item = Self> {
        [
            Self::Frontier,
            Self::Homestead,
            Self::Tangerine,
            Self::Spurious,
            Self::Byzantium,
            Self::Constantinople,
            Self::Petersburg,
            Self::Istanbul,
            Self::Berlin,
            Self::London,
            Self::Merge,
            Self::Shanghai,
            Self::Cancun,
        ]
        .into_iter()
    }

    pub const fn len() -> usize {
        Self::Cancun as usize + 1
    }

    pub const fn latest() -> Self {
        Self::Cancun
    }
}

/// Terminal outcome of a single call frame.
///
/// `Stop`/`Return`/`Revert` are expected halts, not failures; every other
/// variant is a genuine execution error and consumes all remaining gas
/// except where noted on the variant.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum StatusCode {
    /// STOP reached. Output is empty.
    #[strum(serialize = "stop")]
    Stop,

    /// RETURN reached. Output carries the returned bytes.
    #[strum(serialize = "return")]
    Return,

    /// REVERT reached. Output carries the returned bytes; unused gas is
    /// refunded to the caller, unlike every other error variant here.
    #[strum(serialize = "revert")]
    Revert,

    /// Ran out of gas mid-block or mid-instruction.
    #[strum(serialize = "out of gas")]
    OutOfGas,

    /// Attempted to pop from an empty stack.
    #[strum(serialize = "stack underflow")]
    StackUnderflow,

    /// Attempted to push past the 1024-slot limit.
    #[strum(serialize = "stack overflow")]
    StackOverflow,

    /// JUMP/JUMPI targeted a byte that is not in the JUMPDEST set.
    #[strum(serialize = "invalid jump")]
    InvalidJump,

    /// Byte does not decode to a known opcode for the active revision.
    #[strum(serialize = "invalid opcode")]
    InvalidOpcode,

    /// Call depth would exceed 1024.
    #[strum(serialize = "call depth exceeded")]
    CallDepthExceeded,

    /// A state-changing opcode ran in a static context.
    #[strum(serialize = "write protection")]
    WriteProtection,

    /// A memory read ran past the bounds of a fixed buffer, e.g.
    /// RETURNDATACOPY past the end of `return_data`.
    #[strum(serialize = "out of offset")]
    OutOfOffset,

    /// A length argument is invalid for the operation (e.g. overflowing size
    /// arithmetic).
    #[strum(serialize = "invalid size")]
    InvalidSize,

    /// The host could not satisfy a memory allocation request.
    #[strum(serialize = "out of memory")]
    OutOfMemory,

    /// A debug hook requested the frame be aborted.
    #[strum(serialize = "debug abort")]
    DebugAbort,

    /// A precompiled contract invocation failed.
    #[strum(serialize = "precompile failure")]
    PrecompileFailure,

    /// Generic internal error; should not occur in correct implementations.
    #[strum(serialize = "internal error")]
    InternalError,
}

impl StatusCode {
    /// Whether this is an expected halt rather than an execution error.
    pub const fn is_halt(self) -> bool {
        matches!(self, Self::Stop | Self::Return | Self::Revert)
    }

    /// Whether a failure of this kind still returns unused gas to the
    /// caller. Only REVERT does; every other error burns the frame's gas.
    pub const fn refunds_gas(self) -> bool {
        matches!(self, Self::Revert)
    }
}

/// The kind of call-like instruction that created a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2 { salt: H256 },
}

impl CallKind {
    pub const fn is_create(self) -> bool {
        matches!(self, Self::Create | Self::Create2 { .. })
    }
}

#[inline]
pub(crate) fn u256_to_address(v: U256) -> Address {
    let mut buf = [0u8; 32];
    v.to_big_endian(&mut buf);
    Address::from_slice(&buf[12..])
}

#[inline]
pub(crate) fn address_to_u256(v: Address) -> U256 {
    U256::from_big_endian(v.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_ordering_spans_frontier_to_cancun() {
        assert!(Revision::Cancun > Revision::London);
        assert_eq!(Revision::len(), 13);
        assert_eq!(Revision::iter().count(), Revision::len());
        assert_eq!(Revision::latest(), Revision::Cancun);
    }

    #[test]
    fn status_code_halt_classification() {
        assert!(StatusCode::Stop.is_halt());
        assert!(StatusCode::Return.is_halt());
        assert!(StatusCode::Revert.is_halt());
        assert!(!StatusCode::OutOfGas.is_halt());
        assert!(StatusCode::Revert.refunds_gas());
        assert!(!StatusCode::OutOfGas.refunds_gas());
    }

    #[test]
    fn address_u256_round_trip() {
        let addr = Address::from_low_u64_be(0xdead_beef);
        assert_eq!(u256_to_address(address_to_u256(addr)), addr);
    }
}
