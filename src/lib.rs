//! A synchronous Ethereum Virtual Machine execution core.
//!
//! This crate covers the parts of the EVM that are pure function of
//! bytecode, stack, memory and gas: bytecode analysis into a pre-decoded
//! instruction stream ([`AnalyzedCode`]), the dispatch loop that walks it,
//! and the per-call [`Frame`] state (stack/memory/gas) it runs against.
//! Everything outside a single call frame — account balances, storage,
//! logs, the block/transaction context, precompiles, journaling/snapshots —
//! is delegated to a caller-supplied [`Host`] implementation.
//!
//! Nested CALL/CREATE recurse directly into [`Evm::call`] rather than
//! suspending into a coroutine; see `evm` module docs for why.

pub use access_list::{charge_account_access, charge_storage_access};
pub use analyzer::{AnalyzedCode, MAX_CODE_SIZE, MAX_INITCODE_SIZE};
pub use cache::AnalysisCache;
pub use common::{CallKind, Revision, StatusCode};
pub use config::Config;
pub use evm::{DebugHooks, Evm, MessagePhase, PrecompileOutcome, Precompiles, StepAction};
pub use frame::Frame;
pub use host::{DummyHost, Host};
pub use memory::Memory;
pub use message::{AccessStatus, CallParams, CallResult, SnapshotId, StorageStatus, TxContext};
pub use opcode::OpCode;
pub use stack::Stack;

mod access_list;
mod analyzer;
mod cache;
mod common;
mod config;
mod evm;
mod frame;
pub mod host;
mod instruction;
#[doc(hidden)]
pub mod instructions;
mod interpreter;
mod memory;
mod message;
mod metadata;
pub mod opcode;
mod refund;
mod stack;

#[cfg(feature = "util")]
pub mod util;
