//! Test-only helpers: a bytecode builder, an in-memory `Host`, and a
//! fluent wrapper over `Evm::call` for assembling execution checks.
//! Gated behind the `util` feature, the same as the teacher crate.

pub mod bytecode;
pub mod mocked_host;
pub mod tester;

pub use bytecode::{Bytecode, CallInstruction};
pub use mocked_host::MockedHost;
pub use tester::EvmTester;
