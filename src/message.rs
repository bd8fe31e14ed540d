//! Boundary types crossing between a Host/driver and the core: the call
//! request going in, the result coming out.

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::common::{CallKind, StatusCode};

/// A request to run a call or create, tagged by `CallKind`.
///
/// Mirrors the teacher's `Message` but drops the coroutine-era fields
/// (`depth` is supplied separately by the orchestrator, not carried on the
/// wire type, since it is derived from the caller's frame rather than
/// chosen by whoever builds the params).
#[derive(Clone, Debug)]
pub struct CallParams {
    pub kind: CallKind,
    pub caller: Address,
    /// Execution context address: what `ADDRESS`/storage/balance resolve
    /// to. Equal to the callee for CALL/STATICCALL, equal to the current
    /// frame's own address for CALLCODE/DELEGATECALL. Ignored (the freshly
    /// derived address is used instead) for CREATE family.
    pub to: Address,
    /// Where the code actually being run comes from. Equal to `to` for
    /// CALL/STATICCALL/CREATE family; the callee for CALLCODE/DELEGATECALL,
    /// where it diverges from the execution context in `to`.
    pub code_address: Address,
    pub value: U256,
    /// Calldata for CALL family, initcode for CREATE family.
    pub input: Bytes,
    pub gas: i64,
    pub is_static: bool,
}

impl CallParams {
    pub fn is_create(&self) -> bool {
        self.kind.is_create()
    }
}

/// Outcome of a call or create, returned to whoever invoked `Evm::call`.
#[derive(Clone, Debug)]
pub struct CallResult {
    pub status: StatusCode,
    pub gas_left: i64,
    pub output: Bytes,
    /// Set only for a successful CREATE/CREATE2.
    pub created_address: Option<Address>,
}

impl CallResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, StatusCode::Stop | StatusCode::Return)
    }

    pub fn is_revert(&self) -> bool {
        matches!(self.status, StatusCode::Revert)
    }

    pub(crate) fn halt(status: StatusCode) -> Self {
        Self {
            status,
            gas_left: 0,
            output: Bytes::new(),
            created_address: None,
        }
    }
}

/// Previous warm/cold status returned by `Host::access_account`/`access_storage`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessStatus {
    Cold,
    Warm,
}

impl Default for AccessStatus {
    fn default() -> Self {
        Self::Cold
    }
}

/// Outcome of `Host::set_storage`, used to price SSTORE under EIP-2200.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageStatus {
    Unchanged,
    Modified,
    ModifiedAgain,
    Added,
    Deleted,
}

/// Block/transaction context supplied by the Host.
#[derive(Clone, Copy, Debug)]
pub struct TxContext {
    pub tx_gas_price: U256,
    pub tx_origin: Address,
    pub block_coinbase: Address,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub block_gas_limit: u64,
    pub block_difficulty: U256,
    pub block_base_fee: U256,
    pub blob_base_fee: U256,
    pub chain_id: U256,
}

pub type SnapshotId = u64;
