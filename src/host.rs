//! The abstract collaborator that owns persistent state, block/tx context,
//! and the journal. The core never executes nested calls through the
//! Host — it recurses into its own orchestrator instead — so this trait
//! is pure state/context/journal access, synchronous throughout.

use anyhow::bail;
use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

use crate::{
    common::Revision,
    message::{AccessStatus, SnapshotId, StorageStatus, TxContext},
};

pub trait Host {
    /// Returns `Ok(false)` if the account does not exist.
    fn account_exists(&mut self, address: Address) -> anyhow::Result<bool>;
    /// Returns `Ok(0)` if the account does not exist.
    fn get_balance(&mut self, address: Address) -> anyhow::Result<U256>;
    /// Returns empty if the account does not exist.
    fn get_code(&mut self, address: Address) -> anyhow::Result<Bytes>;
    /// Installs `code` as `address`'s runtime code. Contract deployment only.
    fn set_code(&mut self, address: Address, code: Bytes) -> anyhow::Result<()>;
    fn get_code_size(&mut self, address: Address) -> anyhow::Result<u64>;
    fn get_code_hash(&mut self, address: Address) -> anyhow::Result<H256>;

    fn get_nonce(&mut self, address: Address) -> anyhow::Result<u64>;
    fn increment_nonce(&mut self, address: Address) -> anyhow::Result<u64>;

    /// Debits `amount` from `address`'s balance. The orchestrator has
    /// already checked `get_balance(address) >= amount` before calling this,
    /// but a Host backed by a real ledger may still reject it (e.g. a
    /// concurrent mutation in a non-core-owned path).
    fn sub_balance(&mut self, address: Address, amount: U256) -> anyhow::Result<()>;
    fn add_balance(&mut self, address: Address, amount: U256) -> anyhow::Result<()>;

    /// Returns `Ok(H256::zero())` if the slot does not exist.
    fn get_storage(&mut self, address: Address, key: H256) -> anyhow::Result<H256>;
    fn set_storage(
        &mut self,
        address: Address,
        key: H256,
        value: H256,
    ) -> anyhow::Result<StorageStatus>;
    /// The slot's value at the start of the current transaction, used for
    /// SSTORE refund accounting (EIP-2200).
    fn get_original_storage(&mut self, address: Address, key: H256) -> anyhow::Result<H256>;

    fn get_transient_storage(&mut self, address: Address, key: H256) -> anyhow::Result<H256>;
    fn set_transient_storage(
        &mut self,
        address: Address,
        key: H256,
        value: H256,
    ) -> anyhow::Result<()>;

    fn get_tx_context(&mut self) -> anyhow::Result<TxContext>;
    /// Returns `Ok(H256::zero())` if the block does not exist.
    fn get_block_hash(&mut self, block_number: u64) -> anyhow::Result<H256>;
    fn blob_hash(&mut self, index: usize) -> anyhow::Result<Option<H256>>;
    fn get_hardfork(&mut self) -> anyhow::Result<Revision>;

    /// Marks the address warm, returning its previous status.
    fn access_account(&mut self, address: Address) -> anyhow::Result<AccessStatus>;
    /// Marks the `(address, key)` slot warm, returning its previous status.
    fn access_storage(&mut self, address: Address, key: H256) -> anyhow::Result<AccessStatus>;

    fn create_snapshot(&mut self) -> anyhow::Result<SnapshotId>;
    fn revert_to_snapshot(&mut self, id: SnapshotId) -> anyhow::Result<()>;

    fn emit_log(&mut self, address: Address, data: Bytes, topics: &[H256]) -> anyhow::Result<()>;

    fn register_created_contract(&mut self, address: Address) -> anyhow::Result<()>;
    fn was_created_in_tx(&mut self, address: Address) -> anyhow::Result<bool>;
    /// EIP-6780: deletion only actually happens for contracts created in
    /// the same transaction; the Host is responsible for applying that
    /// rule when the transaction commits.
    fn mark_for_destruction(&mut self, address: Address, beneficiary: Address) -> anyhow::Result<()>;
    /// Transfers `address`'s entire balance to `beneficiary` immediately.
    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> anyhow::Result<()>;
}

/// Host that does not support any ops.
#[derive(Default)]
pub struct DummyHost;

impl Host for DummyHost {
    fn account_exists(&mut self, _: Address) -> anyhow::Result<bool> {
        bail!("unsupported")
    }
    fn get_balance(&mut self, _: Address) -> anyhow::Result<U256> {
        bail!("unsupported")
    }
    fn get_code(&mut self, _: Address) -> anyhow::Result<Bytes> {
        bail!("unsupported")
    }
    fn set_code(&mut self, _: Address, _: Bytes) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn get_code_size(&mut self, _: Address) -> anyhow::Result<u64> {
        bail!("unsupported")
    }
    fn get_code_hash(&mut self, _: Address) -> anyhow::Result<H256> {
        bail!("unsupported")
    }
    fn get_nonce(&mut self, _: Address) -> anyhow::Result<u64> {
        bail!("unsupported")
    }
    fn increment_nonce(&mut self, _: Address) -> anyhow::Result<u64> {
        bail!("unsupported")
    }
    fn sub_balance(&mut self, _: Address, _: U256) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn add_balance(&mut self, _: Address, _: U256) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn get_storage(&mut self, _: Address, _: H256) -> anyhow::Result<H256> {
        bail!("unsupported")
    }
    fn set_storage(&mut self, _: Address, _: H256, _: H256) -> anyhow::Result<StorageStatus> {
        bail!("unsupported")
    }
    fn get_original_storage(&mut self, _: Address, _: H256) -> anyhow::Result<H256> {
        bail!("unsupported")
    }
    fn get_transient_storage(&mut self, _: Address, _: H256) -> anyhow::Result<H256> {
        bail!("unsupported")
    }
    fn set_transient_storage(&mut self, _: Address, _: H256, _: H256) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn get_tx_context(&mut self) -> anyhow::Result<TxContext> {
        bail!("unsupported")
    }
    fn get_block_hash(&mut self, _: u64) -> anyhow::Result<H256> {
        bail!("unsupported")
    }
    fn blob_hash(&mut self, _: usize) -> anyhow::Result<Option<H256>> {
        bail!("unsupported")
    }
    fn get_hardfork(&mut self) -> anyhow::Result<Revision> {
        bail!("unsupported")
    }
    fn access_account(&mut self, _: Address) -> anyhow::Result<AccessStatus> {
        bail!("unsupported")
    }
    fn access_storage(&mut self, _: Address, _: H256) -> anyhow::Result<AccessStatus> {
        bail!("unsupported")
    }
    fn create_snapshot(&mut self) -> anyhow::Result<SnapshotId> {
        bail!("unsupported")
    }
    fn revert_to_snapshot(&mut self, _: SnapshotId) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn emit_log(&mut self, _: Address, _: Bytes, _: &[H256]) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn register_created_contract(&mut self, _: Address) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn was_created_in_tx(&mut self, _: Address) -> anyhow::Result<bool> {
        bail!("unsupported")
    }
    fn mark_for_destruction(&mut self, _: Address, _: Address) -> anyhow::Result<()> {
        bail!("unsupported")
    }
    fn selfdestruct(&mut self, _: Address, _: Address) -> anyhow::Result<()> {
        bail!("unsupported")
    }
}
