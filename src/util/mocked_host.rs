//! An in-memory `Host` for tests, standing in for a real ledger/journal.
//!
//! The teacher crate's tester ran against `evmc_vm::MockedHost`, borrowed
//! from the `evmc` dev-dependency; since the evmc bridge and its coroutine
//! suspension points are gone from this crate, that mock goes with it. This
//! is the same shape rebuilt directly against `Host`: one flat account map,
//! snapshot/revert via a stack of full-map clones (fine for test-sized
//! state, not how a real journal would do it).

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};

use crate::{
    common::Revision,
    host::Host,
    message::{AccessStatus, SnapshotId, StorageStatus, TxContext},
};

#[derive(Clone, Debug, Default)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub storage: HashMap<H256, H256>,
    pub transient_storage: HashMap<H256, H256>,
}

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub address: Address,
    pub data: Bytes,
    pub topics: Vec<H256>,
}

#[derive(Clone)]
struct Checkpoint {
    accounts: HashMap<Address, Account>,
    logs_len: usize,
    accessed_accounts: HashSet<Address>,
    accessed_storage_keys: HashSet<(Address, H256)>,
    created_in_tx: HashSet<Address>,
    destructed_len: usize,
}

/// In-memory `Host`. Every account not in `accounts` is treated as
/// non-existent (zero balance, empty code, nonce 0).
#[derive(Clone, Debug)]
pub struct MockedHost {
    pub accounts: HashMap<Address, Account>,
    /// Storage values as they stood at the start of the transaction, used
    /// by `get_original_storage`. Not touched by `set_storage`.
    pub original_storage: HashMap<(Address, H256), H256>,
    pub tx_context: TxContext,
    pub block_hashes: HashMap<u64, H256>,
    pub blob_hashes: Vec<H256>,
    pub revision: Revision,
    pub logs: Vec<LogEntry>,
    pub accessed_accounts: HashSet<Address>,
    pub accessed_storage_keys: HashSet<(Address, H256)>,
    pub created_in_tx: HashSet<Address>,
    pub destructed: Vec<(Address, Address)>,
    checkpoints: Vec<Checkpoint>,
}

impl Default for MockedHost {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            original_storage: HashMap::new(),
            tx_context: TxContext {
                tx_gas_price: U256::zero(),
                tx_origin: Address::zero(),
                block_coinbase: Address::zero(),
                block_number: 0,
                block_timestamp: 0,
                block_gas_limit: u64::MAX,
                block_difficulty: U256::zero(),
                block_base_fee: U256::zero(),
                blob_base_fee: U256::zero(),
                chain_id: U256::zero(),
            },
            block_hashes: HashMap::new(),
            blob_hashes: Vec::new(),
            revision: Revision::Cancun,
            logs: Vec::new(),
            accessed_accounts: HashSet::new(),
            accessed_storage_keys: HashSet::new(),
            created_in_tx: HashSet::new(),
            destructed: Vec::new(),
            checkpoints: Vec::new(),
        }
    }
}

impl MockedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&mut self, address: Address) -> &mut Account {
        self.accounts.entry(address).or_default()
    }

    /// Seeds `address`'s storage and records the same values as the
    /// transaction-start snapshot `get_original_storage` reports.
    pub fn set_initial_storage(&mut self, address: Address, key: H256, value: H256) {
        self.account(address).storage.insert(key, value);
        self.original_storage.insert((address, key), value);
    }
}

impl Host for MockedHost {
    fn account_exists(&mut self, address: Address) -> anyhow::Result<bool> {
        Ok(self.accounts.contains_key(&address))
    }

    fn get_balance(&mut self, address: Address) -> anyhow::Result<U256> {
        Ok(self.accounts.get(&address).map(|a| a.balance).unwrap_or_default())
    }

    fn get_code(&mut self, address: Address) -> anyhow::Result<Bytes> {
        Ok(self.accounts.get(&address).map(|a| a.code.clone()).unwrap_or_default())
    }

    fn set_code(&mut self, address: Address, code: Bytes) -> anyhow::Result<()> {
        self.account(address).code = code;
        Ok(())
    }

    fn get_code_size(&mut self, address: Address) -> anyhow::Result<u64> {
        Ok(self.accounts.get(&address).map(|a| a.code.len() as u64).unwrap_or(0))
    }

    fn get_code_hash(&mut self, address: Address) -> anyhow::Result<H256> {
        use sha3::{Digest, Keccak256};
        Ok(match self.accounts.get(&address) {
            Some(a) if !a.code.is_empty() => H256::from_slice(&Keccak256::digest(&a.code)),
            _ => H256::zero(),
        })
    }

    fn get_nonce(&mut self, address: Address) -> anyhow::Result<u64> {
        Ok(self.accounts.get(&address).map(|a| a.nonce).unwrap_or(0))
    }

    fn increment_nonce(&mut self, address: Address) -> anyhow::Result<u64> {
        let nonce = &mut self.account(address).nonce;
        *nonce += 1;
        Ok(*nonce)
    }

    fn sub_balance(&mut self, address: Address, amount: U256) -> anyhow::Result<()> {
        let balance = &mut self.account(address).balance;
        *balance = balance.checked_sub(amount).ok_or_else(|| anyhow::anyhow!("insufficient balance"))?;
        Ok(())
    }

    fn add_balance(&mut self, address: Address, amount: U256) -> anyhow::Result<()> {
        self.account(address).balance += amount;
        Ok(())
    }

    fn get_storage(&mut self, address: Address, key: H256) -> anyhow::Result<H256> {
        Ok(self
            .accounts
            .get(&address)
            .and_then(|a| a.storage.get(&key))
            .copied()
            .unwrap_or_default())
    }

    fn set_storage(
        &mut self,
        address: Address,
        key: H256,
        value: H256,
    ) -> anyhow::Result<StorageStatus> {
        let original = self.original_storage.get(&(address, key)).copied().unwrap_or_default();
        let current = self.get_storage(address, key)?;

        self.account(address).storage.insert(key, value);

        Ok(if current == value {
            StorageStatus::Unchanged
        } else if current == original {
            // First write to this slot this transaction.
            if original.is_zero() {
                StorageStatus::Added
            } else if value.is_zero() {
                StorageStatus::Deleted
            } else {
                StorageStatus::Modified
            }
        } else {
            // Slot already dirtied earlier this transaction.
            StorageStatus::ModifiedAgain
        })
    }

    fn get_original_storage(&mut self, address: Address, key: H256) -> anyhow::Result<H256> {
        Ok(self.original_storage.get(&(address, key)).copied().unwrap_or_default())
    }

    fn get_transient_storage(&mut self, address: Address, key: H256) -> anyhow::Result<H256> {
        Ok(self
            .accounts
            .get(&address)
            .and_then(|a| a.transient_storage.get(&key))
            .copied()
            .unwrap_or_default())
    }

    fn set_transient_storage(
        &mut self,
        address: Address,
        key: H256,
        value: H256,
    ) -> anyhow::Result<()> {
        self.account(address).transient_storage.insert(key, value);
        Ok(())
    }

    fn get_tx_context(&mut self) -> anyhow::Result<TxContext> {
        Ok(self.tx_context)
    }

    fn get_block_hash(&mut self, block_number: u64) -> anyhow::Result<H256> {
        Ok(self.block_hashes.get(&block_number).copied().unwrap_or_default())
    }

    fn blob_hash(&mut self, index: usize) -> anyhow::Result<Option<H256>> {
        Ok(self.blob_hashes.get(index).copied())
    }

    fn get_hardfork(&mut self) -> anyhow::Result<Revision> {
        Ok(self.revision)
    }

    fn access_account(&mut self, address: Address) -> anyhow::Result<AccessStatus> {
        Ok(if self.accessed_accounts.insert(address) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        })
    }

    fn access_storage(&mut self, address: Address, key: H256) -> anyhow::Result<AccessStatus> {
        Ok(if self.accessed_storage_keys.insert((address, key)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        })
    }

    fn create_snapshot(&mut self) -> anyhow::Result<SnapshotId> {
        self.checkpoints.push(Checkpoint {
            accounts: self.accounts.clone(),
            logs_len: self.logs.len(),
            accessed_accounts: self.accessed_accounts.clone(),
            accessed_storage_keys: self.accessed_storage_keys.clone(),
            created_in_tx: self.created_in_tx.clone(),
            destructed_len: self.destructed.len(),
        });
        Ok(self.checkpoints.len() as u64 - 1)
    }

    fn revert_to_snapshot(&mut self, id: SnapshotId) -> anyhow::Result<()> {
        let checkpoint = self
            .checkpoints
            .get(id as usize)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown snapshot id {id}"))?;
        self.accounts = checkpoint.accounts;
        self.logs.truncate(checkpoint.logs_len);
        self.accessed_accounts = checkpoint.accessed_accounts;
        self.accessed_storage_keys = checkpoint.accessed_storage_keys;
        self.created_in_tx = checkpoint.created_in_tx;
        self.destructed.truncate(checkpoint.destructed_len);
        self.checkpoints.truncate(id as usize + 1);
        Ok(())
    }

    fn emit_log(&mut self, address: Address, data: Bytes, topics: &[H256]) -> anyhow::Result<()> {
        self.logs.push(LogEntry { address, data, topics: topics.to_vec() });
        Ok(())
    }

    fn register_created_contract(&mut self, address: Address) -> anyhow::Result<()> {
        self.created_in_tx.insert(address);
        Ok(())
    }

    fn was_created_in_tx(&mut self, address: Address) -> anyhow::Result<bool> {
        Ok(self.created_in_tx.contains(&address))
    }

    fn mark_for_destruction(&mut self, address: Address, beneficiary: Address) -> anyhow::Result<()> {
        // EIP-6780: the balance moves unconditionally; only the account's
        // actual removal (code/storage/nonce) is gated on having been
        // created in the current transaction, and this minimal mock never
        // models that removal at all (`selfdestruct` below doesn't either).
        self.selfdestruct(address, beneficiary)?;
        self.destructed.push((address, beneficiary));
        Ok(())
    }

    fn selfdestruct(&mut self, address: Address, beneficiary: Address) -> anyhow::Result<()> {
        let balance = self.get_balance(address)?;
        if !balance.is_zero() && address != beneficiary {
            self.add_balance(beneficiary, balance)?;
        }
        if let Some(account) = self.accounts.get_mut(&address) {
            account.balance = U256::zero();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_account_reads_as_empty() {
        let mut host = MockedHost::new();
        let addr = Address::from_low_u64_be(1);
        assert!(!host.account_exists(addr).unwrap());
        assert_eq!(host.get_balance(addr).unwrap(), U256::zero());
        assert_eq!(host.get_code_size(addr).unwrap(), 0);
    }

    #[test]
    fn snapshot_revert_restores_balance_and_logs() {
        let mut host = MockedHost::new();
        let addr = Address::from_low_u64_be(1);
        host.add_balance(addr, U256::from(100)).unwrap();

        let snapshot = host.create_snapshot().unwrap();
        host.add_balance(addr, U256::from(50)).unwrap();
        host.emit_log(addr, Bytes::new(), &[]).unwrap();
        assert_eq!(host.get_balance(addr).unwrap(), U256::from(150));
        assert_eq!(host.logs.len(), 1);

        host.revert_to_snapshot(snapshot).unwrap();
        assert_eq!(host.get_balance(addr).unwrap(), U256::from(100));
        assert!(host.logs.is_empty());
    }

    #[test]
    fn access_account_reports_cold_then_warm() {
        let mut host = MockedHost::new();
        let addr = Address::from_low_u64_be(1);
        assert_eq!(host.access_account(addr).unwrap(), AccessStatus::Cold);
        assert_eq!(host.access_account(addr).unwrap(), AccessStatus::Warm);
    }
}
