use crate::{metadata::WARM_STORAGE_READ_COST, Revision};

/// Runtime configuration for a single hardfork.
///
/// Built as a chain of `const fn`s, each one overriding only the fields that
/// changed relative to its predecessor fork — mirrors the upgrade history
/// itself instead of repeating the full field list at every fork.
#[derive(Clone, Debug)]
pub struct Config {
    pub gas_ext_code: u64,
    pub gas_ext_code_copy: u64,
    pub gas_ext_code_hash: u64,
    pub gas_sstore_set: u64,
    pub gas_sstore_reset: u64,
    pub refund_sstore_clears: i64,
    pub gas_balance: u64,
    pub gas_sload: u64,
    pub gas_suicide: u64,
    pub gas_suicide_new_account: u64,
    pub gas_call: u64,
    pub gas_expbyte: u64,
    pub gas_transaction_create: u64,
    pub gas_transaction_call: u64,
    pub gas_transaction_zero_data: u64,
    pub gas_transaction_non_zero_data: u64,
    pub gas_create_divisor: Option<u64>,
    /// EIP-1283 / EIP-2200 net-metered SSTORE.
    pub sstore_gas_metering: bool,
    /// EIP-1706.
    pub sstore_revert_under_stipend: bool,
    pub err_on_call_with_more_gas: bool,
    pub create_increase_nonce: bool,
    pub stack_limit: usize,
    pub memory_limit: usize,
    pub call_stack_limit: usize,
    pub create_contract_limit: Option<usize>,
    /// EIP-3860 initcode size limit; `None` before Shanghai.
    pub max_initcode_size: Option<usize>,
    pub call_stipend: u64,
    pub has_delegate_call: bool,
    pub has_create2: bool,
    pub has_revert: bool,
    pub has_return_data: bool,
    pub has_static_call: bool,
    pub has_bitwise_shifting: bool,
    pub has_chain_id: bool,
    pub has_self_balance: bool,
    pub has_ext_code_hash: bool,
    /// EIP-2929/2930 access lists and cold/warm accounting.
    pub has_access_list: bool,
    /// EIP-1559 base fee and BASEFEE opcode.
    pub has_base_fee: bool,
    /// EIP-3855 PUSH0.
    pub has_push0: bool,
    /// EIP-3529 reduced refunds / no SELFDESTRUCT refund.
    pub has_reduced_refunds: bool,
    /// EIP-3198 BASEFEE; tracked separately from `has_base_fee` since a
    /// future fork could in principle decouple the two.
    pub has_basefee_opcode: bool,
    /// EIP-4895 beacon chain withdrawals are a block-level concern; no
    /// core-level flag is needed, kept here only as a marker for callers
    /// building `TxContext`.
    pub has_withdrawals: bool,
    /// EIP-1153 transient storage (TLOAD/TSTORE).
    pub has_transient_storage: bool,
    /// EIP-5656 MCOPY.
    pub has_mcopy: bool,
    /// EIP-4844 BLOBHASH and blob-carrying transactions.
    pub has_blob_hash: bool,
    /// EIP-7516 BLOBBASEFEE.
    pub has_blob_base_fee: bool,
    /// EIP-6780 SELFDESTRUCT only deletes within the same transaction.
    pub selfdestruct_only_in_same_tx: bool,
}

impl Config {
    pub const fn frontier() -> Self {
        Self {
            gas_ext_code: 20,
            gas_ext_code_copy: 20,
            gas_ext_code_hash: 20,
            gas_balance: 20,
            gas_sload: 50,
            gas_sstore_set: 20000,
            gas_sstore_reset: 5000,
            refund_sstore_clears: 15000,
            gas_suicide: 0,
            gas_suicide_new_account: 0,
            gas_call: 40,
            gas_expbyte: 10,
            gas_transaction_create: 21000,
            gas_transaction_call: 21000,
            gas_transaction_zero_data: 4,
            gas_transaction_non_zero_data: 68,
            gas_create_divisor: None,
            sstore_gas_metering: false,
            sstore_revert_under_stipend: false,
            err_on_call_with_more_gas: true,
            create_increase_nonce: false,
            stack_limit: 1024,
            memory_limit: usize::MAX,
            call_stack_limit: 1024,
            create_contract_limit: None,
            max_initcode_size: None,
            call_stipend: 2300,
            has_delegate_call: false,
            has_create2: false,
            has_revert: false,
            has_return_data: false,
            has_static_call: false,
            has_bitwise_shifting: false,
            has_chain_id: false,
            has_self_balance: false,
            has_ext_code_hash: false,
            has_access_list: false,
            has_base_fee: false,
            has_push0: false,
            has_reduced_refunds: false,
            has_basefee_opcode: false,
            has_withdrawals: false,
            has_transient_storage: false,
            has_mcopy: false,
            has_blob_hash: false,
            has_blob_base_fee: false,
            selfdestruct_only_in_same_tx: false,
        }
    }

    pub const fn homestead() -> Self {
        Self {
            gas_transaction_create: 53000,
            has_delegate_call: true,
            ..Self::frontier()
        }
    }

    pub const fn tangerine() -> Self {
        Self {
            gas_ext_code: 700,
            gas_ext_code_copy: 700,
            gas_balance: 400,
            gas_sload: 200,
            gas_call: 700,
            gas_suicide: 5000,
            gas_suicide_new_account: 25000,
            gas_create_divisor: Some(64),
            ..Self::homestead()
        }
    }

    pub const fn spurious() -> Self {
        Self {
            create_contract_limit: Some(0x6000),
            ..Self::tangerine()
        }
    }

    pub const fn byzantium() -> Self {
        Self {
            has_revert: true,
            has_return_data: true,
            has_static_call: true,
            ..Self::spurious()
        }
    }

    pub const fn constantinople() -> Self {
        Self {
            has_bitwise_shifting: true,
            has_create2: true,
            has_ext_code_hash: true,
            sstore_gas_metering: true,
            ..Self::byzantium()
        }
    }

    pub const fn petersburg() -> Self {
        Self {
            sstore_gas_metering: false,
            ..Self::constantinople()
        }
    }

    pub const fn istanbul() -> Self {
        Self {
            sstore_gas_metering: true,
            sstore_revert_under_stipend: true,
            has_chain_id: true,
            gas_sload: 800,
            gas_balance: 700,
            gas_ext_code_hash: 700,
            has_self_balance: true,
            ..Self::petersburg()
        }
    }

    pub const fn berlin() -> Self {
        Self {
            gas_ext_code: WARM_STORAGE_READ_COST,
            gas_ext_code_copy: WARM_STORAGE_READ_COST,
            gas_ext_code_hash: WARM_STORAGE_READ_COST,
            gas_balance: WARM_STORAGE_READ_COST,
            gas_call: WARM_STORAGE_READ_COST,
            gas_sload: WARM_STORAGE_READ_COST,
            has_access_list: true,
            ..Self::istanbul()
        }
    }

    pub const fn london() -> Self {
        Self {
            has_base_fee: true,
            has_basefee_opcode: true,
            has_reduced_refunds: true,
            refund_sstore_clears: 4800,
            ..Self::berlin()
        }
    }

    /// The Merge changed PREVRANDAO semantics (block-context concern only,
    /// no core-level flag needed) and nothing else relevant here.
    pub const fn merge() -> Self {
        Self { ..Self::london() }
    }

    pub const fn shanghai() -> Self {
        Self {
            has_push0: true,
            max_initcode_size: Some(2 * 0x6000),
            has_withdrawals: true,
            ..Self::merge()
        }
    }

    pub const fn cancun() -> Self {
        Self {
            has_transient_storage: true,
            has_mcopy: true,
            has_blob_hash: true,
            has_blob_base_fee: true,
            selfdestruct_only_in_same_tx: true,
            ..Self::shanghai()
        }
    }
}

impl From<Revision> for Config {
    fn from(rev: Revision) -> Self {
        match rev {
            Revision::Frontier => Self::frontier(),
            Revision::Homestead => Self::homestead(),
            Revision::Tangerine => Self::tangerine(),
            Revision::Spurious => Self::spurious(),
            Revision::Byzantium => Self::byzantium(),
            Revision::Constantinople => Self::constantinople(),
            Revision::Petersburg => Self::petersburg(),
            Revision::Istanbul => Self::istanbul(),
            Revision::Berlin => Self::berlin(),
            Revision::London => Self::london(),
            Revision::Merge => Self::merge(),
            Revision::Shanghai => Self::shanghai(),
            Revision::Cancun => Self::cancun(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shanghai_diverges_from_london() {
        let shanghai = Config::from(Revision::Shanghai);
        let london = Config::from(Revision::London);
        assert!(shanghai.has_push0);
        assert!(!london.has_push0);
        assert_eq!(shanghai.max_initcode_size, Some(0xc000));
        assert_eq!(london.max_initcode_size, None);
    }

    #[test]
    fn cancun_enables_transient_storage_and_mcopy() {
        let cancun = Config::from(Revision::Cancun);
        assert!(cancun.has_transient_storage);
        assert!(cancun.has_mcopy);
        assert!(cancun.selfdestruct_only_in_same_tx);
    }

    #[test]
    fn london_reduces_sstore_clear_refund() {
        assert_eq!(Config::from(Revision::Berlin).refund_sstore_clears, 15000);
        assert_eq!(Config::from(Revision::London).refund_sstore_clears, 4800);
    }
}
