//! A fluent wrapper over `Evm::call` for assembling execution checks, in
//! the style of the teacher's `EvmTester`. Synchronous throughout, since
//! `Evm::call` itself no longer suspends into a coroutine.

use std::sync::Arc;

use bytes::Bytes;
use ethereum_types::{Address, U256};

use crate::{
    common::{CallKind, Revision, StatusCode},
    evm::Evm,
    message::{CallParams, CallResult},
    util::{bytecode::Bytecode, mocked_host::MockedHost},
};

#[derive(Clone, Copy, Debug)]
enum GasCheck {
    Used(i64),
    Left(i64),
}

/// Tester that executes EVM bytecode against a `MockedHost` and runs a
/// set of checks against the result.
#[allow(clippy::type_complexity)]
#[must_use]
pub struct EvmTester {
    host: MockedHost,
    apply_host_fns: Vec<Box<dyn Fn(&mut MockedHost, &CallParams)>>,
    inspect_output_fn: Arc<dyn Fn(&[u8])>,
    inspect_host_fn: Arc<dyn Fn(&MockedHost, &CallParams)>,
    inspect_fn: Arc<dyn Fn(&MockedHost, &CallParams, &[u8])>,
    revision: Revision,
    kind: CallKind,
    caller: Address,
    destination: Address,
    value: U256,
    input: Bytes,
    gas: i64,
    is_static: bool,
    depth: u16,
    code: Bytes,
    gas_check: Option<GasCheck>,
    expected_status_codes: Option<Vec<StatusCode>>,
    expected_output_data: Option<Vec<u8>>,
}

impl Default for EvmTester {
    fn default() -> Self {
        Self::new()
    }
}

impl EvmTester {
    /// Create new `EvmTester`.
    pub fn new() -> Self {
        Self {
            host: MockedHost::default(),
            apply_host_fns: Vec::new(),
            inspect_output_fn: Arc::new(|_| ()),
            inspect_host_fn: Arc::new(|_, _| ()),
            inspect_fn: Arc::new(|_, _, _| ()),
            revision: Revision::Byzantium,
            kind: CallKind::Call,
            caller: Address::zero(),
            destination: Address::zero(),
            value: U256::zero(),
            input: Bytes::new(),
            gas: i64::MAX,
            is_static: false,
            depth: 0,
            code: Bytes::new(),
            gas_check: None,
            expected_status_codes: None,
            expected_output_data: None,
        }
    }

    /// Set code to be executed.
    pub fn code(mut self, code: impl Into<Bytecode>) -> Self {
        self.code = code.into().build().into();
        self
    }

    /// Queue a function that modifies the host/params before execution.
    pub fn apply_host_fn(
        mut self,
        host_fn: impl Fn(&mut MockedHost, &CallParams) + 'static,
    ) -> Self {
        self.apply_host_fns.push(Box::new(host_fn));
        self
    }

    /// Set EVM revision for this tester.
    pub fn revision(mut self, revision: Revision) -> Self {
        self.revision = revision;
        self
    }

    /// Set the call kind (CALL by default).
    pub fn kind(mut self, kind: CallKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set frame depth.
    pub fn depth(mut self, depth: u16) -> Self {
        self.depth = depth;
        self
    }

    /// Set provided gas.
    pub fn gas(mut self, gas: i64) -> Self {
        self.gas = gas;
        self
    }

    /// Set the static call flag.
    pub fn set_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Set the callee address, where `code` gets installed.
    pub fn destination(mut self, destination: impl Into<Address>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Set the caller address.
    pub fn sender(mut self, sender: impl Into<Address>) -> Self {
        self.caller = sender.into();
        self
    }

    /// Set call value.
    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    /// Check how much gas will be used. Mutually exclusive with `gas_left`.
    pub fn gas_used(mut self, expected_gas_used: i64) -> Self {
        self.gas_check = Some(GasCheck::Used(expected_gas_used));
        self
    }

    /// Check how much gas will be left after execution. Mutually exclusive
    /// with `gas_used`.
    pub fn gas_left(mut self, expected_gas_left: i64) -> Self {
        self.gas_check = Some(GasCheck::Left(expected_gas_left));
        self
    }

    /// Set provided input data.
    pub fn input(mut self, input: impl Into<Bytes>) -> Self {
        self.input = input.into();
        self
    }

    /// Check returned status.
    pub fn status(mut self, expected_status_code: StatusCode) -> Self {
        self.expected_status_codes = Some(vec![expected_status_code]);
        self
    }

    /// Check returned status to be one of these.
    pub fn status_one_of<const N: usize>(mut self, expected_status_code: [StatusCode; N]) -> Self {
        self.expected_status_codes = Some(expected_status_code.to_vec());
        self
    }

    /// Check output to be equal to provided integer.
    pub fn output_value(mut self, expected_output_data: impl Into<U256>) -> Self {
        let mut data = [0; 32];
        expected_output_data.into().to_big_endian(&mut data);
        self.expected_output_data = Some(data.to_vec());
        self
    }

    /// Check output data to be equal to provided byte string.
    pub fn output_data(mut self, expected_output_data: impl Into<Vec<u8>>) -> Self {
        self.expected_output_data = Some(expected_output_data.into());
        self
    }

    /// Inspect output with provided function.
    pub fn inspect_output(mut self, inspect_output_fn: impl Fn(&[u8]) + 'static) -> Self {
        self.inspect_output_fn = Arc::new(inspect_output_fn);
        self
    }

    /// Inspect host with provided function.
    pub fn inspect_host(mut self, f: impl Fn(&MockedHost, &CallParams) + 'static) -> Self {
        self.inspect_host_fn = Arc::new(f);
        self
    }

    /// Inspect host and output with provided function.
    pub fn inspect(mut self, f: impl Fn(&MockedHost, &CallParams, &[u8]) + 'static) -> Self {
        self.inspect_fn = Arc::new(f);
        self
    }

    /// Execute provided code, run checks and return the call result.
    pub fn check_and_get_result(mut self) -> CallResult {
        self.host.account(self.destination).code = self.code.clone();

        // Mirrors the orchestrator's own EIP-2929 warm-up for a top-level
        // call: the sender and recipient start warm from Berlin onward.
        if self.revision >= Revision::Berlin {
            let _ = self.host.access_account(self.caller);
            let _ = self.host.access_account(self.destination);
        }

        let params = CallParams {
            kind: self.kind,
            caller: self.caller,
            to: self.destination,
            code_address: self.destination,
            value: self.value,
            input: self.input.clone(),
            gas: self.gas,
            is_static: self.is_static,
        };

        for f in &self.apply_host_fns {
            (f)(&mut self.host, &params);
        }

        let mut evm = Evm::new(self.revision);
        let result = evm.call(&mut self.host, params.clone(), self.depth);

        if let Some(status_codes) = &self.expected_status_codes {
            if !status_codes.iter().any(|s| *s == result.status) {
                panic!(
                    "Status code mismatch: {}, but must be one of {:?}",
                    result.status, status_codes
                );
            }
        }

        if let Some(gas_check) = self.gas_check {
            match gas_check {
                GasCheck::Used(used) => assert_eq!(self.gas - result.gas_left, used),
                GasCheck::Left(left) => assert_eq!(result.gas_left, left),
            }
        }

        if let Some(expected_data) = &self.expected_output_data {
            assert_eq!(&*result.output, expected_data);
        }

        (self.inspect_output_fn)(&result.output);
        (self.inspect_host_fn)(&self.host, &params);
        (self.inspect_fn)(&self.host, &params, &result.output);

        result
    }

    /// Execute provided code and run checks.
    pub fn check(self) {
        self.check_and_get_result();
    }
}
