//! The orchestrator: owns the per-revision configuration, the analysis
//! cache and the refund accumulator, and recurses into itself for every
//! nested CALL/CREATE rather than handing the nested dispatch back to the
//! Host. This is the one deliberate architectural departure from the
//! teacher crate, which instead suspended a coroutine and let an external
//! driver resume it with the nested call's result.

use bytes::Bytes;
use ethereum_types::{Address, H256};
use sha3::{Digest, Keccak256};

use crate::{
    analyzer,
    cache::AnalysisCache,
    common::{CallKind, Revision, StatusCode},
    config::Config,
    frame::Frame,
    host::Host,
    interpreter,
    message::{CallParams, CallResult},
    opcode::OpCode,
    refund::RefundAccumulator,
};

/// What a debug hook wants the interpreter to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepAction {
    Continue,
    /// Halts the current frame. There is no support for resuming a paused
    /// frame mid-instruction, so this has the same observable effect as
    /// `Abort`: the frame halts and its snapshot is reverted.
    Pause,
    /// Halts the current frame with `StatusCode::DebugAbort`.
    Abort,
}

/// Which side of a nested call `on_message` is reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessagePhase {
    Enter,
    Exit,
}

/// Caller-supplied tracing/debugging seam. Entirely optional; `Evm` runs
/// with no hooks installed by default.
pub trait DebugHooks {
    /// Called before every non-`BeginBlock` instruction.
    fn on_step(&mut self, frame: &Frame, ip: usize, opcode: Option<OpCode>) -> StepAction {
        let _ = (frame, ip, opcode);
        StepAction::Continue
    }

    /// Called on entry to and exit from every nested `Evm::call`.
    fn on_message(&mut self, params: &CallParams, phase: MessagePhase) {
        let _ = (params, phase);
    }
}

/// Outcome of a single precompile invocation.
pub struct PrecompileOutcome {
    pub success: bool,
    pub gas_used: u64,
    pub output: Bytes,
}

/// Pluggable precompile dispatch. `Evm` does not ship any precompile
/// implementations (crypto/modexp/pairing are out of scope for the core);
/// an embedder wires one in via `Evm::set_precompiles` when it needs
/// addresses 1..9 (and later forks' extras) to resolve to something other
/// than plain empty-code accounts.
pub trait Precompiles {
    fn is_precompile(&self, address: Address, revision: Revision) -> bool;
    fn call(&mut self, address: Address, input: &[u8], gas: i64) -> anyhow::Result<PrecompileOutcome>;
}

/// The EVM core: one instance runs one call tree (a transaction and
/// everything it calls into) on one thread. Sharing a single `Evm` across
/// threads is not supported; sharing its `AnalysisCache` is, since
/// contract analysis is pure and keyed by `(code hash, revision)` (see
/// `cache.rs`), but that is an embedder-level concern outside this type.
pub struct Evm {
    revision: Revision,
    config: Config,
    cache: AnalysisCache,
    refund: RefundAccumulator,
    hooks: Option<Box<dyn DebugHooks>>,
    precompiles: Option<Box<dyn Precompiles>>,
}

impl Evm {
    pub fn new(revision: Revision) -> Self {
        Self {
            revision,
            config: Config::from(revision),
            cache: AnalysisCache::default(),
            refund: RefundAccumulator::new(),
            hooks: None,
            precompiles: None,
        }
    }

    pub fn with_cache_capacity(revision: Revision, capacity: usize) -> Self {
        Self {
            cache: AnalysisCache::new(capacity),
            ..Self::new(revision)
        }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_debug_hooks(&mut self, hooks: Box<dyn DebugHooks>) {
        self.hooks = Some(hooks);
    }

    pub fn clear_debug_hooks(&mut self) {
        self.hooks = None;
    }

    pub fn set_precompiles(&mut self, precompiles: Box<dyn Precompiles>) {
        self.precompiles = Some(precompiles);
    }

    /// Clears per-transaction state (the refund accumulator) ahead of a new
    /// top-level call. The analysis cache, debug hooks and precompile
    /// dispatcher all survive a reset: they are process/session-scoped, not
    /// per-transaction.
    pub fn reset(&mut self) {
        self.refund = RefundAccumulator::new();
    }

    pub fn refund(&self) -> i64 {
        self.refund.raw()
    }

    /// Caps the accumulated refund under EIP-3529/EIP-2200, given the total
    /// gas the top-level call consumed.
    pub fn apply_refund(&self, gas_used: u64) -> u64 {
        self.refund.apply(gas_used, self.config.has_reduced_refunds)
    }

    pub(crate) fn hooks_mut(&mut self) -> Option<&mut dyn DebugHooks> {
        self.hooks.as_deref_mut()
    }

    pub(crate) fn refund_mut(&mut self) -> &mut RefundAccumulator {
        &mut self.refund
    }

    /// Runs a call or create to completion. `depth` is the depth of the
    /// frame being entered (0 for a transaction's top-level call).
    pub fn call(&mut self, host: &mut dyn Host, params: CallParams, depth: u16) -> CallResult {
        if depth as usize > 1024 {
            // No child frame is ever created, so none of the gas the caller
            // forwarded was actually spent; hand it all back rather than
            // letting the opcode handler's `gas_used = forwarded - gas_left`
            // subtraction burn the whole 63/64 share for nothing.
            return CallResult {
                status: StatusCode::CallDepthExceeded,
                gas_left: params.gas,
                output: Bytes::new(),
                created_address: None,
            };
        }

        if let Some(hooks) = &mut self.hooks {
            hooks.on_message(&params, MessagePhase::Enter);
        }

        let result = match host.create_snapshot() {
            Ok(snapshot) => {
                let result = if params.is_create() {
                    self.execute_create(host, &params, depth)
                } else {
                    self.execute_call(host, &params, depth)
                };
                if !result.is_success() {
                    let _ = host.revert_to_snapshot(snapshot);
                }
                result
            }
            Err(_) => CallResult::halt(StatusCode::InternalError),
        };

        if let Some(hooks) = &mut self.hooks {
            hooks.on_message(&params, MessagePhase::Exit);
        }

        result
    }

    fn execute_call(&mut self, host: &mut dyn Host, params: &CallParams, depth: u16) -> CallResult {
        if matches!(params.kind, CallKind::Call | CallKind::CallCode) && !params.value.is_zero() {
            match host.get_balance(params.caller) {
                Ok(balance) if balance >= params.value => {}
                Ok(_) => {
                    return CallResult {
                        status: StatusCode::Revert,
                        gas_left: params.gas,
                        output: Bytes::new(),
                        created_address: None,
                    }
                }
                Err(_) => return CallResult::halt(StatusCode::InternalError),
            }
        }

        if let Some(precompiles) = &mut self.precompiles {
            if precompiles.is_precompile(params.code_address, self.revision) {
                return match precompiles.call(params.code_address, &params.input, params.gas) {
                    Ok(outcome) => CallResult {
                        status: if outcome.success {
                            StatusCode::Return
                        } else {
                            StatusCode::PrecompileFailure
                        },
                        gas_left: (params.gas - outcome.gas_used as i64).max(0),
                        output: outcome.output,
                        created_address: None,
                    },
                    Err(_) => CallResult::halt(StatusCode::PrecompileFailure),
                };
            }
        }

        if matches!(params.kind, CallKind::Call) && !params.value.is_zero() {
            if host.sub_balance(params.caller, params.value).is_err()
                || host.add_balance(params.to, params.value).is_err()
            {
                return CallResult::halt(StatusCode::InternalError);
            }
        }

        let code = match host.get_code(params.code_address) {
            Ok(c) => c,
            Err(_) => return CallResult::halt(StatusCode::InternalError),
        };

        if code.is_empty() {
            return CallResult {
                status: StatusCode::Stop,
                gas_left: params.gas,
                output: Bytes::new(),
                created_address: None,
            };
        }

        let analysis = match self.cache.get_or_analyze(code, self.revision, analyzer::MAX_CODE_SIZE) {
            Ok(a) => a,
            Err(status) => return CallResult::halt(status),
        };

        let mut frame = Frame::new(
            analysis,
            params.to,
            params.caller,
            params.value,
            params.input.clone(),
            params.gas,
            depth,
            params.is_static,
        );

        let status = interpreter::interpret(&mut frame, self, host);
        finish(status, frame)
    }

    fn execute_create(&mut self, host: &mut dyn Host, params: &CallParams, depth: u16) -> CallResult {
        if !params.value.is_zero() {
            match host.get_balance(params.caller) {
                Ok(balance) if balance >= params.value => {}
                Ok(_) => {
                    return CallResult {
                        status: StatusCode::Revert,
                        gas_left: params.gas,
                        output: Bytes::new(),
                        created_address: None,
                    }
                }
                Err(_) => return CallResult::halt(StatusCode::InternalError),
            }
        }

        let nonce = match host.increment_nonce(params.caller) {
            Ok(n) => n,
            Err(_) => return CallResult::halt(StatusCode::InternalError),
        };

        let address = match params.kind {
            CallKind::Create => create_address(params.caller, nonce),
            CallKind::Create2 { salt } => create2_address(params.caller, salt, &params.input),
            _ => return CallResult::halt(StatusCode::InternalError),
        };

        let collides = match (host.get_code_size(address), host.get_nonce(address)) {
            (Ok(size), Ok(existing_nonce)) => size > 0 || existing_nonce > 0,
            _ => return CallResult::halt(StatusCode::InternalError),
        };
        if collides {
            return CallResult {
                status: StatusCode::Revert,
                gas_left: params.gas,
                output: Bytes::new(),
                created_address: None,
            };
        }

        if !params.value.is_zero()
            && (host.sub_balance(params.caller, params.value).is_err()
                || host.add_balance(address, params.value).is_err())
        {
            return CallResult::halt(StatusCode::InternalError);
        }

        let analysis = match self
            .cache
            .get_or_analyze(params.input.clone(), self.revision, analyzer::MAX_INITCODE_SIZE)
        {
            Ok(a) => a,
            Err(status) => return CallResult::halt(status),
        };

        let mut frame = Frame::new(analysis, address, params.caller, params.value, Bytes::new(), params.gas, depth, false);

        let status = interpreter::interpret(&mut frame, self, host);
        self.finish_create(host, status, frame, address)
    }

    fn finish_create(&mut self, host: &mut dyn Host, status: StatusCode, frame: Frame, address: Address) -> CallResult {
        match status {
            StatusCode::Revert => CallResult {
                status,
                gas_left: frame.gas_remaining.max(0),
                output: frame.output,
                created_address: None,
            },
            StatusCode::Stop | StatusCode::Return => {
                let code = frame.output;

                if code.first() == Some(&0xef) {
                    return CallResult::halt(StatusCode::InvalidOpcode);
                }
                if let Some(limit) = self.config.create_contract_limit {
                    if code.len() > limit {
                        return CallResult::halt(StatusCode::OutOfGas);
                    }
                }

                let deposit_cost = 200u64.saturating_mul(code.len() as u64);
                if frame.gas_remaining < deposit_cost as i64 {
                    return CallResult::halt(StatusCode::OutOfGas);
                }
                let gas_left = frame.gas_remaining - deposit_cost as i64;

                if host.set_code(address, code).is_err() || host.register_created_contract(address).is_err() {
                    return CallResult::halt(StatusCode::InternalError);
                }

                CallResult {
                    status: StatusCode::Return,
                    gas_left,
                    output: Bytes::new(),
                    created_address: Some(address),
                }
            }
            other => CallResult::halt(other),
        }
    }
}

fn finish(status: StatusCode, frame: Frame) -> CallResult {
    let gas_left = if status.is_halt() { frame.gas_remaining.max(0) } else { 0 };
    CallResult {
        status,
        gas_left,
        output: frame.output,
        created_address: None,
    }
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// Minimal RLP byte-string encoder, sufficient for the two short strings
/// (a 20-byte address, an up-to-8-byte nonce) the CREATE address formula
/// needs. Long-form (>=56 bytes) list/string encoding is intentionally not
/// implemented: neither input can ever reach that length.
fn rlp_bytes(data: &[u8]) -> Vec<u8> {
    if data.len() == 1 && data[0] < 0x80 {
        vec![data[0]]
    } else {
        let mut out = Vec::with_capacity(1 + data.len());
        out.push(0x80 + data.len() as u8);
        out.extend_from_slice(data);
        out
    }
}

/// `keccak256(rlp([sender, nonce]))[12..]`, per the Yellow Paper's CREATE
/// address formula.
fn create_address(sender: Address, nonce: u64) -> Address {
    let nonce_bytes = trim_leading_zeros(&nonce.to_be_bytes());
    let encoded_sender = rlp_bytes(sender.as_bytes());
    let encoded_nonce = rlp_bytes(nonce_bytes);
    let payload_len = encoded_sender.len() + encoded_nonce.len();

    let mut out = Vec::with_capacity(1 + payload_len);
    out.push(0xc0 + payload_len as u8);
    out.extend_from_slice(&encoded_sender);
    out.extend_from_slice(&encoded_nonce);

    let hash = Keccak256::digest(&out);
    Address::from_slice(&hash[12..])
}

/// `keccak256(0xff ++ sender ++ salt ++ keccak256(init_code))[12..]`,
/// EIP-1014.
fn create2_address(sender: Address, salt: H256, init_code: &[u8]) -> Address {
    let init_code_hash = Keccak256::digest(init_code);

    let mut buf = Vec::with_capacity(1 + 20 + 32 + 32);
    buf.push(0xff);
    buf.extend_from_slice(sender.as_bytes());
    buf.extend_from_slice(salt.as_bytes());
    buf.extend_from_slice(&init_code_hash);

    let hash = Keccak256::digest(&buf);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_address_zero_nonce_matches_known_vector() {
        // geth's `crypto.CreateAddress(addr, 0)` for the zero address.
        let addr = create_address(Address::zero(), 0);
        assert_eq!(
            addr,
            "0xbd770416a3345f91e4b34576cb804a576fa48eb1".parse().unwrap()
        );
    }

    #[test]
    fn create2_address_is_deterministic() {
        let sender = Address::from_low_u64_be(1);
        let salt = H256::zero();
        let a = create2_address(sender, salt, &[0x60, 0x00]);
        let b = create2_address(sender, salt, &[0x60, 0x00]);
        assert_eq!(a, b);
    }
}
