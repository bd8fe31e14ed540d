//! CALL family, CREATE family and SELFDESTRUCT semantics, exercised
//! end-to-end against `MockedHost` rather than a mocked single call
//! result: nested calls recurse into a real `Evm::call`, so these tests
//! deploy real callee code and observe its actual effect on host state.

use ethereum_types::{Address, U256};
use hex_literal::hex;
use revolt::{opcode::*, util::*, *};

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn address_to_u256(a: Address) -> U256 {
    U256::from_big_endian(a.as_bytes())
}

#[test]
fn call_forwards_output_into_caller_memory() {
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        .apply_host_fn(move |host, _| {
            host.account(callee).code = Bytecode::new().pushv(42u64).ret_top().build().into();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::call(address_to_u256(callee)).gas(100_000).output(0, 32))
                .opcode(OpCode::POP)
                .ret(0, 32),
        )
        .gas(1_000_000)
        .status(StatusCode::Return)
        .output_value(42u64)
        .check();
}

#[test]
fn call_transfers_value_between_accounts() {
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        // The executing contract lives at the tester's default destination
        // (the zero address); that account is what CALL debits from.
        .apply_host_fn(move |host, _| {
            host.account(Address::zero()).balance = U256::from(1_000);
            host.account(callee).code = Bytecode::new().opcode(OpCode::STOP).build().into();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::call(address_to_u256(callee)).gas(100_000).value(100))
                .opcode(OpCode::STOP),
        )
        .gas(1_000_000)
        .status(StatusCode::Stop)
        .inspect_host(move |host, _| {
            assert_eq!(host.accounts.get(&callee).unwrap().balance, U256::from(100));
        })
        .check();
}

#[test]
fn call_at_depth_limit_pushes_zero_without_recursing() {
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        .depth(1024)
        .apply_host_fn(move |host, _| {
            host.account(callee).code = Bytecode::new().pushv(1u64).ret_top().build().into();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::call(address_to_u256(callee)).gas(100_000))
                .ret_top(),
        )
        .gas(1_000_000)
        .status(StatusCode::Return)
        .output_value(0u64)
        .check();
}

#[test]
fn zero_value_call_under_static_context_keeps_stack_aligned() {
    // A 0-value low-level CALL made from within a STATICCALL subtree still
    // pops its value operand; if it didn't, every operand read after it
    // (input offset/size, output offset/size) would be shifted by one slot.
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        .set_static(true)
        .apply_host_fn(move |host, _| {
            host.account(callee).code = Bytecode::new().pushv(7u64).ret_top().build().into();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::call(address_to_u256(callee)).gas(100_000).output(0, 32))
                .ret(0, 32),
        )
        .gas(1_000_000)
        .status(StatusCode::Return)
        .output_value(7u64)
        .check();
}

#[test]
fn value_bearing_call_under_static_context_is_write_protected() {
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        .set_static(true)
        .apply_host_fn(move |host, _| {
            host.account(Address::zero()).balance = U256::from(1_000);
            host.account(callee).code = Bytecode::new().opcode(OpCode::STOP).build().into();
        })
        .code(Bytecode::new().append_bc(CallInstruction::call(address_to_u256(callee)).gas(100_000).value(1)))
        .gas(1_000_000)
        .status(StatusCode::WriteProtection)
        .check();
}

#[test]
fn delegatecall_runs_callee_code_against_caller_storage() {
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        .apply_host_fn(move |host, _| {
            // The callee writes to slot 7; under DELEGATECALL this must
            // land in the caller's storage, not the callee's.
            host.account(callee).code = Bytecode::new().sstore(7, 0x2a).build().into();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::delegatecall(address_to_u256(callee)).gas(100_000))
                .opcode(OpCode::POP)
                .sload(7)
                .ret_top(),
        )
        .gas(1_000_000)
        .status(StatusCode::Return)
        .output_value(0x2au64)
        .inspect_host(move |host, _| {
            assert!(host.accounts.get(&callee).map(|a| a.storage.is_empty()).unwrap_or(true));
        })
        .check();
}

#[test]
fn staticcall_write_protection_reverts_nested_sstore() {
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        .apply_host_fn(move |host, _| {
            host.account(callee).code = Bytecode::new().sstore(0, 1).build().into();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::staticcall(address_to_u256(callee)).gas(100_000))
                .ret_top(),
        )
        .gas(1_000_000)
        .status(StatusCode::Return)
        .output_value(0u64) // STATICCALL's own opcode push: 0 = inner failure.
        .inspect_host(move |host, _| {
            assert!(host.accounts.get(&callee).map(|a| a.storage.is_empty()).unwrap_or(true));
        })
        .check();
}

#[test]
fn call_propagates_revert_output_and_refunds_unused_gas() {
    let callee = addr(0xee);

    EvmTester::new()
        .revision(Revision::Cancun)
        .apply_host_fn(move |host, _| {
            host.account(callee).code = Bytecode::new()
                .pushv(0xbadu64)
                .mstore(0)
                .pushv(32u64)
                .pushv(0u64)
                .opcode(OpCode::REVERT)
                .build()
                .into();
        })
        .code(
            Bytecode::new()
                .append_bc(CallInstruction::call(address_to_u256(callee)).gas(100_000).output(0, 32))
                .ret_top(),
        )
        .gas(1_000_000)
        .status(StatusCode::Return)
        .output_value(0u64) // CALL pushes 0 on a REVERT.
        .check();
}

#[test]
fn create_deploys_code_and_pushes_new_address() {
    // Initcode: return a single-byte runtime body (STOP).
    let initcode = Bytecode::new()
        .pushb(hex!("00")) // runtime code: STOP
        .mstore(0)
        .ret(31, 1);

    EvmTester::new()
        .revision(Revision::Cancun)
        .kind(CallKind::Create)
        .input(initcode.build())
        .gas(1_000_000)
        .status(StatusCode::Return)
        .inspect(|host, _params, _output| {
            let created = host
                .accounts
                .iter()
                .find(|(a, acct)| **a != Address::zero() && !acct.code.is_empty())
                .map(|(a, _)| *a);
            assert!(created.is_some(), "expected a deployed contract account");
        })
        .check();
}

#[test]
fn create2_is_deterministic_and_rejects_collision() {
    let mut host = MockedHost::new();
    let sender = addr(1);
    host.account(sender).balance = U256::from(1_000_000);

    let initcode = Bytecode::new().opcode(OpCode::STOP).build();

    let params = CallParams {
        kind: CallKind::Create2 { salt: ethereum_types::H256::zero() },
        caller: sender,
        to: Address::zero(),
        code_address: Address::zero(),
        value: U256::zero(),
        input: initcode.clone().into(),
        gas: 1_000_000,
        is_static: false,
    };

    let mut evm = Evm::new(Revision::Cancun);
    let first = evm.call(&mut host, params.clone(), 0);
    assert!(first.is_success());
    let address = first.created_address.expect("CREATE2 must report the new address");

    // Deploying with the same sender/salt/initcode a second time collides
    // with the already-deployed account and must fail.
    let second = evm.call(&mut host, params, 0);
    assert!(!second.is_success());
    assert!(second.created_address.is_none());
    assert!(!host.get_code(address).unwrap().is_empty());
}

#[test]
fn selfdestruct_transfers_balance_even_when_not_created_this_tx() {
    let contract = addr(0xee);
    let beneficiary = addr(2);

    EvmTester::new()
        .revision(Revision::Cancun) // EIP-6780 active
        .destination(contract)
        .apply_host_fn(move |host, _| {
            host.account(contract).balance = U256::from(500);
        })
        .code(Bytecode::new().pushv(address_to_u256(beneficiary)).opcode(OpCode::SELFDESTRUCT))
        .gas(1_000_000)
        .status(StatusCode::Stop)
        .inspect_host(move |host, _| {
            assert_eq!(host.accounts.get(&beneficiary).unwrap().balance, U256::from(500));
            assert_eq!(host.accounts.get(&contract).unwrap().balance, U256::zero());
        })
        .check();
}

#[test]
fn selfdestruct_in_static_context_fails() {
    EvmTester::new()
        .revision(Revision::Cancun)
        .set_static(true)
        .code(Bytecode::new().pushv(address_to_u256(addr(2))).opcode(OpCode::SELFDESTRUCT))
        .gas(1_000_000)
        .status(StatusCode::WriteProtection)
        .check();
}
