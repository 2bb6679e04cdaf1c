//! Contract-to-contract calls through `call_contract`.

mod common;

use vmbridge_primitives::ErrorCode;
use vmbridge_sandbox::config::MAX_CALL_DEPTH_LIMIT;
use vmbridge_sandbox::{Sandbox, SandboxConfig, SandboxError};

use common::*;

#[test]
fn test_nested_call_returns_callee_output() {
    let guard = deploy(&[(CALLEE, ECHO)]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"ping");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();
    assert_eq!(out.bytes().unwrap(), b"ping");
}

#[test]
fn test_nested_call_shares_the_gas_ledger() {
    let guard = deploy(&[(CALLEE, ECHO)]);
    let sandbox = sandbox();

    let mut alone = context(b"ping", GAS);
    let echo_used = sandbox.invoke(ECHO.as_bytes(), &mut alone).unwrap().gas_used();

    let input = call_input(&CALLEE, b"ping");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();
    assert!(out.gas_used() > echo_used);
    assert_eq!(ctx.gas_left, GAS - out.gas_used());
}

#[test]
fn test_callee_panic_propagates() {
    let guard = deploy(&[(CALLEE, PANIC)]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let err = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContractPanic);
    assert_eq!(err.message(), "contract says no");
    assert!(ctx.gas_left < GAS);
}

#[test]
fn test_callee_exhaustion_drains_caller() {
    let guard = deploy(&[(CALLEE, INFINITE_LOOP)]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"");
    let mut ctx = context_with_service(&input, 100_000, guard.handle());
    let err = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::GasExhausted);
    assert_eq!(ctx.gas_left, 0);
}

#[test]
fn test_unknown_callee_fails() {
    let guard = deploy(&[]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"ping");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let err = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HostCallFailure);
}

#[test]
fn test_call_without_service_fails() {
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"ping");
    let mut ctx = context(&input, GAS);
    let err = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HostCallFailure);
    assert!(err.message().contains("no host service"), "got: {}", err.message());
}

#[test]
fn test_call_after_service_dropped_fails() {
    let handle = deploy(&[(CALLEE, ECHO)]).handle();
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"ping");
    let mut ctx = context_with_service(&input, GAS, handle);
    let err = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HostCallFailure);
}

#[test]
fn test_bad_input_pointer_is_reported() {
    let sandbox = sandbox();
    // Shorter than an address, so the payload length goes negative.
    let mut ctx = context(&[0xC1; 5], GAS);
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();
    assert_eq!(le_i32(out.bytes().unwrap()), ErrorCode::OutOfBounds.as_i32());
}

#[test]
fn test_callee_sees_extended_caller_chain() {
    let guard = deploy(&[(CALLEE, CONTEXT_CALLERS)]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();

    let mut expected = BOB.to_vec();
    expected.extend_from_slice(&CONTRACT);
    assert_eq!(out.bytes().unwrap(), expected.as_slice());
}

#[test]
fn test_callee_runs_at_its_own_address() {
    let guard = deploy(&[(CALLEE, CONTEXT_SELF_ADDRESS)]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();
    assert_eq!(out.bytes().unwrap(), &CALLEE);
}

#[test]
fn test_witnesses_carry_into_callee() {
    let guard = deploy(&[(CALLEE, WITNESS_CHECK)]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, &ALICE);
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();
    assert_eq!(le_i32(out.bytes().unwrap()), 1);
}

#[test]
fn test_callee_logs_merge_into_caller() {
    let guard = deploy(&[(CALLEE, PRINTF)]);
    let config = SandboxConfig {
        enable_guest_logs: true,
        ..SandboxConfig::default()
    };
    let sandbox = sandbox_with_config(config);
    let input = call_input(&CALLEE, b"pong");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();
    assert_eq!(out.bytes().unwrap(), b"pong");
    assert_eq!(out.logs().len(), 2);
}

#[test]
fn test_callee_notifications_merge_into_caller() {
    let guard = deploy(&[(CALLEE, NOTIFY)]);
    let sandbox = sandbox();
    let input = call_input(&CALLEE, b"pong");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let out = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap();
    assert_eq!(out.bytes().unwrap(), b"pong");
    assert_eq!(out.notifications().len(), 1);
    assert_eq!(out.notifications()[0].contract, CALLEE);
    assert_eq!(out.notifications()[0].payload, b"transfer:42");
}

// ── Depth Limit ──

#[test]
fn test_recursion_stops_at_depth_limit() {
    let guard = deploy(&[(CALLEE, RECURSE)]);
    let config = SandboxConfig {
        max_call_depth: 4,
        ..SandboxConfig::default()
    };
    let sandbox = sandbox_with_config(config);
    let mut ctx = context_with_service(&CALLEE, GAS, guard.handle());
    let err = sandbox.invoke(RECURSE.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HostCallFailure);
    assert!(err.message().contains("depth"), "got: {}", err.message());
}

#[test]
fn test_zero_depth_forbids_nested_calls() {
    let guard = deploy(&[(CALLEE, ECHO)]);
    let config = SandboxConfig {
        max_call_depth: 0,
        ..SandboxConfig::default()
    };
    let sandbox = sandbox_with_config(config);
    let input = call_input(&CALLEE, b"ping");
    let mut ctx = context_with_service(&input, GAS, guard.handle());
    let err = sandbox.invoke(CALLER.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HostCallFailure);
}

#[test]
fn test_deepest_allowed_chain_fails_cleanly() {
    let guard = deploy(&[(CALLEE, RECURSE)]);
    let config = SandboxConfig {
        max_call_depth: MAX_CALL_DEPTH_LIMIT,
        ..SandboxConfig::default()
    };
    let sandbox = sandbox_with_config(config);
    let mut ctx = context_with_service(&CALLEE, GAS, guard.handle());
    let err = sandbox.invoke(RECURSE.as_bytes(), &mut ctx).unwrap_err();
    assert_eq!(err.code(), ErrorCode::HostCallFailure);
}

#[test]
fn test_unsafe_depth_rejected_at_construction() {
    let config = SandboxConfig {
        max_call_depth: 200,
        ..SandboxConfig::default()
    };
    let err = Sandbox::new(config).unwrap_err();
    assert!(matches!(err, SandboxError::ConfigError(_)));
}
