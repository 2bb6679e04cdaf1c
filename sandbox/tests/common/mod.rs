//! Shared test helpers for integration tests.
//!
//! Provides fixed addresses and hashes, WAT guest contracts, context
//! builders and sandbox factory functions used across all integration
//! test files.

#![allow(dead_code)]

use std::sync::Arc;

use vmbridge_hostapi::{MemService, ServiceGuard};
use vmbridge_primitives::{Address, Hash, InvocationContext, ServiceHandle};
use vmbridge_sandbox::{Sandbox, SandboxConfig};

// ── Fixed Identities ──

pub const ALICE: Address = [0xA1; 20];
pub const BOB: Address = [0xB0; 20];
pub const CAROL: Address = [0xCA; 20];

/// Address the outermost contract runs at.
pub const CONTRACT: Address = [0xC0; 20];
/// Address of a contract reached through `call_contract`.
pub const CALLEE: Address = [0xC1; 20];

pub const TX_HASH: Hash = [0x11; 32];
pub const BLOCK_HASH: Hash = [0x22; 32];
pub const HEIGHT: u32 = 7;
pub const TIMESTAMP: u64 = 1_700_000_000;

/// Gas budget large enough for every guest below.
pub const GAS: u64 = 10_000_000;

/// Alice signed the transaction; Bob only appears in the call chain.
pub static WITNESS: [Address; 1] = [ALICE];
pub static CALLERS: [Address; 1] = [BOB];

// ── Guest Contracts ──

/// Returns its input unchanged.
pub const ECHO: &str = r#"
(module
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param $ptr i32) (param $len i32)
    (drop (call $set_output (local.get $ptr) (local.get $len)))))
"#;

/// Adds two little-endian u32s; panics through `check` on bad input or overflow.
pub const SUM_OR_PANIC: &str = r#"
(module
  (import "vmbridge" "check" (func $check (param i32 i32 i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 16) "bad input")
  (data (i32.const 32) "overflow")
  (func (export "invoke") (param $ptr i32) (param $len i32)
    (local $a i32) (local $sum i32)
    (call $check (i32.eq (local.get $len) (i32.const 8)) (i32.const 16) (i32.const 9))
    (local.set $a (i32.load (local.get $ptr)))
    (local.set $sum (i32.add (local.get $a) (i32.load offset=4 (local.get $ptr))))
    (call $check (i32.ge_u (local.get $sum) (local.get $a)) (i32.const 32) (i32.const 8))
    (i32.store (i32.const 0) (local.get $sum))
    (drop (call $set_output (i32.const 0) (i32.const 4)))))
"#;

/// Returns `check_witness(input)` as a little-endian i32.
pub const WITNESS_CHECK: &str = r#"
(module
  (import "vmbridge" "check_witness" (func $check_witness (param i32) (result i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param $ptr i32) (param $len i32)
    (i32.store (i32.const 0) (call $check_witness (local.get $ptr)))
    (drop (call $set_output (i32.const 0) (i32.const 4)))))
"#;

/// Always panics with "contract says no".
pub const PANIC: &str = r#"
(module
  (import "vmbridge" "panic" (func $panic (param i32 i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "contract says no")
  (func (export "invoke") (param i32 i32)
    (call $panic (i32.const 0) (i32.const 16))))
"#;

/// Hits `unreachable`.
pub const UNREACHABLE: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "invoke") (param i32 i32)
    unreachable))
"#;

/// Spins forever.
pub const INFINITE_LOOP: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "invoke") (param i32 i32)
    (loop $spin (br $spin))))
"#;

/// Returns the result of `gas_left()` as a little-endian u64.
pub const GAS_LEFT: &str = r#"
(module
  (import "vmbridge" "gas_left" (func $gas_left (result i64)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param i32 i32)
    (i64.store (i32.const 0) (call $gas_left))
    (drop (call $set_output (i32.const 0) (i32.const 8)))))
"#;

/// Prints two lines, then echoes its input.
pub const PRINTF: &str = r#"
(module
  (import "vmbridge" "printf" (func $printf (param i32 i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "hello from guest")
  (data (i32.const 16) "second line")
  (func (export "invoke") (param $ptr i32) (param $len i32)
    (call $printf (i32.const 0) (i32.const 16))
    (call $printf (i32.const 16) (i32.const 11))
    (drop (call $set_output (local.get $ptr) (local.get $len)))))
"#;

/// Emits one `notify` event, then echoes its input.
pub const NOTIFY: &str = r#"
(module
  (import "vmbridge" "notify" (func $notify (param i32 i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "transfer:42")
  (func (export "invoke") (param $ptr i32) (param $len i32)
    (call $notify (i32.const 0) (i32.const 11))
    (drop (call $set_output (local.get $ptr) (local.get $len)))))
"#;

/// Sets output twice; the second write must win.
pub const OVERWRITE_OUTPUT: &str = r#"
(module
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 0) "first")
  (data (i32.const 8) "second")
  (func (export "invoke") (param i32 i32)
    (drop (call $set_output (i32.const 0) (i32.const 5)))
    (drop (call $set_output (i32.const 8) (i32.const 6)))))
"#;

/// Returns the whole marshaled context struct.
pub const CONTEXT_STRUCT: &str = r#"
(module
  (import "vmbridge" "get_context" (func $get_context (param i32 i32) (result i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param i32 i32)
    (if (call $get_context (i32.const 0) (i32.const 4)) (then unreachable))
    (drop (call $set_output (i32.load (i32.const 0)) (i32.load (i32.const 4))))))
"#;

/// Returns the 20 bytes behind the context's `self_address` pointer.
pub const CONTEXT_SELF_ADDRESS: &str = r#"
(module
  (import "vmbridge" "get_context" (func $get_context (param i32 i32) (result i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param i32 i32)
    (if (call $get_context (i32.const 0) (i32.const 4)) (then unreachable))
    (drop (call $set_output (i32.load offset=20 (i32.load (i32.const 0))) (i32.const 20)))))
"#;

/// Returns the packed caller chain from the (default layout) context.
pub const CONTEXT_CALLERS: &str = r#"
(module
  (import "vmbridge" "get_context" (func $get_context (param i32 i32) (result i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param i32 i32)
    (local $ctx i32)
    (if (call $get_context (i32.const 0) (i32.const 4)) (then unreachable))
    (local.set $ctx (i32.load (i32.const 0)))
    (drop (call $set_output
      (i32.load offset=24 (local.get $ctx))
      (i32.mul (i32.load offset=28 (local.get $ctx)) (i32.const 20))))))
"#;

/// Returns the input pointed to by the context, read back through it.
pub const CONTEXT_INPUT: &str = r#"
(module
  (import "vmbridge" "get_context" (func $get_context (param i32 i32) (result i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param i32 i32)
    (local $ctx i32)
    (if (call $get_context (i32.const 0) (i32.const 4)) (then unreachable))
    (local.set $ctx (i32.load (i32.const 0)))
    (drop (call $set_output
      (i32.load offset=40 (local.get $ctx))
      (i32.load offset=44 (local.get $ctx))))))
"#;

/// Input is `[callee: 20][payload]`. Calls the callee with the payload and
/// returns its output, or the non-zero code as a little-endian i32.
pub const CALLER: &str = r#"
(module
  (import "vmbridge" "call_contract" (func $call (param i32 i32 i32 i32 i32) (result i32)))
  (import "vmbridge" "set_call_output" (func $set_output (param i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param $ptr i32) (param $len i32)
    (local $rc i32)
    (local.set $rc (call $call
      (local.get $ptr)
      (i32.add (local.get $ptr) (i32.const 20))
      (i32.sub (local.get $len) (i32.const 20))
      (i32.const 0)
      (i32.const 4)))
    (if (local.get $rc)
      (then
        (i32.store (i32.const 8) (local.get $rc))
        (drop (call $set_output (i32.const 8) (i32.const 4)))
        (return)))
    (drop (call $set_output (i32.load (i32.const 0)) (i32.load (i32.const 4))))))
"#;

/// Input is its own address; calls itself with the same input forever.
pub const RECURSE: &str = r#"
(module
  (import "vmbridge" "call_contract" (func $call (param i32 i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "invoke") (param $ptr i32) (param $len i32)
    (drop (call $call
      (local.get $ptr) (local.get $ptr) (local.get $len)
      (i32.const 0) (i32.const 4)))))
"#;

// ── Sandbox Factories ──

pub fn sandbox() -> Sandbox {
    Sandbox::new(SandboxConfig::default()).expect("failed to create sandbox")
}

pub fn sandbox_with_config(config: SandboxConfig) -> Sandbox {
    Sandbox::new(config).expect("failed to create sandbox with config")
}

// ── Context Builders ──

/// Standard context at `CONTRACT` with the given input and gas.
pub fn context(input: &[u8], gas: u64) -> InvocationContext<'_> {
    context_with_service(input, gas, ServiceHandle::NONE)
}

pub fn context_with_service(input: &[u8], gas: u64, service: ServiceHandle) -> InvocationContext<'_> {
    InvocationContext::builder()
        .height(HEIGHT)
        .block_hash(&BLOCK_HASH)
        .timestamp(TIMESTAMP)
        .tx_hash(&TX_HASH)
        .self_address(CONTRACT)
        .callers(&CALLERS)
        .witness(&WITNESS)
        .input(input)
        .gas_left(gas)
        .service(service)
        .build()
        .expect("context must build")
}

/// Register a service with the given contracts deployed.
pub fn deploy(contracts: &[(Address, &str)]) -> ServiceGuard {
    let mut service = MemService::new();
    for (address, wat) in contracts {
        service.deploy(*address, wat.as_bytes().to_vec());
    }
    ServiceGuard::new(Arc::new(service))
}

/// Input for `CALLER`: callee address followed by the payload.
pub fn call_input(callee: &Address, payload: &[u8]) -> Vec<u8> {
    let mut input = callee.to_vec();
    input.extend_from_slice(payload);
    input
}

pub fn le_i32(bytes: &[u8]) -> i32 {
    i32::from_le_bytes(bytes[..4].try_into().unwrap())
}

pub fn le_u64(bytes: &[u8]) -> u64 {
    u64::from_le_bytes(bytes[..8].try_into().unwrap())
}
