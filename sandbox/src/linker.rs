//! Host function registration via Wasmtime linker.
//!
//! Registers the `vmbridge` host functions with the Wasmtime `Linker`.
//! Each function:
//! 1. Wraps the Caller in a `VmCtx`
//! 2. Validates pointer/length arguments against linear memory
//! 3. Charges gas (syncing engine fuel into the shared ledger first)
//! 4. Performs the operation
//! 5. Returns an i32 error code (0 = OK) where the signature has one
//!
//! Functions without an error return abort the guest instead: the
//! `InteropError` travels as the trap payload and is recovered by
//! `error_channel::classify_trap`. Gas exhaustion always aborts.

use wasmtime::{Caller, Linker};

use vmbridge_primitives::gas::*;
use vmbridge_primitives::types::HOST_MODULE;
use vmbridge_primitives::error::flatten;
use vmbridge_primitives::{ErrorCode, InteropError};

use crate::error::SandboxError;
use crate::error_channel::trap;
use crate::host_impl::HostState;
use crate::vmctx::VmCtx;

/// Every function the guest may import from the host module.
pub const HOST_FUNCTIONS: &[&str] = &[
    "check_witness",
    "check",
    "panic",
    "printf",
    "notify",
    "gas_left",
    "set_call_output",
    "get_context",
    "call_contract",
];

/// Panic message of a failed `check` whose own message cannot be read.
pub const CHECK_FAILED: &str = "check failed";

/// Register all `vmbridge` functions with the linker.
pub fn register_host_functions(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    register_check_witness(linker)?;
    register_check(linker)?;
    register_panic(linker)?;
    register_printf(linker)?;
    register_notify(linker)?;
    register_gas_left(linker)?;
    register_set_call_output(linker)?;
    register_get_context(linker)?;
    register_call_contract(linker)?;
    Ok(())
}

/// Split a host-function result into a flat code for the guest, aborting
/// on gas exhaustion.
fn flat_code(result: Result<(), InteropError>) -> anyhow::Result<i32> {
    match result {
        Err(err) if err.code() == ErrorCode::GasExhausted => Err(trap(err)),
        other => Ok(flatten(&other)),
    }
}

// ── Witness & Assertions ──

fn register_check_witness(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "check_witness",
        |mut caller: Caller<'_, HostState>, addr_ptr: i32| -> anyhow::Result<i32> {
            let mut ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let addr = ctx.read_address(addr_ptr as u32).map_err(trap)?;
            ctx.charge(G_CHECK_WITNESS).map_err(trap)?;
            Ok(ctx.check_witness(&addr) as i32)
        },
    )?;
    Ok(())
}

fn register_check(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "check",
        |mut caller: Caller<'_, HostState>,
         cond: i32,
         msg_ptr: i32,
         msg_len: i32|
         -> anyhow::Result<()> {
            if cond != 0 {
                return Ok(());
            }
            let ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let err = ctx.construct_error(msg_ptr as u32, msg_len as u32);
            // A failed check is a panic even when its message is unreadable.
            if err.code() == ErrorCode::ContractPanic {
                Err(trap(err))
            } else {
                Err(trap(InteropError::contract_panic(CHECK_FAILED)))
            }
        },
    )?;
    Ok(())
}

fn register_panic(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "panic",
        |mut caller: Caller<'_, HostState>, msg_ptr: i32, msg_len: i32| -> anyhow::Result<()> {
            let ctx = VmCtx::new(&mut caller).map_err(trap)?;
            Err(trap(ctx.construct_error(msg_ptr as u32, msg_len as u32)))
        },
    )?;
    Ok(())
}

// ── Logging & Events ──

fn register_printf(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "printf",
        |mut caller: Caller<'_, HostState>, msg_ptr: i32, msg_len: i32| -> anyhow::Result<()> {
            let mut ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let msg = ctx.read_guest_memory(msg_ptr as u32, msg_len as u32).map_err(trap)?;
            ctx.charge(gas_cost_printf(msg.len())).map_err(trap)?;
            ctx.guest_log(&msg);
            Ok(())
        },
    )?;
    Ok(())
}

fn register_notify(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "notify",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> anyhow::Result<()> {
            let mut ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let payload = ctx.read_guest_memory(ptr as u32, len as u32).map_err(trap)?;
            ctx.charge(gas_cost_notify(payload.len())).map_err(trap)?;
            ctx.notify(&payload).map_err(trap)
        },
    )?;
    Ok(())
}

// ── Gas ──

fn register_gas_left(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "gas_left",
        |mut caller: Caller<'_, HostState>| -> anyhow::Result<i64> {
            let mut ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let left = ctx.gas_left(G_GAS_LEFT).map_err(trap)?;
            Ok(left.min(i64::MAX as u64) as i64)
        },
    )?;
    Ok(())
}

// ── Output ──

fn register_set_call_output(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "set_call_output",
        |mut caller: Caller<'_, HostState>, ptr: i32, len: i32| -> anyhow::Result<i32> {
            let mut ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let result = ctx.read_guest_memory(ptr as u32, len as u32).and_then(|bytes| {
                ctx.charge(gas_cost_set_call_output(bytes.len()))?;
                ctx.set_call_output(&bytes)
            });
            flat_code(result)
        },
    )?;
    Ok(())
}

// ── Context ──

fn register_get_context(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "get_context",
        |mut caller: Caller<'_, HostState>,
         out_ptr_ptr: i32,
         out_len_ptr: i32|
         -> anyhow::Result<i32> {
            let mut ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let (ptr_slot, len_slot) = (out_ptr_ptr as u32, out_len_ptr as u32);
            let result = ctx.check_out_slots(ptr_slot, len_slot).and_then(|()| {
                ctx.charge(G_GET_CONTEXT)?;
                let pair = ctx.marshal_context()?;
                ctx.write_out_pair(ptr_slot, len_slot, pair)
            });
            flat_code(result)
        },
    )?;
    Ok(())
}

// ── Nested Calls ──

fn register_call_contract(linker: &mut Linker<HostState>) -> Result<(), SandboxError> {
    linker.func_wrap(
        HOST_MODULE,
        "call_contract",
        |mut caller: Caller<'_, HostState>,
         addr_ptr: i32,
         in_ptr: i32,
         in_len: i32,
         out_ptr_ptr: i32,
         out_len_ptr: i32|
         -> anyhow::Result<i32> {
            let mut ctx = VmCtx::new(&mut caller).map_err(trap)?;
            let (ptr_slot, len_slot) = (out_ptr_ptr as u32, out_len_ptr as u32);

            // Guest pointer faults are reported; everything after that aborts.
            let args = ctx.read_address(addr_ptr as u32).and_then(|callee| {
                let input = ctx.read_guest_memory(in_ptr as u32, in_len as u32)?;
                ctx.check_out_slots(ptr_slot, len_slot)?;
                Ok((callee, input))
            });
            let (callee, input) = match args {
                Ok(args) => args,
                Err(err) => return Ok(err.to_error_code()),
            };

            ctx.charge(gas_cost_call_contract(input.len())).map_err(trap)?;
            let output = ctx.call_contract(callee, &input).map_err(trap)?;
            let pair = ctx.alloc_and_write(&output).map_err(trap)?;
            flat_code(ctx.write_out_pair(ptr_slot, len_slot, pair))
        },
    )?;
    Ok(())
}
