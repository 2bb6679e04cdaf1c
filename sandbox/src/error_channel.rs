//! Converting guest traps into owned errors.
//!
//! Host functions abort a guest by returning an [`InteropError`] wrapped in
//! `anyhow::Error`; the engine hands it back unchanged from the entry call.
//! Engine traps (fuel, `unreachable`, division by zero, ...) carry no such
//! payload and are classified here. Every message is copied before the
//! instance is torn down.

use wasmtime::Trap;

use vmbridge_primitives::{ErrorCode, InteropError};

use crate::memory;

/// Wrap an error so a host function can trap with it.
pub fn trap(err: InteropError) -> anyhow::Error {
    anyhow::Error::new(err)
}

/// Classify an error returned by a guest call.
///
/// - a host-function abort keeps its own kind and message
/// - fuel exhaustion is `GasExhausted`
/// - every other trap is `ContractPanic` with the engine's description
pub fn classify_trap(err: anyhow::Error) -> InteropError {
    let err = match err.downcast::<InteropError>() {
        Ok(interop) => return interop,
        Err(err) => err,
    };
    if let Some(Trap::OutOfFuel) = err.downcast_ref::<Trap>() {
        return InteropError::gas_exhausted();
    }
    InteropError::contract_panic(err.root_cause().to_string())
}

/// Copy a guest-provided message into a `ContractPanic` error.
///
/// A message range outside guest memory yields `OutOfBounds` instead.
pub fn construct_error(mem: &[u8], ptr: u32, len: u32) -> InteropError {
    match memory::read_guest_memory(mem, ptr, len) {
        Ok(bytes) => InteropError::from_message_bytes(ErrorCode::ContractPanic, &bytes),
        Err(err) => err,
    }
}
