//! `vmbridge-sandbox` Wasmtime-based host for contract invocations.
//!
//! This crate loads, validates, and runs contract modules inside a
//! Wasmtime sandbox and moves data across the host/guest boundary. It
//! enforces:
//!
//! - **Determinism:** No SIMD, no threads, NaN canonicalization
//! - **Gas metering:** Engine fuel for guest instructions plus host-call
//!   costs, settled into one ledger shared by nested calls
//! - **Memory limits:** Bounded linear memory growth
//! - **Import whitelisting:** Only `vmbridge` imports allowed, no WASI
//! - **Ownership:** Guest data is always copied out; outputs are released
//!   exactly once
//!
//! The primary entry point is [`Sandbox::invoke`].

pub mod error;
pub mod config;
pub mod memory;
pub mod cache;
pub mod host_impl;
pub mod error_channel;
pub mod output;
pub mod vmctx;
pub mod validation;
pub mod linker;
pub mod runtime;

pub use error::SandboxError;
pub use config::SandboxConfig;
pub use error_channel::{classify_trap, construct_error};
pub use memory::read_guest_memory;
pub use output::{free_output, CallOutput};
pub use runtime::{call_invoke, InvokeResult, Sandbox};
pub use vmctx::{service_handle_of, set_call_output, VmCtx};
