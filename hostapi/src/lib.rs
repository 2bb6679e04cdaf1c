//! `vmbridge-hostapi`: host-side building blocks for the vmbridge sandbox.
//!
//! This crate provides:
//!
//! - `GasAccount` / `GasLedger`: authoritative remaining-gas accounting,
//!   shared across nested calls
//! - `HostService` trait: the ledger collaborator (contract code lookup)
//! - `registry`: process-wide integer handle table for host services
//! - `MemService`: in-memory `HostService` for testing
//! - `ExecutionConfig`: per-invocation size limits
//! - `Notification`: an event emitted by a contract
//! - `HostError`: host-side error type with `ErrorCode` conversion

pub mod error;
pub mod types;
pub mod gas_account;
pub mod traits;
pub mod registry;
pub mod mem_service;

// Re-export commonly used types at the crate root.
pub use error::HostError;
pub use types::{ExecutionConfig, Notification};
pub use gas_account::{GasAccount, GasLedger};
pub use traits::HostService;
pub use registry::ServiceGuard;
pub use mem_service::MemService;
