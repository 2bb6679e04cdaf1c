//! `vmbridge-primitives`: foundational types for the vmbridge interop layer.
//!
//! This crate provides the types shared by the host API and the sandbox:
//! addresses and hashes, the boundary error taxonomy, gas constants,
//! ownership-tagged boundary buffers, the invocation context and its
//! versioned guest-side layouts, and the per-invocation state machine.

pub mod types;
pub mod error;
pub mod gas;
pub mod buffer;
pub mod context;
pub mod layout;
pub mod state;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Address, Hash, ServiceHandle, ADDRESS_LEN, HASH_LEN, ZERO_ADDRESS, ZERO_HASH};
pub use error::{ErrorCode, ErrorResult, InteropError, U64Result};
pub use buffer::{BoundaryBuf, OwnedBuffer};
pub use context::{ContextSnapshot, InvocationContext, InvocationContextBuilder};
pub use layout::{ContextSchema, Field, GuestContext};
pub use state::InvocationState;

/// Result of an operation yielding a host-owned buffer.
pub type OutputResult = Result<OwnedBuffer, InteropError>;
