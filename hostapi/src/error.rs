//! Host-side error types for the vmbridge sandbox.
//!
//! `HostError` is the error type of the host service trait and the gas
//! ledger. It wraps an `ErrorCode` for boundary-defined failures and
//! provides an `Internal` variant for host-only errors, which the guest sees
//! as `HostCallFailure`.

use std::fmt;

use vmbridge_primitives::{ErrorCode, InteropError};

/// Host-side error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// A boundary-defined error code.
    Code(ErrorCode),
    /// An internal host error not directly mapped to a boundary code.
    /// Returned to the guest as `HostCallFailure` (6).
    Internal(String),
}

impl HostError {
    /// Convert to the `i32` error code returned to the guest.
    pub fn to_error_code(&self) -> i32 {
        self.code().as_i32()
    }

    /// The boundary code this error maps to.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Code(code) => *code,
            Self::Internal(_) => ErrorCode::HostCallFailure,
        }
    }

    pub fn gas_exhausted() -> Self {
        Self::Code(ErrorCode::GasExhausted)
    }

    pub fn invalid_handle() -> Self {
        Self::Code(ErrorCode::HostCallFailure)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "host error: {}", code),
            Self::Internal(msg) => write!(f, "internal host error: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

impl From<ErrorCode> for HostError {
    fn from(code: ErrorCode) -> Self {
        Self::Code(code)
    }
}

impl From<HostError> for InteropError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Code(code) => InteropError::new(code, code.to_string()),
            HostError::Internal(msg) => InteropError::host_call(msg),
        }
    }
}
