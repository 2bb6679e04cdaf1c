//! Error taxonomy for the vmbridge interop layer.
//!
//! Every boundary operation yields either a payload or an [`InteropError`].
//! The guest only ever sees the flat `i32` code; the host sees the code plus
//! an owned message.

use core::fmt;

/// Boundary error codes.
///
/// Host functions return these as `i32`. `0` = no error, non-zero = error.
/// The repr values are part of the guest ABI and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    InvalidCode = 1,
    OutOfBounds = 2,
    GasExhausted = 3,
    ContractPanic = 4,
    ConstructionError = 5,
    HostCallFailure = 6,
}

impl ErrorCode {
    /// Convert from an i32 error code returned by a host function.
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::InvalidCode),
            2 => Some(Self::OutOfBounds),
            3 => Some(Self::GasExhausted),
            4 => Some(Self::ContractPanic),
            5 => Some(Self::ConstructionError),
            6 => Some(Self::HostCallFailure),
            _ => None,
        }
    }

    /// Return the i32 representation of this error code.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns true if this is the `Ok` sentinel.
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::InvalidCode => write!(f, "ERR_INVALID_CODE"),
            Self::OutOfBounds => write!(f, "ERR_OUT_OF_BOUNDS"),
            Self::GasExhausted => write!(f, "ERR_GAS_EXHAUSTED"),
            Self::ContractPanic => write!(f, "ERR_CONTRACT_PANIC"),
            Self::ConstructionError => write!(f, "ERR_CONSTRUCTION"),
            Self::HostCallFailure => write!(f, "ERR_HOST_CALL_FAILURE"),
        }
    }
}

/// The `Err` side of every boundary result: a kind plus an owned message.
///
/// The message is always an independent copy, so it outlives the guest
/// instance whose memory it was read from.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct InteropError {
    code: ErrorCode,
    message: String,
}

impl InteropError {
    /// Create an error with the given code and message.
    ///
    /// `ErrorCode::Ok` is not an error; it is coerced to `HostCallFailure`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let code = if code.is_ok() {
            ErrorCode::HostCallFailure
        } else {
            code
        };
        Self {
            code,
            message: message.into(),
        }
    }

    /// Build an error from raw message bytes, copying them.
    ///
    /// Invalid UTF-8 is replaced rather than rejected: a panic message must
    /// never be lost because the guest encoded it badly.
    pub fn from_message_bytes(code: ErrorCode, bytes: &[u8]) -> Self {
        Self::new(code, String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn invalid_code(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidCode, message)
    }

    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::OutOfBounds, message)
    }

    pub fn gas_exhausted() -> Self {
        Self::new(ErrorCode::GasExhausted, "gas exhausted")
    }

    pub fn contract_panic(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ContractPanic, message)
    }

    pub fn construction(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConstructionError, message)
    }

    pub fn host_call(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::HostCallFailure, message)
    }

    /// The error kind.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The owned error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Flat code as returned to the guest.
    pub fn to_error_code(&self) -> i32 {
        self.code.as_i32()
    }
}

/// Result of an operation with no payload.
pub type ErrorResult = Result<(), InteropError>;

/// Result of an operation yielding a 64-bit value.
pub type U64Result = Result<u64, InteropError>;

/// Collapse an [`ErrorResult`] to the flat code handed to the guest.
pub fn flatten(result: &ErrorResult) -> i32 {
    match result {
        Ok(()) => ErrorCode::Ok.as_i32(),
        Err(e) => e.to_error_code(),
    }
}
