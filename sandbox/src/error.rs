//! Sandbox error types.

use vmbridge_primitives::InteropError;

/// Top-level error type for sandbox setup.
///
/// Guest-facing failures travel as [`InteropError`]; this type covers the
/// engine, module compilation and validation.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// Wasmtime engine or store error.
    #[error("wasmtime error: {0}")]
    Wasmtime(#[from] anyhow::Error),

    /// Bytecode failed to compile.
    #[error("compile error: {0}")]
    CompileError(String),

    /// Module validation failed (missing exports, bad imports, etc.).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Configuration rejected by `Sandbox::new`.
    #[error("config error: {0}")]
    ConfigError(String),

    /// Growing guest memory for host data failed.
    #[error("memory error: {0}")]
    MemoryError(String),
}

impl From<SandboxError> for InteropError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::CompileError(msg) | SandboxError::ValidationError(msg) => {
                InteropError::invalid_code(msg)
            }
            SandboxError::ConfigError(msg) | SandboxError::MemoryError(msg) => {
                InteropError::host_call(msg)
            }
            SandboxError::Wasmtime(e) => InteropError::host_call(e.to_string()),
        }
    }
}
