//! Sandbox configuration.

use vmbridge_hostapi::ExecutionConfig;
use vmbridge_primitives::types::DEFAULT_ENTRY_POINT;
use vmbridge_primitives::ContextSchema;

use crate::error::SandboxError;
use crate::memory::{HOST_ALLOC_PAGES, PAGE_SIZE};

/// Deepest call chain a sandbox may be configured for. Every nested call
/// holds a native stack frame chain, so deeper chains risk overflowing the
/// host thread's stack.
pub const MAX_CALL_DEPTH_LIMIT: u32 = 64;

/// Largest 32-bit linear memory in pages.
const MAX_WASM32_PAGES: u32 = 65536;

/// Configuration for the WASM sandbox.
///
/// Controls memory limits, the guest ABI shape, nesting and caching, and
/// per-invocation size limits.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Maximum linear memory pages (1 page = 64 KiB).
    /// Default: 256 pages = 16 MiB.
    pub max_memory_pages: u32,

    /// Export called by `invoke`. Signature `(i32 input_ptr, i32 input_len) -> ()`.
    pub entry_point: String,

    /// Layout used when the guest asks for its context.
    pub context_schema: ContextSchema,

    /// Maximum depth of contract-to-contract calls, at most
    /// [`MAX_CALL_DEPTH_LIMIT`].
    pub max_call_depth: u32,

    /// Number of compiled modules kept. Zero disables caching.
    pub module_cache_size: usize,

    /// Whether to collect `printf` output from the guest.
    pub enable_guest_logs: bool,

    /// Per-invocation size limits.
    pub execution: ExecutionConfig,
}

impl SandboxConfig {
    pub fn max_memory_bytes(&self) -> usize {
        (self.max_memory_pages as usize).saturating_mul(PAGE_SIZE)
    }

    /// Reject settings the sandbox cannot honor safely.
    pub fn validate(&self) -> Result<(), SandboxError> {
        if self.max_call_depth > MAX_CALL_DEPTH_LIMIT {
            return Err(SandboxError::ConfigError(format!(
                "max_call_depth {} exceeds limit of {}",
                self.max_call_depth, MAX_CALL_DEPTH_LIMIT
            )));
        }
        if (self.max_memory_pages as u64) <= HOST_ALLOC_PAGES || self.max_memory_pages > MAX_WASM32_PAGES {
            return Err(SandboxError::ConfigError(format!(
                "max_memory_pages must be in {}..={}, got {}",
                HOST_ALLOC_PAGES + 1,
                MAX_WASM32_PAGES,
                self.max_memory_pages
            )));
        }
        if self.entry_point.is_empty() {
            return Err(SandboxError::ConfigError("entry_point is empty".into()));
        }
        Ok(())
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_memory_pages: 256, // 16 MiB
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            context_schema: ContextSchema::V3,
            max_call_depth: 16,
            module_cache_size: 100,
            enable_guest_logs: false,
            execution: ExecutionConfig::default(),
        }
    }
}
