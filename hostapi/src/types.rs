//! Host-side configuration and event types for the vmbridge sandbox.
//!
//! `ExecutionConfig` bundles the size limits enforced by host functions for
//! a single invocation. `Notification` is an event a guest hands to the host.

use vmbridge_primitives::Address;

/// Size limits for a single invocation.
///
/// Enforced by the host function implementations. The guest cannot exceed
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Maximum length of the output set via `set_call_output`.
    pub max_output_len: usize,
    /// Maximum length of a `check`/`panic` message; longer messages are cut.
    pub max_message_len: usize,
    /// Maximum number of `printf` lines kept per invocation.
    pub max_log_lines: u32,
    /// Maximum length of a single `printf` line in bytes.
    pub max_log_line_len: usize,
    /// Maximum payload of one `notify` event; longer payloads abort the call.
    pub max_notify_len: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_output_len: 1024 * 1024, // 1 MiB
            max_message_len: 1024,
            max_log_lines: 256,
            max_log_line_len: 1024,
            max_notify_len: 64 * 1024,
        }
    }
}

/// Event emitted by a contract through `notify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Contract that emitted the event.
    pub contract: Address,
    /// Opaque payload, copied out of guest memory.
    pub payload: Vec<u8>,
}
