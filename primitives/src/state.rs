//! Per-invocation lifecycle.
//!
//! ```text
//! Idle -> Invoking -> {Completed, Trapped, GasExhausted} -> OutputReady -> Freed
//! ```
//!
//! `Freed` is terminal and only reachable from `OutputReady`.

use core::fmt;

use crate::error::InteropError;

/// Lifecycle state of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationState {
    Idle,
    Invoking,
    Completed,
    Trapped,
    GasExhausted,
    OutputReady,
    Freed,
}

impl InvocationState {
    /// Returns true if `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: InvocationState) -> bool {
        use InvocationState::*;
        matches!(
            (self, next),
            (Idle, Invoking)
                | (Invoking, Completed)
                | (Invoking, Trapped)
                | (Invoking, GasExhausted)
                | (Completed, OutputReady)
                | (Trapped, OutputReady)
                | (GasExhausted, OutputReady)
                | (OutputReady, Freed)
        )
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn advance(self, next: InvocationState) -> Result<InvocationState, InteropError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(InteropError::host_call(format!(
                "illegal invocation transition {} -> {}",
                self, next
            )))
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Invoking => "Invoking",
            Self::Completed => "Completed",
            Self::Trapped => "Trapped",
            Self::GasExhausted => "GasExhausted",
            Self::OutputReady => "OutputReady",
            Self::Freed => "Freed",
        };
        f.write_str(name)
    }
}
