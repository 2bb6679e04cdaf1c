//! Captured result of a successful invocation.
//!
//! A [`CallOutput`] owns the bytes the guest declared with
//! `set_call_output`. The host reads them, then releases them exactly once
//! with [`CallOutput::free_output`] or takes them with
//! [`CallOutput::take`]; either way the output is `Freed` afterwards and
//! any further access is rejected.

use vmbridge_hostapi::Notification;
use vmbridge_primitives::{ErrorResult, InteropError, InvocationState, OutputResult, OwnedBuffer};

/// Output of one invocation, owned by the host.
#[derive(Debug)]
pub struct CallOutput {
    output: Option<OwnedBuffer>,
    state: InvocationState,
    gas_used: u64,
    gas_left: u64,
    logs: Vec<String>,
    notifications: Vec<Notification>,
}

impl CallOutput {
    pub(crate) fn new(
        output: Option<OwnedBuffer>,
        gas_used: u64,
        gas_left: u64,
        logs: Vec<String>,
        notifications: Vec<Notification>,
    ) -> Self {
        Self {
            output: Some(output.unwrap_or_default()),
            state: InvocationState::OutputReady,
            gas_used,
            gas_left,
            logs,
            notifications,
        }
    }

    /// The captured bytes. Empty if the guest never set an output.
    pub fn bytes(&self) -> Result<&[u8], InteropError> {
        match &self.output {
            Some(buf) if self.state == InvocationState::OutputReady => Ok(buf.as_slice()),
            _ => Err(released()),
        }
    }

    pub fn len(&self) -> usize {
        self.output.as_ref().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Transfer the bytes to the caller. The output is `Freed` afterwards.
    pub fn take(&mut self) -> OutputResult {
        self.state = self.state.advance(InvocationState::Freed)?;
        self.output.take().ok_or_else(released)
    }

    /// Release the bytes. A second call fails with `HostCallFailure`.
    pub fn free_output(&mut self) -> ErrorResult {
        self.state = self.state.advance(InvocationState::Freed)?;
        if let Some(buf) = self.output.take() {
            free_output(buf);
        }
        Ok(())
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    /// Gas consumed by the call, nested calls included.
    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    /// Gas remaining after the call.
    pub fn gas_left(&self) -> u64 {
        self.gas_left
    }

    /// Guest `printf` lines, nested calls included.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Events emitted through `notify`, nested calls included.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }
}

fn released() -> InteropError {
    InteropError::host_call("call output already released")
}

/// Release a buffer produced by this layer.
///
/// Takes the buffer by value, so it cannot be used or released again.
pub fn free_output(buffer: OwnedBuffer) {
    let len = buffer.release();
    log::trace!("released call output of {} bytes", len);
}
