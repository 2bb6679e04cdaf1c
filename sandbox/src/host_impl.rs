//! Per-invocation mutable state held in the Wasmtime Store.
//!
//! `HostState` combines the context snapshot, the shared gas ledger, the
//! captured output, guest logs and the host allocator into a single struct
//! that lives inside `Store<HostState>` for the duration of one call.

use wasmtime::StoreLimits;

use vmbridge_hostapi::{GasLedger, HostError, Notification};
use vmbridge_primitives::gas::FUEL_PER_GAS;
use vmbridge_primitives::{ContextSnapshot, InvocationState, OwnedBuffer};

use crate::memory::HostAllocator;
use crate::runtime::Sandbox;

/// Per-invocation mutable state held in the Wasmtime `Store`.
///
/// Created fresh for each call, nested calls included. Dropped with the
/// instance when the call returns.
pub struct HostState {
    /// Sandbox that owns this call; nested calls re-enter it.
    pub sandbox: Sandbox,
    /// Host-owned copy of the invocation context.
    pub snapshot: ContextSnapshot,
    /// Authoritative gas account, shared with every call in the chain.
    pub ledger: GasLedger,
    /// Store fuel at the last sync with the ledger.
    pub fuel_base: u64,
    /// Nesting depth; the outermost call is 0.
    pub depth: u32,
    /// Lifecycle of this call.
    pub state: InvocationState,
    /// Output set via `set_call_output`. Last write wins.
    pub call_output: Option<OwnedBuffer>,
    /// `printf` lines collected during the call.
    pub logs: Vec<String>,
    /// `notify` events, in emission order.
    pub notifications: Vec<Notification>,
    /// Guest pointer and length of the copied input.
    pub input: (u32, u32),
    /// Host-side bump allocator for guest memory.
    pub allocator: HostAllocator,
    /// Store resource limits (memory growth).
    pub limits: StoreLimits,
}

impl HostState {
    pub fn new(
        sandbox: Sandbox,
        snapshot: ContextSnapshot,
        ledger: GasLedger,
        depth: u32,
        limits: StoreLimits,
    ) -> Self {
        let fuel_base = ledger.query().saturating_mul(FUEL_PER_GAS);
        Self {
            sandbox,
            snapshot,
            ledger,
            fuel_base,
            depth,
            state: InvocationState::Idle,
            call_output: None,
            logs: Vec::new(),
            notifications: Vec::new(),
            input: (0, 0),
            // Placed by the runtime after instantiation
            allocator: HostAllocator::default(),
            limits,
        }
    }

    /// Fuel the store should hold to match the ledger.
    pub fn ledger_fuel(&self) -> u64 {
        self.ledger.query().saturating_mul(FUEL_PER_GAS)
    }

    /// Fold the fuel burned since the last sync into the ledger.
    ///
    /// Returns the fuel the store should be reset to.
    pub fn absorb_fuel(&mut self, fuel_now: u64) -> Result<u64, HostError> {
        let burned = self.fuel_base.saturating_sub(fuel_now) / FUEL_PER_GAS;
        let result = self.ledger.deduct(burned);
        self.fuel_base = self.ledger_fuel();
        result.map(|()| self.fuel_base)
    }

    /// Sync fuel, then charge `cost` for a host function.
    ///
    /// Returns the fuel the store should be reset to.
    pub fn charge(&mut self, fuel_now: u64, cost: u64) -> Result<u64, HostError> {
        self.absorb_fuel(fuel_now)?;
        let result = self.ledger.deduct(cost);
        self.fuel_base = self.ledger_fuel();
        result.map(|()| self.fuel_base)
    }

    /// Record a log line. Enforces log count and line length limits.
    pub fn add_log(&mut self, mut line: String) {
        let limits = &self.sandbox.config().execution;
        if self.logs.len() >= limits.max_log_lines as usize {
            return;
        }
        if line.len() > limits.max_log_line_len {
            let mut cut = limits.max_log_line_len;
            while !line.is_char_boundary(cut) {
                cut -= 1;
            }
            line.truncate(cut);
        }
        self.logs.push(line);
    }

    /// Move to `next`, logging the transition.
    pub fn advance(&mut self, next: InvocationState) -> Result<(), HostError> {
        self.state = self
            .state
            .advance(next)
            .map_err(|e| HostError::Internal(e.message().to_string()))?;
        log::trace!(
            "invocation {} at depth {} -> {}",
            vmbridge_primitives::types::address_to_hex(&self.snapshot.self_address),
            self.depth,
            self.state
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vmbridge_hostapi::ExecutionConfig;
    use vmbridge_primitives::{ErrorCode, ServiceHandle, ZERO_HASH};
    use wasmtime::StoreLimitsBuilder;

    use crate::config::SandboxConfig;

    fn snapshot() -> ContextSnapshot {
        ContextSnapshot {
            height: 1,
            block_hash: ZERO_HASH,
            timestamp: 1_700_000_000,
            tx_hash: [0x11; 32],
            self_address: [1; 20],
            callers: vec![],
            witness: vec![],
            service: ServiceHandle::NONE,
        }
    }

    fn host_state(config: SandboxConfig, gas: u64) -> HostState {
        let sandbox = Sandbox::new(config).unwrap();
        HostState::new(
            sandbox,
            snapshot(),
            GasLedger::new(gas),
            0,
            StoreLimitsBuilder::new().build(),
        )
    }

    #[test]
    fn test_absorb_fuel_deducts_burned() {
        let mut state = host_state(SandboxConfig::default(), 1_000);
        assert_eq!(state.fuel_base, 1_000);
        let next = state.absorb_fuel(700).unwrap();
        assert_eq!(next, 700);
        assert_eq!(state.ledger.query(), 700);
        // Nothing burned since the last sync.
        assert_eq!(state.absorb_fuel(700).unwrap(), 700);
        assert_eq!(state.ledger.query(), 700);
    }

    #[test]
    fn test_absorb_fuel_follows_ledger_changes() {
        let mut state = host_state(SandboxConfig::default(), 1_000);
        // A nested call spent from the shared ledger.
        state.ledger.deduct(300).unwrap();
        assert_eq!(state.absorb_fuel(1_000).unwrap(), 700);
    }

    #[test]
    fn test_charge_overdraft_pins_ledger() {
        let mut state = host_state(SandboxConfig::default(), 100);
        assert_eq!(state.charge(100, 60).unwrap(), 40);
        let err = state.charge(30, 50).unwrap_err();
        assert_eq!(err.code(), ErrorCode::GasExhausted);
        assert_eq!(state.ledger.query(), 0);
        assert_eq!(state.fuel_base, 0);
    }

    #[test]
    fn test_log_limits() {
        let config = SandboxConfig {
            execution: ExecutionConfig {
                max_log_lines: 2,
                max_log_line_len: 4,
                ..ExecutionConfig::default()
            },
            ..SandboxConfig::default()
        };
        let mut state = host_state(config, 10);
        state.add_log("abcdef".into());
        state.add_log("xy".into());
        state.add_log("dropped".into());
        assert_eq!(state.logs, vec!["abcd".to_string(), "xy".to_string()]);
    }

    #[test]
    fn test_advance_rejects_illegal_transition() {
        let mut state = host_state(SandboxConfig::default(), 10);
        state.advance(InvocationState::Invoking).unwrap();
        assert!(state.advance(InvocationState::Freed).is_err());
        assert_eq!(state.state, InvocationState::Invoking);
    }
}
