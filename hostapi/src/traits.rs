//! Host service trait: the ledger-facing collaborator of the sandbox.
//!
//! A `HostService` is registered in the process-wide handle table and
//! referenced from an invocation context by its integer handle. The sandbox
//! asks it for contract code when a guest calls another contract.

use vmbridge_primitives::Address;

use crate::error::HostError;

/// Host-side services available to a running guest.
///
/// Implementations must be deterministic: the same address always yields
/// the same code for a given ledger state.
pub trait HostService: Send + Sync {
    /// Bytecode deployed at `address`.
    ///
    /// Returns `Ok(None)` if no contract exists there.
    fn contract_code(&self, address: &Address) -> Result<Option<Vec<u8>>, HostError>;
}
