//! The invocation context handed to a guest call.
//!
//! [`InvocationContext`] borrows block and transaction data from the host
//! for one call. [`ContextSnapshot`] is the host-owned copy the sandbox
//! keeps while the guest runs, so nothing borrowed is touched after the
//! call starts.

use crate::buffer::BoundaryBuf;
use crate::error::InteropError;
use crate::types::{Address, BlockHeight, Hash, ServiceHandle, ZERO_HASH};

/// Execution context for a single guest invocation.
#[derive(Debug)]
pub struct InvocationContext<'a> {
    pub height: BlockHeight,
    pub block_hash: &'a Hash,
    pub timestamp: u64,
    pub tx_hash: &'a Hash,
    pub self_address: Address,
    /// Call chain, outermost first.
    pub callers: &'a [Address],
    /// Addresses that authorized the transaction.
    pub witness: &'a [Address],
    pub input: BoundaryBuf<'a>,
    /// Remaining gas. Only ever decreases.
    pub gas_left: u64,
    pub service: ServiceHandle,
}

impl<'a> InvocationContext<'a> {
    pub fn builder() -> InvocationContextBuilder<'a> {
        InvocationContextBuilder::default()
    }

    /// True iff `addr` is one of the transaction's witnesses.
    ///
    /// Membership in `callers` does not count.
    pub fn check_witness(&self, addr: &Address) -> bool {
        self.witness.contains(addr)
    }

    /// Copy everything except the input into a host-owned snapshot.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            height: self.height,
            block_hash: *self.block_hash,
            timestamp: self.timestamp,
            tx_hash: *self.tx_hash,
            self_address: self.self_address,
            callers: self.callers.to_vec(),
            witness: self.witness.to_vec(),
            service: self.service,
        }
    }
}

/// Builder for [`InvocationContext`].
///
/// `self_address` and `tx_hash` are mandatory; everything else has a
/// neutral default.
#[derive(Debug, Default)]
pub struct InvocationContextBuilder<'a> {
    height: BlockHeight,
    block_hash: Option<&'a Hash>,
    timestamp: u64,
    tx_hash: Option<&'a Hash>,
    self_address: Option<Address>,
    callers: &'a [Address],
    witness: &'a [Address],
    input: BoundaryBuf<'a>,
    gas_left: u64,
    service: ServiceHandle,
}

impl<'a> InvocationContextBuilder<'a> {
    pub fn height(mut self, height: BlockHeight) -> Self {
        self.height = height;
        self
    }

    pub fn block_hash(mut self, hash: &'a Hash) -> Self {
        self.block_hash = Some(hash);
        self
    }

    pub fn timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn tx_hash(mut self, hash: &'a Hash) -> Self {
        self.tx_hash = Some(hash);
        self
    }

    pub fn self_address(mut self, addr: Address) -> Self {
        self.self_address = Some(addr);
        self
    }

    pub fn callers(mut self, callers: &'a [Address]) -> Self {
        self.callers = callers;
        self
    }

    pub fn witness(mut self, witness: &'a [Address]) -> Self {
        self.witness = witness;
        self
    }

    pub fn input(mut self, input: impl Into<BoundaryBuf<'a>>) -> Self {
        self.input = input.into();
        self
    }

    pub fn gas_left(mut self, gas: u64) -> Self {
        self.gas_left = gas;
        self
    }

    pub fn service(mut self, service: ServiceHandle) -> Self {
        self.service = service;
        self
    }

    /// Finish the context.
    ///
    /// Fails with `ConstructionError` if `self_address` or `tx_hash` was
    /// never supplied.
    pub fn build(self) -> Result<InvocationContext<'a>, InteropError> {
        let self_address = self
            .self_address
            .ok_or_else(|| InteropError::construction("missing self_address"))?;
        let tx_hash = self
            .tx_hash
            .ok_or_else(|| InteropError::construction("missing tx_hash"))?;
        Ok(InvocationContext {
            height: self.height,
            block_hash: self.block_hash.unwrap_or(&ZERO_HASH),
            timestamp: self.timestamp,
            tx_hash,
            self_address,
            callers: self.callers,
            witness: self.witness,
            input: self.input,
            gas_left: self.gas_left,
            service: self.service,
        })
    }
}

/// Host-owned copy of an [`InvocationContext`], minus input and gas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub height: BlockHeight,
    pub block_hash: Hash,
    pub timestamp: u64,
    pub tx_hash: Hash,
    pub self_address: Address,
    pub callers: Vec<Address>,
    pub witness: Vec<Address>,
    pub service: ServiceHandle,
}

impl ContextSnapshot {
    pub fn is_witness(&self, addr: &Address) -> bool {
        self.witness.contains(addr)
    }

    /// Context for a call from this contract into `callee`.
    ///
    /// Block and transaction data and witnesses carry over; the current
    /// contract is appended to the caller chain.
    pub fn nested(&self, callee: Address) -> ContextSnapshot {
        let mut callers = self.callers.clone();
        callers.push(self.self_address);
        ContextSnapshot {
            self_address: callee,
            callers,
            ..self.clone()
        }
    }
}
