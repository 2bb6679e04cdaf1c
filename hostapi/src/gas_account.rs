//! Host-side gas account for one transaction.
//!
//! `GasAccount` is the authoritative remaining-gas counter. Nested calls
//! share it through a [`GasLedger`], so an inner call spends from the same
//! budget as its caller.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::HostError;

/// Remaining-gas counter.
///
/// `gas_left` never increases. A deduction larger than the balance pins the
/// balance to zero and fails; the caller must abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasAccount {
    initial: u64,
    gas_left: u64,
}

impl GasAccount {
    /// Create an account holding `gas_left`.
    pub fn new(gas_left: u64) -> Self {
        Self {
            initial: gas_left,
            gas_left,
        }
    }

    /// Current remaining gas.
    pub fn query(&self) -> u64 {
        self.gas_left
    }

    /// Spend `amount`.
    ///
    /// Fails with `GasExhausted` if `amount > gas_left`, leaving the account
    /// at zero.
    pub fn deduct(&mut self, amount: u64) -> Result<(), HostError> {
        if amount > self.gas_left {
            self.gas_left = 0;
            return Err(HostError::gas_exhausted());
        }
        self.gas_left -= amount;
        Ok(())
    }

    /// Drain the account.
    pub fn exhaust(&mut self) {
        self.gas_left = 0;
    }

    /// Gas spent since the account was opened.
    pub fn consumed(&self) -> u64 {
        self.initial - self.gas_left
    }

    pub fn is_exhausted(&self) -> bool {
        self.gas_left == 0
    }
}

/// Shared handle to one [`GasAccount`].
///
/// Single-threaded by construction: one transaction runs on one thread.
#[derive(Debug, Clone)]
pub struct GasLedger(Rc<RefCell<GasAccount>>);

impl GasLedger {
    pub fn new(gas_left: u64) -> Self {
        Self(Rc::new(RefCell::new(GasAccount::new(gas_left))))
    }

    pub fn query(&self) -> u64 {
        self.0.borrow().query()
    }

    pub fn deduct(&self, amount: u64) -> Result<(), HostError> {
        let result = self.0.borrow_mut().deduct(amount);
        if result.is_err() {
            log::debug!("gas ledger exhausted deducting {}", amount);
        }
        result
    }

    pub fn exhaust(&self) {
        self.0.borrow_mut().exhaust();
    }

    pub fn consumed(&self) -> u64 {
        self.0.borrow().consumed()
    }

    pub fn is_exhausted(&self) -> bool {
        self.0.borrow().is_exhausted()
    }
}
