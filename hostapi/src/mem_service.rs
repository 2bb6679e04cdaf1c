//! In-memory host service for testing.
//!
//! `MemService` implements `HostService` over a `BTreeMap` of deployed
//! contracts. Useful for unit and integration tests where no ledger exists.

use std::collections::BTreeMap;

use vmbridge_primitives::Address;

use crate::error::HostError;
use crate::traits::HostService;

/// In-memory contract registry backed by `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemService {
    contracts: BTreeMap<Address, Vec<u8>>,
}

impl MemService {
    pub fn new() -> Self {
        Self {
            contracts: BTreeMap::new(),
        }
    }

    /// Deploy `code` at `address`, replacing any previous code.
    pub fn deploy(&mut self, address: Address, code: impl Into<Vec<u8>>) {
        self.contracts.insert(address, code.into());
    }

    /// Builder-style [`deploy`](Self::deploy).
    pub fn with_contract(mut self, address: Address, code: impl Into<Vec<u8>>) -> Self {
        self.deploy(address, code);
        self
    }

    pub fn remove(&mut self, address: &Address) {
        self.contracts.remove(address);
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl HostService for MemService {
    fn contract_code(&self, address: &Address) -> Result<Option<Vec<u8>>, HostError> {
        Ok(self.contracts.get(address).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_service() {
        let service = MemService::new();
        assert!(service.is_empty());
        assert_eq!(service.contract_code(&[1; 20]).unwrap(), None);
    }

    #[test]
    fn test_deploy_and_lookup() {
        let service = MemService::new().with_contract([1; 20], b"\0asm".to_vec());
        assert_eq!(service.contract_code(&[1; 20]).unwrap(), Some(b"\0asm".to_vec()));
        assert_eq!(service.contract_code(&[2; 20]).unwrap(), None);
        assert_eq!(service.len(), 1);
    }

    #[test]
    fn test_redeploy_and_remove() {
        let mut service = MemService::new();
        service.deploy([1; 20], vec![1]);
        service.deploy([1; 20], vec![2]);
        assert_eq!(service.contract_code(&[1; 20]).unwrap(), Some(vec![2]));
        service.remove(&[1; 20]);
        assert!(service.is_empty());
    }
}
