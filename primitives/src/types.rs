//! Core type aliases and constants for the vmbridge interop layer.
//!
//! These types are shared by the host API, the sandbox and the guest ABI.

/// Length of a contract or account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Length of a block or transaction hash in bytes.
pub const HASH_LEN: usize = 32;

/// 32-byte hash used for block and transaction hashes.
pub type Hash = [u8; HASH_LEN];

/// 20-byte address identifying contracts and accounts.
pub type Address = [u8; ADDRESS_LEN];

/// Block height as seen by the guest.
pub type BlockHeight = u32;

/// A zero-valued hash (32 zero bytes).
pub const ZERO_HASH: Hash = [0u8; HASH_LEN];

/// A zero-valued address (20 zero bytes).
pub const ZERO_ADDRESS: Address = [0u8; ADDRESS_LEN];

/// Entry point invoked when the host does not request another one.
pub const DEFAULT_ENTRY_POINT: &str = "invoke";

/// Name of the import module that exposes host functions to the guest.
pub const HOST_MODULE: &str = "vmbridge";

/// Opaque integer referencing a host-side service instance.
///
/// Resolved through the process-wide handle table, never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ServiceHandle(pub u64);

impl ServiceHandle {
    /// The handle value reserved for "no service attached".
    pub const NONE: ServiceHandle = ServiceHandle(0);

    /// Returns the raw integer carried across the boundary.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true if this is the reserved empty handle.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for ServiceHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "service#{}", self.0)
    }
}

/// Convert an address to a hex string for log output.
pub fn address_to_hex(addr: &Address) -> String {
    let mut s = String::with_capacity(2 + ADDRESS_LEN * 2);
    s.push_str("0x");
    for byte in addr {
        use core::fmt::Write;
        let _ = write!(s, "{:02x}", byte);
    }
    s
}

/// Concatenate a list of addresses into the flat buffer layout the guest
/// reads (`count * ADDRESS_LEN` bytes, no length prefix).
pub fn pack_addresses(addrs: &[Address]) -> Vec<u8> {
    let mut out = Vec::with_capacity(addrs.len() * ADDRESS_LEN);
    for addr in addrs {
        out.extend_from_slice(addr);
    }
    out
}
