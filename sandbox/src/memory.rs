//! Bounds-checked access to guest linear memory.
//!
//! Every read copies into a host-owned buffer; nothing returned here points
//! into guest memory, which the guest may grow or rewrite after the call.
//! Out-of-range access is `OutOfBounds` and touches no bytes.

use wasmtime::{AsContextMut, Memory};

use vmbridge_primitives::{Address, InteropError, OutputResult, OwnedBuffer, ADDRESS_LEN};

use crate::error::SandboxError;
use crate::host_impl::HostState;

/// WebAssembly page size.
pub const PAGE_SIZE: usize = 65536;

/// Initial host allocation region size in pages (4 pages = 256 KiB).
pub const HOST_ALLOC_PAGES: u64 = 4;

/// Resolve `[offset, offset + len)` against a memory of `mem_size` bytes.
fn checked_range(mem_size: usize, offset: u32, len: u32) -> Result<(usize, usize), InteropError> {
    let start = offset as usize;
    let end = start.checked_add(len as usize).ok_or_else(|| {
        InteropError::out_of_bounds(format!("range {}+{} overflows", offset, len))
    })?;
    if end > mem_size {
        return Err(InteropError::out_of_bounds(format!(
            "range {}..{} exceeds memory of {} bytes",
            start, end, mem_size
        )));
    }
    Ok((start, end))
}

/// Copy `len` bytes at `offset` out of guest memory.
pub fn read_guest_memory(mem: &[u8], offset: u32, len: u32) -> OutputResult {
    let (start, end) = checked_range(mem.len(), offset, len)?;
    Ok(OwnedBuffer::copy_from(&mem[start..end]))
}

/// Copy `data` into guest memory at `offset`.
pub fn write_guest_memory(mem: &mut [u8], offset: u32, data: &[u8]) -> Result<(), InteropError> {
    let len = u32::try_from(data.len())
        .map_err(|_| InteropError::out_of_bounds("write larger than 4 GiB"))?;
    let (start, end) = checked_range(mem.len(), offset, len)?;
    mem[start..end].copy_from_slice(data);
    Ok(())
}

/// Read a 20-byte address at `offset`.
pub fn read_address(mem: &[u8], offset: u32) -> Result<Address, InteropError> {
    let (start, end) = checked_range(mem.len(), offset, ADDRESS_LEN as u32)?;
    let mut addr = [0u8; ADDRESS_LEN];
    addr.copy_from_slice(&mem[start..end]);
    Ok(addr)
}

/// Read a little-endian u32 at `offset`.
pub fn read_u32(mem: &[u8], offset: u32) -> Result<u32, InteropError> {
    let (start, end) = checked_range(mem.len(), offset, 4)?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&mem[start..end]);
    Ok(u32::from_le_bytes(raw))
}

/// Write a little-endian u32 at `offset`.
pub fn write_u32(mem: &mut [u8], offset: u32, value: u32) -> Result<(), InteropError> {
    write_guest_memory(mem, offset, &value.to_le_bytes())
}

fn align8(size: usize) -> usize {
    (size + 7) & !7
}

/// A planned allocation. Apply with [`HostAllocator::commit`] once any
/// required memory growth has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub ptr: u32,
    pub grow_pages: u64,
    base: usize,
    bump: usize,
    capacity: usize,
}

/// Bump allocator for host-written data inside guest memory.
///
/// The sandbox grows memory once after instantiation and places input,
/// marshaled context and nested-call output there. Nothing is freed; the
/// instance is discarded after the call.
#[derive(Debug, Clone, Default)]
pub struct HostAllocator {
    base: usize,
    bump: usize,
    capacity: usize,
}

impl HostAllocator {
    /// Region of `capacity` bytes starting at `base`.
    pub fn new(base: usize, capacity: usize) -> Self {
        Self {
            base,
            bump: 0,
            capacity,
        }
    }

    /// Bytes handed out so far in the current region.
    pub fn used(&self) -> usize {
        self.bump
    }

    /// Plan an allocation of `size` bytes against a memory of `mem_size` bytes.
    ///
    /// If the region is full it is extended in place when it ends at the top
    /// of memory. If the guest has grown memory past it, a new region starts
    /// at the current top.
    pub fn reserve(&self, size: usize, mem_size: usize) -> Result<Reservation, InteropError> {
        let aligned = align8(size.max(1));
        let (base, bump, capacity) = if self.bump + aligned <= self.capacity {
            (self.base, self.bump, self.capacity)
        } else if self.base + self.capacity == mem_size {
            (self.base, self.bump, self.capacity)
        } else {
            (mem_size, 0, 0)
        };

        let grow_pages = if bump + aligned <= capacity {
            0
        } else {
            (bump + aligned - capacity).div_ceil(PAGE_SIZE)
        };
        let end = base + bump + aligned;
        if end > u32::MAX as usize {
            return Err(InteropError::out_of_bounds(format!(
                "host allocation of {} bytes exceeds the 32-bit address space",
                size
            )));
        }
        Ok(Reservation {
            ptr: (base + bump) as u32,
            grow_pages: grow_pages as u64,
            base,
            bump: bump + aligned,
            capacity: capacity + grow_pages * PAGE_SIZE,
        })
    }

    /// Apply a reservation.
    pub fn commit(&mut self, reservation: &Reservation) {
        self.base = reservation.base;
        self.bump = reservation.bump;
        self.capacity = reservation.capacity;
    }
}

/// Copy `data` into the host region of `memory`, growing it if needed.
///
/// Returns `(ptr, len)`. Empty data is `(0, 0)` and allocates nothing.
pub fn alloc_and_write(
    memory: &Memory,
    mut store: impl AsContextMut<Data = HostState>,
    data: &[u8],
) -> Result<(u32, u32), InteropError> {
    if data.is_empty() {
        return Ok((0, 0));
    }
    let len = u32::try_from(data.len())
        .map_err(|_| InteropError::out_of_bounds("allocation larger than 4 GiB"))?;

    let mem_size = memory.data_size(&store);
    let reservation = store
        .as_context()
        .data()
        .allocator
        .reserve(data.len(), mem_size)?;

    if reservation.grow_pages > 0 {
        memory
            .grow(&mut store, reservation.grow_pages)
            .map_err(|e| SandboxError::MemoryError(format!("host region grow: {}", e)))?;
    }

    write_guest_memory(memory.data_mut(&mut store), reservation.ptr, data)?;
    store.as_context_mut().data_mut().allocator.commit(&reservation);
    Ok((reservation.ptr, len))
}
