//! Byte buffers that cross the host/guest boundary.
//!
//! A buffer is either a view the callee may read only for the duration of
//! one call, or an owned copy whose ownership moves to the receiver and is
//! released exactly once.

use core::fmt;
use core::ops::Deref;

/// A host-owned byte buffer produced by the interop layer.
///
/// Not `Clone`: the only way to release it is to move it into
/// [`OwnedBuffer::release`] (or drop it), so a second release cannot be
/// expressed.
#[derive(PartialEq, Eq, Default)]
pub struct OwnedBuffer {
    bytes: Box<[u8]>,
}

impl OwnedBuffer {
    /// Take ownership of `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Copy `bytes` into a new owned buffer.
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand the bytes to the caller, ending this buffer's life.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes.into_vec()
    }

    /// Release the buffer. Returns the number of bytes freed.
    pub fn release(self) -> usize {
        self.bytes.len()
    }
}

impl Deref for OwnedBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for OwnedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnedBuffer({} bytes)", self.bytes.len())
    }
}

/// A pointer+length pair crossing the boundary, tagged with its ownership.
#[derive(Debug)]
pub enum BoundaryBuf<'a> {
    /// Borrowed view, valid only for the duration of the current call.
    Borrowed(&'a [u8]),
    /// Owned copy; the holder must release it once.
    Owned(OwnedBuffer),
}

impl<'a> BoundaryBuf<'a> {
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Borrowed(view) => view,
            Self::Owned(buf) => buf.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Detach from the borrowed lifetime, copying if necessary.
    pub fn into_owned(self) -> OwnedBuffer {
        match self {
            Self::Borrowed(view) => OwnedBuffer::copy_from(view),
            Self::Owned(buf) => buf,
        }
    }
}

impl Default for BoundaryBuf<'_> {
    fn default() -> Self {
        Self::Borrowed(&[])
    }
}

impl<'a> From<&'a [u8]> for BoundaryBuf<'a> {
    fn from(view: &'a [u8]) -> Self {
        Self::Borrowed(view)
    }
}

impl From<OwnedBuffer> for BoundaryBuf<'_> {
    fn from(buf: OwnedBuffer) -> Self {
        Self::Owned(buf)
    }
}
