use std::fmt;
use std::ops::Deref;

use bytes::Bytes;

/// An immutable sequence of bytes travelling through an adapter.
///
/// A `Chunk` always owns its bytes: building one from a borrowed slice copies
/// it, so the buffer it was read from can be reused or resized without
/// affecting chunks that were already handed out.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Chunk(Bytes);

impl Chunk {
    /// Create a `Chunk` holding a snapshot of the given bytes
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }

    /// Number of bytes in this `Chunk`
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether this `Chunk` contains no bytes at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a cheap handle to the bytes of this `Chunk`
    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }
}

impl Deref for Chunk {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Self(data.into())
    }
}

impl From<Bytes> for Chunk {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl From<&'static [u8]> for Chunk {
    fn from(data: &'static [u8]) -> Self {
        Self(Bytes::from_static(data))
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chunk({} bytes)", self.len())
    }
}
