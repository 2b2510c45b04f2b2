use crate::error::Result;
use log::debug;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

/// Immutable file contents shared between the reader and the worker threads.
///
/// Cloning is cheap and every clone refers to the same bytes, which stay alive
/// until the last clone is dropped.
#[derive(Clone, Debug)]
pub struct RawBuffer {
    data: Arc<[u8]>,
}

impl RawBuffer {
    /// Reads the whole file into memory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        debug!("Loaded {} bytes from {}", data.len(), path.display());
        Ok(Self::from_vec(data))
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        RawBuffer { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.data.get(range)
    }
}

impl AsRef<[u8]> for RawBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
