use graphics_types::handles::Handle;
use pool::PoolVec;
use thiserror::Error;

/// A pending `get-buffer-data` request (spec.md §6): the handle, the byte
/// range, queued against the frame slot that last wrote the buffer so the
/// backend can wait for that slot's fence before copying back.
#[derive(Debug, Clone, Copy)]
pub struct ReadbackRequest {
    pub buffer: Handle,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Error)]
pub enum ReadbackError {
    #[error("buffer with the given handle was not found or is stale")]
    BufferNotFound,
    #[error("the backend had an error while reading back: {0}")]
    DriverErr(String),
}

/// The bytes a readback produced, still held in a frame-slot-pooled vec so a
/// repeated `get-buffer-data` call in a hot loop doesn't allocate.
#[derive(Debug)]
pub struct ReadbackResult {
    pub bytes: PoolVec<Vec<u8>>,
}

impl ReadbackResult {
    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}
