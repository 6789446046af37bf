//! Persistence backends for annotation libraries.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

use crate::store::AnnotationLibrary;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Why a library could not be saved, loaded or listed.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing saved under this key.
    #[error("no annotations saved under key {0:?}")]
    NotFound(String),
    /// The stored document is not an annotation library.
    #[error("annotation library encoding: {0}")]
    Serialization(String),
    #[error("annotation storage I/O: {0}")]
    Io(String),
    #[error("annotation storage: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Future returned by [`Storage`] methods. Not `Send`, so browser backends
/// can hold JS values across awaits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Keyed persistence of whole annotation libraries. Auto-save timing is the
/// host's business; this only reads and writes.
///
/// Native backends are shared across threads, hence `Send + Sync`; the
/// `wasm32` variant drops those bounds.
#[cfg(not(target_arch = "wasm32"))]
pub trait Storage: Send + Sync {
    fn save(&self, key: &str, library: &AnnotationLibrary) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationLibrary>>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// A place annotation libraries can be saved to and loaded from by key.
#[cfg(target_arch = "wasm32")]
pub trait Storage {
    fn save(&self, key: &str, library: &AnnotationLibrary) -> BoxFuture<'_, StorageResult<()>>;

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<AnnotationLibrary>>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>>;

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>>;
}

/// Serialize a library for storage.
fn encode(library: &AnnotationLibrary) -> StorageResult<String> {
    library
        .to_json()
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse a stored library. Bad records are dropped, see
/// [`AnnotationLibrary::from_json`].
fn decode(key: &str, json: &str) -> StorageResult<AnnotationLibrary> {
    AnnotationLibrary::from_json(json).map_err(|e| StorageError::Serialization(format!("{key}: {e}")))
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::future::Future;
    use std::task::{Context, Poll, Waker};

    /// Drive a storage future to completion. The backends here never pend.
    pub fn block_on<F: Future>(f: F) -> F::Output {
        let mut cx = Context::from_waker(Waker::noop());
        let mut f = std::pin::pin!(f);
        loop {
            if let Poll::Ready(out) = f.as_mut().poll(&mut cx) {
                return out;
            }
        }
    }
}
