/// Errors returned by [`LruCache`](crate::LruCache) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The key was never inserted or has been evicted.
    #[error("cache miss")]
    Miss,

    /// The store rejected a write because its bookkeeping is inconsistent.
    #[error("cache write failed: {0}")]
    WriteFailed(String),
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
