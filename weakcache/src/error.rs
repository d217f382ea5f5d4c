use thiserror::Error;

/// Errors reported by [`Cache`](crate::Cache) and its views.
///
/// Every error is raised synchronously by the call that caused it and none of
/// them are retryable: the caller has to change what it asks for.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheError {
    /// A record for the key is already present, whether its value is still
    /// alive or not.
    #[error("an entry with the same key is already present")]
    DuplicateKey,

    /// The value handed to the cache is absent: its weak reference no longer
    /// resolves.
    #[error("value is absent or has already been released")]
    NullValue,

    /// No live value is stored under the key.
    #[error("key not found")]
    KeyNotFound,

    /// A mutation was attempted through a read-only view.
    #[error("`{0}` is not supported on a read-only view")]
    Unsupported(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::CacheError;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CacheError::DuplicateKey.to_string(),
            "an entry with the same key is already present"
        );
        assert_eq!(
            CacheError::NullValue.to_string(),
            "value is absent or has already been released"
        );
        assert_eq!(CacheError::KeyNotFound.to_string(), "key not found");
        assert_eq!(
            CacheError::Unsupported("clear").to_string(),
            "`clear` is not supported on a read-only view"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
        assert_error(&CacheError::KeyNotFound);
    }
}
