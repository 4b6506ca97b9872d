use thiserror::Error;

/// Errors raised by the tile store.
///
/// Operational variants ([`Connection`](StoreError::Connection),
/// [`Schema`](StoreError::Schema), [`Query`](StoreError::Query)) never escape
/// the `get`/`put` surface: the store logs them, tears itself down, and
/// reports a cache miss or a failed write instead. The remaining variants are
/// hard errors: construction-time misconfiguration and the explicitly
/// unsupported eviction operation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A connection to the backing database could not be opened or configured
    #[error("Connection error: {0}")]
    Connection(String),

    /// The cache table could not be inspected or created
    #[error("Schema error: {0}")]
    Schema(String),

    /// A fetch or insert against the cache table failed
    #[error("Query error: {0}")]
    Query(String),

    /// The configured table name is not a safe SQL identifier
    #[error(
        "Invalid table name {name:?}: identifiers must start with an ASCII letter or underscore, \
         contain only ASCII letters, digits, and underscores, and be at most {max_len} bytes"
    )]
    InvalidTableName { name: String, max_len: usize },

    /// The connection string is missing or empty
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(&'static str),

    /// The operation is not implemented by this store
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl StoreError {
    /// Whether this error indicates construction-time misconfiguration rather
    /// than a transient environment problem.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidTableName { .. } | StoreError::InvalidConnectionString(_)
        )
    }
}
