use thiserror::Error;

/// Error taxonomy for the matching core. Structural errors (dimension,
/// configuration) surface immediately; `ProviderUnavailable` is transient
/// and the caller owns the retry decision.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The index holds zero eligible vectors. At the engine level this is
    /// a normal outcome (an empty result set), not a failure.
    #[error("vector index has no eligible entries")]
    EmptyIndex,

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("profile has no embedding: {0}")]
    NoEmbedding(String),

    #[error("invalid matching configuration: {0}")]
    Config(String),

    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("profile store error: {0}")]
    Store(String),

    #[error("request cancelled")]
    Cancelled,
}
