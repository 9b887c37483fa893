pub mod hash;

pub use hash::HashEmbedder;

use crate::errors::MatchError;
use tracing::warn;

/// Abstract embedding provider.
///
/// The engine treats embedding as an opaque capability: text in, fixed-D
/// vector out. Implementations must be deterministic for identical input
/// or version-stamp themselves so mixed generations can be detected.
pub trait EmbeddingProvider: Send + Sync {
    /// Implementation name ("hash", ...).
    fn name(&self) -> &'static str;

    /// Version string for generation tracking. Bump whenever the produced
    /// vectors change for identical input.
    fn version(&self) -> &str;

    /// Embedding dimensionality D.
    fn dimension(&self) -> usize;

    /// Map a text payload to a D-dimensional vector. Transient failures
    /// surface as `ProviderUnavailable`; the caller owns retry policy.
    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError>;
}

#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Embedding dimensionality (powers of two recommended: 128, 256, 512).
    pub dimension: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self { dimension: 256 }
    }
}

impl EmbedConfig {
    pub fn from_env() -> Self {
        Self {
            dimension: std::env::var("MM_EMBED_DIMENSION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
        }
    }
}

/// Provider factory. Unknown names fall back to the hash provider.
pub fn create_provider(name: &str, config: EmbedConfig) -> Box<dyn EmbeddingProvider> {
    match name {
        "hash" => Box::new(HashEmbedder::new(config)),
        other => {
            warn!(provider = other, "unknown embedding provider; using hash");
            Box::new(HashEmbedder::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_falls_back_to_hash() {
        let provider = create_provider("does-not-exist", EmbedConfig::default());
        assert_eq!(provider.name(), "hash");
        assert_eq!(provider.dimension(), 256);
    }

    #[test]
    fn default_dimension_is_256() {
        assert_eq!(EmbedConfig::default().dimension, 256);
    }
}
