mod ollama;
mod trigram;

use std::sync::Arc;

use async_trait::async_trait;

pub use ollama::OllamaEmbedder;
pub use trigram::TrigramEmbedder;

use crate::core::config::settings::EmbeddingSettings;
use crate::core::errors::ApiError;

/// A source of fixed-length dense vectors for text.
///
/// The ranking contract does not depend on which backend produces the
/// vectors; swapping backends changes quality, not behavior.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

pub fn backend_from_settings(
    settings: &EmbeddingSettings,
) -> Result<Arc<dyn EmbeddingBackend>, ApiError> {
    match settings.backend.as_str() {
        "trigram" => Ok(Arc::new(TrigramEmbedder::new(settings.dimensions))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            settings.base_url.clone(),
            settings.model.clone(),
            settings.dimensions,
        )?)),
        other => Err(ApiError::InvalidParameter(format!(
            "unknown embedding backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigram_backend_resolves_from_settings() {
        let settings = EmbeddingSettings::default();
        let backend = backend_from_settings(&settings).expect("default backend");
        assert_eq!(backend.name(), "trigram");
        assert_eq!(backend.dimensions(), 384);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let settings = EmbeddingSettings {
            backend: "word2vec".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            backend_from_settings(&settings),
            Err(ApiError::InvalidParameter(_))
        ));
    }
}
