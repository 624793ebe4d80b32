pub mod chunker;
pub mod embeddings;
pub mod similarity;

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::retrieval::embeddings::EmbeddingBackend;

/// Ranks text chunks against a query by embedding both and scoring with
/// cosine similarity.
pub struct SemanticRetriever {
    backend: Arc<dyn EmbeddingBackend>,
}

impl SemanticRetriever {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Return up to `top_k` chunks, most relevant first. Ties keep the
    /// original chunk order; an empty chunk list is a normal empty result.
    pub async fn rank(
        &self,
        chunks: &[String],
        query: &str,
        top_k: usize,
    ) -> Result<Vec<String>, ApiError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_owned = query.to_string();
        let mut query_vectors = self
            .backend
            .embed_batch(std::slice::from_ref(&query_owned))
            .await?;
        let query_vector = query_vectors
            .pop()
            .ok_or_else(|| ApiError::Internal("embedding backend returned no query vector".to_string()))?;

        let chunk_vectors = self.backend.embed_batch(chunks).await?;
        if chunk_vectors.len() != chunks.len() {
            return Err(ApiError::Internal(format!(
                "embedding backend returned {} vectors for {} chunks",
                chunk_vectors.len(),
                chunks.len()
            )));
        }

        let ranked = similarity::rank_descending(&query_vector, &chunk_vectors)?;
        Ok(ranked
            .into_iter()
            .take(top_k)
            .map(|(idx, _)| chunks[idx].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::embeddings::TrigramEmbedder;

    fn retriever() -> SemanticRetriever {
        SemanticRetriever::new(Arc::new(TrigramEmbedder::new(384)))
    }

    #[tokio::test]
    async fn exact_match_chunk_ranks_first() {
        let chunks = vec![
            "glaciers carve valleys over millennia".to_string(),
            "the stock exchange closed higher today".to_string(),
            "a recipe for sourdough bread starters".to_string(),
        ];
        let ranked = retriever()
            .rank(&chunks, "the stock exchange closed higher today", 3)
            .await
            .expect("ranking should work");

        assert_eq!(ranked[0], chunks[1]);
    }

    #[tokio::test]
    async fn result_length_is_bounded_by_top_k_and_chunk_count() {
        let chunks = vec![
            "first chunk of text".to_string(),
            "second chunk of text".to_string(),
        ];

        let ranked = retriever().rank(&chunks, "text", 1).await.expect("rank");
        assert_eq!(ranked.len(), 1);

        let ranked = retriever().rank(&chunks, "text", 10).await.expect("rank");
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn empty_chunk_list_is_an_empty_result() {
        let ranked = retriever().rank(&[], "anything", 5).await.expect("rank");
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn ranking_is_deterministic() {
        let chunks = vec![
            "rust ownership and borrowing".to_string(),
            "python garbage collection".to_string(),
            "rust lifetimes and traits".to_string(),
        ];
        let first = retriever().rank(&chunks, "rust traits", 3).await.expect("rank");
        let second = retriever().rank(&chunks, "rust traits", 3).await.expect("rank");
        assert_eq!(first, second);
    }
}
