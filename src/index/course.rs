//! Production semantic index backed by a vector store and an embedder.

use super::{ChunkMetadata, SearchResults, SemanticIndex};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{ContentFilter, Course, VectorStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Semantic index combining a vector store with an embedder.
pub struct CourseIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_results: usize,
}

impl CourseIndex {
    /// Create a new index. `max_results` is the default cap applied when a
    /// search does not specify its own limit.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, max_results: usize) -> Self {
        Self {
            store,
            embedder,
            max_results,
        }
    }
}

#[async_trait]
impl SemanticIndex for CourseIndex {
    async fn resolve_course_name(&self, partial: &str) -> Option<String> {
        let embedding = match self.embedder.embed(partial).await {
            Ok(e) => e,
            Err(e) => {
                warn!("Course name embedding failed for '{}': {}", partial, e);
                return None;
            }
        };

        match self.store.query_catalog(&embedding).await {
            Ok(Some((title, distance))) => {
                // No similarity cutoff: even poor matches resolve to the
                // nearest title. The caller treats this as a hint.
                debug!(
                    "Resolved '{}' to '{}' (distance {:.3})",
                    partial, title, distance
                );
                Some(title)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Catalog lookup failed for '{}': {}", partial, e);
                None
            }
        }
    }

    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> SearchResults {
        let mut filter = ContentFilter {
            course_title: None,
            lesson_number,
        };

        if let Some(name) = course_name {
            match self.resolve_course_name(name).await {
                Some(title) => filter.course_title = Some(title),
                None => {
                    return SearchResults::from_error(format!(
                        "No course found matching '{}'",
                        name
                    ))
                }
            }
        }

        let embedding = match self.embedder.embed(query).await {
            Ok(e) => e,
            Err(e) => return SearchResults::from_error(format!("Search error: {}", e)),
        };

        let limit = limit.unwrap_or(self.max_results);
        let matches = match self.store.query_content(&embedding, &filter, limit).await {
            Ok(m) => m,
            Err(e) => return SearchResults::from_error(format!("Search error: {}", e)),
        };

        let mut results = SearchResults::empty();
        for m in matches {
            results.documents.push(m.content);
            results.metadata.push(ChunkMetadata {
                course_title: m.course_title,
                lesson_number: m.lesson_number,
                chunk_index: m.chunk_index,
            });
            results.distances.push(m.distance);
        }
        results
    }

    async fn get_course_outline(&self, course_name: &str) -> Option<Course> {
        let title = self.resolve_course_name(course_name).await?;
        match self.store.get_course(&title).await {
            Ok(course) => course,
            Err(e) => {
                warn!("Catalog read failed for '{}': {}", title, e);
                None
            }
        }
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        match self.store.get_course(course_title).await {
            Ok(Some(course)) => course.lesson_link(lesson_number).map(str::to_string),
            Ok(None) => None,
            Err(e) => {
                warn!("Lesson link lookup failed for '{}': {}", course_title, e);
                None
            }
        }
    }

    async fn get_course_link(&self, course_title: &str) -> Option<String> {
        match self.store.get_course(course_title).await {
            Ok(Some(course)) => course.link,
            Ok(None) => None,
            Err(e) => {
                warn!("Course link lookup failed for '{}': {}", course_title, e);
                None
            }
        }
    }

    async fn course_count(&self) -> Result<usize> {
        self.store.course_count().await
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        self.store.course_titles().await
    }

    async fn chunk_count(&self) -> Result<usize> {
        self.store.chunk_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PensumError;
    use crate::vector_store::{CourseChunk, Lesson, MemoryVectorStore};
    use std::collections::HashMap;

    /// Deterministic embedder: known phrases map to fixed vectors, anything
    /// else to a far-away fallback axis.
    struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        fail: bool,
    }

    impl StubEmbedder {
        fn new(vectors: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vectors: vectors
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                vectors: HashMap::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(PensumError::Embedding("stub failure".to_string()));
            }
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| vec![0.0, 0.0, 1.0]))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    async fn seeded_index(embedder: StubEmbedder) -> CourseIndex {
        let store = Arc::new(MemoryVectorStore::new());

        let course = Course::new(
            "Building RAG Systems".to_string(),
            Some("https://example.com/rag".to_string()),
            Some("Grace Hopper".to_string()),
            vec![
                Lesson {
                    number: 0,
                    title: "Introduction".to_string(),
                    link: Some("https://example.com/rag/0".to_string()),
                },
                Lesson {
                    number: 3,
                    title: "Retrieval".to_string(),
                    link: Some("https://example.com/rag/3".to_string()),
                },
            ],
        );
        store.upsert_course(&course, &[1.0, 0.0, 0.0]).await.unwrap();

        store
            .upsert_chunks(&[
                CourseChunk {
                    content: "Retrieval augments generation.".to_string(),
                    course_title: "Building RAG Systems".to_string(),
                    lesson_number: Some(0),
                    chunk_index: 0,
                    embedding: vec![1.0, 0.0, 0.0],
                },
                CourseChunk {
                    content: "Chunking strategies matter.".to_string(),
                    course_title: "Building RAG Systems".to_string(),
                    lesson_number: Some(3),
                    chunk_index: 1,
                    embedding: vec![0.8, 0.2, 0.0],
                },
            ])
            .await
            .unwrap();

        CourseIndex::new(store, Arc::new(embedder), 5)
    }

    #[tokio::test]
    async fn test_resolve_exact_title() {
        let index = seeded_index(StubEmbedder::new(&[(
            "Building RAG Systems",
            vec![1.0, 0.0, 0.0],
        )]))
        .await;

        let resolved = index.resolve_course_name("Building RAG Systems").await;
        assert_eq!(resolved.as_deref(), Some("Building RAG Systems"));
    }

    #[tokio::test]
    async fn test_resolve_always_returns_something_when_nonempty() {
        // Unrelated query still resolves to the nearest title: the resolver
        // has no similarity cutoff by design.
        let index = seeded_index(StubEmbedder::new(&[])).await;
        let resolved = index.resolve_course_name("underwater basket weaving").await;
        assert_eq!(resolved.as_deref(), Some("Building RAG Systems"));
    }

    #[tokio::test]
    async fn test_resolve_empty_catalog_returns_none() {
        let store = Arc::new(MemoryVectorStore::new());
        let index = CourseIndex::new(store, Arc::new(StubEmbedder::new(&[])), 5);
        assert!(index.resolve_course_name("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_resolve_embed_failure_returns_none() {
        let index = seeded_index(StubEmbedder::failing()).await;
        assert!(index.resolve_course_name("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_search_without_filters() {
        let index = seeded_index(StubEmbedder::new(&[(
            "what is retrieval?",
            vec![1.0, 0.0, 0.0],
        )]))
        .await;

        let results = index.search("what is retrieval?", None, None, None).await;
        assert!(results.error.is_none());
        assert_eq!(results.documents.len(), 2);
        assert_eq!(results.documents.len(), results.metadata.len());
        assert_eq!(results.documents.len(), results.distances.len());
        assert_eq!(results.documents[0], "Retrieval augments generation.");
        assert!(results.distances[0] <= results.distances[1]);
    }

    #[tokio::test]
    async fn test_search_with_lesson_filter() {
        let index = seeded_index(StubEmbedder::new(&[("chunking", vec![1.0, 0.0, 0.0])])).await;

        let results = index.search("chunking", None, Some(3), None).await;
        assert!(results.error.is_none());
        assert_eq!(results.documents.len(), 1);
        assert_eq!(results.metadata[0].lesson_number, Some(3));
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let index = seeded_index(StubEmbedder::new(&[("q", vec![1.0, 0.0, 0.0])])).await;

        let results = index.search("q", None, None, Some(1)).await;
        assert_eq!(results.documents.len(), 1);
    }

    #[tokio::test]
    async fn test_search_unresolvable_course() {
        // Empty catalog means resolution must fail
        let store = Arc::new(MemoryVectorStore::new());
        let index = CourseIndex::new(store, Arc::new(StubEmbedder::new(&[])), 5);

        let results = index.search("q", Some("InvalidCourse"), None, None).await;
        assert_eq!(
            results.error.as_deref(),
            Some("No course found matching 'InvalidCourse'")
        );
        assert!(results.documents.is_empty());
        assert!(results.metadata.is_empty());
        assert!(results.distances.is_empty());
    }

    #[tokio::test]
    async fn test_search_backend_failure_is_error_string() {
        let index = seeded_index(StubEmbedder::failing()).await;
        let results = index.search("q", None, None, None).await;
        let error = results.error.expect("expected error");
        assert!(error.starts_with("Search error: "), "got: {}", error);
        assert!(results.documents.is_empty());
    }

    #[tokio::test]
    async fn test_outline_and_links() {
        let index = seeded_index(StubEmbedder::new(&[("rag", vec![1.0, 0.0, 0.0])])).await;

        let outline = index.get_course_outline("rag").await.unwrap();
        assert_eq!(outline.title, "Building RAG Systems");
        assert_eq!(outline.instructor.as_deref(), Some("Grace Hopper"));
        assert_eq!(outline.lessons.len(), 2);
        assert_eq!(outline.lessons[0].number, 0);

        assert_eq!(
            index.get_lesson_link("Building RAG Systems", 3).await,
            Some("https://example.com/rag/3".to_string())
        );
        assert_eq!(index.get_lesson_link("Building RAG Systems", 9).await, None);
        assert_eq!(
            index.get_course_link("Building RAG Systems").await,
            Some("https://example.com/rag".to_string())
        );
        assert_eq!(index.get_course_link("Nope").await, None);
    }

    #[tokio::test]
    async fn test_analytics_accessors() {
        let index = seeded_index(StubEmbedder::new(&[])).await;
        assert_eq!(index.course_count().await.unwrap(), 1);
        assert_eq!(
            index.course_titles().await.unwrap(),
            vec!["Building RAG Systems".to_string()]
        );
        assert_eq!(index.chunk_count().await.unwrap(), 2);
    }
}
