//! Semantic index over the course vector store.
//!
//! Resolves loosely-specified course names against the catalog and runs
//! filtered nearest-neighbor searches over course content. Tool capabilities
//! talk to this layer, never to the vector store directly.

mod course;

pub use course::CourseIndex;

use crate::error::Result;
use crate::vector_store::Course;
use async_trait::async_trait;

/// Metadata attached to each search result document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Full title of the course the chunk came from.
    pub course_title: String,
    /// Lesson number, if the chunk belongs to a specific lesson.
    pub lesson_number: Option<u32>,
    /// Position of the chunk within its course.
    pub chunk_index: u32,
}

/// The atomic output of a retrieval operation.
///
/// `documents`, `metadata` and `distances` are parallel sequences of equal
/// length. A set `error` implies all three are empty; empty sequences without
/// an error mean "no match", which is a distinct condition from failure.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub distances: Vec<f32>,
    pub error: Option<String>,
}

impl SearchResults {
    /// A well-formed empty result (no match, no failure).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A failed result carrying an error string and empty sequences.
    pub fn from_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// True when no documents were returned (regardless of error).
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Retrieval contract consumed by the tool capabilities.
#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Resolve a partial course name to the best-matching full title.
    ///
    /// A single nearest-neighbor lookup against catalog title embeddings.
    /// Returns None only when the catalog is empty or the lookup errors;
    /// there is no similarity threshold, so a non-empty catalog always
    /// produces some title. Callers must treat the result as a hint.
    async fn resolve_course_name(&self, partial: &str) -> Option<String>;

    /// Filtered nearest-neighbor search over course content.
    ///
    /// Failures never propagate as faults; they are carried in
    /// [`SearchResults::error`] so the model can react to them.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: Option<usize>,
    ) -> SearchResults;

    /// Resolve a course name and return its catalog entry, lessons sorted
    /// by number ascending. None when resolution fails.
    async fn get_course_outline(&self, course_name: &str) -> Option<Course>;

    /// Link for a specific lesson, if the course and lesson exist.
    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String>;

    /// Link for a course, if it exists.
    async fn get_course_link(&self, course_title: &str) -> Option<String>;

    /// Number of courses in the catalog.
    async fn course_count(&self) -> Result<usize>;

    /// All course titles in catalog order.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Total number of indexed content chunks.
    async fn chunk_count(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_results_are_empty() {
        let results = SearchResults::from_error("Search error: backend down");
        assert!(results.is_empty());
        assert!(results.documents.is_empty());
        assert!(results.metadata.is_empty());
        assert!(results.distances.is_empty());
        assert_eq!(
            results.error.as_deref(),
            Some("Search error: backend down")
        );
    }

    #[test]
    fn test_empty_without_error_is_no_match() {
        let results = SearchResults::empty();
        assert!(results.is_empty());
        assert!(results.error.is_none());
    }
}
