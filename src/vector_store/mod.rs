//! Vector store abstraction for Pensum.
//!
//! Holds two logical collections: a course catalog (one row per course, with
//! the title embedding used for fuzzy name resolution) and a content store
//! (one row per text chunk). Provides a trait-based interface for different
//! backends.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A lesson within a course. Lesson numbers are unique within a course but
/// need not be contiguous.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    /// Lesson number (non-negative, unique within the course).
    pub number: u32,
    /// Lesson title.
    pub title: String,
    /// Lesson URL, if known.
    pub link: Option<String>,
}

/// A course catalog entry. The title is the unique key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Full course title.
    pub title: String,
    /// Course URL, if known.
    pub link: Option<String>,
    /// Instructor name, if known.
    pub instructor: Option<String>,
    /// Lessons, kept sorted by lesson number ascending.
    pub lessons: Vec<Lesson>,
    /// When this course was ingested.
    pub ingested_at: DateTime<Utc>,
}

impl Course {
    /// Create a new catalog entry. Lessons are sorted by number.
    pub fn new(
        title: String,
        link: Option<String>,
        instructor: Option<String>,
        mut lessons: Vec<Lesson>,
    ) -> Self {
        lessons.sort_by_key(|l| l.number);
        Self {
            title,
            link,
            instructor,
            lessons,
            ingested_at: Utc::now(),
        }
    }

    /// Look up the link for a lesson by number.
    pub fn lesson_link(&self, number: u32) -> Option<&str> {
        self.lessons
            .iter()
            .find(|l| l.number == number)
            .and_then(|l| l.link.as_deref())
    }
}

/// A text chunk stored in the content collection. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Raw chunk text.
    pub content: String,
    /// Title of the course this chunk belongs to.
    pub course_title: String,
    /// Lesson number, if the chunk came from a specific lesson.
    pub lesson_number: Option<u32>,
    /// Position of the chunk within its course.
    pub chunk_index: u32,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

/// A content match returned by a nearest-neighbor query.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    /// The chunk text.
    pub content: String,
    /// Course title of the chunk.
    pub course_title: String,
    /// Lesson number of the chunk, if any.
    pub lesson_number: Option<u32>,
    /// Chunk index within the course.
    pub chunk_index: u32,
    /// Distance from the query embedding (lower is closer).
    pub distance: f32,
}

/// Equality filter applied to content queries.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    /// Restrict to a single course by exact title.
    pub course_title: Option<String>,
    /// Restrict to a single lesson number.
    pub lesson_number: Option<u32>,
}

impl ContentFilter {
    fn matches(&self, chunk_course: &str, chunk_lesson: Option<u32>) -> bool {
        if let Some(title) = &self.course_title {
            if title != chunk_course {
                return false;
            }
        }
        if let Some(lesson) = self.lesson_number {
            if chunk_lesson != Some(lesson) {
                return false;
            }
        }
        true
    }
}

/// Trait for vector store backends.
///
/// Write operations are the ingestion boundary; serving traffic only reads.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a course catalog entry along with its title embedding.
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()>;

    /// Bulk insert content chunks.
    async fn upsert_chunks(&self, chunks: &[CourseChunk]) -> Result<usize>;

    /// Delete a course and all of its chunks. Returns the number of chunks removed.
    async fn delete_course(&self, title: &str) -> Result<usize>;

    /// Remove everything from both collections.
    async fn clear_all(&self) -> Result<()>;

    /// Nearest-neighbor lookup against catalog title embeddings.
    /// Returns the single best-matching course title with its distance,
    /// or None if the catalog is empty.
    async fn query_catalog(&self, embedding: &[f32]) -> Result<Option<(String, f32)>>;

    /// Filtered nearest-neighbor query against the content store,
    /// ordered by distance ascending.
    async fn query_content(
        &self,
        embedding: &[f32],
        filter: &ContentFilter,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>>;

    /// Fetch a catalog entry by exact title.
    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// Number of courses in the catalog.
    async fn course_count(&self) -> Result<usize>;

    /// All course titles, in catalog order.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Total number of content chunks.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Convert cosine similarity into the distance reported to callers.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_lessons_sorted_on_creation() {
        let course = Course::new(
            "Test Course".to_string(),
            None,
            None,
            vec![
                Lesson {
                    number: 4,
                    title: "Fourth".to_string(),
                    link: None,
                },
                Lesson {
                    number: 0,
                    title: "Intro".to_string(),
                    link: Some("https://example.com/l0".to_string()),
                },
            ],
        );

        assert_eq!(course.lessons[0].number, 0);
        assert_eq!(course.lessons[1].number, 4);
        assert_eq!(course.lesson_link(0), Some("https://example.com/l0"));
        assert_eq!(course.lesson_link(4), None);
        assert_eq!(course.lesson_link(9), None);
    }

    #[test]
    fn test_content_filter() {
        let filter = ContentFilter {
            course_title: Some("Course A".to_string()),
            lesson_number: Some(2),
        };
        assert!(filter.matches("Course A", Some(2)));
        assert!(!filter.matches("Course A", Some(3)));
        assert!(!filter.matches("Course A", None));
        assert!(!filter.matches("Course B", Some(2)));

        let unfiltered = ContentFilter::default();
        assert!(unfiltered.matches("Anything", None));
    }
}
