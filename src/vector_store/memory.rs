//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_distance, ChunkMatch, ContentFilter, Course, CourseChunk, VectorStore,
};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    // Catalog entries paired with their title embeddings, in insertion order.
    catalog: RwLock<Vec<(Course, Vec<f32>)>>,
    chunks: RwLock<Vec<CourseChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()> {
        let mut catalog = self.catalog.write().unwrap();
        catalog.retain(|(c, _)| c.title != course.title);
        catalog.push((course.clone(), title_embedding.to_vec()));
        Ok(())
    }

    async fn upsert_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        let mut store = self.chunks.write().unwrap();
        store.extend(chunks.iter().cloned());
        Ok(chunks.len())
    }

    async fn delete_course(&self, title: &str) -> Result<usize> {
        let mut catalog = self.catalog.write().unwrap();
        catalog.retain(|(c, _)| c.title != title);

        let mut chunks = self.chunks.write().unwrap();
        let initial_len = chunks.len();
        chunks.retain(|chunk| chunk.course_title != title);
        Ok(initial_len - chunks.len())
    }

    async fn clear_all(&self) -> Result<()> {
        self.catalog.write().unwrap().clear();
        self.chunks.write().unwrap().clear();
        Ok(())
    }

    async fn query_catalog(&self, embedding: &[f32]) -> Result<Option<(String, f32)>> {
        let catalog = self.catalog.read().unwrap();

        let best = catalog
            .iter()
            .map(|(course, title_embedding)| {
                (
                    course.title.clone(),
                    cosine_distance(embedding, title_embedding),
                )
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best)
    }

    async fn query_content(
        &self,
        embedding: &[f32],
        filter: &ContentFilter,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let chunks = self.chunks.read().unwrap();

        let mut matches: Vec<ChunkMatch> = chunks
            .iter()
            .filter(|chunk| filter.matches(&chunk.course_title, chunk.lesson_number))
            .map(|chunk| ChunkMatch {
                content: chunk.content.clone(),
                course_title: chunk.course_title.clone(),
                lesson_number: chunk.lesson_number,
                chunk_index: chunk.chunk_index,
                distance: cosine_distance(embedding, &chunk.embedding),
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        Ok(matches)
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog
            .iter()
            .find(|(c, _)| c.title == title)
            .map(|(c, _)| c.clone()))
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(self.catalog.read().unwrap().len())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.iter().map(|(c, _)| c.title.clone()).collect())
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.chunks.read().unwrap().len())
    }
}
