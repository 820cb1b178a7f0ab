//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine distance computed in Rust for simplicity.
//! For large corpora consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{
    cosine_distance, ChunkMatch, ContentFilter, Course, CourseChunk, Lesson, VectorStore,
};
use crate::error::{PensumError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS courses (
    title TEXT PRIMARY KEY,
    link TEXT,
    instructor TEXT,
    lessons_json TEXT NOT NULL,
    title_embedding BLOB NOT NULL,
    ingested_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    course_title TEXT NOT NULL,
    lesson_number INTEGER,
    chunk_index INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_chunks_course_title ON chunks(course_title);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PensumError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn row_to_course(
        title: String,
        link: Option<String>,
        instructor: Option<String>,
        lessons_json: &str,
        ingested_at: &str,
    ) -> Course {
        let mut lessons: Vec<Lesson> = serde_json::from_str(lessons_json).unwrap_or_default();
        lessons.sort_by_key(|l| l.number);

        Course {
            title,
            link,
            instructor,
            lessons,
            ingested_at: DateTime::parse_from_rfc3339(ingested_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, course, title_embedding), fields(title = %course.title))]
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()> {
        let conn = self.lock()?;

        let lessons_json = serde_json::to_string(&course.lessons)?;

        conn.execute(
            r#"
            INSERT OR REPLACE INTO courses
            (title, link, instructor, lessons_json, title_embedding, ingested_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                course.title,
                course.link,
                course.instructor,
                lessons_json,
                Self::embedding_to_bytes(title_embedding),
                course.ingested_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted course '{}'", course.title);
        Ok(())
    }

    #[instrument(skip(self, chunks))]
    async fn upsert_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        let conn = self.lock()?;

        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            tx.execute(
                r#"
                INSERT INTO chunks (course_title, lesson_number, chunk_index, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index,
                    chunk.content,
                    Self::embedding_to_bytes(&chunk.embedding),
                ],
            )?;
        }

        tx.commit()?;
        info!("Inserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self))]
    async fn delete_course(&self, title: &str) -> Result<usize> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM courses WHERE title = ?1", params![title])?;
        let deleted = conn.execute("DELETE FROM chunks WHERE course_title = ?1", params![title])?;

        info!("Deleted course '{}' ({} chunks)", title, deleted);
        Ok(deleted)
    }

    async fn clear_all(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM courses;")?;
        Ok(())
    }

    #[instrument(skip(self, embedding))]
    async fn query_catalog(&self, embedding: &[f32]) -> Result<Option<(String, f32)>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT title, title_embedding FROM courses")?;
        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((title, bytes))
        })?;

        let best = rows
            .filter_map(|r| r.ok())
            .map(|(title, bytes)| {
                let distance = cosine_distance(embedding, &Self::bytes_to_embedding(&bytes));
                (title, distance)
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best)
    }

    #[instrument(skip(self, embedding, filter))]
    async fn query_content(
        &self,
        embedding: &[f32],
        filter: &ContentFilter,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT course_title, lesson_number, chunk_index, content, embedding FROM chunks",
        )?;

        let rows = stmt.query_map([], |row| {
            let course_title: String = row.get(0)?;
            let lesson_number: Option<u32> = row.get(1)?;
            let chunk_index: u32 = row.get(2)?;
            let content: String = row.get(3)?;
            let embedding_bytes: Vec<u8> = row.get(4)?;
            Ok((
                course_title,
                lesson_number,
                chunk_index,
                content,
                embedding_bytes,
            ))
        })?;

        let mut matches: Vec<ChunkMatch> = rows
            .filter_map(|r| r.ok())
            .filter(|(course_title, lesson_number, ..)| {
                filter.matches(course_title, *lesson_number)
            })
            .map(
                |(course_title, lesson_number, chunk_index, content, bytes)| ChunkMatch {
                    distance: cosine_distance(embedding, &Self::bytes_to_embedding(&bytes)),
                    content,
                    course_title,
                    lesson_number,
                    chunk_index,
                },
            )
            .collect();

        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);

        debug!("Found {} matching chunks", matches.len());
        Ok(matches)
    }

    #[instrument(skip(self))]
    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT title, link, instructor, lessons_json, ingested_at FROM courses WHERE title = ?1",
            params![title],
            |row| {
                let title: String = row.get(0)?;
                let link: Option<String> = row.get(1)?;
                let instructor: Option<String> = row.get(2)?;
                let lessons_json: String = row.get(3)?;
                let ingested_at: String = row.get(4)?;
                Ok((title, link, instructor, lessons_json, ingested_at))
            },
        );

        match result {
            Ok((title, link, instructor, lessons_json, ingested_at)) => Ok(Some(
                Self::row_to_course(title, link, instructor, &lessons_json, &ingested_at),
            )),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY ingested_at")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
