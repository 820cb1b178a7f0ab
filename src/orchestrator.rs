//! Top-level query orchestrator for Pensum.
//!
//! Wires the embedder, vector store, semantic index, tool registry, answer
//! generator, and session manager into one entry point per user query.

use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::generator::AnswerGenerator;
use crate::index::{CourseIndex, SemanticIndex};
use crate::llm::{ChatModel, OpenAiChat};
use crate::session::SessionManager;
use crate::tools::{OutlineTool, SearchTool, Source, ToolRegistry};
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument};

/// Course catalog statistics for the `courses` command.
#[derive(Debug, Clone)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// The main orchestrator for answering questions about course materials.
pub struct Orchestrator {
    index: Arc<dyn SemanticIndex>,
    registry: ToolRegistry,
    generator: AnswerGenerator,
    sessions: SessionManager,
}

impl Orchestrator {
    /// Create a new orchestrator from configuration.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(&settings.embedding));

        let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new()),
            _ => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
        };

        let index: Arc<dyn SemanticIndex> = Arc::new(CourseIndex::new(
            store,
            embedder,
            settings.search.max_results,
        ));

        let model: Arc<dyn ChatModel> = Arc::new(OpenAiChat::new(&settings.generation));

        Ok(Self::with_components(
            index,
            model,
            settings.session.max_history,
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        index: Arc<dyn SemanticIndex>,
        model: Arc<dyn ChatModel>,
        max_history: usize,
    ) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SearchTool::new(index.clone())));
        registry.register(Arc::new(OutlineTool::new(index.clone())));

        Self {
            index,
            registry,
            generator: AnswerGenerator::new(model),
            sessions: SessionManager::new(max_history),
        }
    }

    /// Answer a user query, returning the answer text and the sources cited
    /// by any tool calls made along the way.
    #[instrument(skip(self, query))]
    pub async fn query(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<(String, Vec<Source>)> {
        let prompt = format!("Answer this question about course materials: {}", query);
        let history = session_id.and_then(|id| self.sessions.get_conversation_history(id));

        let answer = self
            .generator
            .generate(&prompt, history.as_deref(), &self.registry)
            .await?;

        let sources = self.registry.last_sources();
        self.registry.reset_sources();
        info!("Answered query with {} source(s)", sources.len());

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, query, &answer);
        }

        Ok((answer, sources))
    }

    /// Catalog statistics: how many courses are indexed and their titles.
    pub async fn get_course_analytics(&self) -> Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.index.course_count().await?,
            course_titles: self.index.course_titles().await?,
        })
    }

    /// Total number of indexed content chunks.
    pub async fn chunk_count(&self) -> Result<usize> {
        self.index.chunk_count().await
    }

    /// Look up a course outline directly, bypassing the model.
    pub async fn course_outline(&self, course_name: &str) -> String {
        self.registry
            .execute(
                "get_course_outline",
                &serde_json::json!({ "course_name": course_name }),
            )
            .await
    }

    /// Start a new conversation session.
    pub fn create_session(&self) -> String {
        self.sessions.create_session()
    }

    /// Forget a conversation session.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.clear_session(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SearchResults;
    use crate::llm::{ContentBlock, ModelResponse, StopReason};
    use crate::tests_support::{ScriptedModel, StubIndex};
    use serde_json::json;

    fn text_response(text: &str) -> ModelResponse {
        ModelResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
        }
    }

    fn search_call(query: &str, course: Option<&str>) -> ModelResponse {
        let mut input = json!({ "query": query });
        if let Some(course) = course {
            input["course_name"] = json!(course);
        }
        ModelResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "search_course_content".to_string(),
                input,
            }],
        }
    }

    #[tokio::test]
    async fn test_direct_answer_has_no_sources() {
        let model = Arc::new(ScriptedModel::new(vec![text_response("4")]));
        let orchestrator =
            Orchestrator::with_components(Arc::new(StubIndex::new()), model.clone(), 2);

        let session = orchestrator.create_session();
        let (answer, sources) = orchestrator
            .query("What is 2+2?", Some(&session))
            .await
            .unwrap();

        assert_eq!(answer, "4");
        assert!(sources.is_empty());

        // The query wrapper reaches the model; the raw query lands in history
        let first_message = &model.requests()[0].messages[0];
        assert!(matches!(
            &first_message.content[0],
            ContentBlock::Text { text }
                if text == "Answer this question about course materials: What is 2+2?"
        ));
        let history = orchestrator
            .sessions
            .get_conversation_history(&session)
            .unwrap();
        assert_eq!(history, "User: What is 2+2?\nAssistant: 4");
    }

    #[tokio::test]
    async fn test_searched_answer_carries_sources() {
        let index = StubIndex::new().with_results(SearchResults {
            documents: vec!["Retrieval basics.".to_string()],
            metadata: vec![crate::index::ChunkMetadata {
                course_title: "RAG Course".to_string(),
                lesson_number: Some(3),
                chunk_index: 0,
            }],
            distances: vec![0.1],
            error: None,
        });
        let model = Arc::new(ScriptedModel::new(vec![
            search_call("retrieval", None),
            text_response("Retrieval finds relevant chunks."),
        ]));
        let orchestrator = Orchestrator::with_components(Arc::new(index), model, 2);

        let (answer, sources) = orchestrator.query("What is retrieval?", None).await.unwrap();

        assert_eq!(answer, "Retrieval finds relevant chunks.");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "RAG Course - Lesson 3");
    }

    #[tokio::test]
    async fn test_sources_reset_between_queries() {
        let index = StubIndex::new().with_results(SearchResults {
            documents: vec!["Chunk.".to_string()],
            metadata: vec![crate::index::ChunkMetadata {
                course_title: "A".to_string(),
                lesson_number: None,
                chunk_index: 0,
            }],
            distances: vec![0.2],
            error: None,
        });
        let model = Arc::new(ScriptedModel::new(vec![
            search_call("x", None),
            text_response("First answer"),
            text_response("Second answer"),
        ]));
        let orchestrator = Orchestrator::with_components(Arc::new(index), model, 2);

        let (_, first_sources) = orchestrator.query("first", None).await.unwrap();
        assert_eq!(first_sources.len(), 1);

        // Second query answers directly; stale sources must not leak into it
        let (_, second_sources) = orchestrator.query("second", None).await.unwrap();
        assert!(second_sources.is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_course_filter_yields_error_string_and_no_sources() {
        // Empty catalog: resolution fails, the tool reports it as text
        let model = Arc::new(ScriptedModel::new(vec![
            search_call("anything", Some("InvalidCourse")),
            text_response("I could not find that course."),
        ]));
        let orchestrator =
            Orchestrator::with_components(Arc::new(StubIndex::new()), model.clone(), 2);

        let (_, sources) = orchestrator
            .query("What does InvalidCourse teach?", None)
            .await
            .unwrap();
        assert!(sources.is_empty());

        let follow_up = &model.requests()[1];
        let tool_result = follow_up.messages[2]
            .content
            .iter()
            .find_map(|block| match block {
                ContentBlock::ToolResult { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .unwrap();
        assert_eq!(tool_result, "No course found matching 'InvalidCourse'");
    }

    #[tokio::test]
    async fn test_query_without_session_keeps_no_history() {
        let model = Arc::new(ScriptedModel::new(vec![
            text_response("one"),
            text_response("two"),
        ]));
        let orchestrator =
            Orchestrator::with_components(Arc::new(StubIndex::new()), model.clone(), 2);

        orchestrator.query("first", None).await.unwrap();
        orchestrator.query("second", None).await.unwrap();

        // Neither request carries a "Previous conversation" section
        for request in model.requests() {
            assert!(!request.system.contains("Previous conversation"));
        }
    }

    #[tokio::test]
    async fn test_analytics_from_index() {
        let index = StubIndex::new().with_titles(&["Course A", "Course B"]);
        let model = Arc::new(ScriptedModel::new(vec![]));
        let orchestrator = Orchestrator::with_components(Arc::new(index), model, 2);

        let analytics = orchestrator.get_course_analytics().await.unwrap();
        assert_eq!(analytics.total_courses, 2);
        assert_eq!(analytics.course_titles, vec!["Course A", "Course B"]);
    }
}
