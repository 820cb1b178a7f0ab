//! Course content search tool.

use super::{Source, Tool, ToolDefinition, ToolOutput};
use crate::index::{SearchResults, SemanticIndex};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Sentinel course title that suppresses link lookup entirely.
const UNKNOWN_COURSE: &str = "unknown";

/// Semantic search over course content with fuzzy course-name matching and
/// optional lesson filtering.
pub struct SearchTool {
    index: Arc<dyn SemanticIndex>,
}

impl SearchTool {
    /// Create a search tool over the given index.
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self { index }
    }

    /// Format results and collect one citation per result.
    async fn format_results(
        &self,
        results: &SearchResults,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> ToolOutput {
        if let Some(error) = &results.error {
            return ToolOutput::text_only(error.clone());
        }

        if results.is_empty() {
            let mut message = "No relevant content found".to_string();
            if let Some(name) = course_name {
                message.push_str(&format!(" in course '{}'", name));
            }
            if let Some(lesson) = lesson_number {
                message.push_str(&format!(" in lesson {}", lesson));
            }
            message.push('.');
            return ToolOutput::text_only(message);
        }

        let mut formatted = Vec::with_capacity(results.documents.len());
        let mut sources = Vec::with_capacity(results.documents.len());

        for (document, meta) in results.documents.iter().zip(results.metadata.iter()) {
            let header = match meta.lesson_number {
                Some(n) => format!("[{} - Lesson {}]", meta.course_title, n),
                None => format!("[{}]", meta.course_title),
            };
            formatted.push(format!("{}\n{}", header, document));

            let label = match meta.lesson_number {
                Some(n) => format!("{} - Lesson {}", meta.course_title, n),
                None => meta.course_title.clone(),
            };
            let url = if meta.course_title == UNKNOWN_COURSE {
                None
            } else {
                match meta.lesson_number {
                    Some(n) => self.index.get_lesson_link(&meta.course_title, n).await,
                    None => self.index.get_course_link(&meta.course_title).await,
                }
            };
            sources.push(Source { text: label, url });
        }

        ToolOutput {
            text: formatted.join("\n\n"),
            sources,
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description: "Search course materials with smart course name matching and lesson filtering".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, args: &Value) -> ToolOutput {
        let Some(query) = args["query"].as_str() else {
            return ToolOutput::text_only("Missing required argument 'query'");
        };
        let course_name = args["course_name"].as_str();
        let lesson_number = args["lesson_number"].as_u64().map(|n| n as u32);

        let results = self
            .index
            .search(query, course_name, lesson_number, None)
            .await;

        self.format_results(&results, course_name, lesson_number)
            .await
    }
}
