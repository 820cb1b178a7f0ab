//! Course outline tool.

use super::{Tool, ToolDefinition, ToolOutput};
use crate::index::SemanticIndex;
use crate::vector_store::Course;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Returns the full outline of a course: title, link, instructor and every
/// lesson in ascending order.
pub struct OutlineTool {
    index: Arc<dyn SemanticIndex>,
}

impl OutlineTool {
    /// Create an outline tool over the given index.
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self { index }
    }

    fn render(course: &Course) -> String {
        let mut lines = vec![format!("Course: {}", course.title)];

        if let Some(link) = &course.link {
            lines.push(format!("Link: {}", link));
        }
        if let Some(instructor) = &course.instructor {
            lines.push(format!("Instructor: {}", instructor));
        }

        lines.push(format!("Lessons ({}):", course.lessons.len()));
        for lesson in &course.lessons {
            lines.push(format!("  Lesson {}: {}", lesson.number, lesson.title));
        }

        lines.join("\n")
    }
}

#[async_trait]
impl Tool for OutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_course_outline".to_string(),
            description: "Get the complete outline of a course including its title, link, and all lessons".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, args: &Value) -> ToolOutput {
        let Some(course_name) = args["course_name"].as_str() else {
            return ToolOutput::text_only("Missing required argument 'course_name'");
        };

        match self.index.get_course_outline(course_name).await {
            Some(course) => ToolOutput::text_only(Self::render(&course)),
            None => ToolOutput::text_only(format!("No course found matching '{}'", course_name)),
        }
    }
}
