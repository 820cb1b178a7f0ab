//! Shared test doubles for unit tests.

use crate::error::{PensumError, Result};
use crate::index::{SearchResults, SemanticIndex};
use crate::llm::{ChatModel, ModelRequest, ModelResponse};
use crate::tools::{Source, Tool, ToolDefinition, ToolOutput};
use crate::vector_store::Course;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Scriptable [`SemanticIndex`] for tool and orchestration tests.
pub(crate) struct StubIndex {
    results: Option<SearchResults>,
    resolved: Option<String>,
    outline: Option<Course>,
    lesson_links: HashMap<(String, u32), String>,
    course_links: HashMap<String, String>,
    titles: Vec<String>,
}

impl StubIndex {
    pub(crate) fn new() -> Self {
        Self {
            results: None,
            resolved: None,
            outline: None,
            lesson_links: HashMap::new(),
            course_links: HashMap::new(),
            titles: Vec::new(),
        }
    }

    /// Fix the result set returned by every search call.
    pub(crate) fn with_results(mut self, results: SearchResults) -> Self {
        self.results = Some(results);
        self
    }

    /// Make course-name resolution succeed with the given title.
    pub(crate) fn with_resolved(mut self, title: &str) -> Self {
        self.resolved = Some(title.to_string());
        self
    }

    pub(crate) fn with_outline(mut self, course: Course) -> Self {
        self.outline = Some(course);
        self
    }

    pub(crate) fn with_lesson_link(mut self, course: &str, lesson: u32, url: &str) -> Self {
        self.lesson_links
            .insert((course.to_string(), lesson), url.to_string());
        self
    }

    pub(crate) fn with_course_link(mut self, course: &str, url: &str) -> Self {
        self.course_links.insert(course.to_string(), url.to_string());
        self
    }

    pub(crate) fn with_titles(mut self, titles: &[&str]) -> Self {
        self.titles = titles.iter().map(|t| t.to_string()).collect();
        self
    }
}

#[async_trait]
impl SemanticIndex for StubIndex {
    async fn resolve_course_name(&self, _partial: &str) -> Option<String> {
        self.resolved.clone()
    }

    async fn search(
        &self,
        _query: &str,
        course_name: Option<&str>,
        _lesson_number: Option<u32>,
        _limit: Option<usize>,
    ) -> SearchResults {
        if let Some(results) = &self.results {
            return results.clone();
        }
        // Unscripted searches behave like a real index with an empty catalog
        if let Some(name) = course_name {
            if self.resolved.is_none() {
                return SearchResults::from_error(format!("No course found matching '{}'", name));
            }
        }
        SearchResults::empty()
    }

    async fn get_course_outline(&self, _course_name: &str) -> Option<Course> {
        self.outline.clone()
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Option<String> {
        self.lesson_links
            .get(&(course_title.to_string(), lesson_number))
            .cloned()
    }

    async fn get_course_link(&self, course_title: &str) -> Option<String> {
        self.course_links.get(course_title).cloned()
    }

    async fn course_count(&self) -> Result<usize> {
        Ok(self.titles.len())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        Ok(self.titles.clone())
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(0)
    }
}

/// [`ChatModel`] that replays a queue of canned responses and records every
/// request it receives.
pub(crate) struct ScriptedModel {
    responses: Mutex<Vec<ModelResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
    fail: bool,
}

impl ScriptedModel {
    pub(crate) fn new(responses: Vec<ModelResponse>) -> Self {
        let mut queue = responses;
        queue.reverse();
        Self {
            responses: Mutex::new(queue),
            requests: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A model whose every call fails with a generator error.
    pub(crate) fn failing() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub(crate) fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse> {
        self.requests.lock().unwrap().push(request);
        if self.fail {
            return Err(PensumError::Generator("scripted failure".to_string()));
        }
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| PensumError::Generator("no scripted response left".to_string()))
    }
}

/// [`Tool`] that records the arguments of every invocation and returns a
/// fixed output.
pub(crate) struct RecordingTool {
    name: String,
    output: String,
    sources: Vec<Source>,
    calls: Mutex<Vec<Value>>,
}

impl RecordingTool {
    pub(crate) fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.to_string(),
            output: output.to_string(),
            sources: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Attach sources the tool reports alongside its text output.
    pub(crate) fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    pub(crate) fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: "Test tool".to_string(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    async fn execute(&self, args: &Value) -> ToolOutput {
        self.calls.lock().unwrap().push(args.clone());
        ToolOutput {
            text: self.output.clone(),
            sources: self.sources.clone(),
        }
    }
}
