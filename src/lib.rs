//! Pensum - Course Materials Q&A
//!
//! A CLI tool for answering questions about indexed course materials,
//! backed by semantic search and LLM tool calling.
//!
//! The name "Pensum" is the Norwegian word for "syllabus."
//!
//! # Overview
//!
//! Pensum allows you to:
//! - Ask questions about indexed course content and get cited answers
//! - Resolve fuzzy course names against the catalog semantically
//! - Hold multi-turn conversations with bounded history
//! - Inspect course outlines and catalog statistics
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `index` - Semantic search over the course catalog and content
//! - `tools` - Retrieval tools the model can call, and their registry
//! - `session` - Conversation memory
//! - `llm` - Chat-model abstraction and the OpenAI adapter
//! - `generator` - The tool-calling answer protocol
//! - `orchestrator` - Wires everything into one query entry point
//!
//! # Example
//!
//! ```rust,no_run
//! use pensum::config::Settings;
//! use pensum::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let session = orchestrator.create_session();
//!     let (answer, sources) = orchestrator
//!         .query("What does lesson 3 of the MCP course cover?", Some(&session))
//!         .await?;
//!     println!("{} ({} sources)", answer, sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod index;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod tests_support;

pub use error::{PensumError, Result};
