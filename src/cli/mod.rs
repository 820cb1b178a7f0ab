//! CLI module for Pensum.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Pensum - Course Materials Q&A
///
/// Ask questions about indexed course materials and get AI-powered answers
/// with citations. The name "Pensum" is the Norwegian word for "syllabus."
#[derive(Parser, Debug)]
#[command(name = "pensum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a single question about your course materials
    Ask {
        /// The question to ask
        question: String,

        /// Session ID to continue a previous conversation
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat session with conversation memory
    Chat,

    /// List indexed courses
    Courses,

    /// Show the outline of a course (title, link, and lesson list)
    Outline {
        /// Course title, or part of one
        course: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
