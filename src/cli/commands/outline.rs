//! Outline command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    // Fuzzy course-name resolution embeds the query, so the key is required
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Looking up course...");
    let outline = orchestrator.course_outline(course).await;
    spinner.finish_and_clear();

    println!("{}", outline);

    Ok(())
}
