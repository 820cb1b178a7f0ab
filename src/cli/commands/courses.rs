//! Courses command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(settings: Settings) -> Result<()> {
    preflight::check(Operation::Catalog)?;

    let orchestrator = Orchestrator::new(settings)?;

    let analytics = orchestrator.get_course_analytics().await?;

    if analytics.total_courses == 0 {
        Output::info("No courses indexed yet.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", analytics.total_courses));
    println!();
    for title in &analytics.course_titles {
        Output::list_item(title);
    }

    let chunks = orchestrator.chunk_count().await?;
    println!();
    Output::kv("Total chunks", &chunks.to_string());

    Ok(())
}
