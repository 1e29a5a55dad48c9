//! Display helpers for CLI output: colors, labels and tables.
//!
//! Coloring goes through `console`, which honours `NO_COLOR` and non-terminal output.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::{style, StyledObject};

use crate::cli::output::truncate;
use crate::domain::models::FeedbackEntry;

/// Colored rendering of a workflow status.
pub fn colorize_status(status: &str) -> StyledObject<&str> {
    match status {
        "complete" | "completed" => style(status).green().bold(),
        "running" | "awaiting" => style(status).yellow(),
        "needs_lyrics" | "halted" => style(status).cyan(),
        "error" => style(status).red().bold(),
        _ => style(status).white(),
    }
}

/// Styled label for detail views (bold + dimmed colon).
pub fn label(name: &str) -> String {
    format!("{}{}", style(name).bold(), style(":").dim())
}

/// Section header with underline.
pub fn section_header(title: &str) -> String {
    format!("\n{}", style(title).bold().underlined())
}

/// Create a standard list table with the given headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// One row per reviewed draft.
pub fn feedback_table(history: &[FeedbackEntry]) -> Table {
    let mut table = list_table(&["#", "satisfied", "style feedback", "suggestions"]);
    for entry in history {
        let verdict = &entry.feedback;
        table.add_row(vec![
            Cell::new(entry.iteration),
            Cell::new(if verdict.satisfied { "yes" } else { "no" }),
            Cell::new(truncate(&verdict.style_feedback, 60)),
            Cell::new(truncate(&verdict.revision_suggestions, 60)),
        ]);
    }
    table
}
