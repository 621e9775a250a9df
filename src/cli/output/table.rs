//! Table output formatting for CLI commands
//!
//! Provides formatted tables for tasks, statistics and presets using comfy-table.
//! Supports color-coded status cells and automatic column sizing.

use crate::domain::models::{ProcessorPreset, Statistics, Task, TaskStatus};
use comfy_table::{presets, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use std::env;

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
    /// Maximum width for tables (None = auto)
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Create a new table formatter with custom settings
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Format a list of tasks as a table
    pub fn format_tasks(&self, tasks: &[Task]) -> String {
        let mut table = self.create_base_table();

        table.set_header(header(&[
            "ID",
            "Operation",
            "Priority",
            "Status",
            "Progress",
            "Retries",
            "Input",
            "Error",
        ]));

        for task in tasks {
            let status_cell = if self.use_colors {
                Cell::new(task.status.to_string()).fg(status_color(task.status))
            } else {
                Cell::new(format!("{} {}", status_icon(task.status), task.status))
            };

            table.add_row(vec![
                Cell::new(task.id.to_string()),
                Cell::new(&task.operation),
                Cell::new(task.priority.to_string()),
                status_cell,
                Cell::new(format!("{}%", task.progress)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{}/{}", task.retry_count, task.max_retries)),
                Cell::new(truncate_text(&task.input_path, 40)),
                Cell::new(truncate_text(task.error.as_deref().unwrap_or("-"), 40)),
            ]);
        }

        table.to_string()
    }

    /// Format statistics as a metric/count table
    pub fn format_statistics(&self, stats: &Statistics) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Metric", "Value"]));

        for (label, count) in [
            ("Total", stats.total),
            ("Queued", stats.queued),
            ("Processing", stats.processing),
            ("Completed", stats.completed),
            ("Failed", stats.failed),
            ("Cancelled", stats.cancelled),
        ] {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(count).set_alignment(CellAlignment::Right),
            ]);
        }
        table.add_row(vec![
            Cell::new("Success rate").add_attribute(Attribute::Bold),
            Cell::new(format!("{:.1}%", stats.success_rate))
                .set_alignment(CellAlignment::Right),
        ]);

        table.to_string()
    }

    /// Format the built-in presets side by side
    pub fn format_presets(&self, presets: &[ProcessorPreset]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&[
            "Preset",
            "Concurrency",
            "Strategy",
            "Retries",
            "Delay (ms)",
            "Max Delay (ms)",
            "Timeout (ms)",
            "Priority",
            "Auto Start",
            "Persist",
        ]));

        for preset in presets {
            let config = preset.config();
            let name = if self.use_colors {
                Cell::new(preset.as_str()).fg(Color::Cyan)
            } else {
                Cell::new(preset.as_str())
            };

            table.add_row(vec![
                name,
                Cell::new(config.max_concurrent),
                Cell::new(format!("{:?}", config.retry_strategy).to_lowercase()),
                Cell::new(config.max_retries),
                Cell::new(config.retry_delay_ms),
                Cell::new(config.max_retry_delay_ms),
                Cell::new(
                    config
                        .timeout_ms
                        .map_or_else(|| "-".to_string(), |ms| ms.to_string()),
                ),
                Cell::new(yes_no(config.priority_enabled)),
                Cell::new(yes_no(config.auto_start)),
                Cell::new(yes_no(config.persist_state)),
            ]);
        }

        table.to_string()
    }

    /// Create a base table with common settings
    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

/// Map task status to color
const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Queued => Color::Yellow,
        TaskStatus::Processing => Color::Cyan,
        TaskStatus::Completed => Color::Green,
        TaskStatus::Failed => Color::Red,
        TaskStatus::Cancelled => Color::DarkGrey,
    }
}

/// Map task status to icon
const fn status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Queued => "○",
        TaskStatus::Processing => "⟳",
        TaskStatus::Completed => "✓",
        TaskStatus::Failed => "✗",
        TaskStatus::Cancelled => "⊘",
    }
}

const fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Truncate text to max length with ellipsis
fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
