//! Output formatting for CLI

use console::style;
use relay_player_core::{Severity, Status};
use serde::Serialize;

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Print `data` as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Render a status line, errors in red like the player UI
pub fn styled_status(status: &Status) -> String {
    match status.severity {
        Severity::Info => style(&status.message).dim().to_string(),
        Severity::Error => style(&status.message).red().bold().to_string(),
    }
}
