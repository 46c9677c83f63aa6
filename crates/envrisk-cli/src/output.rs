use console::{style, StyledObject};
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
}

impl Level {
    fn marker(self) -> StyledObject<&'static str> {
        match self {
            Level::Success => style("✓").green().bold(),
            Level::Info => style("ℹ").blue().bold(),
            Level::Warning => style("⚠").yellow().bold(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
        }
    }
}

/// Writes command results to stdout and notices to stderr.
///
/// In JSON mode stdout carries exactly one document, the `{status, data}`
/// envelope from [`OutputWriter::result`].
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        let format = if json { OutputFormat::Json } else { OutputFormat::Human };
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    pub fn success(&self, message: impl Display) {
        self.notice(Level::Success, message);
    }

    pub fn info(&self, message: impl Display) {
        self.notice(Level::Info, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.notice(Level::Warning, message);
    }

    fn notice(&self, level: Level, message: impl Display) {
        match (self.format, level) {
            (OutputFormat::Human, Level::Warning) => eprintln!("{} {}", level.marker(), message),
            (OutputFormat::Human, _) => println!("{} {}", level.marker(), message),
            (OutputFormat::Json, Level::Warning) => eprintln!(
                "{}",
                serde_json::json!({ "status": level.name(), "message": message.to_string() })
            ),
            (OutputFormat::Json, _) => {}
        }
    }

    /// Heading for a block of key/value lines or a table
    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if !self.is_json() {
            println!("  {}: {}", style(key).bold(), value);
        }
    }

    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if rows.is_empty() {
            println!("{}", style("(no data)").dim());
            return;
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let document = match self.format {
            OutputFormat::Human => serde_json::to_string_pretty(&data)?,
            OutputFormat::Json => serde_json::to_string_pretty(
                &serde_json::json!({ "status": "success", "data": data }),
            )?,
        };
        println!("{}", document);
        Ok(())
    }
}
