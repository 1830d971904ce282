//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use anyhow::{Context, Result};
use notions_core::{CommandRecord, Session};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print the session's document
    ///
    /// Human mode prints the numbered outline, JSON mode the full dump and
    /// quiet mode only the node count.
    pub fn print_document(&self, session: &Session, indent: usize) -> Result<()> {
        let stdout = std::io::stdout();
        match self.format {
            OutputFormat::Human => session
                .print(stdout.lock(), indent)
                .context("Failed to print outline")?,
            OutputFormat::Json => session
                .dump(stdout.lock())
                .context("Failed to dump document")?,
            OutputFormat::Quiet => println!("{}", session.document().node_count()),
        }
        Ok(())
    }

    /// Print command log records
    pub fn print_records(&self, records: &[CommandRecord]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No commands recorded.");
                    return Ok(());
                }
                for record in records {
                    println!(
                        "{:>5}  {}  {:<17} {}",
                        record.seq,
                        record.at.format("%Y-%m-%d %H:%M:%S"),
                        record.command,
                        truncate(&record.args.to_string(), 60)
                    );
                }
                println!("\n{} command(s)", records.len());
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(records).context("Failed to encode records")?
                );
            }
            OutputFormat::Quiet => {
                for record in records {
                    println!("{}", record.command);
                }
            }
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    ///
    /// Goes to stderr so it never mixes with a document on stdout.
    pub fn message(&self, msg: &str) {
        if self.format == OutputFormat::Human {
            eprintln!("{}", msg);
        }
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ünïcödé text here", 8), "ünïcö...");
    }
}
