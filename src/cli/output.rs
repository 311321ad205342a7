//! Output formatting for the CLI
//!
//! Text mode prints colored status lines; JSON mode prints exactly one JSON
//! document per command on stdout and keeps status lines quiet.

use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { json }
    }

    pub const fn is_json(&self) -> bool {
        self.json
    }

    /// Pretty-print any serializable value as JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn success(&self, msg: &str) {
        if !self.json {
            println!("{} {}", "✓".green().bold(), msg);
        }
    }

    pub fn info(&self, msg: &str) {
        if !self.json {
            println!("{msg}");
        }
    }

    pub fn warning(&self, msg: &str) {
        if !self.json {
            println!("{} {}", "⚠".yellow().bold(), msg);
        }
    }

    /// Errors always go to stderr, JSON mode included
    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", "✗".red().bold(), msg);
    }

    /// Print `label: value` with the label dimmed
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        if !self.json {
            println!("  {:<12} {}", format!("{label}:").dimmed(), value);
        }
    }
}
