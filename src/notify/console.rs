//! Colored console output for findings and replay results.

use crate::notify::{FindingSink, LogSink};
use crate::types::{Confidence, Finding, ReplaySummary, Severity};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Console output handler with colors and formatting.
pub struct ConsoleOutput {
    verbose: bool,
    json_mode: bool,
    quiet: bool,
}

impl ConsoleOutput {
    /// Create a new console output handler.
    pub fn new(verbose: bool, json_mode: bool, quiet: bool) -> Self {
        Self { verbose, json_mode, quiet }
    }

    /// Print replay start message.
    pub fn print_replay_start(&self, capture: &str, transactions: usize) {
        if self.json_mode || self.quiet {
            return;
        }

        println!(
            "{} Replaying: {} ({} transactions)",
            "[*]".bright_blue(),
            capture.bright_white(),
            transactions
        );
    }

    /// Print progress (only in verbose mode).
    pub fn print_progress(&self, message: &str) {
        if self.json_mode || !self.verbose {
            return;
        }

        println!("{} {}", "[.]".dimmed(), message.dimmed());
    }

    /// Print info message.
    pub fn print_info(&self, message: &str) {
        if self.json_mode || self.quiet {
            return;
        }

        println!("{} {}", "[*]".bright_blue(), message);
    }

    /// Print a finding.
    pub fn print_finding(&self, finding: &Finding) {
        if self.json_mode {
            return;
        }

        println!();
        println!(
            "{} {} [{}]",
            "===".bright_cyan(),
            finding.package.bright_white().bold(),
            format_severity(finding.severity)
        );
        println!("    |-- Status: {}", "NOT FOUND ON NPM".red().bold());
        println!("    |-- URL: {}", finding.url.as_str().dimmed());
        println!("    +-- Confidence: {}", format_confidence(finding.confidence));
    }

    /// Print the registry verdict for a package name.
    pub fn print_verdict(&self, name: &str, public: bool) {
        if public {
            println!("{} {} {}", "[+]".green(), name.bright_white(), "public".green());
        } else {
            println!("{} {} {}", "[!]".red(), name.bright_white().bold(), "NOT FOUND ON NPM".red().bold());
        }
    }

    /// Print the module names extracted from a file.
    pub fn print_extracted(&self, source: &str, names: &[String]) {
        println!("{} {} ({} modules)", "[*]".bright_blue(), source.bright_white(), names.len());
        for name in names {
            println!("    {}", name);
        }
    }

    /// Print replay summary.
    pub fn print_summary(&self, summary: &ReplaySummary) {
        if self.json_mode {
            return;
        }

        if self.quiet && summary.stats.findings == 0 {
            return;
        }

        let stats = &summary.stats;
        println!();
        println!("{}", "=== Replay Summary ===".bright_cyan());
        println!("  Captures:      {}", summary.captures.join(", "));
        println!("  Duration:      {:.2}s", summary.duration_secs);
        println!("  Transactions:  {}", stats.observed);
        println!("  Analysed:      {}", stats.analysed);
        println!("  Duplicates:    {}", stats.duplicates);
        println!("  Lookups:       {}", stats.lookups);

        if stats.lookup_failures > 0 {
            println!(
                "  {}",
                format!("Registry failures: {} (reported as private)", stats.lookup_failures)
                    .yellow()
            );
        }

        if stats.findings > 0 {
            println!(
                "  {}",
                format!("PRIVATE MODULES FOUND: {}", stats.findings).red().bold()
            );
        } else {
            println!("  {}", "No private modules found.".green());
        }

        if !summary.errors.is_empty() {
            println!();
            println!("{}", "Errors encountered:".yellow());
            for error in &summary.errors {
                println!("  - {}", error.dimmed());
            }
        }

        println!();
    }

    /// Create a progress bar.
    pub fn create_progress_bar(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if self.json_mode || self.quiet {
            return None;
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(message.to_string());
        Some(pb)
    }
}

impl FindingSink for ConsoleOutput {
    fn add_finding(&self, finding: Finding) {
        self.print_finding(&finding);
    }
}

impl LogSink for ConsoleOutput {
    fn line(&self, line: &str) {
        // Keep stdout clean for the JSON document
        if self.json_mode {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

fn format_severity(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::High => "HIGH".red().bold(),
        Severity::Medium => "MEDIUM".yellow().bold(),
        Severity::Low => "LOW".blue(),
        Severity::Info => "INFO".dimmed(),
    }
}

/// Format confidence level with color.
fn format_confidence(confidence: Confidence) -> colored::ColoredString {
    match confidence {
        Confidence::High => "High".green(),
        Confidence::Medium => "Medium".yellow(),
        Confidence::Low => "Low".dimmed(),
    }
}

impl Default for ConsoleOutput {
    fn default() -> Self {
        Self::new(false, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_output_creation() {
        let output = ConsoleOutput::new(true, false, false);
        assert!(output.verbose);
        assert!(!output.json_mode);
    }

    #[test]
    fn test_no_progress_bar_in_json_mode() {
        let output = ConsoleOutput::new(false, true, false);
        assert!(output.create_progress_bar(10, "Replaying").is_none());
    }

    #[test]
    fn test_format_labels() {
        colored::control::set_override(false);
        assert_eq!(format_severity(Severity::High).to_string(), "HIGH");
        assert_eq!(format_confidence(Confidence::Medium).to_string(), "Medium");
    }
}
