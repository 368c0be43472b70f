use crate::context::AppContext;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;

pub use libreap::config::{ColorChoice, OutputFormat};

/// Trait for output formatting that can be TTY-aware or plain text
pub trait OutputFormatter: Send + Sync {
    /// Print a success message
    fn success(&self, message: &str);

    /// Print an error message
    fn error(&self, message: &str);

    /// Print a warning message
    fn warning(&self, message: &str);

    /// Color a status mark for table cells
    fn mark(&self, ok: bool) -> String;

    /// Create a spinner for indeterminate progress
    fn spinner(&self, message: &str) -> ProgressBar;

    /// Create a progress bar for determinate progress
    fn progress_bar(&self, len: u64, message: &str) -> ProgressBar;

    /// Finish a progress operation with a message
    fn finish_progress(&self, pb: ProgressBar, message: &str);
}

/// TTY-aware formatter with colors and progress indicators
pub struct TtyFormatter;

impl OutputFormatter for TtyFormatter {
    fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow().bold(), message);
    }

    fn mark(&self, ok: bool) -> String {
        if ok {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        }
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        spinner
    }

    fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ ");
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb
    }

    fn finish_progress(&self, pb: ProgressBar, message: &str) {
        pb.finish_and_clear();
        println!("{} {}", "✓".green(), message);
    }
}

/// Plain text formatter for non-TTY output (piped, scripted)
pub struct PlainFormatter;

impl OutputFormatter for PlainFormatter {
    fn success(&self, message: &str) {
        println!("✓ {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    fn warning(&self, message: &str) {
        eprintln!("⚠ {}", message);
    }

    fn mark(&self, ok: bool) -> String {
        if ok { "✓" } else { "✗" }.to_string()
    }

    fn spinner(&self, message: &str) -> ProgressBar {
        eprintln!("{}", message);
        ProgressBar::hidden()
    }

    fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        eprintln!("{} (0/{})", message, len);
        ProgressBar::hidden()
    }

    fn finish_progress(&self, pb: ProgressBar, message: &str) {
        pb.finish();
        println!("✓ {}", message);
    }
}

/// Create the formatter for `color`.
///
/// `auto` uses colors when stdout or stderr is a terminal and `NO_COLOR`
/// is unset.
pub fn create_formatter(color: ColorChoice) -> Box<dyn OutputFormatter> {
    match color {
        ColorChoice::Always => Box::new(TtyFormatter),
        ColorChoice::Never => Box::new(PlainFormatter),
        ColorChoice::Auto => {
            if std::env::var("NO_COLOR").is_ok() {
                return Box::new(PlainFormatter);
            }
            if std::io::stdout().is_terminal() || std::io::stderr().is_terminal() {
                Box::new(TtyFormatter)
            } else {
                Box::new(PlainFormatter)
            }
        }
    }
}

/// Print a success message
pub fn success(ctx: &AppContext, message: &str) {
    ctx.formatter().success(message);
}

/// Print an error message
pub fn error(ctx: &AppContext, message: &str) {
    ctx.formatter().error(message);
}

/// Print a warning message
pub fn warning(ctx: &AppContext, message: &str) {
    ctx.formatter().warning(message);
}

/// Trait for types that can be formatted for CLI output
pub trait Formattable: Serialize {
    /// Format the type for pretty (human-readable) output
    fn format_pretty(&self) -> String;
}

/// Format a single item for output
pub fn format_output<T: Formattable>(item: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Pretty => Ok(item.format_pretty()),
        OutputFormat::Json => serde_json::to_string_pretty(item)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
        OutputFormat::Yaml => {
            serde_yaml::to_string(item).map_err(|e| format!("Failed to serialize to YAML: {}", e))
        }
    }
}
