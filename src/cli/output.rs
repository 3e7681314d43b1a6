//! Styled diagnostics for fanscore
//!
//! Stdout carries nothing but results, so every message here goes to stderr.

use console::style;

/// Output handler for consistent CLI formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            eprintln!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a verbose summary line with a highlighted count
    pub fn verbose_summary(&self, icon: &str, message: &str, count: usize) {
        if self.verbose && !self.quiet {
            eprintln!(
                "{} {} {}",
                style(icon).cyan(),
                style(message).dim(),
                style(format!("({count})")).yellow().bold()
            );
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}
