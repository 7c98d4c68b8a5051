//! Diagnostic reporting for binding generation
//!
//! Generation problems are collected here and mirrored into the `log` facade so
//! that both the host tooling (build scripts, the CLI) and log output see them.

use crate::error::{Diagnostic, DiagnosticCollector, DiagnosticLevel};
use std::sync::{Arc, Mutex};

/// Diagnostic reporter that integrates with the logging system
#[derive(Clone)]
pub struct DiagnosticReporter {
    collector: Arc<Mutex<DiagnosticCollector>>,
    min_level: DiagnosticLevel,
}

impl DiagnosticReporter {
    /// Create a new diagnostic reporter
    pub fn new(min_level: DiagnosticLevel) -> Self {
        Self {
            collector: Arc::new(Mutex::new(DiagnosticCollector::new())),
            min_level,
        }
    }

    /// Report a diagnostic
    pub fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Error => log::error!("{}", diagnostic),
            DiagnosticLevel::Warning => log::warn!("{}", diagnostic),
            DiagnosticLevel::Info => log::info!("{}", diagnostic),
            DiagnosticLevel::Hint => log::debug!("{}", diagnostic),
        }

        if diagnostic.level <= self.min_level {
            if let Ok(mut collector) = self.collector.lock() {
                collector.add(diagnostic);
            }
        }
    }

    /// Report an error
    pub fn error<S: Into<String>>(&self, message: S) {
        self.report(Diagnostic::error(message));
    }

    /// Report a warning
    pub fn warning<S: Into<String>>(&self, message: S) {
        self.report(Diagnostic::warning(message));
    }

    /// Report an info message
    pub fn info<S: Into<String>>(&self, message: S) {
        self.report(Diagnostic::info(message));
    }

    /// Get all collected diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        if let Ok(collector) = self.collector.lock() {
            collector.diagnostics().to_vec()
        } else {
            Vec::new()
        }
    }

    /// Snapshot the collected diagnostics
    pub fn collector(&self) -> DiagnosticCollector {
        if let Ok(collector) = self.collector.lock() {
            collector.clone()
        } else {
            DiagnosticCollector::new()
        }
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        if let Ok(collector) = self.collector.lock() {
            collector.has_errors()
        } else {
            false
        }
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        if let Ok(collector) = self.collector.lock() {
            collector.error_count()
        } else {
            0
        }
    }

    /// Get warning count
    pub fn warning_count(&self) -> usize {
        if let Ok(collector) = self.collector.lock() {
            collector.warning_count()
        } else {
            0
        }
    }

    /// Clear all diagnostics
    pub fn clear(&self) {
        if let Ok(mut collector) = self.collector.lock() {
            collector.clear();
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new(DiagnosticLevel::Info)
    }
}
