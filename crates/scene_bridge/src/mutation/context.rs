use std::collections::VecDeque;

use serde::Serialize;
use tracing::{info, warn};

use super::history::HistoryRecorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

pub trait DiagnosticSink {
    fn record(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn record(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Keeps the most recent `capacity` diagnostics and counts the ones it
/// evicts.
#[derive(Debug, Clone)]
pub struct DiagnosticLog {
    entries: VecDeque<Diagnostic>,
    capacity: usize,
    dropped: usize,
}

impl DiagnosticLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Takes every kept entry. When entries were evicted since the last
    /// drain, a trailing warning reports how many.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        let mut drained = self.entries.drain(..).collect::<Vec<_>>();
        if self.dropped > 0 {
            drained.push(Diagnostic {
                severity: Severity::Warning,
                field: None,
                message: format!("{} earlier diagnostics dropped", self.dropped),
            });
            self.dropped = 0;
        }
        drained
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn record(&mut self, diagnostic: Diagnostic) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(diagnostic);
    }
}

/// Per-call collaborators for the mutation pipeline. Built by the caller and
/// passed down explicitly; nothing in the pipeline keeps global state.
pub struct MutationContext<'a> {
    diagnostics: &'a mut dyn DiagnosticSink,
    history: Option<&'a mut dyn HistoryRecorder>,
}

impl<'a> MutationContext<'a> {
    pub fn new(diagnostics: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            diagnostics,
            history: None,
        }
    }

    pub fn with_history(mut self, history: &'a mut dyn HistoryRecorder) -> Self {
        self.history = Some(history);
        self
    }

    pub fn history_mut(&mut self) -> Option<&mut (dyn HistoryRecorder + 'a)> {
        self.history.as_deref_mut()
    }

    pub fn warn(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(field, message = %message, "mutation_warning");
        self.diagnostics.record(Diagnostic {
            severity: Severity::Warning,
            field: Some(field.to_string()),
            message,
        });
    }

    pub fn info(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        info!(field, message = %message, "mutation_notice");
        self.diagnostics.record(Diagnostic {
            severity: Severity::Info,
            field: Some(field.to_string()),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning(message: &str) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            field: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn log_evicts_oldest_past_capacity() {
        let mut log = DiagnosticLog::with_capacity(2);
        log.record(warning("a"));
        log.record(warning("b"));
        log.record(warning("c"));
        let messages = log
            .entries()
            .map(|entry| entry.message.as_str())
            .collect::<Vec<_>>();
        assert_eq!(messages, vec!["b", "c"]);
        assert_eq!(log.dropped(), 1);

        let drained = log.drain();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[2].message, "1 earlier diagnostics dropped");
        assert!(log.is_empty());
        assert_eq!(log.dropped(), 0);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn zero_capacity_log_drops_everything_but_reports_it() {
        let mut log = DiagnosticLog::with_capacity(0);
        log.record(warning("a"));
        log.record(warning("b"));
        assert_eq!(log.len(), 0);
        let drained = log.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message, "2 earlier diagnostics dropped");
    }

    #[test]
    fn context_tags_diagnostics_with_field_and_severity() {
        let mut sink: Vec<Diagnostic> = Vec::new();
        let mut ctx = MutationContext::new(&mut sink);
        ctx.warn("position", "fell back to zero");
        ctx.info("freezeposition", "mapped to freezeRotation");
        assert!(ctx.history_mut().is_none());
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[0].severity, Severity::Warning);
        assert_eq!(sink[1].field.as_deref(), Some("freezeposition"));
    }
}
