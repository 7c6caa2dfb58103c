//! Diagnostics side channel — where the safe entry points report failures.
//!
//! The engine never raises parse or evaluation errors past its top-level
//! entry points; it emits a [`Diagnostic`] to a [`DiagnosticSink`] and keeps
//! going. [`TracingSink`] forwards to `tracing`; [`DiagnosticLog`] keeps the
//! most recent entries in memory for hosts that surface them to users.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Receives diagnostics. Shared across threads evaluating different notes.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!("{}", diagnostic.message),
            Severity::Error => tracing::error!("{}", diagnostic.message),
        }
    }
}

/// A timestamped diagnostic entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub diagnostic: Diagnostic,
}

impl LogEntry {
    /// Time between `start` and this entry; zero if the entry is older.
    pub fn elapsed_since(&self, start: SystemTime) -> Duration {
        self.timestamp.duration_since(start).unwrap_or_default()
    }
}

/// Bounded in-memory buffer of recent diagnostics.
#[derive(Debug)]
pub struct DiagnosticLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl DiagnosticLog {
    /// Create a new log with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Snapshot of the stored diagnostics, oldest first.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().iter().map(|e| e.diagnostic.clone()).collect()
    }

    /// The N most recent entries (newest last).
    pub fn recent(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.lock();
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<LogEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn emit(&self, diagnostic: Diagnostic) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(LogEntry {
            timestamp: SystemTime::now(),
            diagnostic,
        });
    }
}
