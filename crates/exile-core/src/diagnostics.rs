//! Diagnostic sink for navigation failures
//!
//! The core only formats messages; where they end up is up to the host.

use parking_lot::Mutex;
use tracing::debug;

pub trait DiagnosticSink: Send + Sync {
    fn log_debug(&self, message: &str);
}

/// Forwards diagnostics to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log_debug(&self, message: &str) {
        debug!(target: "exile_core::element", "{}", message);
    }
}

/// Keeps every message, for hosts that show them in their own window
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock())
    }
}

impl DiagnosticSink for MemorySink {
    fn log_debug(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
