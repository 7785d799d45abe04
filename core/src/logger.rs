//! Audit log sinks.

use std::fmt;
use std::sync::Arc;

/// Destination for rendered audit lines. Invoked concurrently by every call
/// made through a client, without any locking on the caller's side.
pub trait AuditSink: Send + Sync {
    fn info(&self, line: &str);
    fn error(&self, line: &str);
}

/// Forwards audit lines to `tracing` under the `avatax::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn info(&self, line: &str) {
        tracing::info!(target: "avatax::audit", "{line}");
    }

    fn error(&self, line: &str) {
        tracing::error!(target: "avatax::audit", "{line}");
    }
}

/// Audit logging options.
#[derive(Clone)]
pub struct LogOptions {
    pub enabled: bool,
    /// Custom sink; `TracingSink` when unset.
    pub sink: Option<Arc<dyn AuditSink>>,
}

impl LogOptions {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            sink: None,
        }
    }

    pub fn with_sink(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            enabled: true,
            sink: Some(sink),
        }
    }

    pub(crate) fn resolve(&self) -> Option<Arc<dyn AuditSink>> {
        if !self.enabled {
            return None;
        }
        Some(
            self.sink
                .clone()
                .unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn AuditSink>),
        )
    }
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            sink: None,
        }
    }
}

impl fmt::Debug for LogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogOptions")
            .field("enabled", &self.enabled)
            .field("custom_sink", &self.sink.is_some())
            .finish()
    }
}
