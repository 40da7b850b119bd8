use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity ranking used for both admission and point tagging.
/// Ordering is total: Trace < Debug < Info < Warn < Error < Fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable labels attached to a subscriber at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bindings {
    /// Node identifier of the emitting process
    pub node_id: String,

    /// Deployment namespace
    pub namespace: String,

    /// Service name, absent for broker-level log sources
    pub service: Option<String>,

    /// Service version
    pub version: Option<String>,

    /// Module/category name, used for level resolution
    pub module: String,
}

/// One log observation. The timestamp is captured when the record is
/// admitted into the queue, so batch ordering reflects emission order
/// rather than flush order.
#[derive(Debug, Clone)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    pub message: String,
    pub bindings: Bindings,
}

impl Record {
    pub fn new(bindings: Bindings, level: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            bindings,
        }
    }
}
