/*!
 * Incident reporting sink.
 *
 * Every non-retryable fault and every quality incident is forwarded to an
 * `IncidentReporter` with a category, a stable code, and free-form context,
 * independent of the caller-visible pipeline result.
 */

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Category of a reported incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentCategory {
    /// Degraded translation quality
    Quality,
    /// Missing or truncated content in the output
    Completeness,
    /// Structural validation findings
    Validation,
    /// Quota ledger faults
    Quota,
    /// Provider-level faults
    Provider,
    /// Schema or config problems that degraded behavior
    Configuration,
}

impl fmt::Display for IncidentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentCategory::Quality => write!(f, "quality"),
            IncidentCategory::Completeness => write!(f, "completeness"),
            IncidentCategory::Validation => write!(f, "validation"),
            IncidentCategory::Quota => write!(f, "quota"),
            IncidentCategory::Provider => write!(f, "provider"),
            IncidentCategory::Configuration => write!(f, "configuration"),
        }
    }
}

/// A single reportable incident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Incident category
    pub category: IncidentCategory,
    /// Stable machine-readable code, e.g. "placeholder_corruption"
    pub code: String,
    /// Human-readable description
    pub message: String,
    /// Free-form context (field path, shop id, locale, ...)
    pub context: String,
}

impl Incident {
    /// Create a new incident
    pub fn new(
        category: IncidentCategory,
        code: impl Into<String>,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
            context: context.into(),
        }
    }
}

/// Sink for audit incidents
///
/// Implementations must be cheap and infallible from the caller's point of
/// view; a reporter that cannot deliver should log and move on.
pub trait IncidentReporter: Send + Sync {
    /// Forward one incident to the sink
    fn report(&self, incident: Incident);
}

/// Reporter that forwards incidents to the log facade
#[derive(Debug, Default)]
pub struct LogReporter;

impl IncidentReporter for LogReporter {
    fn report(&self, incident: Incident) {
        log::warn!(
            "incident [{}/{}]: {} ({})",
            incident.category,
            incident.code,
            incident.message,
            incident.context
        );
    }
}

/// Reporter that collects incidents in memory, for tests and audits
#[derive(Debug, Default)]
pub struct CollectingReporter {
    incidents: Mutex<Vec<Incident>>,
}

impl CollectingReporter {
    /// Create an empty collector behind an Arc for sharing with a pipeline
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of everything reported so far
    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.lock().clone()
    }

    /// Number of incidents recorded
    pub fn len(&self) -> usize {
        self.incidents.lock().len()
    }

    /// Whether nothing has been reported
    pub fn is_empty(&self) -> bool {
        self.incidents.lock().is_empty()
    }

    /// Incidents matching a code
    pub fn with_code(&self, code: &str) -> Vec<Incident> {
        self.incidents
            .lock()
            .iter()
            .filter(|i| i.code == code)
            .cloned()
            .collect()
    }
}

impl IncidentReporter for CollectingReporter {
    fn report(&self, incident: Incident) {
        self.incidents.lock().push(incident);
    }
}
