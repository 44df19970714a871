//! Load-trace records, kept when `trace_loads` is enabled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Origin;

/// One completed component load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadTrace {
    pub at: DateTime<Utc>,
    pub target: String,
    pub origin: Origin,
    /// The component whose dependency list pulled this one in, if any.
    pub required_by: Option<String>,
    pub elapsed_ms: u64,
}

impl LoadTrace {
    pub fn new(
        target: impl Into<String>,
        origin: Origin,
        required_by: Option<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            at: Utc::now(),
            target: target.into(),
            origin,
            required_by,
            elapsed_ms,
        }
    }
}
