//! Runtime configuration for the resolution engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine settings, typically deserialized from the server's config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Page size applied when a request carries no top.
    pub default_top: usize,
    /// Hard ceiling on the client-requested page size.
    pub max_top: usize,
    /// Whether collections carry a total count when the request leaves the
    /// count flag unset.
    pub default_count: bool,
    /// Response payload budget. Row consumption stops once the materialized
    /// entities exceed this many (estimated) bytes, regardless of top.
    pub max_payload_bytes: usize,
    /// Gate for slow-query telemetry.
    pub log_slow_queries: bool,
    /// Executions at or above this duration are reported.
    pub slow_query_threshold_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_top: 100,
            max_top: 1000,
            default_count: true,
            max_payload_bytes: 25_000_000,
            log_slow_queries: false,
            slow_query_threshold_ms: 200,
        }
    }
}

impl Settings {
    pub fn slow_query_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }
}
