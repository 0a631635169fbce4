//! Value Objects - Immutable domain primitives
//!
//! Capabilities describe which Prometheus API endpoints a backend variant
//! exposes. They are fixed per variant and never inferred from responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Prometheus API feature a backend variant declares support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    /// Instant queries (`/api/v1/query`)
    Query,
    /// Range queries (`/api/v1/query_range`)
    QueryRange,
    /// Label discovery (`/api/v1/labels`)
    Labels,
    /// Prometheus-style JSON flags (`/api/v1/status/flags`)
    Flags,
    /// VictoriaMetrics plaintext flags (`/flags`)
    VmFlags,
}

impl Capability {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::QueryRange => "QUERY_RANGE",
            Self::Labels => "LABELS",
            Self::Flags => "FLAGS",
            Self::VmFlags => "VM_FLAGS",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only set of capabilities backed by a static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilitySet(&'static [Capability]);

impl CapabilitySet {
    pub const PROMETHEUS: CapabilitySet = CapabilitySet(&[
        Capability::Query,
        Capability::QueryRange,
        Capability::Labels,
        Capability::Flags,
    ]);

    pub const QUERY_ONLY: CapabilitySet = CapabilitySet(&[
        Capability::Query,
        Capability::QueryRange,
        Capability::Labels,
    ]);

    pub const VICTORIA_METRICS: CapabilitySet = CapabilitySet(&[
        Capability::Query,
        Capability::QueryRange,
        Capability::Labels,
        Capability::VmFlags,
    ]);

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Diagnostic service targeted by a flags request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagsService {
    Prometheus,
    VictoriaMetrics,
}

impl FlagsService {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prometheus => "Prometheus",
            Self::VictoriaMetrics => "Victoria Metrics",
        }
    }
}

impl fmt::Display for FlagsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
