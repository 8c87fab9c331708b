//! Machine model.
//!
//! Machines are unary resources: each processes at most one operation at
//! a time. A machine can only run operation types listed in its
//! capabilities, and its efficiency factor divides the base duration.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

/// A capability-limited machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Unique machine identifier.
    pub id: String,
    /// Operation types this machine can perform.
    pub capabilities: Vec<String>,
    /// Work rate divisor (1.0 = nominal, >1.0 = faster, <1.0 = slower).
    #[serde(default = "default_efficiency")]
    pub efficiency_factor: f64,
}

fn default_efficiency() -> f64 {
    1.0
}

impl Machine {
    /// Creates a machine with no capabilities and nominal efficiency.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            capabilities: Vec::new(),
            efficiency_factor: default_efficiency(),
        }
    }

    /// Adds a capability.
    pub fn with_capability(mut self, operation: impl Into<String>) -> Self {
        let operation = operation.into();
        if !self.capabilities.contains(&operation) {
            self.capabilities.push(operation);
        }
        self
    }

    /// Adds several capabilities.
    pub fn with_capabilities<I, S>(self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        operations
            .into_iter()
            .fold(self, |machine, op| machine.with_capability(op))
    }

    /// Sets the efficiency factor.
    pub fn with_efficiency(mut self, efficiency_factor: f64) -> Self {
        self.efficiency_factor = efficiency_factor;
        self
    }

    /// Whether this machine can perform the given operation type.
    pub fn can_perform(&self, operation: &str) -> bool {
        self.capabilities.iter().any(|c| c == operation)
    }

    /// Whether the efficiency factor is usable as a duration divisor.
    pub fn has_valid_efficiency(&self) -> bool {
        self.efficiency_factor.is_finite() && self.efficiency_factor > 0.0
    }

    /// Processing time on this machine: `floor(base / efficiency_factor)`.
    ///
    /// Callers must check [`has_valid_efficiency`](Self::has_valid_efficiency)
    /// first; the model builder rejects machines that fail it.
    pub fn processing_minutes(&self, base_minutes: i64) -> i64 {
        (base_minutes as f64 / self.efficiency_factor).floor() as i64
    }
}
