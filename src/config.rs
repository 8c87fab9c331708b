//! Engine configuration.
//!
//! The horizon, time budget, and base duration table are load-bearing
//! inputs to the constraint model. They are never hidden literals inside
//! the engine: every value flows from a [`SchedulerConfig`].
//!
//! A config can be built in code or loaded from TOML:
//!
//! ```
//! use u_jobshop::config::SchedulerConfig;
//!
//! let config = SchedulerConfig::from_toml_str(r#"
//!     horizon_minutes = 960
//!     time_budget_ms = 5000
//!
//!     [operation_durations]
//!     fallback_minutes = 60
//!     [operation_durations.minutes]
//!     cutting = 40
//! "#).unwrap();
//! assert_eq!(config.horizon_minutes, 960);
//! assert_eq!(config.operation_durations.base_minutes("cutting"), Some(40));
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default planning horizon: one day.
pub const DEFAULT_HORIZON_MINUTES: i64 = 1440;

/// Default wall-clock budget for the search: one minute.
pub const DEFAULT_TIME_BUDGET_MS: u64 = 60_000;

/// Base duration for operation types missing from the table.
pub const DEFAULT_FALLBACK_MINUTES: i64 = 60;

/// Base durations (minutes) per operation type at efficiency 1.0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDurations {
    /// Operation type -> base duration in minutes.
    #[serde(default)]
    pub minutes: BTreeMap<String, i64>,
    /// Duration used for types not in `minutes`. `None` makes unknown
    /// types a configuration error.
    #[serde(default)]
    pub fallback_minutes: Option<i64>,
}

impl OperationDurations {
    /// An empty table with no fallback.
    pub fn empty() -> Self {
        Self {
            minutes: BTreeMap::new(),
            fallback_minutes: None,
        }
    }

    /// Sets the base duration for an operation type.
    pub fn with_duration(mut self, operation: impl Into<String>, minutes: i64) -> Self {
        self.minutes.insert(operation.into(), minutes);
        self
    }

    /// Sets the fallback duration for unlisted types.
    pub fn with_fallback(mut self, minutes: Option<i64>) -> Self {
        self.fallback_minutes = minutes;
        self
    }

    /// Base duration for an operation type, falling back if configured.
    pub fn base_minutes(&self, operation: &str) -> Option<i64> {
        self.minutes
            .get(operation)
            .copied()
            .or(self.fallback_minutes)
    }
}

impl Default for OperationDurations {
    /// The standard shop-floor table.
    fn default() -> Self {
        Self::empty()
            .with_duration("cutting", 45)
            .with_duration("welding", 60)
            .with_duration("assembly", 90)
            .with_duration("painting", 120)
            .with_duration("testing", 30)
            .with_duration("machining", 75)
            .with_duration("heat_treatment", 180)
            .with_duration("quality_check", 25)
            .with_duration("surface_finish", 55)
            .with_fallback(Some(DEFAULT_FALLBACK_MINUTES))
    }
}

/// Configuration for [`ProductionScheduler`](crate::scheduler::ProductionScheduler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on any start/end time (minutes).
    pub horizon_minutes: i64,
    /// Wall-clock search budget (milliseconds).
    pub time_budget_ms: u64,
    /// Base duration table.
    pub operation_durations: OperationDurations,
    /// Optional cap on explored search nodes, for reproducible runs
    /// independent of machine speed.
    pub node_limit: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            horizon_minutes: DEFAULT_HORIZON_MINUTES,
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            operation_durations: OperationDurations::default(),
            node_limit: None,
        }
    }
}

impl SchedulerConfig {
    /// Parses a config from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Sets the planning horizon.
    pub fn with_horizon(mut self, horizon_minutes: i64) -> Self {
        self.horizon_minutes = horizon_minutes;
        self
    }

    /// Sets the time budget, at millisecond resolution.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Replaces the duration table.
    pub fn with_durations(mut self, durations: OperationDurations) -> Self {
        self.operation_durations = durations;
        self
    }

    /// Caps the number of search nodes.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }

    /// The time budget as a [`Duration`].
    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}
