//! CP variable types.

/// An integer variable with a domain [min, max].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntVar {
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether the domain has no values.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Whether a value lies within the domain.
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Domain size (max - min + 1), 0 when empty.
    pub fn domain_size(&self) -> i64 {
        self.max.saturating_sub(self.min).saturating_add(1).max(0)
    }
}

/// Presence literal of an optional interval.
///
/// Literals are numbered densely across the whole model, one per
/// candidate slot, in slot creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PresenceLit(pub usize);

/// An optional fixed-duration interval: `end = start + duration` holds
/// whenever the presence literal is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalVar {
    /// Start time domain.
    pub start: IntVar,
    /// End time domain.
    pub end: IntVar,
    /// Fixed length.
    pub duration: i64,
    /// Presence literal.
    pub presence: PresenceLit,
}

impl IntervalVar {
    /// Creates an optional interval constrained to `[start_min, horizon]`.
    ///
    /// Start is in `[start_min, horizon - duration]` and end in
    /// `[start_min + duration, horizon]`.
    pub fn optional(start_min: i64, horizon: i64, duration: i64, presence: PresenceLit) -> Self {
        Self {
            start: IntVar::new(start_min, horizon.saturating_sub(duration)),
            end: IntVar::new(start_min.saturating_add(duration), horizon),
            duration,
            presence,
        }
    }

    /// Whether any placement satisfies the domains.
    pub fn is_placeable(&self) -> bool {
        !self.start.is_empty() && !self.end.is_empty()
    }
}
