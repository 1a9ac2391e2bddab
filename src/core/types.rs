use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Position in the time-slot sequence. Slots may have no backing point.
pub type LogicalIndex = i64;

/// Totally ordered internal key produced by a key strategy.
pub type TimeKey = OrderedFloat<f64>;

/// Horizontal pixel offset.
pub type Coordinate = f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// A data point's comparable key plus the caller-facing time it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint<T> {
    key: TimeKey,
    original: T,
}

impl<T> TimePoint<T> {
    #[must_use]
    pub fn new(key: TimeKey, original: T) -> Self {
        Self { key, original }
    }

    #[must_use]
    pub fn key(&self) -> TimeKey {
        self.key
    }

    #[must_use]
    pub fn original(&self) -> &T {
        &self.original
    }

    #[must_use]
    pub fn into_original(self) -> T {
        self.original
    }
}

/// Fractional window of the logical index space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    /// Builds a range, rejecting non-finite or inverted bounds.
    pub fn new(from: f64, to: f64) -> ChartResult<Self> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(self) -> ChartResult<()> {
        if !self.from.is_finite() || !self.to.is_finite() || self.from > self.to {
            return Err(ChartError::InvalidRange {
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn left(self) -> f64 {
        self.from
    }

    #[must_use]
    pub fn right(self) -> f64 {
        self.to
    }

    #[must_use]
    pub fn bars_count(self) -> f64 {
        self.to - self.from + 1.0
    }
}

/// Inclusive integral window, `left <= right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StrictRangeBounds", into = "StrictRangeBounds")]
pub struct StrictRange {
    left: LogicalIndex,
    right: LogicalIndex,
}

#[derive(Serialize, Deserialize)]
struct StrictRangeBounds {
    left: LogicalIndex,
    right: LogicalIndex,
}

impl TryFrom<StrictRangeBounds> for StrictRange {
    type Error = ChartError;

    fn try_from(bounds: StrictRangeBounds) -> ChartResult<Self> {
        Self::try_new(bounds.left, bounds.right)
    }
}

impl From<StrictRange> for StrictRangeBounds {
    fn from(range: StrictRange) -> Self {
        Self {
            left: range.left,
            right: range.right,
        }
    }
}

impl StrictRange {
    pub fn try_new(left: LogicalIndex, right: LogicalIndex) -> ChartResult<Self> {
        if left > right {
            return Err(ChartError::InvalidRange {
                from: left as f64,
                to: right as f64,
            });
        }
        Ok(Self { left, right })
    }

    /// Builds a range from bounds in either order.
    #[must_use]
    pub fn spanning(a: LogicalIndex, b: LogicalIndex) -> Self {
        Self {
            left: a.min(b),
            right: a.max(b),
        }
    }

    #[must_use]
    pub fn left(self) -> LogicalIndex {
        self.left
    }

    #[must_use]
    pub fn right(self) -> LogicalIndex {
        self.right
    }

    #[must_use]
    pub fn count(self) -> f64 {
        (self.right - self.left + 1) as f64
    }

    #[must_use]
    pub fn contains(self, index: LogicalIndex) -> bool {
        self.left <= index && index <= self.right
    }

    /// Overlap with `other`, if any.
    #[must_use]
    pub fn intersect(self, other: StrictRange) -> Option<StrictRange> {
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        (left <= right).then_some(StrictRange { left, right })
    }
}

/// Caller-facing equivalent of a logical range.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainRange<T> {
    pub from: T,
    pub to: T,
}

impl<T> DomainRange<T> {
    #[must_use]
    pub fn new(from: T, to: T) -> Self {
        Self { from, to }
    }
}
