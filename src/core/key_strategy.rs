//! Conversion of caller-facing time values into comparable internal keys.
//!
//! The mapper never inspects time values directly; it asks a
//! [`TimeKeyStrategy`] for the key and orders points by it. Strategies must be
//! pure, deterministic and strictly order-preserving, and must only produce
//! finite keys.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::primitives::{date_to_unix_seconds, datetime_to_unix_seconds};
use crate::core::{TimeKey, TimePoint};
use crate::error::{ChartError, ChartResult};

pub trait TimeKeyStrategy<T> {
    fn to_key(&self, time: &T) -> TimeKey;

    fn to_internal(&self, time: &T) -> TimePoint<T>
    where
        T: Clone,
    {
        TimePoint::new(self.to_key(time), time.clone())
    }

    fn key_order(&self, left: &T, right: &T) -> Ordering {
        self.to_key(left).cmp(&self.to_key(right))
    }
}

/// Unix timestamps in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnixTimestampStrategy;

impl TimeKeyStrategy<i64> for UnixTimestampStrategy {
    fn to_key(&self, time: &i64) -> TimeKey {
        OrderedFloat(*time as f64)
    }
}

/// `chrono` UTC date-times, keyed by fractional unix seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateTimeStrategy;

impl TimeKeyStrategy<DateTime<Utc>> for DateTimeStrategy {
    fn to_key(&self, time: &DateTime<Utc>) -> TimeKey {
        OrderedFloat(datetime_to_unix_seconds(*time))
    }
}

/// Calendar day without a time of day, as used by daily bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BusinessDayParts", into = "BusinessDayParts")]
pub struct BusinessDay(NaiveDate);

#[derive(Serialize, Deserialize)]
struct BusinessDayParts {
    year: i32,
    month: u32,
    day: u32,
}

impl BusinessDay {
    pub fn new(year: i32, month: u32, day: u32) -> ChartResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| {
                ChartError::InvalidData(format!(
                    "business day {year:04}-{month:02}-{day:02} is not a calendar date"
                ))
            })
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    #[must_use]
    pub fn day(self) -> u32 {
        self.0.day()
    }

    #[must_use]
    pub fn date(self) -> NaiveDate {
        self.0
    }
}

impl TryFrom<BusinessDayParts> for BusinessDay {
    type Error = ChartError;

    fn try_from(parts: BusinessDayParts) -> ChartResult<Self> {
        Self::new(parts.year, parts.month, parts.day)
    }
}

impl From<BusinessDay> for BusinessDayParts {
    fn from(day: BusinessDay) -> Self {
        Self {
            year: day.year(),
            month: day.month(),
            day: day.day(),
        }
    }
}

/// Business days keyed by their UTC midnight in unix seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusinessDayStrategy;

impl TimeKeyStrategy<BusinessDay> for BusinessDayStrategy {
    fn to_key(&self, time: &BusinessDay) -> TimeKey {
        OrderedFloat(date_to_unix_seconds(time.date()))
    }
}
