//! Logical index table backing the time scale.
//!
//! Slots `0..len` are the ever-seen index space. A slot either holds a
//! [`TimePoint`] or is a gap; present keys strictly increase with the index.

use indexmap::IndexMap;

use crate::core::{LogicalIndex, StrictRange, TimeKey, TimePoint};
use crate::error::{ChartError, ChartResult};

/// Key lookup by logical index, the only view the nearest-index search needs.
pub trait IndexedKeys {
    fn key_at(&self, index: LogicalIndex) -> Option<TimeKey>;

    /// Indices that may hold a key; every index outside reads as absent.
    /// `None` when there are no slots at all.
    fn slot_extent(&self) -> Option<StrictRange>;
}

/// Read-only view of the index table consumed by the coordinate mapper.
pub trait TimePointSource<T>: IndexedKeys {
    fn point_at(&self, index: LogicalIndex) -> Option<&TimePoint<T>>;
    fn index_of_key(&self, key: TimeKey) -> Option<LogicalIndex>;
    fn first_present_index(&self) -> Option<LogicalIndex>;
    fn last_present_index(&self) -> Option<LogicalIndex>;

    /// Present-data bounds, `None` when the table holds no point.
    fn present_range(&self) -> Option<StrictRange> {
        Some(StrictRange::spanning(
            self.first_present_index()?,
            self.last_present_index()?,
        ))
    }
}

#[derive(Debug, Clone)]
pub struct TimePointTable<T> {
    slots: Vec<Option<TimePoint<T>>>,
    index_by_key: IndexMap<TimeKey, LogicalIndex>,
}

impl<T> Default for TimePointTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index_by_key: IndexMap::new(),
        }
    }
}

impl<T> TimePointTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from slots, rejecting non-finite or non-increasing keys.
    pub fn from_slots(slots: Vec<Option<TimePoint<T>>>) -> ChartResult<Self> {
        let mut table = Self::new();
        for slot in slots {
            match slot {
                Some(point) => {
                    table.push(point)?;
                }
                None => {
                    table.push_gap();
                }
            }
        }
        Ok(table)
    }

    pub fn from_points(points: Vec<TimePoint<T>>) -> ChartResult<Self> {
        Self::from_slots(points.into_iter().map(Some).collect())
    }

    /// Number of slots, gaps included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn present_count(&self) -> usize {
        self.index_by_key.len()
    }

    /// `true` when no slot holds a point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index_by_key.is_empty()
    }

    /// Appends a point after the last slot.
    pub fn push(&mut self, point: TimePoint<T>) -> ChartResult<LogicalIndex> {
        let index = self.slots.len() as LogicalIndex;
        self.check_insertable(index, point.key())?;
        self.index_by_key.insert(point.key(), index);
        self.slots.push(Some(point));
        Ok(index)
    }

    /// Appends an empty slot.
    pub fn push_gap(&mut self) -> LogicalIndex {
        self.slots.push(None);
        self.slots.len() as LogicalIndex - 1
    }

    /// Fills an existing gap, keeping keys strictly increasing.
    pub fn insert(&mut self, index: LogicalIndex, point: TimePoint<T>) -> ChartResult<()> {
        let Some(slot_index) = self.slot_index(index) else {
            return Err(ChartError::InvalidData(format!(
                "logical index {index} is outside the table (len {})",
                self.slots.len()
            )));
        };
        if self.slots[slot_index].is_some() {
            return Err(ChartError::InvalidData(format!(
                "logical index {index} already holds a point"
            )));
        }
        self.check_insertable(index, point.key())?;
        self.index_by_key.insert(point.key(), index);
        self.slots[slot_index] = Some(point);
        Ok(())
    }

    /// Turns the slot at `index` into a gap and returns its point.
    pub fn clear(&mut self, index: LogicalIndex) -> Option<TimePoint<T>> {
        let slot_index = self.slot_index(index)?;
        let point = self.slots[slot_index].take()?;
        self.index_by_key.swap_remove(&point.key());
        Some(point)
    }

    /// Present points in index order.
    pub fn iter_present(&self) -> impl Iterator<Item = (LogicalIndex, &TimePoint<T>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|point| (index as LogicalIndex, point)))
    }

    /// First present index inside `range`.
    #[must_use]
    pub fn first_present_in(&self, range: StrictRange) -> Option<LogicalIndex> {
        let upper = range.right().min(self.slots.len() as LogicalIndex - 1);
        (range.left().max(0)..=upper).find(|&index| self.point(index).is_some())
    }

    /// Last present index inside `range`.
    #[must_use]
    pub fn last_present_in(&self, range: StrictRange) -> Option<LogicalIndex> {
        let upper = range.right().min(self.slots.len() as LogicalIndex - 1);
        (range.left().max(0)..=upper)
            .rev()
            .find(|&index| self.point(index).is_some())
    }

    #[must_use]
    pub fn point(&self, index: LogicalIndex) -> Option<&TimePoint<T>> {
        self.slot_index(index)
            .and_then(|slot_index| self.slots[slot_index].as_ref())
    }

    fn slot_index(&self, index: LogicalIndex) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&slot_index| slot_index < self.slots.len())
    }

    fn check_insertable(&self, index: LogicalIndex, key: TimeKey) -> ChartResult<()> {
        if !key.0.is_finite() {
            return Err(ChartError::InvalidData(
                "time point key must be finite".to_owned(),
            ));
        }
        let previous = (0..index).rev().find_map(|i| self.point(i));
        if let Some(previous) = previous
            && previous.key() >= key
        {
            return Err(ChartError::InvalidData(format!(
                "time point key {} at index {index} must be greater than previous key {}",
                key.0,
                previous.key().0
            )));
        }
        let len = self.slots.len() as LogicalIndex;
        let next = (index + 1..len).find_map(|i| self.point(i));
        if let Some(next) = next
            && next.key() <= key
        {
            return Err(ChartError::InvalidData(format!(
                "time point key {} at index {index} must be less than next key {}",
                key.0,
                next.key().0
            )));
        }
        Ok(())
    }
}

impl<T> IndexedKeys for TimePointTable<T> {
    fn key_at(&self, index: LogicalIndex) -> Option<TimeKey> {
        self.point(index).map(TimePoint::key)
    }

    fn slot_extent(&self) -> Option<StrictRange> {
        let last = self.slots.len().checked_sub(1)?;
        Some(StrictRange::spanning(0, last as LogicalIndex))
    }
}

impl<T> TimePointSource<T> for TimePointTable<T> {
    fn point_at(&self, index: LogicalIndex) -> Option<&TimePoint<T>> {
        self.point(index)
    }

    fn index_of_key(&self, key: TimeKey) -> Option<LogicalIndex> {
        self.index_by_key.get(&key).copied()
    }

    fn first_present_index(&self) -> Option<LogicalIndex> {
        self.slots
            .iter()
            .position(Option::is_some)
            .map(|index| index as LogicalIndex)
    }

    fn last_present_index(&self) -> Option<LogicalIndex> {
        self.slots
            .iter()
            .rposition(Option::is_some)
            .map(|index| index as LogicalIndex)
    }
}
