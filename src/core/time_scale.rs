//! Coordinate mapper between domain time values, logical indices and pixels.
//!
//! Bars are laid out right-to-left from the base index (the last present
//! point) shifted by `right_offset` bars; bar `i` is centred at
//! `width - (base + right_offset - i + 0.5) * bar_spacing - 1`.
//! Nothing derived from the point table is cached: the visible range and the
//! nearest-match bounds are recomputed on every query.

use tracing::debug;

use crate::core::{
    Coordinate, DomainRange, LogicalIndex, LogicalRange, StrictRange, TimeKey, TimeKeyStrategy,
    TimePoint, TimePointSource, TimePointTable, TimeScaleAnimation, TimeScaleOptions,
    nearest_index,
};
use crate::error::{ChartError, ChartResult};

const MIN_VISIBLE_BARS_COUNT: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct TimeScale<T, S> {
    options: TimeScaleOptions,
    strategy: S,
    points: TimePointTable<T>,
    width: f64,
    bar_spacing: f64,
    right_offset: f64,
}

impl<T, S> TimeScale<T, S>
where
    S: TimeKeyStrategy<T>,
{
    pub fn new(strategy: S, options: TimeScaleOptions) -> ChartResult<Self> {
        let options = options.validate()?;
        Ok(Self {
            strategy,
            points: TimePointTable::new(),
            width: 0.0,
            bar_spacing: options.bar_spacing,
            right_offset: options.right_offset,
            options,
        })
    }

    #[must_use]
    pub fn options(&self) -> TimeScaleOptions {
        self.options
    }

    pub fn apply_options(&mut self, options: TimeScaleOptions) -> ChartResult<()> {
        self.options = options.validate()?;
        if self.options.fix_left_edge {
            self.do_fix_left_edge()?;
        }
        if self.options.fix_right_edge {
            self.correct_offset();
            self.correct_bar_spacing();
        }
        self.set_bar_spacing(self.options.bar_spacing)?;
        self.set_right_offset(self.default_right_offset())
    }

    #[must_use]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Internal key of `time` under this scale's strategy.
    #[must_use]
    pub fn key_of(&self, time: &T) -> TimeKey {
        self.strategy.to_key(time)
    }

    #[must_use]
    pub fn table(&self) -> &TimePointTable<T> {
        &self.points
    }

    /// Replaces the whole point table.
    pub fn set_points(&mut self, points: TimePointTable<T>) -> ChartResult<()> {
        self.points = points;
        self.correct_offset();
        self.do_fix_left_edge()
    }

    /// Appends a point for `time` after the last slot.
    pub fn append_time(&mut self, time: &T) -> ChartResult<LogicalIndex>
    where
        T: Clone,
    {
        let previous_base = self.points.last_present_index();
        let index = self.points.push(self.strategy.to_internal(time))?;
        if !self.options.shift_visible_range_on_new_bar
            && let Some(previous_base) = previous_base
        {
            self.right_offset -= (index - previous_base) as f64;
        }
        self.correct_offset();
        Ok(index)
    }

    /// Appends an empty slot.
    pub fn append_gap(&mut self) -> LogicalIndex {
        self.points.push_gap()
    }

    /// Fills the gap at `index` with a point for `time`.
    pub fn insert_time(&mut self, index: LogicalIndex, time: &T) -> ChartResult<()>
    where
        T: Clone,
    {
        self.points.insert(index, self.strategy.to_internal(time))?;
        self.correct_offset();
        Ok(())
    }

    /// Turns the slot at `index` into a gap.
    pub fn clear_point(&mut self, index: LogicalIndex) -> Option<TimePoint<T>> {
        let removed = self.points.clear(index)?;
        self.correct_offset();
        Some(removed)
    }

    pub fn set_width(&mut self, new_width: f64) -> ChartResult<()> {
        if !new_width.is_finite() || new_width <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale width must be finite and > 0".to_owned(),
            ));
        }
        if (self.width - new_width).abs() <= f64::EPSILON {
            return Ok(());
        }

        let previous_visible_range = self.visible_logical_range();
        let old_width = self.width;
        self.width = new_width;

        if self.options.lock_visible_time_range_on_resize && old_width > 0.0 {
            self.bar_spacing = self.bar_spacing * new_width / old_width;
        }

        if self.options.fix_left_edge
            && let Some(range) = previous_visible_range
            && range.left() <= 0.0
        {
            let delta = old_width - new_width;
            self.right_offset -= (delta / self.bar_spacing).round() + 1.0;
        }

        self.correct_bar_spacing();
        self.correct_offset();
        debug!(
            old_width,
            new_width,
            bar_spacing = self.bar_spacing,
            "time scale resized"
        );
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// `true` until the scale has both a width and at least one point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.points.is_empty()
    }

    #[must_use]
    pub fn base_index(&self) -> LogicalIndex {
        self.points.last_present_index().unwrap_or(0)
    }

    #[must_use]
    pub fn right_offset(&self) -> f64 {
        self.right_offset
    }

    pub fn set_right_offset(&mut self, offset: f64) -> ChartResult<()> {
        if !offset.is_finite() {
            return Err(ChartError::InvalidData(
                "time scale right offset must be finite".to_owned(),
            ));
        }
        self.right_offset = offset;
        self.correct_offset();
        Ok(())
    }

    #[must_use]
    pub fn bar_spacing(&self) -> f64 {
        self.bar_spacing
    }

    pub fn set_bar_spacing(&mut self, new_bar_spacing: f64) -> ChartResult<()> {
        if !new_bar_spacing.is_finite() || new_bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale bar spacing must be finite and > 0".to_owned(),
            ));
        }
        let old_bar_spacing = self.bar_spacing;
        self.bar_spacing = new_bar_spacing;
        self.correct_bar_spacing();

        if self.options.right_offset_pixels.is_some() && old_bar_spacing > 0.0 {
            self.right_offset = self.right_offset * old_bar_spacing / self.bar_spacing;
        }

        self.correct_offset();
        Ok(())
    }

    /// Returns spacing and offset to their configured defaults.
    pub fn restore_default(&mut self) -> ChartResult<()> {
        self.set_bar_spacing(self.options.bar_spacing)?;
        self.set_right_offset(self.default_right_offset())
    }

    /// Pixel centre of `index`. Errors with [`ChartError::EmptyScale`] without data.
    pub fn index_to_coordinate(&self, index: LogicalIndex) -> ChartResult<Coordinate> {
        self.logical_to_coordinate(index as f64)
    }

    /// Pixel position of a fractional logical index.
    pub fn logical_to_coordinate(&self, logical: f64) -> ChartResult<Coordinate> {
        if self.points.is_empty() {
            return Err(ChartError::EmptyScale);
        }
        if !logical.is_finite() {
            return Err(ChartError::InvalidData(
                "logical index must be finite".to_owned(),
            ));
        }
        let delta_from_right = self.base_index() as f64 + self.right_offset - logical;
        Ok((self.width - (delta_from_right + 0.5) * self.bar_spacing - 1.0) as Coordinate)
    }

    /// Slot under pixel `x`; extrapolates outside the data.
    pub fn coordinate_to_index(&self, x: Coordinate) -> ChartResult<LogicalIndex> {
        Ok(self.coordinate_to_float_index(x)?.ceil() as LogicalIndex)
    }

    pub fn coordinate_to_float_index(&self, x: Coordinate) -> ChartResult<f64> {
        if !x.is_finite() {
            return Err(ChartError::InvalidData(
                "coordinate must be finite".to_owned(),
            ));
        }
        let delta_from_right = (self.width - 1.0 - f64::from(x)) / self.bar_spacing;
        let index = self.base_index() as f64 + self.right_offset - delta_from_right;
        Ok((index * 1_000_000.0).round() / 1_000_000.0)
    }

    /// Index of the point keyed like `time`.
    ///
    /// With `exact_required == false` a missing key falls back to the nearest
    /// present point over the whole table.
    #[must_use]
    pub fn time_to_index(&self, time: &T, exact_required: bool) -> Option<LogicalIndex> {
        let key = self.strategy.to_key(time);
        if let Some(index) = self.points.index_of_key(key) {
            return Some(index);
        }
        if exact_required {
            return None;
        }
        nearest_index(&self.points, key, self.points.present_range())
    }

    #[must_use]
    pub fn index_to_time(&self, index: LogicalIndex) -> Option<&TimePoint<T>> {
        self.points.point_at(index)
    }

    /// Coordinate of the point keyed exactly like `time`.
    #[must_use]
    pub fn time_to_coordinate(&self, time: &T) -> Option<Coordinate> {
        let index = self.time_to_index(time, true)?;
        self.index_to_coordinate(index).ok()
    }

    /// Coordinate of the point nearest to `time`.
    ///
    /// The search is bounded by the visible strict range first and widened to
    /// the whole table when nothing visible qualifies.
    #[must_use]
    pub fn time_to_coordinate_rounded(&self, time: &T) -> Option<Coordinate> {
        let key = self.strategy.to_key(time);
        let index = self
            .points
            .index_of_key(key)
            .or_else(|| nearest_index(&self.points, key, self.nearest_search_bounds()))
            .or_else(|| nearest_index(&self.points, key, self.points.present_range()))?;
        self.index_to_coordinate(index).ok()
    }

    #[must_use]
    pub fn visible_logical_range(&self) -> Option<LogicalRange> {
        if self.is_empty() {
            return None;
        }
        let bars_length = self.width / self.bar_spacing;
        let right_border = self.right_offset + self.base_index() as f64;
        let left_border = right_border - bars_length + 1.0;
        Some(LogicalRange {
            from: left_border,
            to: right_border,
        })
    }

    #[must_use]
    pub fn visible_strict_range(&self) -> Option<StrictRange> {
        self.visible_logical_range().map(|range| {
            StrictRange::spanning(
                range.left().floor() as LogicalIndex,
                range.right().ceil() as LogicalIndex,
            )
        })
    }

    /// First and last present indices inside the visible strict range.
    #[must_use]
    pub fn visible_point_range(&self) -> Option<StrictRange> {
        let window = self.nearest_search_bounds()?;
        Some(StrictRange::spanning(
            self.points.first_present_in(window)?,
            self.points.last_present_in(window)?,
        ))
    }

    #[must_use]
    pub fn visible_time_range(&self) -> Option<DomainRange<T>>
    where
        T: Clone,
    {
        let range = self.visible_point_range()?;
        Some(DomainRange::new(
            self.points.point_at(range.left())?.original().clone(),
            self.points.point_at(range.right())?.original().clone(),
        ))
    }

    /// Shows `range`. Inverted or non-finite bounds are rejected before any change.
    pub fn set_visible_logical_range(&mut self, range: LogicalRange) -> ChartResult<()> {
        range.validate()?;
        if self.width <= 0.0 {
            return Err(ChartError::InvalidData(
                "cannot set visible range before width".to_owned(),
            ));
        }
        self.set_bar_spacing(self.width / range.bars_count())?;
        self.right_offset = range.right() - self.base_index() as f64;
        self.correct_offset();
        debug!(
            from = range.from,
            to = range.to,
            bar_spacing = self.bar_spacing,
            right_offset = self.right_offset,
            "visible logical range applied"
        );
        Ok(())
    }

    /// Shows the points nearest to `range.from` and `range.to`.
    pub fn set_visible_range(&mut self, range: &DomainRange<T>) -> ChartResult<()> {
        let from_key = self.strategy.to_key(&range.from);
        let to_key = self.strategy.to_key(&range.to);
        if from_key > to_key {
            return Err(ChartError::InvalidRange {
                from: from_key.0,
                to: to_key.0,
            });
        }
        let from = self
            .time_to_index(&range.from, false)
            .ok_or(ChartError::EmptyScale)?;
        let to = self
            .time_to_index(&range.to, false)
            .ok_or(ChartError::EmptyScale)?;
        self.set_visible_logical_range(LogicalRange {
            from: from as f64,
            to: to as f64,
        })
    }

    /// Fits every present point into the width, keeping the default right offset.
    pub fn fit_content(&mut self) -> ChartResult<()> {
        let Some(data) = self.points.present_range() else {
            return Ok(());
        };
        if self.width <= 0.0 {
            return Err(ChartError::InvalidData(
                "cannot fit content before width".to_owned(),
            ));
        }
        let right_offset_bars = if self.options.right_offset_pixels.is_none() {
            self.options.right_offset
        } else {
            0.0
        };
        let pixel_offset = self.options.right_offset_pixels.unwrap_or(0.0);
        let length = data.count() + right_offset_bars;
        self.set_bar_spacing((self.width - pixel_offset) / length)?;
        self.right_offset = self.default_right_offset();
        self.correct_offset();
        debug!(
            first = data.left(),
            last = data.right(),
            bar_spacing = self.bar_spacing,
            "time scale fitted to content"
        );
        Ok(())
    }

    /// Distance in bars between the last point and the right edge.
    #[must_use]
    pub fn scroll_position(&self) -> f64 {
        self.right_offset
    }

    /// Scrolls so the last point sits `position` bars from the right edge.
    ///
    /// Without animation the offset applies immediately. With animation the
    /// scale is left untouched and the returned target goes to the animator,
    /// which drives the scroll with non-animated calls.
    pub fn scroll_to_position(
        &mut self,
        position: f64,
        animated: bool,
        now_ms: f64,
    ) -> ChartResult<Option<TimeScaleAnimation>> {
        if !position.is_finite() {
            return Err(ChartError::InvalidData(
                "scroll position must be finite".to_owned(),
            ));
        }
        if !animated {
            self.set_right_offset(position)?;
            return Ok(None);
        }
        Ok(Some(TimeScaleAnimation::scroll(
            self.right_offset,
            self.corrected_right_offset(position),
            now_ms,
        )))
    }

    /// Scrolls back to the default right offset.
    pub fn scroll_to_real_time(
        &mut self,
        animated: bool,
        now_ms: f64,
    ) -> ChartResult<Option<TimeScaleAnimation>> {
        self.scroll_to_position(self.default_right_offset(), animated, now_ms)
    }

    fn nearest_search_bounds(&self) -> Option<StrictRange> {
        self.visible_strict_range()?
            .intersect(self.points.present_range()?)
    }

    fn default_right_offset(&self) -> f64 {
        match self.options.right_offset_pixels {
            Some(pixels) => pixels / self.bar_spacing,
            None => self.options.right_offset,
        }
    }

    fn correct_bar_spacing(&mut self) {
        let min = self.min_bar_spacing();
        let max = self.max_bar_spacing().max(min);
        self.bar_spacing = self.bar_spacing.clamp(min, max);
    }

    fn min_bar_spacing(&self) -> f64 {
        if self.options.fix_left_edge
            && self.options.fix_right_edge
            && let Some(data) = self.points.present_range()
        {
            return self.width / data.count();
        }
        self.options.min_bar_spacing
    }

    fn max_bar_spacing(&self) -> f64 {
        if self.options.max_bar_spacing > 0.0 {
            self.options.max_bar_spacing
        } else {
            self.width * 0.5
        }
    }

    fn visible_bars_floor(&self) -> f64 {
        MIN_VISIBLE_BARS_COUNT.min(self.points.present_count() as f64)
    }

    fn min_right_offset(&self) -> Option<f64> {
        let first = self.points.first_present_index()?;
        let base = self.points.last_present_index()?;
        let bars_estimation = if self.options.fix_left_edge {
            self.width / self.bar_spacing
        } else {
            self.visible_bars_floor()
        };
        Some(first as f64 - base as f64 - 1.0 + bars_estimation)
    }

    fn max_right_offset(&self) -> f64 {
        if self.options.fix_right_edge {
            0.0
        } else {
            self.width / self.bar_spacing - self.visible_bars_floor()
        }
    }

    fn corrected_right_offset(&self, offset: f64) -> f64 {
        let mut corrected = offset;
        if let Some(min_right_offset) = self.min_right_offset()
            && corrected < min_right_offset
        {
            corrected = min_right_offset;
        }
        let max_right_offset = self.max_right_offset();
        if corrected > max_right_offset {
            corrected = max_right_offset;
        }
        corrected
    }

    fn correct_offset(&mut self) {
        if self.width <= 0.0 {
            return;
        }
        self.right_offset = self.corrected_right_offset(self.right_offset);
    }

    fn do_fix_left_edge(&mut self) -> ChartResult<()> {
        if !self.options.fix_left_edge {
            return Ok(());
        }
        let Some(first) = self.points.first_present_index() else {
            return Ok(());
        };
        let Some(visible) = self.visible_strict_range() else {
            return Ok(());
        };
        let delta = visible.left() - first;
        if delta < 0 {
            let left_edge_offset = self.right_offset - delta as f64 - 1.0;
            self.set_right_offset(left_edge_offset)?;
        }
        self.correct_bar_spacing();
        Ok(())
    }
}
