use tracing::{debug, trace};

use crate::core::{
    Coordinate, Delegate, DomainRange, IndexedKeys, Listener, LogicalIndex, LogicalRange,
    OwnerToken, SubscriptionId, TimeKey, TimeKeyStrategy, TimePoint, TimePointTable, TimeScale,
    TimeScaleAnimation, TimeScaleOptions, Viewport,
};
use crate::error::{ChartError, ChartResult};

/// Consumer-facing time scale.
///
/// Forwards coordinate queries to the mapper and publishes visible-range and
/// size changes. Each mutation compares the observable state against what was
/// last published and fires a delegate only when its payload changed, once
/// per call.
#[derive(Debug)]
pub struct TimeScaleApi<T, S> {
    time_scale: TimeScale<T, S>,
    viewport: Viewport,
    visible_time_range_changed: Delegate<Option<DomainRange<T>>>,
    visible_logical_range_changed: Delegate<Option<LogicalRange>>,
    size_changed: Delegate<Viewport>,
    published_logical_range: Option<LogicalRange>,
    published_time_keys: Option<(TimeKey, TimeKey)>,
}

impl<T, S> TimeScaleApi<T, S>
where
    T: Clone,
    S: TimeKeyStrategy<T>,
{
    pub fn new(strategy: S, options: TimeScaleOptions) -> ChartResult<Self> {
        Ok(Self::from_time_scale(TimeScale::new(strategy, options)?))
    }

    #[must_use]
    pub fn from_time_scale(time_scale: TimeScale<T, S>) -> Self {
        let published_logical_range = time_scale.visible_logical_range();
        let mut api = Self {
            time_scale,
            viewport: Viewport::new(0, 0),
            visible_time_range_changed: Delegate::new(),
            visible_logical_range_changed: Delegate::new(),
            size_changed: Delegate::new(),
            published_logical_range,
            published_time_keys: None,
        };
        api.published_time_keys = api.visible_time_keys();
        api
    }

    #[must_use]
    pub fn time_scale(&self) -> &TimeScale<T, S> {
        &self.time_scale
    }

    #[must_use]
    pub fn options(&self) -> TimeScaleOptions {
        self.time_scale.options()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.time_scale.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.viewport.height
    }

    #[must_use]
    pub fn time_to_index(&self, time: &T, exact_required: bool) -> Option<LogicalIndex> {
        self.time_scale.time_to_index(time, exact_required)
    }

    #[must_use]
    pub fn index_to_time(&self, index: LogicalIndex) -> Option<&TimePoint<T>> {
        self.time_scale.index_to_time(index)
    }

    #[must_use]
    pub fn time_to_coordinate(&self, time: &T) -> Option<Coordinate> {
        self.time_scale.time_to_coordinate(time)
    }

    #[must_use]
    pub fn time_to_coordinate_rounded(&self, time: &T) -> Option<Coordinate> {
        self.time_scale.time_to_coordinate_rounded(time)
    }

    /// Time of the point under `x`; `None` over a gap or outside the data.
    #[must_use]
    pub fn coordinate_to_time(&self, x: Coordinate) -> Option<&T> {
        let index = self.time_scale.coordinate_to_index(x).ok()?;
        self.time_scale.index_to_time(index).map(TimePoint::original)
    }

    #[must_use]
    pub fn logical_to_coordinate(&self, logical: f64) -> Option<Coordinate> {
        self.time_scale.logical_to_coordinate(logical).ok()
    }

    #[must_use]
    pub fn coordinate_to_logical(&self, x: Coordinate) -> Option<f64> {
        self.time_scale.coordinate_to_float_index(x).ok()
    }

    #[must_use]
    pub fn visible_range(&self) -> Option<DomainRange<T>> {
        self.time_scale.visible_time_range()
    }

    #[must_use]
    pub fn visible_logical_range(&self) -> Option<LogicalRange> {
        self.time_scale.visible_logical_range()
    }

    #[must_use]
    pub fn scroll_position(&self) -> f64 {
        self.time_scale.scroll_position()
    }

    pub fn set_visible_range(&mut self, range: &DomainRange<T>) -> ChartResult<()> {
        self.time_scale.set_visible_range(range)?;
        self.publish_range_changes();
        Ok(())
    }

    pub fn set_visible_logical_range(&mut self, range: LogicalRange) -> ChartResult<()> {
        self.time_scale.set_visible_logical_range(range)?;
        self.publish_range_changes();
        Ok(())
    }

    pub fn fit_content(&mut self) -> ChartResult<()> {
        self.time_scale.fit_content()?;
        self.publish_range_changes();
        Ok(())
    }

    pub fn reset_time_scale(&mut self) -> ChartResult<()> {
        self.time_scale.restore_default()?;
        self.publish_range_changes();
        Ok(())
    }

    pub fn scroll_to_position(
        &mut self,
        position: f64,
        animated: bool,
        now_ms: f64,
    ) -> ChartResult<Option<TimeScaleAnimation>> {
        let animation = self
            .time_scale
            .scroll_to_position(position, animated, now_ms)?;
        self.publish_range_changes();
        Ok(animation)
    }

    pub fn scroll_to_real_time(
        &mut self,
        animated: bool,
        now_ms: f64,
    ) -> ChartResult<Option<TimeScaleAnimation>> {
        let animation = self.time_scale.scroll_to_real_time(animated, now_ms)?;
        self.publish_range_changes();
        Ok(animation)
    }

    pub fn apply_options(&mut self, options: TimeScaleOptions) -> ChartResult<()> {
        self.time_scale.apply_options(options)?;
        self.publish_range_changes();
        Ok(())
    }

    pub fn set_points(&mut self, points: TimePointTable<T>) -> ChartResult<()> {
        self.time_scale.set_points(points)?;
        self.publish_range_changes();
        Ok(())
    }

    pub fn append_time(&mut self, time: &T) -> ChartResult<LogicalIndex> {
        let index = self.time_scale.append_time(time)?;
        self.publish_range_changes();
        Ok(index)
    }

    pub fn append_gap(&mut self) -> LogicalIndex {
        let index = self.time_scale.append_gap();
        self.publish_range_changes();
        index
    }

    /// Fills the gap at `index`; keys must stay increasing.
    pub fn insert_time(&mut self, index: LogicalIndex, time: &T) -> ChartResult<()> {
        self.time_scale.insert_time(index, time)?;
        self.publish_range_changes();
        Ok(())
    }

    pub fn clear_point(&mut self, index: LogicalIndex) -> Option<TimePoint<T>> {
        let removed = self.time_scale.clear_point(index);
        self.publish_range_changes();
        removed
    }

    /// Applies a new pane size. Repeating the current size publishes nothing.
    pub fn set_size(&mut self, viewport: Viewport) -> ChartResult<()> {
        if !viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if viewport == self.viewport {
            return Ok(());
        }
        self.time_scale.set_width(f64::from(viewport.width))?;
        self.viewport = viewport;
        debug!(
            width = viewport.width,
            height = viewport.height,
            "time scale size changed"
        );
        self.size_changed.fire(&viewport);
        self.publish_range_changes();
        Ok(())
    }

    pub fn subscribe_visible_time_range_change(
        &self,
        listener: Listener<Option<DomainRange<T>>>,
        owner: Option<&OwnerToken>,
    ) -> ChartResult<SubscriptionId> {
        self.visible_time_range_changed.subscribe(listener, owner)
    }

    pub fn unsubscribe_visible_time_range_change(
        &self,
        listener: &Listener<Option<DomainRange<T>>>,
    ) -> usize {
        self.visible_time_range_changed.unsubscribe(listener)
    }

    pub fn subscribe_visible_logical_range_change(
        &self,
        listener: Listener<Option<LogicalRange>>,
        owner: Option<&OwnerToken>,
    ) -> ChartResult<SubscriptionId> {
        self.visible_logical_range_changed.subscribe(listener, owner)
    }

    pub fn unsubscribe_visible_logical_range_change(
        &self,
        listener: &Listener<Option<LogicalRange>>,
    ) -> usize {
        self.visible_logical_range_changed.unsubscribe(listener)
    }

    pub fn subscribe_size_change(
        &self,
        listener: Listener<Viewport>,
        owner: Option<&OwnerToken>,
    ) -> ChartResult<SubscriptionId> {
        self.size_changed.subscribe(listener, owner)
    }

    pub fn unsubscribe_size_change(&self, listener: &Listener<Viewport>) -> usize {
        self.size_changed.unsubscribe(listener)
    }

    /// Drops every subscription `owner` made on any of the three channels.
    pub fn unsubscribe_all(&self, owner: &OwnerToken) -> usize {
        self.visible_time_range_changed.unsubscribe_all(owner)
            + self.visible_logical_range_changed.unsubscribe_all(owner)
            + self.size_changed.unsubscribe_all(owner)
    }

    /// Releases all subscriptions; later subscribes fail. Safe to call repeatedly.
    pub fn destroy(&self) {
        self.visible_time_range_changed.destroy();
        self.visible_logical_range_changed.destroy();
        self.size_changed.destroy();
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.size_changed.is_destroyed()
    }

    fn visible_time_keys(&self) -> Option<(TimeKey, TimeKey)> {
        let range = self.time_scale.visible_point_range()?;
        let table = self.time_scale.table();
        Some((table.key_at(range.left())?, table.key_at(range.right())?))
    }

    fn publish_range_changes(&mut self) {
        let logical_range = self.time_scale.visible_logical_range();
        if logical_range != self.published_logical_range {
            self.published_logical_range = logical_range;
            trace!(?logical_range, "visible logical range changed");
            if self.visible_logical_range_changed.has_listeners() {
                self.visible_logical_range_changed.fire(&logical_range);
            }
        }

        let time_keys = self.visible_time_keys();
        if time_keys != self.published_time_keys {
            self.published_time_keys = time_keys;
            if self.visible_time_range_changed.has_listeners() {
                let range = self.time_scale.visible_time_range();
                self.visible_time_range_changed.fire(&range);
            }
        }
    }
}
