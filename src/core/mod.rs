pub mod animation;
pub mod delegate;
pub mod key_strategy;
pub mod nearest;
pub mod primitives;
pub mod time_points;
pub mod time_scale;
pub mod time_scale_options;
pub mod types;

pub use animation::{SCROLL_ANIMATION_DURATION_MS, TimeScaleAnimation};
pub use delegate::{Delegate, Listener, OwnerToken, SubscriptionId};
pub use key_strategy::{
    BusinessDay, BusinessDayStrategy, DateTimeStrategy, TimeKeyStrategy, UnixTimestampStrategy,
};
pub use nearest::nearest_index;
pub use time_points::{IndexedKeys, TimePointSource, TimePointTable};
pub use time_scale::TimeScale;
pub use time_scale_options::TimeScaleOptions;
pub use types::{
    Coordinate, DomainRange, LogicalIndex, LogicalRange, StrictRange, TimeKey, TimePoint, Viewport,
};
