//! Consumer-facing layer over the core mapper and delegates.

mod time_scale_api;

pub use time_scale_api::TimeScaleApi;
