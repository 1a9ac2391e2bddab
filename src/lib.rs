//! chart-time-scale: coordinate mapping for interactive chart time axes.
//!
//! The crate maps between caller-facing time values, logical bar indices
//! (which may have gaps) and horizontal pixel coordinates, resolves nearest
//! points when no exact match exists, and publishes visible-range and size
//! changes to subscribers.

pub mod api;
pub mod core;
pub mod error;
pub mod telemetry;

pub use api::TimeScaleApi;
pub use error::{ChartError, ChartResult};
