use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

/// Time scale configuration.
///
/// Serializable so hosts can persist and reload it; every field falls back to
/// its default when missing from the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeScaleOptions {
    /// Empty bars kept to the right of the last point.
    pub right_offset: f64,
    /// Right margin in pixels; overrides `right_offset` when set.
    pub right_offset_pixels: Option<f64>,
    pub bar_spacing: f64,
    pub min_bar_spacing: f64,
    /// `0.0` means half the scale width.
    pub max_bar_spacing: f64,
    pub fix_left_edge: bool,
    pub fix_right_edge: bool,
    pub lock_visible_time_range_on_resize: bool,
    /// Keep the newest bar in place when a point is appended.
    pub shift_visible_range_on_new_bar: bool,
}

impl Default for TimeScaleOptions {
    fn default() -> Self {
        Self {
            right_offset: 0.0,
            right_offset_pixels: None,
            bar_spacing: 6.0,
            min_bar_spacing: 0.5,
            max_bar_spacing: 0.0,
            fix_left_edge: false,
            fix_right_edge: false,
            lock_visible_time_range_on_resize: false,
            shift_visible_range_on_new_bar: true,
        }
    }
}

impl TimeScaleOptions {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.right_offset.is_finite() {
            return Err(ChartError::InvalidData(
                "time scale right offset must be finite".to_owned(),
            ));
        }
        if let Some(pixels) = self.right_offset_pixels
            && (!pixels.is_finite() || pixels < 0.0)
        {
            return Err(ChartError::InvalidData(
                "time scale right offset pixels must be finite and >= 0".to_owned(),
            ));
        }
        if !self.bar_spacing.is_finite() || self.bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale bar spacing must be finite and > 0".to_owned(),
            ));
        }
        if !self.min_bar_spacing.is_finite() || self.min_bar_spacing <= 0.0 {
            return Err(ChartError::InvalidData(
                "time scale min bar spacing must be finite and > 0".to_owned(),
            ));
        }
        if !self.max_bar_spacing.is_finite() || self.max_bar_spacing < 0.0 {
            return Err(ChartError::InvalidData(
                "time scale max bar spacing must be finite and >= 0".to_owned(),
            ));
        }
        if self.max_bar_spacing > 0.0 && self.max_bar_spacing < self.min_bar_spacing {
            return Err(ChartError::InvalidData(format!(
                "time scale max bar spacing {} is below min bar spacing {}",
                self.max_bar_spacing, self.min_bar_spacing
            )));
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_right_offset(mut self, right_offset: f64) -> Self {
        self.right_offset = right_offset;
        self
    }

    #[must_use]
    pub fn with_right_offset_pixels(mut self, pixels: Option<f64>) -> Self {
        self.right_offset_pixels = pixels;
        self
    }

    #[must_use]
    pub fn with_bar_spacing(mut self, bar_spacing: f64) -> Self {
        self.bar_spacing = bar_spacing;
        self
    }

    /// Sets the allowed bar spacing range; `max == 0.0` keeps the width-based cap.
    #[must_use]
    pub fn with_bar_spacing_limits(mut self, min: f64, max: f64) -> Self {
        self.min_bar_spacing = min;
        self.max_bar_spacing = max;
        self
    }

    #[must_use]
    pub fn with_fixed_edges(mut self, left: bool, right: bool) -> Self {
        self.fix_left_edge = left;
        self.fix_right_edge = right;
        self
    }

    #[must_use]
    pub fn with_lock_visible_time_range_on_resize(mut self, lock: bool) -> Self {
        self.lock_visible_time_range_on_resize = lock;
        self
    }

    #[must_use]
    pub fn with_shift_visible_range_on_new_bar(mut self, shift: bool) -> Self {
        self.shift_visible_range_on_new_bar = shift;
        self
    }

    /// Serializes options to pretty JSON for debug/config files.
    pub fn to_json_pretty(self) -> ChartResult<String> {
        serde_json::to_string_pretty(&self).map_err(|e| {
            ChartError::InvalidData(format!("failed to serialize time scale options: {e}"))
        })
    }

    /// Deserializes and validates options from JSON.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let options: Self = serde_json::from_str(input).map_err(|e| {
            ChartError::InvalidData(format!("failed to parse time scale options: {e}"))
        })?;
        options.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::TimeScaleOptions;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let options =
            TimeScaleOptions::from_json_str(r#"{ "bar_spacing": 12.0, "fix_left_edge": true }"#)
                .expect("parse");
        assert_eq!(options.bar_spacing, 12.0);
        assert!(options.fix_left_edge);
        assert_eq!(options.min_bar_spacing, 0.5);
        assert!(options.shift_visible_range_on_new_bar);
    }

    #[test]
    fn json_round_trip_keeps_every_field() {
        let options = TimeScaleOptions::default()
            .with_right_offset(3.5)
            .with_right_offset_pixels(Some(40.0))
            .with_bar_spacing_limits(1.0, 30.0)
            .with_fixed_edges(true, false);
        let json = options.to_json_pretty().expect("serialize");
        assert_eq!(TimeScaleOptions::from_json_str(&json).expect("parse"), options);
    }

    #[test]
    fn invalid_values_are_rejected_after_parse() {
        assert!(TimeScaleOptions::from_json_str(r#"{ "bar_spacing": 0.0 }"#).is_err());
        assert!(TimeScaleOptions::from_json_str(r#"{ "right_offset_pixels": -1.0 }"#).is_err());
        assert!(
            TimeScaleOptions::from_json_str(r#"{ "min_bar_spacing": 4.0, "max_bar_spacing": 2.0 }"#)
                .is_err()
        );
        assert!(TimeScaleOptions::from_json_str("not json").is_err());
    }
}
