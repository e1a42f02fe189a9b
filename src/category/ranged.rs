//! Ranged (numeric proximity) categories.
//!
//! Values are bucketed into grid cells of width `range / precision`. A query
//! value matches every indexed value whose cell lies within `precision` cells
//! of its own, so results cover at least `range` around the query point.

use serde::{Deserialize, Serialize};

use crate::error::{BurrowError, Result};

fn default_precision() -> u32 {
    1
}

/// Range options of a ranged category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeConfig {
    /// Distance around the query value, in data units.
    pub range: f64,
    /// Cells per range; higher is more precise and does more lookups.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

impl RangeConfig {
    pub fn new(range: f64, precision: u32) -> Self {
        Self { range, precision }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.range.is_finite() || self.range <= 0.0 {
            return Err(BurrowError::invalid_config(format!(
                "range must be a positive number, got {}",
                self.range
            )));
        }
        if self.precision == 0 {
            return Err(BurrowError::invalid_config("range precision must be at least 1"));
        }
        Ok(())
    }

    fn cell_width(&self) -> f64 {
        self.range / f64::from(self.precision)
    }

    /// Grid cell containing `value`, `None` when the cell falls outside the
    /// representable grid.
    pub fn cell_of(&self, value: f64) -> Option<i64> {
        let cell = (value / self.cell_width()).floor();
        // i64::MAX is not exactly representable; 2^63 is the first cell past it
        (cell.is_finite() && cell >= i64::MIN as f64 && cell < -(i64::MIN as f64))
            .then_some(cell as i64)
    }

    fn parse(text: &str) -> Option<f64> {
        text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Index key for a raw value, `None` when it is not a usable number.
    pub fn index_key(&self, text: &str) -> Option<String> {
        Self::parse(text)
            .and_then(|value| self.cell_of(value))
            .map(|cell| cell.to_string())
    }

    /// Keys to look up for a query value, in ascending cell order.
    pub fn query_keys(&self, text: &str) -> Vec<String> {
        let Some(center) = Self::parse(text).and_then(|value| self.cell_of(value)) else {
            return Vec::new();
        };
        let span = i64::from(self.precision);
        (center.saturating_sub(span)..=center.saturating_add(span))
            .map(|cell| cell.to_string())
            .collect()
    }
}
