//! Attribute clipping and rescaling.
//!
//! Raw attributes have heterogeneous, skewed distributions; before distance
//! computation each comparison column is clipped against an outlier cap and
//! rescaled (log / exponential / logistic) to compress the tails and stretch
//! the mid-range where perceptual differences matter. The constants are tuned
//! heuristics carried over from catalog playtesting, kept as configuration
//! rather than hard-coded.

use serde::{Deserialize, Serialize};

use crate::table::{FeatureTable, COMPARE_DIMS};

/// Request-scoped comparison matrix: one 8-wide row per table row.
pub type FeatureMatrix = Vec<[f64; COMPARE_DIMS]>;

/// Clipping caps and rescaling constants for the comparison columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Cap on star_rating before comparison.
    pub star_cap: f64,
    /// Cap on bpm before comparison.
    pub bpm_cap: f64,
    /// Cap on circle_slider_ratio before rescaling.
    pub circle_slider_cap: f64,
    /// Cap on aim_speed_ratio before rescaling.
    pub aim_speed_cap: f64,
    /// Log base for size: log_b(x + 1).
    pub size_log_base: f64,
    /// Exponent base for approach_rate: b^x.
    pub approach_exp_base: f64,
    /// Exponent base for slider_factor: b^x.
    pub slider_exp_base: f64,
    /// Log base for circle_slider_ratio: log_b(x + 1).
    pub circle_slider_log_base: f64,
    /// Logistic steepness for aim_speed_ratio.
    pub aim_speed_steepness: f64,
    /// Logistic midpoint for aim_speed_ratio.
    pub aim_speed_midpoint: f64,
    /// Logistic steepness for speed_object_ratio.
    pub speed_object_steepness: f64,
    /// Logistic midpoint for speed_object_ratio.
    pub speed_object_midpoint: f64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            star_cap: 12.0,
            bpm_cap: 800.0,
            circle_slider_cap: 10.0,
            aim_speed_cap: 2.0,
            size_log_base: 1.3,
            approach_exp_base: 1.2,
            slider_exp_base: 10.0,
            circle_slider_log_base: 1.2,
            aim_speed_steepness: 8.0,
            aim_speed_midpoint: 1.2,
            speed_object_steepness: 10.0,
            speed_object_midpoint: 0.3,
        }
    }
}

impl TransformConfig {
    /// Transform the table into a fresh comparison matrix.
    ///
    /// Pure with respect to the table: the shared rows are only read, and the
    /// returned matrix belongs to the calling request.
    pub fn apply(&self, table: &FeatureTable) -> FeatureMatrix {
        table.rows().iter().map(|row| self.apply_row(&row.comparison())).collect()
    }

    /// Transform a single comparison row.
    pub fn apply_row(&self, raw: &[f64; COMPARE_DIMS]) -> [f64; COMPARE_DIMS] {
        [
            raw[0].min(self.star_cap),
            raw[1].min(self.bpm_cap),
            log_base(raw[2] + 1.0, self.size_log_base),
            self.approach_exp_base.powf(raw[3]),
            self.slider_exp_base.powf(raw[4]),
            log_base(raw[5].min(self.circle_slider_cap) + 1.0, self.circle_slider_log_base),
            logistic(
                raw[6].min(self.aim_speed_cap),
                self.aim_speed_steepness,
                self.aim_speed_midpoint,
            ),
            logistic(raw[7], self.speed_object_steepness, self.speed_object_midpoint),
        ]
    }
}

#[inline]
fn log_base(x: f64, base: f64) -> f64 {
    x.ln() / base.ln()
}

/// Standard logistic with unit ceiling: 1 / (1 + e^(-k(x - x0))).
#[inline]
fn logistic(x: f64, steepness: f64, midpoint: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (x - midpoint)).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn clipping_caps_apply() {
        let cfg = TransformConfig::default();
        let over = cfg.apply_row(&[20.0, 900.0, 4.0, 9.0, 0.9, 50.0, 3.0, 0.4]);
        let at_cap = cfg.apply_row(&[12.0, 800.0, 4.0, 9.0, 0.9, 10.0, 2.0, 0.4]);

        for (a, b) in over.iter().zip(at_cap.iter()) {
            assert!((a - b).abs() < EPS);
        }
    }

    #[test]
    fn rescaling_matches_closed_forms() {
        let cfg = TransformConfig::default();
        let out = cfg.apply_row(&[6.0, 180.0, 4.0, 9.0, 0.9, 2.0, 1.2, 0.3]);

        assert!((out[0] - 6.0).abs() < EPS);
        assert!((out[1] - 180.0).abs() < EPS);
        assert!((out[2] - 5.0_f64.ln() / 1.3_f64.ln()).abs() < EPS);
        assert!((out[3] - 1.2_f64.powf(9.0)).abs() < EPS);
        assert!((out[4] - 10.0_f64.powf(0.9)).abs() < EPS);
        assert!((out[5] - 3.0_f64.ln() / 1.2_f64.ln()).abs() < EPS);
        // Logistic midpoints evaluate to exactly one half.
        assert!((out[6] - 0.5).abs() < EPS);
        assert!((out[7] - 0.5).abs() < EPS);
    }

    #[test]
    fn logistic_saturates_toward_unit_interval() {
        let cfg = TransformConfig::default();
        let low = cfg.apply_row(&[1.0, 60.0, 2.0, 5.0, 0.2, 0.5, 0.0, 0.0]);
        let high = cfg.apply_row(&[1.0, 60.0, 2.0, 5.0, 0.2, 0.5, 2.0, 1.0]);

        assert!(low[6] < 0.01);
        assert!(high[6] > 0.99);
        assert!(low[7] < 0.1);
        assert!(high[7] > 0.99);
    }
}
