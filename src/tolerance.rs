//! Tolerance windows and the deviation-to-score conversion shared by the
//! matcher and the annotation summary.
use std::fmt::Display;

use mzpeaks::Tolerance;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::utils::ppm_error;

/// A closed interval `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToleranceWindow {
    pub low: f64,
    pub high: f64,
}

impl ToleranceWindow {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn around(center: f64, half_width: f64) -> Self {
        let half_width = half_width.abs();
        Self::new(center - half_width, center + half_width)
    }

    pub fn center(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn half_width(&self) -> f64 {
        (self.high - self.low) / 2.0
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

impl Display for ToleranceWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.5}, {:.5}]", self.low, self.high)
    }
}

#[inline]
pub fn within_absolute_tolerance(observed: f64, expected: f64, window: f64) -> bool {
    (observed - expected).abs() <= window.abs()
}

/// `fraction` is a proportion of `expected`, `0.1` meaning 10%
#[inline]
pub fn within_percent_tolerance(observed: f64, expected: f64, fraction: f64) -> bool {
    (observed - expected).abs() <= (expected * fraction).abs()
}

#[inline]
pub fn within_ppm_tolerance(observed: f64, expected: f64, ppm: f64) -> bool {
    (observed - expected).abs() <= (expected * ppm * 1e-6).abs()
}

/// Convert a deviation into a similarity in `[0, 1]`, where a deviation of zero scores 1
/// and any deviation at or beyond `max_deviation` scores 0.
///
/// The deviation may be an absolute difference or a relative one, the formula is the same.
/// `NaN` inputs and a non-positive `max_deviation` score 0.
pub fn score_from_deviation(deviation: f64, max_deviation: f64) -> f64 {
    if deviation.is_nan() || max_deviation.is_nan() || max_deviation <= 0.0 {
        return 0.0;
    }
    (1.0 - deviation.abs().min(max_deviation) / max_deviation).clamp(0.0, 1.0)
}

#[inline]
pub fn score_from_values(actual: f64, predicted: f64, max_deviation: f64) -> f64 {
    score_from_deviation(actual - predicted, max_deviation)
}

/// How close `value` lies to the center of `window`, 1 at the center falling to 0 at either edge
pub fn center_score(value: f64, window: &ToleranceWindow) -> f64 {
    let half = window.half_width();
    if half <= 0.0 {
        return if value == window.center() { 1.0 } else { 0.0 };
    }
    (1.0 - (value - window.center()).abs() / half).clamp(0.0, 1.0)
}

/// A weighted mean of scores
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreAccumulator {
    sum: f64,
    weights: f64,
}

impl ScoreAccumulator {
    pub fn add(&mut self, score: f64, weight: f64) {
        self.sum += score * weight;
        self.weights += weight;
    }

    pub fn is_empty(&self) -> bool {
        self.weights == 0.0
    }

    pub fn score(&self) -> f64 {
        if self.weights == 0.0 {
            0.0
        } else {
            self.sum / self.weights
        }
    }
}

/// An m/z tolerance given as both an absolute and a relative error, the wider
/// of the two applies at any given m/z.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MzTolerance {
    pub absolute: f64,
    pub ppm: f64,
}

impl Default for MzTolerance {
    fn default() -> Self {
        Self {
            absolute: 0.005,
            ppm: 15.0,
        }
    }
}

impl MzTolerance {
    pub fn new(absolute: f64, ppm: f64) -> Self {
        Self { absolute, ppm }
    }

    pub fn ppm(ppm: f64) -> Self {
        Self::new(0.0, ppm)
    }

    pub fn max_diff(&self, mz: f64) -> f64 {
        self.absolute.max(mz.abs() * self.ppm * 1e-6)
    }

    pub fn window(&self, mz: f64) -> ToleranceWindow {
        ToleranceWindow::around(mz, self.max_diff(mz))
    }

    pub fn contains(&self, expected: f64, observed: f64) -> bool {
        within_absolute_tolerance(observed, expected, self.max_diff(expected))
    }

    /// The equivalent peak search tolerance at `mz`
    pub fn to_peak_tolerance(&self, mz: f64) -> Tolerance {
        Tolerance::Da(self.max_diff(mz))
    }
}

impl Display for MzTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} m/z or {} ppm", self.absolute, self.ppm)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RtTolerance {
    /// A fixed width in minutes
    Absolute(f32),
    /// A percentage of the retention time
    Relative(f32),
}

impl Default for RtTolerance {
    fn default() -> Self {
        Self::Absolute(0.3)
    }
}

impl RtTolerance {
    pub fn max_diff(&self, rt: f32) -> f32 {
        match self {
            Self::Absolute(w) => w.abs(),
            Self::Relative(pct) => (rt * pct / 100.0).abs(),
        }
    }

    pub fn window(&self, rt: f32) -> ToleranceWindow {
        ToleranceWindow::around(rt as f64, self.max_diff(rt) as f64)
    }

    pub fn contains(&self, expected: f32, observed: f32) -> bool {
        within_absolute_tolerance(observed as f64, expected as f64, self.max_diff(expected) as f64)
    }
}

/// An absolute ion mobility tolerance in the mobility unit of the data
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MobilityTolerance(pub f32);

impl MobilityTolerance {
    pub fn window(&self, mobility: f32) -> ToleranceWindow {
        ToleranceWindow::around(mobility as f64, self.0 as f64)
    }

    pub fn contains(&self, expected: f32, observed: f32) -> bool {
        within_absolute_tolerance(observed as f64, expected as f64, self.0 as f64)
    }
}

/// A relative tolerance given as a fraction, `0.01` being 1%
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PercentTolerance(pub f64);

impl PercentTolerance {
    pub fn window(&self, value: f64) -> ToleranceWindow {
        ToleranceWindow::around(value, value * self.0)
    }

    pub fn contains(&self, expected: f64, observed: f64) -> bool {
        within_percent_tolerance(observed, expected, self.0)
    }
}

/// The deviations at which each dimension's score reaches zero
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoreBounds {
    pub max_ppm: f64,
    /// Absolute, in minutes
    pub max_rt: f64,
    /// Relative, `(measured - expected) / expected`
    pub max_ccs: f64,
    /// Relative, `(measured - expected) / expected`
    pub max_ri: f64,
    /// Used to pair isotope peaks when comparing patterns
    pub isotope_tolerance: MzTolerance,
}

impl Default for ScoreBounds {
    fn default() -> Self {
        Self {
            max_ppm: 15.0,
            max_rt: 0.3,
            max_ccs: 0.10,
            max_ri: 0.10,
            isotope_tolerance: MzTolerance::new(0.005, 15.0),
        }
    }
}

impl ScoreBounds {
    pub fn with_max_ppm(mut self, max_ppm: f64) -> Self {
        self.max_ppm = max_ppm;
        self
    }

    pub fn with_max_rt(mut self, max_rt: f64) -> Self {
        self.max_rt = max_rt;
        self
    }

    pub fn with_max_ccs(mut self, max_ccs: f64) -> Self {
        self.max_ccs = max_ccs;
        self
    }

    pub fn with_max_ri(mut self, max_ri: f64) -> Self {
        self.max_ri = max_ri;
        self
    }

    pub fn mz_score(&self, observed: f64, expected: f64) -> f64 {
        score_from_deviation(ppm_error(observed, expected), self.max_ppm)
    }

    pub fn rt_score(&self, observed: f64, expected: f64) -> f64 {
        score_from_values(observed, expected, self.max_rt)
    }

    pub fn ccs_score(&self, observed: f64, expected: f64) -> f64 {
        if expected == 0.0 {
            return 0.0;
        }
        score_from_deviation((observed - expected) / expected, self.max_ccs)
    }

    pub fn ri_score(&self, observed: f64, expected: f64) -> f64 {
        if expected == 0.0 {
            return 0.0;
        }
        score_from_deviation((observed - expected) / expected, self.max_ri)
    }
}
