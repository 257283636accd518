use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A candidate attribute that may be measured, deliberately left open, or missing.
///
/// A wildcard always satisfies its tolerance check, while an absent value is simply
/// not checked. Neither contributes to a score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeValue<T> {
    Measured(T),
    Wildcard,
    #[default]
    Absent,
}

impl<T: Copy + PartialOrd + Default> AttributeValue<T> {
    /// Interpret a raw value where zero or less marks a wildcard
    pub fn from_raw(value: T) -> Self {
        match value.partial_cmp(&T::default()) {
            Some(std::cmp::Ordering::Greater) => Self::Measured(value),
            Some(_) => Self::Wildcard,
            None => Self::Absent,
        }
    }

    pub fn from_option(value: Option<T>) -> Self {
        value.map(Self::from_raw).unwrap_or_default()
    }

    pub fn measured(&self) -> Option<T> {
        match self {
            Self::Measured(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Measured(_))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T: Display> Display for AttributeValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Measured(v) => write!(f, "{v}"),
            Self::Wildcard => f.write_str("*"),
            Self::Absent => Ok(()),
        }
    }
}

/// The per-dimension differences between a feature and the candidate it matched
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchDeviations {
    pub mz_ppm: Option<f64>,
    pub mz_abs: Option<f64>,
    /// Relative retention time error in percent
    pub rt_relative: Option<f32>,
    pub rt_abs: Option<f32>,
    pub mobility_abs: Option<f32>,
    /// Relative collision cross section error, as a fraction
    pub ccs_relative: Option<f32>,
    pub ri_diff: Option<f32>,
}
