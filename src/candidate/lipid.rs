use std::cmp::Ordering;
use std::fmt::Display;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chemistry::IonizationType;
use crate::fragments::LipidFragment;
use crate::lipid::{LipidAnnotation, LipidAnnotationLevel};
use crate::params::{push_value, AttributeExport, ParamList, Unit};
use crate::utils::ppm_error;

pub const MS1_ONLY_COMMENT: &str = "Warning, this annotation is based on MS1 mass accuracy only!";
pub const ESTIMATED_SPECIES_COMMENT: &str =
    "Estimated annotation based on molecular species level fragments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LipidMatchStatus {
    /// Supported by fragment evidence
    Confirmed,
    /// Supported by precursor mass alone
    Unconfirmed,
}

impl Display for LipidMatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => f.write_str("CONFIRMED"),
            Self::Unconfirmed => f.write_str("UNCONFIRMED"),
        }
    }
}

/// A lipid annotation matched to a feature, with the fragments that support it
#[derive(Debug, Clone)]
pub struct MatchedLipid {
    pub annotation: Arc<LipidAnnotation>,
    /// The measured m/z of the feature
    pub accurate_mz: f64,
    pub ionization: IonizationType,
    pub fragments: Vec<LipidFragment>,
    pub msms_score: Option<f64>,
    pub status: LipidMatchStatus,
    pub comment: Option<String>,
}

impl MatchedLipid {
    pub fn confirmed(
        annotation: Arc<LipidAnnotation>,
        accurate_mz: f64,
        ionization: IonizationType,
        fragments: Vec<LipidFragment>,
        msms_score: f64,
    ) -> Self {
        Self {
            annotation,
            accurate_mz,
            ionization,
            fragments,
            msms_score: Some(msms_score),
            status: LipidMatchStatus::Confirmed,
            comment: None,
        }
    }

    /// A match on precursor mass alone, scoring 0 and carrying no fragments
    pub fn unconfirmed(
        annotation: Arc<LipidAnnotation>,
        accurate_mz: f64,
        ionization: IonizationType,
    ) -> Self {
        Self {
            annotation,
            accurate_mz,
            ionization,
            fragments: Vec::new(),
            msms_score: Some(0.0),
            status: LipidMatchStatus::Unconfirmed,
            comment: None,
        }
    }

    /// A candidate suggested by `fragments` that has not been scored yet
    pub fn proposed(
        annotation: Arc<LipidAnnotation>,
        accurate_mz: f64,
        ionization: IonizationType,
        fragments: Vec<LipidFragment>,
    ) -> Self {
        Self {
            annotation,
            accurate_mz,
            ionization,
            fragments,
            msms_score: None,
            status: LipidMatchStatus::Unconfirmed,
            comment: None,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == LipidMatchStatus::Confirmed
    }

    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The identity string of the annotation
    pub fn identity(&self) -> &str {
        self.annotation.annotation()
    }

    pub fn level(&self) -> LipidAnnotationLevel {
        self.annotation.level()
    }

    /// The theoretical m/z of the annotated ion
    pub fn exact_mz(&self) -> f64 {
        self.ionization.ionize(self.annotation.formula()).mz()
    }

    pub fn mz_error_ppm(&self) -> f64 {
        ppm_error(self.accurate_mz, self.exact_mz())
    }

    pub fn has_fragments(&self) -> bool {
        !self.fragments.is_empty()
    }

    pub fn score_or_zero(&self) -> f64 {
        self.msms_score.unwrap_or(0.0)
    }

    /// Order two matches from worse to better: by MS/MS score, then confirmed over
    /// unconfirmed, then by the number of fragments, then by the smaller m/z error
    pub fn compare_quality(&self, other: &Self) -> Ordering {
        self.score_or_zero()
            .total_cmp(&other.score_or_zero())
            .then_with(|| other.status.cmp(&self.status))
            .then_with(|| self.fragments.len().cmp(&other.fragments.len()))
            .then_with(|| {
                other
                    .mz_error_ppm()
                    .abs()
                    .total_cmp(&self.mz_error_ppm().abs())
            })
    }
}

impl AttributeExport for MatchedLipid {
    fn attributes(&self) -> ParamList {
        let mut params = ParamList::new();
        let class = self.annotation.class();
        push_value(&mut params, "lipid_annotation", Some(self.identity()), Unit::Unknown);
        push_value(&mut params, "lipid_class", Some(&class.name), Unit::Unknown);
        push_value(&mut params, "lipid_category", Some(class.category), Unit::Unknown);
        push_value(&mut params, "formula", Some(self.annotation.formula()), Unit::Unknown);
        push_value(&mut params, "ionization", Some(self.ionization), Unit::Unknown);
        push_value(&mut params, "accurate_mz", Some(self.accurate_mz), Unit::MZ);
        push_value(&mut params, "exact_mz", Some(self.exact_mz()), Unit::MZ);
        push_value(&mut params, "mz_diff_ppm", Some(self.mz_error_ppm()), Unit::PartsPerMillion);
        push_value(&mut params, "msms_score", self.msms_score, Unit::Percent);
        push_value(&mut params, "status", Some(self.status), Unit::Unknown);
        push_value(&mut params, "matched_fragments", Some(self.fragments.len()), Unit::Unknown);
        push_value(&mut params, "comment", self.comment.as_ref(), Unit::Unknown);
        params
    }
}
