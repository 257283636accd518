//! Candidate identities a feature can be annotated with.
//!
//! Compound database entries, spectral library matches and lipid matches all
//! expose the same read accessors through [`AnnotationLike`], and are held
//! together as a [`CandidateIdentity`].
pub mod attributes;
pub mod compound;
pub mod lipid;
pub mod spectral;

pub use attributes::{AttributeValue, MatchDeviations};
pub use compound::{build_compounds_with_adducts, CannotDetermineMass, CompoundDbAnnotation};
pub use lipid::{LipidMatchStatus, MatchedLipid, ESTIMATED_SPECIES_COMMENT, MS1_ONLY_COMMENT};
pub use spectral::SpectralLibraryMatch;

use crate::feature::IsotopePattern;
use crate::params::{AttributeExport, ParamList};

/// The read accessors shared by every kind of candidate identity
pub trait AnnotationLike {
    fn name(&self) -> Option<String>;

    fn precursor_mz(&self) -> Option<f64>;

    fn rt(&self) -> AttributeValue<f32> {
        AttributeValue::Absent
    }

    fn mobility(&self) -> AttributeValue<f32> {
        AttributeValue::Absent
    }

    fn ccs(&self) -> AttributeValue<f32> {
        AttributeValue::Absent
    }

    fn ri(&self) -> AttributeValue<f32> {
        AttributeValue::Absent
    }

    fn formula(&self) -> Option<String> {
        None
    }

    fn adduct_name(&self) -> Option<String> {
        None
    }

    fn isotope_pattern(&self) -> Option<&IsotopePattern> {
        None
    }

    /// The score this identity was matched with, if any
    fn score(&self) -> Option<f32> {
        None
    }

    fn database(&self) -> Option<&str> {
        None
    }
}

impl AnnotationLike for CompoundDbAnnotation {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn precursor_mz(&self) -> Option<f64> {
        self.precursor_mz
    }

    fn rt(&self) -> AttributeValue<f32> {
        self.rt
    }

    fn mobility(&self) -> AttributeValue<f32> {
        self.mobility
    }

    fn ccs(&self) -> AttributeValue<f32> {
        self.ccs
    }

    fn ri(&self) -> AttributeValue<f32> {
        self.ri
    }

    fn formula(&self) -> Option<String> {
        self.formula.clone()
    }

    fn adduct_name(&self) -> Option<String> {
        self.adduct.as_ref().map(|a| a.name.clone())
    }

    fn isotope_pattern(&self) -> Option<&IsotopePattern> {
        self.isotope_pattern.as_ref()
    }

    fn score(&self) -> Option<f32> {
        self.score
    }

    fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
}

impl AnnotationLike for SpectralLibraryMatch {
    fn name(&self) -> Option<String> {
        Some(self.entry_name.clone())
    }

    fn precursor_mz(&self) -> Option<f64> {
        self.precursor_mz
    }

    fn rt(&self) -> AttributeValue<f32> {
        self.rt
    }

    fn mobility(&self) -> AttributeValue<f32> {
        self.mobility
    }

    fn ccs(&self) -> AttributeValue<f32> {
        self.ccs
    }

    fn ri(&self) -> AttributeValue<f32> {
        self.ri
    }

    fn formula(&self) -> Option<String> {
        self.formula.clone()
    }

    fn adduct_name(&self) -> Option<String> {
        self.adduct.clone()
    }

    fn score(&self) -> Option<f32> {
        Some(self.similarity)
    }

    fn database(&self) -> Option<&str> {
        self.library.as_deref()
    }
}

impl AnnotationLike for MatchedLipid {
    fn name(&self) -> Option<String> {
        Some(self.identity().to_string())
    }

    fn precursor_mz(&self) -> Option<f64> {
        Some(self.exact_mz())
    }

    fn formula(&self) -> Option<String> {
        Some(self.annotation.formula().to_string())
    }

    fn adduct_name(&self) -> Option<String> {
        Some(self.ionization.adduct_name().to_string())
    }

    fn score(&self) -> Option<f32> {
        self.msms_score.map(|s| s as f32)
    }
}

/// The closed set of identity kinds a feature can be annotated with
#[derive(Debug, Clone)]
pub enum CandidateIdentity {
    Compound(CompoundDbAnnotation),
    SpectralLibrary(SpectralLibraryMatch),
    Lipid(MatchedLipid),
}

impl CandidateIdentity {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Compound(_) => "compound database",
            Self::SpectralLibrary(_) => "spectral library",
            Self::Lipid(_) => "lipid",
        }
    }

    fn inner(&self) -> &dyn AnnotationLike {
        match self {
            Self::Compound(c) => c,
            Self::SpectralLibrary(s) => s,
            Self::Lipid(l) => l,
        }
    }
}

impl AnnotationLike for CandidateIdentity {
    fn name(&self) -> Option<String> {
        self.inner().name()
    }

    fn precursor_mz(&self) -> Option<f64> {
        self.inner().precursor_mz()
    }

    fn rt(&self) -> AttributeValue<f32> {
        self.inner().rt()
    }

    fn mobility(&self) -> AttributeValue<f32> {
        self.inner().mobility()
    }

    fn ccs(&self) -> AttributeValue<f32> {
        self.inner().ccs()
    }

    fn ri(&self) -> AttributeValue<f32> {
        self.inner().ri()
    }

    fn formula(&self) -> Option<String> {
        self.inner().formula()
    }

    fn adduct_name(&self) -> Option<String> {
        self.inner().adduct_name()
    }

    fn isotope_pattern(&self) -> Option<&IsotopePattern> {
        self.inner().isotope_pattern()
    }

    fn score(&self) -> Option<f32> {
        self.inner().score()
    }

    fn database(&self) -> Option<&str> {
        self.inner().database()
    }
}

impl AttributeExport for CandidateIdentity {
    fn attributes(&self) -> ParamList {
        match self {
            Self::Compound(c) => c.attributes(),
            Self::SpectralLibrary(s) => s.attributes(),
            Self::Lipid(l) => l.attributes(),
        }
    }
}

impl From<CompoundDbAnnotation> for CandidateIdentity {
    fn from(value: CompoundDbAnnotation) -> Self {
        Self::Compound(value)
    }
}

impl From<SpectralLibraryMatch> for CandidateIdentity {
    fn from(value: SpectralLibraryMatch) -> Self {
        Self::SpectralLibrary(value)
    }
}

impl From<MatchedLipid> for CandidateIdentity {
    fn from(value: MatchedLipid) -> Self {
        Self::Lipid(value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test]
    fn test_shared_accessors() {
        let lib: CandidateIdentity = SpectralLibraryMatch::new("caffeine", Some(195.0877), 0.92)
            .with_rt(0.0)
            .into();
        assert_eq!(lib.kind(), "spectral library");
        assert_eq!(lib.rt(), AttributeValue::Wildcard);
        assert_eq!(lib.score(), Some(0.92));
        assert_eq!(lib.name().as_deref(), Some("caffeine"));

        let cmpd: CandidateIdentity = CompoundDbAnnotation::new("caffeine")
            .with_formula("C8H10N4O2")
            .with_ccs(140.0)
            .into();
        assert_eq!(cmpd.ccs(), AttributeValue::Measured(140.0));
        assert!(cmpd.precursor_mz().is_none());
        assert!(cmpd.attributes().iter().any(|p| p.name == "ccs"));
    }
}
