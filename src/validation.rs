//! Deciding which lipid annotations the observed fragments support.
//!
//! Species level validators score the class specific fragments of a species level
//! annotation. Molecular species factories propose chain compositions from chain
//! fragments and score each proposal on its own fragments.
use std::sync::Arc;

use crate::candidate::{LipidMatchStatus, MatchedLipid};
use crate::chemistry::IonizationType;
use crate::feature::FragmentSpectrum;
use crate::fragments::{msms_score, LipidFragment};
use crate::lipid::{LipidAnnotation, LipidCategory};
use crate::tolerance::MzTolerance;

mod molecular;
mod species;

pub use molecular::{
    GlyceroAndPhosphoMolecularSpeciesFactory, SphingoMolecularSpeciesFactory,
    SterolMolecularSpeciesFactory,
};
pub use species::{
    FattyAcylSpeciesValidator, GlyceroAndGlycerophosphoSpeciesValidator,
    SphingolipidSpeciesValidator, SterolSpeciesValidator,
};

/// What one fragment spectrum of a feature is being validated against
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The measured m/z of the feature
    pub accurate_mz: f64,
    pub ionization: IonizationType,
    pub spectrum: &'a FragmentSpectrum,
    /// The MS2 m/z tolerance
    pub tolerance: MzTolerance,
    /// The inclusive minimum MS/MS score, in percent
    pub min_score: f64,
}

impl<'a> ValidationContext<'a> {
    pub fn new(
        accurate_mz: f64,
        ionization: IonizationType,
        spectrum: &'a FragmentSpectrum,
        tolerance: MzTolerance,
        min_score: f64,
    ) -> Self {
        Self {
            accurate_mz,
            ionization,
            spectrum,
            tolerance,
            min_score,
        }
    }

    pub fn accepts(&self, score: f64) -> bool {
        score >= self.min_score
    }
}

pub trait SpeciesLevelValidator: Send + Sync {
    /// Whether `fragment` counts towards the species level score
    fn is_species_evidence(&self, fragment: &LipidFragment) -> bool {
        fragment.is_species_level()
    }

    /// Score the species level evidence among `fragments` and confirm `annotation` if the
    /// score reaches the minimum. The result carries every fragment found.
    fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        annotation: &Arc<LipidAnnotation>,
        fragments: &[LipidFragment],
    ) -> Option<MatchedLipid> {
        let evidence: Vec<LipidFragment> = fragments
            .iter()
            .filter(|f| self.is_species_evidence(f))
            .cloned()
            .collect();
        if evidence.is_empty() {
            return None;
        }
        let score = msms_score(ctx.spectrum, &evidence, ctx.accurate_mz, &ctx.tolerance);
        if ctx.accepts(score) {
            Some(MatchedLipid::confirmed(
                annotation.clone(),
                ctx.accurate_mz,
                ctx.ionization,
                fragments.to_vec(),
                score,
            ))
        } else {
            log::trace!(
                "{annotation} {} scored {score:.2}, below {}",
                ctx.ionization,
                ctx.min_score
            );
            None
        }
    }
}

pub trait MolecularSpeciesFactory: Send + Sync {
    /// Propose molecular species level annotations of the species level `annotation`
    /// from the chain fragments among `fragments`. Proposals are not yet scored.
    fn predict(
        &self,
        ctx: &ValidationContext<'_>,
        annotation: &Arc<LipidAnnotation>,
        fragments: &[LipidFragment],
    ) -> Vec<MatchedLipid>;

    /// Score a proposal over its own fragments, excluding peaks at the m/z of the
    /// proposed ion, and confirm it if the score reaches the minimum
    fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        mut candidate: MatchedLipid,
    ) -> Option<MatchedLipid> {
        if candidate.fragments.is_empty() {
            return None;
        }
        let precursor = candidate.exact_mz();
        let score = msms_score(ctx.spectrum, &candidate.fragments, precursor, &ctx.tolerance);
        if ctx.accepts(score) {
            candidate.msms_score = Some(score);
            candidate.status = LipidMatchStatus::Confirmed;
            Some(candidate)
        } else {
            log::trace!(
                "{} {} scored {score:.2}, below {}",
                candidate.identity(),
                ctx.ionization,
                ctx.min_score
            );
            None
        }
    }
}

static FATTY_ACYL_SPECIES: FattyAcylSpeciesValidator = FattyAcylSpeciesValidator;
static GLYCERO_SPECIES: GlyceroAndGlycerophosphoSpeciesValidator =
    GlyceroAndGlycerophosphoSpeciesValidator;
static SPHINGO_SPECIES: SphingolipidSpeciesValidator = SphingolipidSpeciesValidator;
static STEROL_SPECIES: SterolSpeciesValidator = SterolSpeciesValidator;

static GLYCERO_MOLECULAR: GlyceroAndPhosphoMolecularSpeciesFactory =
    GlyceroAndPhosphoMolecularSpeciesFactory;
static SPHINGO_MOLECULAR: SphingoMolecularSpeciesFactory = SphingoMolecularSpeciesFactory;
static STEROL_MOLECULAR: SterolMolecularSpeciesFactory = SterolMolecularSpeciesFactory;

/// The species level validator for lipids of `category`
pub fn species_validator(category: LipidCategory) -> &'static dyn SpeciesLevelValidator {
    match category {
        LipidCategory::FattyAcyls => &FATTY_ACYL_SPECIES,
        LipidCategory::Glycerolipids | LipidCategory::Glycerophospholipids => &GLYCERO_SPECIES,
        LipidCategory::Sphingolipids => &SPHINGO_SPECIES,
        LipidCategory::SterolLipids => &STEROL_SPECIES,
        _ => &GLYCERO_SPECIES,
    }
}

/// The molecular species factory for lipids of `category`
pub fn molecular_species_factory(category: LipidCategory) -> &'static dyn MolecularSpeciesFactory {
    match category {
        LipidCategory::Sphingolipids => &SPHINGO_MOLECULAR,
        LipidCategory::SterolLipids => &STEROL_MOLECULAR,
        _ => &GLYCERO_MOLECULAR,
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::feature::Polarity;
    use crate::fragments::LipidFragmentFactory;
    use crate::lipid::{catalog, ChainParameters};

    pub(crate) fn species(name: &str, carbons: u16, dbes: u16) -> Arc<LipidAnnotation> {
        let cls = catalog::by_name(name).unwrap();
        Arc::new(LipidAnnotation::species(cls, carbons, dbes).unwrap())
    }

    pub(crate) fn fragments_of(
        annotation: &Arc<LipidAnnotation>,
        ionization: IonizationType,
        spectrum: &FragmentSpectrum,
    ) -> Vec<LipidFragment> {
        LipidFragmentFactory::new(
            MzTolerance::default(),
            annotation,
            ionization,
            ChainParameters::default(),
        )
        .find_fragments(spectrum)
    }

    fn headgroup_spectrum(headgroup: f32, other: f32) -> FragmentSpectrum {
        FragmentSpectrum::from_arrays(
            Polarity::Positive,
            Some(760.5851),
            &[184.0733, 300.0, 760.5851],
            &[headgroup, other, 500.0],
        )
    }

    #[test_log::test]
    fn test_species_threshold_is_inclusive() {
        let pc = species("Diacylglycerophosphocholines", 34, 1);
        let validator = species_validator(pc.class().category);

        let spectrum = headgroup_spectrum(50.0, 50.0);
        let fragments = fragments_of(&pc, IonizationType::PositiveHydrogen, &spectrum);
        let ctx = ValidationContext::new(
            760.5851,
            IonizationType::PositiveHydrogen,
            &spectrum,
            MzTolerance::default(),
            50.0,
        );
        let hit = validator.validate(&ctx, &pc, &fragments).unwrap();
        assert_eq!(hit.status, LipidMatchStatus::Confirmed);
        assert_eq!(hit.msms_score, Some(50.0));
        assert_eq!(hit.identity(), "PC 34:1");

        let spectrum = headgroup_spectrum(49.0, 51.0);
        let fragments = fragments_of(&pc, IonizationType::PositiveHydrogen, &spectrum);
        let ctx = ValidationContext::new(
            760.5851,
            IonizationType::PositiveHydrogen,
            &spectrum,
            MzTolerance::default(),
            50.0,
        );
        assert!(validator.validate(&ctx, &pc, &fragments).is_none());
    }

    #[test_log::test]
    fn test_fatty_acid_precursor_only() {
        let fa = species("Free fatty acids", 18, 1);
        let spectrum =
            FragmentSpectrum::from_arrays(Polarity::Negative, None, &[281.2486], &[1000.0]);
        let fragments = fragments_of(&fa, IonizationType::NegativeHydrogen, &spectrum);
        assert_eq!(fragments.len(), 1);
        let ctx = ValidationContext::new(
            281.2486,
            IonizationType::NegativeHydrogen,
            &spectrum,
            MzTolerance::default(),
            60.0,
        );
        let hit = species_validator(LipidCategory::FattyAcyls)
            .validate(&ctx, &fa, &fragments)
            .unwrap();
        assert_eq!(hit.msms_score, Some(100.0));
    }

    #[test_log::test]
    fn test_category_dispatch() {
        // Unmapped categories fall back to the glycerophospholipid rules
        let spectrum = headgroup_spectrum(50.0, 50.0);
        let pc = species("Diacylglycerophosphocholines", 34, 1);
        let fragments = fragments_of(&pc, IonizationType::PositiveHydrogen, &spectrum);
        let ctx = ValidationContext::new(
            760.5851,
            IonizationType::PositiveHydrogen,
            &spectrum,
            MzTolerance::default(),
            10.0,
        );
        for category in [LipidCategory::PrenolLipids, LipidCategory::Polyketides] {
            assert!(species_validator(category)
                .validate(&ctx, &pc, &fragments)
                .is_some());
            assert!(molecular_species_factory(category)
                .predict(&ctx, &pc, &fragments)
                .is_empty());
        }
    }
}
