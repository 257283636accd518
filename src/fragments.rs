//! Predicting lipid fragments from class rules and finding them in fragment spectra.
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;

use mzpeaks::{CentroidPeak, IndexType};

mod factory;

pub use factory::LipidFragmentFactory;

use crate::chemistry::ElementalComposition;
use crate::feature::FragmentSpectrum;
use crate::lipid::{LipidAnnotationLevel, LipidChain, LipidClass, LipidFragmentationRuleType};
use crate::tolerance::MzTolerance;

/// A predicted fragment that was observed in a spectrum
#[derive(Debug, Clone)]
pub struct LipidFragment {
    pub rule_type: LipidFragmentationRuleType,
    pub level: LipidAnnotationLevel,
    /// The theoretical m/z of the fragment ion
    pub mz_exact: f64,
    pub ion_formula: ElementalComposition,
    /// The most intense peak found within tolerance
    pub peak: CentroidPeak,
    pub class: Arc<LipidClass>,
    /// The chain the fragment is specific to, if any
    pub chain: Option<LipidChain>,
    /// The position of the spectrum the peak was found in among its feature's
    /// fragment spectra
    pub spectrum_index: usize,
}

impl LipidFragment {
    pub fn is_species_level(&self) -> bool {
        self.level == LipidAnnotationLevel::SpeciesLevel
    }

    pub fn is_molecular_species_level(&self) -> bool {
        self.level == LipidAnnotationLevel::MolecularSpeciesLevel
    }

    pub fn mz_error_ppm(&self) -> f64 {
        crate::utils::ppm_error(self.peak.mz, self.mz_exact)
    }

    /// Identifies the observed peak across the fragment spectra of a feature
    pub fn peak_key(&self) -> (usize, IndexType) {
        (self.spectrum_index, self.peak.index)
    }
}

impl Display for LipidFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {} @ {:.4}", self.rule_type, self.ion_formula, self.mz_exact)?;
        if let Some(chain) = self.chain.as_ref() {
            write!(f, " ({chain})")?;
        }
        Ok(())
    }
}

/// The share of explainable intensity in `spectrum` that `fragments` account for, as a
/// percentage in `[0, 100]`.
///
/// Peaks within `tolerance` of `precursor_mz` are not explainable and are left out of the
/// total. Each peak counts once no matter how many fragments were assigned to it. When no
/// explainable intensity remains the score is 100 if anything matched and 0 otherwise.
pub fn msms_score(
    spectrum: &FragmentSpectrum,
    fragments: &[LipidFragment],
    precursor_mz: f64,
    tolerance: &MzTolerance,
) -> f64 {
    let total: f64 = spectrum
        .peaks
        .iter()
        .filter(|p| !tolerance.contains(precursor_mz, p.mz))
        .map(|p| p.intensity as f64)
        .sum();

    let mut seen: HashSet<IndexType> = HashSet::with_capacity(fragments.len());
    let explained: f64 = fragments
        .iter()
        .filter(|f| seen.insert(f.peak.index))
        .map(|f| f.peak.intensity as f64)
        .sum();

    if total <= 0.0 {
        if explained > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (explained / total * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chemistry::IonizationType;
    use crate::feature::Polarity;
    use crate::lipid::{catalog, ChainParameters, LipidAnnotation};

    fn pc_34_1() -> Arc<LipidAnnotation> {
        let cls = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        Arc::new(LipidAnnotation::species(cls, 34, 1).unwrap())
    }

    #[test_log::test]
    fn test_find_fragments() {
        let annot = pc_34_1();
        let spectrum = FragmentSpectrum::from_arrays(
            Polarity::Positive,
            Some(760.5851),
            &[184.0733, 478.3292, 504.3449, 600.0, 760.5851],
            &[1000.0, 200.0, 150.0, 50.0, 300.0],
        );
        let factory = LipidFragmentFactory::new(
            MzTolerance::default(),
            &annot,
            IonizationType::PositiveHydrogen,
            ChainParameters::default(),
        );
        let fragments = factory.find_fragments(&spectrum);

        let headgroup: Vec<_> = fragments
            .iter()
            .filter(|f| f.rule_type == LipidFragmentationRuleType::HeadgroupFragment)
            .collect();
        assert_eq!(headgroup.len(), 1);
        assert!(headgroup[0].is_species_level());
        assert!((headgroup[0].mz_exact - 184.0733).abs() < 1e-3);

        let mut chains: Vec<String> = fragments
            .iter()
            .filter(|f| f.rule_type == LipidFragmentationRuleType::AcylChainFragmentNL)
            .filter_map(|f| f.chain.map(|c| c.to_string()))
            .collect();
        chains.sort();
        assert_eq!(chains, vec!["16:0", "18:1"]);

        // 1000 + 200 + 150 of the 1400 intensity away from the precursor
        let score = msms_score(&spectrum, &fragments, 760.5851, &MzTolerance::default());
        assert!((score - 1350.0 / 1400.0 * 100.0).abs() < 1e-6, "{score}");
    }

    #[test_log::test]
    fn test_wrong_ionization_finds_nothing() {
        let annot = pc_34_1();
        let spectrum = FragmentSpectrum::from_arrays(
            Polarity::Negative,
            None,
            &[184.0733],
            &[1000.0],
        );
        let factory = LipidFragmentFactory::new(
            MzTolerance::default(),
            &annot,
            IonizationType::NegativeHydrogen,
            ChainParameters::default(),
        );
        assert!(factory.find_fragments(&spectrum).is_empty());
    }

    #[test_log::test]
    fn test_score_degenerate_cases() {
        let annot = pc_34_1();
        let tol = MzTolerance::default();
        let spectrum =
            FragmentSpectrum::from_arrays(Polarity::Positive, None, &[760.5851], &[100.0]);
        assert_eq!(msms_score(&spectrum, &[], 760.5851, &tol), 0.0);

        let factory = LipidFragmentFactory::new(
            tol,
            &annot,
            IonizationType::PositiveHydrogen,
            ChainParameters::default(),
        );
        let precursor_only = FragmentSpectrum::from_arrays(
            Polarity::Positive,
            None,
            &[184.0733, 760.5851],
            &[0.0, 100.0],
        );
        let fragments = factory.find_fragments(&precursor_only);
        assert_eq!(msms_score(&precursor_only, &fragments, 760.5851, &tol), 0.0);
    }
}
