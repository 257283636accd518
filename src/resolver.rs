//! Reducing the lipid matches of a feature to one entry per identity.
use std::sync::Arc;

use indexmap::IndexMap;
use mzpeaks::IndexType;

use crate::candidate::{MatchedLipid, ESTIMATED_SPECIES_COMMENT, MS1_ONLY_COMMENT};
use crate::feature::Feature;
use crate::fragments::msms_score;
use crate::lipid::LipidAnnotationLevel;
use crate::tolerance::MzTolerance;
use crate::validation::{molecular_species_factory, species_validator, ValidationContext};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Collapses duplicate lipid matches of one feature
pub trait DuplicateResolver: Send + Sync {
    fn resolve(&self, feature: &Feature, matches: Vec<MatchedLipid>) -> Vec<MatchedLipid>;
}

/// Gives each fragment peak claimed by several matches of a feature to the best scoring
/// of them. The others lose the fragments on that peak and are scored again.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SharedPeakFilter {
    /// The MS2 m/z tolerance matches are scored again with
    pub tolerance: MzTolerance,
    /// The inclusive minimum MS/MS score in percent
    pub min_msms_score: f64,
    /// Keep matches that fall below the minimum with a warning instead of dropping them
    pub keep_below_minimum: bool,
}

impl SharedPeakFilter {
    pub fn new(tolerance: MzTolerance, min_msms_score: f64) -> Self {
        Self {
            tolerance,
            min_msms_score,
            keep_below_minimum: false,
        }
    }

    pub fn keeping_below_minimum(mut self, keep_below_minimum: bool) -> Self {
        self.keep_below_minimum = keep_below_minimum;
        self
    }

    /// Whether the remaining fragments of `lipid` still point to its annotation
    fn still_supported(&self, ctx: &ValidationContext<'_>, lipid: &MatchedLipid) -> bool {
        let category = lipid.annotation.class().category;
        if lipid.level() == LipidAnnotationLevel::SpeciesLevel {
            let validator = species_validator(category);
            if lipid.fragments.iter().any(|f| validator.is_species_evidence(f)) {
                return true;
            }
        }
        molecular_species_factory(category)
            .predict(ctx, &lipid.annotation, &lipid.fragments)
            .iter()
            .any(|p| p.identity() == lipid.identity())
    }

    /// The MS/MS score of `lipid` over its remaining fragments, 0 when they no longer
    /// support it
    fn rescore(&self, feature: &Feature, lipid: &MatchedLipid) -> f64 {
        let Some(spectrum) = lipid
            .fragments
            .first()
            .and_then(|f| feature.fragment_spectra.get(f.spectrum_index))
        else {
            return 0.0;
        };
        let ctx = ValidationContext::new(
            feature.mz,
            lipid.ionization,
            spectrum,
            self.tolerance,
            self.min_msms_score,
        );
        if self.still_supported(&ctx, lipid) {
            msms_score(spectrum, &lipid.fragments, lipid.exact_mz(), &self.tolerance)
        } else {
            0.0
        }
    }

    /// Remove shared peaks from all but the best scoring of their claimants, then drop or
    /// comment the matches that no longer reach the minimum score. Claimants tied with the
    /// best keep the peak.
    pub fn apply(&self, feature: &Feature, matches: &mut Vec<MatchedLipid>) {
        let mut claims: IndexMap<(usize, IndexType), Vec<usize>> = IndexMap::new();
        for (i, m) in matches.iter().enumerate() {
            for fragment in m.fragments.iter() {
                let claimants = claims.entry(fragment.peak_key()).or_default();
                if !claimants.contains(&i) {
                    claimants.push(i);
                }
            }
        }

        let scores: Vec<f64> = matches.iter().map(|m| m.score_or_zero()).collect();
        let mut changed = vec![false; matches.len()];
        for (key, claimants) in claims.iter().filter(|(_, c)| c.len() > 1) {
            let top = claimants
                .iter()
                .map(|i| scores[*i])
                .fold(f64::NEG_INFINITY, f64::max);
            for &i in claimants.iter().filter(|i| scores[**i] < top) {
                matches[i].fragments.retain(|f| f.peak_key() != *key);
                changed[i] = true;
            }
        }

        for (m, changed) in matches.iter_mut().zip(changed) {
            if changed {
                let score = self.rescore(feature, m);
                log::debug!(
                    "{} of feature {} lost shared peaks, scored {score:.2}",
                    m.identity(),
                    feature.id
                );
                m.msms_score = Some(score);
            }
        }

        matches.retain_mut(|m| {
            if m.score_or_zero() >= self.min_msms_score {
                true
            } else if self.keep_below_minimum {
                m.comment = Some(MS1_ONLY_COMMENT.to_string());
                true
            } else {
                false
            }
        });
    }
}

/// Keeps the best match per identity, best first
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LipidAnnotationResolver {
    /// When no species level match exists, add the species level annotation of the best
    /// molecular species match
    pub add_estimated_species: bool,
    /// Keep at most this many matches
    pub max_identifications: Option<usize>,
    /// Take fragment peaks shared between matches away from all but the best of them
    pub shared_peaks: Option<SharedPeakFilter>,
}

impl LipidAnnotationResolver {
    pub fn new(add_estimated_species: bool, max_identifications: Option<usize>) -> Self {
        Self {
            add_estimated_species,
            max_identifications,
            shared_peaks: None,
        }
    }

    pub fn with_shared_peaks(mut self, filter: SharedPeakFilter) -> Self {
        self.shared_peaks = Some(filter);
        self
    }

    fn estimated_species(resolved: &[MatchedLipid]) -> Option<MatchedLipid> {
        if resolved
            .iter()
            .any(|m| m.level() == LipidAnnotationLevel::SpeciesLevel)
        {
            return None;
        }
        resolved.iter().find_map(|m| {
            let species = m.annotation.to_species_level()?;
            let mut entry = m.clone().with_comment(ESTIMATED_SPECIES_COMMENT);
            entry.annotation = Arc::new(species);
            entry.msms_score = Some(0.0);
            Some(entry)
        })
    }
}

impl DuplicateResolver for LipidAnnotationResolver {
    fn resolve(&self, feature: &Feature, mut matches: Vec<MatchedLipid>) -> Vec<MatchedLipid> {
        matches.sort_by(|a, b| b.compare_quality(a));

        let mut best: IndexMap<String, MatchedLipid> = IndexMap::with_capacity(matches.len());
        for m in matches {
            best.entry(m.identity().to_string()).or_insert(m);
        }
        let mut resolved: Vec<MatchedLipid> = best.into_values().collect();

        if let Some(filter) = self.shared_peaks.as_ref() {
            filter.apply(feature, &mut resolved);
            resolved.sort_by(|a, b| b.compare_quality(a));
        }

        if self.add_estimated_species {
            if let Some(estimated) = Self::estimated_species(&resolved) {
                log::debug!(
                    "Estimated {} for feature {}",
                    estimated.identity(),
                    feature.id
                );
                resolved.push(estimated);
            }
        }

        if let Some(n) = self.max_identifications {
            resolved.truncate(n);
        }
        resolved
    }
}

/// Resolve `new` matches together with the matches already on `feature`. Returns
/// nothing when there is nothing new.
pub fn merge_and_resolve<R: DuplicateResolver + ?Sized>(
    feature: &Feature,
    new: Vec<MatchedLipid>,
    resolver: &R,
) -> Vec<MatchedLipid> {
    if new.is_empty() {
        return Vec::new();
    }
    let mut merged = feature.lipid_annotations.clone();
    merged.extend(new);
    resolver.resolve(feature, merged)
}

/// Replace the lipid matches of `feature` with `resolved`
pub fn attach_matches(feature: &mut Feature, resolved: Vec<MatchedLipid>) {
    feature.lipid_annotations = resolved;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::candidate::LipidMatchStatus;
    use crate::chemistry::IonizationType;
    use crate::feature::{FragmentSpectrum, Polarity};
    use crate::fragments::LipidFragment;
    use crate::lipid::{catalog, LipidAnnotation, LipidChain, LipidChainType};
    use crate::validation::test::fragments_of;

    fn pc_species() -> Arc<LipidAnnotation> {
        let cls = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        Arc::new(LipidAnnotation::species(cls, 34, 1).unwrap())
    }

    fn pc_molecular() -> Arc<LipidAnnotation> {
        let cls = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        Arc::new(
            LipidAnnotation::molecular_species(
                cls,
                vec![
                    LipidChain::new(LipidChainType::AcylChain, 16, 0),
                    LipidChain::new(LipidChainType::AcylChain, 18, 1),
                ],
            )
            .unwrap(),
        )
    }

    fn confirmed(annotation: Arc<LipidAnnotation>, score: f64) -> MatchedLipid {
        MatchedLipid::confirmed(
            annotation,
            760.5851,
            IonizationType::PositiveHydrogen,
            Vec::new(),
            score,
        )
    }

    #[test_log::test]
    fn test_keeps_best_per_identity() {
        let feature = Feature::new(1, 760.5851, Polarity::Positive);
        let resolver = LipidAnnotationResolver::default();
        let resolved = resolver.resolve(
            &feature,
            vec![confirmed(pc_species(), 0.4), confirmed(pc_species(), 0.9)],
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].msms_score, Some(0.9));
    }

    #[test_log::test]
    fn test_confirmed_wins_ties() {
        let feature = Feature::new(1, 760.5851, Polarity::Positive);
        let mut unconfirmed = confirmed(pc_species(), 0.0);
        unconfirmed.status = LipidMatchStatus::Unconfirmed;
        let resolved = LipidAnnotationResolver::default()
            .resolve(&feature, vec![unconfirmed, confirmed(pc_species(), 0.0)]);
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].is_confirmed());
    }

    fn pc_molecular_with(second: LipidChain) -> Arc<LipidAnnotation> {
        let cls = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        Arc::new(
            LipidAnnotation::molecular_species(
                cls,
                vec![LipidChain::new(LipidChainType::AcylChain, 16, 0), second],
            )
            .unwrap(),
        )
    }

    #[test_log::test]
    fn test_estimated_species_and_limit() {
        let feature = Feature::new(1, 760.5851, Polarity::Positive);
        let resolver = LipidAnnotationResolver::new(true, None);
        let resolved = resolver.resolve(&feature, vec![confirmed(pc_molecular(), 80.0)]);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].identity(), "PC 16:0_18:1");
        assert_eq!(resolved[1].identity(), "PC 34:1");
        assert_eq!(resolved[1].msms_score, Some(0.0));
        assert_eq!(resolved[1].comment.as_deref(), Some(ESTIMATED_SPECIES_COMMENT));

        let resolved = resolver.resolve(
            &feature,
            vec![confirmed(pc_molecular(), 80.0), confirmed(pc_species(), 70.0)],
        );
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|m| m.comment.is_none()));

        let resolver = LipidAnnotationResolver::new(true, Some(1));
        let resolved = resolver.resolve(&feature, vec![confirmed(pc_molecular(), 80.0)]);
        assert_eq!(resolved.len(), 1);
    }

    #[test_log::test]
    fn test_single_estimate_without_species() {
        let feature = Feature::new(1, 760.5851, Polarity::Positive);
        let resolver = LipidAnnotationResolver::new(true, None);
        let other = pc_molecular_with(LipidChain::new(LipidChainType::AcylChain, 18, 0));

        // Only the best molecular species is estimated
        let resolved = resolver.resolve(
            &feature,
            vec![confirmed(other.clone(), 60.0), confirmed(pc_molecular(), 80.0)],
        );
        let ids: Vec<_> = resolved.iter().map(|m| m.identity()).collect();
        assert_eq!(ids, vec!["PC 16:0_18:1", "PC 16:0_18:0", "PC 34:1"]);

        // Any species level match, even of another species, prevents the estimate
        let cls = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        let pc_34_0 = Arc::new(LipidAnnotation::species(cls, 34, 0).unwrap());
        let resolved = resolver.resolve(
            &feature,
            vec![confirmed(pc_molecular(), 80.0), confirmed(pc_34_0, 30.0)],
        );
        let ids: Vec<_> = resolved.iter().map(|m| m.identity()).collect();
        assert_eq!(ids, vec!["PC 16:0_18:1", "PC 34:0"]);
    }

    /// The headgroup and the chain fragments of PC 34:1 in one spectrum
    fn shared_peak_feature() -> (Feature, Vec<LipidFragment>, Vec<LipidFragment>) {
        let spectrum = FragmentSpectrum::from_arrays(
            Polarity::Positive,
            Some(760.5851),
            &[184.0733, 478.3292, 504.3449, 760.5851],
            &[1000.0, 200.0, 150.0, 300.0],
        );
        let fragments = fragments_of(&pc_species(), IonizationType::PositiveHydrogen, &spectrum);
        let (headgroup, chains): (Vec<_>, Vec<_>) =
            fragments.into_iter().partition(|f| f.is_species_level());
        assert_eq!(headgroup.len(), 1);
        assert_eq!(chains.len(), 2);
        let feature =
            Feature::new(1, 760.5851, Polarity::Positive).with_fragment_spectrum(spectrum);
        (feature, headgroup, chains)
    }

    fn with_fragments(
        annotation: Arc<LipidAnnotation>,
        score: f64,
        fragments: Vec<LipidFragment>,
    ) -> MatchedLipid {
        MatchedLipid::confirmed(
            annotation,
            760.5851,
            IonizationType::PositiveHydrogen,
            fragments,
            score,
        )
    }

    #[test_log::test]
    fn test_shared_peaks_go_to_best_match() {
        let (feature, headgroup, chains) = shared_peak_feature();
        let filter = SharedPeakFilter::new(MzTolerance::default(), 20.0);
        let resolver = LipidAnnotationResolver::default().with_shared_peaks(filter);

        let mut molecular_fragments = chains.clone();
        molecular_fragments.extend(headgroup.iter().cloned());
        let matches = vec![
            with_fragments(pc_molecular(), 40.0, molecular_fragments),
            with_fragments(pc_species(), 74.0, headgroup.clone()),
        ];
        let resolved = resolver.resolve(&feature, matches);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].identity(), "PC 34:1");
        assert_eq!(resolved[0].msms_score, Some(74.0));
        // The molecular species keeps its chains, 350 of 1350
        assert_eq!(resolved[1].identity(), "PC 16:0_18:1");
        assert_eq!(resolved[1].fragments.len(), 2);
        let score = resolved[1].msms_score.unwrap();
        assert!((score - 350.0 / 1350.0 * 100.0).abs() < 1e-6, "{score}");

        // A match left without support scores zero and is dropped, or kept with a warning
        let all_fragments: Vec<_> = chains.iter().chain(headgroup.iter()).cloned().collect();
        let matches = vec![
            with_fragments(pc_molecular(), 100.0, all_fragments),
            with_fragments(pc_species(), 74.0, headgroup.clone()),
        ];
        let resolved = resolver.resolve(&feature, matches.clone());
        let ids: Vec<_> = resolved.iter().map(|m| m.identity()).collect();
        assert_eq!(ids, vec!["PC 16:0_18:1"]);

        let resolver = resolver.with_shared_peaks(filter.keeping_below_minimum(true));
        let resolved = resolver.resolve(&feature, matches);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].identity(), "PC 34:1");
        assert_eq!(resolved[1].msms_score, Some(0.0));
        assert!(resolved[1].fragments.is_empty());
        assert_eq!(resolved[1].comment.as_deref(), Some(MS1_ONLY_COMMENT));
    }

    #[test_log::test]
    fn test_tied_claimants_keep_shared_peak() {
        let (feature, headgroup, _) = shared_peak_feature();
        let filter = SharedPeakFilter::new(MzTolerance::default(), 20.0);
        let resolver = LipidAnnotationResolver::default().with_shared_peaks(filter);
        let other = pc_molecular_with(LipidChain::new(LipidChainType::AcylChain, 18, 0));
        let resolved = resolver.resolve(
            &feature,
            vec![
                with_fragments(pc_species(), 74.0, headgroup.clone()),
                with_fragments(other, 74.0, headgroup.clone()),
            ],
        );
        assert_eq!(resolved.len(), 2);
        assert!(resolved.iter().all(|m| m.fragments.len() == 1));
        assert!(resolved.iter().all(|m| m.msms_score == Some(74.0)));
    }

    #[test_log::test]
    fn test_merge_with_existing() {
        let mut feature = Feature::new(1, 760.5851, Polarity::Positive);
        let resolver = LipidAnnotationResolver::default();
        assert!(merge_and_resolve(&feature, Vec::new(), &resolver).is_empty());

        attach_matches(&mut feature, vec![confirmed(pc_species(), 50.0)]);
        let resolved = merge_and_resolve(&feature, vec![confirmed(pc_species(), 65.0)], &resolver);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].msms_score, Some(65.0));
        attach_matches(&mut feature, resolved);
        assert_eq!(feature.lipid_annotations[0].msms_score, Some(65.0));
    }
}
