//! Searching features for lipids: precursor lookup, fragment validation and
//! attaching the resolved matches.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::candidate::{MatchedLipid, MS1_ONLY_COMMENT};
use crate::chemistry::IonizationType;
use crate::database::{build_lipid_database, LipidDatabase, LipidIon};
use crate::feature::{Feature, Polarity};
use crate::fragments::{LipidFragment, LipidFragmentFactory};
use crate::lipid::{catalog, ChainParameters, LipidClass, LipidClassError};
use crate::resolver::{
    attach_matches, merge_and_resolve, LipidAnnotationResolver, SharedPeakFilter,
};
use crate::tolerance::MzTolerance;
use crate::validation::{molecular_species_factory, species_validator, ValidationContext};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("The search was cancelled")]
    Cancelled,
    #[error(transparent)]
    LipidClass(#[from] LipidClassError),
}

/// A flag shared between the caller and search workers. Workers poll it between
/// candidate ions and abandon their feature once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct LipidSearchParameters {
    pub classes: Vec<Arc<LipidClass>>,
    pub chain_params: ChainParameters,
    pub ms1_tolerance: MzTolerance,
    pub ms2_tolerance: MzTolerance,
    /// Validate candidates against fragment spectra. When disabled every precursor
    /// match is reported unconfirmed.
    pub search_ms2: bool,
    /// The inclusive minimum MS/MS score in percent
    pub min_msms_score: f64,
    /// Report precursor-only matches of features whose spectra confirmed nothing
    pub keep_unconfirmed: bool,
    pub exclusions: Vec<IonizationType>,
    /// The polarities the data was acquired in, all if empty
    pub polarities: Vec<Polarity>,
    pub resolver: LipidAnnotationResolver,
}

impl Default for LipidSearchParameters {
    fn default() -> Self {
        Self {
            classes: catalog::all().to_vec(),
            chain_params: ChainParameters::default(),
            ms1_tolerance: MzTolerance::default(),
            ms2_tolerance: MzTolerance::default(),
            search_ms2: true,
            min_msms_score: 60.0,
            keep_unconfirmed: false,
            exclusions: Vec::new(),
            polarities: Vec::new(),
            resolver: LipidAnnotationResolver::default(),
        }
    }
}

impl LipidSearchParameters {
    pub fn with_classes(mut self, classes: Vec<Arc<LipidClass>>) -> Self {
        self.classes = classes;
        self
    }

    pub fn with_chain_params(mut self, chain_params: ChainParameters) -> Self {
        self.chain_params = chain_params;
        self
    }

    pub fn with_ms1_tolerance(mut self, tolerance: MzTolerance) -> Self {
        self.ms1_tolerance = tolerance;
        self
    }

    pub fn with_ms2_tolerance(mut self, tolerance: MzTolerance) -> Self {
        self.ms2_tolerance = tolerance;
        self
    }

    pub fn with_search_ms2(mut self, search_ms2: bool) -> Self {
        self.search_ms2 = search_ms2;
        self
    }

    pub fn with_min_msms_score(mut self, min_msms_score: f64) -> Self {
        self.min_msms_score = min_msms_score;
        self
    }

    pub fn with_keep_unconfirmed(mut self, keep_unconfirmed: bool) -> Self {
        self.keep_unconfirmed = keep_unconfirmed;
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<IonizationType>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_polarities(mut self, polarities: Vec<Polarity>) -> Self {
        self.polarities = polarities;
        self
    }

    pub fn with_resolver(mut self, resolver: LipidAnnotationResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Resolve fragment peaks shared between matches using the current MS2 tolerance,
    /// minimum score and reporting options, so call it after setting those
    pub fn with_shared_peak_removal(mut self) -> Self {
        let filter = SharedPeakFilter::new(self.ms2_tolerance, self.min_msms_score)
            .keeping_below_minimum(self.keep_unconfirmed || !self.search_ms2);
        self.resolver = self.resolver.with_shared_peaks(filter);
        self
    }

    /// Check that every class can be searched
    pub fn validate(&self) -> Result<(), SearchError> {
        for class in self.classes.iter() {
            if class.chain_types.is_empty() {
                return Err(LipidClassError::NoChains(class.name.clone()).into());
            }
            if class.ionizations().is_empty() {
                return Err(LipidClassError::NoIonizations(class.name.clone()).into());
            }
        }
        Ok(())
    }
}

fn keep_best(best: &mut IndexMap<String, MatchedLipid>, candidate: MatchedLipid) {
    match best.get_mut(candidate.identity()) {
        Some(current) => {
            if candidate.compare_quality(current).is_gt() {
                *current = candidate;
            }
        }
        None => {
            best.insert(candidate.identity().to_string(), candidate);
        }
    }
}

/// Validate one candidate ion against one feature.
///
/// The feature must be observable in the ion's polarity and its m/z must fall within
/// the MS1 tolerance of the ion. Each fragment spectrum is then searched for the ion's
/// predicted fragments, which are checked at species level and used to propose and
/// check molecular species. The result holds at most one match per identity.
pub fn find_possible_lipid(
    ion: &LipidIon,
    feature: &Feature,
    params: &LipidSearchParameters,
) -> Vec<MatchedLipid> {
    if !feature.polarity.admits(ion.polarity())
        || !params.ms1_tolerance.contains(ion.mz, feature.mz)
    {
        return Vec::new();
    }
    if !params.search_ms2 {
        return vec![MatchedLipid::unconfirmed(
            ion.annotation.clone(),
            feature.mz,
            ion.ionization,
        )];
    }

    let category = ion.annotation.class().category;
    let validator = species_validator(category);
    let factory = molecular_species_factory(category);
    let fragment_factory = LipidFragmentFactory::new(
        params.ms2_tolerance,
        &ion.annotation,
        ion.ionization,
        params.chain_params,
    );

    let mut best: IndexMap<String, MatchedLipid> = IndexMap::new();
    for (i, spectrum) in feature.fragment_spectra.iter().enumerate() {
        if spectrum.is_empty() {
            log::warn!("Skipping empty fragment spectrum of feature {}", feature.id);
            continue;
        }
        let fragments = fragment_factory.find_fragments_in(i, spectrum);
        if fragments.is_empty() {
            continue;
        }
        let ctx = ValidationContext::new(
            feature.mz,
            ion.ionization,
            spectrum,
            params.ms2_tolerance,
            params.min_msms_score,
        );

        // Species evidence only counts towards molecular species once it confirmed
        // the species itself
        let species_hit = validator.validate(&ctx, &ion.annotation, &fragments);
        let species_fragments: Vec<LipidFragment> = species_hit
            .as_ref()
            .map(|hit| {
                hit.fragments
                    .iter()
                    .filter(|f| validator.is_species_evidence(f))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(hit) = species_hit {
            keep_best(&mut best, hit);
        }

        for mut proposal in factory.predict(&ctx, &ion.annotation, &fragments) {
            proposal.fragments.extend(species_fragments.iter().cloned());
            if let Some(hit) = factory.validate(&ctx, proposal) {
                keep_best(&mut best, hit);
            }
        }
    }

    if best.is_empty() && params.keep_unconfirmed {
        return vec![MatchedLipid::unconfirmed(
            ion.annotation.clone(),
            feature.mz,
            ion.ionization,
        )
        .with_comment(MS1_ONLY_COMMENT)];
    }
    best.into_values().collect()
}

/// Find and resolve every lipid match of `feature` without attaching them
pub fn annotate_feature(
    feature: &Feature,
    database: &LipidDatabase,
    params: &LipidSearchParameters,
    cancel: &CancellationToken,
) -> Result<Vec<MatchedLipid>, SearchError> {
    let candidates = database.ions_within(feature.mz, &params.ms1_tolerance);
    log::debug!(
        "Feature {} at {:.4} has {} candidate ions",
        feature.id,
        feature.mz,
        candidates.len()
    );
    let mut found = Vec::new();
    for ion in candidates {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        found.extend(find_possible_lipid(ion, feature, params));
    }
    Ok(merge_and_resolve(feature, found, &params.resolver))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// The number of features searched
    pub features: usize,
    /// The number of features that received matches
    pub annotated: usize,
    /// The number of matches attached
    pub candidates: usize,
}

/// A lipid search over a collection of features, sharing one candidate database
#[derive(Debug, Clone)]
pub struct LipidSearch {
    params: LipidSearchParameters,
    database: LipidDatabase,
}

impl LipidSearch {
    pub fn new(params: LipidSearchParameters) -> Result<Self, SearchError> {
        params.validate()?;
        let database = build_lipid_database(
            &params.classes,
            &params.chain_params,
            &params.exclusions,
            &params.polarities,
        );
        Ok(Self { params, database })
    }

    pub fn with_database(params: LipidSearchParameters, database: LipidDatabase) -> Self {
        Self { params, database }
    }

    pub fn params(&self) -> &LipidSearchParameters {
        &self.params
    }

    pub fn database(&self) -> &LipidDatabase {
        &self.database
    }

    /// Search one feature and attach its matches, all or nothing
    fn search_feature(
        &self,
        feature: &mut Feature,
        cancel: &CancellationToken,
    ) -> Result<usize, SearchError> {
        let resolved = annotate_feature(feature, &self.database, &self.params, cancel)?;
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if resolved.is_empty() {
            return Ok(0);
        }
        let n = resolved.len();
        attach_matches(feature, resolved);
        Ok(n)
    }

    fn _run_serial(
        &self,
        features: &mut [Feature],
        cancel: &CancellationToken,
    ) -> Vec<Result<usize, SearchError>> {
        features
            .iter_mut()
            .map(|f| self.search_feature(f, cancel))
            .collect()
    }

    #[cfg(feature = "parallelism")]
    fn _run_parallel(
        &self,
        features: &mut [Feature],
        cancel: &CancellationToken,
    ) -> Vec<Result<usize, SearchError>> {
        features
            .par_iter_mut()
            .map(|f| self.search_feature(f, cancel))
            .collect()
    }

    /// Search every feature. If the `parallelism` feature is enabled, features are
    /// searched on the rayon thread pool.
    ///
    /// A feature either receives its complete resolved match list or keeps what it had.
    /// Features finished before a cancellation keep their matches.
    pub fn run(
        &self,
        features: &mut [Feature],
        cancel: &CancellationToken,
    ) -> Result<SearchSummary, SearchError> {
        #[cfg(not(feature = "parallelism"))]
        let outcomes = self._run_serial(features, cancel);
        #[cfg(feature = "parallelism")]
        let outcomes = if features.len() > 1 {
            self._run_parallel(features, cancel)
        } else {
            self._run_serial(features, cancel)
        };

        if cancel.is_cancelled() {
            log::info!("Lipid search cancelled");
            return Err(SearchError::Cancelled);
        }

        let mut summary = SearchSummary {
            features: features.len(),
            ..Default::default()
        };
        for (feature, outcome) in features.iter().zip(outcomes) {
            match outcome {
                Ok(0) => {}
                Ok(n) => {
                    summary.annotated += 1;
                    summary.candidates += n;
                }
                Err(e) => {
                    log::error!("Failed to search feature {}: {e}", feature.id);
                }
            }
        }
        log::info!(
            "Annotated {} of {} features with {} lipid matches",
            summary.annotated,
            summary.features,
            summary.candidates
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::candidate::LipidMatchStatus;
    use crate::feature::FragmentSpectrum;

    fn pc_feature(id: u64) -> Feature {
        Feature::new(id, 760.5851, Polarity::Positive).with_fragment_spectrum(
            FragmentSpectrum::from_arrays(
                Polarity::Positive,
                Some(760.5851),
                &[184.0733, 478.3292, 504.3449, 760.5851],
                &[1000.0, 200.0, 150.0, 300.0],
            ),
        )
    }

    fn pc_params() -> LipidSearchParameters {
        LipidSearchParameters::default()
            .with_classes(catalog::by_abbr("PC"))
            .with_min_msms_score(20.0)
    }

    fn pc_ion(params: &LipidSearchParameters) -> LipidIon {
        let db = build_lipid_database(&params.classes, &params.chain_params, &[], &[]);
        db.iter()
            .find(|i| {
                i.annotation.annotation() == "PC 34:1"
                    && i.ionization == IonizationType::PositiveHydrogen
            })
            .cloned()
            .unwrap()
    }

    #[test_log::test]
    fn test_find_possible_lipid() {
        let params = pc_params();
        let ion = pc_ion(&params);
        let matches = find_possible_lipid(&ion, &pc_feature(1), &params);
        let ids: Vec<_> = matches.iter().map(|m| m.identity()).collect();
        assert_eq!(ids, vec!["PC 34:1", "PC 16:0_18:1"]);
        assert!(matches.iter().all(|m| m.status == LipidMatchStatus::Confirmed));
        // The molecular species carries the headgroup fragment too
        assert_eq!(matches[1].fragments.len(), 3);
    }

    #[test_log::test]
    fn test_rejected_species_adds_no_evidence() {
        // The headgroup explains 5% and the two chains 20% of the intensity
        let feature = Feature::new(1, 760.5851, Polarity::Positive).with_fragment_spectrum(
            FragmentSpectrum::from_arrays(
                Polarity::Positive,
                Some(760.5851),
                &[184.0733, 478.3292, 504.3449, 600.0, 760.5851],
                &[50.0, 100.0, 100.0, 750.0, 300.0],
            ),
        );
        let params = pc_params().with_min_msms_score(15.0);
        let ion = pc_ion(&params);
        let matches = find_possible_lipid(&ion, &feature, &params);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].identity(), "PC 16:0_18:1");
        assert_eq!(matches[0].fragments.len(), 2);
        let score = matches[0].msms_score.unwrap();
        assert!((score - 20.0).abs() < 1e-6, "{score}");

        let params = params.with_min_msms_score(22.0);
        assert!(find_possible_lipid(&ion, &feature, &params).is_empty());
    }

    #[test_log::test]
    fn test_polarity_and_ms1_gates() {
        let params = pc_params();
        let ion = pc_ion(&params);
        let negative = Feature::new(1, 760.5851, Polarity::Negative);
        assert!(find_possible_lipid(&ion, &negative, &params).is_empty());
        let shifted = Feature::new(1, 761.0, Polarity::Positive);
        assert!(find_possible_lipid(&ion, &shifted, &params).is_empty());
    }

    #[test_log::test]
    fn test_unconfirmed_matches() {
        let params = pc_params().with_search_ms2(false);
        let ion = pc_ion(&params);
        let bare = Feature::new(1, 760.5851, Polarity::Positive);
        let matches = find_possible_lipid(&ion, &bare, &params);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].status, LipidMatchStatus::Unconfirmed);
        assert_eq!(matches[0].msms_score, Some(0.0));
        assert!(matches[0].fragments.is_empty());

        let params = pc_params();
        assert!(find_possible_lipid(&ion, &bare, &params).is_empty());
        let params = params.with_keep_unconfirmed(true);
        let matches = find_possible_lipid(&ion, &bare, &params);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].comment.as_deref(), Some(MS1_ONLY_COMMENT));
    }

    #[test_log::test]
    fn test_run_attaches_matches() {
        let search = LipidSearch::new(pc_params()).unwrap();
        let mut features = vec![
            pc_feature(1),
            Feature::new(2, 100.0, Polarity::Positive),
            pc_feature(3),
        ];
        let summary = search.run(&mut features, &CancellationToken::new()).unwrap();
        assert_eq!(summary.features, 3);
        assert_eq!(summary.annotated, 2);
        let ids: Vec<_> = features[0]
            .lipid_annotations
            .iter()
            .map(|m| m.identity())
            .collect();
        assert_eq!(ids, vec!["PC 16:0_18:1", "PC 34:1"]);
        assert!(features[1].lipid_annotations.is_empty());
        assert_eq!(
            features[0].lipid_annotations.len(),
            features[2].lipid_annotations.len()
        );
    }

    #[test_log::test]
    fn test_cancelled_search_attaches_nothing() {
        let search = LipidSearch::new(pc_params()).unwrap();
        let mut features = vec![pc_feature(1), pc_feature(2)];
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = search.run(&mut features, &cancel);
        assert!(matches!(result, Err(SearchError::Cancelled)));
        assert!(features.iter().all(|f| f.lipid_annotations.is_empty()));
    }
}
