//! Multi-dimensional tolerance matching between a feature and a candidate identity.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::candidate::{AnnotationLike, AttributeValue, CompoundDbAnnotation, MatchDeviations};
use crate::feature::Feature;
use crate::tolerance::{
    center_score, MobilityTolerance, MzTolerance, PercentTolerance, RtTolerance,
    ScoreAccumulator,
};
use crate::utils::ppm_error;

/// The weight each checked dimension carries in the alignment score
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchWeights {
    pub mz: f64,
    pub rt: f64,
    pub mobility: f64,
    pub ccs: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            mz: 1.0,
            rt: 1.0,
            mobility: 1.0,
            ccs: 1.0,
        }
    }
}

/// The tolerances a feature must satisfy. A dimension without a tolerance is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchTolerances {
    pub mz: Option<MzTolerance>,
    pub rt: Option<RtTolerance>,
    pub mobility: Option<MobilityTolerance>,
    pub ccs: Option<PercentTolerance>,
    pub weights: MatchWeights,
}

impl MatchTolerances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mz(mut self, tol: MzTolerance) -> Self {
        self.mz = Some(tol);
        self
    }

    pub fn with_rt(mut self, tol: RtTolerance) -> Self {
        self.rt = Some(tol);
        self
    }

    pub fn with_mobility(mut self, tol: MobilityTolerance) -> Self {
        self.mobility = Some(tol);
        self
    }

    pub fn with_ccs(mut self, tol: PercentTolerance) -> Self {
        self.ccs = Some(tol);
        self
    }

    pub fn with_weights(mut self, weights: MatchWeights) -> Self {
        self.weights = weights;
        self
    }
}

/// The alignment score of a feature against a candidate with the deviations it was computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub score: f32,
    pub deviations: MatchDeviations,
}

/// Check a measured candidate value against the feature value. Returns `None` when the
/// dimension does not apply, otherwise whether the feature lies within tolerance.
fn check_dimension<F>(
    candidate: AttributeValue<f32>,
    observed: Option<f32>,
    within: F,
) -> Option<bool>
where
    F: Fn(f32, f32) -> bool,
{
    match candidate {
        AttributeValue::Measured(expected) => Some(match observed {
            Some(observed) => within(expected, observed),
            None => false,
        }),
        AttributeValue::Wildcard | AttributeValue::Absent => None,
    }
}

/// Whether every supplied tolerance that applies to `candidate` is satisfied by `feature`.
///
/// Wildcard and absent candidate values always pass.
pub fn matches<A: AnnotationLike + ?Sized>(
    feature: &Feature,
    candidate: &A,
    tolerances: &MatchTolerances,
) -> bool {
    if let (Some(tol), Some(expected)) = (tolerances.mz, candidate.precursor_mz()) {
        if !tol.contains(expected, feature.mz) {
            return false;
        }
    }
    if let Some(tol) = tolerances.rt {
        if check_dimension(candidate.rt(), feature.rt, |e, o| tol.contains(e, o)) == Some(false) {
            return false;
        }
    }
    if let Some(tol) = tolerances.mobility {
        if check_dimension(candidate.mobility(), feature.mobility, |e, o| tol.contains(e, o))
            == Some(false)
        {
            return false;
        }
    }
    if let Some(tol) = tolerances.ccs {
        if check_dimension(candidate.ccs(), feature.ccs, |e, o| {
            tol.contains(e as f64, o as f64)
        }) == Some(false)
        {
            return false;
        }
    }
    true
}

/// The weighted mean of how centered the feature lies in each checked dimension's window,
/// or `None` if the candidate does not match or no dimension could be checked
pub fn calculate_score<A: AnnotationLike + ?Sized>(
    feature: &Feature,
    candidate: &A,
    tolerances: &MatchTolerances,
) -> Option<f32> {
    if !matches(feature, candidate, tolerances) {
        return None;
    }
    let weights = &tolerances.weights;
    let mut acc = ScoreAccumulator::default();

    if let (Some(tol), Some(expected)) = (tolerances.mz, candidate.precursor_mz()) {
        acc.add(center_score(feature.mz, &tol.window(expected)), weights.mz);
    }
    if let (Some(tol), Some(expected), Some(observed)) =
        (tolerances.rt, candidate.rt().measured(), feature.rt)
    {
        acc.add(center_score(observed as f64, &tol.window(expected)), weights.rt);
    }
    if let (Some(tol), Some(expected), Some(observed)) =
        (tolerances.mobility, candidate.mobility().measured(), feature.mobility)
    {
        acc.add(
            center_score(observed as f64, &tol.window(expected)),
            weights.mobility,
        );
    }
    if let (Some(tol), Some(expected), Some(observed)) =
        (tolerances.ccs, candidate.ccs().measured(), feature.ccs)
    {
        acc.add(
            center_score(observed as f64, &tol.window(expected as f64)),
            weights.ccs,
        );
    }

    if acc.is_empty() {
        None
    } else {
        Some(acc.score() as f32)
    }
}

/// The signed differences `feature - candidate` in every dimension both sides carry
pub fn calculate_deviations<A: AnnotationLike + ?Sized>(
    feature: &Feature,
    candidate: &A,
) -> MatchDeviations {
    let mut dev = MatchDeviations::default();
    if let Some(expected) = candidate.precursor_mz() {
        dev.mz_abs = Some(feature.mz - expected);
        dev.mz_ppm = Some(ppm_error(feature.mz, expected));
    }
    if let (Some(expected), Some(observed)) = (candidate.rt().measured(), feature.rt) {
        dev.rt_abs = Some(observed - expected);
        dev.rt_relative = Some((observed - expected) / expected * 100.0);
    }
    if let (Some(expected), Some(observed)) = (candidate.mobility().measured(), feature.mobility) {
        dev.mobility_abs = Some(observed - expected);
    }
    if let (Some(expected), Some(observed)) = (candidate.ccs().measured(), feature.ccs) {
        dev.ccs_relative = Some((observed - expected) / expected);
    }
    if let (Some(expected), Some(observed)) = (candidate.ri().measured(), feature.ri) {
        dev.ri_diff = Some(observed - expected);
    }
    dev
}

/// Match any candidate kind, keeping only positive scores
pub fn match_candidate<A: AnnotationLike + ?Sized>(
    feature: &Feature,
    candidate: &A,
    tolerances: &MatchTolerances,
) -> Option<MatchResult> {
    let score = calculate_score(feature, candidate, tolerances)?;
    if score <= 0.0 {
        return None;
    }
    Some(MatchResult {
        score,
        deviations: calculate_deviations(feature, candidate),
    })
}

/// Match a compound database entry, returning a copy that carries the alignment
/// score and the deviations from `feature`
pub fn check_match_and_calculate_deviation(
    feature: &Feature,
    compound: &CompoundDbAnnotation,
    tolerances: &MatchTolerances,
) -> Option<CompoundDbAnnotation> {
    let result = match_candidate(feature, compound, tolerances)?;
    log::trace!(
        "Feature {} matched {} with score {:.3}",
        feature.id,
        compound.display_name(),
        result.score
    );
    let mut annotated = compound.clone();
    annotated.score = Some(result.score);
    annotated.deviations = result.deviations;
    Some(annotated)
}

/// Match every compound against `feature`, best scoring first
pub fn annotate_with_compounds(
    feature: &Feature,
    compounds: &[CompoundDbAnnotation],
    tolerances: &MatchTolerances,
) -> Vec<CompoundDbAnnotation> {
    let mut hits: Vec<_> = compounds
        .iter()
        .filter_map(|c| check_match_and_calculate_deviation(feature, c, tolerances))
        .collect();
    hits.sort_by(|a, b| a.compare_by_score(b));
    hits
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chemistry::IonType;
    use crate::feature::Polarity;

    fn compound(mz: f64, rt: f32) -> CompoundDbAnnotation {
        let mut c = CompoundDbAnnotation::new("test").with_rt(rt);
        c.precursor_mz = Some(mz);
        c.adduct = Some(IonType::protonated());
        c
    }

    #[test_log::test]
    fn test_rt_wildcard_always_passes() {
        let cand = compound(500.0, 0.0);
        for rt in [0.1f32, 5.0, 42.0] {
            let feature = Feature::new(1, 500.0, Polarity::Positive).with_rt(rt);
            for window in [0.01f32, 0.3, 5.0] {
                let tol = MatchTolerances::new().with_rt(RtTolerance::Absolute(window));
                assert!(matches(&feature, &cand, &tol));
            }
        }
        let feature = Feature::new(1, 500.0, Polarity::Positive);
        let tol = MatchTolerances::new().with_rt(RtTolerance::Absolute(0.1));
        assert!(matches(&feature, &cand, &tol));
    }

    #[test_log::test]
    fn test_rt_window() {
        let cand = compound(500.0, 5.0);
        let feature = Feature::new(1, 500.0, Polarity::Positive).with_rt(5.2);
        let wide = MatchTolerances::new().with_rt(RtTolerance::Absolute(0.3));
        let narrow = MatchTolerances::new().with_rt(RtTolerance::Absolute(0.1));
        assert!(matches(&feature, &cand, &wide));
        assert!(!matches(&feature, &cand, &narrow));
        assert!(calculate_score(&feature, &cand, &narrow).is_none());

        // A measured candidate value requires a measured feature value
        let unmeasured = Feature::new(2, 500.0, Polarity::Positive);
        assert!(!matches(&unmeasured, &cand, &wide));
    }

    #[test_log::test]
    fn test_alignment_score() {
        let cand = compound(500.0, 5.0);
        let tol = MatchTolerances::new()
            .with_mz(MzTolerance::new(0.01, 0.0))
            .with_rt(RtTolerance::Absolute(0.2));

        let exact = Feature::new(1, 500.0, Polarity::Positive).with_rt(5.0);
        let score = calculate_score(&exact, &cand, &tol).unwrap();
        assert!((score - 1.0).abs() < 1e-6);

        let offset = Feature::new(2, 500.005, Polarity::Positive).with_rt(5.1);
        let score = calculate_score(&offset, &cand, &tol).unwrap();
        assert!((score - 0.5).abs() < 1e-3, "{score}");

        let outside = Feature::new(3, 500.02, Polarity::Positive).with_rt(5.0);
        assert!(calculate_score(&outside, &cand, &tol).is_none());
    }

    #[test_log::test]
    fn test_annotated_clone_carries_deviations() {
        let cand = compound(500.0, 5.0).with_ccs(200.0).with_ri(1000.0);
        let feature = Feature::new(1, 500.002, Polarity::Positive)
            .with_rt(5.1)
            .with_ccs(202.0)
            .with_ri(1010.0);
        let tol = MatchTolerances::new()
            .with_mz(MzTolerance::new(0.005, 10.0))
            .with_rt(RtTolerance::Absolute(0.3))
            .with_ccs(PercentTolerance(0.02));
        let hit = check_match_and_calculate_deviation(&feature, &cand, &tol).unwrap();
        assert!(hit.score.unwrap() > 0.0);
        assert!(cand.score.is_none());
        let dev = hit.deviations;
        assert!((dev.mz_ppm.unwrap() - 4.0).abs() < 1e-3);
        assert!((dev.rt_abs.unwrap() - 0.1).abs() < 1e-4);
        assert!((dev.rt_relative.unwrap() - 2.0).abs() < 1e-2);
        assert!((dev.ccs_relative.unwrap() - 0.01).abs() < 1e-5);
        assert!((dev.ri_diff.unwrap() - 10.0).abs() < 1e-3);
    }

    #[test_log::test]
    fn test_no_checks_means_no_score() {
        let mut cand = CompoundDbAnnotation::new("unplaced");
        cand.rt = AttributeValue::Wildcard;
        let feature = Feature::new(1, 500.0, Polarity::Positive);
        assert!(calculate_score(&feature, &cand, &MatchTolerances::new()).is_none());
    }
}
