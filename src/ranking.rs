//! Ordering the candidate identities of a feature, best first.
use std::cmp::Ordering;

use crate::candidate::CandidateIdentity;
use crate::confidence::{AnnotationSummary, ScoreKind, SummaryConfig};
use crate::feature::Feature;

/// The scores compared after the confidence level, in order of precedence
const TIE_BREAK_SCORES: [ScoreKind; 6] = [
    ScoreKind::Ms2,
    ScoreKind::Isotope,
    ScoreKind::Mz,
    ScoreKind::Rt,
    ScoreKind::Ri,
    ScoreKind::Ccs,
];

/// Higher scores first, a missing score after any present one
fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order two summaries so that the better one comes first
pub fn compare_summaries(a: &AnnotationSummary, b: &AnnotationSummary) -> Ordering {
    match (a.has_annotation(), b.has_annotation()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => return Ordering::Equal,
        (true, true) => {}
    }

    let ord = a.schymanski_level().cmp(&b.schymanski_level());
    if ord != Ordering::Equal {
        return ord;
    }
    for kind in TIE_BREAK_SCORES {
        let ord = compare_scores(a.score(kind), b.score(kind));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Sort `candidates` of `feature` from best to worst. Equal candidates keep their order.
pub fn rank_annotations<'a>(
    feature: &'a Feature,
    candidates: &'a [CandidateIdentity],
    config: SummaryConfig,
) -> Vec<&'a CandidateIdentity> {
    let mut summaries: Vec<AnnotationSummary<'a>> = candidates
        .iter()
        .map(|c| AnnotationSummary::new(feature, Some(c), config))
        .collect();
    summaries.sort_by(compare_summaries);
    summaries.into_iter().filter_map(|s| s.annotation).collect()
}

pub fn best_annotation<'a>(
    feature: &'a Feature,
    candidates: &'a [CandidateIdentity],
    config: SummaryConfig,
) -> Option<&'a CandidateIdentity> {
    candidates
        .iter()
        .map(|c| AnnotationSummary::new(feature, Some(c), config))
        .min_by(compare_summaries)
        .and_then(|s| s.annotation)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::candidate::{
        AnnotationLike, CompoundDbAnnotation, MatchedLipid, SpectralLibraryMatch,
    };
    use crate::chemistry::IonizationType;
    use crate::feature::Polarity;
    use crate::lipid::{catalog, LipidAnnotation, LipidChain, LipidChainType};
    use crate::validation::test::species;
    use std::sync::Arc;

    fn lipid(annotation: Arc<LipidAnnotation>, score: f64) -> CandidateIdentity {
        MatchedLipid::confirmed(
            annotation,
            760.5851,
            IonizationType::PositiveHydrogen,
            Vec::new(),
            score,
        )
        .into()
    }

    #[test_log::test]
    fn test_suffix_order_within_level() {
        let feature = Feature::new(1, 760.5851, Polarity::Positive);
        let cls = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        let molecular = Arc::new(
            LipidAnnotation::molecular_species(
                cls,
                vec![
                    LipidChain::new(LipidChainType::AcylChain, 16, 0),
                    LipidChain::new(LipidChainType::AcylChain, 18, 1),
                ],
            )
            .unwrap(),
        );
        // the species match scores higher but is only level 2b
        let candidates = vec![
            lipid(species("Diacylglycerophosphocholines", 34, 1), 95.0),
            lipid(molecular, 40.0),
        ];
        let ranked = rank_annotations(&feature, &candidates, SummaryConfig::default());
        let names: Vec<String> = ranked.iter().filter_map(|c| c.name()).collect();
        assert_eq!(names, vec!["PC 16:0_18:1", "PC 34:1"]);
    }

    #[test_log::test]
    fn test_level_one_beats_level_two() {
        let feature = Feature::new(1, 500.0, Polarity::Positive).with_rt(5.0);
        let candidates: Vec<CandidateIdentity> = vec![
            SpectralLibraryMatch::new("high similarity", Some(500.0), 0.99).into(),
            SpectralLibraryMatch::new("with rt", Some(500.0), 0.2)
                .with_rt(5.1)
                .into(),
        ];
        let best = best_annotation(&feature, &candidates, SummaryConfig::default()).unwrap();
        assert_eq!(best.name().as_deref(), Some("with rt"));
    }

    fn compound_at(name: &str, mz: f64) -> CandidateIdentity {
        let mut compound = CompoundDbAnnotation::new(name);
        compound.precursor_mz = Some(mz);
        compound.into()
    }

    #[test_log::test]
    fn test_scores_break_ties() {
        let feature = Feature::new(1, 500.0, Polarity::Positive);
        let candidates: Vec<CandidateIdentity> = vec![
            CompoundDbAnnotation::new("unscored").into(),
            compound_at("far", 500.005),
            compound_at("close", 500.001),
        ];
        let ranked = rank_annotations(&feature, &candidates, SummaryConfig::default());
        let names: Vec<String> = ranked.iter().filter_map(|c| c.name()).collect();
        assert_eq!(names, vec!["close", "far", "unscored"]);
    }

    #[test_log::test]
    fn test_absent_last() {
        let feature = Feature::new(1, 500.0, Polarity::Positive);
        let candidate: CandidateIdentity = CompoundDbAnnotation::new("x").into();
        let config = SummaryConfig::default();
        let present = AnnotationSummary::new(&feature, Some(&candidate), config);
        let absent = AnnotationSummary::new(&feature, None, config);
        assert_eq!(compare_summaries(&present, &absent), Ordering::Less);
        assert_eq!(compare_summaries(&absent, &present), Ordering::Greater);
        assert_eq!(compare_summaries(&absent, &absent), Ordering::Equal);
        assert!(best_annotation(&feature, &[], config).is_none());
    }
}
