use mzannot::candidate::build_compounds_with_adducts;
use mzannot::lipid::catalog;
use mzannot::prelude::*;
use mzannot::{
    annotate_with_compounds, best_annotation, rank_annotations, AnnotationSummary,
    CancellationToken, CandidateIdentity, CompoundDbAnnotation, Feature, FragmentSpectrum, IonType,
    LipidAnnotationResolver, LipidSearch, LipidSearchParameters, MatchTolerances, MsiLevel,
    MzTolerance, Polarity, RtTolerance, SchymanskiLevel, SpectralLibraryMatch, SummaryConfig,
};

fn pc_feature(id: u64) -> Feature {
    Feature::new(id, 760.5851, Polarity::Positive)
        .with_rt(12.4)
        .with_fragment_spectrum(FragmentSpectrum::from_arrays(
            Polarity::Positive,
            Some(760.5851),
            &[184.0733, 478.3292, 504.3449, 600.0, 760.5851],
            &[1000.0, 200.0, 150.0, 50.0, 300.0],
        ))
}

#[test_log::test]
fn test_lipid_search_and_grading() {
    let params = LipidSearchParameters::default()
        .with_classes(catalog::by_abbr("PC"))
        .with_min_msms_score(20.0)
        .with_resolver(LipidAnnotationResolver::new(true, None));
    let search = LipidSearch::new(params).unwrap();

    let mut features = vec![
        pc_feature(0),
        Feature::new(1, 301.2, Polarity::Positive),
        pc_feature(2),
    ];
    let summary = search
        .run(&mut features, &CancellationToken::new())
        .unwrap();
    assert_eq!(summary.features, 3);
    assert_eq!(summary.annotated, 2);
    assert!(features[1].lipid_annotations.is_empty());

    let feature = &features[0];
    let best = &feature.lipid_annotations[0];
    assert_eq!(best.identity(), "PC 16:0_18:1");
    assert!(best.is_confirmed());
    assert!(feature
        .lipid_annotations
        .iter()
        .any(|m| m.identity() == "PC 34:1"));

    let candidates = feature.all_candidates();
    let config = SummaryConfig::for_features(&features);
    let top = best_annotation(feature, &candidates, config).unwrap();
    assert_eq!(top.name().as_deref(), Some("PC 16:0_18:1"));

    let graded = AnnotationSummary::new(feature, Some(top), config);
    assert_eq!(graded.schymanski_level(), SchymanskiLevel::Level2a);
    assert_eq!(graded.msi_level(), MsiLevel::Level2);
    assert_eq!(graded.annotation_type_rank(), 2);

    let attributes = top.attributes();
    assert!(attributes
        .iter()
        .any(|p| p.name() == "lipid_annotation" && p.value() == "PC 16:0_18:1"));
}

#[test_log::test]
fn test_compound_matching_and_ranking() {
    let compounds = vec![
        CompoundDbAnnotation::new("glucose")
            .with_formula("C6H12O6")
            .with_rt(3.05),
        CompoundDbAnnotation::new("no mass"),
    ];
    let ions = build_compounds_with_adducts(&compounds, &[IonType::protonated()]);
    assert_eq!(ions.len(), 1);
    let mz = ions[0].precursor_mz.unwrap();
    assert!((mz - 181.07066).abs() < 1e-4);

    let mut feature = Feature::new(7, mz + 0.0005, Polarity::Positive).with_rt(3.0);
    let tolerances = MatchTolerances::new()
        .with_mz(MzTolerance::new(0.002, 5.0))
        .with_rt(RtTolerance::Absolute(0.1));
    let hits = annotate_with_compounds(&feature, &ions, &tolerances);
    assert_eq!(hits.len(), 1);
    assert!(hits[0].score.unwrap() > 0.0);

    feature
        .annotations
        .extend(hits.into_iter().map(CandidateIdentity::from));
    feature
        .annotations
        .push(SpectralLibraryMatch::new("glucose [library]", Some(mz), 0.85).into());

    let candidates = feature.all_candidates();
    let config = SummaryConfig::default();
    let ranked = rank_annotations(&feature, &candidates, config);
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].name().as_deref(), Some("glucose [library]"));

    let compound = AnnotationSummary::new(&feature, Some(ranked[1]), config);
    assert_eq!(compound.msi_level(), MsiLevel::Level2);
    assert_eq!(compound.schymanski_level(), SchymanskiLevel::Level5);
}
