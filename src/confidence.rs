//! Scoring a candidate identity against its feature and grading the confidence
//! of the resulting annotation on the Sumner (MSI) and Schymanski scales.
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::candidate::{AnnotationLike, CandidateIdentity, CompoundDbAnnotation};
use crate::feature::{Feature, IsotopePattern};
use crate::lipid::LipidAnnotationLevel;
use crate::tolerance::{
    score_from_values, MzTolerance, RtTolerance, ScoreAccumulator, ScoreBounds,
};

/// RT or RI scores above this count as agreeing evidence for compound matches
const RETENTION_EVIDENCE_THRESHOLD: f64 = 0.01;
/// Compound matches with an isotope score at or above this reach Schymanski level 4
const ISOTOPE_EVIDENCE_THRESHOLD: f64 = 0.75;

/// Metabolomics Standards Initiative identification levels (Sumner et al. 2007)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MsiLevel {
    /// Identified compound, confirmed by a reference standard
    Level1,
    /// Putatively annotated compound
    Level2,
    /// Putatively characterized compound class
    Level3,
    /// Unknown compound
    Level4,
}

impl MsiLevel {
    pub fn numeric(&self) -> u8 {
        match self {
            Self::Level1 => 1,
            Self::Level2 => 2,
            Self::Level3 => 3,
            Self::Level4 => 4,
        }
    }
}

impl Display for MsiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.numeric())
    }
}

/// Identification confidence levels after Schymanski et al. 2014
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SchymanskiLevel {
    /// Confirmed structure
    Level1,
    /// Probable structure, by library spectrum match
    Level2a,
    /// Probable structure, by diagnostic evidence
    Level2b,
    /// Tentative candidates
    Level3,
    /// Unequivocal molecular formula
    Level4,
    /// Exact mass of interest
    Level5,
}

impl SchymanskiLevel {
    pub fn numeric(&self) -> u8 {
        match self {
            Self::Level1 => 1,
            Self::Level2a | Self::Level2b => 2,
            Self::Level3 => 3,
            Self::Level4 => 4,
            Self::Level5 => 5,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Level2a => "a",
            Self::Level2b => "b",
            _ => "",
        }
    }
}

impl Display for SchymanskiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.numeric(), self.suffix())
    }
}

impl PartialOrd for SchymanskiLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchymanskiLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.numeric().cmp(&other.numeric()).then_with(|| {
            self.suffix()
                .to_ascii_lowercase()
                .cmp(&other.suffix().to_ascii_lowercase())
        })
    }
}

/// The individual scores that make up an [`AnnotationSummary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScoreKind {
    Combined,
    Ms2,
    Isotope,
    Mz,
    Rt,
    Ri,
    Ccs,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 7] = [
        Self::Combined,
        Self::Ms2,
        Self::Isotope,
        Self::Mz,
        Self::Rt,
        Self::Ri,
        Self::Ccs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Combined => "ALL",
            Self::Ms2 => "MS2",
            Self::Isotope => "IP",
            Self::Mz => "m/z",
            Self::Rt => "RT",
            Self::Ri => "RI",
            Self::Ccs => "CCS",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Self::Combined => "Combined (ALL)",
            Self::Isotope => "Isotope pattern (IP)",
            _ => self.label(),
        }
    }

    pub fn unique_id(&self) -> &'static str {
        match self {
            Self::Combined => "combined_score",
            Self::Ms2 => "ms2",
            Self::Isotope => "isotope_pattern",
            Self::Mz => "mz",
            Self::Rt => "rt",
            Self::Ri => "ri",
            Self::Ccs => "ccs",
        }
    }
}

impl Display for ScoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.full_name())
    }
}

/// The weight of each score in the combined score
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CombinedScoreWeights {
    pub ms2: f64,
    pub isotope: f64,
    pub mz: f64,
    pub rt: f64,
    pub ri: f64,
    pub ccs: f64,
}

impl Default for CombinedScoreWeights {
    fn default() -> Self {
        Self {
            ms2: 1.0,
            isotope: 1.0,
            mz: 1.0,
            rt: 1.0,
            ri: 1.0,
            ccs: 1.0,
        }
    }
}

impl CombinedScoreWeights {
    pub fn weight(&self, kind: ScoreKind) -> f64 {
        match kind {
            ScoreKind::Combined => 0.0,
            ScoreKind::Ms2 => self.ms2,
            ScoreKind::Isotope => self.isotope,
            ScoreKind::Mz => self.mz,
            ScoreKind::Rt => self.rt,
            ScoreKind::Ri => self.ri,
            ScoreKind::Ccs => self.ccs,
        }
    }
}

/// How annotation summaries are scored.
///
/// When `mz_tolerance` or `rt_tolerance` is set, the m/z or RT score falls to zero at the edge
/// of that tolerance. Otherwise the fixed bounds of `bounds` apply. RT, RI and CCS scores only
/// count as active when the feature collection actually measured them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SummaryConfig {
    pub mz_tolerance: Option<MzTolerance>,
    pub rt_tolerance: Option<RtTolerance>,
    pub bounds: ScoreBounds,
    pub weights: CombinedScoreWeights,
    pub has_rt: bool,
    pub has_ri: bool,
    pub has_ccs: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            mz_tolerance: None,
            rt_tolerance: None,
            bounds: ScoreBounds::default(),
            weights: CombinedScoreWeights::default(),
            has_rt: true,
            has_ri: true,
            has_ccs: true,
        }
    }
}

impl SummaryConfig {
    /// A configuration whose active scores reflect what `features` measured
    pub fn for_features(features: &[Feature]) -> Self {
        Self {
            has_rt: features.iter().any(|f| f.rt.is_some()),
            has_ri: features.iter().any(|f| f.ri.is_some()),
            has_ccs: features.iter().any(|f| f.ccs.is_some()),
            ..Default::default()
        }
    }

    pub fn with_mz_tolerance(mut self, tolerance: MzTolerance) -> Self {
        self.mz_tolerance = Some(tolerance);
        self
    }

    pub fn with_rt_tolerance(mut self, tolerance: RtTolerance) -> Self {
        self.rt_tolerance = Some(tolerance);
        self
    }

    pub fn with_bounds(mut self, bounds: ScoreBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_weights(mut self, weights: CombinedScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn is_active(&self, kind: ScoreKind) -> bool {
        match kind {
            ScoreKind::Rt => self.has_rt,
            ScoreKind::Ri => self.has_ri,
            ScoreKind::Ccs => self.has_ccs,
            _ => true,
        }
    }
}

/// Compare a predicted isotope pattern with a measured one.
///
/// Both patterns are scaled to their most intense peak. Each predicted peak takes the most
/// intense unused measured peak within `tolerance`, and the pair contributes `1 - |Δ|` of
/// their relative intensities. Peaks left unpaired on either side contribute `1 - intensity`.
/// The result is the product of all contributions.
pub fn isotope_similarity(
    predicted: &IsotopePattern,
    measured: &IsotopePattern,
    tolerance: &MzTolerance,
) -> f64 {
    let predicted = predicted.normalized();
    let measured = measured.normalized();
    if predicted.is_empty() || measured.is_empty() {
        return 0.0;
    }

    let mut used = vec![false; measured.len()];
    let mut score = 1.0;
    for (mz, intensity) in predicted.iter().copied() {
        let best = measured
            .iter()
            .enumerate()
            .filter(|(i, (m, _))| !used[*i] && tolerance.contains(mz, *m))
            .max_by(|(_, (_, a)), (_, (_, b))| a.total_cmp(b))
            .map(|(i, (_, inten))| (i, *inten));
        match best {
            Some((i, inten)) => {
                used[i] = true;
                score *= 1.0 - (intensity - inten).abs();
            }
            None => score *= 1.0 - intensity,
        }
    }
    for ((_, intensity), _) in measured.iter().zip(used.iter()).filter(|(_, u)| !**u) {
        score *= 1.0 - intensity;
    }
    score.clamp(0.0, 1.0)
}

/// The scores and confidence levels of one candidate identity for one feature.
///
/// Scores are recomputed from the feature on each call, except the isotope score which
/// is cached on first use.
#[derive(Debug, Clone)]
pub struct AnnotationSummary<'a> {
    pub feature: &'a Feature,
    pub annotation: Option<&'a CandidateIdentity>,
    pub config: SummaryConfig,
    isotope: OnceCell<Option<f64>>,
}

impl<'a> AnnotationSummary<'a> {
    pub fn new(
        feature: &'a Feature,
        annotation: Option<&'a CandidateIdentity>,
        config: SummaryConfig,
    ) -> Self {
        Self {
            feature,
            annotation,
            config,
            isotope: OnceCell::new(),
        }
    }

    pub fn has_annotation(&self) -> bool {
        self.annotation.is_some()
    }

    pub fn mz_score(&self) -> Option<f64> {
        let precursor = self.annotation?.precursor_mz()?;
        let score = match self.config.mz_tolerance {
            Some(tol) => score_from_values(self.feature.mz, precursor, tol.max_diff(precursor)),
            None => self.config.bounds.mz_score(self.feature.mz, precursor),
        };
        Some(score)
    }

    pub fn rt_score(&self) -> Option<f64> {
        let rt = self.annotation?.rt().measured()?;
        let observed = self.feature.rt? as f64;
        let score = match self.config.rt_tolerance {
            Some(tol) => score_from_values(observed, rt as f64, tol.max_diff(rt) as f64),
            None => self.config.bounds.rt_score(observed, rt as f64),
        };
        Some(score)
    }

    pub fn ccs_score(&self) -> Option<f64> {
        let ccs = self.annotation?.ccs().measured()?;
        let observed = self.feature.ccs?;
        Some(self.config.bounds.ccs_score(observed as f64, ccs as f64))
    }

    pub fn ri_score(&self) -> Option<f64> {
        let ri = self.annotation?.ri().measured()?;
        let observed = self.feature.ri?;
        Some(self.config.bounds.ri_score(observed as f64, ri as f64))
    }

    /// The fragmentation evidence, in `[0, 1]`. Lipid MS/MS scores are percentages and
    /// are scaled down accordingly.
    pub fn ms2_score(&self) -> Option<f64> {
        match self.annotation? {
            CandidateIdentity::SpectralLibrary(s) => Some(s.similarity as f64),
            CandidateIdentity::Lipid(l) => l.msms_score.map(|s| (s / 100.0).clamp(0.0, 1.0)),
            CandidateIdentity::Compound(c) => c.external_score.map(|s| s as f64),
        }
    }

    pub fn isotope_score(&self) -> Option<f64> {
        *self.isotope.get_or_init(|| self.compute_isotope_score())
    }

    fn compute_isotope_score(&self) -> Option<f64> {
        let annotation = self.annotation?;
        if let (Some(predicted), Some(measured)) =
            (annotation.isotope_pattern(), self.feature.isotope_pattern.as_ref())
        {
            if !predicted.is_empty() && !measured.is_empty() {
                return Some(isotope_similarity(
                    predicted,
                    measured,
                    &self.config.bounds.isotope_tolerance,
                ));
            }
        }
        match annotation {
            CandidateIdentity::Compound(CompoundDbAnnotation {
                isotope_score: Some(score),
                ..
            }) => Some(*score as f64),
            _ => None,
        }
    }

    /// The weighted mean of the active scores, a missing score counting as zero
    pub fn combined_score(&self) -> f64 {
        let mut acc = ScoreAccumulator::default();
        for kind in ScoreKind::ALL.iter().skip(1).copied() {
            if !self.config.is_active(kind) {
                continue;
            }
            acc.add(
                self.score(kind).unwrap_or(0.0),
                self.config.weights.weight(kind),
            );
        }
        acc.score()
    }

    pub fn score(&self, kind: ScoreKind) -> Option<f64> {
        match kind {
            ScoreKind::Combined => Some(self.combined_score()),
            ScoreKind::Ms2 => self.ms2_score(),
            ScoreKind::Isotope => self.isotope_score(),
            ScoreKind::Mz => self.mz_score(),
            ScoreKind::Rt => self.rt_score(),
            ScoreKind::Ri => self.ri_score(),
            ScoreKind::Ccs => self.ccs_score(),
        }
    }

    pub fn is_active(&self, kind: ScoreKind) -> bool {
        self.config.is_active(kind)
    }

    pub fn score_label(&self, kind: ScoreKind) -> String {
        if !self.is_active(kind) {
            return "(unavailable for feature list)".to_string();
        }
        match self.score(kind) {
            Some(score) => format!("{score:.3}"),
            None => "(unavailable for annotation)".to_string(),
        }
    }

    fn has_retention_evidence(&self, threshold: f64) -> bool {
        self.rt_score().is_some_and(|s| s > threshold)
            || self.ri_score().is_some_and(|s| s > threshold)
    }

    /// Lipid matches count only with a positive MS/MS score
    fn lipid_level(&self) -> Option<LipidAnnotationLevel> {
        match self.annotation? {
            CandidateIdentity::Lipid(l) if l.msms_score.is_some_and(|s| s > 0.0) => Some(l.level()),
            _ => None,
        }
    }

    pub fn msi_level(&self) -> MsiLevel {
        let Some(annotation) = self.annotation else {
            return MsiLevel::Level4;
        };
        match annotation {
            CandidateIdentity::Lipid(_) => match self.lipid_level() {
                Some(LipidAnnotationLevel::MolecularSpeciesLevel) => MsiLevel::Level2,
                Some(LipidAnnotationLevel::SpeciesLevel) => MsiLevel::Level3,
                None => MsiLevel::Level4,
            },
            CandidateIdentity::SpectralLibrary(_) => MsiLevel::Level2,
            CandidateIdentity::Compound(c) => {
                if self.has_retention_evidence(RETENTION_EVIDENCE_THRESHOLD) {
                    MsiLevel::Level2
                } else if c.external_score.is_some() {
                    MsiLevel::Level3
                } else {
                    MsiLevel::Level4
                }
            }
        }
    }

    /// Lipids stay at level 5 without fragment evidence, isotope scores are not
    /// considered for them.
    pub fn schymanski_level(&self) -> SchymanskiLevel {
        let Some(annotation) = self.annotation else {
            return SchymanskiLevel::Level5;
        };
        match annotation {
            CandidateIdentity::Lipid(_) => match self.lipid_level() {
                Some(LipidAnnotationLevel::MolecularSpeciesLevel) => SchymanskiLevel::Level2a,
                Some(LipidAnnotationLevel::SpeciesLevel) => SchymanskiLevel::Level2b,
                None => SchymanskiLevel::Level5,
            },
            CandidateIdentity::SpectralLibrary(_) => {
                if self.has_retention_evidence(0.0) {
                    SchymanskiLevel::Level1
                } else {
                    SchymanskiLevel::Level2a
                }
            }
            CandidateIdentity::Compound(c) => {
                if c.external_score.is_some() {
                    SchymanskiLevel::Level3
                } else if self
                    .isotope_score()
                    .is_some_and(|s| s >= ISOTOPE_EVIDENCE_THRESHOLD)
                {
                    SchymanskiLevel::Level4
                } else {
                    SchymanskiLevel::Level5
                }
            }
        }
    }

    /// A coarse ordering of annotation kinds, lower is better
    pub fn annotation_type_rank(&self) -> u8 {
        match self.annotation {
            None => 10,
            Some(CandidateIdentity::Lipid(l)) => {
                if l.has_fragments() {
                    2
                } else {
                    4
                }
            }
            Some(CandidateIdentity::SpectralLibrary(_)) => {
                if self.has_retention_evidence(RETENTION_EVIDENCE_THRESHOLD) {
                    1
                } else {
                    3
                }
            }
            Some(CandidateIdentity::Compound(_)) => 4,
        }
    }
}
