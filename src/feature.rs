//! Detected features and the spectra attached to them.
use mzpeaks::prelude::*;
use mzpeaks::{CentroidPeak, IndexType, PeakSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::candidate::{CandidateIdentity, MatchedLipid};

/// Describes the polarity of an ion or a spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Polarity {
    #[default]
    Unknown = 0,
    Positive = 1,
    Negative = -1,
}

impl Polarity {
    /// Whether an ion of polarity `other` can be observed in data of this polarity.
    /// Data of unknown polarity admits either.
    pub fn admits(&self, other: Polarity) -> bool {
        match self {
            Self::Unknown => true,
            _ => *self == other,
        }
    }
}

fn peaks_from_pairs(mzs: &[f64], intensities: &[f32]) -> PeakSet {
    let peaks: Vec<CentroidPeak> = mzs
        .iter()
        .zip(intensities.iter())
        .enumerate()
        .map(|(i, (mz, inten))| CentroidPeak::new(*mz, *inten, i as IndexType))
        .collect();
    PeakSet::new(peaks)
}

/// A centroided fragmentation spectrum associated with a feature
#[derive(Debug, Clone, Default)]
pub struct FragmentSpectrum {
    pub polarity: Polarity,
    pub precursor_mz: Option<f64>,
    pub peaks: PeakSet,
}

impl FragmentSpectrum {
    pub fn new(polarity: Polarity, precursor_mz: Option<f64>, peaks: PeakSet) -> Self {
        Self {
            polarity,
            precursor_mz,
            peaks,
        }
    }

    pub fn from_arrays(
        polarity: Polarity,
        precursor_mz: Option<f64>,
        mzs: &[f64],
        intensities: &[f32],
    ) -> Self {
        Self::new(polarity, precursor_mz, peaks_from_pairs(mzs, intensities))
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn total_intensity(&self) -> f64 {
        self.peaks.iter().map(|p| p.intensity as f64).sum()
    }
}

/// A measured or predicted isotope pattern
#[derive(Debug, Clone, Default)]
pub struct IsotopePattern {
    pub peaks: PeakSet,
}

impl IsotopePattern {
    pub fn new(peaks: PeakSet) -> Self {
        Self { peaks }
    }

    pub fn from_arrays(mzs: &[f64], intensities: &[f32]) -> Self {
        Self::new(peaks_from_pairs(mzs, intensities))
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    /// The `(m/z, intensity)` pairs scaled so that the most intense peak is 1
    pub fn normalized(&self) -> Vec<(f64, f64)> {
        let max = self
            .peaks
            .iter()
            .map(|p| p.intensity as f64)
            .fold(0.0, f64::max);
        if max <= 0.0 {
            return Vec::new();
        }
        self.peaks
            .iter()
            .map(|p| (p.mz, p.intensity as f64 / max))
            .collect()
    }
}

/// A detected chromatographic or mobility signal with its averaged properties.
///
/// The measured values are read-only to this crate. Only the annotation lists are
/// written, and only by the worker that holds the feature.
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub id: u64,
    pub mz: f64,
    /// In minutes
    pub rt: Option<f32>,
    pub mobility: Option<f32>,
    pub ccs: Option<f32>,
    pub ri: Option<f32>,
    pub polarity: Polarity,
    pub isotope_pattern: Option<IsotopePattern>,
    pub fragment_spectra: Vec<FragmentSpectrum>,
    pub lipid_annotations: Vec<MatchedLipid>,
    pub annotations: Vec<CandidateIdentity>,
}

impl Feature {
    pub fn new(id: u64, mz: f64, polarity: Polarity) -> Self {
        Self {
            id,
            mz,
            polarity,
            ..Default::default()
        }
    }

    pub fn with_rt(mut self, rt: f32) -> Self {
        self.rt = Some(rt);
        self
    }

    pub fn with_mobility(mut self, mobility: f32) -> Self {
        self.mobility = Some(mobility);
        self
    }

    pub fn with_ccs(mut self, ccs: f32) -> Self {
        self.ccs = Some(ccs);
        self
    }

    pub fn with_ri(mut self, ri: f32) -> Self {
        self.ri = Some(ri);
        self
    }

    pub fn with_isotope_pattern(mut self, pattern: IsotopePattern) -> Self {
        self.isotope_pattern = Some(pattern);
        self
    }

    pub fn add_fragment_spectrum(&mut self, spectrum: FragmentSpectrum) {
        self.fragment_spectra.push(spectrum);
    }

    pub fn with_fragment_spectrum(mut self, spectrum: FragmentSpectrum) -> Self {
        self.add_fragment_spectrum(spectrum);
        self
    }

    pub fn has_fragment_spectra(&self) -> bool {
        !self.fragment_spectra.is_empty()
    }

    /// Every candidate identity of this feature, the lipid matches after the others
    pub fn all_candidates(&self) -> Vec<CandidateIdentity> {
        self.annotations
            .iter()
            .cloned()
            .chain(self.lipid_annotations.iter().cloned().map(CandidateIdentity::Lipid))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test]
    fn test_spectrum_sorted() {
        let spec = FragmentSpectrum::from_arrays(
            Polarity::Positive,
            Some(760.58),
            &[500.0, 184.07, 577.5],
            &[10.0, 100.0, 5.0],
        );
        assert_eq!(spec.len(), 3);
        let mzs: Vec<f64> = spec.peaks.iter().map(|p| p.mz).collect();
        assert_eq!(mzs, vec![184.07, 500.0, 577.5]);
        assert_eq!(spec.total_intensity(), 115.0);
    }

    #[test_log::test]
    fn test_isotope_normalization() {
        let pattern = IsotopePattern::from_arrays(&[100.0, 101.0], &[50.0, 25.0]);
        let norm = pattern.normalized();
        assert_eq!(norm, vec![(100.0, 1.0), (101.0, 0.5)]);
        assert!(IsotopePattern::default().normalized().is_empty());
    }

    #[test_log::test]
    fn test_polarity_admits() {
        assert!(Polarity::Unknown.admits(Polarity::Negative));
        assert!(Polarity::Positive.admits(Polarity::Positive));
        assert!(!Polarity::Positive.admits(Polarity::Negative));
    }
}
