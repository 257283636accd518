//! The searchable list of candidate lipid ions.
use std::fmt::Display;
use std::sync::Arc;

use crate::chemistry::IonizationType;
use crate::feature::Polarity;
use crate::lipid::{ChainParameters, LipidAnnotation, LipidClass};
use crate::tolerance::MzTolerance;

/// A species level lipid annotation under one ionization
#[derive(Debug, Clone, PartialEq)]
pub struct LipidIon {
    pub annotation: Arc<LipidAnnotation>,
    pub ionization: IonizationType,
    pub mz: f64,
}

impl LipidIon {
    pub fn new(annotation: Arc<LipidAnnotation>, ionization: IonizationType) -> Self {
        let mz = ionization.ionize(annotation.formula()).mz();
        Self {
            annotation,
            ionization,
            mz,
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.ionization.polarity()
    }
}

impl Display for LipidIon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({:.4})", self.annotation, self.ionization, self.mz)
    }
}

/// Candidate lipid ions sorted by ascending m/z. Immutable once built and
/// safe to share between search workers.
#[derive(Debug, Clone, Default)]
pub struct LipidDatabase {
    ions: Vec<LipidIon>,
}

impl LipidDatabase {
    /// Wrap `ions`, sorting them by m/z with ties broken on the annotation
    pub fn new(mut ions: Vec<LipidIon>) -> Self {
        ions.sort_by(|a, b| {
            a.mz.total_cmp(&b.mz)
                .then_with(|| a.annotation.annotation().cmp(b.annotation.annotation()))
        });
        Self { ions }
    }

    pub fn len(&self) -> usize {
        self.ions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LipidIon> {
        self.ions.iter()
    }

    pub fn ions(&self) -> &[LipidIon] {
        &self.ions
    }

    /// All ions whose m/z lies in the tolerance window around `mz`
    pub fn ions_within(&self, mz: f64, tolerance: &MzTolerance) -> &[LipidIon] {
        let window = tolerance.window(mz);
        let start = self.ions.partition_point(|ion| ion.mz < window.low);
        let mut end = start;
        while end < self.ions.len() && self.ions[end].mz <= window.high {
            end += 1;
        }
        &self.ions[start..end]
    }
}

impl<'a> IntoIterator for &'a LipidDatabase {
    type Item = &'a LipidIon;
    type IntoIter = std::slice::Iter<'a, LipidIon>;

    fn into_iter(self) -> Self::IntoIter {
        self.ions.iter()
    }
}

/// The ionizations of `class` that survive `exclusions` and can be observed under
/// one of `polarities`. An empty `polarities` admits every ionization.
fn searchable_ionizations(
    class: &LipidClass,
    exclusions: &[IonizationType],
    polarities: &[Polarity],
) -> Vec<IonizationType> {
    class
        .ionizations()
        .into_iter()
        .filter(|ion| !exclusions.contains(ion))
        .filter(|ion| polarities.is_empty() || polarities.iter().any(|p| p.admits(ion.polarity())))
        .collect()
}

/// Enumerate every species level annotation of `classes` within `chain_params`, under
/// every searchable ionization.
///
/// Chain ranges are multiplied by the number of chains a class carries. Totals that are
/// odd when only even chains are allowed, or that carry more double bonds than half
/// their carbons, are skipped.
pub fn build_lipid_database(
    classes: &[Arc<LipidClass>],
    chain_params: &ChainParameters,
    exclusions: &[IonizationType],
    polarities: &[Polarity],
) -> LipidDatabase {
    let mut ions = Vec::new();
    for class in classes {
        let ionizations = searchable_ionizations(class, exclusions, polarities);
        if ionizations.is_empty() {
            log::debug!("No searchable ionizations for {class}");
            continue;
        }
        let totals = chain_params.scaled(class.chain_count() as u16);
        for carbons in totals.min_chain_length..=totals.max_chain_length {
            for dbes in totals.min_dbe..=totals.max_dbe {
                if !totals.is_valid_combination(carbons, dbes) {
                    continue;
                }
                let Some(annotation) = LipidAnnotation::species(class.clone(), carbons, dbes)
                else {
                    continue;
                };
                let annotation = Arc::new(annotation);
                for ionization in ionizations.iter().copied() {
                    ions.push(LipidIon::new(annotation.clone(), ionization));
                }
            }
        }
    }
    let db = LipidDatabase::new(ions);
    log::info!(
        "Built lipid database with {} ions from {} classes",
        db.len(),
        classes.len()
    );
    db
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lipid::catalog;

    #[test_log::test]
    fn test_even_chains_and_dbe_limits() {
        let params = ChainParameters::new(12, 13, 0, 8, true);
        let db = build_lipid_database(catalog::all(), &params, &[], &[]);
        assert!(!db.is_empty());
        for ion in db.iter() {
            let carbons = ion.annotation.carbons();
            let dbes = ion.annotation.dbes();
            assert_eq!(carbons % 2, 0, "{ion}");
            assert!(dbes <= carbons / 2, "{ion}");
        }
        assert!(db.ions().windows(2).all(|w| w[0].mz <= w[1].mz));
    }

    #[test_log::test]
    fn test_ions_within() {
        let pc = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        let db = build_lipid_database(&[pc], &ChainParameters::default(), &[], &[]);

        let hits = db.ions_within(760.5851, &MzTolerance::default());
        assert!(hits
            .iter()
            .any(|i| i.annotation.annotation() == "PC 34:1"
                && i.ionization == IonizationType::PositiveHydrogen));
        assert!(hits.iter().all(|i| (i.mz - 760.5851).abs() < 0.02));
        assert!(db.ions_within(10.0, &MzTolerance::default()).is_empty());
    }

    #[test_log::test]
    fn test_exclusions_and_polarity() {
        let pc = catalog::by_name("Diacylglycerophosphocholines").unwrap();
        let params = ChainParameters::new(16, 18, 0, 1, false);

        let positive = build_lipid_database(&[pc.clone()], &params, &[], &[Polarity::Positive]);
        assert!(positive.iter().all(|i| i.polarity() == Polarity::Positive));

        let no_sodium = build_lipid_database(
            &[pc],
            &params,
            &[IonizationType::Sodium],
            &[],
        );
        assert!(no_sodium.iter().all(|i| i.ionization != IonizationType::Sodium));
        assert!(no_sodium
            .iter()
            .any(|i| i.ionization == IonizationType::Formate));
    }
}
