use std::cmp::Ordering;

use thiserror::Error;

use super::attributes::{AttributeValue, MatchDeviations};
use crate::chemistry::{Element, ElementalComposition, IonType};
use crate::feature::IsotopePattern;
use crate::impl_param_described;
use crate::params::{push_value, AttributeExport, ParamList, Unit};

/// Raised when a compound carries none of the fields its mass could be derived from
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "Cannot determine the mass of {name}: it has no precursor m/z with a defined adduct, \
     no neutral mass and no usable formula"
)]
pub struct CannotDetermineMass {
    pub name: String,
}

/// An entry of a compound database, possibly already ionized and matched.
///
/// The well known attributes are typed fields. Anything else a database provides
/// goes in [`CompoundDbAnnotation::params`].
#[derive(Debug, Clone, Default)]
pub struct CompoundDbAnnotation {
    pub name: Option<String>,
    pub formula: Option<String>,
    pub smiles: Option<String>,
    pub inchi_key: Option<String>,
    pub neutral_mass: Option<f64>,
    pub precursor_mz: Option<f64>,
    pub adduct: Option<IonType>,
    pub rt: AttributeValue<f32>,
    pub mobility: AttributeValue<f32>,
    pub ccs: AttributeValue<f32>,
    pub ri: AttributeValue<f32>,
    pub database: Option<String>,
    /// The alignment score assigned when matched to a feature
    pub score: Option<f32>,
    /// A confidence score from an external tool, e.g. in-silico fragmentation
    pub external_score: Option<f32>,
    pub isotope_pattern: Option<IsotopePattern>,
    pub isotope_score: Option<f32>,
    pub deviations: MatchDeviations,
    pub params: ParamList,
}

impl_param_described!(CompoundDbAnnotation);

impl CompoundDbAnnotation {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_formula<S: Into<String>>(mut self, formula: S) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_neutral_mass(mut self, mass: f64) -> Self {
        self.neutral_mass = Some(mass);
        self
    }

    pub fn with_precursor(mut self, mz: f64, adduct: IonType) -> Self {
        self.precursor_mz = Some(mz);
        self.adduct = Some(adduct);
        self
    }

    /// `rt <= 0` is stored as a wildcard
    pub fn with_rt(mut self, rt: f32) -> Self {
        self.rt = AttributeValue::from_raw(rt);
        self
    }

    pub fn with_mobility(mut self, mobility: f32) -> Self {
        self.mobility = AttributeValue::from_raw(mobility);
        self
    }

    pub fn with_ccs(mut self, ccs: f32) -> Self {
        self.ccs = AttributeValue::from_raw(ccs);
        self
    }

    pub fn with_ri(mut self, ri: f32) -> Self {
        self.ri = AttributeValue::from_raw(ri);
        self
    }

    pub fn with_external_score(mut self, score: f32) -> Self {
        self.external_score = Some(score);
        self
    }

    pub fn with_isotope_score(mut self, score: f32) -> Self {
        self.isotope_score = Some(score);
        self
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.formula.clone())
            .unwrap_or_else(|| "unnamed compound".to_string())
    }

    fn formula_neutral_mass(&self) -> Option<f64> {
        let formula = self.formula.as_deref()?;
        match formula.parse::<ElementalComposition>() {
            Ok(comp) => {
                // A charged formula is taken as the protonated or deprotonated molecule
                let mut neutral = comp.neutral();
                neutral.add_element(Element::H, -comp.charge);
                Some(neutral.monoisotopic_mass())
            }
            Err(e) => {
                log::debug!("Cannot use formula {formula} of {}: {e}", self.display_name());
                None
            }
        }
    }

    /// The neutral mass from the precursor m/z and adduct, the stored neutral
    /// mass, or the formula, in that order of preference
    pub fn calc_neutral_mass(&self) -> Option<f64> {
        if let (Some(mz), Some(adduct)) = (self.precursor_mz, self.adduct.as_ref()) {
            if !adduct.is_undefined() {
                return Some(adduct.neutral_mass(mz));
            }
        }
        self.neutral_mass.or_else(|| self.formula_neutral_mass())
    }

    pub fn calc_mz_for_adduct(&self, adduct: &IonType) -> Result<f64, CannotDetermineMass> {
        self.calc_neutral_mass()
            .map(|mass| adduct.mz(mass))
            .ok_or_else(|| CannotDetermineMass {
                name: self.display_name(),
            })
    }

    /// A copy of this compound ionized by `adduct`
    pub fn ionize(&self, adduct: &IonType) -> Result<Self, CannotDetermineMass> {
        let mz = self.calc_mz_for_adduct(adduct)?;
        let mut ion = self.clone();
        if ion.neutral_mass.is_none() {
            ion.neutral_mass = self.calc_neutral_mass();
        }
        ion.precursor_mz = Some(mz);
        ion.adduct = Some(adduct.clone());
        Ok(ion)
    }

    /// Whether this entry can be compared to a feature by mass
    pub fn is_base_annotation_valid(&self) -> bool {
        self.precursor_mz.is_some() && self.calc_neutral_mass().is_some()
    }

    /// Order by score, highest first, with unscored compounds last
    pub fn compare_by_score(&self, other: &Self) -> Ordering {
        match (self.score, other.score) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl AttributeExport for CompoundDbAnnotation {
    fn attributes(&self) -> ParamList {
        let mut params = ParamList::new();
        push_value(&mut params, "compound_name", self.name.as_ref(), Unit::Unknown);
        push_value(&mut params, "formula", self.formula.as_ref(), Unit::Unknown);
        push_value(&mut params, "smiles", self.smiles.as_ref(), Unit::Unknown);
        push_value(&mut params, "inchi_key", self.inchi_key.as_ref(), Unit::Unknown);
        push_value(&mut params, "neutral_mass", self.neutral_mass, Unit::Mass);
        push_value(&mut params, "precursor_mz", self.precursor_mz, Unit::MZ);
        push_value(&mut params, "adduct", self.adduct.as_ref(), Unit::Unknown);
        push_value(&mut params, "rt", self.rt.measured(), Unit::Minute);
        push_value(
            &mut params,
            "mobility",
            self.mobility.measured(),
            Unit::VoltSecondPerSquareCentimeter,
        );
        push_value(&mut params, "ccs", self.ccs.measured(), Unit::SquareAngstrom);
        push_value(&mut params, "ri", self.ri.measured(), Unit::Dimensionless);
        push_value(&mut params, "database", self.database.as_ref(), Unit::Unknown);
        push_value(&mut params, "score", self.score, Unit::Dimensionless);
        push_value(&mut params, "external_score", self.external_score, Unit::Dimensionless);
        push_value(&mut params, "isotope_score", self.isotope_score, Unit::Dimensionless);
        let dev = &self.deviations;
        push_value(&mut params, "mz_diff_ppm", dev.mz_ppm, Unit::PartsPerMillion);
        push_value(&mut params, "mz_diff", dev.mz_abs, Unit::MZ);
        push_value(&mut params, "rt_relative_error", dev.rt_relative, Unit::Percent);
        push_value(&mut params, "rt_abs_error", dev.rt_abs, Unit::Minute);
        push_value(
            &mut params,
            "mobility_abs_error",
            dev.mobility_abs,
            Unit::VoltSecondPerSquareCentimeter,
        );
        push_value(&mut params, "ccs_relative_error", dev.ccs_relative, Unit::Dimensionless);
        push_value(&mut params, "ri_diff", dev.ri_diff, Unit::Dimensionless);
        params.extend(self.params.iter().cloned());
        params
    }
}

/// Ionize every compound with every defined adduct. Compounds whose mass cannot be
/// determined are logged and skipped.
pub fn build_compounds_with_adducts(
    compounds: &[CompoundDbAnnotation],
    adducts: &[IonType],
) -> Vec<CompoundDbAnnotation> {
    let adducts: Vec<&IonType> = adducts.iter().filter(|a| !a.is_undefined()).collect();
    let mut ions = Vec::with_capacity(compounds.len() * adducts.len());
    for compound in compounds {
        for adduct in adducts.iter() {
            match compound.ionize(adduct) {
                Ok(ion) => ions.push(ion),
                Err(e) => {
                    log::warn!("Skipping {adduct} of {}: {e}", compound.display_name());
                }
            }
        }
    }
    ions
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::params::{Param, ParamDescribed};

    #[test_log::test]
    fn test_neutral_mass_preference() {
        let c = CompoundDbAnnotation::new("glucose").with_formula("C6H12O6");
        let mass = c.calc_neutral_mass().unwrap();
        assert!((mass - 180.06339).abs() < 1e-4);

        let c = c.with_neutral_mass(100.0);
        assert_eq!(c.calc_neutral_mass(), Some(100.0));

        let ion = IonType::protonated();
        let c = c.with_precursor(ion.mz(200.0), ion);
        assert!((c.calc_neutral_mass().unwrap() - 200.0).abs() < 1e-9);

        let charged = CompoundDbAnnotation::new("choline").with_formula("C5H14NO+");
        let mass = charged.calc_neutral_mass().unwrap();
        assert!((mass - 103.09971).abs() < 1e-4);
    }

    #[test_log::test]
    fn test_build_with_adducts_skips_unusable() {
        let compounds = vec![
            CompoundDbAnnotation::new("glucose").with_formula("C6H12O6"),
            CompoundDbAnnotation::new("mystery"),
        ];
        let adducts = vec![IonType::protonated(), IonType::sodiated(), IonType::undefined()];
        let ions = build_compounds_with_adducts(&compounds, &adducts);
        assert_eq!(ions.len(), 2);
        assert!(ions.iter().all(|i| i.name.as_deref() == Some("glucose")));
        assert!((ions[0].precursor_mz.unwrap() - 181.07066).abs() < 1e-4);
        assert!(ions.iter().all(|i| i.is_base_annotation_valid()));
        assert!(matches!(
            compounds[1].ionize(&IonType::protonated()),
            Err(CannotDetermineMass { .. })
        ));
    }

    #[test_log::test]
    fn test_clone_isolation() {
        let mut original = CompoundDbAnnotation::new("caffeine")
            .with_formula("C8H10N4O2")
            .with_rt(5.0);
        original.add_param(Param::new_key_value("source", "library"));

        let mut copy = original.clone();
        copy.rt = AttributeValue::Measured(7.5);
        copy.name = Some("changed".to_string());
        copy.set_param(Param::new_key_value("source", "edited"));
        copy.add_param(Param::new_key_value("extra", 1));

        assert_eq!(original.rt, AttributeValue::Measured(5.0));
        assert_eq!(original.name.as_deref(), Some("caffeine"));
        assert_eq!(original.params().len(), 1);
        assert_eq!(original.get_param_by_name("source").unwrap().value, "library");
    }

    #[test_log::test]
    fn test_score_ordering_and_export() {
        let mut a = CompoundDbAnnotation::new("a");
        a.score = Some(0.5);
        let mut b = CompoundDbAnnotation::new("b");
        b.score = Some(0.9);
        let c = CompoundDbAnnotation::new("c");
        let mut all = vec![a.clone(), c.clone(), b.clone()];
        all.sort_by(|x, y| x.compare_by_score(y));
        let names: Vec<_> = all.iter().map(|x| x.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);

        let text = b.to_full_string();
        assert_eq!(text, "compound_name: b; score: 0.9");
    }
}
