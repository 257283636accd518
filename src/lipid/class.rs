use std::fmt::Display;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::chain::LipidChainType;
use crate::chemistry::{ElementalComposition, FormulaError, IonizationType};
use crate::feature::Polarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LipidCategory {
    FattyAcyls,
    Glycerolipids,
    Glycerophospholipids,
    Sphingolipids,
    SterolLipids,
    PrenolLipids,
    Saccharolipids,
    Polyketides,
}

impl LipidCategory {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FattyAcyls => "Fatty Acyls",
            Self::Glycerolipids => "Glycerolipids",
            Self::Glycerophospholipids => "Glycerophospholipids",
            Self::Sphingolipids => "Sphingolipids",
            Self::SterolLipids => "Sterol Lipids",
            Self::PrenolLipids => "Prenol Lipids",
            Self::Saccharolipids => "Saccharolipids",
            Self::Polyketides => "Polyketides",
        }
    }

    pub const fn abbreviation(&self) -> &'static str {
        match self {
            Self::FattyAcyls => "FA",
            Self::Glycerolipids => "GL",
            Self::Glycerophospholipids => "GP",
            Self::Sphingolipids => "SP",
            Self::SterolLipids => "ST",
            Self::PrenolLipids => "PR",
            Self::Saccharolipids => "SL",
            Self::Polyketides => "PK",
        }
    }
}

impl Display for LipidCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How finely a lipid's structure is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LipidAnnotationLevel {
    /// Class and chain totals, e.g. `PC 34:1`
    SpeciesLevel,
    /// Individual chains, e.g. `PC 16:0_18:1`
    MolecularSpeciesLevel,
}

/// What a fragmentation rule predicts and how to compute its m/z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LipidFragmentationRuleType {
    Precursor,
    HeadgroupFragment,
    HeadgroupFragmentNL,
    AcylChainFragment,
    AcylChainFragmentNL,
    AcylChainMinusFormulaFragment,
    AcylChainMinusFormulaFragmentNL,
    AcylChainPlusFormulaFragment,
    AcylChainPlusFormulaFragmentNL,
    TwoAcylChainsPlusFormulaFragment,
    AlkylChainFragment,
    AlkylChainPlusFormulaFragment,
    AmidChainFragment,
    AmidChainFragmentNL,
    AmidChainPlusFormulaFragment,
    AmidChainMinusFormulaFragment,
    AmidChainPlusFormulaFragmentNL,
    AmidChainMinusFormulaFragmentNL,
    AmidMonoHydroxyChainFragment,
    AmidMonoHydroxyChainPlusFormulaFragment,
    AmidMonoHydroxyChainMinusFormulaFragment,
    SphingolipidMonoHydroxyBackboneChainFragment,
    SphingolipidMonoHydroxyBackboneChainMinusFormulaFragment,
    SphingolipidDiHydroxyBackboneChainFragment,
    SphingolipidDiHydroxyBackboneChainMinusFormulaFragment,
    SphingolipidTriHydroxyBackboneChainFragment,
    SphingolipidTriHydroxyBackboneChainMinusFormulaFragment,
}

/// A predicted fragment of a lipid class under one ionization.
///
/// The formula is kept as written so that malformed user-supplied rules can be
/// reported and skipped where they are applied instead of failing the whole class.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LipidFragmentationRule {
    pub polarity: Polarity,
    pub ionization: IonizationType,
    pub rule_type: Option<LipidFragmentationRuleType>,
    pub level: Option<LipidAnnotationLevel>,
    pub formula: Option<String>,
}

impl LipidFragmentationRule {
    /// A rule declaring only that the class ionizes this way
    pub fn ionization_only(ionization: IonizationType) -> Self {
        Self {
            polarity: ionization.polarity(),
            ionization,
            rule_type: None,
            level: None,
            formula: None,
        }
    }

    pub fn new(
        ionization: IonizationType,
        rule_type: LipidFragmentationRuleType,
        level: LipidAnnotationLevel,
    ) -> Self {
        Self {
            polarity: ionization.polarity(),
            ionization,
            rule_type: Some(rule_type),
            level: Some(level),
            formula: None,
        }
    }

    pub fn with_formula<S: Into<String>>(mut self, formula: S) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn parsed_formula(&self) -> Option<Result<ElementalComposition, FormulaError>> {
        self.formula.as_deref().map(|f| f.parse())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LipidClassError {
    #[error("Lipid class {0} must declare at least one chain")]
    NoChains(String),
    #[error("Lipid class {0} must declare at least one ionization")]
    NoIonizations(String),
    #[error("Invalid formula in lipid class {0}: {1}")]
    InvalidFormula(String, #[source] FormulaError),
}

/// A structural lipid class: its backbone, the chains it carries and how it fragments
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LipidClass {
    pub name: String,
    pub abbr: String,
    pub category: LipidCategory,
    pub backbone: ElementalComposition,
    pub chain_types: Vec<LipidChainType>,
    pub rules: Vec<LipidFragmentationRule>,
}

impl LipidClass {
    /// Build a class whose backbone formula is known to be well formed
    pub(crate) fn builtin(
        name: &str,
        abbr: &str,
        category: LipidCategory,
        backbone: ElementalComposition,
        chain_types: Vec<LipidChainType>,
        rules: Vec<LipidFragmentationRule>,
    ) -> Self {
        Self {
            name: name.to_string(),
            abbr: abbr.to_string(),
            category,
            backbone,
            chain_types,
            rules,
        }
    }

    /// Build a user-defined class, checking the backbone and every rule formula
    pub fn custom(
        name: &str,
        abbr: &str,
        category: LipidCategory,
        backbone: &str,
        chain_types: Vec<LipidChainType>,
        rules: Vec<LipidFragmentationRule>,
    ) -> Result<Self, LipidClassError> {
        if chain_types.is_empty() {
            return Err(LipidClassError::NoChains(name.to_string()));
        }
        if rules.is_empty() {
            return Err(LipidClassError::NoIonizations(name.to_string()));
        }
        let backbone: ElementalComposition = backbone
            .parse()
            .map_err(|e| LipidClassError::InvalidFormula(name.to_string(), e))?;
        for rule in rules.iter() {
            if let Some(Err(e)) = rule.parsed_formula() {
                return Err(LipidClassError::InvalidFormula(name.to_string(), e));
            }
        }
        Ok(Self::builtin(name, abbr, category, backbone, chain_types, rules))
    }

    pub fn chain_count(&self) -> usize {
        self.chain_types.len()
    }

    pub fn has_chain_type(&self, chain_type: LipidChainType) -> bool {
        self.chain_types.contains(&chain_type)
    }

    /// The ionizations this class has rules for, without duplicates and in a fixed order
    pub fn ionizations(&self) -> Vec<IonizationType> {
        let mut ions: Vec<_> = self.rules.iter().map(|r| r.ionization).collect();
        ions.sort();
        ions.dedup();
        ions
    }

    pub fn rules_for(
        &self,
        ionization: IonizationType,
    ) -> impl Iterator<Item = &LipidFragmentationRule> + '_ {
        self.rules
            .iter()
            .filter(move |r| r.ionization == ionization && r.rule_type.is_some())
    }

    /// The chain types sorted into a canonical order for comparison
    pub fn sorted_chain_types(&self) -> Vec<LipidChainType> {
        let mut types = self.chain_types.clone();
        types.sort();
        types
    }
}

impl Display for LipidClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.abbr)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test]
    fn test_custom_class_validation() {
        let rules = vec![LipidFragmentationRule::new(
            IonizationType::PositiveHydrogen,
            LipidFragmentationRuleType::HeadgroupFragment,
            LipidAnnotationLevel::SpeciesLevel,
        )
        .with_formula("C5H15NO4P+")];

        let cls = LipidClass::custom(
            "Test phosphocholines",
            "TPC",
            LipidCategory::Glycerophospholipids,
            "C8H20O6PN",
            vec![LipidChainType::AcylChain, LipidChainType::AcylChain],
            rules.clone(),
        )
        .unwrap();
        assert_eq!(cls.ionizations(), vec![IonizationType::PositiveHydrogen]);

        let err = LipidClass::custom(
            "Broken",
            "B",
            LipidCategory::Glycerophospholipids,
            "C8H20Q6",
            vec![LipidChainType::AcylChain],
            rules.clone(),
        );
        assert!(matches!(err, Err(LipidClassError::InvalidFormula(..))));

        let err = LipidClass::custom(
            "Chainless",
            "C",
            LipidCategory::Glycerophospholipids,
            "C8H20O6PN",
            vec![],
            rules,
        );
        assert!(matches!(err, Err(LipidClassError::NoChains(_))));
    }
}
