use std::fmt::Display;
use std::sync::Arc;

use super::chain::{LipidChain, LipidChainType};
use super::class::{LipidAnnotationLevel, LipidCategory, LipidClass};
use crate::chemistry::{Element, ElementalComposition};

fn water() -> ElementalComposition {
    ElementalComposition::from_counts(&[(Element::H, 2), (Element::O, 1)])
}

fn hydroxyl_count(chain_type: LipidChainType) -> u16 {
    match chain_type {
        LipidChainType::AcylMonoHydroxyChain
        | LipidChainType::AmidMonoHydroxyChain
        | LipidChainType::SphingolipidMonoHydroxyBackboneChain => 1,
        LipidChainType::SphingolipidDiHydroxyBackboneChain => 2,
        LipidChainType::SphingolipidTriHydroxyBackboneChain => 3,
        _ => 0,
    }
}

fn oxygen_suffix(n: u16) -> String {
    match n {
        0 => String::new(),
        1 => ";O".to_string(),
        n => format!(";O{n}"),
    }
}

/// A lipid resolved to its class and chain totals
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesLevelAnnotation {
    pub class: Arc<LipidClass>,
    pub carbons: u16,
    pub dbes: u16,
    pub formula: ElementalComposition,
    annotation: String,
}

/// A lipid resolved to its class and each of its chains
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularSpeciesLevelAnnotation {
    pub class: Arc<LipidClass>,
    pub chains: Vec<LipidChain>,
    pub formula: ElementalComposition,
    annotation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LipidAnnotation {
    Species(SpeciesLevelAnnotation),
    MolecularSpecies(MolecularSpeciesLevelAnnotation),
}

impl LipidAnnotation {
    /// Build the species level annotation of `class` with `carbons` total chain carbons
    /// and `dbes` total double bonds, or `None` if the composition cannot exist
    pub fn species(class: Arc<LipidClass>, carbons: u16, dbes: u16) -> Option<Self> {
        if class.chain_types.is_empty() || carbons == 0 || dbes > carbons / 2 {
            return None;
        }
        let n_chains = class.chain_count() as i32;
        let mut formula = class.backbone;
        formula.add_element(Element::C, carbons as i32);
        formula.add_element(Element::H, 2 * carbons as i32 - 2 * dbes as i32);
        for chain_type in class.chain_types.iter() {
            formula += &chain_type.functional_group();
        }
        let mut waters = water();
        waters.add_element(Element::H, 2 * (n_chains - 1));
        waters.add_element(Element::O, n_chains - 1);
        formula -= &waters;

        let prefix = if class.has_chain_type(LipidChainType::AlkylChain) {
            "O-"
        } else {
            ""
        };
        let oxygens: u16 = class.chain_types.iter().map(|c| hydroxyl_count(*c)).sum();
        let annotation = format!(
            "{} {}{}:{}{}",
            class.abbr,
            prefix,
            carbons,
            dbes,
            oxygen_suffix(oxygens)
        );
        Some(Self::Species(SpeciesLevelAnnotation {
            class,
            carbons,
            dbes,
            formula,
            annotation,
        }))
    }

    /// Build the molecular species level annotation of `class` from `chains`, which
    /// are put into canonical order first
    pub fn molecular_species(
        class: Arc<LipidClass>,
        mut chains: Vec<LipidChain>,
    ) -> Option<Self> {
        if chains.is_empty() || chains.len() != class.chain_count() {
            return None;
        }
        chains.sort();
        let mut formula = class.backbone;
        for chain in chains.iter() {
            formula += &chain.formula();
            formula -= &water();
        }

        let separator = if matches!(class.category, LipidCategory::Sphingolipids) {
            "/"
        } else {
            "_"
        };
        let chain_text = chains
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(separator);
        let annotation = format!("{} {}", class.abbr, chain_text);
        Some(Self::MolecularSpecies(MolecularSpeciesLevelAnnotation {
            class,
            chains,
            formula,
            annotation,
        }))
    }

    pub fn class(&self) -> &Arc<LipidClass> {
        match self {
            Self::Species(a) => &a.class,
            Self::MolecularSpecies(a) => &a.class,
        }
    }

    /// The neutral formula
    pub fn formula(&self) -> &ElementalComposition {
        match self {
            Self::Species(a) => &a.formula,
            Self::MolecularSpecies(a) => &a.formula,
        }
    }

    pub fn neutral_mass(&self) -> f64 {
        self.formula().monoisotopic_mass()
    }

    /// The identity string, e.g. `PC 34:1` or `PC 16:0_18:1`
    pub fn annotation(&self) -> &str {
        match self {
            Self::Species(a) => &a.annotation,
            Self::MolecularSpecies(a) => &a.annotation,
        }
    }

    pub fn level(&self) -> LipidAnnotationLevel {
        match self {
            Self::Species(_) => LipidAnnotationLevel::SpeciesLevel,
            Self::MolecularSpecies(_) => LipidAnnotationLevel::MolecularSpeciesLevel,
        }
    }

    pub fn carbons(&self) -> u16 {
        match self {
            Self::Species(a) => a.carbons,
            Self::MolecularSpecies(a) => a.chains.iter().map(|c| c.carbons).sum(),
        }
    }

    pub fn dbes(&self) -> u16 {
        match self {
            Self::Species(a) => a.dbes,
            Self::MolecularSpecies(a) => a.chains.iter().map(|c| c.dbes).sum(),
        }
    }

    pub fn chains(&self) -> &[LipidChain] {
        match self {
            Self::Species(_) => &[],
            Self::MolecularSpecies(a) => &a.chains,
        }
    }

    /// Collapse the chains into their totals
    pub fn to_species_level(&self) -> Option<Self> {
        match self {
            Self::Species(_) => Some(self.clone()),
            Self::MolecularSpecies(a) => {
                Self::species(a.class.clone(), self.carbons(), self.dbes())
            }
        }
    }
}

impl Display for LipidAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.annotation())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chemistry::IonizationType;
    use crate::lipid::catalog;
    use crate::lipid::LipidChainType::*;

    fn cls(name: &str) -> Arc<LipidClass> {
        catalog::by_name(name).unwrap()
    }

    #[test_log::test]
    fn test_glycerophospholipid_species() {
        let pc = LipidAnnotation::species(cls("Diacylglycerophosphocholines"), 34, 1).unwrap();
        assert_eq!(pc.annotation(), "PC 34:1");
        assert_eq!(pc.formula().to_string(), "C42H82NO8P");
        let mz = IonizationType::PositiveHydrogen.ionize(pc.formula()).mz();
        assert!((mz - 760.5851).abs() < 1e-3, "{mz}");

        let ether =
            LipidAnnotation::species(cls("Alkylacylglycerophosphocholines"), 34, 1).unwrap();
        assert_eq!(ether.annotation(), "PC O-34:1");
        assert_eq!(ether.formula().to_string(), "C42H84NO7P");
    }

    #[test_log::test]
    fn test_neutral_lipids() {
        let tg = LipidAnnotation::species(cls("Triacylglycerols"), 52, 2).unwrap();
        let mz = IonizationType::Ammonium.ionize(tg.formula()).mz();
        assert!((mz - 876.8015).abs() < 1e-3, "{mz}");

        let ce = LipidAnnotation::species(cls("Cholesterol esters"), 18, 1).unwrap();
        assert_eq!(ce.formula().to_string(), "C45H78O2");
        let mz = IonizationType::Ammonium.ionize(ce.formula()).mz();
        assert!((mz - 668.6344).abs() < 1e-3, "{mz}");

        let fa = LipidAnnotation::species(cls("Free fatty acids"), 18, 1).unwrap();
        let mz = IonizationType::NegativeHydrogen.ionize(fa.formula()).mz();
        assert!((mz - 281.2486).abs() < 1e-3, "{mz}");

        let car = LipidAnnotation::species(cls("Fatty acyl carnitines"), 16, 0).unwrap();
        let mz = IonizationType::Positive.ionize(car.formula()).mz();
        assert!((mz - 400.3421).abs() < 1e-3, "{mz}");
    }

    #[test_log::test]
    fn test_sphingolipids() {
        let cer = LipidAnnotation::species(cls("Ceramides"), 34, 1).unwrap();
        assert_eq!(cer.annotation(), "Cer 34:1;O2");
        assert_eq!(cer.formula().to_string(), "C34H67NO3");

        let sm = cls("Ceramide phosphocholines (sphingomyelins)");
        let species = LipidAnnotation::species(sm.clone(), 34, 1).unwrap();
        assert_eq!(species.formula().to_string(), "C39H79N2O6P");
        let mz = IonizationType::PositiveHydrogen.ionize(species.formula()).mz();
        assert!((mz - 703.5749).abs() < 1e-3, "{mz}");

        let molecular = LipidAnnotation::molecular_species(
            sm,
            vec![
                LipidChain::new(AmidChain, 16, 0),
                LipidChain::new(SphingolipidDiHydroxyBackboneChain, 18, 1),
            ],
        )
        .unwrap();
        assert_eq!(molecular.annotation(), "SM 18:1;O2/16:0");
        assert_eq!(molecular.formula(), species.formula());
        assert_eq!(molecular.to_species_level().unwrap(), species);
    }

    #[test_log::test]
    fn test_molecular_species_canonical_order() {
        let pc = cls("Diacylglycerophosphocholines");
        let a = LipidAnnotation::molecular_species(
            pc.clone(),
            vec![LipidChain::new(AcylChain, 18, 1), LipidChain::new(AcylChain, 16, 0)],
        )
        .unwrap();
        let b = LipidAnnotation::molecular_species(
            pc.clone(),
            vec![LipidChain::new(AcylChain, 16, 0), LipidChain::new(AcylChain, 18, 1)],
        )
        .unwrap();
        assert_eq!(a.annotation(), "PC 16:0_18:1");
        assert_eq!(a, b);
        assert_eq!(a.carbons(), 34);
        assert_eq!(a.dbes(), 1);
        assert!(
            LipidAnnotation::molecular_species(pc, vec![LipidChain::new(AcylChain, 16, 0)])
                .is_none()
        );
    }

    #[test_log::test]
    fn test_invalid_species() {
        let pc = cls("Diacylglycerophosphocholines");
        assert!(LipidAnnotation::species(pc.clone(), 0, 0).is_none());
        assert!(LipidAnnotation::species(pc, 10, 6).is_none());
    }
}
