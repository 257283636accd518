use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::chemistry::{Element, ElementalComposition};

/// The kinds of hydrocarbon chain a lipid carries, ordered the way chains are
/// written in an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LipidChainType {
    SphingolipidMonoHydroxyBackboneChain,
    SphingolipidDiHydroxyBackboneChain,
    SphingolipidTriHydroxyBackboneChain,
    AlkylChain,
    AcylChain,
    AcylMonoHydroxyChain,
    AmidChain,
    AmidMonoHydroxyChain,
    /// Two acyl chains observed as one fragment
    TwoAcylChainsCombined,
}

impl LipidChainType {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SphingolipidMonoHydroxyBackboneChain => {
                "Sphingolipid mono hydroxy backbone chain"
            }
            Self::SphingolipidDiHydroxyBackboneChain => "Sphingolipid di hydroxy backbone chain",
            Self::SphingolipidTriHydroxyBackboneChain => "Sphingolipid tri hydroxy backbone chain",
            Self::AlkylChain => "Alkyl chain",
            Self::AcylChain => "Acyl chain",
            Self::AcylMonoHydroxyChain => "Acyl mono hydroxy chain",
            Self::AmidChain => "Amid chain",
            Self::AmidMonoHydroxyChain => "Amid mono hydroxy chain",
            Self::TwoAcylChainsCombined => "Two acyl chains combined",
        }
    }

    pub const fn is_sphingoid_backbone(&self) -> bool {
        matches!(
            self,
            Self::SphingolipidMonoHydroxyBackboneChain
                | Self::SphingolipidDiHydroxyBackboneChain
                | Self::SphingolipidTriHydroxyBackboneChain
        )
    }

    const fn extra_hydrogens(&self) -> i32 {
        match self {
            Self::AlkylChain => 2,
            Self::SphingolipidMonoHydroxyBackboneChain
            | Self::SphingolipidDiHydroxyBackboneChain
            | Self::SphingolipidTriHydroxyBackboneChain => 3,
            _ => 0,
        }
    }

    const fn oxygens(&self) -> i32 {
        match self {
            Self::AlkylChain | Self::SphingolipidMonoHydroxyBackboneChain => 1,
            Self::AcylChain
            | Self::AmidChain
            | Self::TwoAcylChainsCombined
            | Self::SphingolipidDiHydroxyBackboneChain => 2,
            Self::AcylMonoHydroxyChain
            | Self::AmidMonoHydroxyChain
            | Self::SphingolipidTriHydroxyBackboneChain => 3,
        }
    }

    const fn nitrogens(&self) -> i32 {
        if self.is_sphingoid_backbone() {
            1
        } else {
            0
        }
    }

    /// The heteroatoms and extra hydrogens a chain of this type contributes on top of
    /// its `CnH(2n-2d)` hydrocarbon skeleton
    pub fn functional_group(&self) -> ElementalComposition {
        ElementalComposition::from_counts(&[
            (Element::H, self.extra_hydrogens()),
            (Element::N, self.nitrogens()),
            (Element::O, self.oxygens()),
        ])
    }

    /// The formula of the free chain, an acid for acyl and amide chains, an
    /// alcohol for alkyl chains, and a sphingoid base for backbone chains
    pub fn formula(&self, carbons: u16, dbes: u16) -> ElementalComposition {
        let mut comp = ElementalComposition::from_counts(&[
            (Element::C, carbons as i32),
            (Element::H, 2 * carbons as i32 - 2 * dbes as i32),
        ]);
        comp += &self.functional_group();
        comp
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::AcylMonoHydroxyChain
            | Self::AmidMonoHydroxyChain
            | Self::SphingolipidMonoHydroxyBackboneChain => ";O",
            Self::SphingolipidDiHydroxyBackboneChain => ";O2",
            Self::SphingolipidTriHydroxyBackboneChain => ";O3",
            _ => "",
        }
    }
}

impl Display for LipidChainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The ranges chains are enumerated over when building candidates and when
/// looking for chain fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChainParameters {
    pub min_chain_length: u16,
    pub max_chain_length: u16,
    pub min_dbe: u16,
    pub max_dbe: u16,
    pub only_even_chains: bool,
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self {
            min_chain_length: 12,
            max_chain_length: 26,
            min_dbe: 0,
            max_dbe: 6,
            only_even_chains: false,
        }
    }
}

impl ChainParameters {
    pub fn new(
        min_chain_length: u16,
        max_chain_length: u16,
        min_dbe: u16,
        max_dbe: u16,
        only_even_chains: bool,
    ) -> Self {
        Self {
            min_chain_length,
            max_chain_length,
            min_dbe,
            max_dbe,
            only_even_chains,
        }
    }

    /// The same ranges multiplied by `factor`, the totals of a lipid carrying `factor` chains
    pub fn scaled(&self, factor: u16) -> Self {
        Self {
            min_chain_length: self.min_chain_length * factor,
            max_chain_length: self.max_chain_length * factor,
            min_dbe: self.min_dbe * factor,
            max_dbe: self.max_dbe * factor,
            only_even_chains: self.only_even_chains,
        }
    }

    /// Whether a chain of `carbons` length with `dbes` double bonds is physically valid
    /// and falls within these ranges
    pub fn is_valid_combination(&self, carbons: u16, dbes: u16) -> bool {
        carbons > 0
            && (!self.only_even_chains || carbons % 2 == 0)
            && dbes <= carbons / 2
            && (self.min_chain_length..=self.max_chain_length).contains(&carbons)
            && (self.min_dbe..=self.max_dbe).contains(&dbes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LipidChain {
    pub chain_type: LipidChainType,
    pub carbons: u16,
    pub dbes: u16,
}

impl LipidChain {
    pub fn new(chain_type: LipidChainType, carbons: u16, dbes: u16) -> Self {
        Self {
            chain_type,
            carbons,
            dbes,
        }
    }

    pub fn formula(&self) -> ElementalComposition {
        self.chain_type.formula(self.carbons, self.dbes)
    }

    pub fn mass(&self) -> f64 {
        self.formula().monoisotopic_mass()
    }
}

impl Display for LipidChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if matches!(self.chain_type, LipidChainType::AlkylChain) {
            f.write_str("O-")?;
        }
        write!(
            f,
            "{}:{}{}",
            self.carbons,
            self.dbes,
            self.chain_type.suffix()
        )
    }
}

/// Enumerate every chain of `chain_type` allowed by `params`
pub fn build_chains_in_range(
    chain_type: LipidChainType,
    params: &ChainParameters,
) -> Vec<LipidChain> {
    let mut chains = Vec::new();
    for carbons in params.min_chain_length..=params.max_chain_length {
        for dbes in params.min_dbe..=params.max_dbe {
            if params.is_valid_combination(carbons, dbes) {
                chains.push(LipidChain::new(chain_type, carbons, dbes));
            }
        }
    }
    chains
}

#[cfg(test)]
mod test {
    use super::*;

    #[test_log::test]
    fn test_chain_formulas() {
        let acyl = LipidChain::new(LipidChainType::AcylChain, 16, 0);
        assert_eq!(acyl.formula().to_string(), "C16H32O2");
        let alkyl = LipidChain::new(LipidChainType::AlkylChain, 16, 0);
        assert_eq!(alkyl.formula().to_string(), "C16H34O");
        let sphingoid = LipidChain::new(LipidChainType::SphingolipidDiHydroxyBackboneChain, 18, 1);
        assert_eq!(sphingoid.formula().to_string(), "C18H37NO2");
        let hydroxy = LipidChain::new(LipidChainType::AcylMonoHydroxyChain, 18, 1);
        assert_eq!(hydroxy.formula().to_string(), "C18H34O3");
    }

    #[test_log::test]
    fn test_chain_notation() {
        assert_eq!(LipidChain::new(LipidChainType::AcylChain, 18, 1).to_string(), "18:1");
        assert_eq!(LipidChain::new(LipidChainType::AlkylChain, 16, 0).to_string(), "O-16:0");
        assert_eq!(
            LipidChain::new(LipidChainType::SphingolipidDiHydroxyBackboneChain, 18, 1).to_string(),
            "18:1;O2"
        );
    }

    #[test_log::test]
    fn test_chain_range() {
        let params = ChainParameters::new(2, 6, 0, 4, true);
        let chains = build_chains_in_range(LipidChainType::AcylChain, &params);
        assert!(chains.iter().all(|c| c.carbons % 2 == 0));
        assert!(chains.iter().all(|c| c.dbes <= c.carbons / 2));
        // 2:0 2:1 4:0 4:1 4:2 6:0 6:1 6:2 6:3
        assert_eq!(chains.len(), 9);
    }
}
