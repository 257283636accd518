use std::sync::Arc;

use mzpeaks::prelude::*;
use mzpeaks::CentroidPeak;

use super::LipidFragment;
use crate::chemistry::{ElementalComposition, IonizationType};
use crate::feature::{FragmentSpectrum, Polarity};
use crate::lipid::{
    build_chains_in_range, ChainParameters, LipidAnnotation, LipidChain, LipidChainType,
    LipidFragmentationRule, LipidFragmentationRuleType,
};
use crate::tolerance::MzTolerance;

/// How a chain-derived fragment relates to the chain formula and to the precursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainIon {
    /// The chain, deprotonated
    Deprotonated,
    /// The chain with a single charge
    Charged,
    /// The precursor having lost the chain
    NeutralLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormulaShift {
    None,
    Plus,
    Minus,
}

/// The chain type, ion kind and formula shift of a chain fragment rule
fn chain_rule_shape(
    rule_type: LipidFragmentationRuleType,
) -> Option<(LipidChainType, ChainIon, FormulaShift)> {
    use ChainIon as I;
    use FormulaShift as S;
    use LipidChainType as C;
    use LipidFragmentationRuleType::*;

    let shape = match rule_type {
        AcylChainFragment => (C::AcylChain, I::Deprotonated, S::None),
        AcylChainFragmentNL => (C::AcylChain, I::NeutralLoss, S::None),
        AcylChainMinusFormulaFragment => (C::AcylChain, I::Charged, S::Minus),
        AcylChainMinusFormulaFragmentNL => (C::AcylChain, I::NeutralLoss, S::Minus),
        AcylChainPlusFormulaFragment => (C::AcylChain, I::Charged, S::Plus),
        AcylChainPlusFormulaFragmentNL => (C::AcylChain, I::NeutralLoss, S::Plus),
        TwoAcylChainsPlusFormulaFragment => (C::TwoAcylChainsCombined, I::Charged, S::Plus),
        AlkylChainFragment => (C::AlkylChain, I::Charged, S::None),
        AlkylChainPlusFormulaFragment => (C::AlkylChain, I::Charged, S::Plus),
        AmidChainFragment => (C::AmidChain, I::Charged, S::None),
        AmidChainFragmentNL => (C::AmidChain, I::NeutralLoss, S::None),
        AmidChainPlusFormulaFragment => (C::AmidChain, I::Charged, S::Plus),
        AmidChainMinusFormulaFragment => (C::AmidChain, I::Charged, S::Minus),
        AmidChainPlusFormulaFragmentNL => (C::AmidChain, I::NeutralLoss, S::Plus),
        AmidChainMinusFormulaFragmentNL => (C::AmidChain, I::NeutralLoss, S::Minus),
        AmidMonoHydroxyChainFragment => (C::AmidMonoHydroxyChain, I::Charged, S::None),
        AmidMonoHydroxyChainPlusFormulaFragment => {
            (C::AmidMonoHydroxyChain, I::Charged, S::Plus)
        }
        AmidMonoHydroxyChainMinusFormulaFragment => {
            (C::AmidMonoHydroxyChain, I::Charged, S::Minus)
        }
        SphingolipidMonoHydroxyBackboneChainFragment => {
            (C::SphingolipidMonoHydroxyBackboneChain, I::Charged, S::None)
        }
        SphingolipidMonoHydroxyBackboneChainMinusFormulaFragment => {
            (C::SphingolipidMonoHydroxyBackboneChain, I::Charged, S::Minus)
        }
        SphingolipidDiHydroxyBackboneChainFragment => {
            (C::SphingolipidDiHydroxyBackboneChain, I::Charged, S::None)
        }
        SphingolipidDiHydroxyBackboneChainMinusFormulaFragment => {
            (C::SphingolipidDiHydroxyBackboneChain, I::Charged, S::Minus)
        }
        SphingolipidTriHydroxyBackboneChainFragment => {
            (C::SphingolipidTriHydroxyBackboneChain, I::Charged, S::None)
        }
        SphingolipidTriHydroxyBackboneChainMinusFormulaFragment => {
            (C::SphingolipidTriHydroxyBackboneChain, I::Charged, S::Minus)
        }
        Precursor | HeadgroupFragment | HeadgroupFragmentNL => return None,
    };
    Some(shape)
}

/// Applies a lipid class's fragmentation rules for one ionization to fragment spectra
#[derive(Debug)]
pub struct LipidFragmentFactory<'a> {
    tolerance: MzTolerance,
    annotation: &'a Arc<LipidAnnotation>,
    ionization: IonizationType,
    chain_params: ChainParameters,
    rules: Vec<(&'a LipidFragmentationRule, Option<ElementalComposition>)>,
    precursor: ElementalComposition,
}

impl<'a> LipidFragmentFactory<'a> {
    pub fn new(
        tolerance: MzTolerance,
        annotation: &'a Arc<LipidAnnotation>,
        ionization: IonizationType,
        chain_params: ChainParameters,
    ) -> Self {
        let mut rules = Vec::new();
        for rule in annotation.class().rules_for(ionization) {
            match rule.parsed_formula() {
                Some(Ok(formula)) => rules.push((rule, Some(formula))),
                Some(Err(e)) => {
                    log::warn!(
                        "Skipping {:?} rule of {}: {e}",
                        rule.rule_type,
                        annotation.class().name
                    );
                }
                None => rules.push((rule, None)),
            }
        }
        let precursor = ionization.ionize(annotation.formula());
        Self {
            tolerance,
            annotation,
            ionization,
            chain_params,
            rules,
            precursor,
        }
    }

    pub fn polarity(&self) -> Polarity {
        self.ionization.polarity()
    }

    /// Match every applicable rule against `spectrum`'s peaks
    pub fn find_fragments(&self, spectrum: &FragmentSpectrum) -> Vec<LipidFragment> {
        self.find_fragments_in(0, spectrum)
    }

    /// As [`LipidFragmentFactory::find_fragments`], for the fragment spectrum at
    /// `spectrum_index` of a feature
    pub fn find_fragments_in(
        &self,
        spectrum_index: usize,
        spectrum: &FragmentSpectrum,
    ) -> Vec<LipidFragment> {
        let mut fragments = Vec::new();
        for (rule, formula) in self.rules.iter() {
            if let Some(rule_type) = rule.rule_type {
                self.apply_rule(spectrum, rule, rule_type, formula.as_ref(), &mut fragments);
            }
        }
        for fragment in fragments.iter_mut() {
            fragment.spectrum_index = spectrum_index;
        }
        log::trace!(
            "Found {} fragments of {} {}",
            fragments.len(),
            self.annotation,
            self.ionization
        );
        fragments
    }

    fn apply_rule(
        &self,
        spectrum: &FragmentSpectrum,
        rule: &LipidFragmentationRule,
        rule_type: LipidFragmentationRuleType,
        formula: Option<&ElementalComposition>,
        fragments: &mut Vec<LipidFragment>,
    ) {
        use LipidFragmentationRuleType::*;

        let empty = ElementalComposition::new();
        let shift = formula.unwrap_or(&empty);

        match rule_type {
            Precursor => {
                self.push_if_found(spectrum, rule, self.precursor, None, fragments);
            }
            HeadgroupFragment => {
                if let Some(f) = formula {
                    let ion = if f.charge == 0 {
                        IonizationType::charge_only(self.polarity()).ionize(f)
                    } else {
                        *f
                    };
                    self.push_if_found(spectrum, rule, ion, None, fragments);
                }
            }
            HeadgroupFragmentNL => {
                if let Some(f) = formula {
                    let ion = &self.precursor - &f.neutral();
                    self.push_if_found(spectrum, rule, ion, None, fragments);
                }
            }
            // Free acyl anions only form in negative mode
            AcylChainFragment if self.polarity() != Polarity::Negative => {}
            _ => {
                if let Some((chain_type, kind, shift_kind)) = chain_rule_shape(rule_type) {
                    self.chain_rule(spectrum, rule, chain_type, kind, shift_kind, shift, fragments);
                }
            }
        }
    }

    /// The chains a rule of `chain_type` is tried with. Combined acyl chains span twice
    /// the single chain range. No chain can be longer or more unsaturated than the lipid.
    fn candidate_chains(&self, chain_type: LipidChainType) -> Vec<LipidChain> {
        let params = if chain_type == LipidChainType::TwoAcylChainsCombined {
            self.chain_params.scaled(2)
        } else {
            self.chain_params
        };
        let carbons = self.annotation.carbons();
        let dbes = self.annotation.dbes();
        build_chains_in_range(chain_type, &params)
            .into_iter()
            .filter(|c| c.carbons <= carbons && c.dbes <= dbes)
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn chain_rule(
        &self,
        spectrum: &FragmentSpectrum,
        rule: &LipidFragmentationRule,
        chain_type: LipidChainType,
        kind: ChainIon,
        shift_kind: FormulaShift,
        shift: &ElementalComposition,
        fragments: &mut Vec<LipidFragment>,
    ) {
        let shift = shift.neutral();
        for chain in self.candidate_chains(chain_type) {
            let mut part = chain.formula();
            match shift_kind {
                FormulaShift::None => {}
                FormulaShift::Plus => part += &shift,
                FormulaShift::Minus => part -= &shift,
            }
            let ion = match kind {
                ChainIon::Deprotonated => IonizationType::NegativeHydrogen.ionize(&part),
                ChainIon::Charged => IonizationType::charge_only(self.polarity()).ionize(&part),
                ChainIon::NeutralLoss => &self.precursor - &part,
            };
            self.push_if_found(spectrum, rule, ion, Some(chain), fragments);
        }
    }

    fn push_if_found(
        &self,
        spectrum: &FragmentSpectrum,
        rule: &LipidFragmentationRule,
        ion: ElementalComposition,
        chain: Option<LipidChain>,
        fragments: &mut Vec<LipidFragment>,
    ) {
        if ion.charge == 0 || !ion.is_valid() || ion.is_empty() {
            return;
        }
        let mz = ion.mz();
        if let Some(peak) = self.best_peak(spectrum, mz) {
            let (Some(rule_type), Some(level)) = (rule.rule_type, rule.level) else {
                return;
            };
            fragments.push(LipidFragment {
                rule_type,
                level,
                mz_exact: mz,
                ion_formula: ion,
                peak,
                class: self.annotation.class().clone(),
                chain,
                spectrum_index: 0,
            });
        }
    }

    /// The most intense peak within tolerance of `mz`
    fn best_peak(&self, spectrum: &FragmentSpectrum, mz: f64) -> Option<CentroidPeak> {
        spectrum
            .peaks
            .all_peaks_for(mz, self.tolerance.to_peak_tolerance(mz))
            .iter()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
            .cloned()
    }
}
