use std::collections::BTreeSet;
use std::sync::Arc;

use super::{MolecularSpeciesFactory, ValidationContext};
use crate::candidate::MatchedLipid;
use crate::fragments::{msms_score, LipidFragment};
use crate::lipid::{ChainParameters, LipidAnnotation, LipidChain, LipidChainType};

/// The distinct chains of `chain_type` among molecular species level fragments
fn chains_of_type(fragments: &[LipidFragment], chain_type: LipidChainType) -> Vec<LipidChain> {
    fragments
        .iter()
        .filter(|f| f.is_molecular_species_level())
        .filter_map(|f| f.chain)
        .filter(|c| c.chain_type == chain_type)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The distinct chains among molecular species level fragments, other than
/// combined chain pairs
fn distinct_chains(fragments: &[LipidFragment]) -> Vec<LipidChain> {
    fragments
        .iter()
        .filter(|f| f.is_molecular_species_level())
        .filter_map(|f| f.chain)
        .filter(|c| c.chain_type != LipidChainType::TwoAcylChainsCombined)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Bounds chains inferred from lipid totals rather than enumerated
fn any_chain() -> ChainParameters {
    ChainParameters::new(1, u16::MAX, 0, u16::MAX, false)
}

fn fragments_for_chains(
    fragments: &[LipidFragment],
    chains: &[LipidChain],
) -> Vec<LipidFragment> {
    fragments
        .iter()
        .filter(|f| f.chain.is_some_and(|c| chains.contains(&c)))
        .cloned()
        .collect()
}

/// Every multiset of `k` chains from `chains` whose carbons and double bonds add up
/// to `carbons` and `dbes`
fn combinations_with_totals(
    chains: &[LipidChain],
    k: usize,
    carbons: u16,
    dbes: u16,
) -> Vec<Vec<LipidChain>> {
    fn recurse(
        chains: &[LipidChain],
        start: usize,
        k: usize,
        carbons: u16,
        dbes: u16,
        current: &mut Vec<LipidChain>,
        acc: &mut Vec<Vec<LipidChain>>,
    ) {
        if current.len() == k {
            if carbons == 0 && dbes == 0 {
                acc.push(current.clone());
            }
            return;
        }
        for i in start..chains.len() {
            let chain = chains[i];
            if chain.carbons > carbons || chain.dbes > dbes {
                continue;
            }
            current.push(chain);
            recurse(
                chains,
                i,
                k,
                carbons - chain.carbons,
                dbes - chain.dbes,
                current,
                acc,
            );
            current.pop();
        }
    }

    let mut acc = Vec::new();
    if k == 0 {
        return acc;
    }
    let mut current = Vec::with_capacity(k);
    recurse(chains, 0, k, carbons, dbes, &mut current, &mut acc);
    acc
}

fn sorted_types(chains: &[LipidChain]) -> Vec<LipidChainType> {
    let mut types: Vec<_> = chains.iter().map(|c| c.chain_type).collect();
    types.sort();
    types
}

/// Glycerolipids and glycerophospholipids, and any class without a dedicated factory
#[derive(Debug, Default, Clone, Copy)]
pub struct GlyceroAndPhosphoMolecularSpeciesFactory;

impl GlyceroAndPhosphoMolecularSpeciesFactory {
    /// Combined acyl chain fragments whose chain is the sum of two chains of `combo`
    fn combined_support(
        fragments: &[LipidFragment],
        combo: &[LipidChain],
    ) -> Vec<LipidFragment> {
        fragments
            .iter()
            .filter(|f| {
                f.chain.is_some_and(|c| {
                    c.chain_type == LipidChainType::TwoAcylChainsCombined
                        && combo.iter().enumerate().any(|(i, a)| {
                            combo[i + 1..].iter().any(|b| {
                                a.carbons + b.carbons == c.carbons && a.dbes + b.dbes == c.dbes
                            })
                        })
                })
            })
            .cloned()
            .collect()
    }
}

impl MolecularSpeciesFactory for GlyceroAndPhosphoMolecularSpeciesFactory {
    fn predict(
        &self,
        ctx: &ValidationContext<'_>,
        annotation: &Arc<LipidAnnotation>,
        fragments: &[LipidFragment],
    ) -> Vec<MatchedLipid> {
        let class = annotation.class();
        let n_chains = class.chain_count();
        if !(1..=4).contains(&n_chains) {
            return Vec::new();
        }
        let carbons = annotation.carbons();
        let dbes = annotation.dbes();
        let class_types = class.sorted_chain_types();

        let chains = distinct_chains(fragments);
        let mut proposals = Vec::new();
        for combo in combinations_with_totals(&chains, n_chains, carbons, dbes) {
            if sorted_types(&combo) != class_types {
                continue;
            }
            let Some(molecular) = LipidAnnotation::molecular_species(class.clone(), combo.clone())
            else {
                continue;
            };
            let mut support = fragments_for_chains(fragments, &combo);
            support.extend(Self::combined_support(fragments, &combo));
            proposals.push(MatchedLipid::proposed(
                Arc::new(molecular),
                ctx.accurate_mz,
                ctx.ionization,
                support,
            ));
        }
        if !proposals.is_empty() {
            return proposals;
        }

        // Ether lipids often lack alkyl chain fragments. Each detected chain whose
        // remainder is a valid alkyl chain supports the species level annotation on
        // its own fragments.
        if class.has_chain_type(LipidChainType::AlkylChain) && n_chains <= 2 {
            let precursor = ctx.ionization.ionize(annotation.formula()).mz();
            for chain in chains.iter() {
                if chain.carbons >= carbons || chain.dbes > dbes {
                    continue;
                }
                let alkyl = LipidChain::new(
                    LipidChainType::AlkylChain,
                    carbons - chain.carbons,
                    dbes - chain.dbes,
                );
                if !any_chain().is_valid_combination(alkyl.carbons, alkyl.dbes) {
                    continue;
                }
                let support = fragments_for_chains(fragments, &[*chain]);
                let score = msms_score(ctx.spectrum, &support, precursor, &ctx.tolerance);
                if ctx.accepts(score) {
                    log::trace!("{chain} with {alkyl} supports {annotation} at {score:.2}");
                    proposals.push(MatchedLipid::proposed(
                        annotation.clone(),
                        ctx.accurate_mz,
                        ctx.ionization,
                        support,
                    ));
                }
            }
            return proposals;
        }

        // Four acyl chain classes may only show their chains in pairs
        if n_chains == 4 && class_types.iter().all(|t| *t == LipidChainType::AcylChain) {
            let combined = chains_of_type(fragments, LipidChainType::TwoAcylChainsCombined);
            for pair in combinations_with_totals(&combined, 2, carbons, dbes) {
                proposals.push(MatchedLipid::proposed(
                    annotation.clone(),
                    ctx.accurate_mz,
                    ctx.ionization,
                    fragments_for_chains(fragments, &pair),
                ));
            }
        }
        proposals
    }
}

/// Sphingolipids, built from a sphingoid backbone and an amide chain
#[derive(Debug, Default, Clone, Copy)]
pub struct SphingoMolecularSpeciesFactory;

impl MolecularSpeciesFactory for SphingoMolecularSpeciesFactory {
    fn predict(
        &self,
        ctx: &ValidationContext<'_>,
        annotation: &Arc<LipidAnnotation>,
        fragments: &[LipidFragment],
    ) -> Vec<MatchedLipid> {
        let class = annotation.class();
        let Some(backbone_type) = class
            .chain_types
            .iter()
            .copied()
            .find(|t| t.is_sphingoid_backbone())
        else {
            return Vec::new();
        };
        let Some(amide_type) = class
            .chain_types
            .iter()
            .copied()
            .find(|t| {
                matches!(
                    t,
                    LipidChainType::AmidChain | LipidChainType::AmidMonoHydroxyChain
                )
            })
        else {
            return Vec::new();
        };
        let carbons = annotation.carbons();
        let dbes = annotation.dbes();

        let backbones = chains_of_type(fragments, backbone_type);
        let amides = chains_of_type(fragments, amide_type);

        let mut proposals = Vec::new();
        for backbone in backbones.iter() {
            for amide in amides.iter() {
                if backbone.carbons + amide.carbons != carbons
                    || backbone.dbes + amide.dbes != dbes
                {
                    continue;
                }
                let chains = [*backbone, *amide];
                if let Some(molecular) =
                    LipidAnnotation::molecular_species(class.clone(), chains.to_vec())
                {
                    proposals.push(MatchedLipid::proposed(
                        Arc::new(molecular),
                        ctx.accurate_mz,
                        ctx.ionization,
                        fragments_for_chains(fragments, &chains),
                    ));
                }
            }
        }

        // Backbone fragments alone fix the amide chain through the species totals
        if proposals.is_empty() && amides.is_empty() {
            for backbone in backbones.iter() {
                if backbone.carbons >= carbons || backbone.dbes > dbes {
                    continue;
                }
                let amide = LipidChain::new(
                    amide_type,
                    carbons - backbone.carbons,
                    dbes - backbone.dbes,
                );
                if !any_chain().is_valid_combination(amide.carbons, amide.dbes) {
                    continue;
                }
                if let Some(molecular) =
                    LipidAnnotation::molecular_species(class.clone(), vec![*backbone, amide])
                {
                    log::trace!("Inferred amide chain {amide} of {molecular}");
                    proposals.push(MatchedLipid::proposed(
                        Arc::new(molecular),
                        ctx.accurate_mz,
                        ctx.ionization,
                        fragments_for_chains(fragments, &[*backbone]),
                    ));
                }
            }
        }
        proposals
    }
}

/// Sterol esters with their single acyl chain
#[derive(Debug, Default, Clone, Copy)]
pub struct SterolMolecularSpeciesFactory;

impl MolecularSpeciesFactory for SterolMolecularSpeciesFactory {
    fn predict(
        &self,
        ctx: &ValidationContext<'_>,
        annotation: &Arc<LipidAnnotation>,
        fragments: &[LipidFragment],
    ) -> Vec<MatchedLipid> {
        let class = annotation.class();
        if class.chain_count() != 1 {
            return Vec::new();
        }
        let chain_type = class.chain_types[0];
        let chain = LipidChain::new(chain_type, annotation.carbons(), annotation.dbes());
        let support: Vec<LipidFragment> = fragments
            .iter()
            .filter(|f| f.is_molecular_species_level() && f.chain == Some(chain))
            .cloned()
            .collect();
        if support.is_empty() {
            return Vec::new();
        }
        LipidAnnotation::molecular_species(class.clone(), vec![chain])
            .map(|molecular| {
                vec![MatchedLipid::proposed(
                    Arc::new(molecular),
                    ctx.accurate_mz,
                    ctx.ionization,
                    support,
                )]
            })
            .unwrap_or_default()
    }
}
