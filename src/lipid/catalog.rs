//! The built-in lipid classes and their fragmentation rules.
use std::sync::{Arc, OnceLock};

use super::chain::LipidChainType::{self, *};
use super::class::{
    LipidAnnotationLevel::{self, *},
    LipidCategory, LipidClass, LipidFragmentationRule,
    LipidFragmentationRuleType::{self, *},
};
use crate::chemistry::{ElementalComposition, IonizationType::{self, *}};

fn rule(
    ionization: IonizationType,
    rule_type: LipidFragmentationRuleType,
    level: LipidAnnotationLevel,
) -> LipidFragmentationRule {
    LipidFragmentationRule::new(ionization, rule_type, level)
}

fn rule_f(
    ionization: IonizationType,
    rule_type: LipidFragmentationRuleType,
    level: LipidAnnotationLevel,
    formula: &str,
) -> LipidFragmentationRule {
    LipidFragmentationRule::new(ionization, rule_type, level).with_formula(formula)
}

fn only(ionization: IonizationType) -> LipidFragmentationRule {
    LipidFragmentationRule::ionization_only(ionization)
}

fn backbone(formula: &'static str) -> ElementalComposition {
    formula
        .parse()
        .unwrap_or_else(|e| panic!("Built-in backbone formula {formula} is invalid: {e}"))
}

fn class(
    name: &str,
    abbr: &str,
    category: LipidCategory,
    backbone_formula: &'static str,
    chain_types: &[LipidChainType],
    rules: Vec<LipidFragmentationRule>,
) -> LipidClass {
    LipidClass::builtin(
        name,
        abbr,
        category,
        backbone(backbone_formula),
        chain_types.to_vec(),
        rules,
    )
}

#[rustfmt::skip]
fn build_catalog() -> Vec<Arc<LipidClass>> {
    use LipidCategory::*;
    let classes = vec![
        class(
            "Free fatty acids",
            "FA",
            FattyAcyls,
            "H2O",
            &[AcylChain],
            vec![rule(NegativeHydrogen, Precursor, SpeciesLevel)],
        ),
        class(
            "Fatty acyl carnitines",
            "CAR",
            FattyAcyls,
            "C7H16NO3",
            &[AcylChain],
            vec![rule_f(Positive, HeadgroupFragment, SpeciesLevel, "C4H5O2+")],
        ),
        class(
            "Monoacylglycerols",
            "MG",
            Glycerolipids,
            "C3H8O3",
            &[AcylChain],
            vec![
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "NH3"),
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "H5ON"),
            ],
        ),
        class(
            "Diacylglycerols",
            "DG",
            Glycerolipids,
            "C3H8O3",
            &[AcylChain, AcylChain],
            vec![
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "NH3"),
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "H5ON"),
                rule_f(Ammonium, AcylChainPlusFormulaFragment, MolecularSpeciesLevel, "C3H5O"),
            ],
        ),
        class(
            "Triacylglycerols",
            "TG",
            Glycerolipids,
            "C3H8O3",
            &[AcylChain, AcylChain, AcylChain],
            vec![
                rule(Sodium, AcylChainFragmentNL, MolecularSpeciesLevel),
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "NH3"),
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "H5NO"),
                rule_f(Ammonium, AcylChainPlusFormulaFragmentNL, MolecularSpeciesLevel, "NH3"),
            ],
        ),
        class(
            "Diacylglyceryltrimethylhomoserines",
            "DGTS",
            Glycerolipids,
            "C10H21O5N",
            &[AcylChain, AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragment, SpeciesLevel, "C10H22NO5+"),
                rule_f(PositiveHydrogen, HeadgroupFragment, SpeciesLevel, "C7H14NO2+"),
                rule(PositiveHydrogen, AcylChainFragmentNL, MolecularSpeciesLevel),
                rule_f(PositiveHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "H2O"),
            ],
        ),
        class(
            "Monogalactosyldiacylglycerols",
            "MGDG",
            Glycerolipids,
            "C9H18O8",
            &[AcylChain, AcylChain],
            vec![
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "C6H15NO6"),
                rule_f(Ammonium, AcylChainPlusFormulaFragment, MolecularSpeciesLevel, "C3H5O"),
                rule(Acetate, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Diacylglycerophosphocholines",
            "PC",
            Glycerophospholipids,
            "C8H20O6PN",
            &[AcylChain, AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragment, SpeciesLevel, "C5H15NO4P+"),
                rule(PositiveHydrogen, AcylChainFragmentNL, MolecularSpeciesLevel),
                rule_f(PositiveHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "H2O"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C3H9N"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C5H14NO4P"),
                rule_f(Sodium, HeadgroupFragment, SpeciesLevel, "C2H5O4PNa+"),
                rule(Formate, AcylChainFragment, MolecularSpeciesLevel),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C3H6O2"),
                rule(Acetate, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Alkylacylglycerophosphocholines",
            "PC",
            Glycerophospholipids,
            "C8H20O6PN",
            &[AlkylChain, AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragment, SpeciesLevel, "C5H15NO4P+"),
                rule_f(Formate, HeadgroupFragmentNL, SpeciesLevel, "C3H6O2"),
                rule(Formate, AcylChainFragment, MolecularSpeciesLevel),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C3H6O2"),
                rule(Acetate, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Monoacylglycerophosphocholines",
            "LPC",
            Glycerophospholipids,
            "C8H20O6PN",
            &[AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragment, SpeciesLevel, "C5H15NO4P+"),
                rule_f(Sodium, HeadgroupFragment, SpeciesLevel, "C3H9N+"),
                rule_f(Sodium, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "H2O"),
                rule(Formate, AcylChainFragment, MolecularSpeciesLevel),
                rule(Acetate, AcylChainFragment, MolecularSpeciesLevel),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C3H6O2"),
            ],
        ),
        class(
            "Diacylglycerophosphoethanolamines",
            "PE",
            Glycerophospholipids,
            "C5H14O6PN",
            &[AcylChain, AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C2H8NO4P"),
                rule_f(PositiveHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "OH"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C2H5N"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C2H8NO4P"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C5H11NO5P-"),
                rule(NegativeHydrogen, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Alkylacylglycerophosphoethanolamines",
            "PE",
            Glycerophospholipids,
            "C5H14O6PN",
            &[AlkylChain, AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C2H8NO4P"),
                rule_f(PositiveHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "OH"),
                rule_f(NegativeHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "OH"),
                rule(NegativeHydrogen, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Monoacylglycerophosphoethanolamines",
            "LPE",
            Glycerophospholipids,
            "C5H14O6PN",
            &[AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C2H8NO4P"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C5H11NO5P-"),
                rule(NegativeHydrogen, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Diacylglycerophosphoserines",
            "PS",
            Glycerophospholipids,
            "C6H14O8NP",
            &[AcylChain, AcylChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C3H8NO6P"),
                rule(PositiveHydrogen, AcylChainFragmentNL, MolecularSpeciesLevel),
                rule_f(PositiveHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "H2O"),
                rule_f(Sodium, HeadgroupFragment, SpeciesLevel, "C3H8NO6PNa+"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C3H8NO6P"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "H3PO4"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C3H6O5P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "H2PO4-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "PO3-"),
                rule_f(NegativeHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C3H5NO2"),
                rule(NegativeHydrogen, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Diacylglycerophosphoglycerols",
            "PG",
            Glycerophospholipids,
            "C6H15O8P",
            &[AcylChain, AcylChain],
            vec![
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "C3H12O6PN"),
                rule_f(Ammonium, AcylChainPlusFormulaFragment, MolecularSpeciesLevel, "C3H5O"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C6H14O8P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C3H6O5P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "H2PO4-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "PO3-"),
                rule(NegativeHydrogen, AcylChainFragment, MolecularSpeciesLevel),
                rule_f(NegativeHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "H2O"),
                rule(NegativeHydrogen, AcylChainFragmentNL, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Diacylglycerophosphoinositols",
            "PI",
            Glycerophospholipids,
            "C9H19PO11",
            &[AcylChain, AcylChain],
            vec![
                rule_f(Ammonium, HeadgroupFragmentNL, SpeciesLevel, "C6H16O9PN"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C6H13O9PNa"),
                rule_f(Sodium, HeadgroupFragment, SpeciesLevel, "C6H13O9PNa+"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C9H16O10P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C9H14O9P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C6H12O9P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C6H10O8P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C6H8O7P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C3H6O5P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "H2PO4-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "PO3-"),
                rule_f(NegativeHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C6H12O5"),
                rule(NegativeHydrogen, AcylChainFragment, MolecularSpeciesLevel),
                rule(NegativeHydrogen, AcylChainFragmentNL, MolecularSpeciesLevel),
                rule_f(NegativeHydrogen, AcylChainMinusFormulaFragmentNL, MolecularSpeciesLevel, "H2O"),
                rule_f(NegativeHydrogen, AcylChainPlusFormulaFragmentNL, MolecularSpeciesLevel, "C6H12O5"),
            ],
        ),
        class(
            "Diacylglycerophosphates",
            "PA",
            Glycerophospholipids,
            "C3H9O6P",
            &[AcylChain, AcylChain],
            vec![
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "C3H6O5P-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "H2PO4-"),
                rule_f(NegativeHydrogen, HeadgroupFragment, SpeciesLevel, "PO3-"),
                rule(NegativeHydrogen, AcylChainFragment, MolecularSpeciesLevel),
            ],
        ),
        class(
            "Ceramides",
            "Cer",
            Sphingolipids,
            "H2O",
            &[SphingolipidDiHydroxyBackboneChain, AmidChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "H2O"),
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "H4O2"),
                rule_f(PositiveHydrogen, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "HO"),
                rule_f(PositiveHydrogen, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "H3O2"),
                rule_f(PositiveHydrogen, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "CH3O2"),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C2H4O2"),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C3H6O3"),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C3H8O4"),
                rule_f(Acetate, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "C2H8NO"),
                rule_f(Acetate, AmidChainPlusFormulaFragment, MolecularSpeciesLevel, "C2H"),
                rule_f(Formate, HeadgroupFragmentNL, SpeciesLevel, "CH2O2"),
                rule_f(Formate, HeadgroupFragmentNL, SpeciesLevel, "C2H6O3"),
                rule_f(Formate, HeadgroupFragmentNL, SpeciesLevel, "C2H6O4"),
                rule_f(Formate, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "C2H8NO"),
                rule(Formate, SphingolipidDiHydroxyBackboneChainFragment, MolecularSpeciesLevel),
                rule_f(Formate, AmidChainPlusFormulaFragment, MolecularSpeciesLevel, "C2H"),
            ],
        ),
        class(
            "Hexosylceramides",
            "HexCer",
            Sphingolipids,
            "C6H12O6",
            &[SphingolipidDiHydroxyBackboneChain, AmidChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "H2O"),
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C6H10O5"),
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C6H12O6"),
                rule_f(PositiveHydrogen, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "HO"),
                rule_f(PositiveHydrogen, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "H3O2"),
                rule_f(PositiveHydrogen, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "CH3O2"),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C8H14O7"),
                rule_f(Acetate, AmidChainMinusFormulaFragment, MolecularSpeciesLevel, "NH4"),
                rule_f(Acetate, AmidChainPlusFormulaFragment, MolecularSpeciesLevel, "C2H"),
                rule_f(Acetate, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "C2H8NO"),
                rule_f(Formate, HeadgroupFragmentNL, SpeciesLevel, "C7H12O7"),
                rule_f(Formate, HeadgroupFragmentNL, SpeciesLevel, "C7H14O8"),
                rule_f(Formate, AmidChainMinusFormulaFragment, MolecularSpeciesLevel, "NH4"),
                rule_f(Formate, AmidChainPlusFormulaFragment, MolecularSpeciesLevel, "C2H"),
                rule_f(Formate, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "C2H8NO"),
            ],
        ),
        class(
            "Ceramide phosphocholines (sphingomyelins)",
            "SM",
            Sphingolipids,
            "C5H14NO4P",
            &[SphingolipidDiHydroxyBackboneChain, AmidChain],
            vec![
                rule_f(PositiveHydrogen, HeadgroupFragment, SpeciesLevel, "C5H15O4PN+"),
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C5H14NO4P"),
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C5H16NO5P"),
                rule_f(PositiveHydrogen, HeadgroupFragmentNL, SpeciesLevel, "C3H9N"),
                rule_f(PositiveHydrogen, SphingolipidDiHydroxyBackboneChainMinusFormulaFragment, MolecularSpeciesLevel, "H3O2"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C5H14NO4P"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C5H15NO5PNa"),
                rule_f(Sodium, HeadgroupFragmentNL, SpeciesLevel, "C3H9N"),
                rule_f(Formate, HeadgroupFragment, SpeciesLevel, "C4H11O4PN-"),
                rule_f(Formate, HeadgroupFragment, SpeciesLevel, "PO3-"),
                rule_f(Acetate, HeadgroupFragment, SpeciesLevel, "C4H11O4PN-"),
                rule_f(Acetate, HeadgroupFragment, SpeciesLevel, "PO3-"),
                rule_f(Acetate, HeadgroupFragmentNL, SpeciesLevel, "C3H6O2"),
            ],
        ),
        class(
            "Cholesterol esters",
            "CE",
            SterolLipids,
            "C27H46O",
            &[AcylChain],
            vec![
                rule_f(Ammonium, HeadgroupFragment, SpeciesLevel, "C27H45+"),
                rule_f(Sodium, HeadgroupFragment, SpeciesLevel, "C27H45+"),
            ],
        ),
    ];
    classes.into_iter().map(Arc::new).collect()
}

/// Every built-in lipid class, shared
pub fn all() -> &'static [Arc<LipidClass>] {
    static CATALOG: OnceLock<Vec<Arc<LipidClass>>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Find built-in classes by abbreviation. Several classes share an abbreviation,
/// e.g. diacyl and alkylacyl `PC`.
pub fn by_abbr(abbr: &str) -> Vec<Arc<LipidClass>> {
    all().iter().filter(|c| c.abbr == abbr).cloned().collect()
}

/// Find a built-in class by its full name
pub fn by_name(name: &str) -> Option<Arc<LipidClass>> {
    all().iter().find(|c| c.name == name).cloned()
}

/// Add an ionization with no fragmentation rules to a class, making candidates
/// of that class searchable with it by MS1 alone
pub fn with_ionization(class: &LipidClass, ionization: IonizationType) -> LipidClass {
    let mut class = class.clone();
    if !class.rules.iter().any(|r| r.ionization == ionization) {
        class.rules.push(only(ionization));
    }
    class
}
