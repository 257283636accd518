use super::SpeciesLevelValidator;
use crate::fragments::LipidFragment;
use crate::lipid::LipidFragmentationRuleType;

/// Free fatty acids and acyl carnitines, which often show little more than their
/// precursor or a single headgroup ion
#[derive(Debug, Default, Clone, Copy)]
pub struct FattyAcylSpeciesValidator;

impl SpeciesLevelValidator for FattyAcylSpeciesValidator {
    fn is_species_evidence(&self, fragment: &LipidFragment) -> bool {
        fragment.is_species_level()
            || (fragment.rule_type == LipidFragmentationRuleType::Precursor
                && fragment.class.chain_count() == 1)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GlyceroAndGlycerophosphoSpeciesValidator;

impl SpeciesLevelValidator for GlyceroAndGlycerophosphoSpeciesValidator {}

#[derive(Debug, Default, Clone, Copy)]
pub struct SphingolipidSpeciesValidator;

impl SpeciesLevelValidator for SphingolipidSpeciesValidator {}

/// Sterol esters, where the sterol ion alone identifies the species
#[derive(Debug, Default, Clone, Copy)]
pub struct SterolSpeciesValidator;

impl SpeciesLevelValidator for SterolSpeciesValidator {
    fn is_species_evidence(&self, fragment: &LipidFragment) -> bool {
        fragment.is_species_level()
            || (fragment.rule_type == LipidFragmentationRuleType::Precursor
                && fragment.class.chain_count() == 1)
    }
}
