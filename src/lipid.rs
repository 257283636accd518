//! Lipid structure: chains, classes with their fragmentation rules, and the
//! species and molecular species level annotations built from them.
pub mod annotation;
pub mod catalog;
pub mod chain;
pub mod class;

pub use annotation::{LipidAnnotation, MolecularSpeciesLevelAnnotation, SpeciesLevelAnnotation};
pub use chain::{build_chains_in_range, ChainParameters, LipidChain, LipidChainType};
pub use class::{
    LipidAnnotationLevel, LipidCategory, LipidClass, LipidClassError, LipidFragmentationRule,
    LipidFragmentationRuleType,
};
