pub use crate::candidate::AnnotationLike;
pub use crate::params::{AttributeExport, ParamDescribed, ParamLike};
pub use crate::resolver::DuplicateResolver;
pub use crate::validation::{MolecularSpeciesFactory, SpeciesLevelValidator};
