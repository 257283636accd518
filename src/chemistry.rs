//! Elemental compositions, their masses, and the ways a molecule is ionized.
pub mod formula;
pub mod ionization;

pub use formula::{Element, ElementalComposition, FormulaError};
pub use ionization::{IonType, IonizationType};
