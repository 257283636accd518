use std::fmt::Display;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::formula::{Element, ElementalComposition};
use crate::feature::Polarity;
use crate::utils::{ELECTRON_MASS, PROTON};

/// The ionization modes lipid fragmentation rules are written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IonizationType {
    NegativeHydrogen,
    PositiveHydrogen,
    Positive,
    Negative,
    Ammonium,
    Sodium,
    Formate,
    Acetate,
}

impl IonizationType {
    pub const ALL: [IonizationType; 8] = [
        Self::NegativeHydrogen,
        Self::PositiveHydrogen,
        Self::Positive,
        Self::Negative,
        Self::Ammonium,
        Self::Sodium,
        Self::Formate,
        Self::Acetate,
    ];

    pub const fn adduct_name(&self) -> &'static str {
        match self {
            Self::NegativeHydrogen => "[M-H]-",
            Self::PositiveHydrogen => "[M+H]+",
            Self::Positive => "[M]+",
            Self::Negative => "[M]-",
            Self::Ammonium => "[M+NH4]+",
            Self::Sodium => "[M+Na]+",
            Self::Formate => "[M+HCOO]-",
            Self::Acetate => "[M+CH3COO]-",
        }
    }

    pub const fn polarity(&self) -> Polarity {
        match self {
            Self::PositiveHydrogen | Self::Positive | Self::Ammonium | Self::Sodium => {
                Polarity::Positive
            }
            Self::NegativeHydrogen | Self::Negative | Self::Formate | Self::Acetate => {
                Polarity::Negative
            }
        }
    }

    pub const fn charge(&self) -> i32 {
        match self.polarity() {
            Polarity::Negative => -1,
            _ => 1,
        }
    }

    /// The atoms gained or lost together with the resulting charge
    pub fn adduct_composition(&self) -> ElementalComposition {
        use Element::*;
        let counts: &[(Element, i32)] = match self {
            Self::NegativeHydrogen => &[(H, -1)],
            Self::PositiveHydrogen => &[(H, 1)],
            Self::Positive | Self::Negative => &[],
            Self::Ammonium => &[(N, 1), (H, 4)],
            Self::Sodium => &[(Na, 1)],
            Self::Formate => &[(C, 1), (H, 1), (O, 2)],
            Self::Acetate => &[(C, 2), (H, 3), (O, 2)],
        };
        ElementalComposition::from_counts(counts).with_charge(self.charge())
    }

    /// The mass shift from the neutral molecule to the ion
    pub fn added_mass(&self) -> f64 {
        self.adduct_composition().monoisotopic_mass()
    }

    pub fn ionize(&self, neutral: &ElementalComposition) -> ElementalComposition {
        &neutral.neutral() + &self.adduct_composition()
    }

    /// Ionize a fragment by the bare charge of this ionization's polarity, adding
    /// or removing one electron.
    pub fn charge_only(polarity: Polarity) -> IonizationType {
        match polarity {
            Polarity::Negative => Self::Negative,
            _ => Self::Positive,
        }
    }
}

impl Display for IonizationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.adduct_name())
    }
}

impl FromStr for IonizationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|i| i.adduct_name() == s)
            .copied()
            .ok_or_else(|| format!("Unknown ionization {s}"))
    }
}

/// A general adduct for compound database candidates, described by its net mass
/// change, charge and the number of molecules it binds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IonType {
    pub name: String,
    pub mass_delta: f64,
    pub charge: i32,
    pub molecules: u32,
}

impl IonType {
    pub fn new<S: Into<String>>(name: S, mass_delta: f64, charge: i32, molecules: u32) -> Self {
        Self {
            name: name.into(),
            mass_delta,
            charge,
            molecules,
        }
    }

    /// A placeholder whose mass relationship is not known
    pub fn undefined() -> Self {
        Self::new("[M+?]", 0.0, 0, 1)
    }

    pub fn protonated() -> Self {
        Self::new("[M+H]+", PROTON, 1, 1)
    }

    pub fn deprotonated() -> Self {
        Self::new("[M-H]-", -PROTON, -1, 1)
    }

    pub fn sodiated() -> Self {
        Self::new("[M+Na]+", Element::Na.mass() - ELECTRON_MASS, 1, 1)
    }

    pub fn ammoniated() -> Self {
        Self::new("[M+NH4]+", IonizationType::Ammonium.added_mass(), 1, 1)
    }

    pub fn is_undefined(&self) -> bool {
        self.charge == 0 || self.molecules == 0 || self.name.contains('?')
    }

    pub fn mz(&self, neutral_mass: f64) -> f64 {
        (neutral_mass * self.molecules as f64 + self.mass_delta) / self.charge.abs() as f64
    }

    pub fn neutral_mass(&self, mz: f64) -> f64 {
        (mz * self.charge.abs() as f64 - self.mass_delta) / self.molecules as f64
    }

    pub fn polarity(&self) -> Polarity {
        match self.charge.signum() {
            1 => Polarity::Positive,
            -1 => Polarity::Negative,
            _ => Polarity::Unknown,
        }
    }
}

impl From<IonizationType> for IonType {
    fn from(value: IonizationType) -> Self {
        Self::new(value.adduct_name(), value.added_mass(), value.charge(), 1)
    }
}

impl Display for IonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
