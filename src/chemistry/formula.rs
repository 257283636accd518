use std::fmt::Display;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::utils::ELECTRON_MASS;

/// The elements lipid and small molecule formulas are built from, in Hill order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Element {
    C,
    H,
    N,
    Na,
    O,
    P,
    S,
}

const ELEMENT_COUNT: usize = 7;

impl Element {
    pub const ALL: [Element; ELEMENT_COUNT] = [
        Element::C,
        Element::H,
        Element::N,
        Element::Na,
        Element::O,
        Element::P,
        Element::S,
    ];

    /// Monoisotopic mass of the most abundant isotope
    pub const fn mass(&self) -> f64 {
        match self {
            Element::C => 12.0,
            Element::H => 1.00782503207,
            Element::N => 14.0030740048,
            Element::Na => 22.9897692809,
            Element::O => 15.99491461956,
            Element::P => 30.97376163,
            Element::S => 31.97207100,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Element::C => "C",
            Element::H => "H",
            Element::N => "N",
            Element::Na => "Na",
            Element::O => "O",
            Element::P => "P",
            Element::S => "S",
        }
    }

    const fn index(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Element {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(Self::C),
            "H" => Ok(Self::H),
            "N" => Ok(Self::N),
            "Na" => Ok(Self::Na),
            "O" => Ok(Self::O),
            "P" => Ok(Self::P),
            "S" => Ok(Self::S),
            _ => Err(FormulaError::UnknownElement(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error("Cannot parse an empty formula")]
    Empty,
    #[error("Unknown element {0:?}")]
    UnknownElement(String),
    #[error("Malformed formula {0:?}")]
    Malformed(String),
}

fn formula_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^((?:[A-Z][a-z]?\d*)+)(?:([+-])(\d*))?$").unwrap()
    })
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([A-Z][a-z]?)(\d*)").unwrap())
}

/// Element counts with a net charge.
///
/// Counts are signed so that intermediate results like "precursor minus
/// head group" can be expressed; [`ElementalComposition::is_valid`] tells
/// whether the result is a real molecule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ElementalComposition {
    counts: [i32; ELEMENT_COUNT],
    pub charge: i32,
}

impl ElementalComposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: &[(Element, i32)]) -> Self {
        let mut inst = Self::new();
        for (e, n) in counts {
            inst.add_element(*e, *n);
        }
        inst
    }

    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    pub fn count(&self, element: Element) -> i32 {
        self.counts[element.index()]
    }

    pub fn add_element(&mut self, element: Element, count: i32) {
        self.counts[element.index()] += count;
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|c| *c == 0)
    }

    /// No negative element counts
    pub fn is_valid(&self) -> bool {
        self.counts.iter().all(|c| *c >= 0)
    }

    /// The monoisotopic mass, less the mass of any missing electrons
    pub fn monoisotopic_mass(&self) -> f64 {
        let atoms: f64 = Element::ALL
            .iter()
            .map(|e| e.mass() * self.count(*e) as f64)
            .sum();
        atoms - self.charge as f64 * ELECTRON_MASS
    }

    /// The mass-to-charge ratio, or the mass if uncharged
    pub fn mz(&self) -> f64 {
        let mass = self.monoisotopic_mass();
        if self.charge == 0 {
            mass
        } else {
            mass / self.charge.abs() as f64
        }
    }

    /// The same composition without charge
    pub fn neutral(&self) -> Self {
        Self {
            counts: self.counts,
            charge: 0,
        }
    }
}

impl FromStr for ElementalComposition {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FormulaError::Empty);
        }
        let caps = formula_pattern()
            .captures(s)
            .ok_or_else(|| FormulaError::Malformed(s.to_string()))?;

        let mut inst = Self::new();
        let body = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        for tok in token_pattern().captures_iter(body) {
            let element: Element = tok[1].parse()?;
            let count = match &tok[2] {
                "" => 1,
                n => n
                    .parse::<i32>()
                    .map_err(|_| FormulaError::Malformed(s.to_string()))?,
            };
            inst.add_element(element, count);
        }

        if let Some(sign) = caps.get(2) {
            let magnitude = match caps.get(3).map(|m| m.as_str()).unwrap_or_default() {
                "" => 1,
                n => n
                    .parse::<i32>()
                    .map_err(|_| FormulaError::Malformed(s.to_string()))?,
            };
            inst.charge = if sign.as_str() == "-" {
                -magnitude
            } else {
                magnitude
            };
        }
        Ok(inst)
    }
}

impl Display for ElementalComposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for e in Element::ALL {
            let n = self.count(e);
            match n {
                0 => {}
                1 => f.write_str(e.symbol())?,
                _ => write!(f, "{}{}", e.symbol(), n)?,
            }
        }
        match self.charge {
            0 => {}
            1 => f.write_str("+")?,
            -1 => f.write_str("-")?,
            z if z > 0 => write!(f, "+{}", z)?,
            z => write!(f, "-{}", z.abs())?,
        }
        Ok(())
    }
}

impl AddAssign<&ElementalComposition> for ElementalComposition {
    fn add_assign(&mut self, rhs: &ElementalComposition) {
        for (a, b) in self.counts.iter_mut().zip(rhs.counts.iter()) {
            *a += *b;
        }
        self.charge += rhs.charge;
    }
}

impl SubAssign<&ElementalComposition> for ElementalComposition {
    fn sub_assign(&mut self, rhs: &ElementalComposition) {
        for (a, b) in self.counts.iter_mut().zip(rhs.counts.iter()) {
            *a -= *b;
        }
        self.charge -= rhs.charge;
    }
}

impl Add<&ElementalComposition> for &ElementalComposition {
    type Output = ElementalComposition;

    fn add(self, rhs: &ElementalComposition) -> Self::Output {
        let mut out = *self;
        out += rhs;
        out
    }
}

impl Sub<&ElementalComposition> for &ElementalComposition {
    type Output = ElementalComposition;

    fn sub(self, rhs: &ElementalComposition) -> Self::Output {
        let mut out = *self;
        out -= rhs;
        out
    }
}

impl Add for ElementalComposition {
    type Output = ElementalComposition;

    fn add(mut self, rhs: ElementalComposition) -> Self::Output {
        self += &rhs;
        self
    }
}

impl Sub for ElementalComposition {
    type Output = ElementalComposition;

    fn sub(mut self, rhs: ElementalComposition) -> Self::Output {
        self -= &rhs;
        self
    }
}

impl Neg for ElementalComposition {
    type Output = ElementalComposition;

    fn neg(self) -> Self::Output {
        ElementalComposition::new() - self
    }
}
