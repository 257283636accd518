//! A lightweight key/value parameter model used for the open-ended attributes
//! an annotation can carry, and for the textual attribute export of finished
//! annotations.
use std::fmt::Display;
use std::str::{self, FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub trait ParamLike {
    fn name(&self) -> &str;
    fn value(&self) -> &str;
    fn unit(&self) -> Unit;

    fn coerce<T: str::FromStr>(&self) -> Result<T, T::Err> {
        self.value().parse::<T>()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Param {
    pub name: String,
    pub value: String,
    pub unit: Unit,
}

impl Param {
    pub fn new() -> Param {
        Param {
            ..Default::default()
        }
    }

    pub fn new_key_value<K: Into<String>, V: ToString>(name: K, value: V) -> Param {
        let mut inst = Self::new();
        inst.name = name.into();
        inst.value = value.to_string();
        inst
    }

    pub fn coerce<T: str::FromStr>(&self) -> Result<T, T::Err> {
        self.value.parse::<T>()
    }

    /// Read the value as `T`.
    ///
    /// # Panics
    /// A stored value that does not parse as the requested type is a broken
    /// contract between the writer and the reader of the attribute, so this
    /// panics instead of guessing.
    pub fn expect_value<T: str::FromStr>(&self) -> T
    where
        T::Err: std::fmt::Debug,
    {
        match self.value.parse::<T>() {
            Ok(v) => v,
            Err(e) => panic!(
                "Attribute {} holds {:?}, which is not a {}: {:?}",
                self.name,
                self.value,
                std::any::type_name::<T>(),
                e
            ),
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Param {
        self.unit = unit;
        self
    }
}

impl ParamLike for Param {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> &str {
        &self.value
    }

    fn unit(&self) -> Unit {
        self.unit
    }
}

impl Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

pub type ParamList = Vec<Param>;

pub trait ParamDescribed {
    fn params(&self) -> &ParamList;
    fn params_mut(&mut self) -> &mut ParamList;

    fn add_param(&mut self, param: Param) {
        self.params_mut().push(param);
    }

    /// Insert `param`, replacing an existing entry with the same name
    fn set_param(&mut self, param: Param) {
        let params = self.params_mut();
        match params.iter_mut().find(|p| p.name == param.name) {
            Some(slot) => *slot = param,
            None => params.push(param),
        }
    }

    fn remove_param(&mut self, index: usize) -> Param {
        self.params_mut().remove(index)
    }

    fn get_param_by_name(&self, name: &str) -> Option<&Param> {
        self.params().iter().find(|p| p.name == name)
    }
}

#[macro_export]
macro_rules! impl_param_described {
    ($($t:ty), +) => {$(

        impl $crate::params::ParamDescribed for $t {
            fn params(&self) -> &$crate::params::ParamList {
                return &self.params
            }

            fn params_mut(&mut self) -> &mut $crate::params::ParamList {
                return &mut self.params
            }
        }
    )+};
}

/// Append `name` to `params` if `value` is present
pub(crate) fn push_value<V: Display>(
    params: &mut ParamList,
    name: &str,
    value: Option<V>,
    unit: Unit,
) {
    if let Some(value) = value {
        params.push(Param::new_key_value(name, value).with_unit(unit));
    }
}

/// The stable key/value enumeration of an annotation record. An external
/// writer decides how the pairs are laid out on disk.
pub trait AttributeExport {
    fn attributes(&self) -> ParamList;

    /// Render every attribute as `key: value`, joined by `"; "`
    fn to_full_string(&self) -> String {
        self.attributes()
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    #[cfg(feature = "serde")]
    fn attributes_to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for p in self.attributes() {
            map.insert(p.name, serde_json::Value::String(p.value));
        }
        serde_json::Value::Object(map)
    }
}

/// Units that an attribute's value might have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Unit {
    // Mass
    MZ,
    Mass,
    PartsPerMillion,

    // Time
    Minute,
    Second,

    // Ion mobility
    VoltSecondPerSquareCentimeter,
    SquareAngstrom,

    Percent,
    Dimensionless,

    #[default]
    Unknown,
}

impl Unit {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MZ => "m/z",
            Self::Mass => "dalton",
            Self::PartsPerMillion => "parts per million",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::VoltSecondPerSquareCentimeter => "volt-second per square centimeter",
            Self::SquareAngstrom => "square angstrom",
            Self::Percent => "percent",
            Self::Dimensionless => "dimensionless",
            Self::Unknown => "",
        }
    }

    pub fn from_name(name: &str) -> Unit {
        match name {
            "m/z" => Self::MZ,
            "dalton" => Self::Mass,
            "parts per million" | "ppm" => Self::PartsPerMillion,
            "minute" => Self::Minute,
            "second" => Self::Second,
            "volt-second per square centimeter" => Self::VoltSecondPerSquareCentimeter,
            "square angstrom" => Self::SquareAngstrom,
            "percent" => Self::Percent,
            "dimensionless" => Self::Dimensionless,
            _ => Unit::Unknown,
        }
    }
}

impl FromStr for Unit {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}
