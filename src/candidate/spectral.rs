use super::attributes::AttributeValue;
use crate::impl_param_described;
use crate::params::{push_value, AttributeExport, ParamList, Unit};

/// A spectral library entry that matched a feature's fragment spectrum
#[derive(Debug, Clone, Default)]
pub struct SpectralLibraryMatch {
    pub entry_name: String,
    pub precursor_mz: Option<f64>,
    pub rt: AttributeValue<f32>,
    pub ri: AttributeValue<f32>,
    pub ccs: AttributeValue<f32>,
    pub mobility: AttributeValue<f32>,
    pub adduct: Option<String>,
    pub formula: Option<String>,
    /// The spectral similarity in `[0, 1]`
    pub similarity: f32,
    pub matched_signals: usize,
    pub library: Option<String>,
    pub params: ParamList,
}

impl_param_described!(SpectralLibraryMatch);

impl SpectralLibraryMatch {
    pub fn new<S: Into<String>>(entry_name: S, precursor_mz: Option<f64>, similarity: f32) -> Self {
        Self {
            entry_name: entry_name.into(),
            precursor_mz,
            similarity,
            ..Default::default()
        }
    }

    pub fn with_rt(mut self, rt: f32) -> Self {
        self.rt = AttributeValue::from_raw(rt);
        self
    }

    pub fn with_ri(mut self, ri: f32) -> Self {
        self.ri = AttributeValue::from_raw(ri);
        self
    }

    pub fn with_ccs(mut self, ccs: f32) -> Self {
        self.ccs = AttributeValue::from_raw(ccs);
        self
    }
}

impl AttributeExport for SpectralLibraryMatch {
    fn attributes(&self) -> ParamList {
        let mut params = ParamList::new();
        push_value(&mut params, "library_entry", Some(&self.entry_name), Unit::Unknown);
        push_value(&mut params, "precursor_mz", self.precursor_mz, Unit::MZ);
        push_value(&mut params, "rt", self.rt.measured(), Unit::Minute);
        push_value(&mut params, "ri", self.ri.measured(), Unit::Dimensionless);
        push_value(&mut params, "ccs", self.ccs.measured(), Unit::SquareAngstrom);
        push_value(
            &mut params,
            "mobility",
            self.mobility.measured(),
            Unit::VoltSecondPerSquareCentimeter,
        );
        push_value(&mut params, "adduct", self.adduct.as_ref(), Unit::Unknown);
        push_value(&mut params, "formula", self.formula.as_ref(), Unit::Unknown);
        push_value(&mut params, "cosine_similarity", Some(self.similarity), Unit::Dimensionless);
        push_value(&mut params, "matched_signals", Some(self.matched_signals), Unit::Unknown);
        push_value(&mut params, "library", self.library.as_ref(), Unit::Unknown);
        params.extend(self.params.iter().cloned());
        params
    }
}
