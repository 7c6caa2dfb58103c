//! Parameter-name tables for the two call sites that share the engine.
//!
//! Clip transforms and modulation use the same grammar and functions; they
//! differ only in what the deviation parameter is called and whether
//! `note.deviation` can be read.

use serde::{Deserialize, Serialize};

use super::ast::Parameter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Transform,
    Modulation,
}

const TRANSFORM_NAMES: [(&str, Parameter); 7] = [
    ("velocity", Parameter::Velocity),
    ("timing", Parameter::Timing),
    ("duration", Parameter::Duration),
    ("probability", Parameter::Probability),
    ("deviation", Parameter::Deviation),
    ("pitch", Parameter::Pitch),
    ("gain", Parameter::Gain),
];

const MODULATION_NAMES: [(&str, Parameter); 7] = [
    ("velocity", Parameter::Velocity),
    ("timing", Parameter::Timing),
    ("duration", Parameter::Duration),
    ("probability", Parameter::Probability),
    ("velocityDeviation", Parameter::Deviation),
    ("pitch", Parameter::Pitch),
    ("gain", Parameter::Gain),
];

impl Dialect {
    fn table(self) -> &'static [(&'static str, Parameter)] {
        match self {
            Dialect::Transform => &TRANSFORM_NAMES,
            Dialect::Modulation => &MODULATION_NAMES,
        }
    }

    /// Look up a parameter by its surface name.
    pub fn parameter(self, name: &str) -> Option<Parameter> {
        self.table()
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| *p)
    }

    /// Surface name of `parameter` in this dialect.
    pub fn parameter_name(self, parameter: Parameter) -> &'static str {
        self.table()
            .iter()
            .find(|(_, p)| *p == parameter)
            .map(|(n, _)| *n)
            .unwrap_or("unknown")
    }

    /// All surface names, for error messages.
    pub fn parameter_names(self) -> Vec<&'static str> {
        self.table().iter().map(|(n, _)| *n).collect()
    }

    /// Whether `note.deviation` is readable from expressions.
    pub fn exposes_note_deviation(self) -> bool {
        matches!(self, Dialect::Transform)
    }
}
