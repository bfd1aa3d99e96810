//! Parameter sets shipped with the crate, embedded at build time.

use std::fmt;

use crate::nn_parsing::{ParamError, RawParameters, ScaledParameters};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterSet {
    Turner1999,
    Turner2004,
    Andronescu2007,
    Langdon2018,
}

impl ParameterSet {
    fn raw_text(self) -> &'static str {
        match self {
            ParameterSet::Turner1999 => include_str!("../params/rna_turner1999.par"),
            ParameterSet::Turner2004 => include_str!("../params/rna_turner2004.par"),
            ParameterSet::Andronescu2007 => include_str!("../params/rna_andronescu2007.par"),
            ParameterSet::Langdon2018 => include_str!("../params/rna_langdon2018.par"),
        }
    }

    pub fn parse(self) -> Result<RawParameters, ParamError> {
        RawParameters::parse(self.raw_text())
    }

    /// Parse and temperature-scale in one step: `NewScaledParameters`.
    pub fn scaled(self, temperature_c: f64) -> Result<ScaledParameters, ParamError> {
        Ok(ScaledParameters::new(&self.parse()?, temperature_c))
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterSet::Turner1999 => "Turner1999",
            ParameterSet::Turner2004 => "Turner2004",
            ParameterSet::Andronescu2007 => "Andronescu2007",
            ParameterSet::Langdon2018 => "Langdon2018",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_parameter_sets_parse() {
        for set in [
            ParameterSet::Turner1999,
            ParameterSet::Turner2004,
            ParameterSet::Andronescu2007,
            ParameterSet::Langdon2018,
        ] {
            set.parse().unwrap_or_else(|e| panic!("{} failed to parse: {}", set, e));
        }
    }

    #[test]
    fn test_turner2004_scales_at_measurement_temperature() {
        let scaled = ParameterSet::Turner2004.scaled(37.0).unwrap();
        assert_eq!(scaled.stacking_pair.shape(), &[7, 7]);
        assert_eq!(scaled.interior_2x2.shape(), &[7, 7, 5, 5, 5, 5]);
    }
}
