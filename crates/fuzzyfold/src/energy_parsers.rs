use clap::{Args, ValueEnum};

use ff_energy::{DanglingEndsModel, ParameterSet};

/// `clap::ValueEnum` mirror of [`ff_energy::ParameterSet`]; clap can't derive
/// `ValueEnum` on a type from another crate.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ParameterSetArg {
    Turner1999,
    Turner2004,
    Andronescu2007,
    Langdon2018,
}

impl From<ParameterSetArg> for ParameterSet {
    fn from(arg: ParameterSetArg) -> Self {
        match arg {
            ParameterSetArg::Turner1999 => ParameterSet::Turner1999,
            ParameterSetArg::Turner2004 => ParameterSet::Turner2004,
            ParameterSetArg::Andronescu2007 => ParameterSet::Andronescu2007,
            ParameterSetArg::Langdon2018 => ParameterSet::Langdon2018,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DangleArg {
    None,
    Double,
}

impl From<DangleArg> for DanglingEndsModel {
    fn from(arg: DangleArg) -> Self {
        match arg {
            DangleArg::None => DanglingEndsModel::None,
            DangleArg::Double => DanglingEndsModel::Double,
        }
    }
}

/// Free energy evaluation parameters.
#[derive(Debug, Args)]
pub struct EnergyModelArguments {
    /// Temperature in Celsius
    #[arg(short, long, default_value = "37.0")]
    pub temperature: f64,

    /// Nearest-neighbor parameter set
    #[arg(short = 'p', long, value_enum, default_value = "turner2004")]
    pub parameters: ParameterSetArg,

    /// Dangling-end model
    #[arg(short, long, value_enum, default_value = "double")]
    pub dangle: DangleArg,
}

impl EnergyModelArguments {
    pub fn parameter_set(&self) -> ParameterSet {
        self.parameters.into()
    }

    pub fn dangle_model(&self) -> DanglingEndsModel {
        self.dangle.into()
    }
}
