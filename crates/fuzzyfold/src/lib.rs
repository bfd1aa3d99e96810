//! # fuzzyfold
//!
//! The main entry point for the fuzzyfold RNA free-energy package. At this
//! level you'll find the argument parsers shared by the binaries shipped
//! with the package.
//!
//! This crate re-exports the main functionality from its submodules.

/// Exposing fuzzyfold::structure: dot-bracket parsing, pair-tables, and the
/// typed secondary-structure tree.
pub mod structure {
    pub use ::ff_structure::*;
}

/// Exposing fuzzyfold::energy: nucleotide/pair-kind encodings, parameter
/// file parsing, temperature scaling, and free energy evaluation.
pub mod energy {
    pub use ::ff_energy::*;
}

/// Various flavors of handling sequence/structure input.
pub mod input_parsers;

/// Exposing the currently supported parameters of fuzzyfold's energy models.
pub mod energy_parsers;
