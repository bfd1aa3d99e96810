//! The top-level evaluator (component G): validates inputs, builds the
//! structure tree and scaled parameters, then walks the tree filling in
//! every `energy` field.

use std::fmt;

use ff_structure::{decompose_structure, Element, PairTable, SecondaryStructure, Stem, StructureError};

use crate::loop_energy::{
    exterior_stem_term, hairpin_energy, multi_loop_stem_term, resolve_mismatch, stem_energy, DanglingEndsModel,
};
use crate::nn_parsing::{ParamError, ScaledParameters};
use crate::nucleotides::SequenceError;
use crate::parameters::ParameterSet;
use crate::{encode_sequence, BasePairKind, NucleotideKind};

#[derive(Debug)]
pub enum MfeError {
    LengthMismatch { sequence_len: usize, structure_len: usize },
    EmptyInput,
    InvalidRna(SequenceError),
    Structure(StructureError),
    Parameter(ParamError),
}

impl fmt::Display for MfeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MfeError::LengthMismatch { sequence_len, structure_len } => write!(
                f,
                "sequence length {} does not match structure length {}",
                sequence_len, structure_len
            ),
            MfeError::EmptyInput => write!(f, "sequence and structure must not be empty"),
            MfeError::InvalidRna(e) => write!(f, "{}", e),
            MfeError::Structure(e) => write!(f, "{}", e),
            MfeError::Parameter(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MfeError {}

impl From<SequenceError> for MfeError {
    fn from(e: SequenceError) -> Self {
        MfeError::InvalidRna(e)
    }
}

impl From<StructureError> for MfeError {
    fn from(e: StructureError) -> Self {
        MfeError::Structure(e)
    }
}

impl From<ParamError> for MfeError {
    fn from(e: ParamError) -> Self {
        MfeError::Parameter(e)
    }
}

/// The pair `(efp, etp)` a multi-loop stem's own stem term is scored
/// against: the stem's enclosed pair, or the "virtual" `CG`/no-neighbor
/// fallback when the stem has no enclosed pair at all.
fn inner_closing_pair(seq: &[NucleotideKind], stem: &Stem, dangle: DanglingEndsModel) -> (BasePairKind, Option<usize>, Option<usize>) {
    if stem.enclosed_five_prime_idx < 0 {
        return (BasePairKind::CG, None, None);
    }
    let efp = stem.enclosed_five_prime_idx as usize;
    let etp = stem.enclosed_three_prime_idx as usize;
    let pk = BasePairKind::encode(seq[efp], seq[etp]);
    let mm5 = resolve_mismatch(seq, Some(efp + 1), dangle);
    let mm3 = resolve_mismatch(seq, Some(etp - 1), dangle);
    (pk, mm5, mm3)
}

/// The `(cfp, ctp)` pair that actually closes a hairpin or multi-loop's
/// interior: the stem's enclosed pair if it has one, else its own closing
/// pair (an immediate hairpin/multi-loop with no stacked pairs above it).
fn loop_closing_pair(stem: &Stem) -> (usize, usize) {
    if stem.enclosed_five_prime_idx < 0 {
        (stem.closing_five_prime_idx, stem.closing_three_prime_idx)
    } else {
        (stem.enclosed_five_prime_idx as usize, stem.enclosed_three_prime_idx as usize)
    }
}

/// Score one element in place, returning its own `stem.energy + loop energy`
/// (what a parent multi-loop needs for `substructures_energy`).
fn score_element(params: &ScaledParameters, seq: &[NucleotideKind], element: &mut Element, dangle: DanglingEndsModel) -> i32 {
    match element {
        Element::SingleStranded { .. } => 0,
        Element::Hairpin { stem, energy, .. } => {
            stem.energy = stem_energy(params, seq, stem);
            let (cfp, ctp) = loop_closing_pair(stem);
            *energy = hairpin_energy(params, seq, cfp, ctp);
            stem.energy + *energy
        }
        Element::MultiLoop { stem, substructures, loop_energy, substructures_energy } => {
            stem.energy = stem_energy(params, seq, stem);

            let mut unpaired = 0usize;
            let mut subs_energy = 0i32;
            let mut branch_terms = 0i32;

            for sub in substructures.iter_mut() {
                match sub {
                    Element::SingleStranded { five_prime_idx, three_prime_idx } => {
                        unpaired += three_prime_idx + 1 - five_prime_idx;
                    }
                    Element::Hairpin { stem: sub_stem, .. } | Element::MultiLoop { stem: sub_stem, .. } => {
                        let sub_cfp = sub_stem.closing_five_prime_idx;
                        let sub_ctp = sub_stem.closing_three_prime_idx;
                        let pk = BasePairKind::encode(seq[sub_cfp], seq[sub_ctp]);
                        let mm5 = resolve_mismatch(seq, Some(sub_cfp - 1), dangle);
                        let mm3 = resolve_mismatch(seq, Some(sub_ctp + 1), dangle);
                        branch_terms += multi_loop_stem_term(params, pk, mm5, mm3);
                        subs_energy += score_element(params, seq, sub, dangle);
                    }
                }
            }

            let (inner_pk, inner_mm5, inner_mm3) = inner_closing_pair(seq, stem, dangle);
            let inner_term = multi_loop_stem_term(params, inner_pk, inner_mm5, inner_mm3);

            *substructures_energy = subs_energy;
            *loop_energy = params.multi_loop_closing_penalty
                + branch_terms
                + inner_term
                + (unpaired as i32) * params.multi_loop_unpaired_bonus;

            stem.energy + *loop_energy + *substructures_energy
        }
    }
}

/// `DecomposeStructure` + `EvaluateSecondaryStructure`: mutate every energy
/// field of `tree` in place, returning the total.
pub fn evaluate_secondary_structure(
    params: &ScaledParameters,
    seq: &[NucleotideKind],
    tree: &mut SecondaryStructure,
    dangle: DanglingEndsModel,
) -> i32 {
    let length = tree.length;
    let mut exterior_energy = 0i32;
    let mut total = 0i32;

    for element in tree.elements.iter_mut() {
        match element {
            Element::SingleStranded { .. } => {}
            Element::Hairpin { stem, .. } | Element::MultiLoop { stem, .. } => {
                exterior_energy += exterior_stem_term(
                    params,
                    seq,
                    stem.closing_five_prime_idx,
                    stem.closing_three_prime_idx,
                    length,
                    dangle,
                );
            }
        }
        total += score_element(params, seq, element, dangle);
    }

    tree.exterior_energy = exterior_energy;
    tree.total_energy = exterior_energy + total;
    tree.total_energy
}

/// `MinimumFreeEnergy`: validate, decompose, scale parameters, evaluate.
pub fn minimum_free_energy(
    sequence: &str,
    dot_bracket: &str,
    temperature_c: f64,
    set: ParameterSet,
    dangle: DanglingEndsModel,
) -> Result<(f64, SecondaryStructure), MfeError> {
    let sequence = sequence.trim().to_uppercase();
    let dot_bracket = dot_bracket.trim();

    if sequence.is_empty() || dot_bracket.is_empty() {
        return Err(MfeError::EmptyInput);
    }
    if sequence.chars().count() != dot_bracket.chars().count() {
        return Err(MfeError::LengthMismatch {
            sequence_len: sequence.chars().count(),
            structure_len: dot_bracket.chars().count(),
        });
    }

    let seq = encode_sequence(&sequence)?;
    let pair_table = PairTable::try_from(dot_bracket)?;
    let mut tree = decompose_structure(&pair_table);

    let params = set.scaled(temperature_c)?;
    let total = evaluate_secondary_structure(&params, &seq, &mut tree, dangle);

    Ok((total as f64 / 100.0, tree))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaired_only_structure_has_zero_energy() {
        let (kcal, tree) = minimum_free_energy(
            "AUUCUUGCUUCAACAGUGUUUGAACGGAAU",
            "..............................",
            37.0,
            ParameterSet::Turner2004,
            DanglingEndsModel::Double,
        )
        .unwrap();
        assert_eq!(kcal, 0.0);
        assert_eq!(tree.elements.len(), 1);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = minimum_free_energy("ACGU", "...", 37.0, ParameterSet::Turner2004, DanglingEndsModel::Double)
            .unwrap_err();
        assert!(matches!(err, MfeError::LengthMismatch { .. }));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = minimum_free_energy("", "", 37.0, ParameterSet::Turner2004, DanglingEndsModel::Double).unwrap_err();
        assert!(matches!(err, MfeError::EmptyInput));
    }

    #[test]
    fn test_invalid_rna_rejected() {
        let err = minimum_free_energy("ACGT", "....", 37.0, ParameterSet::Turner2004, DanglingEndsModel::Double)
            .unwrap_err();
        assert!(matches!(err, MfeError::InvalidRna(_)));
    }

    #[test]
    fn test_unbalanced_structure_rejected() {
        let err = minimum_free_energy("ACGU", "(...", 37.0, ParameterSet::Turner2004, DanglingEndsModel::Double)
            .unwrap_err();
        assert!(matches!(err, MfeError::Structure(_)));
    }

    #[test]
    fn test_simple_hairpin_has_negative_stem_contribution() {
        let (kcal, tree) = minimum_free_energy(
            "AAAACGGUCCUUAUCAGGACCAAACA",
            ".....((((((....)))))).....",
            37.0,
            ParameterSet::Turner2004,
            DanglingEndsModel::Double,
        )
        .unwrap();
        assert!(kcal.is_finite());
        assert!(tree.total_energy != 0);
    }
}
