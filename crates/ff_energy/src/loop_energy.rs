//! Per-loop-kind energy rules (component F): the exterior stem
//! contribution, stem-structure dispatch by kind, hairpin energy, and the
//! multi-loop stem term shared by the top-level evaluator's multi-loop walk.

use ff_structure::{Stem, StemStructure, StemStructureKind};

use crate::nn_parsing::{ScaledParameters, Table};
use crate::{BasePairKind, NucleotideKind, MAX_LOOP_LEN};

/// Whether dangling-end contributions are added at helix ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DanglingEndsModel {
    None,
    Double,
}

fn axis(nt: NucleotideKind) -> usize {
    NucleotideKind::axis_code(Some(nt))
}

/// `table[n]` for `n <= MAX_LOOP_LEN`, else the log-extrapolated value from
/// `table[MAX_LOOP_LEN]`.
fn log_extrapolate(table: &Table, n: usize, log_extrapolation_constant: f64) -> i32 {
    if n <= MAX_LOOP_LEN {
        table.get(&[n])
    } else {
        let base = table.get(&[MAX_LOOP_LEN]);
        let bonus = log_extrapolation_constant * (n as f64 / MAX_LOOP_LEN as f64).ln();
        base + bonus.round() as i32
    }
}

/// Ninio asymmetry penalty, capped at `max_ninio`.
fn ninio_term(a: usize, b: usize, params: &ScaledParameters) -> i32 {
    (((b as i32) - (a as i32)) * params.ninio).min(params.max_ninio)
}

/// Resolve a potential dangling-end neighbor: `None` under the `None`
/// model, or when there is no nucleotide on that side of the sequence.
pub fn resolve_mismatch(
    seq: &[NucleotideKind],
    neighbor: Option<usize>,
    dangle: DanglingEndsModel,
) -> Option<usize> {
    if dangle == DanglingEndsModel::None {
        return None;
    }
    neighbor.map(|idx| axis(seq[idx]))
}

fn stem_closing_term(
    mismatch: &Table,
    dangle5: &Table,
    dangle3: &Table,
    terminal_au_penalty: i32,
    pk: BasePairKind,
    mm5: Option<usize>,
    mm3: Option<usize>,
) -> i32 {
    let mut e = match (mm5, mm3) {
        (Some(m5), Some(m3)) => mismatch.get(&[pk.code(), m5, m3]),
        (Some(m5), None) => dangle5.get(&[pk.code(), m5]),
        (None, Some(m3)) => dangle3.get(&[pk.code(), m3]),
        (None, None) => 0,
    };
    if pk.is_terminal_au() {
        e += terminal_au_penalty;
    }
    e
}

/// §4.6.1: the stem closed by `(cfp, ctp)` viewed from the exterior loop,
/// its mismatches resolved from the sequence boundaries and the
/// dangling-end model.
pub fn exterior_stem_term(
    params: &ScaledParameters,
    seq: &[NucleotideKind],
    cfp: usize,
    ctp: usize,
    length: usize,
    dangle: DanglingEndsModel,
) -> i32 {
    let pk = BasePairKind::encode(seq[cfp], seq[ctp]);
    let fp_neighbor = if cfp > 0 { Some(cfp - 1) } else { None };
    let tp_neighbor = if ctp < length - 1 { Some(ctp + 1) } else { None };
    let mm5 = resolve_mismatch(seq, fp_neighbor, dangle);
    let mm3 = resolve_mismatch(seq, tp_neighbor, dangle);
    stem_closing_term(
        &params.mismatch_exterior,
        &params.dangle5,
        &params.dangle3,
        params.terminal_au_penalty,
        pk,
        mm5,
        mm3,
    )
}

/// §4.6.4's shared "multi-loop stem term" helper. `mm5`/`mm3` are already
/// resolved against the dangling-end model by the caller.
pub fn multi_loop_stem_term(
    params: &ScaledParameters,
    pk: BasePairKind,
    mm5: Option<usize>,
    mm3: Option<usize>,
) -> i32 {
    stem_closing_term(
        &params.mismatch_multi,
        &params.dangle5,
        &params.dangle3,
        params.terminal_au_penalty,
        pk,
        mm5,
        mm3,
    ) + params.multi_loop_intern[pk.code()]
}

/// §4.6.2: dispatches on `structure.kind`, summing to a single deca-cal/mol
/// contribution for this stem-structure.
pub fn stem_structure_energy(params: &ScaledParameters, seq: &[NucleotideKind], structure: &StemStructure) -> i32 {
    let cfp = structure.closing_five_prime_idx;
    let ctp = structure.closing_three_prime_idx;
    let efp = structure.enclosed_five_prime_idx;
    let etp = structure.enclosed_three_prime_idx;
    let closing = BasePairKind::encode(seq[cfp], seq[ctp]);
    let enclosed = BasePairKind::encode(seq[efp], seq[etp]);

    match structure.kind {
        StemStructureKind::StackingPair => params.stacking_pair.get(&[closing.code(), enclosed.code()]),
        StemStructureKind::Bulge => {
            let b = structure.n_unpaired_five_prime.max(structure.n_unpaired_three_prime);
            let base = log_extrapolate(&params.bulge, b, params.log_extrapolation_constant);
            if b == 1 {
                base + params.stacking_pair.get(&[closing.code(), enclosed.code()])
            } else {
                let mut penalty = 0;
                if closing.is_terminal_au() {
                    penalty += params.terminal_au_penalty;
                }
                if enclosed.is_terminal_au() {
                    penalty += params.terminal_au_penalty;
                }
                base + penalty
            }
        }
        StemStructureKind::Interior1x1 => {
            let mm5c = axis(seq[cfp + 1]);
            let mm3c = axis(seq[ctp - 1]);
            params.interior_1x1.get(&[closing.code(), enclosed.code(), mm5c, mm3c])
        }
        StemStructureKind::Interior2x1 => {
            let mm5c = axis(seq[cfp + 1]);
            let mm3c = axis(seq[ctp - 1]);
            let mm5e = axis(seq[efp - 1]);
            let mm3e = axis(seq[etp + 1]);
            if structure.n_unpaired_five_prime == 2 {
                params
                    .interior_2x1
                    .get(&[closing.code(), enclosed.code(), mm5c, mm5e, mm3c])
            } else {
                params
                    .interior_2x1
                    .get(&[enclosed.code(), closing.code(), mm3e, mm3c, mm5c])
            }
        }
        StemStructureKind::Interior1xn => {
            let mm5c = axis(seq[cfp + 1]);
            let mm3c = axis(seq[ctp - 1]);
            let mm5e = axis(seq[efp - 1]);
            let mm3e = axis(seq[etp + 1]);
            let a = structure.n_unpaired_five_prime.min(structure.n_unpaired_three_prime);
            let b = structure.n_unpaired_five_prime.max(structure.n_unpaired_three_prime);
            let base = log_extrapolate(&params.interior_loop, a + b, params.log_extrapolation_constant);
            base + ninio_term(a, b, params)
                + params.mismatch_1xn_interior.get(&[closing.code(), mm5c, mm3c])
                + params.mismatch_1xn_interior.get(&[enclosed.code(), mm5e, mm3e])
        }
        StemStructureKind::Interior2x2 => {
            let mm5c = axis(seq[cfp + 1]);
            let mm3c = axis(seq[ctp - 1]);
            let mm5e = axis(seq[efp - 1]);
            let mm3e = axis(seq[etp + 1]);
            params
                .interior_2x2
                .get(&[closing.code(), enclosed.code(), mm5c, mm3e, mm5e, mm3c])
        }
        StemStructureKind::Interior2x3 => {
            let mm5c = axis(seq[cfp + 1]);
            let mm3c = axis(seq[ctp - 1]);
            let mm5e = axis(seq[efp - 1]);
            let mm3e = axis(seq[etp + 1]);
            let (a, b) = (2, 3);
            let base = log_extrapolate(&params.interior_loop, a + b, params.log_extrapolation_constant);
            base + ninio_term(a, b, params)
                + params.mismatch_2x3_interior.get(&[closing.code(), mm5c, mm3c])
                + params.mismatch_2x3_interior.get(&[enclosed.code(), mm5e, mm3e])
        }
        StemStructureKind::GenericInterior => {
            let mm5c = axis(seq[cfp + 1]);
            let mm3c = axis(seq[ctp - 1]);
            let mm5e = axis(seq[efp - 1]);
            let mm3e = axis(seq[etp + 1]);
            let a = structure.n_unpaired_five_prime.min(structure.n_unpaired_three_prime);
            let b = structure.n_unpaired_five_prime.max(structure.n_unpaired_three_prime);
            let base = log_extrapolate(&params.interior_loop, a + b, params.log_extrapolation_constant);
            base + ninio_term(a, b, params)
                + params.mismatch_interior.get(&[closing.code(), mm5c, mm3c])
                + params.mismatch_interior.get(&[enclosed.code(), mm5e, mm3e])
        }
    }
}

/// Sum of every stem-structure's energy in a stem. A stem with no internal
/// structures (an immediate hairpin or multi-loop) scores `0`.
pub fn stem_energy(params: &ScaledParameters, seq: &[NucleotideKind], stem: &Stem) -> i32 {
    stem.structures.iter().map(|s| stem_structure_energy(params, seq, s)).sum()
}

/// §4.6.3: hairpin loop energy, given the closing pair `(cfp, ctp)` of the
/// hairpin's stem.
pub fn hairpin_energy(params: &ScaledParameters, seq: &[NucleotideKind], cfp: usize, ctp: usize) -> i32 {
    let n = ctp - cfp - 1;
    let pk = BasePairKind::encode(seq[cfp], seq[ctp]);
    let base = log_extrapolate(&params.hairpin, n, params.log_extrapolation_constant);

    if n < 3 {
        return base;
    }

    let window: String = seq[cfp..=ctp].iter().map(|nt| nt.to_string()).collect();

    if n == 3 {
        if let Some(&e) = params.tri_loop.get(&window) {
            return e;
        }
        let au = if pk.is_terminal_au() { params.terminal_au_penalty } else { 0 };
        return base + au;
    }
    if n == 4 {
        if let Some(&e) = params.tetra_loop.get(&window) {
            return e;
        }
    }
    if n == 6 {
        if let Some(&e) = params.hexa_loop.get(&window) {
            return e;
        }
    }

    let mm5 = axis(seq[cfp + 1]);
    let mm3 = axis(seq[ctp - 1]);
    base + params.mismatch_hairpin.get(&[pk.code(), mm5, mm3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{encode_sequence, parameters::ParameterSet};

    fn turner2004(temperature_c: f64) -> ScaledParameters {
        ParameterSet::Turner2004.scaled(temperature_c).unwrap()
    }

    #[test]
    fn test_stacking_pair_uses_stack_table_directly() {
        let params = turner2004(37.0);
        let seq = encode_sequence("CGCG").unwrap();
        let structure = StemStructure {
            closing_five_prime_idx: 0,
            closing_three_prime_idx: 3,
            enclosed_five_prime_idx: 1,
            enclosed_three_prime_idx: 2,
            n_unpaired_five_prime: 0,
            n_unpaired_three_prime: 0,
            kind: StemStructureKind::StackingPair,
            energy: 0,
        };
        let closing = BasePairKind::encode(seq[0], seq[3]);
        let enclosed = BasePairKind::encode(seq[1], seq[2]);
        let expected = params.stacking_pair.get(&[closing.code(), enclosed.code()]);
        assert_eq!(stem_structure_energy(&params, &seq, &structure), expected);
    }

    #[test]
    fn test_hairpin_short_loop_skips_dictionaries() {
        let params = turner2004(37.0);
        let seq = encode_sequence("CGAAG").unwrap();
        let e = hairpin_energy(&params, &seq, 0, 4);
        let expected = log_extrapolate(&params.hairpin, 2, params.log_extrapolation_constant);
        assert_eq!(e, expected);
    }

    #[test]
    fn test_hairpin_triloop_dictionary_hit_bypasses_formula() {
        let params = turner2004(37.0);
        let (seq_str, energy) = params
            .tri_loop
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .next()
            .expect("seeded parameter set ships at least one triloop");
        let seq = encode_sequence(&seq_str).unwrap();
        let e = hairpin_energy(&params, &seq, 0, seq.len() - 1);
        assert_eq!(e, energy);
    }

    #[test]
    fn test_terminal_au_penalty_added_for_au_closing_pair() {
        let params = turner2004(37.0);
        let au = BasePairKind::AU;
        assert!(au.is_terminal_au());
        let e = exterior_stem_term(&params, &encode_sequence("AUUUUU").unwrap(), 0, 5, 6, DanglingEndsModel::None);
        // with no dangling neighbors, the only contribution is the AU penalty
        assert_eq!(e, params.terminal_au_penalty);
    }

    #[test]
    fn test_resolve_mismatch_none_model_always_none() {
        let seq = encode_sequence("ACGU").unwrap();
        assert_eq!(resolve_mismatch(&seq, Some(0), DanglingEndsModel::None), None);
    }
}
