//! Temperature scaling (component C) and the sealed [`ScaledParameters`]
//! bundle assembled from a parsed [`super::raw::RawParameters`] plus the
//! axis padding of component B.

use rustc_hash::FxHashMap;

use super::raw::RawParameters;
use super::table::Table;
use crate::{N_NUCLEOTIDES, N_PAIR_KINDS};
use crate::INF;

/// `ΔG(T) = ΔH − T·ΔS`, truncated toward zero. `dg37 == INF` passes through
/// untouched: an infeasible table entry stays infeasible at every
/// temperature.
pub fn scale_entry(dg37: i32, dh: i32, temperature_c: f64) -> i32 {
    if dg37 >= INF {
        return INF;
    }
    if temperature_c == 37.0 {
        return dg37;
    }
    let ds = (dh - dg37) as f64;
    let scale = (temperature_c + 273.15) / (37.0 + 273.15);
    (dh as f64 - ds * scale).trunc() as i32
}

/// Float counterpart used for the log-extrapolation constant, which stays a
/// float rather than truncating to an integer deca-cal/mol value.
pub fn scale_entry_f64(dg37: f64, dh: f64, temperature_c: f64) -> f64 {
    if temperature_c == 37.0 {
        return dg37;
    }
    let ds = dh - dg37;
    let scale = (temperature_c + 273.15) / (37.0 + 273.15);
    dh - ds * scale
}

fn scale_table(dg: &Table, dh: &Table, temperature_c: f64, clamp_nonpositive: bool) -> Table {
    dg.combine(dh, |g, h| {
        let v = scale_entry(g, h, temperature_c);
        if clamp_nonpositive { v.min(0) } else { v }
    })
}

fn scale_loop_map(
    raw: &FxHashMap<String, (i32, i32)>,
    temperature_c: f64,
) -> FxHashMap<String, i32> {
    raw.iter()
        .map(|(seq, (en, enth))| (seq.clone(), scale_entry(*en, *enth, temperature_c)))
        .collect()
}

/// The fully scaled, axis-padded parameter bundle. Immutable after
/// construction; safe to share across concurrent evaluations.
pub struct ScaledParameters {
    pub stacking_pair: Table,

    pub hairpin: Table,
    pub bulge: Table,
    pub interior_loop: Table,

    pub mismatch_interior: Table,
    pub mismatch_1xn_interior: Table,
    pub mismatch_2x3_interior: Table,
    pub mismatch_exterior: Table,
    pub mismatch_hairpin: Table,
    pub mismatch_multi: Table,

    pub dangle5: Table,
    pub dangle3: Table,

    pub interior_1x1: Table,
    pub interior_2x1: Table,
    pub interior_2x2: Table,

    pub log_extrapolation_constant: f64,
    pub terminal_au_penalty: i32,
    pub multi_loop_unpaired_bonus: i32,
    pub multi_loop_closing_penalty: i32,
    pub ninio: i32,
    pub max_ninio: i32,

    pub multi_loop_intern: Vec<i32>,

    pub tri_loop: FxHashMap<String, i32>,
    pub tetra_loop: FxHashMap<String, i32>,
    pub hexa_loop: FxHashMap<String, i32>,
}

impl ScaledParameters {
    pub fn new(raw: &RawParameters, temperature_c: f64) -> Self {
        debug_assert_eq!(N_PAIR_KINDS, 7);
        debug_assert_eq!(N_NUCLEOTIDES, 4);

        let stacking_pair =
            scale_table(&raw.stack, &raw.stack_enthalpies, temperature_c, false).offset(&[1, 1], false, INF);

        let hairpin = scale_table(&raw.hairpin, &raw.hairpin_enthalpies, temperature_c, false);
        let bulge = scale_table(&raw.bulge, &raw.bulge_enthalpies, temperature_c, false);
        let interior_loop = scale_table(&raw.interior, &raw.interior_enthalpies, temperature_c, false);

        let mismatch_interior = scale_table(&raw.mismatch_interior, &raw.mismatch_interior_enthalpies, temperature_c, false)
            .offset(&[1, 0, 0], false, INF);
        let mismatch_1xn_interior = scale_table(
            &raw.mismatch_interior_1n,
            &raw.mismatch_interior_1n_enthalpies,
            temperature_c,
            false,
        )
        .offset(&[1, 0, 0], false, INF);
        let mismatch_2x3_interior = scale_table(
            &raw.mismatch_interior_23,
            &raw.mismatch_interior_23_enthalpies,
            temperature_c,
            false,
        )
        .offset(&[1, 0, 0], false, INF);
        let mismatch_exterior = scale_table(&raw.mismatch_exterior, &raw.mismatch_exterior_enthalpies, temperature_c, true)
            .offset(&[1, 0, 0], false, INF);
        let mismatch_hairpin = scale_table(&raw.mismatch_hairpin, &raw.mismatch_hairpin_enthalpies, temperature_c, false)
            .offset(&[1, 0, 0], false, INF);
        let mismatch_multi = scale_table(&raw.mismatch_multi, &raw.mismatch_multi_enthalpies, temperature_c, true)
            .offset(&[1, 0, 0], false, INF);

        let dangle5 = scale_table(&raw.dangle5, &raw.dangle5_enthalpies, temperature_c, true).offset(&[1, 0], false, INF);
        let dangle3 = scale_table(&raw.dangle3, &raw.dangle3_enthalpies, temperature_c, true).offset(&[1, 0], false, INF);

        let interior_1x1 =
            scale_table(&raw.int11, &raw.int11_enthalpies, temperature_c, false).offset(&[1, 1, 0, 0], false, INF);
        let interior_2x1 =
            scale_table(&raw.int21, &raw.int21_enthalpies, temperature_c, false).offset(&[1, 1, 0, 0, 0], false, INF);
        let interior_2x2 = scale_table(&raw.int22, &raw.int22_enthalpies, temperature_c, false)
            .offset(&[0, 0, 1, 1, 1, 1], false, INF)
            .offset(&[1, 1, 0, 0, 0, 0], true, INF);

        let multi_loop_unpaired_bonus =
            scale_entry(raw.ml_params.base_en37, raw.ml_params.base_enth, temperature_c);
        let multi_loop_closing_penalty =
            scale_entry(raw.ml_params.closing_en37, raw.ml_params.closing_enth, temperature_c);
        let multi_loop_intern_scalar =
            scale_entry(raw.ml_params.intern_en37, raw.ml_params.intern_enth, temperature_c);
        let multi_loop_intern = vec![multi_loop_intern_scalar; crate::MAX_LOOP_LEN + 1];

        let ninio = scale_entry(raw.ninio.en37, raw.ninio.enth, temperature_c);
        let max_ninio = raw.ninio.max;

        let terminal_au_penalty =
            scale_entry(raw.misc.terminal_au_en37, raw.misc.terminal_au_enth, temperature_c);
        let log_extrapolation_constant =
            scale_entry_f64(raw.misc.log_extrapolation_constant, 0.0, temperature_c);

        ScaledParameters {
            stacking_pair,
            hairpin,
            bulge,
            interior_loop,
            mismatch_interior,
            mismatch_1xn_interior,
            mismatch_2x3_interior,
            mismatch_exterior,
            mismatch_hairpin,
            mismatch_multi,
            dangle5,
            dangle3,
            interior_1x1,
            interior_2x1,
            interior_2x2,
            log_extrapolation_constant,
            terminal_au_penalty,
            multi_loop_unpaired_bonus,
            multi_loop_closing_penalty,
            ninio,
            max_ninio,
            multi_loop_intern,
            tri_loop: scale_loop_map(&raw.tri_loop, temperature_c),
            tetra_loop: scale_loop_map(&raw.tetra_loop, temperature_c),
            hexa_loop: scale_loop_map(&raw.hexa_loop, temperature_c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_entry_at_measurement_temperature_is_identity() {
        assert_eq!(scale_entry(-240, -330, 37.0), -240);
    }

    #[test]
    fn test_scale_entry_inf_passes_through() {
        assert_eq!(scale_entry(INF, 0, 4.0), INF);
        assert_eq!(scale_entry(INF, 0, 37.0), INF);
    }

    #[test]
    fn test_scale_entry_truncates_toward_zero() {
        // dS = dH - dG = -330 - (-240) = -90; scale@4C = 277.15/310.15
        let v = scale_entry(-240, -330, 4.0);
        let expected = (-330.0 - (-90.0) * (277.15 / 310.15)).trunc() as i32;
        assert_eq!(v, expected);
    }

    #[test]
    fn test_clamp_applied_to_dangles_and_mismatch_multi_exterior() {
        let raw = RawParameters::parse(
            "## RNAfold parameter file v2.0\n# dangle5\n10 10 10 10 10\n10 10 10 10 10\n10 10 10 10 10\n10 10 10 10 10\n10 10 10 10 10\n10 10 10 10 10\n# END\n",
        )
        .unwrap();
        let scaled = ScaledParameters::new(&raw, 37.0);
        assert!(scaled.dangle5.get(&[1, 0]) <= 0);
    }
}
