//! The typed secondary-structure tree: turns a pair table into nested
//! exterior/stem/hairpin/multi-loop elements, classifying each stem-structure
//! by its loop-size signature along the way.

use crate::PairTable;

/// Classifies the region between two consecutive paired positions in a stem
/// by the number of unpaired bases on each strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemStructureKind {
    StackingPair,
    Bulge,
    Interior1x1,
    Interior2x1,
    Interior1xn,
    Interior2x2,
    Interior2x3,
    GenericInterior,
}

impl StemStructureKind {
    /// `m` is the smaller, `n` the larger of the two unpaired-base counts.
    pub fn classify(m: usize, n: usize) -> Self {
        match (m, n) {
            (0, 0) => StemStructureKind::StackingPair,
            (0, _) => StemStructureKind::Bulge,
            (1, 1) => StemStructureKind::Interior1x1,
            (1, 2) => StemStructureKind::Interior2x1,
            (1, n) if n >= 3 => StemStructureKind::Interior1xn,
            (2, 2) => StemStructureKind::Interior2x2,
            (2, 3) => StemStructureKind::Interior2x3,
            _ => StemStructureKind::GenericInterior,
        }
    }
}

/// One region between two consecutive paired positions in a stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemStructure {
    pub closing_five_prime_idx: usize,
    pub closing_three_prime_idx: usize,
    pub enclosed_five_prime_idx: usize,
    pub enclosed_three_prime_idx: usize,
    pub n_unpaired_five_prime: usize,
    pub n_unpaired_three_prime: usize,
    pub kind: StemStructureKind,
    pub energy: i32,
}

impl StemStructure {
    fn new(cfp: usize, ctp: usize, efp: usize, etp: usize) -> Self {
        let n_five = efp - cfp - 1;
        let n_three = ctp - etp - 1;
        let (m, n) = if n_five <= n_three {
            (n_five, n_three)
        } else {
            (n_three, n_five)
        };
        StemStructure {
            closing_five_prime_idx: cfp,
            closing_three_prime_idx: ctp,
            enclosed_five_prime_idx: efp,
            enclosed_three_prime_idx: etp,
            n_unpaired_five_prime: n_five,
            n_unpaired_three_prime: n_three,
            kind: StemStructureKind::classify(m, n),
            energy: 0,
        }
    }
}

/// A run of consecutive base pairs, possibly interrupted by stem-structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stem {
    pub closing_five_prime_idx: usize,
    pub closing_three_prime_idx: usize,
    /// `-1` when the stem has no internal pair (the closing pair is the
    /// only pair of its helix).
    pub enclosed_five_prime_idx: i64,
    pub enclosed_three_prime_idx: i64,
    pub structures: Vec<StemStructure>,
    pub energy: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A maximal run of unpaired bases at the exterior level or inside a
    /// multi-loop.
    SingleStranded {
        five_prime_idx: usize,
        three_prime_idx: usize,
    },
    /// A helix whose innermost enclosed pair borders a single unpaired
    /// region (possibly empty).
    Hairpin {
        stem: Stem,
        ss_five_prime_idx: i64,
        ss_three_prime_idx: i64,
        energy: i32,
    },
    /// A helix whose innermost enclosed pair borders two or more
    /// sub-elements.
    MultiLoop {
        stem: Stem,
        substructures: Vec<Element>,
        loop_energy: i32,
        substructures_energy: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryStructure {
    pub length: usize,
    pub exterior_energy: i32,
    pub total_energy: i32,
    pub elements: Vec<Element>,
}

/// Build the structure tree from a pair table. Pure: every energy field is
/// left at zero, to be filled in later by the evaluator.
pub fn decompose_structure(pair_table: &PairTable) -> SecondaryStructure {
    let length = pair_table.len();
    SecondaryStructure {
        length,
        exterior_energy: 0,
        total_energy: 0,
        elements: scan_region(pair_table, 0, length),
    }
}

/// Scan `[start, end)`, emitting single-stranded runs and recursing on every
/// closing pair encountered.
fn scan_region(pair_table: &PairTable, start: usize, end: usize) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut run_start = start;
    let mut i = start;

    while i < end {
        match pair_table[i] {
            None => i += 1,
            Some(j) => {
                if i > run_start {
                    elements.push(Element::SingleStranded {
                        five_prime_idx: run_start,
                        three_prime_idx: i - 1,
                    });
                }
                elements.push(decompose_loop(pair_table, i, j));
                i = j + 1;
                run_start = i;
            }
        }
    }

    if run_start < end {
        elements.push(Element::SingleStranded {
            five_prime_idx: run_start,
            three_prime_idx: end - 1,
        });
    }

    elements
}

/// Stack-walk the stem closed by `(i, j)` inward, then branch into a
/// hairpin or multi-loop depending on what the walk finds at its core.
fn decompose_loop(pair_table: &PairTable, i: usize, j: usize) -> Element {
    let mut cfp = i;
    let mut ctp = j;
    let mut structures = Vec::new();

    let (efp, etp) = loop {
        let mut efp = cfp + 1;
        while efp < ctp && pair_table[efp].is_none() {
            efp += 1;
        }
        let mut etp = ctp - 1;
        while etp > efp && pair_table[etp].is_none() {
            etp -= 1;
        }

        if efp < etp && pair_table[efp] == Some(etp) {
            structures.push(StemStructure::new(cfp, ctp, efp, etp));
            cfp = efp;
            ctp = etp;
            continue;
        }
        break (efp, etp);
    };

    let (enclosed_fp, enclosed_tp) = if structures.is_empty() {
        (-1, -1)
    } else {
        (cfp as i64, ctp as i64)
    };

    let stem = Stem {
        closing_five_prime_idx: i,
        closing_three_prime_idx: j,
        enclosed_five_prime_idx: enclosed_fp,
        enclosed_three_prime_idx: enclosed_tp,
        structures,
        energy: 0,
    };

    if efp > etp {
        let (ss_fp, ss_tp) = if ctp >= cfp + 2 {
            (cfp as i64 + 1, ctp as i64 - 1)
        } else {
            (-1, -1)
        };
        Element::Hairpin {
            stem,
            ss_five_prime_idx: ss_fp,
            ss_three_prime_idx: ss_tp,
            energy: 0,
        }
    } else {
        Element::MultiLoop {
            stem,
            substructures: scan_region(pair_table, cfp + 1, ctp),
            loop_energy: 0,
            substructures_energy: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    fn covered_indices(elements: &[Element], out: &mut Vec<usize>) {
        for el in elements {
            match el {
                Element::SingleStranded {
                    five_prime_idx,
                    three_prime_idx,
                } => out.extend(*five_prime_idx..=*three_prime_idx),
                Element::Hairpin {
                    stem,
                    ss_five_prime_idx,
                    ss_three_prime_idx,
                    ..
                } => {
                    cover_stem(stem, out);
                    if *ss_five_prime_idx >= 0 {
                        out.extend(*ss_five_prime_idx as usize..=*ss_three_prime_idx as usize);
                    }
                }
                Element::MultiLoop {
                    stem,
                    substructures,
                    ..
                } => {
                    cover_stem(stem, out);
                    covered_indices(substructures, out);
                }
            }
        }
    }

    fn cover_stem(stem: &Stem, out: &mut Vec<usize>) {
        out.push(stem.closing_five_prime_idx);
        out.push(stem.closing_three_prime_idx);
        for s in &stem.structures {
            out.push(s.closing_five_prime_idx);
            out.push(s.closing_three_prime_idx);
            out.push(s.enclosed_five_prime_idx);
            out.push(s.enclosed_three_prime_idx);
            out.extend(s.closing_five_prime_idx + 1..s.enclosed_five_prime_idx);
            out.extend(s.enclosed_three_prime_idx + 1..s.closing_three_prime_idx);
        }
    }

    #[test]
    fn test_decompose_all_unpaired() {
        let pt = PairTable::try_from("....").unwrap();
        let tree = decompose_structure(&pt);
        assert_eq!(tree.elements.len(), 1);
        assert_eq!(tree.total_energy, 0);
        match &tree.elements[0] {
            Element::SingleStranded {
                five_prime_idx,
                three_prime_idx,
            } => {
                assert_eq!(*five_prime_idx, 0);
                assert_eq!(*three_prime_idx, 3);
            }
            other => panic!("expected SingleStranded, got {:?}", other),
        }
    }

    #[test]
    fn test_decompose_covers_every_index_once() {
        for db in ["..((((...))))...((........))..", ".(...)..(..).", "(())", "((.(..).))"] {
            let pt = PairTable::try_from(db).unwrap();
            let tree = decompose_structure(&pt);
            let mut idxs = Vec::new();
            covered_indices(&tree.elements, &mut idxs);
            idxs.sort_unstable();
            idxs.dedup();
            assert_eq!(idxs, (0..db.len()).collect::<Vec<_>>(), "db = {db}");
        }
    }

    #[test]
    fn test_immediate_hairpin_has_no_enclosed_pair() {
        let pt = PairTable::try_from("((.))").unwrap();
        let tree = decompose_structure(&pt);
        match &tree.elements[0] {
            Element::Hairpin { stem, .. } => {
                assert_eq!(stem.enclosed_five_prime_idx, -1);
                assert_eq!(stem.enclosed_three_prime_idx, -1);
                assert_eq!(stem.energy, 0);
                assert!(stem.structures.is_empty());
            }
            other => panic!("expected Hairpin, got {:?}", other),
        }
    }

    #[test]
    fn test_stacked_pairs_classified_as_stacking_pair() {
        let pt = PairTable::try_from("(())").unwrap();
        let tree = decompose_structure(&pt);
        match &tree.elements[0] {
            Element::Hairpin {
                stem,
                ss_five_prime_idx,
                ss_three_prime_idx,
                ..
            } => {
                assert_eq!(stem.structures.len(), 1);
                assert_eq!(stem.structures[0].kind, StemStructureKind::StackingPair);
                assert_eq!(*ss_five_prime_idx, -1);
                assert_eq!(*ss_three_prime_idx, -1);
            }
            other => panic!("expected Hairpin, got {:?}", other),
        }
    }

    #[test]
    fn test_two_disjoint_hairpins_at_exterior_level() {
        let pt = PairTable::try_from(".(...)..(..).").unwrap();
        let tree = decompose_structure(&pt);
        let hairpins = tree
            .elements
            .iter()
            .filter(|e| matches!(e, Element::Hairpin { .. }))
            .count();
        assert_eq!(hairpins, 2);
    }

    #[test]
    fn test_multiloop_with_two_branches() {
        let pt = PairTable::try_from("((...)..(..))").unwrap();
        let tree = decompose_structure(&pt);
        match &tree.elements[0] {
            Element::MultiLoop { substructures, .. } => {
                let hairpins = substructures
                    .iter()
                    .filter(|e| matches!(e, Element::Hairpin { .. }))
                    .count();
                assert_eq!(hairpins, 2);
            }
            other => panic!("expected MultiLoop, got {:?}", other),
        }
    }

    #[test]
    fn test_decompose_is_pure_and_repeatable() {
        let pt = PairTable::try_from("..((((...))))...((........))..").unwrap();
        let a = decompose_structure(&pt);
        let b = decompose_structure(&pt);
        assert_eq!(a, b);
    }
}
