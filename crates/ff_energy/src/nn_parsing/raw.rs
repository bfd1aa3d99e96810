//! Parses a `## RNAfold parameter file v2.0`-format file into a
//! [`RawParameters`] value: a 1:1 mirror of the file, ΔG₃₇ and ΔH tables kept
//! as matched pairs, not yet offset-padded or temperature-scaled.

use std::borrow::Cow;
use std::fmt;

use rustc_hash::FxHashMap;

use super::table::Table;

#[derive(Debug)]
pub enum ParamError {
    MissingHeader,
    UnknownSection(String),
    InvalidToken(String),
    InvalidLength { section: &'static str, expected: usize, got: usize },
    MissingSection(&'static str),
    UnterminatedComment(String),
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::MissingHeader => {
                write!(f, "missing '## RNAfold parameter file v2.0' header")
            }
            ParamError::UnknownSection(name) => write!(f, "unknown parameter section '{}'", name),
            ParamError::InvalidToken(tok) => write!(f, "invalid numeric token '{}'", tok),
            ParamError::InvalidLength { section, expected, got } => write!(
                f,
                "section '{}' expected {} values, got {}",
                section, expected, got
            ),
            ParamError::MissingSection(name) => write!(f, "parameter file is missing section '{}'", name),
            ParamError::UnterminatedComment(line) => {
                write!(f, "unterminated '/*' comment in line: {}", line)
            }
        }
    }
}

impl std::error::Error for ParamError {}

/// `N_PAIR_KINDS - 1`: the six canonical pairs as they appear in the raw
/// file, before the `NonStandard` lane is added by the offset step.
pub const RAW_PAIRS: usize = 6;
/// `N_NUCLEOTIDES + 1`: the five-wide raw nucleotide axis (sentinel + ACGU),
/// used by every section except `int22`.
pub const RAW_NT5: usize = 5;
/// The four-wide raw nucleotide axis `int22` alone uses.
pub const RAW_NT4: usize = 4;

#[derive(Default)]
pub struct MLParams {
    pub base_en37: i32,
    pub base_enth: i32,
    pub closing_en37: i32,
    pub closing_enth: i32,
    pub intern_en37: i32,
    pub intern_enth: i32,
}

impl MLParams {
    fn from_slice(slice: &[i32]) -> Result<Self, ParamError> {
        if slice.len() != 6 {
            return Err(ParamError::InvalidLength { section: "ML_params", expected: 6, got: slice.len() });
        }
        Ok(MLParams {
            base_en37: slice[0],
            base_enth: slice[1],
            closing_en37: slice[2],
            closing_enth: slice[3],
            intern_en37: slice[4],
            intern_enth: slice[5],
        })
    }
}

#[derive(Default)]
pub struct Ninio {
    pub en37: i32,
    pub enth: i32,
    pub max: i32,
}

impl Ninio {
    fn from_slice(slice: &[i32]) -> Result<Self, ParamError> {
        if slice.len() != 3 {
            return Err(ParamError::InvalidLength { section: "NINIO", expected: 3, got: slice.len() });
        }
        Ok(Ninio { en37: slice[0], enth: slice[1], max: slice[2] })
    }
}

/// `Misc`'s index 2/3 hold the terminal-AU penalty (ΔG₃₇, ΔH); index 5 the
/// log-extrapolation constant, defaulting to `107.856` when the file omits
/// it (older parameter files only declare five entries).
#[derive(Default)]
pub struct Misc {
    pub terminal_au_en37: i32,
    pub terminal_au_enth: i32,
    pub log_extrapolation_constant: f64,
}

const DEFAULT_LOG_EXTRAPOLATION: f64 = 107.856;

impl Misc {
    fn from_slice(slice: &[f64]) -> Result<Self, ParamError> {
        if slice.len() < 4 {
            return Err(ParamError::InvalidLength { section: "Misc", expected: 4, got: slice.len() });
        }
        let log_extrapolation_constant = slice.get(5).copied().unwrap_or_else(|| {
            log::debug!(
                "Misc section has no index-5 log-extrapolation constant, defaulting to {}",
                DEFAULT_LOG_EXTRAPOLATION
            );
            DEFAULT_LOG_EXTRAPOLATION
        });
        Ok(Misc {
            terminal_au_en37: slice[2] as i32,
            terminal_au_enth: slice[3] as i32,
            log_extrapolation_constant,
        })
    }
}

pub struct RawParameters {
    pub stack: Table,
    pub stack_enthalpies: Table,

    pub hairpin: Table,
    pub hairpin_enthalpies: Table,
    pub bulge: Table,
    pub bulge_enthalpies: Table,
    pub interior: Table,
    pub interior_enthalpies: Table,

    pub mismatch_exterior: Table,
    pub mismatch_exterior_enthalpies: Table,
    pub mismatch_hairpin: Table,
    pub mismatch_hairpin_enthalpies: Table,
    pub mismatch_interior: Table,
    pub mismatch_interior_enthalpies: Table,
    pub mismatch_interior_1n: Table,
    pub mismatch_interior_1n_enthalpies: Table,
    pub mismatch_interior_23: Table,
    pub mismatch_interior_23_enthalpies: Table,
    pub mismatch_multi: Table,
    pub mismatch_multi_enthalpies: Table,

    pub int11: Table,
    pub int11_enthalpies: Table,
    pub int21: Table,
    pub int21_enthalpies: Table,
    pub int22: Table,
    pub int22_enthalpies: Table,

    pub dangle5: Table,
    pub dangle5_enthalpies: Table,
    pub dangle3: Table,
    pub dangle3_enthalpies: Table,

    pub ml_params: MLParams,
    pub ninio: Ninio,
    pub misc: Misc,

    pub tri_loop: FxHashMap<String, (i32, i32)>,
    pub tetra_loop: FxHashMap<String, (i32, i32)>,
    pub hexa_loop: FxHashMap<String, (i32, i32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Stack,
    StackEnthalpies,
    Hairpin,
    HairpinEnthalpies,
    Bulge,
    BulgeEnthalpies,
    Interior,
    InteriorEnthalpies,
    MismatchExterior,
    MismatchExteriorEnthalpies,
    MismatchHairpin,
    MismatchHairpinEnthalpies,
    MismatchInterior,
    MismatchInteriorEnthalpies,
    MismatchInterior1n,
    MismatchInterior1nEnthalpies,
    MismatchInterior23,
    MismatchInterior23Enthalpies,
    MismatchMulti,
    MismatchMultiEnthalpies,
    Int11,
    Int11Enthalpies,
    Int21,
    Int21Enthalpies,
    Int22,
    Int22Enthalpies,
    Dangle5,
    Dangle5Enthalpies,
    Dangle3,
    Dangle3Enthalpies,
    MlParams,
    Ninio,
    Misc,
    Triloops,
    Tetraloops,
    Hexaloops,
    End,
}

impl TryFrom<&str> for Section {
    type Error = ParamError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        use Section::*;
        Ok(match name {
            "stack" => Stack,
            "stack_enthalpies" => StackEnthalpies,
            "hairpin" => Hairpin,
            "hairpin_enthalpies" => HairpinEnthalpies,
            "bulge" => Bulge,
            "bulge_enthalpies" => BulgeEnthalpies,
            "interior" => Interior,
            "interior_enthalpies" => InteriorEnthalpies,
            "mismatch_exterior" => MismatchExterior,
            "mismatch_exterior_enthalpies" => MismatchExteriorEnthalpies,
            "mismatch_hairpin" => MismatchHairpin,
            "mismatch_hairpin_enthalpies" => MismatchHairpinEnthalpies,
            "mismatch_interior" => MismatchInterior,
            "mismatch_interior_enthalpies" => MismatchInteriorEnthalpies,
            "mismatch_interior_1n" => MismatchInterior1n,
            "mismatch_interior_1n_enthalpies" => MismatchInterior1nEnthalpies,
            "mismatch_interior_23" => MismatchInterior23,
            "mismatch_interior_23_enthalpies" => MismatchInterior23Enthalpies,
            "mismatch_multi" => MismatchMulti,
            "mismatch_multi_enthalpies" => MismatchMultiEnthalpies,
            "int11" => Int11,
            "int11_enthalpies" => Int11Enthalpies,
            "int21" => Int21,
            "int21_enthalpies" => Int21Enthalpies,
            "int22" => Int22,
            "int22_enthalpies" => Int22Enthalpies,
            "dangle5" => Dangle5,
            "dangle5_enthalpies" => Dangle5Enthalpies,
            "dangle3" => Dangle3,
            "dangle3_enthalpies" => Dangle3Enthalpies,
            "ML_params" => MlParams,
            "NINIO" => Ninio,
            "Misc" => Misc,
            "Triloops" => Triloops,
            "Tetraloops" => Tetraloops,
            "Hexaloops" => Hexaloops,
            "END" => End,
            other => return Err(ParamError::UnknownSection(other.to_string())),
        })
    }
}

impl Section {
    /// Name used in `ParamError::InvalidLength` diagnostics; mirrors the
    /// file's own section header spelling.
    fn name(self) -> &'static str {
        use Section::*;
        match self {
            Stack => "stack",
            StackEnthalpies => "stack_enthalpies",
            Hairpin => "hairpin",
            HairpinEnthalpies => "hairpin_enthalpies",
            Bulge => "bulge",
            BulgeEnthalpies => "bulge_enthalpies",
            Interior => "interior",
            InteriorEnthalpies => "interior_enthalpies",
            MismatchExterior => "mismatch_exterior",
            MismatchExteriorEnthalpies => "mismatch_exterior_enthalpies",
            MismatchHairpin => "mismatch_hairpin",
            MismatchHairpinEnthalpies => "mismatch_hairpin_enthalpies",
            MismatchInterior => "mismatch_interior",
            MismatchInteriorEnthalpies => "mismatch_interior_enthalpies",
            MismatchInterior1n => "mismatch_interior_1n",
            MismatchInterior1nEnthalpies => "mismatch_interior_1n_enthalpies",
            MismatchInterior23 => "mismatch_interior_23",
            MismatchInterior23Enthalpies => "mismatch_interior_23_enthalpies",
            MismatchMulti => "mismatch_multi",
            MismatchMultiEnthalpies => "mismatch_multi_enthalpies",
            Int11 => "int11",
            Int11Enthalpies => "int11_enthalpies",
            Int21 => "int21",
            Int21Enthalpies => "int21_enthalpies",
            Int22 => "int22",
            Int22Enthalpies => "int22_enthalpies",
            Dangle5 => "dangle5",
            Dangle5Enthalpies => "dangle5_enthalpies",
            Dangle3 => "dangle3",
            Dangle3Enthalpies => "dangle3_enthalpies",
            MlParams => "ML_params",
            Ninio => "NINIO",
            Misc => "Misc",
            Triloops => "Triloops",
            Tetraloops => "Tetraloops",
            Hexaloops => "Hexaloops",
            End => "END",
        }
    }
}

fn parse_int_token(tok: &str) -> Result<i32, ParamError> {
    if tok == "INF" {
        return Ok(crate::INF);
    }
    tok.parse::<i32>().map_err(|_| ParamError::InvalidToken(tok.to_string()))
}

fn parse_float_token(tok: &str) -> Result<f64, ParamError> {
    tok.parse::<f64>().map_err(|_| ParamError::InvalidToken(tok.to_string()))
}

/// Strip a `/* ... */` inline comment (assumed to not span lines). Borrows
/// the original line when there's nothing to strip; only allocates when a
/// comment is actually removed.
fn strip_comment(line: &str) -> Result<Cow<'_, str>, ParamError> {
    let Some(start) = line.find("/*") else {
        return Ok(Cow::Borrowed(line));
    };
    match line[start + 2..].find("*/") {
        Some(rel_end) => {
            let end = start + 2 + rel_end;
            let mut s = String::with_capacity(line.len());
            s.push_str(&line[..start]);
            s.push_str(&line[end + 2..]);
            Ok(Cow::Owned(s))
        }
        None => Err(ParamError::UnterminatedComment(line.to_string())),
    }
}

impl RawParameters {
    fn empty() -> Self {
        let pair2 = &[RAW_PAIRS, RAW_PAIRS];
        let mismatch = &[RAW_PAIRS, RAW_NT5, RAW_NT5];
        RawParameters {
            stack: Table::filled(pair2, 0),
            stack_enthalpies: Table::filled(pair2, 0),

            hairpin: Table::filled(&[crate::MAX_LOOP_LEN + 1], crate::INF),
            hairpin_enthalpies: Table::filled(&[crate::MAX_LOOP_LEN + 1], 0),
            bulge: Table::filled(&[crate::MAX_LOOP_LEN + 1], crate::INF),
            bulge_enthalpies: Table::filled(&[crate::MAX_LOOP_LEN + 1], 0),
            interior: Table::filled(&[crate::MAX_LOOP_LEN + 1], crate::INF),
            interior_enthalpies: Table::filled(&[crate::MAX_LOOP_LEN + 1], 0),

            mismatch_exterior: Table::filled(mismatch, 0),
            mismatch_exterior_enthalpies: Table::filled(mismatch, 0),
            mismatch_hairpin: Table::filled(mismatch, 0),
            mismatch_hairpin_enthalpies: Table::filled(mismatch, 0),
            mismatch_interior: Table::filled(mismatch, 0),
            mismatch_interior_enthalpies: Table::filled(mismatch, 0),
            mismatch_interior_1n: Table::filled(mismatch, 0),
            mismatch_interior_1n_enthalpies: Table::filled(mismatch, 0),
            mismatch_interior_23: Table::filled(mismatch, 0),
            mismatch_interior_23_enthalpies: Table::filled(mismatch, 0),
            mismatch_multi: Table::filled(mismatch, 0),
            mismatch_multi_enthalpies: Table::filled(mismatch, 0),

            int11: Table::filled(&[RAW_PAIRS, RAW_PAIRS, RAW_NT5, RAW_NT5], 0),
            int11_enthalpies: Table::filled(&[RAW_PAIRS, RAW_PAIRS, RAW_NT5, RAW_NT5], 0),
            int21: Table::filled(&[RAW_PAIRS, RAW_PAIRS, RAW_NT5, RAW_NT5, RAW_NT5], 0),
            int21_enthalpies: Table::filled(&[RAW_PAIRS, RAW_PAIRS, RAW_NT5, RAW_NT5, RAW_NT5], 0),
            int22: Table::filled(&[RAW_PAIRS, RAW_PAIRS, RAW_NT4, RAW_NT4, RAW_NT4, RAW_NT4], 0),
            int22_enthalpies: Table::filled(&[RAW_PAIRS, RAW_PAIRS, RAW_NT4, RAW_NT4, RAW_NT4, RAW_NT4], 0),

            dangle5: Table::filled(&[RAW_PAIRS, RAW_NT5], 0),
            dangle5_enthalpies: Table::filled(&[RAW_PAIRS, RAW_NT5], 0),
            dangle3: Table::filled(&[RAW_PAIRS, RAW_NT5], 0),
            dangle3_enthalpies: Table::filled(&[RAW_PAIRS, RAW_NT5], 0),

            ml_params: MLParams::default(),
            ninio: Ninio::default(),
            misc: Misc::default(),

            tri_loop: FxHashMap::default(),
            tetra_loop: FxHashMap::default(),
            hexa_loop: FxHashMap::default(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, ParamError> {
        let mut lines = text.lines();
        match lines.next() {
            Some(header) if header.trim() == "## RNAfold parameter file v2.0" => {}
            _ => return Err(ParamError::MissingHeader),
        }

        let mut raw = RawParameters::empty();
        let mut section: Option<Section> = None;
        let mut filled = 0usize;
        let mut int_buf: Vec<i32> = Vec::new();
        let mut float_buf: Vec<f64> = Vec::new();

        for raw_line in lines {
            let stripped = strip_comment(raw_line)?;
            let line = stripped.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix("# ").or_else(|| line.strip_prefix('#')) {
                section = Some(Section::try_from(name.trim())?);
                filled = 0;
                int_buf.clear();
                float_buf.clear();
                continue;
            }

            match section {
                None | Some(Section::End) => continue,
                Some(Section::MlParams) => {
                    for tok in line.split_whitespace() {
                        int_buf.push(parse_int_token(tok)?);
                    }
                    raw.ml_params = MLParams::from_slice(&int_buf).unwrap_or_default();
                }
                Some(Section::Ninio) => {
                    for tok in line.split_whitespace() {
                        int_buf.push(parse_int_token(tok)?);
                    }
                    raw.ninio = Ninio::from_slice(&int_buf).unwrap_or_default();
                }
                Some(Section::Misc) => {
                    for tok in line.split_whitespace() {
                        float_buf.push(parse_float_token(tok)?);
                    }
                    raw.misc = Misc::from_slice(&float_buf)?;
                }
                Some(Section::Triloops) => insert_loop_seq(line, &mut raw.tri_loop)?,
                Some(Section::Tetraloops) => insert_loop_seq(line, &mut raw.tetra_loop)?,
                Some(Section::Hexaloops) => insert_loop_seq(line, &mut raw.hexa_loop)?,
                Some(sec) => fill_table_section(sec, &mut raw, &mut filled, line)?,
            }
        }

        Ok(raw)
    }
}

fn insert_loop_seq(line: &str, map: &mut FxHashMap<String, (i32, i32)>) -> Result<(), ParamError> {
    let mut it = line.split_whitespace();
    let seq = it.next().ok_or_else(|| ParamError::InvalidToken(line.to_string()))?;
    let en = it.next().ok_or_else(|| ParamError::InvalidToken(line.to_string())).and_then(parse_int_token)?;
    let enth = it.next().ok_or_else(|| ParamError::InvalidToken(line.to_string())).and_then(parse_int_token)?;
    if it.next().is_some() {
        return Err(ParamError::InvalidLength { section: "Triloops/Tetraloops/Hexaloops", expected: 3, got: 4 });
    }
    map.insert(seq.to_string(), (en, enth));
    Ok(())
}

fn fill_table_line(
    section: &'static str,
    table: &mut Table,
    filled: &mut usize,
    line: &str,
) -> Result<(), ParamError> {
    let total: usize = table.shape().iter().product();
    for tok in line.split_whitespace() {
        if *filled >= total {
            return Err(ParamError::InvalidLength { section, expected: total, got: *filled + 1 });
        }
        let val = parse_int_token(tok)?;
        table.set_flat(*filled, val);
        *filled += 1;
    }
    Ok(())
}

fn fill_table_section(
    section: Section,
    raw: &mut RawParameters,
    filled: &mut usize,
    line: &str,
) -> Result<(), ParamError> {
    use Section::*;
    let table = match section {
        Stack => &mut raw.stack,
        StackEnthalpies => &mut raw.stack_enthalpies,
        Hairpin => &mut raw.hairpin,
        HairpinEnthalpies => &mut raw.hairpin_enthalpies,
        Bulge => &mut raw.bulge,
        BulgeEnthalpies => &mut raw.bulge_enthalpies,
        Interior => &mut raw.interior,
        InteriorEnthalpies => &mut raw.interior_enthalpies,
        MismatchExterior => &mut raw.mismatch_exterior,
        MismatchExteriorEnthalpies => &mut raw.mismatch_exterior_enthalpies,
        MismatchHairpin => &mut raw.mismatch_hairpin,
        MismatchHairpinEnthalpies => &mut raw.mismatch_hairpin_enthalpies,
        MismatchInterior => &mut raw.mismatch_interior,
        MismatchInteriorEnthalpies => &mut raw.mismatch_interior_enthalpies,
        MismatchInterior1n => &mut raw.mismatch_interior_1n,
        MismatchInterior1nEnthalpies => &mut raw.mismatch_interior_1n_enthalpies,
        MismatchInterior23 => &mut raw.mismatch_interior_23,
        MismatchInterior23Enthalpies => &mut raw.mismatch_interior_23_enthalpies,
        MismatchMulti => &mut raw.mismatch_multi,
        MismatchMultiEnthalpies => &mut raw.mismatch_multi_enthalpies,
        Int11 => &mut raw.int11,
        Int11Enthalpies => &mut raw.int11_enthalpies,
        Int21 => &mut raw.int21,
        Int21Enthalpies => &mut raw.int21_enthalpies,
        Int22 => &mut raw.int22,
        Int22Enthalpies => &mut raw.int22_enthalpies,
        Dangle5 => &mut raw.dangle5,
        Dangle5Enthalpies => &mut raw.dangle5_enthalpies,
        Dangle3 => &mut raw.dangle3,
        Dangle3Enthalpies => &mut raw.dangle3_enthalpies,
        MlParams | Ninio | Misc | Triloops | Tetraloops | Hexaloops | End => unreachable!(),
    };
    fill_table_line(section.name(), table, filled, line)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNIPPET: &str = "## RNAfold parameter file v2.0\n\
\n\
# stack\n\
  -240  -330  -210  -140  -210  -210\n\
  -330  -340  -250  -150  -220  -240\n\
  -210  -250   130   -50  -140  -130\n\
  -140  -150   -50    30   -60  -100\n\
  -210  -220  -140   -60  -110   -90\n\
  -210  -240  -130  -100   -90  -130\n\
\n\
# ML_params\n\
    0     0   930 -1800    40     0\n\
\n\
# Triloops\n\
CAACG   680   2370\n\
\n\
# END\n";

    #[test]
    fn test_parse_snippet() {
        let raw = RawParameters::parse(SNIPPET).unwrap();
        assert_eq!(raw.stack.get(&[0, 0]), -240);
        assert_eq!(raw.stack.get(&[1, 1]), -340);
        assert_eq!(raw.ml_params.closing_en37, 930);
        assert_eq!(raw.tri_loop.get("CAACG"), Some(&(680, 2370)));
    }

    #[test]
    fn test_missing_header_rejected() {
        let err = RawParameters::parse("# stack\n").unwrap_err();
        assert!(matches!(err, ParamError::MissingHeader));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let text = "## RNAfold parameter file v2.0\n# bogus_section\n1 2 3\n";
        let err = RawParameters::parse(text).unwrap_err();
        assert!(matches!(err, ParamError::UnknownSection(_)));
    }

    #[test]
    fn test_inf_sentinel_parses() {
        let text = "## RNAfold parameter file v2.0\n# bulge\n\
INF   INF   INF   380   390   400   410   420   430   440\n\
450   460   470   480   490   500   510   520   530   540\n\
550   560   570   580   590   600   610   620   630   640\n\
650\n";
        let raw = RawParameters::parse(text).unwrap();
        assert_eq!(raw.bulge.get(&[0]), crate::INF);
        assert_eq!(raw.bulge.get(&[3]), 380);
    }

    #[test]
    fn test_section_overflow_rejected() {
        let text = "## RNAfold parameter file v2.0\n# stack\n\
-240 -330 -210 -140 -210 -210\n\
-330 -340 -250 -150 -220 -240\n\
-210 -250  130  -50 -140 -130\n\
-140 -150  -50   30  -60 -100\n\
-210 -220 -140  -60 -110  -90\n\
-210 -240 -130 -100  -90 -130  1\n";
        let err = RawParameters::parse(text).unwrap_err();
        assert!(matches!(err, ParamError::InvalidLength { section: "stack", .. }));
    }

    #[test]
    fn test_unterminated_comment_rejected() {
        let text = "## RNAfold parameter file v2.0\n# stack\n/* oops\n";
        let err = RawParameters::parse(text).unwrap_err();
        assert!(matches!(err, ParamError::UnterminatedComment(_)));
    }

    #[test]
    fn test_loop_seq_overlength_rejected() {
        let text = "## RNAfold parameter file v2.0\n# Triloops\nCAACG 680 2370 99\n";
        let err = RawParameters::parse(text).unwrap_err();
        assert!(matches!(err, ParamError::InvalidLength { expected: 3, got: 4, .. }));
    }

    #[test]
    fn test_comment_is_stripped_without_leaking() {
        let text = "## RNAfold parameter file v2.0\n# ML_params /* synthetic */\n0 0 930 -1800 40 0\n";
        let raw = RawParameters::parse(text).unwrap();
        assert_eq!(raw.ml_params.closing_en37, 930);
    }
}
