//! Per-atom records decoded from the molecule atom table.

use glam::Vec3;

use crate::pickle::Value;

/// Producer representation indices, as stored in each atom's flag vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Rep {
    /// Bonds as cylinders.
    Sticks = 0,
    /// Van der Waals spheres.
    Spheres = 1,
    /// Molecular surface.
    Surface = 2,
    /// Text labels.
    Labels = 3,
    /// Spheres for non-bonded atoms.
    NbSpheres = 4,
    /// Cartoon backbone.
    Cartoon = 5,
    /// Ribbon backbone.
    Ribbon = 6,
    /// Bonds as lines.
    Lines = 7,
    /// Surface mesh.
    Mesh = 8,
    /// Dot surface.
    Dots = 9,
    /// Measurement dashes.
    Dashes = 10,
    /// Crosses for non-bonded atoms.
    Nonbonded = 11,
}

impl Rep {
    /// Number of per-atom flags the producer writes.
    pub const COUNT: usize = 12;

    /// All representations in index order.
    pub const ALL: [Rep; Rep::COUNT] = [
        Rep::Sticks,
        Rep::Spheres,
        Rep::Surface,
        Rep::Labels,
        Rep::NbSpheres,
        Rep::Cartoon,
        Rep::Ribbon,
        Rep::Lines,
        Rep::Mesh,
        Rep::Dots,
        Rep::Dashes,
        Rep::Nonbonded,
    ];

    /// Bit of this representation in a [`RepMask`].
    #[must_use]
    pub fn bit(self) -> u32 {
        1 << self as u8
    }
}

/// Bitmask over [`Rep`] indices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RepMask(pub u32);

impl RepMask {
    /// Whether `rep` is on.
    #[must_use]
    pub fn has(self, rep: Rep) -> bool {
        self.0 & rep.bit() != 0
    }

    /// Turn `rep` on.
    pub fn set(&mut self, rep: Rep) {
        self.0 |= rep.bit();
    }

    /// Turn `rep` off.
    pub fn clear(&mut self, rep: Rep) {
        self.0 &= !rep.bit();
    }

    /// Decode either a flag vector (`1` means on) or a packed bitmask.
    #[must_use]
    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Int(bits) => Some(Self(*bits as u32 & ((1 << Rep::COUNT) - 1))),
            Value::Sequence(flags) => {
                let mut mask = Self::default();
                for (i, rep) in Rep::ALL.iter().enumerate() {
                    if flags.get(i).and_then(Value::as_int) == Some(1) {
                        mask.set(*rep);
                    }
                }
                Some(mask)
            }
            _ => None,
        }
    }
}

/// Secondary-structure assignment of an atom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SsCode {
    /// `H`.
    Helix,
    /// `S`.
    Sheet,
    /// `L`.
    Turn,
    /// Blank or unrecognised.
    #[default]
    None,
}

impl SsCode {
    /// Parse the producer's one-letter code.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "H" => Self::Helix,
            "S" => Self::Sheet,
            "L" => Self::Turn,
            _ => Self::None,
        }
    }
}

/// Column layout of one row of the atom table.
mod col {
    pub(super) const SEQ: usize = 0;
    pub(super) const CHAIN: usize = 1;
    pub(super) const ALT_LOC: usize = 2;
    pub(super) const RESNO: usize = 3;
    pub(super) const SEGMENT: usize = 4;
    pub(super) const RESIDUE: usize = 5;
    pub(super) const NAME: usize = 6;
    pub(super) const ELEMENT: usize = 7;
    pub(super) const LABEL: usize = 9;
    pub(super) const SS: usize = 10;
    pub(super) const B_FACTOR: usize = 14;
    pub(super) const OCCUPANCY: usize = 15;
    pub(super) const VDW: usize = 16;
    pub(super) const PARTIAL_CHARGE: usize = 17;
    pub(super) const FORMAL_CHARGE: usize = 18;
    pub(super) const HETERO: usize = 19;
    pub(super) const REPS: usize = 20;
    pub(super) const COLOR: usize = 21;
    pub(super) const SERIAL: usize = 22;
    pub(super) const CARTOON: usize = 23;
    pub(super) const FLAGS: usize = 24;
    pub(super) const UNIQUE_ID: usize = 32;
}

/// Minimum number of columns a row must have.
pub const MIN_COLUMNS: usize = col::CARTOON + 1;

/// One materialized atom.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    /// Atom name (e.g. `CA`).
    pub name: String,
    /// Element symbol.
    pub element: String,
    /// Residue name, at most three characters.
    pub residue: String,
    /// Producer sequence index (no insertion code).
    pub seq: i32,
    /// Residue number as written, without the insertion code.
    pub resno: i32,
    /// Insertion code.
    pub ins_code: Option<char>,
    /// Chain id.
    pub chain: String,
    /// Alternate location indicator.
    pub alt_loc: Option<char>,
    /// Segment id.
    pub segment: String,
    /// Coordinate in this atom's state.
    pub coord: Vec3,
    /// Branch-local model (state) index.
    pub model: usize,
    /// Temperature factor.
    pub b_factor: f32,
    /// Occupancy, 0..1.
    pub occupancy: f32,
    /// Van der Waals radius.
    pub vdw: f32,
    /// Partial charge.
    pub partial_charge: f32,
    /// Formal charge.
    pub formal_charge: i32,
    /// Whether this is a HETATM record.
    pub hetero: bool,
    /// Representation flags.
    pub reps: RepMask,
    /// Secondary-structure code.
    pub ss: SsCode,
    /// Cartoon-type modifier.
    pub cartoon_type: i32,
    /// Palette color index.
    pub color: i32,
    /// Serial number.
    pub serial: i32,
    /// Unique id used for per-atom settings; -1 when absent.
    pub unique_id: i32,
    /// Producer atom flag bits.
    pub flags: u32,
    /// Label text, present only when the label flag is on.
    pub label: Option<String>,
}

/// Atom flag excluding the atom from flag-driven surfaces.
pub const FLAG_NO_SURFACE: u32 = 0x0100_0000;

impl AtomRecord {
    /// Whether the atom is excluded from surfaces when `surface_mode` is 0.
    #[must_use]
    pub fn no_surface(&self) -> bool {
        self.flags & FLAG_NO_SURFACE != 0
    }

    /// Whether the element is hydrogen.
    #[must_use]
    pub fn is_hydrogen(&self) -> bool {
        matches!(self.element.as_str(), "H" | "D")
    }

    /// Whether the residue is a nucleotide.
    #[must_use]
    pub fn is_nucleic(&self) -> bool {
        matches!(
            self.residue.as_str(),
            "A" | "C" | "G" | "U" | "T" | "DA" | "DC" | "DG" | "DT" | "DU"
                | "I" | "DI"
        )
    }
}

/// Text column; empty text reads as a single space.
fn text(row: &Value, i: usize) -> String {
    match row.at(i) {
        Some(Value::Text(s)) if !s.is_empty() => s.clone(),
        Some(Value::Int(n)) => n.to_string(),
        _ => " ".to_owned(),
    }
}

fn first_char(s: &str) -> Option<char> {
    s.chars().next().filter(|c| !c.is_whitespace())
}

/// Split `"42A"` into `(42, Some('A'))`.
fn split_resno(s: &str) -> Option<(i32, Option<char>)> {
    let s = s.trim();
    let digits_end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(s.len(), |(i, _)| i);
    let num = s[..digits_end].parse().ok()?;
    Some((num, s[digits_end..].chars().next()))
}

fn element_symbol(raw: &str, name: &str) -> String {
    match raw.trim() {
        // A bare "A" is how some producers write an aromatic carbon.
        "A" => "C".to_owned(),
        "" => name
            .chars()
            .find(char::is_ascii_alphabetic)
            .map_or_else(|| "X".to_owned(), |c| c.to_ascii_uppercase().to_string()),
        s => s.to_owned(),
    }
}

/// Decode one row of the atom table. Coordinate and model are filled in
/// by the caller once the owning state is known.
pub fn decode_atom_row(row: &Value) -> Result<AtomRecord, String> {
    let Some(cols) = row.as_seq() else {
        return Err(format!("atom row is a {}", row.kind_name()));
    };
    if cols.len() < MIN_COLUMNS {
        return Err(format!(
            "atom row has {} columns, need {MIN_COLUMNS}",
            cols.len()
        ));
    }
    let int = |i: usize| row.int_at(i).ok_or_else(|| format!("column {i} is not numeric"));
    let float = |i: usize| row.float_at(i).map_or(0.0, |f| f as f32);

    let seq = int(col::SEQ)?;
    let (resno, ins_code) = match row.at(col::RESNO) {
        Some(Value::Text(s)) => split_resno(s).unwrap_or((seq, None)),
        Some(Value::Int(n)) => (*n, None),
        _ => (seq, None),
    };

    let mut residue = text(row, col::RESIDUE);
    if residue.trim().is_empty() {
        "UNK".clone_into(&mut residue);
    } else if let Some((cut, _)) = residue.char_indices().nth(3) {
        residue.truncate(cut);
    }

    let name = text(row, col::NAME);
    let element = element_symbol(&text(row, col::ELEMENT), &name);
    let reps = row
        .at(col::REPS)
        .and_then(RepMask::from_value)
        .ok_or_else(|| format!("column {} is not a flag vector", col::REPS))?;

    let mut atom = AtomRecord {
        element,
        residue,
        seq,
        resno,
        ins_code,
        chain: text(row, col::CHAIN).trim().to_owned(),
        alt_loc: first_char(&text(row, col::ALT_LOC)),
        segment: text(row, col::SEGMENT).trim().to_owned(),
        coord: Vec3::ZERO,
        model: 0,
        b_factor: float(col::B_FACTOR),
        occupancy: float(col::OCCUPANCY),
        vdw: float(col::VDW),
        partial_charge: float(col::PARTIAL_CHARGE),
        formal_charge: row.int_at(col::FORMAL_CHARGE).unwrap_or(0),
        hetero: row.int_at(col::HETERO).unwrap_or(0) != 0,
        reps,
        ss: SsCode::parse(&text(row, col::SS)),
        cartoon_type: row.int_at(col::CARTOON).unwrap_or(0),
        color: int(col::COLOR)?,
        serial: row.int_at(col::SERIAL).unwrap_or(0),
        unique_id: row.int_at(col::UNIQUE_ID).unwrap_or(-1),
        flags: row.int_at(col::FLAGS).map_or(0, |f| f as u32),
        label: None,
        name,
    };
    if atom.reps.has(Rep::Labels) {
        let label = text(row, col::LABEL);
        if label.trim().is_empty() {
            atom.reps.clear(Rep::Labels);
        } else {
            atom.label = Some(label);
        }
    }
    Ok(atom)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an atom row with the given identity and flags.
    pub(crate) fn row(
        name: &str,
        element: &str,
        residue: &str,
        seq: i32,
        ss: &str,
        reps: &[Rep],
    ) -> Value {
        let t = |s: &str| Value::Text(s.to_owned());
        let mut flags = vec![Value::Int(0); Rep::COUNT];
        for r in reps {
            flags[*r as usize] = Value::Int(1);
        }
        let mut cols = vec![Value::None; 33];
        cols[col::SEQ] = Value::Int(seq);
        cols[col::CHAIN] = t("A");
        cols[col::ALT_LOC] = t("");
        cols[col::RESNO] = t(&seq.to_string());
        cols[col::SEGMENT] = t("");
        cols[col::RESIDUE] = t(residue);
        cols[col::NAME] = t(name);
        cols[col::ELEMENT] = t(element);
        cols[col::LABEL] = t("");
        cols[col::SS] = t(ss);
        cols[col::B_FACTOR] = Value::Float(20.0);
        cols[col::OCCUPANCY] = Value::Float(1.0);
        cols[col::VDW] = Value::Float(1.7);
        cols[col::FORMAL_CHARGE] = Value::Int(0);
        cols[col::REPS] = Value::Sequence(flags);
        cols[col::COLOR] = Value::Int(26);
        cols[col::SERIAL] = Value::Int(seq);
        cols[col::CARTOON] = Value::Int(0);
        cols[col::UNIQUE_ID] = Value::Int(-1);
        Value::Sequence(cols)
    }

    #[test]
    fn decodes_identity_and_flags() {
        let r = row("CA", "C", "ALA", 5, "H", &[Rep::Lines, Rep::Cartoon]);
        let a = decode_atom_row(&r).unwrap();
        assert_eq!(a.name, "CA");
        assert_eq!(a.residue, "ALA");
        assert_eq!(a.resno, 5);
        assert_eq!(a.ss, SsCode::Helix);
        assert!(a.reps.has(Rep::Lines) && a.reps.has(Rep::Cartoon));
        assert!(!a.reps.has(Rep::Sticks));
        assert_eq!(a.alt_loc, None);
        assert_eq!(a.chain, "A");
    }

    #[test]
    fn residue_quirks() {
        let a = decode_atom_row(&row("C1", "A", "LONGNAME", 1, "", &[])).unwrap();
        assert_eq!(a.residue, "LON");
        assert_eq!(a.element, "C");
        let b = decode_atom_row(&row("N", "", "", 1, "", &[])).unwrap();
        assert_eq!(b.residue, "UNK");
        assert_eq!(b.element, "N");
    }

    #[test]
    fn blank_label_clears_flag() {
        let a = decode_atom_row(&row("O", "O", "HOH", 1, "", &[Rep::Labels])).unwrap();
        assert!(!a.reps.has(Rep::Labels));
        assert!(a.label.is_none());
    }

    #[test]
    fn insertion_code_and_packed_mask() {
        let Value::Sequence(mut cols) = row("N", "N", "GLY", 7, "", &[]) else {
            unreachable!()
        };
        cols[col::RESNO] = Value::Text("7B".to_owned());
        cols[col::REPS] = Value::Int(Rep::Sticks.bit() as i32);
        let a = decode_atom_row(&Value::Sequence(cols)).unwrap();
        assert_eq!((a.resno, a.ins_code), (7, Some('B')));
        assert!(a.reps.has(Rep::Sticks));
    }

    #[test]
    fn short_row_is_rejected() {
        let r = Value::Sequence(vec![Value::Int(1); 5]);
        assert!(decode_atom_row(&r).unwrap_err().contains("5 columns"));
    }
}
