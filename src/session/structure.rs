//! Secondary-structure spans from per-atom structure codes.
//!
//! For each code (helix, sheet, turn) the set of sequence numbers carrying
//! that code is collected over the whole branch. Atoms are then scanned in
//! file order: an atom whose sequence number is in the set extends the
//! current run, anything else closes it. A change of model closes the run
//! and starts a new one at the current atom.

use std::collections::BTreeSet;

use super::atoms::{AtomRecord, SsCode};
use crate::util::bitset::AtomSet;

/// Lowest sequence number that can take part in a run.
const SEQ_FLOOR: i32 = 0;

/// One residue of a span boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueId {
    /// Chain id.
    pub chain: String,
    /// Sequence number.
    pub seq: i32,
    /// Insertion code.
    pub ins_code: Option<char>,
}

impl ResidueId {
    fn of(atom: &AtomRecord) -> Self {
        Self {
            chain: atom.chain.clone(),
            seq: atom.seq,
            ins_code: atom.ins_code,
        }
    }
}

/// A contiguous run of one structure kind within one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSpan {
    /// Helix, sheet or turn.
    pub kind: SsCode,
    /// Branch-local model index.
    pub model: usize,
    /// Serial number, counting from 1 within the branch.
    pub serial: usize,
    /// Strand count (1 for sheets, 0 otherwise).
    pub strands: usize,
    /// First residue.
    pub start: ResidueId,
    /// Last residue.
    pub end: ResidueId,
    /// First atom (branch-local index).
    pub first_atom: usize,
    /// Last atom (branch-local index, inclusive).
    pub last_atom: usize,
}

/// Branch-local atom sets per structure code, used to split cartoons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsAtoms {
    /// Atoms inside helix spans.
    pub helix: AtomSet,
    /// Atoms inside sheet spans.
    pub sheet: AtomSet,
    /// Atoms inside turn spans.
    pub turn: AtomSet,
    /// Atoms whose own code is blank.
    pub coil: AtomSet,
}

impl SsAtoms {
    /// Atom set for a code.
    #[must_use]
    pub fn get(&self, code: SsCode) -> &AtomSet {
        match code {
            SsCode::Helix => &self.helix,
            SsCode::Sheet => &self.sheet,
            SsCode::Turn => &self.turn,
            SsCode::None => &self.coil,
        }
    }

    fn get_mut(&mut self, code: SsCode) -> &mut AtomSet {
        match code {
            SsCode::Helix => &mut self.helix,
            SsCode::Sheet => &mut self.sheet,
            SsCode::Turn => &mut self.turn,
            SsCode::None => &mut self.coil,
        }
    }
}

/// Detect spans for every structure code over a branch's atoms.
#[must_use]
pub fn detect_spans(atoms: &[AtomRecord]) -> (Vec<StructureSpan>, SsAtoms) {
    let mut spans = Vec::new();
    let mut ss_atoms = SsAtoms {
        helix: AtomSet::with_len(atoms.len()),
        sheet: AtomSet::with_len(atoms.len()),
        turn: AtomSet::with_len(atoms.len()),
        coil: AtomSet::from_indices(
            atoms.len(),
            atoms
                .iter()
                .enumerate()
                .filter(|(_, a)| a.ss == SsCode::None)
                .map(|(i, _)| i),
        ),
    };
    for (code, strands) in
        [(SsCode::Helix, 0), (SsCode::Sheet, 1), (SsCode::Turn, 0)]
    {
        let seqs: BTreeSet<i32> = atoms
            .iter()
            .filter(|a| a.ss == code && a.seq >= SEQ_FLOOR)
            .map(|a| a.seq)
            .collect();
        if seqs.is_empty() {
            continue;
        }
        for (first, last) in runs(atoms, &seqs) {
            ss_atoms.get_mut(code).set_range(first, last + 1);
            spans.push(StructureSpan {
                kind: code,
                model: atoms[first].model,
                serial: spans.len() + 1,
                strands,
                start: ResidueId::of(&atoms[first]),
                end: ResidueId::of(&atoms[last]),
                first_atom: first,
                last_atom: last,
            });
        }
    }
    (spans, ss_atoms)
}

/// Inclusive atom ranges of contiguous in-set atoms, split at model
/// changes.
fn runs(atoms: &[AtomRecord], seqs: &BTreeSet<i32>) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    for (i, atom) in atoms.iter().enumerate() {
        let inside = atom.seq >= SEQ_FLOOR && seqs.contains(&atom.seq);
        open = match (open, inside) {
            (Some((start, _)), true) if atoms[start].model == atom.model => {
                Some((start, i))
            }
            (Some(run), true) => {
                out.push(run);
                Some((i, i))
            }
            (None, true) => Some((i, i)),
            (Some(run), false) => {
                out.push(run);
                None
            }
            (None, false) => None,
        };
    }
    out.extend(open);
    out
}
