//! Molecule branch decoding: atom table, states, bonds, unit cell.
//!
//! Each state lists the declared atoms it places (`idx_to_atom`) and a
//! flat coordinate block in the same order. Outside movie mode every
//! non-empty state becomes its own model and its atoms are materialized
//! per model. In movie mode all referenced atoms are materialized once in
//! a single model and each referenced state is kept as a trajectory.

use std::collections::BTreeSet;

use glam::Vec3;

use super::atoms::{decode_atom_row, AtomRecord};
use super::settings::SettingsScope;
use super::setting_id as id;
use super::structure::{detect_spans, SsAtoms, StructureSpan};
use crate::error::BranchDecodeError;
use crate::pickle::Value;

mod slot {
    pub(super) const STATES: usize = 4;
    pub(super) const BONDS: usize = 6;
    pub(super) const ATOMS: usize = 7;
    pub(super) const UNIT_CELL: usize = 10;

    pub(super) const STATE_COORDS: usize = 2;
    pub(super) const STATE_IDX_TO_ATOM: usize = 3;
    pub(super) const STATE_TITLE: usize = 5;
}

/// A bond between two branch-local atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondRecord {
    /// First atom.
    pub a: usize,
    /// Second atom.
    pub b: usize,
    /// Bond order, 1..=3.
    pub order: u8,
    /// Whether the order came from the file (valence display on).
    pub valence: bool,
}

/// One conformer or trajectory frame.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// Index of the state in the producer's state list.
    pub index: usize,
    /// State title.
    pub title: String,
    /// Branch-local model the state belongs to.
    pub model: usize,
    /// Branch-local atom index to coordinate, in file order.
    pub coords: Vec<(usize, Vec3)>,
}

/// Crystal cell parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    /// a, b, c.
    pub lengths: Vec3,
    /// alpha, beta, gamma in degrees.
    pub angles: Vec3,
    /// Space group symbol.
    pub space_group: Option<String>,
}

/// Everything decoded from a molecule branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeData {
    /// Materialized atoms.
    pub atoms: Vec<AtomRecord>,
    /// Bonds, branch-local.
    pub bonds: Vec<BondRecord>,
    /// Decoded states.
    pub states: Vec<State>,
    /// Number of models the atoms span.
    pub model_count: usize,
    /// Secondary-structure spans.
    pub spans: Vec<StructureSpan>,
    /// Atom sets per structure code.
    pub ss_atoms: SsAtoms,
    /// Crystal cell, if stored.
    pub unit_cell: Option<UnitCell>,
    /// Rows in the producer's atom table.
    pub declared_atoms: usize,
}

/// Raw view of one state before materialization.
struct RawState<'a> {
    index: usize,
    title: String,
    idx_to_atom: Vec<usize>,
    coords: &'a [Value],
}

fn state_at<'a>(
    name: &str,
    states: &'a [Value],
    index: usize,
    declared: usize,
) -> Result<RawState<'a>, BranchDecodeError> {
    let state = states.get(index).ok_or_else(|| {
        BranchDecodeError::new(name, format!("state {index} does not exist"))
    })?;
    if matches!(state, Value::None) {
        return Ok(RawState {
            index,
            title: String::new(),
            idx_to_atom: Vec::new(),
            coords: &[],
        });
    }
    let malformed =
        |what: &str| BranchDecodeError::new(name, format!("state {index}: {what}"));
    let idx_to_atom = state
        .seq_at(slot::STATE_IDX_TO_ATOM)
        .ok_or_else(|| malformed("missing index table"))?
        .iter()
        .map(|v| {
            v.as_int()
                .and_then(|i| usize::try_from(i).ok())
                .filter(|&i| i < declared)
                .ok_or_else(|| malformed("bad remap index"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let coords = state
        .seq_at(slot::STATE_COORDS)
        .ok_or_else(|| malformed("missing coordinates"))?;
    if coords.len() < idx_to_atom.len() * 3 {
        return Err(malformed("coordinate block too short"));
    }
    Ok(RawState {
        index,
        title: state.text_at(slot::STATE_TITLE).unwrap_or_default().trim().to_owned(),
        idx_to_atom,
        coords,
    })
}

fn coord_at(coords: &[Value], i: usize) -> Vec3 {
    let f = |j: usize| coords.get(j).and_then(Value::as_float).unwrap_or(0.0) as f32;
    Vec3::new(f(3 * i), f(3 * i + 1), f(3 * i + 2))
}

/// Lazily decoded atom rows; a row shared by several states is parsed once.
struct RowCache<'a> {
    name: &'a str,
    rows: &'a [Value],
    cache: Vec<Option<AtomRecord>>,
}

impl<'a> RowCache<'a> {
    fn new(name: &'a str, rows: &'a [Value]) -> Self {
        Self {
            name,
            rows,
            cache: vec![None; rows.len()],
        }
    }

    fn get(&mut self, apt: usize) -> Result<AtomRecord, BranchDecodeError> {
        if let Some(atom) = &self.cache[apt] {
            return Ok(atom.clone());
        }
        let atom = decode_atom_row(&self.rows[apt]).map_err(|e| {
            BranchDecodeError::new(self.name, format!("atom {apt}: {e}"))
        })?;
        self.cache[apt] = Some(atom.clone());
        Ok(atom)
    }
}

/// Per model: declared atom -> branch-local atom.
type AtomMap = Vec<Option<usize>>;

/// Movie mode: every referenced state shares one model and one atom list.
fn load_movie_states(
    mol: &mut MoleculeData,
    rows: &mut RowCache<'_>,
    states: &[Value],
    referenced: &BTreeSet<usize>,
) -> Result<Vec<AtomMap>, BranchDecodeError> {
    let declared = mol.declared_atoms;
    let raw: Vec<RawState<'_>> = referenced
        .iter()
        .filter(|&&s| s < states.len())
        .map(|&s| state_at(rows.name, states, s, declared))
        .collect::<Result<_, _>>()?;
    let mut map = vec![None; declared];
    let used: BTreeSet<usize> =
        raw.iter().flat_map(|s| s.idx_to_atom.iter().copied()).collect();
    for &apt in &used {
        map[apt] = Some(mol.atoms.len());
        mol.atoms.push(rows.get(apt)?);
    }
    let mut placed = vec![false; mol.atoms.len()];
    for state in raw {
        let mut coords = Vec::with_capacity(state.idx_to_atom.len());
        for (i, &apt) in state.idx_to_atom.iter().enumerate() {
            let Some(local) = map[apt] else { continue };
            let xyz = coord_at(state.coords, i);
            if !placed[local] {
                mol.atoms[local].coord = xyz;
                placed[local] = true;
            }
            coords.push((local, xyz));
        }
        mol.states.push(State {
            index: state.index,
            title: state.title,
            model: 0,
            coords,
        });
    }
    mol.model_count = 1;
    Ok(vec![map])
}

/// Every non-empty state becomes its own model with its own atoms.
fn load_all_states(
    mol: &mut MoleculeData,
    rows: &mut RowCache<'_>,
    states: &[Value],
) -> Result<Vec<AtomMap>, BranchDecodeError> {
    let declared = mol.declared_atoms;
    let mut atom_maps = Vec::new();
    for index in 0..states.len() {
        let state = state_at(rows.name, states, index, declared)?;
        if state.idx_to_atom.is_empty() {
            continue;
        }
        let model = atom_maps.len();
        let mut map = vec![None; declared];
        let mut coords = Vec::with_capacity(state.idx_to_atom.len());
        for (i, &apt) in state.idx_to_atom.iter().enumerate() {
            let mut atom = rows.get(apt)?;
            atom.coord = coord_at(state.coords, i);
            atom.model = model;
            map[apt] = Some(mol.atoms.len());
            coords.push((mol.atoms.len(), atom.coord));
            mol.atoms.push(atom);
        }
        mol.states.push(State {
            index,
            title: state.title,
            model,
            coords,
        });
        atom_maps.push(map);
    }
    mol.model_count = atom_maps.len();
    Ok(atom_maps)
}

/// Decode a molecule branch's data block.
///
/// `movie_states` switches to movie mode; only the listed states are
/// read.
pub fn decode_molecule(
    name: &str,
    data: &Value,
    scope: SettingsScope<'_>,
    movie_states: Option<&BTreeSet<usize>>,
) -> Result<MoleculeData, BranchDecodeError> {
    let rows = data
        .seq_at(slot::ATOMS)
        .ok_or_else(|| BranchDecodeError::new(name, "missing atom table"))?;
    let states = data
        .seq_at(slot::STATES)
        .ok_or_else(|| BranchDecodeError::new(name, "missing state list"))?;
    let declared = rows.len();

    let mut cache = RowCache::new(name, rows);
    let mut mol = MoleculeData {
        declared_atoms: declared,
        ..MoleculeData::default()
    };
    let atom_maps = match movie_states {
        Some(referenced) => load_movie_states(&mut mol, &mut cache, states, referenced)?,
        None => load_all_states(&mut mol, &mut cache, states)?,
    };

    mol.bonds = decode_bonds(name, data, declared, &atom_maps, scope.bool(id::VALENCE))?;
    let (spans, ss_atoms) = detect_spans(&mol.atoms);
    mol.spans = spans;
    mol.ss_atoms = ss_atoms;
    mol.unit_cell = data.at(slot::UNIT_CELL).and_then(decode_unit_cell);
    log::info!(
        "{name}: {} atoms, {} bonds, {} states, {} structure spans",
        mol.atoms.len(),
        mol.bonds.len(),
        mol.states.len(),
        mol.spans.len()
    );
    Ok(mol)
}

fn decode_bonds(
    name: &str,
    data: &Value,
    declared: usize,
    atom_maps: &[AtomMap],
    valence: bool,
) -> Result<Vec<BondRecord>, BranchDecodeError> {
    let mut pairs = Vec::new();
    for (i, bond) in data.seq_at(slot::BONDS).unwrap_or_default().iter().enumerate() {
        let end = |k: usize| {
            bond.int_at(k)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|&v| v < declared)
        };
        let (Some(a), Some(b)) = (end(0), end(1)) else {
            return Err(BranchDecodeError::new(name, format!("bond {i} is malformed")));
        };
        let order = if valence { bond.int_at(2).unwrap_or(1) } else { 1 };
        let order = if (1..=3).contains(&order) { order as u8 } else { 1 };
        pairs.push((a, b, order));
    }
    let mut bonds = Vec::with_capacity(pairs.len() * atom_maps.len());
    for map in atom_maps {
        for &(a, b, order) in &pairs {
            if let (Some(a), Some(b)) = (map[a], map[b]) {
                bonds.push(BondRecord { a, b, order, valence });
            }
        }
    }
    Ok(bonds)
}

fn decode_unit_cell(cell: &Value) -> Option<UnitCell> {
    let dims = cell.at(0)?;
    Some(UnitCell {
        lengths: dims.at(0)?.as_point()?,
        angles: dims.at(1)?.as_point()?,
        space_group: cell.text_at(1).map(str::to_owned),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::atoms::tests::row;
    use crate::session::atoms::Rep;
    use crate::session::settings::{SettingValue, SettingsTable, UniqueSettings};

    fn floats(v: &[f64]) -> Value {
        Value::Sequence(v.iter().map(|&f| Value::Float(f)).collect())
    }

    fn ints(v: &[i32]) -> Value {
        Value::Sequence(v.iter().map(|&i| Value::Int(i)).collect())
    }

    pub(crate) fn state(idx: &[i32], coords: &[f64], title: &str) -> Value {
        Value::Sequence(vec![
            Value::Int(idx.len() as i32),
            Value::Int(idx.len() as i32),
            floats(coords),
            ints(idx),
            Value::None,
            Value::Text(title.to_owned()),
        ])
    }

    /// Molecule data block with the given atom rows, states and bonds.
    pub(crate) fn molecule(rows: Vec<Value>, states: Vec<Value>, bonds: &[[i32; 3]]) -> Value {
        let mut data = vec![Value::None; 11];
        data[3] = Value::Int(rows.len() as i32);
        data[slot::STATES] = Value::Sequence(states);
        data[slot::BONDS] = Value::Sequence(bonds.iter().map(|b| ints(b)).collect());
        data[slot::ATOMS] = Value::Sequence(rows);
        Value::Sequence(data)
    }

    pub(crate) fn three_atoms(reps: &[Rep]) -> Vec<Value> {
        vec![
            row("N", "N", "ALA", 1, "", reps),
            row("CA", "C", "ALA", 1, "", reps),
            row("C", "C", "ALA", 1, "", reps),
        ]
    }

    fn with_scope<R>(global: &SettingsTable, f: impl FnOnce(SettingsScope<'_>) -> R) -> R {
        let unique = UniqueSettings::default();
        f(SettingsScope {
            global,
            branch: None,
            unique: &unique,
            version: 1760,
        })
    }

    #[test]
    fn single_state_keeps_declared_indices() {
        let data = molecule(
            three_atoms(&[Rep::Lines]),
            vec![state(&[0, 1, 2], &[0.0, 0.0, 0.0, 1.5, 0.0, 0.0, 2.0, 1.0, 0.0], "")],
            &[[0, 1, 1], [1, 2, 2]],
        );
        let global = SettingsTable::default();
        let mol = with_scope(&global, |s| decode_molecule("m1", &data, s, None)).unwrap();
        assert_eq!(mol.atoms.len(), 3);
        assert_eq!(mol.model_count, 1);
        assert_eq!(mol.atoms[1].coord, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!((mol.bonds[0].a, mol.bonds[0].b), (0, 1));
        assert_eq!(mol.bonds[1].order, 2);
        assert_eq!(mol.states[0].coords.len(), 3);
    }

    #[test]
    fn valence_off_forces_single_bonds() {
        let data = molecule(
            three_atoms(&[]),
            vec![state(&[0, 1, 2], &[0.0; 9], "")],
            &[[1, 2, 2], [0, 1, 7]],
        );
        let mut global = SettingsTable::default();
        global.insert(id::VALENCE, SettingValue::Bool(false));
        let mol = with_scope(&global, |s| decode_molecule("m", &data, s, None)).unwrap();
        assert!(mol.bonds.iter().all(|b| b.order == 1 && !b.valence));
    }

    #[test]
    fn each_state_becomes_a_model() {
        let data = molecule(
            three_atoms(&[]),
            vec![
                state(&[0, 1], &[0.0; 6], "a"),
                state(&[], &[], ""),
                state(&[1, 2], &[1.0; 6], "b"),
            ],
            &[[0, 1, 1], [1, 2, 1]],
        );
        let global = SettingsTable::default();
        let mol = with_scope(&global, |s| decode_molecule("m", &data, s, None)).unwrap();
        assert_eq!(mol.model_count, 2);
        assert_eq!(mol.atoms.len(), 4);
        assert_eq!(mol.atoms[2].model, 1);
        assert_eq!(mol.states[1].index, 2);
        // One bond survives per model.
        assert_eq!(mol.bonds.len(), 2);
        assert_eq!((mol.bonds[1].a, mol.bonds[1].b), (2, 3));
    }

    #[test]
    fn movie_mode_reads_only_referenced_states() {
        // State 1 is garbage; it must never be decoded.
        let data = molecule(
            three_atoms(&[]),
            vec![
                state(&[0, 1], &[0.0; 6], ""),
                Value::Text("not a state".to_owned()),
                state(&[1, 2], &[2.0; 6], ""),
            ],
            &[],
        );
        let global = SettingsTable::default();
        let referenced: BTreeSet<usize> = [0, 2].into_iter().collect();
        let mol = with_scope(&global, |s| decode_molecule("m", &data, s, Some(&referenced)))
            .unwrap();
        assert_eq!(mol.model_count, 1);
        assert_eq!(mol.atoms.len(), 3);
        assert_eq!(mol.states.len(), 2);
        assert_eq!(mol.atoms[2].coord, Vec3::splat(2.0));
        assert_eq!(mol.states[1].coords[0], (1, Vec3::splat(2.0)));
    }

    #[test]
    fn bad_remap_index_fails_branch() {
        let data = molecule(three_atoms(&[]), vec![state(&[0, 9], &[0.0; 6], "")], &[]);
        let global = SettingsTable::default();
        let err = with_scope(&global, |s| decode_molecule("bad", &data, s, None)).unwrap_err();
        assert_eq!(err.branch, "bad");
        assert!(err.reason.contains("remap"));
    }

    #[test]
    fn unit_cell_is_decoded() {
        let mut data = molecule(three_atoms(&[]), vec![state(&[0], &[0.0; 3], "")], &[]);
        if let Value::Sequence(items) = &mut data {
            items[slot::UNIT_CELL] = Value::Sequence(vec![
                Value::Sequence(vec![floats(&[10.0, 20.0, 30.0]), floats(&[90.0, 90.0, 120.0])]),
                Value::Text("P 1".to_owned()),
            ]);
        }
        let global = SettingsTable::default();
        let mol = with_scope(&global, |s| decode_molecule("m", &data, s, None)).unwrap();
        let cell = mol.unit_cell.unwrap();
        assert_eq!(cell.lengths, Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(cell.space_group.as_deref(), Some("P 1"));
    }
}
