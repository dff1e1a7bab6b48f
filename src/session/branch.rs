//! Named objects from the session's `names` list.

use std::collections::BTreeSet;

use super::atoms::RepMask;
use super::measure::{decode_measurements, Measurement};
use super::molecule::{decode_molecule, MoleculeData};
use super::settings::{SettingsScope, SettingsTable};
use crate::error::BranchDecodeError;
use crate::pickle::Value;

mod slot {
    pub(super) const NAME: usize = 0;
    pub(super) const SELECTION: usize = 1;
    pub(super) const VISIBLE: usize = 2;
    pub(super) const REPS: usize = 3;
    pub(super) const KIND: usize = 4;
    pub(super) const DATA: usize = 5;
    pub(super) const GROUP: usize = 6;

    pub(super) const HEADER_COLOR: usize = 2;
    pub(super) const HEADER_REPS: usize = 3;
    pub(super) const HEADER_SETTINGS: usize = 8;
}

/// Producer object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    /// Atoms, bonds and states.
    Molecule,
    /// Isosurface over a volume.
    MapSurface,
    /// Isomesh over a volume.
    MapMesh,
    /// Distances, angles, torsions.
    Measurement,
    /// Container for other branches.
    Group,
}

impl BranchKind {
    /// Map the producer's numeric type. Unknown types return `None`.
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Molecule),
            2 => Some(Self::MapSurface),
            3 => Some(Self::MapMesh),
            4 => Some(Self::Measurement),
            12 => Some(Self::Group),
            _ => None,
        }
    }
}

/// Kind-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchData {
    /// Decoded molecule.
    Molecule(MoleculeData),
    /// Decoded point groups.
    Measurement(Vec<Measurement>),
    /// Map object drawn as a surface or mesh.
    Map {
        /// Mesh rather than filled surface.
        mesh: bool,
    },
    /// Group node, no payload.
    Group,
}

/// One kept object.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Object name.
    pub name: String,
    /// Object type.
    pub kind: BranchKind,
    /// Own visibility flag.
    pub visible: bool,
    /// Parent group name.
    pub group: Option<String>,
    /// Object palette color.
    pub color: i32,
    /// Per-object setting overrides.
    pub settings: SettingsTable,
    /// Object-level representation mask.
    pub reps: RepMask,
    /// Decoded payload.
    pub data: BranchData,
    /// First atom in the merged atom space, set by the offset pass.
    pub atom_base: usize,
    /// First model in the merged model space, set by the offset pass.
    pub model_base: usize,
}

impl Branch {
    /// Molecule payload, if this is a molecule.
    #[must_use]
    pub fn molecule(&self) -> Option<&MoleculeData> {
        match &self.data {
            BranchData::Molecule(m) => Some(m),
            _ => None,
        }
    }

    /// Number of materialized atoms.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.molecule().map_or(0, |m| m.atoms.len())
    }

    /// Number of models the branch contributes.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.molecule().map_or(0, |m| m.model_count)
    }
}

/// Why an entry of the `names` list was not turned into a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    /// Private or selection entry.
    Selection,
    /// Saved hidden and hidden objects are not loaded.
    Hidden,
    /// A hidden group that is not loaded. Its node still hides whatever
    /// the session places under it.
    HiddenGroup {
        /// Group name.
        name: String,
        /// Enclosing group, if any.
        parent: Option<String>,
    },
    /// Object type this importer does not handle.
    Unsupported(i32),
}

/// Decode one `[name, selection, visible, reps, kind, data, group]` entry.
///
/// `Ok(Err(_))` means the entry is intentionally not loaded.
pub fn decode_branch(
    entry: &Value,
    scope: SettingsScope<'_>,
    movie_states: Option<&BTreeSet<usize>>,
    load_hidden: bool,
) -> Result<Result<Branch, Skipped>, BranchDecodeError> {
    let name = entry.text_at(slot::NAME).unwrap_or_default();
    if name.is_empty() || name.starts_with('_') || entry.int_at(slot::SELECTION) != Some(0) {
        return Ok(Err(Skipped::Selection));
    }
    let visible = entry.int_at(slot::VISIBLE) == Some(1);
    let group = entry
        .text_at(slot::GROUP)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_owned);
    if !visible && !load_hidden {
        log::info!("{name}: hidden, not loaded");
        let kind = entry.int_at(slot::KIND).and_then(BranchKind::from_code);
        if kind == Some(BranchKind::Group) {
            return Ok(Err(Skipped::HiddenGroup {
                name: name.to_owned(),
                parent: group,
            }));
        }
        return Ok(Err(Skipped::Hidden));
    }
    let code = entry
        .int_at(slot::KIND)
        .ok_or_else(|| BranchDecodeError::new(name, "missing object type"))?;
    let Some(kind) = BranchKind::from_code(code) else {
        return Ok(Err(Skipped::Unsupported(code)));
    };
    let data = entry
        .at(slot::DATA)
        .filter(|d| d.is_seq())
        .ok_or_else(|| BranchDecodeError::new(name, "missing object data"))?;
    let header = data.at(0);
    let settings = header
        .and_then(|h| h.at(slot::HEADER_SETTINGS))
        .map(SettingsTable::from_value)
        .unwrap_or_default();
    let color = header
        .and_then(|h| h.int_at(slot::HEADER_COLOR))
        .unwrap_or(-1);
    let reps = header
        .and_then(|h| h.at(slot::HEADER_REPS))
        .or_else(|| entry.at(slot::REPS))
        .and_then(RepMask::from_value)
        .unwrap_or_default();

    let scope = scope.with_branch(Some(&settings));
    let data = match kind {
        BranchKind::Molecule => {
            BranchData::Molecule(decode_molecule(name, data, scope, movie_states)?)
        }
        BranchKind::Measurement => {
            BranchData::Measurement(decode_measurements(name, data, reps, color, scope)?)
        }
        BranchKind::MapSurface => BranchData::Map { mesh: false },
        BranchKind::MapMesh => BranchData::Map { mesh: true },
        BranchKind::Group => BranchData::Group,
    };
    log::info!(
        "{name}: {kind:?}{}",
        if visible { "" } else { " (hidden)" }
    );
    Ok(Ok(Branch {
        name: name.to_owned(),
        kind,
        visible,
        group,
        color,
        settings,
        reps,
        data,
        atom_base: 0,
        model_base: 0,
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::atoms::Rep;
    use crate::session::molecule::tests::{molecule, state, three_atoms};
    use crate::session::settings::UniqueSettings;
    use crate::session::setting_id as id;

    /// Object header with the given color and settings list.
    pub(crate) fn header(kind: i32, name: &str, color: i32, settings: Value) -> Value {
        let mut h = vec![Value::None; 9];
        h[0] = Value::Int(kind);
        h[1] = Value::Text(name.to_owned());
        h[slot::HEADER_COLOR] = Value::Int(color);
        h[slot::HEADER_SETTINGS] = settings;
        Value::Sequence(h)
    }

    /// Full `names` entry.
    pub(crate) fn entry(
        name: &str,
        visible: bool,
        kind: i32,
        mut data: Value,
        group: &str,
    ) -> Value {
        if let Value::Sequence(items) = &mut data {
            if let Some(first) = items.first_mut() {
                if matches!(first, Value::None) {
                    *first = header(kind, name, 5, Value::None);
                }
            }
        }
        Value::Sequence(vec![
            Value::Text(name.to_owned()),
            Value::Int(0),
            Value::Int(i32::from(visible)),
            Value::None,
            Value::Int(kind),
            data,
            Value::Text(group.to_owned()),
        ])
    }

    /// Single-state three-atom molecule entry.
    pub(crate) fn m1(reps: &[Rep]) -> Value {
        entry(
            "m1",
            true,
            1,
            molecule(
                three_atoms(reps),
                vec![state(&[0, 1, 2], &[0.0, 0.0, 0.0, 1.5, 0.0, 0.0, 2.0, 1.0, 0.0], "")],
                &[[0, 1, 1]],
            ),
            "",
        )
    }

    fn decode(entry: &Value, load_hidden: bool) -> Result<Result<Branch, Skipped>, BranchDecodeError> {
        let global = SettingsTable::default();
        let unique = UniqueSettings::default();
        let scope = SettingsScope {
            global: &global,
            branch: None,
            unique: &unique,
            version: 1760,
        };
        decode_branch(entry, scope, None, load_hidden)
    }

    #[test]
    fn molecule_branch_with_header() {
        let b = decode(&m1(&[Rep::Lines]), true).unwrap().unwrap();
        assert_eq!(b.name, "m1");
        assert_eq!(b.kind, BranchKind::Molecule);
        assert_eq!(b.color, 5);
        assert_eq!(b.atom_count(), 3);
        assert!(b.group.is_none());
    }

    #[test]
    fn selections_and_private_names_are_skipped() {
        let mut e = m1(&[]);
        if let Value::Sequence(items) = &mut e {
            items[slot::SELECTION] = Value::Int(1);
        }
        assert_eq!(decode(&e, true).unwrap(), Err(Skipped::Selection));
        let private = entry("_tmp", true, 1, Value::Sequence(vec![]), "");
        assert_eq!(decode(&private, true).unwrap(), Err(Skipped::Selection));
    }

    #[test]
    fn unknown_kind_and_hidden_policy() {
        let cgo = entry("cgo", true, 6, Value::Sequence(vec![Value::None]), "");
        assert_eq!(decode(&cgo, true).unwrap(), Err(Skipped::Unsupported(6)));

        let grp = entry("g", false, 12, Value::Sequence(vec![Value::None]), "top");
        assert_eq!(
            decode(&grp, false).unwrap(),
            Err(Skipped::HiddenGroup {
                name: "g".to_owned(),
                parent: Some("top".to_owned()),
            })
        );
        let hidden_map = entry("map", false, 2, Value::Sequence(vec![Value::None]), "g");
        assert_eq!(decode(&hidden_map, false).unwrap(), Err(Skipped::Hidden));
        let b = decode(&grp, true).unwrap().unwrap();
        assert!(!b.visible);
        assert_eq!(b.group.as_deref(), Some("top"));
    }

    #[test]
    fn branch_settings_override_global() {
        let settings = Value::Sequence(vec![Value::Sequence(vec![
            Value::Int(id::STICK_RADIUS as i32),
            Value::Int(3),
            Value::Float(0.4),
        ])]);
        let mut e = m1(&[]);
        if let Value::Sequence(items) = &mut e {
            if let Value::Sequence(data) = &mut items[slot::DATA] {
                data[0] = header(1, "m1", 2, settings);
            }
        }
        let b = decode(&e, true).unwrap().unwrap();
        assert_eq!(b.color, 2);
        assert_eq!(b.settings.len(), 1);
    }

    #[test]
    fn broken_molecule_is_an_error() {
        let e = entry("bad", true, 1, Value::Sequence(vec![Value::None]), "");
        let err = decode(&e, true).unwrap_err();
        assert_eq!(err.branch, "bad");
    }
}
