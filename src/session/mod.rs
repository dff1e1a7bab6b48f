//! Session model: typed view of a decoded session mapping.
//!
//! [`walk`] pulls the global header (settings, object list, movie, view,
//! palette, scenes) out of the root mapping and decodes every object into
//! a [`Branch`]. Objects that fail to decode are logged and skipped;
//! only a malformed header is fatal. Atom and model indices stay
//! branch-local until [`SessionModel::assign_offsets`] places each branch
//! in the merged index space.

pub mod atoms;
pub mod branch;
pub mod colors;
pub mod groups;
pub mod measure;
pub mod molecule;
pub mod movie;
pub mod scenes;
pub mod setting_id;
pub mod settings;
pub mod structure;

use std::collections::BTreeSet;

pub use atoms::{AtomRecord, Rep, RepMask, SsCode};
pub use branch::{Branch, BranchData, BranchKind};
pub use colors::ColorTable;
pub use groups::{GroupNode, GroupTree};
pub use measure::{MeasureKind, Measurement};
pub use molecule::{BondRecord, MoleculeData, State};
pub use movie::MovieDescriptor;
pub use scenes::SceneSnapshot;
pub use settings::{SettingValue, SettingsScope, SettingsTable, UniqueSettings};

use crate::error::PseError;
use crate::options::ImportBehavior;
use crate::pickle::{Mapping, Value};
use branch::{decode_branch, Skipped};
use setting_id as id;

/// Everything the walker extracts from one session.
#[derive(Debug, Clone, Default)]
pub struct SessionModel {
    /// Producer version (e.g. `1760` for 1.7.6).
    pub version: u32,
    /// Global settings.
    pub settings: SettingsTable,
    /// Per-atom settings keyed by unique id.
    pub unique_settings: UniqueSettings,
    /// Kept objects in file order.
    pub branches: Vec<Branch>,
    /// Object hierarchy; node `branch` fields index `branches`.
    pub groups: GroupTree,
    /// Stored movie, if any.
    pub movie: Option<MovieDescriptor>,
    /// Whether molecules were decoded as single-model trajectories.
    pub movie_mode: bool,
    /// Saved view vector, as stored.
    pub view: Option<Vec<f32>>,
    /// Session palette.
    pub colors: ColorTable,
    /// Stored scenes.
    pub scenes: Vec<SceneSnapshot>,
    /// Saved window size.
    pub window: Option<(u32, u32)>,
    /// Objects that failed to decode.
    pub skipped: Vec<String>,
    /// Atoms across all branches, set by the offset pass.
    pub atom_count: usize,
    /// Models across all branches, set by the offset pass.
    pub model_count: usize,
}

impl SessionModel {
    /// Global settings scope.
    #[must_use]
    pub fn scope(&self) -> SettingsScope<'_> {
        SettingsScope {
            global: &self.settings,
            branch: None,
            unique: &self.unique_settings,
            version: self.version,
        }
    }

    /// Settings scope of one branch.
    #[must_use]
    pub fn branch_scope<'a>(&'a self, branch: &'a Branch) -> SettingsScope<'a> {
        self.scope().with_branch(Some(&branch.settings))
    }

    /// Branch by name.
    #[must_use]
    pub fn find_branch(&self, name: &str) -> Option<&Branch> {
        self.branches.iter().find(|b| b.name == name)
    }

    /// Zero-based frame (movie mode) or state the session was saved at.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        let setting = if self.movie_mode { id::FRAME } else { id::STATE };
        usize::try_from(self.scope().int(setting) - 1).unwrap_or(0)
    }

    /// Place every branch in the merged atom and model index space.
    ///
    /// Bases are recomputed from scratch in branch order, so running the
    /// pass twice yields the same result.
    pub fn assign_offsets(&mut self) {
        let mut atoms = 0;
        let mut models = 0;
        for branch in &mut self.branches {
            branch.atom_base = atoms;
            branch.model_base = models;
            atoms += branch.atom_count();
            models += branch.model_count();
        }
        self.atom_count = atoms;
        self.model_count = models;
    }

    /// All atoms with their merged index.
    pub fn global_atoms(&self) -> impl Iterator<Item = (usize, &AtomRecord)> {
        self.branches.iter().flat_map(|b| {
            let base = b.atom_base;
            b.molecule()
                .into_iter()
                .flat_map(move |m| m.atoms.iter().enumerate().map(move |(i, a)| (base + i, a)))
        })
    }

    /// All bonds with merged endpoints.
    pub fn global_bonds(&self) -> impl Iterator<Item = BondRecord> + '_ {
        self.branches.iter().flat_map(|b| {
            let base = b.atom_base;
            b.molecule().into_iter().flat_map(move |m| {
                m.bonds.iter().map(move |bond| BondRecord {
                    a: bond.a + base,
                    b: bond.b + base,
                    ..*bond
                })
            })
        })
    }
}

/// Producer version as an integer; `1.76` style floats are scaled.
fn version_of(v: Option<&Value>) -> u32 {
    match v {
        Some(Value::Int(i)) => u32::try_from(*i).unwrap_or(0),
        Some(Value::Float(f)) if *f > 0.0 && *f < 100.0 => (f * 1000.0).round() as u32,
        Some(Value::Sequence(items)) => version_of(items.first()),
        _ => 0,
    }
}

/// Walk a decoded session with default import behavior.
pub fn walk(root: Mapping) -> Result<SessionModel, PseError> {
    walk_with(root, &ImportBehavior::default())
}

/// Walk a decoded session.
pub fn walk_with(root: Mapping, behavior: &ImportBehavior) -> Result<SessionModel, PseError> {
    let settings = root
        .get("settings")
        .filter(|v| v.is_seq())
        .map(SettingsTable::from_value)
        .ok_or_else(|| PseError::Header("missing settings list".to_owned()))?;
    let names = root
        .get("names")
        .and_then(Value::as_seq)
        .ok_or_else(|| PseError::Header("missing object list".to_owned()))?;

    let mut model = SessionModel {
        version: version_of(root.get("version")),
        settings,
        unique_settings: root
            .get("unique_settings")
            .map(UniqueSettings::from_value)
            .unwrap_or_default(),
        movie: root.get("movie").and_then(MovieDescriptor::from_value),
        view: root.get("view").and_then(Value::floats),
        colors: root.get("colors").map(ColorTable::from_value).unwrap_or_default(),
        scenes: scenes::decode_scenes(root.get("scene_dict"), root.get("scene_order")),
        window: root.get("main").and_then(|m| {
            let w = u32::try_from(m.int_at(0)?).ok()?;
            let h = u32::try_from(m.int_at(1)?).ok()?;
            Some((w, h))
        }),
        ..SessionModel::default()
    };
    log::info!(
        "session version {}, {} global settings, {} objects",
        model.version,
        model.settings.len(),
        names.len().saturating_sub(1)
    );

    model.movie_mode = behavior.honour_movie
        && !model.scope().bool(id::ALL_STATES)
        && model.movie.as_ref().is_some_and(|m| m.frame_count > 0);
    let referenced: Option<BTreeSet<usize>> = if model.movie_mode {
        model.movie.as_ref().map(MovieDescriptor::referenced_states)
    } else {
        None
    };
    let frame = model.current_frame();
    if let Some(movie) = &mut model.movie {
        movie.current_frame = frame.min(movie.frame_count.saturating_sub(1));
        if model.movie_mode {
            log::info!(
                "movie: {} frames ({} scripted), starting at frame {}",
                movie.frame_count,
                movie.scripted_frames().count(),
                movie.current_frame
            );
        }
    }

    let mut branches = Vec::new();
    // Entry 0 is the producer's own placeholder.
    for entry in names.iter().skip(1).filter(|e| e.is_seq()) {
        match decode_branch(entry, model.scope(), referenced.as_ref(), behavior.load_hidden) {
            Ok(Ok(branch)) => branches.push(branch),
            Ok(Err(Skipped::Unsupported(code))) => log::debug!(
                "{}: unprocessed object type {code}",
                entry.text_at(0).unwrap_or_default()
            ),
            Ok(Err(Skipped::HiddenGroup { name, parent })) => {
                let _ = model.groups.add_group(&name, false, parent.as_deref());
            }
            Ok(Err(Skipped::Selection | Skipped::Hidden)) => {}
            Err(e) => {
                log::warn!("skipping object: {e}");
                model.skipped.push(e.branch);
            }
        }
    }
    for (i, branch) in branches.iter().enumerate() {
        let _ = model
            .groups
            .add_branch(&branch.name, i, branch.visible, branch.group.as_deref());
    }
    model.branches = branches;
    model.assign_offsets();
    log::info!(
        "{} objects loaded ({} skipped), {} atoms in {} models{}",
        model.branches.len(),
        model.skipped.len(),
        model.atom_count,
        model.model_count,
        if model.movie_mode { ", movie mode" } else { "" }
    );
    Ok(model)
}
