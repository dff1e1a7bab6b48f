//! Scene snapshots: capture the display subset of a model and rebuild
//! commands from a stored one.

use super::{build, BuildOutput};
use crate::options::ImportOptions;
use crate::session::setting_id as id;
use crate::session::settings::SettingValue;
use crate::session::{BranchData, RepMask, SceneSnapshot, SessionModel};

/// Record the current view, frame, and per-branch visibility,
/// representations and color under `name`.
#[must_use]
pub fn capture(model: &SessionModel, name: &str) -> SceneSnapshot {
    let mut snap = SceneSnapshot {
        name: name.to_owned(),
        view: model.view.clone().unwrap_or_default(),
        frame: Some(model.current_frame()),
        ..SceneSnapshot::default()
    };
    for branch in &model.branches {
        let _ = snap.visibility.insert(branch.name.clone(), branch.visible);
        let reps = match &branch.data {
            BranchData::Molecule(m) => m
                .atoms
                .iter()
                .fold(RepMask::default(), |acc, a| RepMask(acc.0 | a.reps.0)),
            _ => branch.reps,
        };
        let _ = snap.reps.insert(branch.name.clone(), reps);
        let _ = snap.colors.insert(branch.name.clone(), branch.color);
    }
    snap
}

/// Apply `snapshot` to a copy of `model`. Branches the snapshot does not
/// name keep their state.
#[must_use]
pub fn apply(model: &SessionModel, snapshot: &SceneSnapshot) -> SessionModel {
    let mut model = model.clone();
    for branch in &mut model.branches {
        if let Some(&visible) = snapshot.visibility.get(&branch.name) {
            branch.visible = visible;
            if let Some(node) = model.groups.find(&branch.name) {
                model.groups.set_visible(node, visible);
            }
        }
        let reps = snapshot.reps.get(&branch.name).copied();
        let color = snapshot.colors.get(&branch.name).copied();
        if let Some(c) = color {
            branch.color = c;
        }
        match &mut branch.data {
            BranchData::Molecule(m) => {
                for atom in &mut m.atoms {
                    if let Some(r) = reps {
                        atom.reps = r;
                    }
                    if let Some(c) = color {
                        atom.color = c;
                    }
                }
            }
            _ => {
                if let Some(r) = reps {
                    branch.reps = r;
                }
            }
        }
    }
    if !snapshot.view.is_empty() {
        model.view = Some(snapshot.view.clone());
    }
    if let Some(frame) = snapshot.frame {
        let setting = if model.movie_mode { id::FRAME } else { id::STATE };
        model
            .settings
            .insert(setting, SettingValue::Int(frame as i32 + 1));
        if let Some(movie) = &mut model.movie {
            movie.current_frame = frame.min(movie.frame_count.saturating_sub(1));
        }
    }
    model
}

/// Rebuild commands for a stored scene without walking the session again.
#[must_use]
pub fn regenerate(
    model: &SessionModel,
    snapshot: &SceneSnapshot,
    options: &ImportOptions,
) -> BuildOutput {
    log::info!("regenerating scene '{}'", snapshot.name);
    build(&apply(model, snapshot), options)
}
