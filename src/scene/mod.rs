//! Representation and scene builder.
//!
//! [`build`] turns a walked [`SessionModel`] into an ordered list of
//! [`DeferredRenderCommand`]s plus the reconstructed camera:
//!
//! 1. per-branch representation commands, shifted into the merged index
//!    space and tagged with their branch;
//! 2. a `Define` command naming every molecule's atoms;
//! 3. a `Frame` command, or one `Movie` command per trajectory in movie
//!    mode;
//! 4. the group tree and hidden atoms.
//!
//! Nothing is applied until [`BuildOutput::apply`] (or
//! [`DeferredRenderCommand::finalize`] per command).

pub mod command;
pub mod putty;
pub mod reps;
pub mod sink;
pub mod snapshot;
pub mod view;
pub mod visibility;

use std::collections::BTreeMap;

pub use command::{
    DeferredRenderCommand, LabelText, MoviePayload, MovieState, Payload, ShapeKind,
    SurfaceParams, Target,
};
pub use sink::ModelSet;
pub use view::{RenderSettings, ViewParams};

use crate::options::ImportOptions;
use crate::session::setting_id as id;
use crate::session::{Branch, MoleculeData, SessionModel};
use crate::util::bitset::AtomSet;
use reps::{branch_commands, RepContext};
use visibility::Visibility;

/// Everything the builder produces.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    /// Commands in application order.
    pub commands: Vec<DeferredRenderCommand>,
    /// Reconstructed camera.
    pub view: ViewParams,
    /// Session-wide display settings.
    pub render: RenderSettings,
}

impl BuildOutput {
    /// Finalize every command against `sink`, in order.
    pub fn apply(self, sink: &mut dyn ModelSet) {
        for cmd in self.commands {
            cmd.finalize(sink);
        }
    }

    /// Commands of one kind.
    pub fn of_kind(&self, kind: ShapeKind) -> impl Iterator<Item = &DeferredRenderCommand> {
        self.commands.iter().filter(move |c| c.kind == kind)
    }
}

/// Build the command list, camera and render settings for `model`.
#[must_use]
pub fn build(model: &SessionModel, options: &ImportOptions) -> BuildOutput {
    let mut commands = Vec::new();
    if options.import.state_script {
        log::info!("state script mode, representation commands skipped");
    } else {
        for (i, branch) in model.branches.iter().enumerate() {
            let ctx = RepContext {
                scope: model.branch_scope(branch),
                palette: &model.colors,
                allow_surfaces: options.import.allow_surfaces,
            };
            let cmds = branch_commands(branch, i, ctx);
            log::debug!("{}: {} commands", branch.name, cmds.len());
            commands.extend(cmds.into_iter().map(|mut c| {
                c.offset(branch.model_base, branch.atom_base);
                c.for_branch(i)
            }));
        }
    }

    if let Some(define) = define_command(model) {
        commands.push(define);
    }
    commands.extend(frame_commands(model));

    let visibility = Visibility::resolve(model);
    visibility.suppress(&mut commands);
    commands.extend(visibility.commands(model));

    let scope = model.scope();
    let view = model.view.as_deref().map_or_else(
        || ViewParams::neutral(options.view.aspect_ratio, options.view.field_of_view),
        |stored| {
            let normalized = view::normalize_view(
                stored,
                scope.float(id::FIELD_OF_VIEW),
                scope.bool(id::ORTHOSCOPIC),
            );
            view::reconstruct_or_neutral(
                &normalized,
                options.view.aspect_ratio,
                options.view.field_of_view,
            )
        },
    );
    log::info!(
        "{} commands for {} objects",
        commands.len(),
        model.branches.len()
    );
    BuildOutput {
        commands,
        view,
        render: RenderSettings::from_scope(scope, model.movie_mode),
    }
}

/// Branch name to merged atom set, for every molecule.
fn define_command(model: &SessionModel) -> Option<DeferredRenderCommand> {
    let sets: BTreeMap<String, AtomSet> = model
        .branches
        .iter()
        .filter(|b| b.molecule().is_some())
        .map(|b| {
            let range = b.atom_base..b.atom_base + b.atom_count();
            (b.name.clone(), AtomSet::from_indices(model.atom_count, range))
        })
        .collect();
    (!sets.is_empty()).then(|| {
        DeferredRenderCommand::new(ShapeKind::Define, Target::Session)
            .with_payload(Payload::Define(sets))
    })
}

/// Frame selection, or one movie per multi-state molecule in movie mode.
fn frame_commands(model: &SessionModel) -> Vec<DeferredRenderCommand> {
    let molecules = || {
        model
            .branches
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.molecule().map(|m| (i, b, m)))
    };
    let frame = model.current_frame();

    if let Some(movie) = model.movie.as_ref().filter(|_| model.movie_mode) {
        return molecules()
            .filter(|(_, _, m)| m.states.len() > 1)
            .map(|(i, b, m)| {
                let mut cmd = DeferredRenderCommand::new(ShapeKind::Movie, Target::Branch(i))
                    .with_payload(Payload::Movie(movie_payload(
                        &b.name,
                        m,
                        &movie.frames,
                        movie.current_frame,
                    )))
                    .for_branch(i);
                cmd.offset(b.model_base, b.atom_base);
                cmd
            })
            .collect();
    }

    // The frame indexes the first multi-state molecule, else the first one.
    let Some((i, b, m)) = molecules()
        .find(|(_, b, _)| b.model_count() > 1)
        .or_else(|| molecules().next())
    else {
        return Vec::new();
    };
    let local = frame.min(m.model_count.saturating_sub(1));
    let mut cmd = DeferredRenderCommand::new(ShapeKind::Frame, Target::Session)
        .with_payload(Payload::Frame {
            local,
            resolved: local,
        })
        .for_branch(i);
    cmd.offset(b.model_base, b.atom_base);
    vec![cmd]
}

/// Branch-local trajectory of one molecule. Frames showing a state the
/// molecule does not have are dropped; the current frame moves to the
/// last kept frame at or before it.
fn movie_payload(
    name: &str,
    mol: &MoleculeData,
    frames: &[usize],
    current_frame: usize,
) -> MoviePayload {
    let n = mol.atoms.len();
    let states: Vec<MovieState> = mol
        .states
        .iter()
        .map(|s| {
            let mut coords = s.coords.clone();
            coords.sort_by_key(|&(atom, _)| atom);
            MovieState {
                state: s.index,
                atoms: AtomSet::from_indices(n, coords.iter().map(|&(atom, _)| atom)),
                coords: coords.into_iter().map(|(_, xyz)| xyz).collect(),
            }
        })
        .collect();
    let mut kept = Vec::with_capacity(frames.len());
    let mut current = 0;
    for (frame, &state) in frames.iter().enumerate() {
        let Some(at) = states.iter().position(|st| st.state == state) else {
            log::debug!("{name}: frame {frame} shows missing state {state}, skipped");
            continue;
        };
        if frame <= current_frame {
            current = kept.len();
        }
        kept.push(at);
    }
    MoviePayload {
        frames: kept,
        states,
        current_frame: current,
        local_model: 0,
        model: 0,
        looping: true,
    }
}

/// Branch a command came from.
#[must_use]
pub fn command_branch<'a>(model: &'a SessionModel, cmd: &DeferredRenderCommand) -> Option<&'a Branch> {
    cmd.branch.and_then(|b| model.branches.get(b))
}
