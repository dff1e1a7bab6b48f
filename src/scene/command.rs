//! Deferred render commands and their payloads.
//!
//! The builder produces commands in branch-local index space and then
//! shifts them into the merged space with
//! [`DeferredRenderCommand::offset`]. Nothing touches the model set until
//! [`DeferredRenderCommand::finalize`], which consumes the command.

use std::collections::BTreeMap;

use glam::Vec3;

use super::sink::ModelSet;
use crate::session::{GroupTree, Measurement};
use crate::util::bitset::AtomSet;

// ── Shape kinds ──────────────────────────────────────────────────────────

/// What a command draws or changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Atom spheres (absolute radius).
    Ball,
    /// Bond cylinders.
    Stick,
    /// Crosses on non-bonded atoms.
    Star,
    /// Dot surface.
    Dot,
    /// Atom labels.
    Label,
    /// Cartoon backbone.
    Cartoon,
    /// Smooth tube through the backbone.
    Trace,
    /// Straight segments through the backbone.
    Backbone,
    /// Variable-radius tube sized from temperature factors.
    Putty,
    /// Surface drawn as mesh.
    Mesh,
    /// Filled molecular surface.
    Surface,
    /// Distance/angle/torsion.
    Measure,
    /// Map object contour.
    Isosurface,
    /// Named atom sets.
    Define,
    /// Display frame.
    Frame,
    /// Trajectory animation.
    Movie,
    /// Group hierarchy.
    Group,
    /// Atoms to hide.
    Hidden,
}

// ── Targets and payloads ─────────────────────────────────────────────────

/// What a command applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A set of atoms.
    Atoms(AtomSet),
    /// A whole branch by index.
    Branch(usize),
    /// The whole session.
    Session,
}

/// One atom label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelText {
    /// Text to draw.
    pub text: String,
    /// Text color.
    pub argb: u32,
    /// Font id.
    pub font_id: i32,
    /// Font size.
    pub size: f32,
    /// Offset from the atom.
    pub offset: Vec3,
}

/// Atoms and coordinates of one trajectory frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieState {
    /// State index in the producer's list.
    pub state: usize,
    /// Atoms placed by this state.
    pub atoms: AtomSet,
    /// Coordinates, one per atom in `atoms` ascending order.
    pub coords: Vec<Vec3>,
}

/// Trajectory animation.
#[derive(Debug, Clone, PartialEq)]
pub struct MoviePayload {
    /// Frame to index into `states`.
    pub frames: Vec<usize>,
    /// Trajectory frames.
    pub states: Vec<MovieState>,
    /// Frame shown first.
    pub current_frame: usize,
    /// Base model in the owning branch.
    pub local_model: usize,
    /// Base model in the merged space.
    pub model: usize,
    /// Whether playback loops.
    pub looping: bool,
}

/// Surface request for atoms or a map branch.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceParams {
    /// Draw as mesh.
    pub mesh: bool,
    /// Solvent probe radius.
    pub solvent_radius: f32,
    /// Light both faces.
    pub two_sided: bool,
    /// Only the selected atoms contribute (no context atoms).
    pub only: bool,
}

/// Command-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Size and color only.
    None,
    /// Frame to display.
    Frame {
        /// Frame in the owning branch.
        local: usize,
        /// Frame in the merged space.
        resolved: usize,
    },
    /// Trajectory animation.
    Movie(MoviePayload),
    /// Named atom sets.
    Define(BTreeMap<String, AtomSet>),
    /// Labels keyed by atom index.
    Labels(BTreeMap<usize, LabelText>),
    /// One measurement.
    Measure(Measurement),
    /// Per-atom radii, indexed by atom.
    Radii(Vec<f32>),
    /// Surface parameters.
    Surface(SurfaceParams),
    /// Group tree with its effective visibility per node.
    Groups {
        /// The hierarchy.
        tree: GroupTree,
        /// Effective visibility, indexed like the tree's nodes.
        visibility: Vec<bool>,
    },
}

// ── Command ──────────────────────────────────────────────────────────────

/// One queued instruction for the model set.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredRenderCommand {
    /// Shape kind.
    pub kind: ShapeKind,
    /// Selection.
    pub target: Target,
    /// Kind-specific data.
    pub payload: Payload,
    /// Shape size (radius or diameter depending on the kind).
    pub size: f32,
    /// Per-atom colors indexed by atom; empty when not set.
    pub colors: Vec<u32>,
    /// Uniform color.
    pub argb: Option<u32>,
    /// 0 opaque, 1 invisible.
    pub translucency: f32,
    /// Cleared for commands of occluded objects.
    pub visible: bool,
    /// Branch the command came from.
    pub branch: Option<usize>,
}

impl DeferredRenderCommand {
    /// Command of `kind` on `target` with no size or color.
    #[must_use]
    pub fn new(kind: ShapeKind, target: Target) -> Self {
        Self {
            kind,
            target,
            payload: Payload::None,
            size: 0.0,
            colors: Vec::new(),
            argb: None,
            translucency: 0.0,
            visible: true,
            branch: None,
        }
    }

    /// Command on an atom set.
    #[must_use]
    pub fn atoms(kind: ShapeKind, atoms: AtomSet) -> Self {
        Self::new(kind, Target::Atoms(atoms))
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    /// Set the translucency.
    #[must_use]
    pub fn with_translucency(mut self, translucency: f32) -> Self {
        self.translucency = translucency;
        self
    }

    /// Set the uniform color.
    #[must_use]
    pub fn with_argb(mut self, argb: u32) -> Self {
        self.argb = Some(argb);
        self
    }

    /// Set per-atom colors.
    #[must_use]
    pub fn with_colors(mut self, colors: Vec<u32>) -> Self {
        self.colors = colors;
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Tag with the originating branch.
    #[must_use]
    pub fn for_branch(mut self, branch: usize) -> Self {
        self.branch = Some(branch);
        self
    }

    /// Atom selection, if the target is one.
    #[must_use]
    pub fn target_atoms(&self) -> Option<&AtomSet> {
        match &self.target {
            Target::Atoms(atoms) => Some(atoms),
            _ => None,
        }
    }

    /// Move the command from branch-local into merged index space.
    ///
    /// Atom indices shift by `atom_delta`, so repeated calls add up. The
    /// frame and movie model are re-resolved as `local + model_delta` on
    /// every call instead. `(0, 0)` leaves the command untouched.
    pub fn offset(&mut self, model_delta: usize, atom_delta: usize) {
        if model_delta == 0 && atom_delta == 0 {
            return;
        }
        if let Target::Atoms(atoms) = &mut self.target {
            *atoms = atoms.shifted(atom_delta);
        }
        if !self.colors.is_empty() {
            let _ = self
                .colors
                .splice(0..0, std::iter::repeat_n(0, atom_delta));
        }
        match &mut self.payload {
            Payload::Frame { local, resolved } => *resolved = *local + model_delta,
            Payload::Movie(movie) => {
                movie.model = movie.local_model + model_delta;
                for state in &mut movie.states {
                    state.atoms = state.atoms.shifted(atom_delta);
                }
            }
            Payload::Define(sets) => {
                for set in sets.values_mut() {
                    *set = set.shifted(atom_delta);
                }
            }
            Payload::Labels(labels) => {
                *labels = std::mem::take(labels)
                    .into_iter()
                    .map(|(i, l)| (i + atom_delta, l))
                    .collect();
            }
            Payload::Radii(radii) => {
                let _ = radii.splice(0..0, std::iter::repeat_n(0.0, atom_delta));
            }
            Payload::None
            | Payload::Measure(_)
            | Payload::Surface(_)
            | Payload::Groups { .. } => {}
        }
    }

    /// Apply the command to `sink`. Invisible commands do nothing.
    pub fn finalize(self, sink: &mut dyn ModelSet) {
        if !self.visible {
            log::debug!("suppressed {:?} of occluded object", self.kind);
            return;
        }
        let Self {
            kind,
            target,
            payload,
            size,
            colors,
            argb,
            translucency,
            ..
        } = self;
        match (kind, payload) {
            (ShapeKind::Hidden, _) => {
                if let Target::Atoms(atoms) = &target {
                    sink.hide_atoms(atoms);
                }
            }
            (_, Payload::Define(sets)) => sink.define_sets(sets),
            (_, Payload::Frame { resolved, .. }) => sink.set_frame(resolved),
            (_, Payload::Movie(movie)) => sink.set_movie(movie),
            (_, Payload::Groups { tree, visibility }) => sink.set_groups(tree, visibility),
            (_, Payload::Labels(labels)) => sink.set_labels(labels),
            (_, Payload::Measure(m)) => sink.add_measurement(m),
            (_, Payload::Surface(params)) => {
                let atoms = match target {
                    Target::Atoms(atoms) => Some(atoms),
                    Target::Branch(_) | Target::Session => None,
                };
                sink.add_isosurface(atoms, params, argb, translucency);
            }
            (kind, payload) => {
                let Target::Atoms(atoms) = &target else {
                    return;
                };
                match payload {
                    Payload::Radii(radii) => sink.set_shape_sizes(kind, atoms, &radii),
                    _ => sink.set_shape_size(kind, atoms, size),
                }
                if !colors.is_empty() {
                    sink.set_shape_colors(kind, atoms, &colors);
                }
                if let Some(argb) = argb {
                    sink.set_shape_color(kind, atoms, argb);
                }
                if translucency > 0.0 {
                    sink.set_shape_translucency(kind, atoms, translucency);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::sink::tests::{Call, Recorder};

    fn set(indices: &[usize]) -> AtomSet {
        indices.iter().copied().collect()
    }

    fn members(s: &AtomSet) -> Vec<usize> {
        s.iter().collect()
    }

    fn sample() -> Vec<DeferredRenderCommand> {
        let mut labels = BTreeMap::new();
        let _ = labels.insert(
            1,
            LabelText {
                text: "CA".to_owned(),
                argb: 0xffff_ffff,
                font_id: 5,
                size: 14.0,
                offset: Vec3::ZERO,
            },
        );
        vec![
            DeferredRenderCommand::atoms(ShapeKind::Ball, set(&[0, 2]))
                .with_colors(vec![1, 2, 3]),
            DeferredRenderCommand::atoms(ShapeKind::Label, set(&[1]))
                .with_payload(Payload::Labels(labels)),
            DeferredRenderCommand::atoms(ShapeKind::Putty, set(&[0, 1]))
                .with_payload(Payload::Radii(vec![0.5, 0.7])),
            DeferredRenderCommand::new(ShapeKind::Frame, Target::Session)
                .with_payload(Payload::Frame { local: 1, resolved: 1 }),
        ]
    }

    #[test]
    fn zero_offset_is_a_no_op() {
        for cmd in sample() {
            let mut moved = cmd.clone();
            moved.offset(0, 0);
            assert_eq!(moved, cmd);
        }
    }

    #[test]
    fn atom_offsets_add_up() {
        for cmd in sample() {
            let mut twice = cmd.clone();
            twice.offset(2, 3);
            twice.offset(2, 4);
            let mut once = cmd.clone();
            once.offset(4, 7);
            if cmd.kind == ShapeKind::Frame {
                // Frames resolve against the latest delta only.
                assert_eq!(
                    twice.payload,
                    Payload::Frame { local: 1, resolved: 3 }
                );
                assert_eq!(
                    once.payload,
                    Payload::Frame { local: 1, resolved: 5 }
                );
                continue;
            }
            assert_eq!(
                twice.target_atoms().map(members),
                once.target_atoms().map(members)
            );
            assert_eq!(twice.colors, once.colors);
            assert_eq!(twice.payload, once.payload);
        }
    }

    #[test]
    fn offset_shifts_atoms_colors_and_radii() {
        let mut cmds = sample();
        for c in &mut cmds {
            c.offset(1, 10);
        }
        assert_eq!(members(cmds[0].target_atoms().unwrap()), vec![10, 12]);
        assert_eq!(cmds[0].colors[10..], [1, 2, 3]);
        let Payload::Labels(labels) = &cmds[1].payload else {
            unreachable!()
        };
        assert!(labels.contains_key(&11));
        let Payload::Radii(radii) = &cmds[2].payload else {
            unreachable!()
        };
        assert_eq!(radii[10], 0.5);
    }

    #[test]
    fn finalize_applies_once_and_skips_invisible() {
        let mut rec = Recorder::default();
        let ball = DeferredRenderCommand::atoms(ShapeKind::Ball, set(&[0]))
            .with_size(1.5)
            .with_argb(0xff00_ff00)
            .with_translucency(0.5);
        ball.finalize(&mut rec);
        assert_eq!(
            rec.calls,
            vec![
                Call::Size(ShapeKind::Ball, vec![0], 1.5),
                Call::Color(ShapeKind::Ball, vec![0], 0xff00_ff00),
                Call::Translucency(ShapeKind::Ball, vec![0], 0.5),
            ]
        );

        let mut rec = Recorder::default();
        let mut hidden = DeferredRenderCommand::atoms(ShapeKind::Stick, set(&[1]));
        hidden.visible = false;
        hidden.finalize(&mut rec);
        assert!(rec.calls.is_empty());
    }
}
