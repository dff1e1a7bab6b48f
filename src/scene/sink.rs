//! The live model set that receives finalized commands.

use std::collections::BTreeMap;

use super::command::{LabelText, MoviePayload, ShapeKind, SurfaceParams};
use crate::session::{GroupTree, Measurement};
use crate::util::bitset::AtomSet;

/// Receiver of finalized render commands.
///
/// Atom indices are in the merged index space the session's offset pass
/// established.
pub trait ModelSet {
    /// Uniform size of `shape` on `atoms`.
    fn set_shape_size(&mut self, shape: ShapeKind, atoms: &AtomSet, size: f32);
    /// Per-atom sizes of `shape`, indexed by atom.
    fn set_shape_sizes(&mut self, shape: ShapeKind, atoms: &AtomSet, sizes: &[f32]);
    /// Uniform color of `shape` on `atoms`.
    fn set_shape_color(&mut self, shape: ShapeKind, atoms: &AtomSet, argb: u32);
    /// Per-atom colors of `shape`, indexed by atom.
    fn set_shape_colors(&mut self, shape: ShapeKind, atoms: &AtomSet, colors: &[u32]);
    /// Translucency of `shape` on `atoms`.
    fn set_shape_translucency(&mut self, shape: ShapeKind, atoms: &AtomSet, translucency: f32);
    /// Hide atoms entirely.
    fn hide_atoms(&mut self, atoms: &AtomSet);
    /// Register named atom sets.
    fn define_sets(&mut self, sets: BTreeMap<String, AtomSet>);
    /// Display a frame.
    fn set_frame(&mut self, frame: usize);
    /// Install a trajectory animation.
    fn set_movie(&mut self, movie: MoviePayload);
    /// Attach labels.
    fn set_labels(&mut self, labels: BTreeMap<usize, LabelText>);
    /// Add a measurement.
    fn add_measurement(&mut self, measurement: Measurement);
    /// Add a surface over `atoms`, or over a map object when `atoms` is
    /// `None`.
    fn add_isosurface(
        &mut self,
        atoms: Option<AtomSet>,
        params: SurfaceParams,
        argb: Option<u32>,
        translucency: f32,
    );
    /// Install the object hierarchy.
    fn set_groups(&mut self, tree: GroupTree, visibility: Vec<bool>);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// One observed call, with atom sets flattened to index lists.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Size(ShapeKind, Vec<usize>, f32),
        Sizes(ShapeKind, Vec<usize>, Vec<f32>),
        Color(ShapeKind, Vec<usize>, u32),
        Colors(ShapeKind, Vec<usize>, Vec<u32>),
        Translucency(ShapeKind, Vec<usize>, f32),
        Hide(Vec<usize>),
        Define(Vec<(String, Vec<usize>)>),
        Frame(usize),
        Movie(MoviePayload),
        Labels(BTreeMap<usize, LabelText>),
        Measure(Measurement),
        Isosurface(Option<Vec<usize>>, SurfaceParams),
        Groups(Vec<bool>),
    }

    /// Records every call in order.
    #[derive(Debug, Default)]
    pub(crate) struct Recorder {
        pub(crate) calls: Vec<Call>,
    }

    fn list(atoms: &AtomSet) -> Vec<usize> {
        atoms.iter().collect()
    }

    impl ModelSet for Recorder {
        fn set_shape_size(&mut self, shape: ShapeKind, atoms: &AtomSet, size: f32) {
            self.calls.push(Call::Size(shape, list(atoms), size));
        }

        fn set_shape_sizes(&mut self, shape: ShapeKind, atoms: &AtomSet, sizes: &[f32]) {
            self.calls.push(Call::Sizes(shape, list(atoms), sizes.to_vec()));
        }

        fn set_shape_color(&mut self, shape: ShapeKind, atoms: &AtomSet, argb: u32) {
            self.calls.push(Call::Color(shape, list(atoms), argb));
        }

        fn set_shape_colors(&mut self, shape: ShapeKind, atoms: &AtomSet, colors: &[u32]) {
            self.calls.push(Call::Colors(shape, list(atoms), colors.to_vec()));
        }

        fn set_shape_translucency(&mut self, shape: ShapeKind, atoms: &AtomSet, translucency: f32) {
            self.calls.push(Call::Translucency(shape, list(atoms), translucency));
        }

        fn hide_atoms(&mut self, atoms: &AtomSet) {
            self.calls.push(Call::Hide(list(atoms)));
        }

        fn define_sets(&mut self, sets: BTreeMap<String, AtomSet>) {
            self.calls.push(Call::Define(
                sets.iter().map(|(k, v)| (k.clone(), list(v))).collect(),
            ));
        }

        fn set_frame(&mut self, frame: usize) {
            self.calls.push(Call::Frame(frame));
        }

        fn set_movie(&mut self, movie: MoviePayload) {
            self.calls.push(Call::Movie(movie));
        }

        fn set_labels(&mut self, labels: BTreeMap<usize, LabelText>) {
            self.calls.push(Call::Labels(labels));
        }

        fn add_measurement(&mut self, measurement: Measurement) {
            self.calls.push(Call::Measure(measurement));
        }

        fn add_isosurface(
            &mut self,
            atoms: Option<AtomSet>,
            params: SurfaceParams,
            _argb: Option<u32>,
            _translucency: f32,
        ) {
            self.calls.push(Call::Isosurface(atoms.as_ref().map(list), params));
        }

        fn set_groups(&mut self, _tree: GroupTree, visibility: Vec<bool>) {
            self.calls.push(Call::Groups(visibility));
        }
    }
}
