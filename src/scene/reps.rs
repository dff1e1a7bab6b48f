//! Per-branch representation commands.
//!
//! Molecule branches go through a claim pass that settles which atoms are
//! drawn as cartoon, trace, ribbon or putty, then emit commands in a fixed
//! kind order. Everything here is in branch-local atom indices; the caller
//! shifts the result into the merged space.

use std::collections::BTreeMap;

use super::command::{DeferredRenderCommand, LabelText, Payload, ShapeKind, SurfaceParams, Target};
use super::putty::{putty_radii, PuttyParams};
use crate::session::colors::argb_from_rgb;
use crate::session::setting_id as id;
use crate::session::{
    AtomRecord, Branch, BranchData, ColorTable, MoleculeData, Rep, SettingsScope, SsCode,
};
use crate::util::bitset::AtomSet;

/// Shared inputs for one branch.
#[derive(Clone, Copy)]
pub struct RepContext<'a> {
    /// Settings visible from the branch.
    pub scope: SettingsScope<'a>,
    /// Session palette.
    pub palette: &'a ColorTable,
    /// Emit mesh, surface and map commands.
    pub allow_surfaces: bool,
}

impl RepContext<'_> {
    fn background(&self) -> u32 {
        argb_from_rgb(self.scope.point(id::BG_RGB))
    }

    fn argb(&self, color: i32) -> u32 {
        self.palette.argb(color, self.background())
    }
}

/// Commands for one branch in branch-local index space. `index` is the
/// branch's position in the session, used by branch-targeted commands.
#[must_use]
pub fn branch_commands(
    branch: &Branch,
    index: usize,
    ctx: RepContext<'_>,
) -> Vec<DeferredRenderCommand> {
    match &branch.data {
        BranchData::Molecule(mol) => molecule_commands(mol, ctx),
        BranchData::Measurement(measurements) => measurements
            .iter()
            .map(|m| {
                DeferredRenderCommand::new(ShapeKind::Measure, Target::Branch(index))
                    .with_argb(ctx.argb(m.color))
                    .with_payload(Payload::Measure(m.clone()))
            })
            .collect(),
        BranchData::Map { mesh } if ctx.allow_surfaces => {
            let mut cmd = DeferredRenderCommand::new(ShapeKind::Isosurface, Target::Branch(index))
                .with_translucency(ctx.scope.float(id::TRANSPARENCY))
                .with_payload(Payload::Surface(SurfaceParams {
                    mesh: *mesh,
                    solvent_radius: ctx.scope.float(id::SOLVENT_RADIUS),
                    two_sided: ctx.scope.bool(id::TWO_SIDED_LIGHTING),
                    only: false,
                }));
            if branch.color >= 0 {
                cmd = cmd.with_argb(ctx.argb(branch.color));
            }
            vec![cmd]
        }
        BranchData::Map { .. } | BranchData::Group => Vec::new(),
    }
}

// ── Claim pass ───────────────────────────────────────────────────────────

/// Atom sets per representation after the claim pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RepSets {
    by_rep: Vec<AtomSet>,
    /// Cartoon atoms redirected to a tube.
    pub trace: AtomSet,
    /// Cartoon atoms redirected to putty.
    pub putty: AtomSet,
}

impl RepSets {
    /// Atoms showing `rep`.
    #[must_use]
    pub fn get(&self, rep: Rep) -> &AtomSet {
        &self.by_rep[rep as usize]
    }

    fn get_mut(&mut self, rep: Rep) -> &mut AtomSet {
        &mut self.by_rep[rep as usize]
    }

    /// Collect per-atom flags and settle cartoon, trace, ribbon and putty.
    #[must_use]
    pub fn claim(atoms: &[AtomRecord]) -> Self {
        let n = atoms.len();
        let mut sets = Self {
            by_rep: vec![AtomSet::with_len(n); Rep::COUNT],
            trace: AtomSet::with_len(n),
            putty: AtomSet::with_len(n),
        };
        for (i, atom) in atoms.iter().enumerate() {
            for rep in Rep::ALL {
                if atom.reps.has(rep) {
                    sets.by_rep[rep as usize].set(i);
                }
            }
        }
        let cartoon: Vec<usize> = sets.get(Rep::Cartoon).iter().collect();
        for i in cartoon {
            match atoms[i].cartoon_type {
                1 | 4 => sets.trace.set(i),
                7 => sets.putty.set(i),
                -1 => {}
                _ => continue,
            }
            sets.get_mut(Rep::Cartoon).clear(i);
        }
        clean_singletons(sets.get_mut(Rep::Cartoon), atoms);
        clean_singletons(sets.get_mut(Rep::Ribbon), atoms);
        clean_singletons(&mut sets.trace, atoms);
        clean_singletons(&mut sets.putty, atoms);

        let mut drawn = sets.get(Rep::Cartoon).clone();
        drawn.union_with(&sets.trace);
        sets.get_mut(Rep::Ribbon).and_not(&drawn);
        sets
    }
}

/// Drop residues with no neighbouring residue in the set. Backbone shapes
/// need at least two consecutive residues.
///
/// Residues are numbered in atom order; a chain or model change skips a
/// number so residues at a break have no neighbour across it.
fn clean_singletons(set: &mut AtomSet, atoms: &[AtomRecord]) {
    if set.is_empty() {
        return;
    }
    let mut residue_of = Vec::with_capacity(atoms.len());
    let mut residue = 0usize;
    let mut prev: Option<&AtomRecord> = None;
    for atom in atoms {
        if let Some(p) = prev {
            if p.chain != atom.chain || p.model != atom.model {
                residue += 2;
            } else if p.seq != atom.seq {
                residue += 1;
            }
        }
        residue_of.push(residue);
        prev = Some(atom);
    }

    let mut marked = AtomSet::with_len(residue + 1);
    for i in set.iter() {
        marked.set(residue_of[i]);
    }
    let mut keep = AtomSet::with_len(residue + 1);
    for r in marked.iter() {
        if (r > 0 && marked.get(r - 1)) || marked.get(r + 1) {
            keep.set(r);
        }
    }
    let drop: Vec<usize> = set.iter().filter(|&i| !keep.get(residue_of[i])).collect();
    for i in drop {
        set.clear(i);
    }
}

// ── Molecule commands ────────────────────────────────────────────────────

/// Atoms with no bond.
fn unbonded(mol: &MoleculeData) -> AtomSet {
    let n = mol.atoms.len();
    let mut bonded = AtomSet::with_len(n);
    for b in &mol.bonds {
        bonded.set(b.a);
        bonded.set(b.b);
    }
    let mut out = AtomSet::from_indices(n, 0..n);
    out.and_not(&bonded);
    out
}

fn float_key(v: f32) -> u32 {
    v.max(0.0).to_bits()
}

/// Representation commands for a molecule, in kind order.
#[must_use]
pub fn molecule_commands(mol: &MoleculeData, ctx: RepContext<'_>) -> Vec<DeferredRenderCommand> {
    let atoms = &mol.atoms;
    let n = atoms.len();
    if n == 0 {
        return Vec::new();
    }
    let scope = ctx.scope;
    let sets = RepSets::claim(atoms);
    let mut out = Vec::new();

    let colors: Vec<u32> = atoms.iter().map(|a| ctx.argb(a.color)).collect();
    out.push(
        DeferredRenderCommand::atoms(ShapeKind::Ball, AtomSet::from_indices(n, 0..n))
            .with_colors(colors),
    );

    ball_commands(mol, &sets, scope, &mut out);

    // stick
    let sticks = sets.get(Rep::Sticks);
    if !sticks.is_empty() {
        out.push(
            DeferredRenderCommand::atoms(ShapeKind::Stick, sticks.clone())
                .with_size(scope.float(id::STICK_RADIUS) * 2.0)
                .with_translucency(scope.float(id::STICK_TRANSPARENCY)),
        );
    }

    // line
    let mut lines = sets.get(Rep::Lines).clone();
    lines.and_not(sticks);
    if !lines.is_empty() {
        out.push(
            DeferredRenderCommand::atoms(ShapeKind::Stick, lines)
                .with_size(scope.float(id::LINE_WIDTH) / 15.0),
        );
    }

    // dot
    let dots = sets.get(Rep::Dots);
    if !dots.is_empty() {
        out.push(
            DeferredRenderCommand::atoms(ShapeKind::Dot, dots.clone())
                .with_size(scope.float(id::SPHERE_SCALE)),
        );
    }

    if let Some(cmd) = label_command(atoms, sets.get(Rep::Labels), ctx) {
        out.push(cmd);
    }
    cartoon_commands(mol, sets.get(Rep::Cartoon), scope, &mut out);
    trace_commands(atoms, &sets, scope, &mut out);
    if ctx.allow_surfaces {
        for (rep, mesh) in [(Rep::Mesh, true), (Rep::Surface, false)] {
            if let Some(cmd) = surface_command(atoms, sets.get(rep), mesh, ctx) {
                out.push(cmd);
            }
        }
    }
    if let Some(cmd) = putty_command(atoms, &sets.putty, scope) {
        out.push(cmd);
    }
    out
}

/// Spheres grouped by radius, then stars on unbonded atoms.
fn ball_commands(
    mol: &MoleculeData,
    sets: &RepSets,
    scope: SettingsScope<'_>,
    out: &mut Vec<DeferredRenderCommand>,
) {
    let atoms = &mol.atoms;
    let n = atoms.len();
    let loose = unbonded(mol);
    let mut by_radius: BTreeMap<u32, AtomSet> = BTreeMap::new();
    for i in sets.get(Rep::Spheres).iter() {
        let a = &atoms[i];
        let r = a.vdw * scope.unique_float(a.unique_id, id::SPHERE_SCALE);
        by_radius.entry(float_key(r)).or_insert_with(|| AtomSet::with_len(n)).set(i);
    }
    let mut nb = sets.get(Rep::NbSpheres).clone();
    nb.intersect_with(&loose);
    for i in nb.iter() {
        let r = scope.unique_float(atoms[i].unique_id, id::NONBONDED_SIZE);
        by_radius.entry(float_key(r)).or_insert_with(|| AtomSet::with_len(n)).set(i);
    }
    let sphere_transparency = scope.float(id::SPHERE_TRANSPARENCY);
    for (radius, set) in by_radius {
        out.push(
            DeferredRenderCommand::atoms(ShapeKind::Ball, set)
                .with_size(f32::from_bits(radius))
                .with_translucency(sphere_transparency),
        );
    }
    let mut stars = sets.get(Rep::Nonbonded).clone();
    stars.intersect_with(&loose);
    if !stars.is_empty() {
        out.push(
            DeferredRenderCommand::atoms(ShapeKind::Star, stars)
                .with_size(scope.float(id::NONBONDED_SIZE) / 2.0),
        );
    }
}

fn putty_command(
    atoms: &[AtomRecord],
    putty: &AtomSet,
    scope: SettingsScope<'_>,
) -> Option<DeferredRenderCommand> {
    if putty.is_empty() {
        return None;
    }
    let values: Vec<f32> = putty.iter().map(|i| atoms[i].b_factor).collect();
    let mut radii = vec![0.0; atoms.len()];
    for (i, r) in putty.iter().zip(putty_radii(&values, &PuttyParams::from_scope(scope))) {
        radii[i] = r;
    }
    Some(
        DeferredRenderCommand::atoms(ShapeKind::Putty, putty.clone())
            .with_translucency(scope.float(id::CARTOON_TRANSPARENCY))
            .with_payload(Payload::Radii(radii)),
    )
}

fn label_command(
    atoms: &[AtomRecord],
    labelled: &AtomSet,
    ctx: RepContext<'_>,
) -> Option<DeferredRenderCommand> {
    let scope = ctx.scope;
    let default_offset = scope.point(id::LABEL_POSITION);
    let labels: BTreeMap<usize, LabelText> = labelled
        .iter()
        .filter_map(|i| {
            let a = &atoms[i];
            let text = a.label.clone()?;
            Some((
                i,
                LabelText {
                    text,
                    argb: ctx.argb(scope.unique_float(a.unique_id, id::LABEL_COLOR) as i32),
                    font_id: scope.unique_float(a.unique_id, id::LABEL_FONT_ID) as i32,
                    size: scope.unique_float(a.unique_id, id::LABEL_SIZE),
                    offset: scope
                        .unique_point(a.unique_id, id::LABEL_POSITION)
                        .unwrap_or(default_offset),
                },
            ))
        })
        .collect();
    if labels.is_empty() {
        return None;
    }
    let set = AtomSet::from_indices(atoms.len(), labels.keys().copied());
    Some(DeferredRenderCommand::atoms(ShapeKind::Label, set).with_payload(Payload::Labels(labels)))
}

fn cartoon_commands(
    mol: &MoleculeData,
    cartoon: &AtomSet,
    scope: SettingsScope<'_>,
    out: &mut Vec<DeferredRenderCommand>,
) {
    if cartoon.is_empty() {
        return;
    }
    let n = mol.atoms.len();
    let transparency = scope.float(id::CARTOON_TRANSPARENCY);
    let helix = if scope.bool(id::CARTOON_CYLINDRICAL_HELICES) {
        scope.float(id::CARTOON_HELIX_RADIUS)
    } else {
        scope.float(id::CARTOON_OVAL_LENGTH)
    };
    let mut nucleic = AtomSet::with_len(n);
    for code in [SsCode::Helix, SsCode::Sheet, SsCode::Turn, SsCode::None] {
        let mut set = cartoon.clone();
        set.intersect_with(mol.ss_atoms.get(code));
        if code == SsCode::None {
            for i in set.iter().filter(|&i| mol.atoms[i].is_nucleic()) {
                nucleic.set(i);
            }
            set.and_not(&nucleic);
        }
        if set.is_empty() {
            continue;
        }
        let radius = match code {
            SsCode::Helix => helix,
            SsCode::Sheet => scope.float(id::CARTOON_RECT_LENGTH),
            SsCode::Turn | SsCode::None => scope.float(id::CARTOON_LOOP_RADIUS),
        };
        out.push(
            DeferredRenderCommand::atoms(ShapeKind::Cartoon, set)
                .with_size(radius * 2.0)
                .with_translucency(transparency),
        );
    }
    if !nucleic.is_empty() {
        out.push(
            DeferredRenderCommand::atoms(ShapeKind::Cartoon, nucleic)
                .with_size(scope.float(id::CARTOON_TUBE_RADIUS) * 2.0)
                .with_translucency(transparency),
        );
    }
}

fn trace_commands(
    atoms: &[AtomRecord],
    sets: &RepSets,
    scope: SettingsScope<'_>,
    out: &mut Vec<DeferredRenderCommand>,
) {
    let tube = scope.float(id::CARTOON_TUBE_RADIUS) * 2.0;
    let (nucleic, protein): (Vec<usize>, Vec<usize>) =
        sets.trace.iter().partition(|&i| atoms[i].is_nucleic());
    for (kind, list) in [(ShapeKind::Cartoon, nucleic), (ShapeKind::Trace, protein)] {
        if !list.is_empty() {
            out.push(
                DeferredRenderCommand::atoms(kind, AtomSet::from_indices(atoms.len(), list))
                    .with_size(tube),
            );
        }
    }

    let ribbon = sets.get(Rep::Ribbon);
    if ribbon.is_empty() {
        return;
    }
    let smooth = scope.int(id::RIBBON_SAMPLING) > 1;
    let radius = scope.float(id::RIBBON_RADIUS);
    let size = if radius > 0.0 {
        radius * 2.0
    } else {
        let pixel_scale = scope.float(id::RAY_PIXEL_SCALE);
        let factor = match (smooth, pixel_scale) {
            (true, _) => 1.0,
            (false, s) if s <= 1.0 => 0.5,
            (false, s) => s,
        };
        scope.float(id::RIBBON_WIDTH) * factor * 0.1
    };
    let kind = if smooth { ShapeKind::Trace } else { ShapeKind::Backbone };
    out.push(DeferredRenderCommand::atoms(kind, ribbon.clone()).with_size(size));
}

fn surface_command(
    atoms: &[AtomRecord],
    set: &AtomSet,
    mesh: bool,
    ctx: RepContext<'_>,
) -> Option<DeferredRenderCommand> {
    let scope = ctx.scope;
    let mode = scope.int(id::SURFACE_MODE);
    let keep = |a: &AtomRecord| match mode {
        0 => !a.no_surface(),
        2 | 4 => !a.is_hydrogen(),
        _ => true,
    };
    let set = AtomSet::from_indices(atoms.len(), set.iter().filter(|&i| keep(&atoms[i])));
    if set.is_empty() {
        return None;
    }
    let kind = if mesh { ShapeKind::Mesh } else { ShapeKind::Surface };
    let mut cmd = DeferredRenderCommand::atoms(kind, set)
        .with_translucency(scope.float(id::TRANSPARENCY))
        .with_payload(Payload::Surface(SurfaceParams {
            mesh,
            solvent_radius: scope.float(id::SOLVENT_RADIUS),
            two_sided: scope.bool(id::TWO_SIDED_LIGHTING),
            only: matches!(mode, 3 | 4),
        }));
    let color = scope.int(id::SURFACE_COLOR);
    if color >= 0 {
        cmd = cmd.with_argb(ctx.argb(color));
    }
    Some(cmd)
}
