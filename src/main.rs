//! Command-line entry point: imports a PyMOL session file and logs a summary.

use std::collections::BTreeMap;
use std::path::Path;

use viso_pse::options::ImportOptions;
use viso_pse::scene::{self, ShapeKind};
use viso_pse::session::{self, GroupTree, SessionModel};

fn load_options(path: Option<&str>) -> Result<ImportOptions, String> {
    match path {
        Some(p) => ImportOptions::load(Path::new(p))
            .map_err(|e| format!("Failed to load options {p}: {e}")),
        None => Ok(ImportOptions::default()),
    }
}

/// Widest horizontal or vertical extent of the loaded atoms, at least 1.
fn scene_width(model: &SessionModel) -> f32 {
    let mut atoms = model.global_atoms().map(|(_, a)| a.coord);
    let Some(first) = atoms.next() else {
        return 1.0;
    };
    let (min, max) = atoms.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
    let extent = max - min;
    extent.x.max(extent.y).max(1.0)
}

fn log_groups(groups: &GroupTree) {
    if !groups.has_hierarchy() {
        return;
    }
    let mut stack: Vec<(usize, usize)> = groups.roots().map(|r| (r, 0)).collect();
    stack.reverse();
    while let Some((i, depth)) = stack.pop() {
        let Some(node) = groups.get(i) else { continue };
        log::info!(
            "  {:indent$}{}{}",
            "",
            node.name,
            if node.visible { "" } else { " (hidden)" },
            indent = depth * 2
        );
        stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
    }
}

fn log_summary(model: &SessionModel, output: &scene::BuildOutput) {
    for branch in &model.branches {
        log::info!(
            "  {:<20} {:?} atoms {}..{} models {}..{}{}",
            branch.name,
            branch.kind,
            branch.atom_base,
            branch.atom_base + branch.atom_count(),
            branch.model_base,
            branch.model_base + branch.model_count(),
            if branch.visible { "" } else { " (hidden)" }
        );
    }
    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for cmd in &output.commands {
        *kinds.entry(format!("{:?}", cmd.kind)).or_default() += 1;
    }
    log_groups(&model.groups);
    for (kind, n) in &kinds {
        log::info!("  {kind:<12} {n}");
    }
    let mut suppressed: BTreeMap<&str, usize> = BTreeMap::new();
    for cmd in output.commands.iter().filter(|c| !c.visible) {
        if let Some(branch) = scene::command_branch(model, cmd) {
            *suppressed.entry(branch.name.as_str()).or_default() += 1;
        }
    }
    for (name, n) in &suppressed {
        log::info!("  {n} commands of {name} suppressed by hidden groups");
    }
    let hidden = output
        .of_kind(ShapeKind::Hidden)
        .filter_map(scene::DeferredRenderCommand::target_atoms)
        .map(viso_pse::util::bitset::AtomSet::count)
        .sum::<usize>();
    let width = scene_width(model);
    log::info!(
        "{} atoms ({hidden} hidden), zoom {:.1}% for a {width:.1} wide scene at distance {:.1}, {}",
        model.atom_count,
        output.view.zoom_for_width(width),
        output.view.distance,
        if output.view.orthographic {
            "orthographic"
        } else {
            "perspective"
        }
    );
    for snap in &model.scenes {
        log::info!("  scene '{}'", snap.name);
    }
}

fn run(session_path: &str, options: &ImportOptions) -> Result<(), String> {
    log::debug!("options: {}", options.to_json());
    let file = std::fs::File::open(session_path)
        .map_err(|e| format!("Failed to open {session_path}: {e}"))?;
    let reader = viso_pse::pickle::ReadSource::new(std::io::BufReader::new(file));
    let root = viso_pse::pickle::decode(reader)
        .map_err(|e| format!("{session_path}: {e}"))?;
    let model = session::walk_with(root, &options.import)
        .map_err(|e| format!("{session_path}: {e}"))?;
    let output = scene::build(&model, options);
    log_summary(&model, &output);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(session_path) = args.next() else {
        log::error!("Usage: viso-pse <session.pse> [options.toml]");
        std::process::exit(1);
    };

    let result = load_options(args.next().as_deref()).and_then(|options| run(&session_path, &options));
    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}
