//! Group visibility: hides molecule atoms and suppresses commands of
//! objects under an invisible node.

use super::command::{DeferredRenderCommand, Payload, ShapeKind, Target};
use crate::session::SessionModel;
use crate::util::bitset::AtomSet;

/// Outcome of the visibility pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Visibility {
    /// Effective visibility per group-tree node.
    pub nodes: Vec<bool>,
    /// Merged atom indices of invisible molecules.
    pub hidden: AtomSet,
    /// Per branch: drawn as a whole object and currently invisible.
    pub occluded: Vec<bool>,
}

impl Visibility {
    /// Resolve the group tree of `model`.
    #[must_use]
    pub fn resolve(model: &SessionModel) -> Self {
        let nodes = model.groups.effective_visibility();
        let mut hidden = AtomSet::with_len(model.atom_count);
        let mut occluded = vec![false; model.branches.len()];
        for (node, &visible) in model.groups.nodes().iter().zip(&nodes) {
            let Some(b) = node.branch else { continue };
            let Some(branch) = model.branches.get(b) else {
                continue;
            };
            if visible {
                continue;
            }
            if branch.molecule().is_some() {
                hidden.set_range(branch.atom_base, branch.atom_base + branch.atom_count());
            } else {
                occluded[b] = true;
            }
        }
        Self {
            nodes,
            hidden,
            occluded,
        }
    }

    /// Mark commands of occluded branches invisible.
    pub fn suppress(&self, commands: &mut [DeferredRenderCommand]) {
        for cmd in commands {
            if cmd.branch.is_some_and(|b| self.occluded.get(b).copied().unwrap_or(false)) {
                cmd.visible = false;
            }
        }
    }

    /// Closing `Group` and `Hidden` commands.
    #[must_use]
    pub fn commands(&self, model: &SessionModel) -> Vec<DeferredRenderCommand> {
        let mut out = Vec::new();
        if !model.groups.nodes().is_empty() {
            out.push(
                DeferredRenderCommand::new(ShapeKind::Group, Target::Session).with_payload(
                    Payload::Groups {
                        tree: model.groups.clone(),
                        visibility: self.nodes.clone(),
                    },
                ),
            );
        }
        if !self.hidden.is_empty() {
            out.push(DeferredRenderCommand::atoms(
                ShapeKind::Hidden,
                self.hidden.clone(),
            ));
        }
        out
    }
}
