// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (default clippy thresholds)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! PyMOL session (`.pse`) importer producing deferred molecular scene
//! commands.
//!
//! A session file is a pickle stream. Import runs in three stages:
//!
//! - [`pickle`] executes the opcode stream and returns the root
//!   [`pickle::Mapping`] of [`pickle::Value`]s;
//! - [`session::walk`] interprets that tree as a [`session::SessionModel`]:
//!   settings, objects, atoms, bonds, states, groups, movie and scenes;
//! - [`scene::build`] turns the model into ordered
//!   [`scene::DeferredRenderCommand`]s plus the reconstructed camera.
//!
//! Commands touch nothing until they are finalized against a
//! [`scene::ModelSet`] supplied by the host.
//!
//! # Key entry points
//!
//! - [`load_session`] - bytes to [`scene::BuildOutput`] in one call
//! - [`options::ImportOptions`] - target viewport and import switches,
//!   loadable from TOML

pub mod error;
pub mod options;
pub mod pickle;
pub mod scene;
pub mod session;
pub mod util;

pub use error::PseError;

/// Decode, walk and build a session held in memory.
pub fn load_session(
    bytes: &[u8],
    options: &options::ImportOptions,
) -> Result<(session::SessionModel, scene::BuildOutput), PseError> {
    let root = pickle::decode_bytes(bytes)?;
    let model = session::walk_with(root, &options.import)?;
    let output = scene::build(&model, options);
    Ok((model, output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::atoms::Rep;
    use crate::session::branch::tests::m1;
    use crate::session::tests::session;

    #[test]
    fn bytes_to_commands() {
        let bytes = pickle::encode(&session(vec![m1(&[Rep::Sticks])], vec![]));
        let (model, out) = load_session(&bytes, &options::ImportOptions::default()).unwrap();
        assert_eq!(model.atom_count, 3);
        assert_eq!(out.of_kind(scene::ShapeKind::Stick).count(), 1);
    }

    #[test]
    fn truncated_stream_is_fatal() {
        let bytes = pickle::encode(&session(vec![], vec![]));
        let err = load_session(&bytes[..bytes.len() - 1], &options::ImportOptions::default())
            .unwrap_err();
        assert!(matches!(err, PseError::Stream(_)));
    }
}
