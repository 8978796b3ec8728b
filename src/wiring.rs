//! Derived-path wiring between blackboard cells
//!
//! The session keeps one user-chosen output directory; every intermediate
//! artifact lives at a conventional name under it. [`install`] registers the
//! callbacks that keep those derived path cells in sync, so a user picking a
//! new output directory (or loading a session that changes it) re-derives
//! the whole tree in one pass.
//!
//! All callbacks are registered under `wiring:` keys via
//! [`Cell::register_callback`], so installing twice replaces rather than
//! duplicates, and none of them fire at install time.

use crate::cell::Cell;
use crate::model::{Model, Side};
use std::path::Path;

fn join(base: &str, name: &str) -> String {
    Path::new(base).join(name).to_string_lossy().into_owned()
}

/// Register every derived-path callback on `model`
pub fn install(model: &Model) {
    let m = model.clone();
    model.output_path.register_callback("wiring:output", move |output: &String| {
        derive_output_paths(&m, output);
    });

    for side in [Side::Fixed, Side::Moving] {
        let m = model.clone();
        model
            .stack_path(side)
            .register_callback("wiring:precomputed", move |_: &String| {
                derive_precomputed_path(&m, side);
            });
        let m = model.clone();
        model
            .output_path
            .register_callback(format!("wiring:precomputed-{}", side.name()), move |_: &String| {
                derive_precomputed_path(&m, side);
            });
    }

    // The warped moving volume is the default first alignment channel.
    let m = model.clone();
    model
        .moving_precomputed_path
        .register_callback("wiring:alignment-channel-0", move |path: &String| {
            if !m.alignment_input_paths.is_empty() {
                let _ = m.alignment_input_paths.set(0, path.clone());
            }
        });

    let m = model.clone();
    model
        .n_refinement_rounds
        .register_callback("wiring:rounds", move |count: &usize| {
            m.resize_refinement_rounds(*count);
            derive_round_paths(&m, &m.output_path.get());
        });

    let m = model.clone();
    model
        .n_alignment_channels
        .register_callback("wiring:channels", move |count: &usize| {
            m.resize_alignment_channels(*count);
            hook_alignment_inputs(&m);
        });

    hook_alignment_inputs(model);
}

fn derive_output_paths(model: &Model, output: &str) {
    for (cell, name) in [
        (&model.fixed_blob_path, "blobs_fixed.json"),
        (&model.moving_blob_path, "blobs_moving.json"),
        (&model.fixed_patches_path, "patches_fixed.h5"),
        (&model.moving_patches_path, "patches_moving.h5"),
        (&model.fixed_model_path, "fixed.model"),
        (&model.moving_model_path, "moving.model"),
        (&model.fixed_coords_path, "coords_fixed.json"),
        (&model.moving_coords_path, "coords_moving.json"),
        (
            &model.fixed_geometric_features_path,
            "fixed-geometric-features.npy",
        ),
        (
            &model.moving_geometric_features_path,
            "moving-geometric-features.npy",
        ),
        (&model.rough_interpolator, "rough-alignment.pkl"),
    ] {
        cell.set(join(output, name));
    }
    derive_round_paths(model, output);
}

/// Per-round artifact names carry a 1-based round number
fn derive_round_paths(model: &Model, output: &str) {
    for round in 0..model.find_neighbors_path.len() {
        let n = round + 1;
        for (list, name) in [
            (
                &model.find_neighbors_path,
                format!("find-neighbors_round_{n}.json"),
            ),
            (
                &model.find_neighbors_pdf_path,
                format!("find-neighbors_round_{n}.pdf"),
            ),
            (
                &model.filter_matches_path,
                format!("filter-matches_round_{n}.json"),
            ),
            (
                &model.filter_matches_pdf_path,
                format!("filter-matches_round_{n}.pdf"),
            ),
            (
                &model.fit_nonrigid_transform_path,
                format!("fit-nonrigid-transform_round_{n}.pkl"),
            ),
            (
                &model.fit_nonrigid_transform_inverse_path,
                format!("fit-nonrigid-transform-inverse_round_{n}.pkl"),
            ),
            (
                &model.fit_nonrigid_transform_pdf_path,
                format!("fit-nonrigid-transform_round_{n}.pdf"),
            ),
        ] {
            let _ = list.set(round, join(output, &name));
        }
    }
}

/// `<output>/<stack basename>_precomputed`
fn derive_precomputed_path(model: &Model, side: Side) {
    let stack = model.stack_path(side).get();
    let output = model.output_path.get();
    if stack.is_empty() || output.is_empty() {
        return;
    }
    let basename = Path::new(&stack)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    model
        .precomputed_path(side)
        .set(join(&output, &format!("{basename}_precomputed")));
}

/// Each alignment input path drives its warped-volume output and TIFF
/// directory. Re-registering after a channel resize replaces the hooks on
/// retained cells and adds them to appended ones.
fn hook_alignment_inputs(model: &Model) {
    for channel in 0..model.alignment_input_paths.len() {
        let Some(input) = model.alignment_input_paths.get(channel) else {
            continue;
        };
        let output: Option<Cell<String>> = model.alignment_output_paths.get(channel);
        let tiff: Option<Cell<String>> = model.alignment_tiff_directories.get(channel);
        input.register_callback("wiring:channel-outputs", move |path: &String| {
            if path.is_empty() {
                return;
            }
            if let Some(output) = &output {
                output.set(format!("{path}_warped"));
            }
            if let Some(tiff) = &tiff {
                tiff.set(format!("{path}_tiff"));
            }
        });
    }
}
