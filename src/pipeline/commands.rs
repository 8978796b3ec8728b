//! Argument-list builders for the external pipeline tools
//!
//! Each builder reads the blackboard at the moment a job is launched and
//! produces the [`ToolInvocation`] the corresponding external executable
//! expects. Voxel sizes are comma-joined triples; feature-stage tools take
//! them at two decimals, the warper at three.

use super::invocation::ToolInvocation;
use super::volume::file_uri;
use crate::error::{AlignmentError, Result};
use crate::model::{Model, Side};
use std::path::Path;

fn join(base: &str, name: &str) -> String {
    Path::new(base).join(name).to_string_lossy().into_owned()
}

/// `x,y,z` voxel size at two decimals, as the feature-stage tools expect
pub fn voxel_size_arg(model: &Model) -> String {
    format!(
        "{:.2},{:.2},{:.2}",
        model.x_voxel_size.get(),
        model.y_voxel_size.get(),
        model.z_voxel_size.get()
    )
}

/// `x,y,z` voxel size at three decimals, as the warper expects
pub fn warp_voxel_size_arg(model: &Model) -> String {
    format!(
        "{:.3},{:.3},{:.3}",
        model.x_voxel_size.get(),
        model.y_voxel_size.get(),
        model.z_voxel_size.get()
    )
}

/// Convert one side's TIFF stack into a precomputed (blockfs) volume
pub fn make_precomputed(model: &Model, side: Side) -> ToolInvocation {
    ToolInvocation::new("precomputed-tif")
        .option("--source", format!("{}/*.tif*", model.stack_path(side).get()))
        .option("--dest", model.precomputed_path(side).get())
        .option("--levels", 7)
        .option("--format", "blockfs")
        .option("--n-cores", model.n_workers.get())
}

/// Difference-of-Gaussians blob detection on one side's preprocessed stack.
///
/// Sigmas and distances are configured in micrometers and scaled into
/// pixels by the voxel size; the high sigma is three times the low.
pub fn detect_blobs(model: &Model, side: Side) -> ToolInvocation {
    let scale_xy = |v: f64| v / model.x_voxel_size.get();
    let scale_z = |v: f64| v / model.z_voxel_size.get();
    let dog_low = model.low_sigma(side).get();
    let dog_high = dog_low * 3.0;
    let min_distance = model.min_distance(side).get();
    ToolInvocation::new("detect-blobs")
        .option(
            "--source",
            format!("{}/*.tif*", model.preprocessed_path(side).get()),
        )
        .option("--output", model.blob_path(side).get())
        .option("--dog-low-xy", scale_xy(dog_low))
        .option("--dog-high-xy", scale_xy(dog_high))
        .option("--dog-low-z", scale_z(dog_low))
        .option("--dog-high-z", scale_z(dog_high))
        .option("--threshold", model.blob_threshold(side).get())
        .option("--min-distance-xy", scale_xy(min_distance))
        .option("--min-distance-z", scale_z(min_distance))
        .option("--n-cpus", model.n_workers.get())
        .option("--n-io-cpus", model.n_io_workers.get())
}

/// Collect training patches around one side's detected blobs
pub fn collect_patches(model: &Model, side: Side) -> ToolInvocation {
    ToolInvocation::new("collect-patches")
        .option(
            "--source",
            format!("{}/*.tif*", model.preprocessed_path(side).get()),
        )
        .option("--points", model.blob_path(side).get())
        .option("--output", model.patches_path(side).get())
}

/// Compute geometric features for one side's cell coordinates
pub fn geometric_features(model: &Model, side: Side) -> ToolInvocation {
    ToolInvocation::new("phathom-geometric-features")
        .option("--input", model.coords_path(side).get())
        .option("--output", model.geometric_features_path(side).get())
        .option("--voxel-size", voxel_size_arg(model))
        .option("--n-workers", model.n_workers.get())
}

/// Match fixed and moving cells for one refinement round. Round 0 starts
/// from the rough interpolator, later rounds from the previous round's
/// inverse transform.
pub fn find_neighbors(model: &Model, round: usize) -> Result<ToolInvocation> {
    let radius = round_value(&model.find_neighbors_radius.value(round), round, model)?;
    let max_fdist = round_value(
        &model.find_neighbors_feature_distance.value(round),
        round,
        model,
    )?;
    let prom_thresh = round_value(
        &model.find_neighbors_prominence_threshold.value(round),
        round,
        model,
    )?;
    let output = round_value(&model.find_neighbors_path.value(round), round, model)?;
    let pdf = round_value(&model.find_neighbors_pdf_path.value(round), round, model)?;
    Ok(ToolInvocation::new("phathom-find-neighbors")
        .option("--fixed-coords", model.fixed_coords_path.get())
        .option("--moving-coords", model.moving_coords_path.get())
        .option("--fixed-features", model.fixed_geometric_features_path.get())
        .option(
            "--moving-features",
            model.moving_geometric_features_path.get(),
        )
        .option(
            "--non-rigid-transformation",
            model.refinement_transform_source(round)?,
        )
        .option("--output", output)
        .option("--visualization-file", pdf)
        .option("--voxel-size", voxel_size_arg(model))
        .option("--radius", radius)
        .option("--max-fdist", max_fdist)
        .option("--prom-thresh", prom_thresh)
        .option("--n-workers", model.n_workers.get()))
}

/// Filter one round's neighbor matches by distance and coherence
pub fn filter_matches(model: &Model, round: usize) -> Result<ToolInvocation> {
    let input = round_value(&model.find_neighbors_path.value(round), round, model)?;
    let output = round_value(&model.filter_matches_path.value(round), round, model)?;
    let max_distance = round_value(
        &model.filter_matches_max_distance.value(round),
        round,
        model,
    )?;
    let min_coherence = round_value(
        &model.filter_matches_min_coherence.value(round),
        round,
        model,
    )?;
    let pdf = round_value(&model.filter_matches_pdf_path.value(round), round, model)?;
    Ok(ToolInvocation::new("phathom-filter-matches")
        .option("--input", input)
        .option("--output", output)
        .option("--max-distance", max_distance)
        .option("--min-coherence", min_coherence)
        .option("--visualization-file", pdf))
}

/// Fit one round's nonrigid transform (and its inverse) to the filtered
/// matches
pub fn fit_nonrigid_transform(model: &Model, round: usize) -> Result<ToolInvocation> {
    let input = round_value(&model.filter_matches_path.value(round), round, model)?;
    let output = round_value(
        &model.fit_nonrigid_transform_path.value(round),
        round,
        model,
    )?;
    let inverse = round_value(
        &model.fit_nonrigid_transform_inverse_path.value(round),
        round,
        model,
    )?;
    let pdf = round_value(
        &model.fit_nonrigid_transform_pdf_path.value(round),
        round,
        model,
    )?;
    Ok(ToolInvocation::new("phathom-fit-nonrigid-transform")
        .option("--input", input)
        .option("--output", output)
        .option("--inverse", inverse)
        .option("--visualization-file", pdf))
}

/// Rough rigid registration between the two precomputed volumes.
///
/// `mipmap_level` is the decimation level the caller picked so the volume
/// fits in memory; the initial rotation/translation/center come from the
/// rigid-alignment cells.
pub fn rough_alignment(model: &Model, mipmap_level: u32) -> ToolInvocation {
    let rotation = format!(
        "{:.6},{:.6},{:.6}",
        model.angle_x.get(),
        model.angle_y.get(),
        model.angle_z.get()
    );
    let translation = format!(
        "{:.6},{:.6},{:.6}",
        model.offset_x.get() as f64,
        model.offset_y.get() as f64,
        model.offset_z.get() as f64
    );
    let center = format!(
        "{:.6},{:.6},{:.6}",
        model.center_x.get() as f64,
        model.center_y.get() as f64,
        model.center_z.get() as f64
    );
    ToolInvocation::new("phathom-non-rigid-registration")
        .option("--fixed-url", file_uri(&model.fixed_precomputed_path.get()))
        .option("--fixed-url-format", "blockfs")
        .option(
            "--moving-url",
            file_uri(&model.moving_precomputed_path.get()),
        )
        .option("--moving-url-format", "blockfs")
        .option("--output", model.rough_interpolator.get())
        .arg(format!("--initial-rotation={rotation}"))
        .arg(format!("--initial-translation={translation}"))
        .arg(format!("--rotation-center={center}"))
        .arg(format!("--mipmap-level={mipmap_level}"))
        .option(
            "--working-dir",
            join(&model.output_path.get(), "alignment"),
        )
        .arg("--invert")
}

/// Warp every configured channel through the final round's transform.
/// Channels with an empty input or output path are skipped.
pub fn warp_image(model: &Model) -> Result<ToolInvocation> {
    let final_round = model.n_refinement_rounds.get();
    let interpolator = model
        .fit_nonrigid_transform_path
        .value(final_round.saturating_sub(1))
        .ok_or(AlignmentError::IndexOutOfRange {
            index: final_round.saturating_sub(1),
            len: model.fit_nonrigid_transform_path.len(),
        })?;
    let mut invocation = ToolInvocation::new("phathom-warp-image")
        .option("--interpolator", interpolator)
        .option("--n-workers", model.n_workers.get())
        .option("--n-writers", model.n_io_workers.get())
        .option("--n-levels", model.n_levels.get())
        .option("--voxel-size", warp_voxel_size_arg(model))
        .switch("--use-gpu", model.use_gpu.get());
    for channel in 0..model.n_alignment_channels.get() {
        let source = model.alignment_input_paths.value(channel).unwrap_or_default();
        let dest = model.alignment_output_paths.value(channel).unwrap_or_default();
        if source.is_empty() || dest.is_empty() {
            continue;
        }
        invocation = invocation
            .option("--url", file_uri(&source))
            .option("--output", dest);
    }
    Ok(invocation)
}

/// Per-channel precomputed→TIFF conversions. Channels with an empty TIFF
/// directory or a warped volume that does not exist yet are skipped.
pub fn tiff_conversions(model: &Model) -> Vec<ToolInvocation> {
    let mut invocations = Vec::new();
    for channel in 0..model.n_alignment_channels.get() {
        let tiff_dir = model
            .alignment_tiff_directories
            .value(channel)
            .unwrap_or_default();
        if tiff_dir.is_empty() {
            continue;
        }
        let warped = model.alignment_output_paths.value(channel).unwrap_or_default();
        if !Path::new(&warped).exists() {
            tracing::debug!(channel, path = %warped, "skipping TIFF conversion, no warped volume");
            continue;
        }
        invocations.push(
            ToolInvocation::new("blockfs2tif")
                .option(
                    "--input",
                    join(&join(&warped, "1_1_1"), "precomputed.blockfs"),
                )
                .option("--output-pattern", join(&tiff_dir, "img_%05d.tiff"))
                .option("--n-workers", model.n_io_workers.get()),
        );
    }
    invocations
}

/// Warp a coordinates file through the final round's inverse transform
pub fn warp_points(model: &Model) -> Result<ToolInvocation> {
    let final_round = model.n_refinement_rounds.get();
    let interpolator = model
        .fit_nonrigid_transform_inverse_path
        .value(final_round.saturating_sub(1))
        .ok_or(AlignmentError::IndexOutOfRange {
            index: final_round.saturating_sub(1),
            len: model.fit_nonrigid_transform_inverse_path.len(),
        })?;
    Ok(ToolInvocation::new("phathom-warp-points")
        .option("--interpolator", interpolator)
        .option("--input", model.alignment_input_coords.get())
        .option("--output", model.alignment_output_coords.get())
        .option("--n-workers", model.n_workers.get()))
}

fn round_value<T: Clone>(value: &Option<T>, round: usize, model: &Model) -> Result<T> {
    value.clone().ok_or(AlignmentError::IndexOutOfRange {
        index: round,
        len: model.n_refinement_rounds.get(),
    })
}
