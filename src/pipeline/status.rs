//! File-existence based step enablement
//!
//! Each pipeline step advertises whether it can run yet. The computation is
//! purely a function of what is on disk and the current cell values; nothing
//! here mutates the blackboard or remembers previous answers, so callers can
//! re-evaluate after every tool run or cell change.

use super::volume::{count_tif_files, volume_is_valid};
use crate::model::{Model, Side};
use std::path::Path;

/// Whether a pipeline step can run yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// A required input does not exist yet
    Blocked,
    /// Inputs are present, outputs are not
    Ready,
    /// Inputs and outputs are both present; rerunning would overwrite
    Done,
}

fn exists(path: &str) -> bool {
    !path.is_empty() && Path::new(path).exists()
}

/// Generic enablement rule: blocked while any source is missing, done once
/// every output exists, ready in between.
pub fn step_status<'a>(
    sources: impl IntoIterator<Item = &'a str>,
    outputs: impl IntoIterator<Item = &'a str>,
) -> StepStatus {
    if sources.into_iter().any(|source| !exists(source)) {
        return StepStatus::Blocked;
    }
    let mut outputs = outputs.into_iter().peekable();
    if outputs.peek().is_some() && outputs.all(exists) {
        StepStatus::Done
    } else {
        StepStatus::Ready
    }
}

/// Precomputed-volume conversion: needs TIFFs in the stack directory, done
/// once the decimated volume is on disk.
pub fn precomputed_status(model: &Model, side: Side) -> StepStatus {
    if count_tif_files(&model.stack_path(side).get()) == 0 {
        return StepStatus::Blocked;
    }
    if volume_is_valid(&model.precomputed_path(side).get()) {
        StepStatus::Done
    } else {
        StepStatus::Ready
    }
}

pub fn detect_blobs_status(model: &Model, side: Side) -> StepStatus {
    if count_tif_files(&model.preprocessed_path(side).get()) == 0 {
        return StepStatus::Blocked;
    }
    if exists(&model.blob_path(side).get()) {
        StepStatus::Done
    } else {
        StepStatus::Ready
    }
}

pub fn collect_patches_status(model: &Model, side: Side) -> StepStatus {
    let blob_path = model.blob_path(side).get();
    let patches_path = model.patches_path(side).get();
    step_status([blob_path.as_str()], [patches_path.as_str()])
}

/// Training is skippable: with `bypass_training` set the step reports done
/// regardless of whether a classifier model exists.
pub fn training_status(model: &Model, side: Side) -> StepStatus {
    if model.bypass_training.get() {
        return StepStatus::Done;
    }
    let patches_path = model.patches_path(side).get();
    let model_path = model.model_path(side).get();
    step_status([patches_path.as_str()], [model_path.as_str()])
}

pub fn geometric_features_status(model: &Model, side: Side) -> StepStatus {
    let coords_path = model.coords_path(side).get();
    let features_path = model.geometric_features_path(side).get();
    step_status([coords_path.as_str()], [features_path.as_str()])
}

/// Rough registration needs both precomputed volumes
pub fn rough_alignment_status(model: &Model) -> StepStatus {
    if !volume_is_valid(&model.fixed_precomputed_path.get())
        || !volume_is_valid(&model.moving_precomputed_path.get())
    {
        return StepStatus::Blocked;
    }
    if exists(&model.rough_interpolator.get()) {
        StepStatus::Done
    } else {
        StepStatus::Ready
    }
}

pub fn find_neighbors_status(model: &Model, round: usize) -> StepStatus {
    let Ok(transform) = model.refinement_transform_source(round) else {
        return StepStatus::Blocked;
    };
    let sources = [
        model.fixed_coords_path.get(),
        model.moving_coords_path.get(),
        model.fixed_geometric_features_path.get(),
        model.moving_geometric_features_path.get(),
        transform,
    ];
    let output = model.find_neighbors_path.value(round).unwrap_or_default();
    step_status(
        sources.iter().map(String::as_str),
        [output.as_str()],
    )
}

pub fn filter_matches_status(model: &Model, round: usize) -> StepStatus {
    let input = model.find_neighbors_path.value(round).unwrap_or_default();
    let output = model.filter_matches_path.value(round).unwrap_or_default();
    step_status([input.as_str()], [output.as_str()])
}

pub fn fit_nonrigid_transform_status(model: &Model, round: usize) -> StepStatus {
    let input = model.filter_matches_path.value(round).unwrap_or_default();
    let output = model
        .fit_nonrigid_transform_path
        .value(round)
        .unwrap_or_default();
    let inverse = model
        .fit_nonrigid_transform_inverse_path
        .value(round)
        .unwrap_or_default();
    step_status(
        [input.as_str()],
        [output.as_str(), inverse.as_str()],
    )
}

/// Warping needs the final round's transform and at least one configured
/// channel.
pub fn warp_image_status(model: &Model) -> StepStatus {
    let final_round = model.n_refinement_rounds.get().saturating_sub(1);
    let interpolator = model
        .fit_nonrigid_transform_path
        .value(final_round)
        .unwrap_or_default();
    if !exists(&interpolator) {
        return StepStatus::Blocked;
    }
    let configured: Vec<(String, String)> = (0..model.n_alignment_channels.get())
        .filter_map(|channel| {
            let source = model.alignment_input_paths.value(channel)?;
            let dest = model.alignment_output_paths.value(channel)?;
            (!source.is_empty() && !dest.is_empty()).then_some((source, dest))
        })
        .collect();
    if configured.is_empty() || configured.iter().any(|(source, _)| !exists(source)) {
        return StepStatus::Blocked;
    }
    if configured.iter().all(|(_, dest)| volume_is_valid(dest)) {
        StepStatus::Done
    } else {
        StepStatus::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn generic_rule_orders_blocked_ready_done() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("in.json");
        let output = dir.path().join("out.json");
        let source_str = source.to_string_lossy().into_owned();
        let output_str = output.to_string_lossy().into_owned();

        assert_eq!(
            step_status([source_str.as_str()], [output_str.as_str()]),
            StepStatus::Blocked
        );
        fs::File::create(&source).unwrap();
        assert_eq!(
            step_status([source_str.as_str()], [output_str.as_str()]),
            StepStatus::Ready
        );
        fs::File::create(&output).unwrap();
        assert_eq!(
            step_status([source_str.as_str()], [output_str.as_str()]),
            StepStatus::Done
        );
    }

    #[test]
    fn empty_paths_count_as_missing() {
        assert_eq!(step_status([""], ["/tmp/out"]), StepStatus::Blocked);
    }

    #[test]
    fn bypass_makes_training_done() {
        let model = Model::new();
        assert_eq!(training_status(&model, Side::Fixed), StepStatus::Blocked);
        model.bypass_training.set(true);
        assert_eq!(training_status(&model, Side::Fixed), StepStatus::Done);
    }

    #[test]
    fn precomputed_needs_tiffs_first() {
        let dir = tempfile::tempdir().unwrap();
        let model = Model::new();
        model
            .fixed_stack_path
            .set(dir.path().to_string_lossy().into_owned());
        assert_eq!(precomputed_status(&model, Side::Fixed), StepStatus::Blocked);
        fs::File::create(dir.path().join("img_00000.tif")).unwrap();
        assert_eq!(precomputed_status(&model, Side::Fixed), StepStatus::Ready);
    }

    #[test]
    fn find_neighbors_round_zero_blocked_without_rough_interpolator() {
        let dir = tempfile::tempdir().unwrap();
        let model = Model::new();
        for (index, cell) in [
            &model.fixed_coords_path,
            &model.moving_coords_path,
            &model.fixed_geometric_features_path,
            &model.moving_geometric_features_path,
        ]
        .into_iter()
        .enumerate()
        {
            let path = dir.path().join(format!("input_{index}.json"));
            fs::File::create(&path).unwrap();
            cell.set(path.to_string_lossy().into_owned());
        }
        assert_eq!(find_neighbors_status(&model, 0), StepStatus::Blocked);
        let rough = dir.path().join("rough-alignment.pkl");
        fs::File::create(&rough).unwrap();
        model.rough_interpolator.set(rough.to_string_lossy().into_owned());
        assert_eq!(find_neighbors_status(&model, 0), StepStatus::Ready);
    }
}
