//! The configuration blackboard for the multi-round alignment pipeline
//!
//! The [`Model`] is a named collection of observable cells and channel lists
//! holding every parameter the pipeline steps read and every output path
//! they write. It is the sole shared mutable state of a session: UI controls
//! bind to cells two-way, pipeline invocation code reads cell values to
//! build command lines and writes results back into dependent cells.
//!
//! # Persistence
//!
//! Every persistent field is registered once, by a stable string key, in a
//! serialization registry built at construction. [`Model::write`] dumps the
//! whole document as flat JSON (written to a temporary sibling and renamed,
//! so a crash mid-write cannot truncate the previous file); [`Model::read`]
//! repopulates it wholesale. Keys missing from an incoming document are
//! logged as warnings and keep their current values, so session files from
//! older versions still load; unknown keys are ignored.
//!
//! # Channel lists
//!
//! Round-indexed and channel-indexed fields are [`CellList`]s that track the
//! `n_refinement_rounds` / `n_alignment_channels` count cells. Resizing is
//! an explicit operation ([`Model::resize_channel`] and the grouped
//! [`Model::resize_refinement_rounds`] / [`Model::resize_alignment_channels`])
//! rather than something inlined into UI callbacks, so it is independently
//! testable.
//!
//! # Threading
//!
//! One `Model` per running session, single-threaded. Cloning a `Model` clones
//! cheap shared handles, not the state.

mod registry;

use crate::cell::{Cell, CellList, ResizePolicy};
use crate::error::{AlignmentError, Result};
use registry::{Registry, Slot};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// File extension for saved session documents
pub const SESSION_FILE_EXTENSION: &str = "maui";

/// Append the session extension when the user-supplied name has none
pub fn session_save_path(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let has_extension = path
        .file_name()
        .map(|name| name.to_string_lossy().contains('.'))
        .unwrap_or(false);
    if has_extension {
        path
    } else {
        path.with_extension(SESSION_FILE_EXTENSION)
    }
}

/// The fixed (reference) or moving (to-be-aligned) image volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Fixed,
    Moving,
}

impl Side {
    pub fn name(self) -> &'static str {
        match self {
            Side::Fixed => "fixed",
            Side::Moving => "moving",
        }
    }
}

/// The blackboard holding the parameters for running the multi-round
/// alignment. All fields are shared cell handles; see the module docs.
#[derive(Clone)]
pub struct Model {
    // Workers
    pub n_workers: Cell<usize>,
    pub n_io_workers: Cell<usize>,
    pub use_gpu: Cell<bool>,
    // Viewer
    pub static_content_source: Cell<String>,
    pub bind_address: Cell<String>,
    pub port_number: Cell<u16>,
    pub viewer_initialized: Cell<bool>,
    pub server_config_file: Cell<String>,
    pub img_server_port_number: Cell<u16>,
    // Volume geometry
    pub x_voxel_size: Cell<f64>,
    pub y_voxel_size: Cell<f64>,
    pub z_voxel_size: Cell<f64>,
    // Preprocessing
    pub fixed_stack_path: Cell<String>,
    pub moving_stack_path: Cell<String>,
    pub output_path: Cell<String>,
    pub fixed_preprocessed_path: Cell<String>,
    pub moving_preprocessed_path: Cell<String>,
    pub fixed_precomputed_path: Cell<String>,
    pub moving_precomputed_path: Cell<String>,
    // Rigid alignment
    pub center_x: Cell<i64>,
    pub center_y: Cell<i64>,
    pub center_z: Cell<i64>,
    pub offset_x: Cell<i64>,
    pub offset_y: Cell<i64>,
    pub offset_z: Cell<i64>,
    pub angle_x: Cell<f64>,
    pub angle_y: Cell<f64>,
    pub angle_z: Cell<f64>,
    pub fixed_display_threshold: Cell<f64>,
    pub moving_display_threshold: Cell<f64>,
    // Rough alignment
    pub rough_interpolator: Cell<String>,
    // Cell finding
    pub bypass_training: Cell<bool>,
    pub fixed_blob_path: Cell<String>,
    pub moving_blob_path: Cell<String>,
    pub fixed_blob_threshold: Cell<f64>,
    pub moving_blob_threshold: Cell<f64>,
    pub fixed_low_sigma: Cell<f64>,
    pub moving_low_sigma: Cell<f64>,
    pub fixed_min_distance: Cell<f64>,
    pub moving_min_distance: Cell<f64>,
    pub fixed_patches_path: Cell<String>,
    pub moving_patches_path: Cell<String>,
    pub fixed_model_path: Cell<String>,
    pub moving_model_path: Cell<String>,
    pub fixed_coords_path: Cell<String>,
    pub moving_coords_path: Cell<String>,
    // Fine alignment
    pub fixed_geometric_features_path: Cell<String>,
    pub moving_geometric_features_path: Cell<String>,
    pub n_refinement_rounds: Cell<usize>,
    pub find_neighbors_radius: CellList<f64>,
    pub find_neighbors_feature_distance: CellList<f64>,
    pub find_neighbors_prominence_threshold: CellList<f64>,
    pub find_neighbors_path: CellList<String>,
    pub find_neighbors_pdf_path: CellList<String>,
    // Filter matches
    pub filter_matches_path: CellList<String>,
    pub filter_matches_pdf_path: CellList<String>,
    pub filter_matches_max_distance: CellList<f64>,
    pub filter_matches_min_coherence: CellList<f64>,
    // Fit nonrigid transform
    pub fit_nonrigid_transform_path: CellList<String>,
    pub fit_nonrigid_transform_inverse_path: CellList<String>,
    pub fit_nonrigid_transform_pdf_path: CellList<String>,
    // Apply alignment
    pub n_alignment_channels: Cell<usize>,
    pub n_levels: Cell<usize>,
    pub alignment_input_paths: CellList<String>,
    pub alignment_output_paths: CellList<String>,
    pub alignment_tiff_directories: CellList<String>,
    pub alignment_input_coords: Cell<String>,
    pub alignment_output_coords: Cell<String>,

    registry: Rc<Registry>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create a blackboard populated with session defaults and build the
    /// serialization registry.
    pub fn new() -> Self {
        let n_cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let empty = || Cell::new(String::new());
        let empty_per_round = || CellList::new((0..5).map(|_| String::new()));

        let model = Model {
            n_workers: Cell::new(n_cpus),
            n_io_workers: Cell::new(n_cpus.min(12)),
            use_gpu: Cell::new(false),
            static_content_source: Cell::new(
                "https://leviathan-chunglab.mit.edu/neuroglancer".to_string(),
            ),
            bind_address: Cell::new("localhost".to_string()),
            port_number: Cell::new(0),
            viewer_initialized: Cell::new(false),
            server_config_file: Cell::new(
                std::env::temp_dir()
                    .join(format!("multiround-alignment-{}.json", std::process::id()))
                    .to_string_lossy()
                    .into_owned(),
            ),
            img_server_port_number: Cell::new(8999),
            x_voxel_size: Cell::new(1.8),
            y_voxel_size: Cell::new(1.8),
            z_voxel_size: Cell::new(2.0),
            fixed_stack_path: empty(),
            moving_stack_path: empty(),
            output_path: empty(),
            fixed_preprocessed_path: empty(),
            moving_preprocessed_path: empty(),
            fixed_precomputed_path: empty(),
            moving_precomputed_path: empty(),
            center_x: Cell::new(0),
            center_y: Cell::new(0),
            center_z: Cell::new(0),
            offset_x: Cell::new(0),
            offset_y: Cell::new(0),
            offset_z: Cell::new(0),
            angle_x: Cell::new(0.0),
            angle_y: Cell::new(0.0),
            angle_z: Cell::new(0.0),
            fixed_display_threshold: Cell::new(0.5),
            moving_display_threshold: Cell::new(0.5),
            rough_interpolator: empty(),
            bypass_training: Cell::new(false),
            fixed_blob_path: empty(),
            moving_blob_path: empty(),
            fixed_blob_threshold: Cell::new(100.0),
            moving_blob_threshold: Cell::new(100.0),
            fixed_low_sigma: Cell::new(1.0),
            moving_low_sigma: Cell::new(1.0),
            fixed_min_distance: Cell::new(3.0),
            moving_min_distance: Cell::new(3.0),
            fixed_patches_path: empty(),
            moving_patches_path: empty(),
            fixed_model_path: empty(),
            moving_model_path: empty(),
            fixed_coords_path: empty(),
            moving_coords_path: empty(),
            fixed_geometric_features_path: empty(),
            moving_geometric_features_path: empty(),
            n_refinement_rounds: Cell::new(5),
            find_neighbors_radius: CellList::new([150.0, 125.0, 100.0, 75.0, 50.0]),
            find_neighbors_feature_distance: CellList::new([2.0, 2.25, 2.5, 2.75, 3.0]),
            find_neighbors_prominence_threshold: CellList::new([0.3, 0.4, 0.5, 0.6, 0.7]),
            find_neighbors_path: empty_per_round(),
            find_neighbors_pdf_path: empty_per_round(),
            filter_matches_path: empty_per_round(),
            filter_matches_pdf_path: empty_per_round(),
            filter_matches_max_distance: CellList::new([200.0; 5]),
            filter_matches_min_coherence: CellList::new([0.9; 5]),
            fit_nonrigid_transform_path: empty_per_round(),
            fit_nonrigid_transform_inverse_path: empty_per_round(),
            fit_nonrigid_transform_pdf_path: empty_per_round(),
            n_alignment_channels: Cell::new(1),
            n_levels: Cell::new(7),
            alignment_input_paths: CellList::new([String::new()]),
            alignment_output_paths: CellList::new([String::new()]),
            alignment_tiff_directories: CellList::new([String::new()]),
            alignment_input_coords: empty(),
            alignment_output_coords: empty(),
            registry: Rc::new(Registry::new()),
        };
        let registry = model.build_registry();
        Model {
            registry: Rc::new(registry),
            ..model
        }
    }

    fn build_registry(&self) -> Registry {
        let mut r = Registry::new();
        r.scalar("n_workers", &self.n_workers);
        r.scalar("n_io_workers", &self.n_io_workers);
        r.scalar("use_gpu", &self.use_gpu);
        r.scalar("static_content_source", &self.static_content_source);
        r.scalar("bind_address", &self.bind_address);
        r.scalar("port_number", &self.port_number);
        r.scalar("x_voxel_size", &self.x_voxel_size);
        r.scalar("y_voxel_size", &self.y_voxel_size);
        r.scalar("z_voxel_size", &self.z_voxel_size);
        r.scalar("fixed_stack_path", &self.fixed_stack_path);
        r.scalar("fixed_precomputed_path", &self.fixed_precomputed_path);
        r.scalar("fixed_preprocessed_path", &self.fixed_preprocessed_path);
        r.scalar("moving_stack_path", &self.moving_stack_path);
        r.scalar("moving_precomputed_path", &self.moving_precomputed_path);
        r.scalar("moving_preprocessed_path", &self.moving_preprocessed_path);
        r.scalar("output_path", &self.output_path);
        r.scalar("center_x", &self.center_x);
        r.scalar("center_y", &self.center_y);
        r.scalar("center_z", &self.center_z);
        r.scalar("offset_x", &self.offset_x);
        r.scalar("offset_y", &self.offset_y);
        r.scalar("offset_z", &self.offset_z);
        r.scalar("angle_x", &self.angle_x);
        r.scalar("angle_y", &self.angle_y);
        r.scalar("angle_z", &self.angle_z);
        r.scalar("fixed_display_threshold", &self.fixed_display_threshold);
        r.scalar("moving_display_threshold", &self.moving_display_threshold);
        r.scalar("rough_interpolator", &self.rough_interpolator);
        r.scalar("bypass_training", &self.bypass_training);
        r.scalar("fixed_blob_path", &self.fixed_blob_path);
        r.scalar("moving_blob_path", &self.moving_blob_path);
        r.scalar("fixed_blob_threshold", &self.fixed_blob_threshold);
        r.scalar("moving_blob_threshold", &self.moving_blob_threshold);
        r.scalar("fixed_low_sigma", &self.fixed_low_sigma);
        r.scalar("moving_low_sigma", &self.moving_low_sigma);
        r.scalar("fixed_min_distance", &self.fixed_min_distance);
        r.scalar("moving_min_distance", &self.moving_min_distance);
        r.scalar("fixed_patches_path", &self.fixed_patches_path);
        r.scalar("moving_patches_path", &self.moving_patches_path);
        r.scalar("fixed_model_path", &self.fixed_model_path);
        r.scalar("moving_model_path", &self.moving_model_path);
        r.scalar("fixed_coords_path", &self.fixed_coords_path);
        r.scalar("moving_coords_path", &self.moving_coords_path);
        r.scalar(
            "fixed_geometric_features_path",
            &self.fixed_geometric_features_path,
        );
        r.scalar(
            "moving_geometric_features_path",
            &self.moving_geometric_features_path,
        );
        r.scalar("n_refinement_rounds", &self.n_refinement_rounds);
        r.sequence(
            "find_neighbors_radius",
            &self.find_neighbors_radius,
            ResizePolicy::PropagateLast,
        );
        r.sequence(
            "find_neighbors_feature_distance",
            &self.find_neighbors_feature_distance,
            ResizePolicy::PropagateLast,
        );
        r.sequence(
            "find_neighbors_prominence_threshold",
            &self.find_neighbors_prominence_threshold,
            ResizePolicy::PropagateLast,
        );
        r.sequence(
            "find_neighbors_path",
            &self.find_neighbors_path,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "find_neighbors_pdf_path",
            &self.find_neighbors_pdf_path,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "filter_matches_path",
            &self.filter_matches_path,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "filter_matches_pdf_path",
            &self.filter_matches_pdf_path,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "filter_matches_max_distance",
            &self.filter_matches_max_distance,
            ResizePolicy::PropagateLast,
        );
        r.sequence(
            "filter_matches_min_coherence",
            &self.filter_matches_min_coherence,
            ResizePolicy::PropagateLast,
        );
        r.sequence(
            "fit_nonrigid_transform_path",
            &self.fit_nonrigid_transform_path,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "fit_nonrigid_transform_inverse_path",
            &self.fit_nonrigid_transform_inverse_path,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "fit_nonrigid_transform_pdf_path",
            &self.fit_nonrigid_transform_pdf_path,
            ResizePolicy::PadDefault,
        );
        r.scalar("n_alignment_channels", &self.n_alignment_channels);
        r.scalar("n_levels", &self.n_levels);
        r.sequence(
            "alignment_input_paths",
            &self.alignment_input_paths,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "alignment_output_paths",
            &self.alignment_output_paths,
            ResizePolicy::PadDefault,
        );
        r.sequence(
            "alignment_tiff_directories",
            &self.alignment_tiff_directories,
            ResizePolicy::PadDefault,
        );
        r.scalar("alignment_input_coords", &self.alignment_input_coords);
        r.scalar("alignment_output_coords", &self.alignment_output_coords);
        r
    }

    /// Repopulate the blackboard from a session document.
    ///
    /// Registry keys missing from the document keep their current values
    /// and are reported with a warning; unknown keys in the document are
    /// ignored. A value that fails to decode aborts the load.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let document: serde_json::Value = serde_json::from_str(&text)?;
        let document = document.as_object().ok_or_else(|| {
            AlignmentError::Session(format!("{} is not a JSON object", path.display()))
        })?;
        for (key, slot) in self.registry.entries() {
            match document.get(key) {
                Some(value) => match slot {
                    Slot::Scalar(scalar) => scalar.load(key, value)?,
                    Slot::Sequence(sequence) => sequence.load(key, value)?,
                },
                None => tracing::warn!(
                    key,
                    path = %path.display(),
                    "missing from configuration; the file may be from an older version"
                ),
            }
        }
        tracing::info!(path = %path.display(), "session loaded");
        Ok(())
    }

    /// Serialize every registered field to `path` as a flat JSON document.
    ///
    /// The document is written to a temporary sibling and renamed into
    /// place, so an interrupted save leaves the previous file intact.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut document = serde_json::Map::new();
        for (key, slot) in self.registry.entries() {
            let value = match slot {
                Slot::Scalar(scalar) => scalar.store()?,
                Slot::Sequence(sequence) => sequence.store()?,
            };
            document.insert(key.to_string(), value);
        }
        let text = serde_json::to_string_pretty(&serde_json::Value::Object(document))?;
        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);
        fs::write(&temp_path, text)?;
        fs::rename(&temp_path, path)?;
        tracing::info!(path = %path.display(), "session saved");
        Ok(())
    }

    /// Grow or shrink the channel list registered under `name` to `count`
    /// elements, using the resize policy the field was registered with.
    pub fn resize_channel(&self, name: &str, count: usize) -> Result<()> {
        match self.registry.find(name) {
            Some(Slot::Sequence(sequence)) => {
                sequence.resize(count);
                Ok(())
            }
            Some(Slot::Scalar(_)) => Err(AlignmentError::NotAChannel(name.to_string())),
            None => Err(AlignmentError::UnknownChannel(name.to_string())),
        }
    }

    /// Resize every round-indexed list to `count` rounds: numeric tunables
    /// carry the last round's value forward, path lists pad with empties.
    pub fn resize_refinement_rounds(&self, count: usize) {
        for list in [
            &self.find_neighbors_radius,
            &self.find_neighbors_feature_distance,
            &self.find_neighbors_prominence_threshold,
            &self.filter_matches_max_distance,
            &self.filter_matches_min_coherence,
        ] {
            list.resize(count, ResizePolicy::PropagateLast);
        }
        for list in [
            &self.find_neighbors_path,
            &self.find_neighbors_pdf_path,
            &self.filter_matches_path,
            &self.filter_matches_pdf_path,
            &self.fit_nonrigid_transform_path,
            &self.fit_nonrigid_transform_inverse_path,
            &self.fit_nonrigid_transform_pdf_path,
        ] {
            list.resize(count, ResizePolicy::PadDefault);
        }
    }

    /// Resize the per-channel warping path lists to `count` channels
    pub fn resize_alignment_channels(&self, count: usize) {
        for list in [
            &self.alignment_input_paths,
            &self.alignment_output_paths,
            &self.alignment_tiff_directories,
        ] {
            list.resize(count, ResizePolicy::PadDefault);
        }
    }

    /// The nonrigid transform each refinement round starts from: the rough
    /// interpolator for round 0, the previous round's inverse otherwise.
    pub fn refinement_transform_source(&self, round: usize) -> Result<String> {
        if round == 0 {
            return Ok(self.rough_interpolator.get());
        }
        self.fit_nonrigid_transform_inverse_path
            .value(round - 1)
            .ok_or(AlignmentError::IndexOutOfRange {
                index: round,
                len: self.fit_nonrigid_transform_inverse_path.len(),
            })
    }

    // Side-keyed accessors so pipeline code handles the fixed and moving
    // volumes with one code path.

    pub fn stack_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_stack_path,
            Side::Moving => &self.moving_stack_path,
        }
    }

    pub fn preprocessed_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_preprocessed_path,
            Side::Moving => &self.moving_preprocessed_path,
        }
    }

    pub fn precomputed_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_precomputed_path,
            Side::Moving => &self.moving_precomputed_path,
        }
    }

    pub fn blob_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_blob_path,
            Side::Moving => &self.moving_blob_path,
        }
    }

    pub fn blob_threshold(&self, side: Side) -> &Cell<f64> {
        match side {
            Side::Fixed => &self.fixed_blob_threshold,
            Side::Moving => &self.moving_blob_threshold,
        }
    }

    pub fn low_sigma(&self, side: Side) -> &Cell<f64> {
        match side {
            Side::Fixed => &self.fixed_low_sigma,
            Side::Moving => &self.moving_low_sigma,
        }
    }

    pub fn min_distance(&self, side: Side) -> &Cell<f64> {
        match side {
            Side::Fixed => &self.fixed_min_distance,
            Side::Moving => &self.moving_min_distance,
        }
    }

    pub fn patches_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_patches_path,
            Side::Moving => &self.moving_patches_path,
        }
    }

    pub fn model_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_model_path,
            Side::Moving => &self.moving_model_path,
        }
    }

    pub fn coords_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_coords_path,
            Side::Moving => &self.moving_coords_path,
        }
    }

    pub fn geometric_features_path(&self, side: Side) -> &Cell<String> {
        match side {
            Side::Fixed => &self.fixed_geometric_features_path,
            Side::Moving => &self.moving_geometric_features_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_expectations() {
        let model = Model::new();
        assert_eq!(model.n_refinement_rounds.get(), 5);
        assert_eq!(
            model.find_neighbors_radius.values(),
            vec![150.0, 125.0, 100.0, 75.0, 50.0]
        );
        assert_eq!(model.x_voxel_size.get(), 1.8);
        assert_eq!(model.z_voxel_size.get(), 2.0);
        assert_eq!(model.n_alignment_channels.get(), 1);
        assert_eq!(model.n_levels.get(), 7);
        assert_eq!(model.filter_matches_min_coherence.values(), vec![0.9; 5]);
        assert!(model.output_path.get().is_empty());
    }

    #[test]
    fn refinement_round_resize_scenario() {
        let model = Model::new();
        model.resize_refinement_rounds(3);
        assert_eq!(
            model.find_neighbors_radius.values(),
            vec![150.0, 125.0, 100.0]
        );
        model.resize_refinement_rounds(7);
        assert_eq!(
            model.find_neighbors_radius.values(),
            vec![150.0, 125.0, 100.0, 100.0, 100.0, 100.0, 100.0]
        );
        assert_eq!(model.find_neighbors_path.len(), 7);
        assert_eq!(model.find_neighbors_path.value(6).unwrap(), "");
    }

    #[test]
    fn resize_channel_dispatches_through_registry() {
        let model = Model::new();
        model.resize_channel("alignment_input_paths", 3).unwrap();
        assert_eq!(model.alignment_input_paths.len(), 3);
        model.resize_channel("find_neighbors_radius", 2).unwrap();
        assert_eq!(model.find_neighbors_radius.values(), vec![150.0, 125.0]);
    }

    #[test]
    fn resize_channel_rejects_scalars_and_unknown_names() {
        let model = Model::new();
        assert!(matches!(
            model.resize_channel("x_voxel_size", 2),
            Err(AlignmentError::NotAChannel(_))
        ));
        assert!(matches!(
            model.resize_channel("no_such_field", 2),
            Err(AlignmentError::UnknownChannel(_))
        ));
    }

    #[test]
    fn refinement_transform_source_chains_rounds() {
        let model = Model::new();
        model.rough_interpolator.set("/out/rough-alignment.pkl".into());
        model
            .fit_nonrigid_transform_inverse_path
            .set(0, "/out/inverse_round_1.pkl".into())
            .unwrap();
        assert_eq!(
            model.refinement_transform_source(0).unwrap(),
            "/out/rough-alignment.pkl"
        );
        assert_eq!(
            model.refinement_transform_source(1).unwrap(),
            "/out/inverse_round_1.pkl"
        );
    }

    #[test]
    fn save_path_appends_extension_only_when_missing() {
        assert_eq!(
            session_save_path("/tmp/session"),
            PathBuf::from("/tmp/session.maui")
        );
        assert_eq!(
            session_save_path("/tmp/session.maui"),
            PathBuf::from("/tmp/session.maui")
        );
        assert_eq!(
            session_save_path("/tmp/brain.v2"),
            PathBuf::from("/tmp/brain.v2")
        );
    }
}
