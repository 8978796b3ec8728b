use multiround_alignment::Model;

/// Install a fmt subscriber once so failing tests show the library's logs
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A blackboard with distinctive non-default values in every kind of field
pub fn populated_model() -> Model {
    let model = Model::new();
    model.n_workers.set(24);
    model.n_io_workers.set(6);
    model.use_gpu.set(true);
    model.x_voxel_size.set(0.9);
    model.y_voxel_size.set(0.9);
    model.z_voxel_size.set(4.5);
    model.fixed_stack_path.set("/raw/brain1/Ex_488".into());
    model.moving_stack_path.set("/raw/brain1/Ex_561".into());
    model.output_path.set("/data/run1".into());
    model.center_x.set(1024);
    model.offset_z.set(-40);
    model.angle_y.set(0.125);
    model.bypass_training.set(true);
    model.fixed_blob_threshold.set(80.0);
    model.moving_low_sigma.set(1.5);
    model.n_refinement_rounds.set(4);
    model.resize_refinement_rounds(4);
    model.find_neighbors_radius.set(3, 60.0).unwrap();
    model
        .find_neighbors_path
        .set(0, "/data/run1/find-neighbors_round_1.json".into())
        .unwrap();
    model.filter_matches_min_coherence.set(1, 0.85).unwrap();
    model.n_alignment_channels.set(2);
    model.resize_alignment_channels(2);
    model
        .alignment_input_paths
        .set(1, "/data/run1/Ex_647_precomputed".into())
        .unwrap();
    model.alignment_input_coords.set("/data/cells.json".into());
    model
}
