#![no_main]

use vox_scene::{DecodeOptions, MaterializeOptions, Volume, VoxScene, materialize};

libfuzzer_sys::fuzz_target!(|input: &[u8]| test(input));

fn test(input: &[u8]) {
    let Ok(scene) = VoxScene::decode(input, &DecodeOptions::default()) else {
        return;
    };

    // Keep grids small so that the fuzzer spends its time on parsing and traversal.
    let options = MaterializeOptions::default()
        .with_max_grid_cells(1 << 16)
        .with_max_total_cells(1 << 20)
        .with_max_node_visits(1 << 12);
    let mut volumes: Vec<Volume> = Vec::new();
    let count = materialize(&scene, &options, &mut volumes);
    assert_eq!(count, volumes.len());
    for volume in &volumes {
        assert!(volume.grid.cells().len() <= 1 << 16);
    }
}
