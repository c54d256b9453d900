//! Tests of decoding and materializing complete files.

use euclid::{point3, size3, vec3};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::testing::{VoxFileBuilder, VoxWriter};
use crate::{
    AttributeError, AxisConvention, ChunkId, DecodeError, DecodeOptions, Dictionary,
    MaterializeOptions, Palette, Volume, VoxScene, materialize,
};

fn decode(bytes: &[u8]) -> Result<VoxScene, DecodeError> {
    VoxScene::decode(bytes, &DecodeOptions::default())
}

fn decode_and_materialize(bytes: &[u8], options: &MaterializeOptions) -> Vec<Volume> {
    let scene = decode(bytes).unwrap();
    let mut volumes = Vec::new();
    materialize(&scene, options, &mut volumes);
    volumes
}

fn names(volumes: &[Volume]) -> Vec<&str> {
    volumes.iter().map(|v| v.name.as_str()).collect()
}

/// A model with one voxel, placed by a transform at `[10, 20, 30]` under the root.
fn one_placed_model() -> VoxFileBuilder {
    VoxFileBuilder::new()
        .size(2, 2, 2)
        .xyzi(&[[0, 0, 0, 5]])
        .transform(
            0,
            &Dictionary::from_iter([("_name", "thing")]),
            1,
            0,
            &[Dictionary::from_iter([("_t", "10 20 30")])],
        )
}

// -------------------------------------------------------------------------------------------------

#[test]
fn single_model_without_scene_graph() {
    let bytes = VoxFileBuilder::new()
        .size(2, 2, 2)
        .xyzi(&[[0, 0, 0, 5]])
        .build();
    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());

    let [volume] = volumes.as_slice() else {
        panic!("expected one volume, got {volumes:?}");
    };
    assert_eq!(volume.name, "model_0");
    assert_eq!(volume.model_index, 0);
    assert_eq!(volume.grid.size(), size3(2, 2, 2));
    assert_eq!(
        volume.grid.filled().collect::<Vec<_>>(),
        vec![(point3(0, 0, 0), 5)]
    );
    assert_eq!(volume.grid.cells().iter().filter(|&&c| c == 0).count(), 7);
    assert_eq!(volume.translation, vec3(0, 0, 0));
    assert_eq!(
        volume.orientation.map(|v| v.to_array()),
        [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
    );
}

#[test]
fn placed_model() {
    let bytes = one_placed_model().shape(1, &[0]).build();
    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());
    assert_eq!(names(&volumes), vec!["thing"]);
    // Y-up by default
    assert_eq!(volumes[0].translation, vec3(10, 30, 20));
}

#[test]
fn palette_index_zero_is_never_drawn() {
    let mut colors = [[255; 4]; 256];
    colors[7] = [0, 0, 0, 0];
    let bytes = VoxFileBuilder::new()
        .rgba(&colors)
        .size(2, 2, 2)
        .xyzi(&[[0, 0, 0, 0], [1, 0, 0, 7], [0, 1, 0, 8]])
        .build();
    let volumes = decode_and_materialize(
        &bytes,
        &MaterializeOptions::default().with_axis_convention(AxisConvention::ZUp),
    );
    assert_eq!(
        volumes[0].grid.filled().collect::<Vec<_>>(),
        vec![(point3(0, 1, 0), 8)]
    );
}

#[test]
fn default_palette_is_exact() {
    let scene = decode(&VoxFileBuilder::new().size(1, 1, 1).xyzi(&[]).build()).unwrap();
    assert_eq!(scene.palette().colors(), Palette::DEFAULT.colors());
}

#[test]
fn out_of_range_model_reference() {
    let bytes = one_placed_model().shape(1, &[0, 1, -1, 0]).build();
    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());
    assert_eq!(
        volumes.iter().map(|v| v.model_index).collect::<Vec<_>>(),
        vec![0, 0]
    );
}

#[test]
fn self_referencing_child() {
    let bytes = one_placed_model()
        .group(1, &[1, 2])
        .shape(2, &[0])
        .build();
    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());
    assert_eq!(names(&volumes), vec!["thing"]);
}

#[test]
fn cycle_through_transform() {
    // 0 -> 1 -> 2 -> 0, and 1 -> 3
    let bytes = one_placed_model()
        .group(1, &[2, 3])
        .simple_transform(2, 0, [1, 1, 1])
        .shape(3, &[0])
        .build();
    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());
    assert_eq!(names(&volumes), vec!["thing"]);
}

#[test]
fn dangling_child_skips_only_that_child() {
    let bytes = one_placed_model()
        .group(1, &[99, -5, 2])
        .shape(2, &[0])
        .build();
    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());
    assert_eq!(names(&volumes), vec!["thing"]);
}

#[test]
fn shared_child_is_not_a_cycle() {
    let bytes = VoxFileBuilder::new()
        .size(1, 1, 1)
        .xyzi(&[[0, 0, 0, 1]])
        .group(0, &[1, 2])
        .simple_transform(1, 3, [5, 0, 0])
        .simple_transform(2, 3, [-5, 0, 0])
        .shape(3, &[0])
        .build();
    let volumes = decode_and_materialize(
        &bytes,
        &MaterializeOptions::default().with_axis_convention(AxisConvention::ZUp),
    );
    assert_eq!(
        volumes.iter().map(|v| v.translation).collect::<Vec<_>>(),
        vec![vec3(5, 0, 0), vec3(-5, 0, 0)]
    );
}

#[test]
fn one_volume_per_model_reference() {
    let bytes = one_placed_model()
        .size(1, 1, 1)
        .xyzi(&[[0, 0, 0, 1]])
        .shape(1, &[1, 0])
        .build();
    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());
    assert_eq!(names(&volumes), vec!["thing", "thing"]);
    assert_eq!(
        volumes.iter().map(|v| v.grid.size()).collect::<Vec<_>>(),
        vec![size3(1, 1, 1), size3(2, 2, 2)]
    );
}

#[rstest]
#[case::z_up(AxisConvention::ZUp, [1, 2, 3], [0, 1, 2], [4, 5, 6], [0.5, 1.0, 1.5])]
#[case::y_up(AxisConvention::YUp, [1, 3, 2], [0, 2, 1], [4, 6, 5], [0.5, 1.5, 1.0])]
fn axis_convention(
    #[case] convention: AxisConvention,
    #[case] grid_size: [u32; 3],
    #[case] voxel: [u32; 3],
    #[case] translation: [i64; 3],
    #[case] diagonal: [f64; 3],
) {
    let bytes = VoxFileBuilder::new()
        .size(1, 2, 3)
        .xyzi(&[[0, 1, 2, 1]])
        .simple_transform(0, 1, [4, 5, 6])
        .shape(1, &[0])
        .build();
    let volumes = decode_and_materialize(
        &bytes,
        &MaterializeOptions::default().with_axis_convention(convention),
    );
    let volume = &volumes[0];
    assert_eq!(volume.grid.size().to_array(), grid_size);
    assert_eq!(
        volume
            .grid
            .filled()
            .map(|(p, _)| p.to_array())
            .collect::<Vec<_>>(),
        vec![voxel]
    );
    assert_eq!(volume.translation.to_array(), translation);
    assert_eq!(
        [0, 1, 2].map(|axis| volume.orientation[axis].to_array()[axis]),
        diagonal
    );
}

// -------------------------------------------------------------------------------------------------

#[test]
fn negative_string_length() {
    let content = VoxWriter::new().i32(0).i32(1).i32(-1).into_bytes();
    let bytes = VoxFileBuilder::new().chunk(*b"nGRP", &content, &[]).build();
    assert_eq!(decode(&bytes), Err(DecodeError::InvalidLength { length: -1 }));
}

#[test]
fn truncated_file() {
    let mut bytes = one_placed_model().shape(1, &[0]).build();
    bytes.truncate(bytes.len() - 3);
    assert!(matches!(
        decode(&bytes),
        Err(DecodeError::TruncatedInput { offset: 20, .. })
    ));
}

#[test]
fn malformed_translation() {
    let bytes = VoxFileBuilder::new()
        .transform(
            0,
            &Dictionary::new(),
            1,
            0,
            &[Dictionary::from_iter([("_t", "1 two 3")])],
        )
        .build();
    assert_eq!(
        decode(&bytes),
        Err(DecodeError::InvalidAttribute {
            chunk: ChunkId::TRANSFORM,
            source: AttributeError::ParseToken {
                key: "_t".into(),
                index: 1,
                token: "two".into(),
            },
        })
    );
}

#[test]
fn deeply_nested_children_of_a_leaf_chunk() {
    let depth: u32 = 150_000;
    let nested = (1..=depth)
        .fold(VoxWriter::new(), |w, level| {
            w.bytes(b"KIDS").u32(0).u32((depth - level) * 12)
        })
        .into_bytes();
    let size = VoxWriter::new().i32(1).i32(1).i32(1).into_bytes();
    let bytes = VoxFileBuilder::new()
        .chunk(*b"SIZE", &size, &nested)
        .xyzi(&[[0, 0, 0, 1]])
        .build();

    let volumes = decode_and_materialize(&bytes, &MaterializeOptions::default());
    assert_eq!(names(&volumes), vec!["model_0"]);
}

#[test]
fn error_chain_display() {
    let error = decode(
        &VoxFileBuilder::new()
            .chunk(*b"XYZI", &VoxWriter::new().i32(2).into_bytes(), &[])
            .build(),
    )
    .unwrap_err();
    assert_eq!(
        error.to_string(),
        "XYZI chunk content declared 4 bytes but 8 bytes were consumed"
    );
}
