//! Decoding of [MagicaVoxel] `.vox` files, and materialization of their scene graphs into
//! positioned dense voxel grids.
//!
//! The entry points are [`VoxScene::decode()`], which turns bytes into a [`VoxScene`]
//! (or fails as a whole), and [`materialize()`], which walks the decoded scene graph and delivers
//! one [`Volume`] per placed model to a [`VolumeSink`].
//!
//! ```
//! use vox_scene::{DecodeOptions, MaterializeOptions, Volume, VoxScene, materialize};
//!
//! # fn example(bytes: &[u8]) -> Result<(), vox_scene::DecodeError> {
//! let scene = VoxScene::decode(bytes, &DecodeOptions::default())?;
//! let mut volumes: Vec<Volume> = Vec::new();
//! materialize(&scene, &MaterializeOptions::default(), &mut volumes);
//! # Ok(())
//! # }
//! ```
//!
//! Anomalies in the scene graph, such as references to nonexistent nodes or models and cycles,
//! do not cause failure; the affected branches are skipped and reported via [`log`].
//!
//! ## Package features
//!
//! This package defines the following feature flags:
//!
//! * `"auto-threads"`:
//!   Enables implicit use of threads for expanding models into grids,
//!   via [`rayon`]’s global thread pool.
//! * `"serde"`:
//!   Implements [`serde`] traits for the option types, [`AxisConvention`], and [`Color`].
//!
//! [MagicaVoxel]: https://ephtracy.github.io/

// Crate-specific lint settings. (General settings can be found in the workspace manifest.)
#![forbid(unsafe_code)]

mod chunk;
pub use chunk::{Chunk, ChunkHeader, ChunkId, ChunkKind, Region};

mod coord;
pub use coord::{AxisConvention, FileSpace, Orientation, OutputSpace, Placement, Rotation};

mod dict;
pub use dict::Dictionary;

mod error;
pub use error::{AttributeError, DecodeError, ImportError, ImportErrorKind};

pub mod file;
pub use file::load_from_file;

mod materialize;
pub use materialize::{DenseGrid, MaterializeOptions, Volume, VolumeSink, materialize};

mod palette;
pub use palette::{Color, Palette};

mod read;
pub use read::ByteReader;

mod record;
pub use record::{
    Camera, Frame, Group, Layer, Material, Model, ModelReference, ModelSize, NodeId, Note, Record,
    RenderObject, Shape, Transform, Voxel,
};

mod scene;
pub use scene::{DecodeOptions, NodeKind, SceneNode, VoxScene};

mod util;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;
