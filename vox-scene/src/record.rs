//! Typed records decoded from the content of each kind of chunk.

use core::fmt;

use euclid::{Point3D, Size3D, Vector3D};

use crate::chunk::{ChunkId, ChunkKind};
use crate::coord::{FileSpace, Rotation};
use crate::read::ByteReader;
use crate::{DecodeError, Dictionary, Palette};

// -------------------------------------------------------------------------------------------------

/// Extents of a model, from a `SIZE` chunk.
///
/// These are signed because the file stores them as `i32`;
/// non-positive extents are accepted when decoding but such models cannot be materialized.
pub type ModelSize = Size3D<i32, FileSpace>;

/// One filled cell of a model, from an `XYZI` chunk.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct Voxel {
    /// X coordinate within the model.
    pub x: u8,
    /// Y coordinate within the model.
    pub y: u8,
    /// Z coordinate within the model.
    pub z: u8,
    /// Palette index of the voxel's color.
    pub index: u8,
}

impl Voxel {
    /// Returns the voxel's coordinates.
    pub fn position(self) -> Point3D<u8, FileSpace> {
        Point3D::new(self.x, self.y, self.z)
    }
}

/// The voxels of one model. Its extents are stored separately, in the `SIZE` chunk with the
/// same position in the file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct Model {
    /// Filled cells, in file order.
    pub voxels: Vec<Voxel>,
}

/// Identifier of a scene graph node, as stored in the file.
///
/// Node IDs are not validated when decoding; they may be negative, repeated, or refer to
/// nodes that do not exist.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[expect(clippy::exhaustive_structs)]
pub struct NodeId(pub i32);

impl NodeId {
    /// The node which scene graph traversal starts at.
    pub const ROOT: Self = Self(0);
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One animation frame of a transform node.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Frame {
    /// All of the frame's attributes, including the ones interpreted below.
    pub attributes: Dictionary,
    /// Translation, from the `_t` attribute; zero if absent.
    pub translation: Vector3D<i32, FileSpace>,
    /// Rotation, from the `_r` attribute; identity if absent.
    pub rotation: Rotation,
}

impl Frame {
    /// Interprets a frame's attributes.
    pub fn from_attributes(attributes: Dictionary) -> Result<Self, crate::AttributeError> {
        let translation = if attributes.get("_t").is_some() {
            Vector3D::new(
                attributes.get_token("_t", 0)?,
                attributes.get_token("_t", 1)?,
                attributes.get_token("_t", 2)?,
            )
        } else {
            Vector3D::zero()
        };
        let rotation = attributes
            .get_optional_token::<u8>("_r", 0)?
            .map_or(Rotation::IDENTITY, Rotation);
        Ok(Self {
            attributes,
            translation,
            rotation,
        })
    }
}

/// Payload of a transform node (`nTRN`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct Transform {
    /// Node attributes, such as `_name` and `_hidden`.
    pub attributes: Dictionary,
    /// Layer the node belongs to.
    pub layer_id: i32,
    /// Animation frames; only the first is used for materialization.
    pub frames: Vec<Frame>,
}

impl Transform {
    /// The `_name` attribute, or the empty string.
    pub fn name(&self) -> &str {
        self.attributes.get("_name").unwrap_or("")
    }
}

/// Payload of a group node (`nGRP`). The children are stored on the [`SceneNode`](crate::SceneNode).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct Group {
    /// Node attributes.
    pub attributes: Dictionary,
}

/// Payload of a shape node (`nSHP`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct Shape {
    /// Node attributes.
    pub attributes: Dictionary,
    /// Models displayed by this shape.
    pub models: Vec<ModelReference>,
}

/// Reference from a shape node to a model.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ModelReference {
    /// Position of the model in the file's `SIZE`/`XYZI` sequence. Not validated.
    pub model_index: i32,
    /// Reference attributes (e.g. `_f`, the animation frame).
    pub attributes: Dictionary,
}

/// A material (`MATL`) entry. Stored, not interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Material {
    /// Palette index the material applies to.
    pub id: i32,
    #[allow(missing_docs)]
    pub attributes: Dictionary,
}

/// Render settings (`rOBJ`). Stored, not interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct RenderObject {
    #[allow(missing_docs)]
    pub attributes: Dictionary,
}

/// A camera (`rCAM`). Stored, not interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Camera {
    #[allow(missing_docs)]
    pub id: i32,
    #[allow(missing_docs)]
    pub attributes: Dictionary,
}

/// A layer (`LAYR`). Stored, not interpreted.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Layer {
    #[allow(missing_docs)]
    pub id: i32,
    /// Layer attributes, such as `_name` and `_hidden`.
    pub attributes: Dictionary,
}

/// Names of palette color ranges (`NOTE`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct Note {
    #[allow(missing_docs)]
    pub names: Vec<String>,
}

// -------------------------------------------------------------------------------------------------

/// The decoded content of one chunk.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Record {
    /// `SIZE`
    Size(ModelSize),
    /// `XYZI`
    Model(Model),
    /// `RGBA`
    Palette(Box<Palette>),
    /// `nTRN`, which always has exactly one child.
    Transform {
        /// ID of this node.
        id: NodeId,
        /// ID of the single child node.
        child: NodeId,
        #[allow(missing_docs)]
        transform: Transform,
    },
    /// `nGRP`
    Group {
        /// ID of this node.
        id: NodeId,
        /// IDs of the child nodes.
        children: Vec<NodeId>,
        #[allow(missing_docs)]
        group: Group,
    },
    /// `nSHP`, which has no children.
    Shape {
        /// ID of this node.
        id: NodeId,
        #[allow(missing_docs)]
        shape: Shape,
    },
    /// `MATL`
    Material(Material),
    /// `rOBJ`
    RenderObject(RenderObject),
    /// `rCAM`
    Camera(Camera),
    /// `LAYR`
    Layer(Layer),
    /// `NOTE`
    Note(Note),
    /// The chunk's content was skipped: it is an `IMAP`, an unknown kind, or a misplaced `MAIN`.
    Skipped(ChunkId),
}

impl Record {
    /// Decodes the content region of a chunk of the given kind.
    ///
    /// `content` must be exactly the chunk's content; this function does not check that all
    /// of it was consumed.
    pub fn decode(
        id: ChunkId,
        kind: ChunkKind,
        content: &mut ByteReader<'_>,
    ) -> Result<Self, DecodeError> {
        Ok(match kind {
            ChunkKind::Size => Record::Size(decode_size(content)?),
            ChunkKind::Voxels => Record::Model(decode_model(content)?),
            ChunkKind::Palette => Record::Palette(Box::new(Palette::read(content)?)),
            ChunkKind::Transform => decode_transform(content)?,
            ChunkKind::Group => decode_group(content)?,
            ChunkKind::Shape => decode_shape(content)?,
            ChunkKind::Material => Record::Material(Material {
                id: content.read_i32()?,
                attributes: Dictionary::read(content)?,
            }),
            ChunkKind::RenderObject => Record::RenderObject(RenderObject {
                attributes: Dictionary::read(content)?,
            }),
            ChunkKind::Camera => Record::Camera(Camera {
                id: content.read_i32()?,
                attributes: Dictionary::read(content)?,
            }),
            ChunkKind::Layer => Record::Layer(decode_layer(content)?),
            ChunkKind::Note => Record::Note(decode_note(content)?),
            ChunkKind::Main | ChunkKind::IndexMap | ChunkKind::Unknown(_) => {
                content.read_bytes(content.remaining())?;
                Record::Skipped(id)
            }
        })
    }
}

fn decode_size(r: &mut ByteReader<'_>) -> Result<ModelSize, DecodeError> {
    Ok(Size3D::new(r.read_i32()?, r.read_i32()?, r.read_i32()?))
}

fn decode_model(r: &mut ByteReader<'_>) -> Result<Model, DecodeError> {
    let count = r.read_length()?;
    let mut voxels = Vec::with_capacity(r.capacity_hint(count, 4));
    for _ in 0..count {
        let [x, y, z, index] = r.read_array()?;
        voxels.push(Voxel { x, y, z, index });
    }
    Ok(Model { voxels })
}

fn decode_transform(r: &mut ByteReader<'_>) -> Result<Record, DecodeError> {
    let id = NodeId(r.read_i32()?);
    let attributes = Dictionary::read(r)?;
    let child = NodeId(r.read_i32()?);
    let _reserved = r.read_i32()?;
    let layer_id = r.read_i32()?;
    let frame_count = r.read_length()?;
    let mut frames = Vec::with_capacity(r.capacity_hint(frame_count, 4));
    for _ in 0..frame_count {
        let frame = Frame::from_attributes(Dictionary::read(r)?).map_err(|source| {
            DecodeError::InvalidAttribute {
                chunk: ChunkId::TRANSFORM,
                source,
            }
        })?;
        frames.push(frame);
    }
    Ok(Record::Transform {
        id,
        child,
        transform: Transform {
            attributes,
            layer_id,
            frames,
        },
    })
}

fn decode_group(r: &mut ByteReader<'_>) -> Result<Record, DecodeError> {
    let id = NodeId(r.read_i32()?);
    let attributes = Dictionary::read(r)?;
    let child_count = r.read_length()?;
    let mut children = Vec::with_capacity(r.capacity_hint(child_count, 4));
    for _ in 0..child_count {
        children.push(NodeId(r.read_i32()?));
    }
    Ok(Record::Group {
        id,
        children,
        group: Group { attributes },
    })
}

fn decode_shape(r: &mut ByteReader<'_>) -> Result<Record, DecodeError> {
    let id = NodeId(r.read_i32()?);
    let attributes = Dictionary::read(r)?;
    let model_count = r.read_length()?;
    let mut models = Vec::with_capacity(r.capacity_hint(model_count, 8));
    for _ in 0..model_count {
        models.push(ModelReference {
            model_index: r.read_i32()?,
            attributes: Dictionary::read(r)?,
        });
    }
    Ok(Record::Shape {
        id,
        shape: Shape { attributes, models },
    })
}

fn decode_layer(r: &mut ByteReader<'_>) -> Result<Layer, DecodeError> {
    let id = r.read_i32()?;
    let attributes = Dictionary::read(r)?;
    let _reserved = r.read_i32()?;
    Ok(Layer { id, attributes })
}

fn decode_note(r: &mut ByteReader<'_>) -> Result<Note, DecodeError> {
    let count = r.read_length()?;
    let mut names = Vec::with_capacity(r.capacity_hint(count, 4));
    for _ in 0..count {
        names.push(r.read_string()?);
    }
    Ok(Note { names })
}
