//! Assembly of a whole `.vox` file into a [`VoxScene`].

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::chunk::{Chunk, ChunkId};
use crate::dict::warn_extra_attributes;
use crate::read::ByteReader;
use crate::record::{
    Camera, Group, Layer, Material, Model, ModelSize, NodeId, Note, Record, RenderObject, Shape,
    Transform,
};
use crate::{DecodeError, Palette};

/// Options for [`VoxScene::decode()`].
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[non_exhaustive]
pub struct DecodeOptions {
    /// The caller has already read and checked the `"VOX "` tag, so the input starts at the
    /// version number.
    pub magic_consumed: bool,
}

impl DecodeOptions {
    #[allow(missing_docs)]
    #[must_use]
    pub fn with_magic_consumed(mut self, magic_consumed: bool) -> Self {
        self.magic_consumed = magic_consumed;
        self
    }
}

/// A vertex of the scene graph.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct SceneNode {
    /// ID assigned by the file.
    pub id: NodeId,
    /// Which kind of node this is, and where its payload is stored.
    pub kind: NodeKind,
    /// IDs of child nodes, unvalidated.
    pub children: Vec<NodeId>,
}

/// The kind of a [`SceneNode`], with the index of its payload in the corresponding
/// [`VoxScene`] collection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_enums)]
pub enum NodeKind {
    /// Index into [`VoxScene::transforms()`].
    Transform(usize),
    /// Index into [`VoxScene::groups()`].
    Group(usize),
    /// Index into [`VoxScene::shapes()`].
    Shape(usize),
}

/// The complete decoded contents of a `.vox` file.
///
/// A `VoxScene` is only ever produced by a successful decode and is not modified afterward.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxScene {
    version: u32,
    palette: Palette,
    palette_in_file: bool,
    sizes: Vec<ModelSize>,
    models: Vec<Model>,
    nodes: Vec<SceneNode>,
    /// Position in `nodes` of the first node with each ID.
    node_index: HashMap<NodeId, usize>,
    transforms: Vec<Transform>,
    groups: Vec<Group>,
    shapes: Vec<Shape>,
    materials: Vec<Material>,
    render_objects: Vec<RenderObject>,
    cameras: Vec<Camera>,
    layers: Vec<Layer>,
    notes: Vec<Note>,
}

impl VoxScene {
    /// The tag every `.vox` file starts with.
    pub const MAGIC: [u8; 4] = *b"VOX ";

    /// The only format version this decoder accepts.
    pub const VERSION: u32 = 150;

    /// Decodes a complete `.vox` file.
    ///
    /// Either the whole file is decoded or an error is returned; no partial scene is
    /// available on failure.
    pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(bytes);

        if !options.magic_consumed {
            let found: [u8; 4] = reader.read_array()?;
            if found != Self::MAGIC {
                return Err(DecodeError::UnexpectedMagic { found });
            }
        }
        let version = reader.read_u32()?;
        if version != Self::VERSION {
            return Err(DecodeError::UnsupportedVersion { version });
        }

        let mut main = Chunk::read(&mut reader)?;
        if main.id() != ChunkId::MAIN {
            return Err(DecodeError::MissingMainChunk { found: main.id() });
        }
        if main.header().content_size > 0 {
            log::debug!(
                "ignoring {} bytes of MAIN chunk content",
                main.header().content_size
            );
        }
        main.skip_content();

        let mut scene = Self::empty(version);
        main.for_each_child(|child| scene.add_chunk(child))?;

        if !reader.is_empty() {
            log::debug!("ignoring {} bytes after MAIN chunk", reader.remaining());
        }
        scene.finish();
        Ok(scene)
    }

    fn empty(version: u32) -> Self {
        Self {
            version,
            palette: Palette::DEFAULT,
            palette_in_file: false,
            sizes: Vec::new(),
            models: Vec::new(),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            transforms: Vec::new(),
            groups: Vec::new(),
            shapes: Vec::new(),
            materials: Vec::new(),
            render_objects: Vec::new(),
            cameras: Vec::new(),
            layers: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn add_chunk(&mut self, mut chunk: Chunk<'_>) -> Result<(), DecodeError> {
        let chunk_id = chunk.id();
        let kind = chunk.kind();
        let record = chunk.decode_content(|content| Record::decode(chunk_id, kind, content))?;
        chunk.skip_children()?;

        match record {
            Record::Size(size) => self.sizes.push(size),
            Record::Model(model) => self.models.push(model),
            Record::Palette(palette) => {
                if self.palette_in_file {
                    log::warn!("file contains more than one RGBA chunk; using the last");
                }
                self.palette = *palette;
                self.palette_in_file = true;
            }
            Record::Transform {
                id,
                child,
                transform,
            } => {
                warn_extra_attributes(
                    format_args!("transform node {id}"),
                    &transform.attributes,
                    &["_name", "_hidden"],
                );
                if let Some(frame) = transform.frames.first() {
                    warn_extra_attributes(
                        format_args!("first frame of transform node {id}"),
                        &frame.attributes,
                        &["_t", "_r", "_f"],
                    );
                }
                self.add_node(id, NodeKind::Transform(self.transforms.len()), vec![child]);
                self.transforms.push(transform);
            }
            Record::Group {
                id,
                children,
                group,
            } => {
                warn_extra_attributes(
                    format_args!("group node {id}"),
                    &group.attributes,
                    &["_name", "_hidden"],
                );
                self.add_node(id, NodeKind::Group(self.groups.len()), children);
                self.groups.push(group);
            }
            Record::Shape { id, shape } => {
                warn_extra_attributes(
                    format_args!("shape node {id}"),
                    &shape.attributes,
                    &["_name", "_hidden"],
                );
                self.add_node(id, NodeKind::Shape(self.shapes.len()), Vec::new());
                self.shapes.push(shape);
            }
            Record::Material(material) => self.materials.push(material),
            Record::RenderObject(render_object) => self.render_objects.push(render_object),
            Record::Camera(camera) => self.cameras.push(camera),
            Record::Layer(layer) => self.layers.push(layer),
            Record::Note(note) => self.notes.push(note),
            Record::Skipped(_) => {
                log::debug!(
                    "skipped {chunk_id} chunk with {} bytes of content",
                    chunk.header().content_size
                );
            }
        }
        Ok(())
    }

    fn add_node(&mut self, id: NodeId, kind: NodeKind, children: Vec<NodeId>) {
        match self.node_index.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(self.nodes.len());
            }
            Entry::Occupied(_) => {
                log::warn!("duplicate scene node ID {id}; only the first will be used");
            }
        }
        self.nodes.push(SceneNode { id, kind, children });
    }

    fn finish(&mut self) {
        if self.sizes.len() != self.models.len() {
            log::warn!(
                "file has {} SIZE chunks but {} XYZI chunks; unmatched models are ignored",
                self.sizes.len(),
                self.models.len()
            );
        }
        log::info!(
            "decoded MagicaVoxel .vox format: version {}, {} models, {} scene nodes, \
            {} materials, {} layers, {} palette",
            self.version,
            self.model_count(),
            self.nodes.len(),
            self.materials.len(),
            self.layers.len(),
            if self.palette_in_file {
                "custom"
            } else {
                "default"
            },
        );
    }

    /// The format version declared by the file.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The file's palette, or [`Palette::DEFAULT`] if it had none.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Whether the palette came from an `RGBA` chunk.
    pub fn has_custom_palette(&self) -> bool {
        self.palette_in_file
    }

    /// Number of models which have both extents and voxels.
    pub fn model_count(&self) -> usize {
        self.sizes.len().min(self.models.len())
    }

    /// Looks up a model and its extents by the index used in model references.
    ///
    /// Returns [`None`] unless `index` is in range for both the `SIZE` and the `XYZI` chunks.
    pub fn model(&self, index: i32) -> Option<(ModelSize, &Model)> {
        let index = usize::try_from(index).ok()?;
        Some((*self.sizes.get(index)?, self.models.get(index)?))
    }

    /// Extents from all `SIZE` chunks, in file order.
    pub fn sizes(&self) -> &[ModelSize] {
        &self.sizes
    }

    /// Voxels from all `XYZI` chunks, in file order.
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// All scene nodes in file order, including any with duplicate IDs.
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Looks up the first node with the given ID.
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(*self.node_index.get(&id)?)
    }

    #[allow(missing_docs)]
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    #[allow(missing_docs)]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[allow(missing_docs)]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    #[allow(missing_docs)]
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[allow(missing_docs)]
    pub fn render_objects(&self) -> &[RenderObject] {
        &self.render_objects
    }

    #[allow(missing_docs)]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    #[allow(missing_docs)]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[allow(missing_docs)]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Region;
    use crate::testing::{VoxFileBuilder, VoxWriter};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn decode(bytes: &[u8]) -> Result<VoxScene, DecodeError> {
        VoxScene::decode(bytes, &DecodeOptions::default())
    }

    #[rstest]
    #[case::bad_magic(
        VoxWriter::new().bytes(b"VOXX").u32(150).into_bytes(),
        DecodeError::UnexpectedMagic { found: *b"VOXX" }
    )]
    #[case::bad_version(
        VoxFileBuilder::new().version(200).build(),
        DecodeError::UnsupportedVersion { version: 200 }
    )]
    #[case::not_main(
        VoxWriter::new().bytes(b"VOX ").u32(150).raw_chunk(*b"SIZE", &[0; 12], &[]).into_bytes(),
        DecodeError::MissingMainChunk { found: ChunkId::SIZE }
    )]
    #[case::no_chunks(
        VoxWriter::new().bytes(b"VOX ").u32(150).into_bytes(),
        DecodeError::TruncatedInput { offset: 8, wanted: 12, available: 0 }
    )]
    #[case::short_size(
        VoxFileBuilder::new().chunk(*b"SIZE", &[0; 8], &[]).build(),
        DecodeError::ChunkSizeMismatch {
            chunk: ChunkId::SIZE,
            region: Region::Content,
            declared: 8,
            consumed: 12,
        }
    )]
    #[case::long_size(
        VoxFileBuilder::new().chunk(*b"SIZE", &[0; 16], &[]).build(),
        DecodeError::ChunkSizeMismatch {
            chunk: ChunkId::SIZE,
            region: Region::Content,
            declared: 16,
            consumed: 12,
        }
    )]
    fn decode_errors(#[case] bytes: Vec<u8>, #[case] expected: DecodeError) {
        assert_eq!(decode(&bytes), Err(expected));
    }

    #[test]
    fn magic_consumed() {
        let bytes = VoxFileBuilder::new().size(1, 1, 1).xyzi(&[]).build();
        let scene =
            VoxScene::decode(&bytes[4..], &DecodeOptions::default().with_magic_consumed(true))
                .unwrap();
        assert_eq!(scene.model_count(), 1);

        // Without the flag, the version is taken as the magic.
        assert_eq!(
            decode(&bytes[4..]),
            Err(DecodeError::UnexpectedMagic {
                found: 150u32.to_le_bytes()
            })
        );
    }

    #[test]
    fn default_palette_when_absent() {
        let scene = decode(&VoxFileBuilder::new().build()).unwrap();
        assert_eq!(scene.palette(), &Palette::DEFAULT);
        assert!(!scene.has_custom_palette());
    }

    #[test]
    fn palette_from_file() {
        let mut colors = [[0; 4]; 256];
        colors[1] = [10, 20, 30, 255];
        let scene = decode(&VoxFileBuilder::new().rgba(&colors).build()).unwrap();
        assert!(scene.has_custom_palette());
        assert_eq!(scene.palette().get(1), crate::Color::new(10, 20, 30, 255));
    }

    #[test]
    fn nodes_and_payloads() {
        let bytes = VoxFileBuilder::new()
            .size(1, 1, 1)
            .xyzi(&[[0, 0, 0, 1]])
            .simple_transform(0, 1, [0, 0, 0])
            .group(1, &[2, 4])
            .simple_transform(2, 3, [1, 2, 3])
            .shape(3, &[0])
            .simple_transform(4, 5, [0, 0, 0])
            .shape(5, &[0])
            .build();
        let scene = decode(&bytes).unwrap();

        assert_eq!(scene.nodes().len(), 6);
        assert_eq!(scene.transforms().len(), 3);
        assert_eq!(scene.groups().len(), 1);
        assert_eq!(scene.shapes().len(), 2);
        assert_eq!(
            scene.node(NodeId(1)),
            Some(&SceneNode {
                id: NodeId(1),
                kind: NodeKind::Group(0),
                children: vec![NodeId(2), NodeId(4)],
            })
        );
        assert_eq!(scene.node(NodeId(5)).unwrap().kind, NodeKind::Shape(1));
        assert_eq!(scene.node(NodeId(4)).unwrap().kind, NodeKind::Transform(2));
        assert_eq!(scene.node(NodeId(6)), None);
    }

    #[test]
    fn duplicate_node_ids_first_wins() {
        let bytes = VoxFileBuilder::new()
            .group(0, &[1])
            .shape(0, &[])
            .build();
        let scene = decode(&bytes).unwrap();
        assert_eq!(scene.nodes().len(), 2);
        assert_eq!(scene.node(NodeId(0)).unwrap().kind, NodeKind::Group(0));
    }

    #[test]
    fn model_lookup_requires_both_chunks() {
        let bytes = VoxFileBuilder::new()
            .size(2, 3, 4)
            .xyzi(&[])
            .size(5, 5, 5)
            .build();
        let scene = decode(&bytes).unwrap();
        assert_eq!(scene.model_count(), 1);
        assert_eq!(
            scene.model(0).map(|(size, _)| size.to_array()),
            Some([2, 3, 4])
        );
        assert_eq!(scene.model(1), None);
        assert_eq!(scene.model(-1), None);
    }

    #[test]
    fn unknown_and_ignored_chunks_are_skipped() {
        let bytes = VoxFileBuilder::new()
            .chunk(*b"IMAP", &[7; 256], &[])
            .chunk(*b"wxyz", &[1, 2, 3], &[])
            .size(1, 1, 1)
            .build();
        let scene = decode(&bytes).unwrap();
        assert_eq!(scene.sizes().len(), 1);
    }

    #[test]
    fn children_of_leaf_chunks_are_verified() {
        let nested = VoxWriter::new().raw_chunk(*b"KID1", &[0; 4], &[]).into_bytes();
        let size = VoxWriter::new().i32(1).i32(1).i32(1).into_bytes();

        let scene = decode(&VoxFileBuilder::new().chunk(*b"SIZE", &size, &nested).build());
        assert_eq!(scene.map(|s| s.sizes().len()), Ok(1));

        let mut truncated = nested.clone();
        truncated.pop();
        assert_eq!(
            decode(&VoxFileBuilder::new().chunk(*b"SIZE", &size, &truncated).build()),
            Err(DecodeError::ChunkSizeMismatch {
                chunk: ChunkId::SIZE,
                region: Region::Children,
                declared: 15,
                consumed: 16,
            })
        );
    }

    #[test]
    fn stored_but_uninterpreted_chunks() {
        let attrs = crate::Dictionary::from_iter([("_type", "_diffuse")]);
        let bytes = VoxFileBuilder::new()
            .chunk(*b"MATL", &VoxWriter::new().i32(1).dict(&attrs).into_bytes(), &[])
            .chunk(*b"rOBJ", &VoxWriter::new().dict(&attrs).into_bytes(), &[])
            .chunk(*b"rCAM", &VoxWriter::new().i32(0).dict(&attrs).into_bytes(), &[])
            .chunk(
                *b"LAYR",
                &VoxWriter::new().i32(0).dict(&attrs).i32(-1).into_bytes(),
                &[],
            )
            .chunk(
                *b"NOTE",
                &VoxWriter::new().i32(1).string("hair").into_bytes(),
                &[],
            )
            .build();
        let scene = decode(&bytes).unwrap();
        assert_eq!(scene.materials().len(), 1);
        assert_eq!(scene.render_objects().len(), 1);
        assert_eq!(scene.cameras().len(), 1);
        assert_eq!(scene.layers().len(), 1);
        assert_eq!(scene.notes()[0].names, vec!["hair".to_owned()]);
    }
}
