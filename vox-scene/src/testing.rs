//! Construction of `.vox` byte streams for tests.

use crate::Dictionary;

/// Appends little-endian primitives, strings, dictionaries, and chunks to a buffer.
#[derive(Clone, Debug, Default)]
pub(crate) struct VoxWriter {
    bytes: Vec<u8>,
}

impl VoxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn u32(self, value: u32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn i32(self, value: i32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn string(self, value: &str) -> Self {
        self.i32(i32::try_from(value.len()).unwrap())
            .bytes(value.as_bytes())
    }

    pub fn dict(self, dict: &Dictionary) -> Self {
        dict.iter()
            .fold(self.i32(i32::try_from(dict.len()).unwrap()), |w, (k, v)| {
                w.string(k).string(v)
            })
    }

    /// Appends a chunk whose header sizes are computed from the given regions.
    pub fn raw_chunk(self, id: [u8; 4], content: &[u8], children: &[u8]) -> Self {
        self.bytes(&id)
            .u32(u32::try_from(content.len()).unwrap())
            .u32(u32::try_from(children.len()).unwrap())
            .bytes(content)
            .bytes(children)
    }
}

/// Builds a complete `.vox` file from a sequence of chunks inside `MAIN`.
#[derive(Clone, Debug)]
pub(crate) struct VoxFileBuilder {
    version: u32,
    children: VoxWriter,
}

impl VoxFileBuilder {
    pub fn new() -> Self {
        Self {
            version: 150,
            children: VoxWriter::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn chunk(mut self, id: [u8; 4], content: &[u8], children: &[u8]) -> Self {
        self.children = self.children.raw_chunk(id, content, children);
        self
    }

    pub fn size(self, x: i32, y: i32, z: i32) -> Self {
        let content = VoxWriter::new().i32(x).i32(y).i32(z).into_bytes();
        self.chunk(*b"SIZE", &content, &[])
    }

    pub fn xyzi(self, voxels: &[[u8; 4]]) -> Self {
        let content = voxels
            .iter()
            .fold(
                VoxWriter::new().i32(i32::try_from(voxels.len()).unwrap()),
                |w, v| w.bytes(v),
            )
            .into_bytes();
        self.chunk(*b"XYZI", &content, &[])
    }

    pub fn rgba(self, palette: &[[u8; 4]; 256]) -> Self {
        let content = palette.concat();
        self.chunk(*b"RGBA", &content, &[])
    }

    pub fn transform(
        self,
        node_id: i32,
        attributes: &Dictionary,
        child: i32,
        layer: i32,
        frames: &[Dictionary],
    ) -> Self {
        let content = frames
            .iter()
            .fold(
                VoxWriter::new()
                    .i32(node_id)
                    .dict(attributes)
                    .i32(child)
                    .i32(-1)
                    .i32(layer)
                    .i32(i32::try_from(frames.len()).unwrap()),
                |w, frame| w.dict(frame),
            )
            .into_bytes();
        self.chunk(*b"nTRN", &content, &[])
    }

    /// A transform node with no attributes, layer 0, and one frame with translation `t`.
    pub fn simple_transform(self, node_id: i32, child: i32, t: [i32; 3]) -> Self {
        let frame = Dictionary::from_iter([("_t", format!("{} {} {}", t[0], t[1], t[2]))]);
        self.transform(node_id, &Dictionary::new(), child, 0, &[frame])
    }

    pub fn group(self, node_id: i32, children: &[i32]) -> Self {
        let content = children
            .iter()
            .fold(
                VoxWriter::new()
                    .i32(node_id)
                    .dict(&Dictionary::new())
                    .i32(i32::try_from(children.len()).unwrap()),
                |w, &child| w.i32(child),
            )
            .into_bytes();
        self.chunk(*b"nGRP", &content, &[])
    }

    pub fn shape(self, node_id: i32, models: &[i32]) -> Self {
        let content = models
            .iter()
            .fold(
                VoxWriter::new()
                    .i32(node_id)
                    .dict(&Dictionary::new())
                    .i32(i32::try_from(models.len()).unwrap()),
                |w, &model| w.i32(model).dict(&Dictionary::new()),
            )
            .into_bytes();
        self.chunk(*b"nSHP", &content, &[])
    }

    pub fn build(self) -> Vec<u8> {
        let children = self.children.into_bytes();
        VoxWriter::new()
            .bytes(b"VOX ")
            .u32(self.version)
            .raw_chunk(*b"MAIN", &[], &children)
            .into_bytes()
    }
}
