//! Chunk headers, chunk kinds, and byte accounting for chunk regions.
//!
//! A chunk is a 4-byte tag, a `u32` content size, a `u32` children size, then the content
//! bytes, then the children bytes (which are themselves a sequence of chunks).

use core::fmt;

use crate::DecodeError;
use crate::read::ByteReader;

// -------------------------------------------------------------------------------------------------

/// The 4-byte tag identifying a chunk's kind, such as `MAIN` or `XYZI`.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[expect(clippy::exhaustive_structs)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    /// Container chunk which all other chunks are children of.
    pub const MAIN: Self = Self(*b"MAIN");
    /// Model extents.
    pub const SIZE: Self = Self(*b"SIZE");
    /// Model voxels.
    pub const XYZI: Self = Self(*b"XYZI");
    /// Palette.
    pub const RGBA: Self = Self(*b"RGBA");
    /// Transform scene node.
    pub const TRANSFORM: Self = Self(*b"nTRN");
    /// Group scene node.
    pub const GROUP: Self = Self(*b"nGRP");
    /// Shape scene node.
    pub const SHAPE: Self = Self(*b"nSHP");
    /// Material.
    pub const MATL: Self = Self(*b"MATL");
    /// Render settings.
    pub const ROBJ: Self = Self(*b"rOBJ");
    /// Camera.
    pub const RCAM: Self = Self(*b"rCAM");
    /// Layer.
    pub const LAYR: Self = Self(*b"LAYR");
    /// Palette index map.
    pub const IMAP: Self = Self(*b"IMAP");
    /// Palette color names.
    pub const NOTE: Self = Self(*b"NOTE");
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId(\"{self}\")")
    }
}

/// One of the two byte regions following a chunk header.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_enums)]
pub enum Region {
    /// The chunk's own payload.
    Content,
    /// The nested chunks.
    Children,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Region::Content => "content",
            Region::Children => "children",
        })
    }
}

/// Chunk kinds this library knows how to decode, plus a catch-all.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ChunkKind {
    /// `MAIN`
    Main,
    /// `SIZE`
    Size,
    /// `XYZI`
    Voxels,
    /// `RGBA`
    Palette,
    /// `nTRN`
    Transform,
    /// `nGRP`
    Group,
    /// `nSHP`
    Shape,
    /// `MATL`
    Material,
    /// `rOBJ`
    RenderObject,
    /// `rCAM`
    Camera,
    /// `LAYR`
    Layer,
    /// `IMAP`; accepted but not decoded.
    IndexMap,
    /// `NOTE`
    Note,
    /// Any other tag. Such chunks are skipped using their declared sizes.
    Unknown(ChunkId),
}

impl ChunkKind {
    /// Classifies a chunk tag.
    pub fn from_id(id: ChunkId) -> Self {
        match id {
            ChunkId::MAIN => Self::Main,
            ChunkId::SIZE => Self::Size,
            ChunkId::XYZI => Self::Voxels,
            ChunkId::RGBA => Self::Palette,
            ChunkId::TRANSFORM => Self::Transform,
            ChunkId::GROUP => Self::Group,
            ChunkId::SHAPE => Self::Shape,
            ChunkId::MATL => Self::Material,
            ChunkId::ROBJ => Self::RenderObject,
            ChunkId::RCAM => Self::Camera,
            ChunkId::LAYR => Self::Layer,
            ChunkId::IMAP => Self::IndexMap,
            ChunkId::NOTE => Self::Note,
            other => Self::Unknown(other),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// The fixed-size part of a chunk.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[expect(clippy::exhaustive_structs)]
pub struct ChunkHeader {
    /// Tag identifying the kind of chunk.
    pub id: ChunkId,
    /// Exact length in bytes of the content region.
    pub content_size: u32,
    /// Exact length in bytes of the children region.
    pub children_size: u32,
}

impl ChunkHeader {
    /// Encoded length of a header in bytes.
    pub const LEN: usize = 12;

    /// Reads the three header fields.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        // Check the whole header up front so the error reports the header as the unit wanted.
        if reader.remaining() < Self::LEN {
            return Err(DecodeError::TruncatedInput {
                offset: reader.consumed(),
                wanted: Self::LEN,
                available: reader.remaining(),
            });
        }
        Ok(Self {
            id: ChunkId(reader.read_array()?),
            content_size: reader.read_u32()?,
            children_size: reader.read_u32()?,
        })
    }

    /// Size of the entire chunk: header, content, and children.
    pub fn total_size(&self) -> u64 {
        Self::LEN as u64 + u64::from(self.content_size) + u64::from(self.children_size)
    }
}

// -------------------------------------------------------------------------------------------------

/// A chunk whose header has been read and whose two regions have been bounds-checked against
/// the enclosing input, but not yet interpreted.
#[derive(Clone, Debug)]
pub struct Chunk<'a> {
    header: ChunkHeader,
    content: ByteReader<'a>,
    children: ByteReader<'a>,
}

impl<'a> Chunk<'a> {
    /// Reads a chunk header and splits off its content and children regions.
    ///
    /// Fails with [`DecodeError::TruncatedInput`] if `reader` does not contain the whole chunk.
    pub fn read(reader: &mut ByteReader<'a>) -> Result<Self, DecodeError> {
        let header = ChunkHeader::read(reader)?;
        let content = reader.split(region_len(header.content_size))?;
        let children = reader.split(region_len(header.children_size))?;
        Ok(Self {
            header,
            content,
            children,
        })
    }

    /// Returns the header.
    pub fn header(&self) -> ChunkHeader {
        self.header
    }

    /// Returns the chunk's tag.
    pub fn id(&self) -> ChunkId {
        self.header.id
    }

    /// Classifies the chunk's tag.
    pub fn kind(&self) -> ChunkKind {
        ChunkKind::from_id(self.header.id)
    }

    /// Runs `decoder` on the content region, and checks that it consumed exactly
    /// `content_size` bytes.
    ///
    /// A decoder which tries to read past the end of the region produces
    /// [`DecodeError::ChunkSizeMismatch`], not [`DecodeError::TruncatedInput`], since the
    /// region itself was already known to be present.
    pub fn decode_content<T>(
        &mut self,
        decoder: impl FnOnce(&mut ByteReader<'a>) -> Result<T, DecodeError>,
    ) -> Result<T, DecodeError> {
        within_region(
            self.header.id,
            Region::Content,
            self.header.content_size,
            &mut self.content,
            decoder,
        )
    }

    /// Consumes the content region without interpreting it.
    pub fn skip_content(&mut self) {
        self.content = ByteReader::new(&[]);
    }

    /// Reads each child chunk in turn and passes it to `visitor`, checking that the children
    /// exactly fill the children region.
    pub fn for_each_child(
        &mut self,
        mut visitor: impl FnMut(Chunk<'a>) -> Result<(), DecodeError>,
    ) -> Result<(), DecodeError> {
        within_region(
            self.header.id,
            Region::Children,
            self.header.children_size,
            &mut self.children,
            |region| {
                while !region.is_empty() {
                    visitor(Chunk::read(region)?)?;
                }
                Ok(())
            },
        )
    }

    /// Walks the children region without interpreting any of it except for the chunk headers,
    /// which must account for every byte of the region, at every level of nesting.
    ///
    /// Nesting depth is bounded only by the input length, so this does not recurse.
    pub fn skip_children(&mut self) -> Result<(), DecodeError> {
        if self.header.children_size > 0 {
            log::debug!(
                "skipping {} bytes of children of {} chunk",
                self.header.children_size,
                self.header.id
            );
        }
        let mut stack = vec![OpenRegion {
            chunk: self.header.id,
            declared: self.header.children_size,
            reader: core::mem::replace(&mut self.children, ByteReader::new(&[])),
        }];
        while let Some(top) = stack.last_mut() {
            if top.reader.is_empty() {
                stack.pop();
                continue;
            }
            let child = Chunk::read(&mut top.reader).map_err(|error| {
                region_error(top.chunk, Region::Children, top.declared, error)
            })?;
            stack.push(OpenRegion {
                chunk: child.header.id,
                declared: child.header.children_size,
                reader: child.children,
            });
        }
        Ok(())
    }
}

/// A children region that [`Chunk::skip_children()`] has not yet finished walking.
struct OpenRegion<'a> {
    chunk: ChunkId,
    declared: u32,
    reader: ByteReader<'a>,
}

/// Runs `f` on `reader`, a region of a chunk, and converts any failure to stay within the
/// region, or to fill it, into [`DecodeError::ChunkSizeMismatch`].
fn within_region<'a, T>(
    chunk: ChunkId,
    region: Region,
    declared: u32,
    reader: &mut ByteReader<'a>,
    f: impl FnOnce(&mut ByteReader<'a>) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    match f(reader) {
        Ok(value) if reader.is_empty() => Ok(value),
        Ok(_) => Err(DecodeError::ChunkSizeMismatch {
            chunk,
            region,
            declared,
            consumed: reader.consumed() as u64,
        }),
        Err(error) => Err(region_error(chunk, region, declared, error)),
    }
}

/// Converts a failure to read within a region, whose bytes are known to be present, into
/// [`DecodeError::ChunkSizeMismatch`]. Other errors are returned unchanged.
fn region_error(chunk: ChunkId, region: Region, declared: u32, error: DecodeError) -> DecodeError {
    match error {
        DecodeError::TruncatedInput { offset, wanted, .. } => DecodeError::ChunkSizeMismatch {
            chunk,
            region,
            declared,
            consumed: offset.saturating_add(wanted) as u64,
        },
        other => other,
    }
}

fn region_len(size: u32) -> usize {
    // u32 always fits in usize on the platforms we support (at least 32 bits).
    size as usize
}
