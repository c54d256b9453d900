use std::io;

use crate::chunk::{ChunkId, Region};

/// Errors that may occur while decoding `.vox` data.
///
/// Any of these aborts the whole decode; no partially decoded scene is ever returned.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The data does not start with the `"VOX "` tag.
    #[error("not a MagicaVoxel .vox file (magic tag {found:?})")]
    UnexpectedMagic {
        /// The four bytes found where the tag should be.
        found: [u8; 4],
    },

    /// The file declares a format version this decoder does not understand.
    #[error("unsupported .vox format version {version}")]
    UnsupportedVersion {
        /// The version number found in the file.
        version: u32,
    },

    /// The first chunk is not the `MAIN` container.
    #[error("expected MAIN chunk but found {found}")]
    MissingMainChunk {
        /// Tag of the chunk that was found instead.
        found: ChunkId,
    },

    /// The input ended before a read could be completed.
    #[error("unexpected end of input at byte {offset}: wanted {wanted} bytes, {available} available")]
    TruncatedInput {
        /// Position, relative to the start of the region being read, of the failed read.
        offset: usize,
        /// Number of bytes requested.
        wanted: usize,
        /// Number of bytes that were left.
        available: usize,
    },

    /// A string, dictionary, or list declared a negative length.
    #[error("invalid length {length}")]
    InvalidLength {
        /// The declared length.
        length: i32,
    },

    /// A chunk's content or children did not occupy exactly the declared number of bytes.
    #[error(
        "{chunk} chunk {region} declared {declared} bytes but {consumed} bytes were consumed"
    )]
    ChunkSizeMismatch {
        /// Tag of the chunk whose region was violated.
        chunk: ChunkId,
        /// Which of the chunk's two regions was violated.
        region: Region,
        /// Size declared in the chunk header.
        declared: u32,
        /// Bytes that were, or would have needed to be, consumed.
        consumed: u64,
    },

    /// A numeric attribute value that the decoder interprets did not parse.
    #[error("invalid attribute in {chunk} chunk")]
    InvalidAttribute {
        /// Tag of the chunk containing the attribute.
        chunk: ChunkId,
        /// What was wrong with the attribute.
        #[source]
        source: AttributeError,
    },
}

/// Failure to interpret a token of a [`Dictionary`](crate::Dictionary) value.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum AttributeError {
    /// The key is absent, or its value has fewer space-separated tokens than requested.
    #[error("attribute “{key}” has no token at index {index}")]
    MissingToken {
        /// Dictionary key.
        key: String,
        /// Requested token index.
        index: usize,
    },

    /// The token exists but is not a valid number of the requested type.
    #[error("attribute “{key}” token {index} ({token:?}) is not a valid number")]
    ParseToken {
        /// Dictionary key.
        key: String,
        /// Token index.
        index: usize,
        /// The offending token text.
        token: String,
    },
}

/// Fatal errors that may be encountered while loading a `.vox` file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[error("failed to import '{source_path}'")]
pub struct ImportError {
    /// The path, as produced by [`Fileish::display_full_path()`](crate::file::Fileish),
    /// of the file being imported.
    pub source_path: String,

    #[source]
    pub(crate) detail: ImportErrorKind,
}

/// Specific reason why an import operation failed.
/// Always contained within an [`ImportError`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ImportErrorKind {
    /// An IO error occurred while reading the data.
    #[error("failed to read data")]
    Read(#[source] io::Error),

    /// The data was read but is not a valid `.vox` file.
    #[error("failed to decode the data")]
    Decode(#[source] DecodeError),
}

impl ImportError {
    /// Returns the specific reason for the failure.
    pub fn kind(&self) -> &ImportErrorKind {
        &self.detail
    }
}
