//! File system abstraction, for loading `.vox` data that does not necessarily
//! live on the file system that [`std::fs`] accesses.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::{DecodeOptions, ImportError, ImportErrorKind, VoxScene};

/// A “file” that we can load things from and which has a name,
/// without being tied to the current OS file system.
pub trait Fileish: fmt::Debug + Send + Sync {
    /// Name of the file, for display purposes such as in a summary heading.
    fn document_name(&self) -> String;

    /// Path of the file, for display purposes such as in an error, not a path that can
    /// necessarily be opened.
    fn display_full_path(&self) -> String;

    /// Obtains the file contents.
    fn read(&self) -> Result<Vec<u8>, io::Error>;
}

impl Fileish for PathBuf {
    fn document_name(&self) -> String {
        match self.file_stem() {
            Some(n) => n.to_string_lossy(),
            None => self.to_string_lossy(),
        }
        .into_owned()
    }

    fn display_full_path(&self) -> String {
        self.display().to_string()
    }

    fn read(&self) -> Result<Vec<u8>, io::Error> {
        std::fs::read(self)
    }
}

/// General-purpose implementation of [`Fileish`] for data from anywhere.
pub struct NonDiskFile<O> {
    name: String,
    opener: O,
}

impl<O> fmt::Debug for NonDiskFile<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { name, opener: _ } = self;
        f.debug_struct("NonDiskFile")
            .field("name", name)
            .finish_non_exhaustive()
    }
}

impl<O> NonDiskFile<O> {
    /// Construct a new [`NonDiskFile`] from its parts.
    pub fn from_name_and_data_source(name: String, opener: O) -> Self {
        Self { name, opener }
    }
}

impl<O> Fileish for NonDiskFile<O>
where
    O: Fn() -> Result<Vec<u8>, io::Error> + Send + Sync,
{
    fn document_name(&self) -> String {
        self.name.clone()
    }

    fn display_full_path(&self) -> String {
        self.name.clone()
    }

    fn read(&self) -> Result<Vec<u8>, io::Error> {
        (self.opener)()
    }
}

/// Reads and decodes the `.vox` file `file`.
pub fn load_from_file(
    file: &dyn Fileish,
    options: &DecodeOptions,
) -> Result<VoxScene, ImportError> {
    let bytes = file.read().map_err(|error| ImportError {
        source_path: file.display_full_path(),
        detail: ImportErrorKind::Read(error),
    })?;
    VoxScene::decode(&bytes, options).map_err(|error| ImportError {
        source_path: file.display_full_path(),
        detail: ImportErrorKind::Decode(error),
    })
}
