//! The shared media index, as seen by the save strategies.

use super::descriptor::MediaDescriptor;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Identifier of a gallery entry, issued by the media store.
///
/// Never mutated once returned; the store owns the entry's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaItemHandle(String);

impl MediaItemHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform media store.
///
/// The scoped strategy uses `insert_pending` → `open_writer` → `finalize`.
/// The legacy strategy writes under `public_pictures_dir` itself and then
/// calls `register`.
pub trait MediaStore: Send + Sync {
    /// Insert an entry that stays hidden until finalized. `None` means
    /// the store declined to create one.
    fn insert_pending(&self, descriptor: &MediaDescriptor) -> io::Result<Option<MediaItemHandle>>;

    /// Writable stream over the entry's backing file.
    fn open_writer(&self, item: &MediaItemHandle) -> io::Result<Box<dyn Write + Send>>;

    /// Clear the pending flag so other consumers can see the entry.
    fn finalize(&self, item: &MediaItemHandle) -> io::Result<()>;

    /// Directory legacy writers copy into directly.
    fn public_pictures_dir(&self) -> PathBuf;

    /// Make an already-written file discoverable.
    fn register(&self, path: &Path, mime_type: &str) -> io::Result<Option<MediaItemHandle>>;
}
