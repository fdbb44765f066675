//! The two ways bytes reach the gallery.
//!
//! Which one runs is decided by `StorageModel`, once per save.

use super::descriptor::MediaDescriptor;
use super::store::{MediaItemHandle, MediaStore};
use super::SaveError;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// How the platform lets apps write to shared media collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageModel {
    /// Mediated inserts through the media store, with a pending flag.
    Scoped,
    /// Direct writes to the public pictures directory plus a media scan.
    Legacy,
}

/// A storage strategy. `Ok(None)` means the store produced no handle.
pub trait SaveStrategy {
    fn persist(
        &self,
        source: &Path,
        descriptor: &MediaDescriptor,
    ) -> Result<Option<MediaItemHandle>, SaveError>;
}

/// Insert a pending entry, fill it, then make it visible.
pub struct ScopedStrategy<'a> {
    pub store: &'a dyn MediaStore,
}

impl SaveStrategy for ScopedStrategy<'_> {
    fn persist(
        &self,
        source: &Path,
        descriptor: &MediaDescriptor,
    ) -> Result<Option<MediaItemHandle>, SaveError> {
        let Some(item) = self
            .store
            .insert_pending(descriptor)
            .map_err(|e| SaveError::store("insert", e))?
        else {
            log::warn!("[GALLERY] Media store returned no entry for {}", descriptor.display_name);
            return Ok(None);
        };

        // Until finalize succeeds the entry stays pending and hidden. A
        // failed copy leaves it that way.
        let written = self
            .store
            .open_writer(&item)
            .map_err(|e| SaveError::io("Failed to open media entry for writing", e))
            .and_then(|mut out| {
                let mut input = open_source(source)?;
                copy_stream(&mut input, &mut out)
            });
        if let Err(e) = written {
            log::warn!("[GALLERY] Copy into {} failed, entry left pending: {}", item, e);
            return Err(e);
        }

        self.store
            .finalize(&item)
            .map_err(|e| SaveError::store("finalize", e))?;
        Ok(Some(item))
    }
}

/// Copy into `<public pictures>/<album>` and register the file.
pub struct LegacyStrategy<'a> {
    pub store: &'a dyn MediaStore,
    pub album: &'a str,
}

impl SaveStrategy for LegacyStrategy<'_> {
    fn persist(
        &self,
        source: &Path,
        descriptor: &MediaDescriptor,
    ) -> Result<Option<MediaItemHandle>, SaveError> {
        let target_dir = self.store.public_pictures_dir().join(self.album);
        fs::create_dir_all(&target_dir)
            .map_err(|e| SaveError::io("Failed to create album directory", e))?;

        let mut input = open_source(source)?;
        let target = target_dir.join(&descriptor.display_name);
        // Bytes land under a hidden name first; only a complete copy takes
        // the real name, where a media scan can see it.
        let partial = target_dir.join(format!(".partial-{}", descriptor.display_name));
        let copied = File::create(&partial)
            .map_err(|e| SaveError::io("Failed to create gallery file", e))
            .and_then(|out| copy_stream(&mut input, &mut BufWriter::new(out)))
            .and_then(|copied| {
                fs::rename(&partial, &target)
                    .map(|()| copied)
                    .map_err(|e| SaveError::io("Failed to move gallery file into place", e))
            });
        let copied = match copied {
            Ok(copied) => copied,
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&partial) {
                    log::debug!("[GALLERY] No partial file to remove at {}: {}", partial.display(), cleanup);
                }
                return Err(e);
            }
        };
        log::debug!("[GALLERY] Copied {} bytes to {}", copied, target.display());

        self.store
            .register(&target, &descriptor.mime_type)
            .map_err(|e| SaveError::store("register", e))
    }
}

fn open_source(source: &Path) -> Result<BufReader<File>, SaveError> {
    File::open(source)
        .map(BufReader::new)
        .map_err(|e| SaveError::io("Failed to open source image", e))
}

/// Both streams are owned by the caller's scope and close when it ends,
/// whether or not the copy succeeded.
fn copy_stream(input: &mut dyn Read, out: &mut dyn Write) -> Result<u64, SaveError> {
    let copied = io::copy(input, out).map_err(|e| SaveError::io("Failed to copy image bytes", e))?;
    out.flush()
        .map_err(|e| SaveError::io("Failed to flush gallery file", e))?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Store that records calls and can be told to misbehave.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        pictures: PathBuf,
        decline_insert: bool,
        broken_writer: bool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl MediaStore for Recorder {
        fn insert_pending(&self, d: &MediaDescriptor) -> io::Result<Option<MediaItemHandle>> {
            self.calls.lock().unwrap().push(format!("insert {}", d.display_name));
            if self.decline_insert {
                return Ok(None);
            }
            Ok(Some(MediaItemHandle::new("media://images/1")))
        }

        fn open_writer(&self, _item: &MediaItemHandle) -> io::Result<Box<dyn Write + Send>> {
            self.calls.lock().unwrap().push("open".into());
            if self.broken_writer {
                Ok(Box::new(FailingWriter))
            } else {
                Ok(Box::new(io::sink()))
            }
        }

        fn finalize(&self, _item: &MediaItemHandle) -> io::Result<()> {
            self.calls.lock().unwrap().push("finalize".into());
            Ok(())
        }

        fn public_pictures_dir(&self) -> PathBuf {
            self.pictures.clone()
        }

        fn register(&self, path: &Path, mime: &str) -> io::Result<Option<MediaItemHandle>> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("register {} {}", path.display(), mime));
            Ok(Some(MediaItemHandle::new("media://images/7")))
        }
    }

    fn source_file(dir: &Path) -> PathBuf {
        let path = dir.join("photo.png");
        fs::write(&path, b"not really a png").unwrap();
        path
    }

    #[test]
    fn scoped_inserts_fills_then_finalizes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Recorder::default();
        let src = source_file(tmp.path());
        let d = MediaDescriptor::for_source(&src, "RoadGlass");

        let handle = ScopedStrategy { store: &store }.persist(&src, &d).unwrap();
        assert_eq!(handle.unwrap().as_str(), "media://images/1");
        assert_eq!(store.calls(), vec!["insert photo.png", "open", "finalize"]);
    }

    #[test]
    fn scoped_without_handle_skips_copy() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Recorder {
            decline_insert: true,
            ..Default::default()
        };
        let src = source_file(tmp.path());
        let d = MediaDescriptor::for_source(&src, "RoadGlass");

        assert!(ScopedStrategy { store: &store }.persist(&src, &d).unwrap().is_none());
        assert_eq!(store.calls(), vec!["insert photo.png"]);
    }

    #[test]
    fn scoped_copy_failure_never_finalizes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Recorder {
            broken_writer: true,
            ..Default::default()
        };
        let src = source_file(tmp.path());
        let d = MediaDescriptor::for_source(&src, "RoadGlass");

        let err = ScopedStrategy { store: &store }.persist(&src, &d).unwrap_err();
        assert!(matches!(err, SaveError::Io { .. }));
        assert!(!store.calls().contains(&"finalize".to_string()));
    }

    #[test]
    fn legacy_failed_copy_leaves_nothing_in_album() {
        let tmp = tempfile::tempdir().unwrap();
        let pictures = tmp.path().join("Pictures");
        let store = Recorder {
            pictures: pictures.clone(),
            ..Default::default()
        };
        // Opening a directory succeeds on Unix; reading it does not.
        let src = tmp.path().join("unreadable.png");
        fs::create_dir(&src).unwrap();
        let d = MediaDescriptor::for_source(&src, "RoadGlass");

        let err = LegacyStrategy {
            store: &store,
            album: "RoadGlass",
        }
        .persist(&src, &d)
        .unwrap_err();
        assert!(matches!(err, SaveError::Io { .. }));

        let album = pictures.join("RoadGlass");
        assert_eq!(fs::read_dir(&album).unwrap().count(), 0);
        assert!(store.calls().is_empty());
    }

    #[test]
    fn legacy_copies_into_album_and_registers() {
        let tmp = tempfile::tempdir().unwrap();
        let pictures = tmp.path().join("Pictures");
        let store = Recorder {
            pictures: pictures.clone(),
            ..Default::default()
        };
        let src = source_file(tmp.path());
        let d = MediaDescriptor::for_source(&src, "RoadGlass");

        let handle = LegacyStrategy {
            store: &store,
            album: "RoadGlass",
        }
        .persist(&src, &d)
        .unwrap();

        let target = pictures.join("RoadGlass").join("photo.png");
        assert_eq!(fs::read(&target).unwrap(), b"not really a png");
        assert_eq!(handle.unwrap().as_str(), "media://images/7");
        assert_eq!(
            store.calls(),
            vec![format!("register {} image/png", target.display())]
        );
    }
}
