//! Directory-backed media store.
//!
//! Lays a shared volume out the way a phone's external storage looks:
//!   <root>/Pictures/<album>/...     gallery files
//!   <root>/.media-index.json        the media index
//!
//! Pending entries are written to a hidden `.pending-<id>-<name>` file and
//! renamed to their display name on finalize, so nothing half-written is
//! ever visible under its real name.

use super::descriptor::{MediaDescriptor, PICTURES_COLLECTION};
use super::store::{MediaItemHandle, MediaStore};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const INDEX_FILE: &str = ".media-index.json";
const HANDLE_PREFIX: &str = "media://images/";

/// One row of the media index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub id: u64,
    pub display_name: String,
    pub mime_type: String,
    pub relative_path: String,
    pub pending: bool,
    pub file: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaIndex {
    next_id: u64,
    entries: Vec<MediaEntry>,
}

pub struct DirectoryMediaStore {
    root: PathBuf,
    index: Mutex<MediaIndex>,
}

impl DirectoryMediaStore {
    /// Open (or start) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let index_path = root.join(INDEX_FILE);
        let index = if index_path.exists() {
            let raw = fs::read(&index_path)?;
            serde_json::from_slice(&raw)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
        } else {
            MediaIndex::default()
        };
        log::info!(
            "[MEDIA_STORE] Opened {} ({} entries)",
            root.display(),
            index.entries.len()
        );
        Ok(Self {
            root,
            index: Mutex::new(index),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index row for `item`, if this store issued it.
    pub fn entry(&self, item: &MediaItemHandle) -> Option<MediaEntry> {
        let id = parse_handle(item)?;
        let index = self.lock().ok()?;
        index.entries.iter().find(|e| e.id == id).cloned()
    }

    /// All index rows, pending ones included.
    pub fn entries(&self) -> Vec<MediaEntry> {
        self.lock()
            .map(|index| index.entries.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, MediaIndex>> {
        self.index
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "media index lock poisoned"))
    }

    fn persist(&self, index: &MediaIndex) -> io::Result<()> {
        let json = serde_json::to_vec_pretty(index)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::create_dir_all(&self.root)?;
        let tmp = self.root.join(format!("{}.tmp", INDEX_FILE));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.root.join(INDEX_FILE))
    }

    /// `Pictures/RoadGlass` → `<root>/Pictures/RoadGlass`, refusing escapes.
    fn collection_dir(&self, relative_path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(relative_path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("relative path must stay inside the volume: {}", relative_path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl MediaStore for DirectoryMediaStore {
    fn insert_pending(&self, descriptor: &MediaDescriptor) -> io::Result<Option<MediaItemHandle>> {
        if descriptor.display_name.contains(['/', '\\']) {
            return Ok(None);
        }
        let dir = self.collection_dir(&descriptor.relative_path)?;
        fs::create_dir_all(&dir)?;

        let mut index = self.lock()?;
        let id = index.next_id + 1;
        let file = dir.join(format!(".pending-{}-{}", id, descriptor.display_name));
        File::create(&file)?;

        index.next_id = id;
        index.entries.push(MediaEntry {
            id,
            display_name: descriptor.display_name.clone(),
            mime_type: descriptor.mime_type.clone(),
            relative_path: descriptor.relative_path.clone(),
            pending: true,
            file,
        });
        self.persist(&index)?;

        log::debug!("[MEDIA_STORE] Inserted pending entry {}", id);
        Ok(Some(handle_for(id)))
    }

    fn open_writer(&self, item: &MediaItemHandle) -> io::Result<Box<dyn Write + Send>> {
        let entry = self.entry(item).ok_or_else(|| unknown_item(item))?;
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&entry.file)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn finalize(&self, item: &MediaItemHandle) -> io::Result<()> {
        let id = parse_handle(item).ok_or_else(|| unknown_item(item))?;
        let mut index = self.lock()?;
        let pos = index
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| unknown_item(item))?;
        if !index.entries[pos].pending {
            return Ok(());
        }

        let entry = &index.entries[pos];
        let dir = entry
            .file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        let name = unique_name(&dir, &entry.display_name);
        let target = dir.join(&name);
        fs::rename(&entry.file, &target)?;

        let entry = &mut index.entries[pos];
        entry.display_name = name;
        entry.file = target;
        entry.pending = false;
        self.persist(&index)?;

        log::debug!("[MEDIA_STORE] Finalized entry {}", id);
        Ok(())
    }

    fn public_pictures_dir(&self) -> PathBuf {
        self.root.join(PICTURES_COLLECTION)
    }

    fn register(&self, path: &Path, mime_type: &str) -> io::Result<Option<MediaItemHandle>> {
        if !path.is_file() {
            return Ok(None);
        }
        let file = fs::canonicalize(path)?;
        let mut index = self.lock()?;

        // A rescan of a known file refreshes its row instead of duplicating it.
        if let Some(existing) = index.entries.iter_mut().find(|e| e.file == file) {
            existing.mime_type = mime_type.to_string();
            let id = existing.id;
            self.persist(&index)?;
            return Ok(Some(handle_for(id)));
        }

        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        let relative_path = file
            .parent()
            .and_then(|p| p.strip_prefix(&root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        let display_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let id = index.next_id + 1;
        index.next_id = id;
        index.entries.push(MediaEntry {
            id,
            display_name,
            mime_type: mime_type.to_string(),
            relative_path,
            pending: false,
            file,
        });
        self.persist(&index)?;

        log::debug!("[MEDIA_STORE] Registered {} as entry {}", path.display(), id);
        Ok(Some(handle_for(id)))
    }
}

fn handle_for(id: u64) -> MediaItemHandle {
    MediaItemHandle::new(format!("{}{}", HANDLE_PREFIX, id))
}

fn parse_handle(item: &MediaItemHandle) -> Option<u64> {
    item.as_str().strip_prefix(HANDLE_PREFIX)?.parse().ok()
}

fn unknown_item(item: &MediaItemHandle) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("unknown media item {}", item))
}

/// `photo.png`, then `photo (1).png`, `photo (2).png`, ...
fn unique_name(dir: &Path, wanted: &str) -> String {
    if !dir.join(wanted).exists() {
        return wanted.to_string();
    }
    let (stem, ext) = match wanted.rfind('.') {
        Some(dot) if dot > 0 => (&wanted[..dot], &wanted[dot..]),
        _ => (wanted, ""),
    };
    (1..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| wanted.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> MediaDescriptor {
        MediaDescriptor {
            display_name: name.to_string(),
            mime_type: "image/png".to_string(),
            relative_path: "Pictures/RoadGlass".to_string(),
        }
    }

    #[test]
    fn pending_entry_is_hidden_until_finalized() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryMediaStore::open(tmp.path()).unwrap();
        let item = store.insert_pending(&descriptor("a.png")).unwrap().unwrap();

        let album = tmp.path().join("Pictures/RoadGlass");
        assert!(!album.join("a.png").exists());
        assert!(store.entry(&item).unwrap().pending);

        {
            let mut w = store.open_writer(&item).unwrap();
            w.write_all(b"pixels").unwrap();
            w.flush().unwrap();
        }
        store.finalize(&item).unwrap();

        let entry = store.entry(&item).unwrap();
        assert!(!entry.pending);
        assert_eq!(entry.file, album.join("a.png"));
        assert_eq!(fs::read(album.join("a.png")).unwrap(), b"pixels");
    }

    #[test]
    fn clashing_names_get_suffixes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryMediaStore::open(tmp.path()).unwrap();
        for _ in 0..3 {
            let item = store.insert_pending(&descriptor("dup.png")).unwrap().unwrap();
            store.finalize(&item).unwrap();
        }
        let names: Vec<String> = store.entries().into_iter().map(|e| e.display_name).collect();
        assert_eq!(names, vec!["dup.png", "dup (1).png", "dup (2).png"]);
    }

    #[test]
    fn index_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let item = {
            let store = DirectoryMediaStore::open(tmp.path()).unwrap();
            let item = store.insert_pending(&descriptor("keep.jpg")).unwrap().unwrap();
            store.finalize(&item).unwrap();
            item
        };
        let reopened = DirectoryMediaStore::open(tmp.path()).unwrap();
        assert_eq!(reopened.entry(&item).unwrap().display_name, "keep.jpg");
        let next = reopened.insert_pending(&descriptor("next.jpg")).unwrap().unwrap();
        assert_ne!(next, item);
    }

    #[test]
    fn register_is_idempotent_per_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryMediaStore::open(tmp.path()).unwrap();
        let dir = store.public_pictures_dir().join("RoadGlass");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("old.jpg");
        fs::write(&file, b"jpeg").unwrap();

        let first = store.register(&file, "image/jpeg").unwrap().unwrap();
        let second = store.register(&file, "image/jpeg").unwrap().unwrap();
        assert_eq!(first, second);
        let entry = store.entry(&first).unwrap();
        assert_eq!(entry.relative_path, "Pictures/RoadGlass");
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn register_missing_file_yields_no_handle() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryMediaStore::open(tmp.path()).unwrap();
        assert!(store
            .register(&tmp.path().join("ghost.png"), "image/png")
            .unwrap()
            .is_none());
    }

    #[test]
    fn escaping_relative_path_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryMediaStore::open(tmp.path()).unwrap();
        let mut d = descriptor("x.png");
        d.relative_path = "../outside".to_string();
        assert!(store.insert_pending(&d).is_err());
    }

    #[test]
    fn foreign_handles_are_unknown() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DirectoryMediaStore::open(tmp.path()).unwrap();
        let foreign = MediaItemHandle::new("content://elsewhere/3");
        assert!(store.entry(&foreign).is_none());
        assert!(store.finalize(&foreign).is_err());
    }
}
