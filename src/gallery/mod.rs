//! Gallery persistence domain — public API.
//!
//! Copies an image file into the shared media gallery. Two storage
//! strategies exist (scoped media-store inserts, legacy direct writes);
//! which one runs is a configuration value, never a scattered version
//! check.

mod descriptor;
mod directory_store;
mod store;
mod strategy;

pub use descriptor::{display_name_for, mime_type_for, MediaDescriptor, DEFAULT_MIME_TYPE, PICTURES_COLLECTION};
pub use directory_store::{DirectoryMediaStore, MediaEntry};
pub use store::{MediaItemHandle, MediaStore};
pub use strategy::{LegacyStrategy, SaveStrategy, ScopedStrategy, StorageModel};

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// A successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedMedia {
    pub handle: MediaItemHandle,
    pub descriptor: MediaDescriptor,
    pub storage: StorageModel,
}

/// Why a save produced no gallery entry without failing outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// The source file does not exist. Nothing was written.
    SourceMissing,
    /// The media store returned no handle for the new entry.
    NoHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SavedMedia),
    NotFound(NotFoundReason),
}

/// Saves files into the gallery through one media store.
#[derive(Clone)]
pub struct GallerySaver {
    store: Arc<dyn MediaStore>,
    storage: StorageModel,
    album: String,
}

impl GallerySaver {
    pub fn new(store: Arc<dyn MediaStore>, storage: StorageModel, album: impl Into<String>) -> Self {
        Self {
            store,
            storage,
            album: album.into(),
        }
    }

    pub fn storage_model(&self) -> StorageModel {
        self.storage
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    /// Copy `source` into the gallery. Blocking; see [`Self::save_off_context`].
    pub fn save(&self, source: &Path) -> Result<SaveOutcome, SaveError> {
        if !source.exists() {
            log::warn!("[GALLERY] Source does not exist: {}", source.display());
            return Ok(SaveOutcome::NotFound(NotFoundReason::SourceMissing));
        }

        let start = Instant::now();
        let descriptor = MediaDescriptor::for_source(source, &self.album);
        let handle = self.strategy().persist(source, &descriptor)?;

        match handle {
            Some(handle) => {
                log::info!(
                    "[GALLERY] Saved {} as {} ({:?}, {}) in {}ms",
                    source.display(),
                    handle,
                    self.storage,
                    descriptor.mime_type,
                    start.elapsed().as_millis()
                );
                Ok(SaveOutcome::Saved(SavedMedia {
                    handle,
                    descriptor,
                    storage: self.storage,
                }))
            }
            None => Ok(SaveOutcome::NotFound(NotFoundReason::NoHandle)),
        }
    }

    /// Run [`Self::save`] on the blocking pool and hand the result back to
    /// the calling task, so large copies never stall the caller's context.
    pub async fn save_off_context(&self, source: PathBuf) -> Result<SaveOutcome, SaveError> {
        let saver = self.clone();
        tokio::task::spawn_blocking(move || saver.save(&source))
            .await
            .map_err(|e| SaveError::Interrupted(e.to_string()))?
    }

    fn strategy(&self) -> Box<dyn SaveStrategy + '_> {
        match self.storage {
            StorageModel::Scoped => Box::new(ScopedStrategy {
                store: self.store.as_ref(),
            }),
            StorageModel::Legacy => Box::new(LegacyStrategy {
                store: self.store.as_ref(),
                album: &self.album,
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Media store {operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Save task did not complete: {0}")]
    Interrupted(String),
}

impl SaveError {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        SaveError::Io { context, source }
    }

    pub(crate) fn store(operation: &'static str, source: io::Error) -> Self {
        SaveError::Store { operation, source }
    }
}
