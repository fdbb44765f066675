//! Bridge configuration, read from the environment (and `.env`).
//!
//!   ROADGLASS_MEDIA_ROOT      volume holding `Pictures/` (default: home dir)
//!   ROADGLASS_ALBUM           gallery sub-folder (default: RoadGlass)
//!   ROADGLASS_SCOPED_STORAGE  1/true or 0/false (default: scoped)

use crate::gallery::StorageModel;
use std::path::PathBuf;

pub const DEFAULT_ALBUM: &str = "RoadGlass";

const MEDIA_ROOT_VAR: &str = "ROADGLASS_MEDIA_ROOT";
const ALBUM_VAR: &str = "ROADGLASS_ALBUM";
const SCOPED_STORAGE_VAR: &str = "ROADGLASS_SCOPED_STORAGE";

/// What the host platform supports. Read by the bridge, never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub scoped_storage: bool,
}

impl PlatformCapabilities {
    pub fn storage_model(&self) -> StorageModel {
        if self.scoped_storage {
            StorageModel::Scoped
        } else {
            StorageModel::Legacy
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            scoped_storage: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub media_root: PathBuf,
    pub album: String,
    pub capabilities: PlatformCapabilities,
}

impl BridgeConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("[CONFIG] Loaded {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let media_root = lookup(MEDIA_ROOT_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let album = lookup(ALBUM_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty() && !v.contains(['/', '\\']))
            .unwrap_or_else(|| DEFAULT_ALBUM.to_string());

        let scoped_storage = match lookup(SCOPED_STORAGE_VAR) {
            Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
                log::warn!(
                    "[CONFIG] Ignoring {}={:?} — expected 1/0/true/false",
                    SCOPED_STORAGE_VAR,
                    raw
                );
                PlatformCapabilities::default().scoped_storage
            }),
            None => PlatformCapabilities::default().scoped_storage,
        };

        Self {
            media_root,
            album,
            capabilities: PlatformCapabilities { scoped_storage },
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
