//! Media descriptors derived from a source file — pure, no I/O.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared collection every album lives under.
pub const PICTURES_COLLECTION: &str = "Pictures";

/// Fallback when the extension is missing or unrecognised.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// What the media store is told about a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub display_name: String,
    pub mime_type: String,
    /// Collection-relative folder, e.g. `Pictures/RoadGlass`.
    pub relative_path: String,
}

impl MediaDescriptor {
    pub fn for_source(source: &Path, album: &str) -> Self {
        let display_name = display_name_for(source);
        let mime_type = mime_type_for(&display_name).to_string();
        Self {
            display_name,
            mime_type,
            relative_path: format!("{}/{}", PICTURES_COLLECTION, album),
        }
    }
}

/// Base name of `source`, or `capture_<unix-millis>.png` when blank.
pub fn display_name_for(source: &Path) -> String {
    match source.file_name().map(|n| n.to_string_lossy()) {
        Some(name) if !name.trim().is_empty() => name.into_owned(),
        _ => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            format!("capture_{}.png", millis)
        }
    }
}

/// MIME type from a file name's extension, case-insensitive.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        DEFAULT_MIME_TYPE
    }
}
