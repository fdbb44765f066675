//! RoadGlass native bridge — library root.
//!
//! Wires together:
//! - View hierarchy lookup (view/)
//! - Camera frame capture (capture/)
//! - Gallery persistence (gallery/)
//! - Command glue the app shell talks to (bridge.rs)

pub mod bridge;
pub mod capture;
pub mod config;
pub mod gallery;
pub mod view;

pub use bridge::{Bridge, MethodCall, MethodResponse, Payload, SaveReply, CAMERA_CHANNEL, GALLERY_CHANNEL};
pub use config::{BridgeConfig, PlatformCapabilities};

use capture::{FrameCapture, SoftwareCopier};
use gallery::{DirectoryMediaStore, GallerySaver};
use std::sync::Arc;
use view::Window;

/// Build a bridge over a directory-backed media store and the software
/// pixel copier, as configured.
pub fn bridge_from_config(config: &BridgeConfig, window: Arc<Window>) -> std::io::Result<Bridge> {
    let store = Arc::new(DirectoryMediaStore::open(&config.media_root)?);
    let gallery = GallerySaver::new(
        store,
        config.capabilities.storage_model(),
        config.album.clone(),
    );
    let capture = FrameCapture::new(Arc::new(SoftwareCopier::new()));

    log::info!(
        "[BRIDGE] Ready — media root {}, album {}, {:?} storage",
        config.media_root.display(),
        config.album,
        config.capabilities.storage_model()
    );
    Ok(Bridge::new(gallery, capture, window))
}
