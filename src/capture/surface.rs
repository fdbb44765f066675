//! Render surfaces and the transient leases a capture takes on them.
//!
//! The platform owns the surface. A capture only borrows it through a
//! `SurfaceLease`, which releases the platform wrapper when dropped,
//! whichever way the capture ends.

use super::pixel_copy::CopyStatus;
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

/// A live, hardware-backed drawing target hosted by a view.
pub trait RenderSurface: Send + Sync {
    /// Size as reported by the hosting view. Either side may be 0
    /// before the first layout pass.
    fn reported_size(&self) -> (u32, u32);

    /// Whether the surface currently has a backing buffer.
    fn is_available(&self) -> bool;

    /// Create a single-use wrapper the pixel copier can read from.
    fn wrap(&self) -> Result<SurfaceLease, SurfaceError>;
}

/// The readable side of a lease.
pub trait FrameSource: Send + Sync {
    /// Current contents of the surface, or the copy status explaining
    /// why there is nothing to read.
    fn read_frame(&self) -> Result<RgbaImage, CopyStatus>;
}

/// Single-use wrapper around a surface, released exactly once on drop.
pub struct SurfaceLease {
    source: Arc<dyn FrameSource>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SurfaceLease {
    pub fn new(source: Arc<dyn FrameSource>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            source,
            release: Some(Box::new(release)),
        }
    }

    /// Handle the pixel copier reads from.
    pub fn source(&self) -> Arc<dyn FrameSource> {
        Arc::clone(&self.source)
    }

    /// Release now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            log::debug!("[CAPTURE] Surface lease released");
        }
    }
}

impl fmt::Debug for SurfaceLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceLease")
            .field("released", &self.release.is_none())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Surface has been released by its host")]
    Released,

    #[error("Platform refused to wrap the surface: {0}")]
    Platform(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Blank;

    impl FrameSource for Blank {
        fn read_frame(&self) -> Result<RgbaImage, CopyStatus> {
            Err(CopyStatus::SourceNoData)
        }
    }

    #[test]
    fn lease_releases_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let lease = SurfaceLease::new(Arc::new(Blank), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let source = lease.source();
        lease.release();
        assert_eq!(released.load(Ordering::SeqCst), 1);
        // The source handle outlives the lease but the release hook does not rerun.
        drop(source);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
