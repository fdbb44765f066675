//! In-memory pixel buffers with allocation accounting.

use image::RgbaImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Running totals of buffer allocations and releases.
///
/// Shared by every buffer a `FrameCapture` allocates; `live()` must be
/// back at zero once a capture has completed.
#[derive(Debug, Default)]
pub struct BufferStats {
    allocated: AtomicUsize,
    released: AtomicUsize,
}

impl BufferStats {
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Buffers allocated and not yet released.
    pub fn live(&self) -> usize {
        self.allocated().saturating_sub(self.released())
    }
}

/// RGBA8 destination buffer for one pixel copy. Dropping it is the release.
#[derive(Debug)]
pub struct FrameBuffer {
    pixels: RgbaImage,
    stats: Arc<BufferStats>,
}

impl FrameBuffer {
    /// Allocates a zeroed buffer. Callers coerce dimensions first; a zero
    /// side is bumped to 1 here as well so no zero-area buffer exists.
    pub fn allocate(width: u32, height: u32, stats: &Arc<BufferStats>) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        stats.allocated.fetch_add(1, Ordering::SeqCst);
        log::trace!("[CAPTURE] Allocated {}x{} RGBA buffer", width, height);
        Self {
            pixels: RgbaImage::new(width, height),
            stats: Arc::clone(stats),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.stats.released.fetch_add(1, Ordering::SeqCst);
        log::trace!(
            "[CAPTURE] Released {}x{} RGBA buffer",
            self.pixels.width(),
            self.pixels.height()
        );
    }
}
