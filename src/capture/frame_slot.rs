//! Software render surface fed by a frame producer.
//!
//! The camera pipeline (or a still-image feed) publishes each decoded
//! frame here. The view tree hosts the slot like any other surface, and
//! captures read whatever frame was published last.

use super::pixel_copy::CopyStatus;
use super::surface::{FrameSource, RenderSurface, SurfaceError, SurfaceLease};
use image::RgbaImage;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

pub struct FrameSlot {
    width: AtomicU32,
    height: AtomicU32,
    shared: Arc<SlotShared>,
}

struct SlotShared {
    frame: RwLock<Option<RgbaImage>>,
    available: AtomicBool,
    leases_acquired: AtomicUsize,
    leases_released: AtomicUsize,
}

impl FrameSlot {
    /// A slot laid out at `width`x`height`, with no frame yet.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: AtomicU32::new(width),
            height: AtomicU32::new(height),
            shared: Arc::new(SlotShared {
                frame: RwLock::new(None),
                available: AtomicBool::new(true),
                leases_acquired: AtomicUsize::new(0),
                leases_released: AtomicUsize::new(0),
            }),
        }
    }

    /// Replace the current frame.
    pub fn publish(&self, frame: RgbaImage) {
        match self.shared.frame.write() {
            Ok(mut guard) => *guard = Some(frame),
            Err(poisoned) => *poisoned.into_inner() = Some(frame),
        }
    }

    /// The host view was laid out again.
    pub fn resize(&self, width: u32, height: u32) {
        self.width.store(width, Ordering::SeqCst);
        self.height.store(height, Ordering::SeqCst);
    }

    /// The host destroyed its surface. Outstanding leases read as invalid.
    pub fn detach(&self) {
        self.shared.available.store(false, Ordering::SeqCst);
    }

    pub fn reattach(&self) {
        self.shared.available.store(true, Ordering::SeqCst);
    }

    /// Leases handed out and not yet released.
    pub fn live_leases(&self) -> usize {
        self.shared
            .leases_acquired
            .load(Ordering::SeqCst)
            .saturating_sub(self.shared.leases_released.load(Ordering::SeqCst))
    }

    pub fn leases_released(&self) -> usize {
        self.shared.leases_released.load(Ordering::SeqCst)
    }
}

impl RenderSurface for FrameSlot {
    fn reported_size(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::SeqCst),
            self.height.load(Ordering::SeqCst),
        )
    }

    fn is_available(&self) -> bool {
        self.shared.available.load(Ordering::SeqCst)
    }

    fn wrap(&self) -> Result<SurfaceLease, SurfaceError> {
        if !self.is_available() {
            return Err(SurfaceError::Released);
        }
        self.shared.leases_acquired.fetch_add(1, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let source: Arc<dyn FrameSource> = Arc::new(SlotSource(Arc::clone(&self.shared)));
        Ok(SurfaceLease::new(source, move || {
            shared.leases_released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

struct SlotSource(Arc<SlotShared>);

impl FrameSource for SlotSource {
    fn read_frame(&self) -> Result<RgbaImage, CopyStatus> {
        if !self.0.available.load(Ordering::SeqCst) {
            return Err(CopyStatus::SourceInvalid);
        }
        let guard = match self.0.frame.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone().ok_or(CopyStatus::SourceNoData)
    }
}
