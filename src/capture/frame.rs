//! Still-frame capture from a live preview surface.
//!
//! This is the orchestration layer: it sizes the buffer, leases the
//! surface, issues the asynchronous copy and waits for its single
//! completion on the caller's task. The buffer and the lease are released
//! on every exit path by ownership alone.

use super::buffer::{BufferStats, FrameBuffer};
use super::encode::{encode_jpeg, EncodeError, EncodedImage};
use super::pixel_copy::{CopyCallback, CopyStatus, PixelCopier};
use super::surface::{RenderSurface, SurfaceError, SurfaceLease};
use crate::view::Window;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, Mutex, OwnedMutexGuard};

/// Captures overlay-free frames through a platform pixel copier.
///
/// One capture runs at a time; a second caller waits for the first to
/// finish before its own copy is issued. "Finish" means the copy itself
/// reported or was dropped, not that the awaiting caller is still around.
pub struct FrameCapture {
    copier: Arc<dyn PixelCopier>,
    stats: Arc<BufferStats>,
    turn: Arc<Mutex<()>>,
}

/// What a copy in flight keeps alive: the surface lease and the capture
/// turn. Owned by the completion callback, so a caller that stops waiting
/// cannot release either while the copier still reads the surface.
struct InFlight {
    lease: SurfaceLease,
    _turn: OwnedMutexGuard<()>,
}

type Completion = (CopyStatus, FrameBuffer, InFlight);

impl FrameCapture {
    pub fn new(copier: Arc<dyn PixelCopier>) -> Self {
        Self {
            copier,
            stats: Arc::new(BufferStats::default()),
            turn: Arc::new(Mutex::new(())),
        }
    }

    /// Allocation ledger for the buffers this capturer has created.
    pub fn buffer_stats(&self) -> Arc<BufferStats> {
        Arc::clone(&self.stats)
    }

    /// Locate the camera surface in `window` and capture it.
    pub async fn capture_window(&self, window: &Window) -> Result<EncodedImage, CaptureError> {
        let surface = window.find_surface().ok_or_else(|| {
            log::warn!("[CAPTURE] No surface host in the view tree");
            CaptureError::SurfaceNotFound
        })?;
        self.capture(surface.as_ref()).await
    }

    /// Copy the surface's current contents and encode them as JPEG.
    pub async fn capture(&self, surface: &dyn RenderSurface) -> Result<EncodedImage, CaptureError> {
        let turn = Arc::clone(&self.turn).lock_owned().await;
        let start = Instant::now();

        if !surface.is_available() {
            log::warn!("[CAPTURE] Surface not available — nothing allocated");
            return Err(CaptureError::SurfaceUnavailable);
        }

        let (reported_w, reported_h) = surface.reported_size();
        let (width, height) = coerce_dimensions(reported_w, reported_h);
        let buffer = FrameBuffer::allocate(width, height, &self.stats);
        let lease = surface.wrap()?;

        let source = lease.source();
        let in_flight = InFlight { lease, _turn: turn };

        let (done_tx, done_rx) = oneshot::channel::<Completion>();
        let on_done: CopyCallback = Box::new(move |status, buffer| {
            // If the caller stopped waiting, the send hands everything back
            // and it is released here, after the copy is done.
            let _ = done_tx.send((status, buffer, in_flight));
        });

        let copier = Arc::clone(&self.copier);
        let issued = panic::catch_unwind(AssertUnwindSafe(move || {
            copier.request(source, buffer, on_done)
        }));
        match issued {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("[CAPTURE] Copy request failed: {}", e);
                return Err(CaptureError::RequestFailed(e.to_string()));
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("[CAPTURE] Copy request panicked: {}", message);
                return Err(CaptureError::RequestFailed(message));
            }
        }

        let (status, buffer, in_flight) = done_rx.await.map_err(|_| {
            log::error!("[CAPTURE] Copier dropped the completion without reporting");
            CaptureError::CopyAbandoned
        })?;

        let result = if status.is_success() {
            encode_jpeg(buffer.pixels()).map_err(CaptureError::from)
        } else {
            Err(CaptureError::CopyFailed(status))
        };

        let InFlight { lease, _turn } = in_flight;
        drop(buffer);
        lease.release();

        match &result {
            Ok(encoded) => log::info!(
                "[CAPTURE] Captured {}x{} frame in {}ms — {} bytes",
                width,
                height,
                start.elapsed().as_millis(),
                encoded.bytes().len()
            ),
            Err(e) => log::warn!("[CAPTURE] Capture failed after {}ms: {}", start.elapsed().as_millis(), e),
        }
        result
    }
}

/// Reported view sizes can be 0 before layout; buffers never are.
pub fn coerce_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width.max(1), height.max(1))
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "copier panicked".to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No camera surface found in the view tree")]
    SurfaceNotFound,

    #[error("Camera surface not available")]
    SurfaceUnavailable,

    #[error("Failed to wrap camera surface: {0}")]
    WrapFailed(#[from] SurfaceError),

    #[error("Pixel copy request failed: {0}")]
    RequestFailed(String),

    #[error("Pixel copy failed: {0}")]
    CopyFailed(CopyStatus),

    #[error("Pixel copy ended without reporting a result")]
    CopyAbandoned,

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl CaptureError {
    /// Error code reported to the shell.
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::SurfaceNotFound | CaptureError::SurfaceUnavailable => "NO_SURFACE",
            CaptureError::CopyFailed(_) | CaptureError::CopyAbandoned => "COPY_FAIL",
            CaptureError::WrapFailed(_)
            | CaptureError::RequestFailed(_)
            | CaptureError::Encode(_) => "EXCEPTION",
        }
    }
}
