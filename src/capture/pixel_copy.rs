//! Asynchronous pixel copy from a surface into a frame buffer.
//!
//! A copier takes ownership of the destination buffer when a request is
//! issued and hands it back through the completion callback. Whoever holds
//! the buffer when things go wrong drops it, which releases it.

use super::buffer::FrameBuffer;
use super::surface::FrameSource;
use image::imageops::{self, FilterType};
use std::fmt;
use std::sync::Arc;

/// Completion callback. Invoked at most once, from any thread.
pub type CopyCallback = Box<dyn FnOnce(CopyStatus, FrameBuffer) + Send>;

/// Result code reported by a pixel copy, matching the platform's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Success,
    Unknown,
    Timeout,
    SourceNoData,
    SourceInvalid,
    DestinationInvalid,
}

impl CopyStatus {
    pub fn code(self) -> i32 {
        match self {
            CopyStatus::Success => 0,
            CopyStatus::Unknown => 1,
            CopyStatus::Timeout => 2,
            CopyStatus::SourceNoData => 3,
            CopyStatus::SourceInvalid => 4,
            CopyStatus::DestinationInvalid => 5,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => CopyStatus::Success,
            2 => CopyStatus::Timeout,
            3 => CopyStatus::SourceNoData,
            4 => CopyStatus::SourceInvalid,
            5 => CopyStatus::DestinationInvalid,
            _ => CopyStatus::Unknown,
        }
    }

    pub fn is_success(self) -> bool {
        self == CopyStatus::Success
    }

    fn describe(self) -> &'static str {
        match self {
            CopyStatus::Success => "success",
            CopyStatus::Unknown => "unknown error",
            CopyStatus::Timeout => "timed out",
            CopyStatus::SourceNoData => "source has no data",
            CopyStatus::SourceInvalid => "source is invalid",
            CopyStatus::DestinationInvalid => "destination is invalid",
        }
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} ({})", self.code(), self.describe())
    }
}

/// The act of requesting a copy failed; no callback will follow.
#[derive(Debug, thiserror::Error)]
pub enum CopyRequestError {
    #[error("No executor available to run the copy: {0}")]
    NoExecutor(String),

    #[error("Copy request rejected: {0}")]
    Rejected(String),
}

/// Platform pixel-copy service.
pub trait PixelCopier: Send + Sync {
    /// Start copying the current contents of `source` into `dest`.
    ///
    /// Returns once the copy is queued. On `Ok`, `on_done` is invoked
    /// later with the status and the same buffer. On `Err`, `on_done` is
    /// never invoked and `dest` has already been dropped.
    fn request(
        &self,
        source: Arc<dyn FrameSource>,
        dest: FrameBuffer,
        on_done: CopyCallback,
    ) -> Result<(), CopyRequestError>;
}

/// CPU copier: reads the source frame on tokio's blocking pool and scales
/// it to the destination size, the way the platform copier fills a
/// bitmap of a different size than the surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareCopier;

impl SoftwareCopier {
    pub fn new() -> Self {
        Self
    }
}

impl PixelCopier for SoftwareCopier {
    fn request(
        &self,
        source: Arc<dyn FrameSource>,
        dest: FrameBuffer,
        on_done: CopyCallback,
    ) -> Result<(), CopyRequestError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CopyRequestError::NoExecutor(e.to_string()))?;

        runtime.spawn_blocking(move || {
            let mut dest = dest;
            let status = copy_into(source.as_ref(), &mut dest);
            on_done(status, dest);
        });
        Ok(())
    }
}

fn copy_into(source: &dyn FrameSource, dest: &mut FrameBuffer) -> CopyStatus {
    let frame = match source.read_frame() {
        Ok(frame) => frame,
        Err(status) => return status,
    };
    if frame.width() == 0 || frame.height() == 0 {
        return CopyStatus::SourceNoData;
    }

    let (width, height) = (dest.width(), dest.height());
    let target = dest.pixels_mut();
    if frame.dimensions() == (width, height) {
        target.copy_from_slice(frame.as_raw());
    } else {
        let scaled = imageops::resize(&frame, width, height, FilterType::Triangle);
        target.copy_from_slice(scaled.as_raw());
    }
    CopyStatus::Success
}
