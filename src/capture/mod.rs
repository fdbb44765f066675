//! Camera frame capture domain — public API.
//!
//! This module owns everything between "here is a preview surface" and
//! "here are JPEG bytes": surface leases, pixel buffers, the asynchronous
//! pixel copy, and encoding. External code should only use the items
//! exported here.

mod buffer;
mod encode;
mod frame;
mod frame_slot;
mod pixel_copy;
mod surface;

pub use buffer::{BufferStats, FrameBuffer};
pub use encode::{encode_jpeg, EncodeError, EncodedImage, JPEG_QUALITY};
pub use frame::{coerce_dimensions, CaptureError, FrameCapture};
pub(crate) use frame::panic_message;
pub use frame_slot::FrameSlot;
pub use pixel_copy::{CopyCallback, CopyRequestError, CopyStatus, PixelCopier, SoftwareCopier};
pub use surface::{FrameSource, RenderSurface, SurfaceError, SurfaceLease};
