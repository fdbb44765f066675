//! Command glue between the app shell and the native components.
//!
//! The shell sends named commands on two channels; each is routed to the
//! gallery saver or the frame capturer and answered with a typed response.
//! Every failure becomes a `MethodResponse::Error` here; nothing escapes.

use crate::capture::{panic_message, FrameCapture};
use crate::gallery::{GallerySaver, NotFoundReason, SaveOutcome};
use crate::view::Window;
use base64::Engine;
use futures::FutureExt;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

pub const GALLERY_CHANNEL: &str = "app.gallery_saver";
pub const CAMERA_CHANNEL: &str = "app.camera_capture";

/// One named command with its argument map.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// String argument by key, if present and a string.
    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// A call plus the channel it arrived on, as sent over the line protocol.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub channel: String,
    #[serde(flatten)]
    pub call: MethodCall,
}

/// Result of `saveImage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReply {
    pub success: bool,
    pub media_handle_ref: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Saved(SaveReply),
    Bytes(#[serde(serialize_with = "as_base64")] Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success { result: Payload },
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodResponse {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResponse::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[allow(clippy::ptr_arg)]
fn as_base64<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Routes shell commands to the gallery saver and the frame capturer.
pub struct Bridge {
    gallery: GallerySaver,
    capture: FrameCapture,
    window: Arc<Window>,
}

impl Bridge {
    pub fn new(gallery: GallerySaver, capture: FrameCapture, window: Arc<Window>) -> Self {
        Self {
            gallery,
            capture,
            window,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn frame_capture(&self) -> &FrameCapture {
        &self.capture
    }

    /// Answer one command.
    pub async fn handle(&self, channel: &str, call: MethodCall) -> MethodResponse {
        log::debug!("[BRIDGE] {} / {}", channel, call.method);
        match (channel, call.method.as_str()) {
            (GALLERY_CHANNEL, "saveImage") => self.save_image(&call).await,
            (CAMERA_CHANNEL, "capture") => self.capture().await,
            _ => {
                log::warn!("[BRIDGE] Not implemented: {} / {}", channel, call.method);
                MethodResponse::NotImplemented
            }
        }
    }

    /// Answer one JSON-encoded [`Envelope`] with a JSON-encoded response.
    pub async fn handle_json(&self, line: &str) -> String {
        let response = match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => self.handle(&envelope.channel, envelope.call).await,
            Err(e) => MethodResponse::error("ARG_ERROR", format!("Malformed request: {}", e)),
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","code":"EXCEPTION","message":"{}"}}"#, e)
        })
    }

    async fn save_image(&self, call: &MethodCall) -> MethodResponse {
        let path = match call.argument_str("path") {
            Some(path) if !path.trim().is_empty() => path.to_string(),
            _ => return MethodResponse::error("ARG_ERROR", "Missing 'path' argument"),
        };

        match self.gallery.save_off_context(PathBuf::from(&path)).await {
            Ok(SaveOutcome::Saved(saved)) => MethodResponse::Success {
                result: Payload::Saved(SaveReply {
                    success: true,
                    media_handle_ref: saved.handle.to_string(),
                    path,
                }),
            },
            Ok(SaveOutcome::NotFound(reason)) => {
                let message = match reason {
                    NotFoundReason::SourceMissing => "Failed to save image: source file not found",
                    NotFoundReason::NoHandle => "Failed to save image: media store returned no entry",
                };
                MethodResponse::error("SAVE_FAILED", message)
            }
            Err(e) => {
                log::error!("[BRIDGE] saveImage failed: {}", e);
                MethodResponse::error("EXCEPTION", e.to_string())
            }
        }
    }

    async fn capture(&self) -> MethodResponse {
        // Surface and encoder code runs on this task; a panic there must
        // still come back as a response.
        let outcome = AssertUnwindSafe(self.capture.capture_window(&self.window))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(encoded)) => MethodResponse::Success {
                result: Payload::Bytes(encoded.into_bytes()),
            },
            Ok(Err(e)) => MethodResponse::error(e.code(), e.to_string()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("[BRIDGE] capture panicked: {}", message);
                MethodResponse::error("EXCEPTION", message)
            }
        }
    }
}
