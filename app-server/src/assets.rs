//! Static images served next to the page.

use std::ffi::OsStr;
use std::path::Path;

use axum::body::Bytes;
use tracing::{info, warn};

/// Path the flag image is served under.
pub const FLAG_ROUTE: &str = "/flag";

/// An image held in memory for the lifetime of the server.
#[derive(Debug, Clone)]
pub struct Image {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

/// Read the image at `path`. A missing or unreadable file is logged and
/// yields `None`; the page is then rendered without it.
pub async fn load_image(path: &Path) -> Option<Image> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            info!("Loaded image {} ({} bytes)", path.display(), bytes.len());
            Some(Image {
                bytes: Bytes::from(bytes),
                content_type: content_type(path),
            })
        }
        Err(err) => {
            warn!("Image {} not loaded: {err}", path.display());
            None
        }
    }
}

fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
