//! Still frames and the feeds that produce them
//!
//! A feed hands out screenshots as `data:<mime>;base64,<payload>` URLs, the
//! same shape a browser webcam component produces. [`CapturedFrame`] decodes
//! that into the raw bytes uploaded to the classifier.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::ImageFormat;

use crate::error::{Result, SmartMealError};

/// File name the upload is sent under.
pub const UPLOAD_FILE_NAME: &str = "meal.jpg";

/// Format screenshots are encoded in.
pub const SCREENSHOT_MIME: &str = "image/jpeg";

/// Source of still frames, e.g. a live camera.
pub trait FrameSource: Send + Sync {
    /// Take one screenshot as a data URL.
    ///
    /// Returns `None` when the feed has nothing to offer yet (camera not
    /// ready, permission pending). That is not an error.
    fn screenshot(&self) -> Option<String>;
}

/// One decoded still frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// MIME type declared by the data URL
    pub mime: String,
    /// Encoded image bytes
    pub bytes: Bytes,
    /// File name used for the multipart upload
    pub file_name: String,
    /// When the frame was taken
    pub taken_at: DateTime<Utc>,
}

impl CapturedFrame {
    /// Wrap already-encoded image bytes.
    pub fn new(mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            bytes: bytes.into(),
            file_name: UPLOAD_FILE_NAME.to_string(),
            taken_at: Utc::now(),
        }
    }

    /// Decode a `data:<mime>;base64,<payload>` screenshot.
    ///
    /// # Errors
    ///
    /// Returns [`SmartMealError::Capture`] when the URL is not a base64 data
    /// URL or the payload does not decode.
    ///
    /// # Examples
    ///
    /// ```
    /// use smartmeal::capture::CapturedFrame;
    ///
    /// let frame = CapturedFrame::from_data_url("data:image/jpeg;base64,/9j/").unwrap();
    /// assert_eq!(frame.mime, "image/jpeg");
    /// assert_eq!(frame.bytes.as_ref(), &[0xff, 0xd8, 0xff]);
    /// assert_eq!(frame.file_name, "meal.jpg");
    /// ```
    pub fn from_data_url(data_url: &str) -> Result<Self> {
        let rest = data_url.strip_prefix("data:").ok_or_else(|| {
            SmartMealError::Capture("screenshot is not a data URL".to_string())
        })?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            SmartMealError::Capture("data URL has no payload separator".to_string())
        })?;
        let mime = header.strip_suffix(";base64").ok_or_else(|| {
            SmartMealError::Capture("data URL is not base64 encoded".to_string())
        })?;
        if mime.is_empty() {
            return Err(SmartMealError::Capture("data URL has no MIME type".to_string()).into());
        }

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| SmartMealError::Capture(format!("invalid base64 payload: {}", e)))?;

        Ok(Self::new(mime, bytes))
    }

    /// Encode back into a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

/// Feed backed by an image file on disk.
///
/// Each screenshot decodes the file and re-encodes it as JPEG, so any format
/// the `image` crate reads can stand in for a camera. A missing or
/// undecodable file behaves like a camera that is not ready yet.
#[derive(Debug, Clone)]
pub struct ImageFileFeed {
    path: PathBuf,
}

impl ImageFileFeed {
    /// Feed reading from `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Path the feed reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode_jpeg(&self) -> Result<Vec<u8>> {
        let img = image::open(&self.path)?;
        // JPEG has no alpha channel.
        let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());
        let mut out = std::io::Cursor::new(Vec::new());
        rgb.write_to(&mut out, ImageFormat::Jpeg)?;
        Ok(out.into_inner())
    }
}

impl FrameSource for ImageFileFeed {
    fn screenshot(&self) -> Option<String> {
        match self.encode_jpeg() {
            Ok(jpeg) => {
                tracing::debug!(
                    "Captured {} byte frame from {}",
                    jpeg.len(),
                    self.path.display()
                );
                Some(CapturedFrame::new(SCREENSHOT_MIME, jpeg).to_data_url())
            }
            Err(e) => {
                tracing::debug!("Feed {} not ready: {}", self.path.display(), e);
                None
            }
        }
    }
}

/// Feed that always returns the same screenshot (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    screenshot: Option<String>,
}

impl StaticFeed {
    /// Feed returning `screenshot` on every call.
    pub fn new(screenshot: impl Into<String>) -> Self {
        Self {
            screenshot: Some(screenshot.into()),
        }
    }

    /// Feed that never has a frame.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl FrameSource for StaticFeed {
    fn screenshot(&self) -> Option<String> {
        self.screenshot.clone()
    }
}
