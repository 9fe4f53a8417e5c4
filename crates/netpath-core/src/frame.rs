//! Server-rendered raster frames.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use image::{ImageFormat, ImageReader};

use crate::error::{Error, Result};

/// A decoded raster image as delivered by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationFrame {
    bytes: Vec<u8>,
    format: ImageFormat,
    width: u32,
    height: u32,
    fetched_at: DateTime<Utc>,
}

impl VisualizationFrame {
    /// Decode a base64 payload (optionally wrapped as a `data:` URI) and sniff it.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let payload = match encoded.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => encoded,
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::Protocol(format!("image is not valid base64: {}", e)))?;
        Self::from_bytes(bytes)
    }

    /// Wrap raw raster bytes, reading the format and dimensions from the header.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::Protocol("image payload is empty".into()));
        }
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| Error::Protocol(format!("unreadable image: {}", e)))?;
        let format = reader
            .format()
            .ok_or_else(|| Error::Protocol("image format not recognized".into()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| Error::Protocol(format!("undecodable image: {}", e)))?;

        Ok(Self {
            bytes,
            format,
            width,
            height,
            fetched_at: Utc::now(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Same raster content, regardless of when it was fetched.
    pub fn same_content(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }

    /// `data:<mime>;base64,<payload>` form for HTML or terminal viewers.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.to_mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}
