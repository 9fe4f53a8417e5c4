//! Placement of a frame on the display surface.

use netpath_core::{Error, Result, Viewport, VisualizationFrame};
use serde::{Deserialize, Serialize};

/// How the raster is placed. Only full-bleed is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    FullBleed,
}

/// Layout metadata: the image covers the whole viewport, no margins, no axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub viewport: Viewport,
    pub placement: Placement,
    pub margin: u32,
    pub show_axes: bool,
}

impl Layout {
    pub fn full_bleed(viewport: Viewport) -> Self {
        Self {
            viewport,
            placement: Placement::FullBleed,
            margin: 0,
            show_axes: false,
        }
    }

    /// Same layout for a new viewport size.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Validation(format!(
                "viewport must be non-empty, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            viewport: Viewport { width, height },
            ..*self
        })
    }

    /// Horizontal and vertical factors that stretch the frame onto the viewport.
    pub fn scale(&self, frame: &VisualizationFrame) -> (f64, f64) {
        let sx = self.viewport.width as f64 / frame.width().max(1) as f64;
        let sy = self.viewport.height as f64 / frame.height().max(1) as f64;
        (sx, sy)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::full_bleed(Viewport::default())
    }
}
