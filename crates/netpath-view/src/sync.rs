//! Keeps the display surface in step with the latest frame.

use netpath_core::{Result, Viewport, VisualizationFrame};
use tracing::debug;

use crate::layout::Layout;
use crate::surface::DisplaySurface;

/// Sole owner of the current frame and the surface it is shown on.
pub struct VisualizationSync {
    surface: Box<dyn DisplaySurface>,
    frame: Option<VisualizationFrame>,
    layout: Layout,
}

impl VisualizationSync {
    pub fn new(surface: Box<dyn DisplaySurface>, viewport: Viewport) -> Self {
        Self {
            surface,
            frame: None,
            layout: Layout::full_bleed(viewport),
        }
    }

    /// Bind `frame` to the surface, discarding the previously held frame.
    ///
    /// If the surface refuses the frame, the old one stays current.
    pub fn render(&mut self, frame: VisualizationFrame) -> Result<()> {
        self.surface.bind(&frame, &self.layout)?;
        debug!("Rendered {}x{} frame", frame.width(), frame.height());
        self.frame = Some(frame);
        Ok(())
    }

    /// Re-lay-out the held frame for a new viewport. Never fetches anything.
    ///
    /// The stored layout only changes once the surface has accepted it.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let layout = self.layout.resized(width, height)?;
        if let Some(frame) = &self.frame {
            self.surface.relayout(frame, &layout)?;
        }
        self.layout = layout;
        Ok(())
    }

    pub fn frame(&self) -> Option<&VisualizationFrame> {
        self.frame.as_ref()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}
