//! Display surface trait and implementations.
//!
//! A surface holds exactly one visual element. `bind` replaces it; `relayout`
//! re-places the element already shown without any new image data.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use netpath_core::{Result, VisualizationFrame};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::layout::Layout;

/// Something a frame can be shown on.
pub trait DisplaySurface: Send {
    /// Replace the surface's sole visual element with `frame`.
    fn bind(&mut self, frame: &VisualizationFrame, layout: &Layout) -> Result<()>;

    /// Re-place the currently bound frame for a new layout.
    fn relayout(&mut self, frame: &VisualizationFrame, layout: &Layout) -> Result<()>;
}

/// Writes the current frame to a file, replacing it atomically.
pub struct FileSurface {
    path: PathBuf,
    layout: Option<Layout>,
}

impl FileSurface {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            layout: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Layout of the frame on disk, if one has been bound.
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }
}

impl DisplaySurface for FileSurface {
    fn bind(&mut self, frame: &VisualizationFrame, layout: &Layout) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, frame.bytes())?;
        std::fs::rename(&tmp, &self.path)?;
        self.layout = Some(*layout);
        info!(
            "Frame {}x{} written to {}",
            frame.width(),
            frame.height(),
            self.path.display()
        );
        Ok(())
    }

    fn relayout(&mut self, _frame: &VisualizationFrame, layout: &Layout) -> Result<()> {
        debug!(
            "Viewport for {} now {}x{}",
            self.path.display(),
            layout.viewport.width,
            layout.viewport.height
        );
        self.layout = Some(*layout);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    frame: Option<VisualizationFrame>,
    layout: Option<Layout>,
    binds: usize,
    relayouts: usize,
}

/// In-memory surface for headless runs. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> Option<VisualizationFrame> {
        self.state.lock().frame.clone()
    }

    pub fn layout(&self) -> Option<Layout> {
        self.state.lock().layout
    }

    pub fn bind_count(&self) -> usize {
        self.state.lock().binds
    }

    pub fn relayout_count(&self) -> usize {
        self.state.lock().relayouts
    }
}

impl DisplaySurface for MemorySurface {
    fn bind(&mut self, frame: &VisualizationFrame, layout: &Layout) -> Result<()> {
        let mut state = self.state.lock();
        state.frame = Some(frame.clone());
        state.layout = Some(*layout);
        state.binds += 1;
        Ok(())
    }

    fn relayout(&mut self, _frame: &VisualizationFrame, layout: &Layout) -> Result<()> {
        let mut state = self.state.lock();
        state.layout = Some(*layout);
        state.relayouts += 1;
        Ok(())
    }
}
