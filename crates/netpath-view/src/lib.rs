//! Netpath View — binds server-rendered frames to a display surface.
//!
//! The backend renders the topology; the client only places the raster
//! full-bleed on whatever surface it has (a file, an in-memory buffer) and
//! re-lays it out on resize without going back to the network.

pub mod layout;
pub mod surface;
pub mod sync;

pub use layout::{Layout, Placement};
pub use surface::{DisplaySurface, FileSurface, MemorySurface};
pub use sync::VisualizationSync;
