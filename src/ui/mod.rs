//! Terminal screens.

pub mod error;
pub mod surface;

pub use error::{show_error, ErrorScreen};
pub use surface::{SurfaceCommand, WaveformSurface};
