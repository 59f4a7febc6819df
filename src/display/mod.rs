mod converter;
mod stats;
mod surface;

pub use converter::DisplayConverter;
pub use stats::DisplayStats;
pub use surface::{create_display, DisplaySurface, FramebufferDisplay, HeadlessDisplay};
