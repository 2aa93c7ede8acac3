//! Ember viewer.
//!
//! Opens a window, creates the GPU instance on the main thread, attaches the
//! surface on a dedicated render thread and clears it every frame.

mod render_thread;
mod runtime;

use ember_gfx::logging::{LoggingConfig, init_logging};

use crate::runtime::ViewerConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());
    runtime::run(ViewerConfig::default())
}
