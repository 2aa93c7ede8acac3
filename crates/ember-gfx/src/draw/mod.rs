//! Drawing-abstraction handle.
//!
//! The handle handed to renderers once a surface is attached. Command encoding
//! itself lives with the renderers; this module only carries what they need.

mod context;

pub use context::DrawContext;
