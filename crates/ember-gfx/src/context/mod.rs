//! Graphics-context lifecycle.
//!
//! Sequences GPU instance creation (main thread), surface attachment and
//! detachment (render thread), and teardown, and hands out the instance and
//! draw handles only while they are valid.
//!
//! Thread discipline:
//! - main thread: [`ContextAdapter::init_api`], then [`GraphicsContext::shutdown`] / drop
//! - render thread: attach, [`GraphicsContext::resize`],
//!   [`GraphicsContext::shutdown_from_render_thread`]
//!
//! The adapter is `Send` when its backend is; move it to the render thread after
//! `init_api` and get it back from the thread's `JoinHandle`.

mod adapter;
mod error;
mod graphics;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::ContextAdapter;
pub use error::{ContextError, ContextResult};
pub use graphics::GraphicsContext;
pub use state::{ContextState, StateWatch};
