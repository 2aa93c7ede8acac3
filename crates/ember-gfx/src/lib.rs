//! Ember graphics-context adapter.
//!
//! Binds a GPU API instance to a host window surface across the main thread /
//! render thread split, and hands out the instance and draw handles only while
//! they are valid.
//!
//! - [`device`]: the [`GpuApi`](device::GpuApi) contract and its wgpu implementation
//! - [`draw`]: the drawing-abstraction handle
//! - [`context`]: the lifecycle state machine
//! - [`logging`]: logger bootstrap for binaries

pub mod context;
pub mod device;
pub mod draw;
pub mod logging;

pub use context::{ContextAdapter, ContextError, ContextState, GraphicsContext, StateWatch};
pub use device::{ContextConfig, GpuApi, NativeSurface, SurfaceSize, WgpuApi};

/// Adapter driving a wgpu-backed surface.
pub type WgpuContext = ContextAdapter<WgpuApi>;
