//! GPU API layer.
//!
//! This module is responsible for:
//! - the [`GpuApi`] contract the context adapter drives
//! - creating the wgpu Instance/Adapter/Device/Queue without a surface
//! - binding & configuring a Surface for a native window
//! - acquiring frames and mapping surface errors

mod api;
mod config;
mod error;
mod frame;
mod instance;
mod surface;
mod wgpu_api;

pub use api::{GpuApi, SurfaceSize};
pub use config::{ContextConfig, POWER_PREFERENCE_ENV};
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use instance::GpuInstance;
pub use surface::{NativeSurface, SurfaceBinding, SurfaceSource};
pub use wgpu_api::WgpuApi;
