use crate::device::{GpuInstance, SurfaceBinding, SurfaceSize};

/// Drawing-abstraction handle: the device, ready to accept draw work.
///
/// Only exists while a surface is attached. Renderers take the device, queue and
/// target format from here; frame acquisition stays with the surface binding.
pub struct DrawContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    size: SurfaceSize, // physical px
    adapter_info: wgpu::AdapterInfo,
}

impl DrawContext {
    pub(crate) fn new(gpu: &GpuInstance, binding: &SurfaceBinding) -> Self {
        Self {
            device: gpu.device().clone(),
            queue: gpu.queue().clone(),
            surface_format: binding.surface_format(),
            size: binding.size(),
            adapter_info: gpu.adapter_info(),
        }
    }

    #[inline]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[inline]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Format render pipelines must target to draw into the surface.
    #[inline]
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Backbuffer size in physical pixels.
    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    pub(crate) fn set_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }
}
