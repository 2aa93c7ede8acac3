use anyhow::Result;

use crate::draw::DrawContext;

use super::{ContextConfig, GpuApi, GpuInstance, NativeSurface, SurfaceBinding, SurfaceSize};

/// [`GpuApi`] backed by wgpu.
///
/// wgpu picks the platform backend (Metal, Vulkan, DX12, GL) from
/// [`ContextConfig::backends`].
#[derive(Debug, Clone, Default)]
pub struct WgpuApi {
    config: ContextConfig,
}

impl WgpuApi {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }
}

impl GpuApi for WgpuApi {
    type Instance = GpuInstance;
    type Target = NativeSurface;
    type Surface = SurfaceBinding;
    type Draw = DrawContext;

    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn create_instance(&self) -> Result<GpuInstance> {
        let gpu = GpuInstance::new_blocking(self.config.clone())?;

        let info = gpu.adapter_info();
        log::info!(
            "gpu instance created: {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(gpu)
    }

    fn destroy_instance(&self, instance: GpuInstance) {
        log::debug!("destroying gpu instance {}", instance.adapter_info().name);
        drop(instance);
    }

    fn bind_surface(
        &self,
        instance: &GpuInstance,
        target: NativeSurface,
        size: SurfaceSize,
    ) -> Result<SurfaceBinding> {
        SurfaceBinding::bind(instance, target, size)
    }

    fn unbind_surface(&self, surface: SurfaceBinding) {
        log::debug!("unbinding surface");
        drop(surface);
    }

    fn create_draw_context(
        &self,
        instance: &GpuInstance,
        surface: &SurfaceBinding,
    ) -> Result<DrawContext> {
        Ok(DrawContext::new(instance, surface))
    }

    fn destroy_draw_context(&self, draw: DrawContext) {
        drop(draw);
    }

    fn resize_surface(
        &self,
        _instance: &GpuInstance,
        surface: &mut SurfaceBinding,
        draw: &mut DrawContext,
        size: SurfaceSize,
    ) -> Result<()> {
        if surface.resize(size) {
            draw.set_size(size);
            log::debug!("surface reconfigured to {}x{}", size.width, size.height);
        }
        Ok(())
    }
}
