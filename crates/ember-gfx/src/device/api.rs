use anyhow::Result;

/// Backbuffer size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A surface cannot be configured with a zero-area size.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The GPU API layer consumed by [`ContextAdapter`](crate::context::ContextAdapter).
///
/// Every resource is created and destroyed through this trait so the adapter can
/// sequence the object graph without knowing the backend. Destruction functions
/// take ownership; after they return the resource no longer exists.
///
/// Ownership rules the adapter guarantees to implementations:
/// - `Draw` is destroyed before the `Surface` it was created from
/// - `Surface` is unbound before the `Instance` it was bound to
/// - `Instance` is destroyed at most once
pub trait GpuApi {
    /// Top-level connection: instance, adapter, logical device.
    type Instance;

    /// Platform surface reference supplied by the windowing layer.
    type Target;

    /// Surface-bound state (swapchain / configured surface).
    type Surface;

    /// Drawing-abstraction handle built on top of an attached surface.
    type Draw;

    /// Short backend name used in log output.
    fn name(&self) -> &'static str;

    /// Creates the instance. No surface exists yet.
    fn create_instance(&self) -> Result<Self::Instance>;

    fn destroy_instance(&self, instance: Self::Instance);

    /// Binds `target` to `instance` and sizes the surface to `size`.
    fn bind_surface(
        &self,
        instance: &Self::Instance,
        target: Self::Target,
        size: SurfaceSize,
    ) -> Result<Self::Surface>;

    fn unbind_surface(&self, surface: Self::Surface);

    fn create_draw_context(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
    ) -> Result<Self::Draw>;

    fn destroy_draw_context(&self, draw: Self::Draw);

    /// Re-derives surface-bound sizing.
    ///
    /// The default does nothing: backends whose surface picks up size changes on
    /// the next frame acquisition keep it.
    fn resize_surface(
        &self,
        instance: &Self::Instance,
        surface: &mut Self::Surface,
        draw: &mut Self::Draw,
        size: SurfaceSize,
    ) -> Result<()> {
        let _ = (instance, surface, draw, size);
        Ok(())
    }
}
