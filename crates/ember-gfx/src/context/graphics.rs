use super::ContextState;

/// Platform graphics context, as seen by the render loop and the application.
///
/// One implementation per platform variant. Creation and surface attachment are
/// variant-specific and live on the implementing type; teardown, resize and the
/// handle accessors are uniform.
pub trait GraphicsContext {
    /// Raw GPU API handle (instance/device).
    type ApiContext;

    /// Drawing-abstraction handle.
    type DrawContext;

    /// Inverse of surface attachment: drops the draw handle, then the
    /// surface-bound state. Render thread only. Never touches the API context.
    fn shutdown_from_render_thread(&mut self);

    /// Full teardown. Call after [`shutdown_from_render_thread`] has returned.
    ///
    /// [`shutdown_from_render_thread`]: GraphicsContext::shutdown_from_render_thread
    fn shutdown(&mut self);

    /// Applies the latest backbuffer size. Render thread only.
    fn resize(&mut self);

    /// `None` before creation, after shutdown, and after a failed init.
    fn api_context(&self) -> Option<&Self::ApiContext>;

    /// `None` outside the attached-surface window.
    fn draw_context(&self) -> Option<&Self::DrawContext>;

    /// Current lifecycle state.
    fn state(&self) -> ContextState;

    /// `Initialized` with a draw handle available, i.e. frames can be drawn.
    fn is_usable(&self) -> bool {
        self.state() == ContextState::Initialized && self.draw_context().is_some()
    }
}
