use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use raw_window_handle::{HandleError, HasDisplayHandle, HasWindowHandle};
use wgpu::SurfaceError;

use super::{GpuFrame, GpuInstance, SurfaceErrorAction, SurfaceSize};

/// Anything that can hand out native window and display handles.
///
/// Implemented for every `raw-window-handle` source that may cross to the render
/// thread (e.g. a `winit::window::Window`).
pub trait SurfaceSource: HasWindowHandle + HasDisplayHandle + Send + Sync {}

impl<T> SurfaceSource for T where T: HasWindowHandle + HasDisplayHandle + Send + Sync {}

/// Platform surface reference supplied at attach time.
///
/// The adapter does not keep it past one attach/detach cycle: it moves into the
/// [`SurfaceBinding`] and is released when the binding is unbound.
#[derive(Clone)]
pub struct NativeSurface {
    source: Arc<dyn SurfaceSource>,
}

impl fmt::Debug for NativeSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeSurface").finish_non_exhaustive()
    }
}

impl NativeSurface {
    pub fn new<S>(source: Arc<S>) -> Self
    where
        S: SurfaceSource + 'static,
    {
        Self { source }
    }

    /// Checks that both native handles are currently available.
    ///
    /// Fails e.g. on Android between suspend and resume.
    pub fn validate(&self) -> std::result::Result<(), HandleError> {
        self.source.window_handle()?;
        self.source.display_handle()?;
        Ok(())
    }
}

/// Surface-bound state owned by the render thread.
///
/// Holds the configured surface and the device/queue clones needed to acquire
/// and submit frames without reaching back into the instance.
pub struct SurfaceBinding {
    /// Surface created from the native reference. Keeps the reference alive.
    surface: wgpu::Surface<'static>,

    device: wgpu::Device,
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Last requested drawable size in physical pixels.
    ///
    /// May be zero-area while the configuration keeps the last valid size.
    size: SurfaceSize,
}

impl SurfaceBinding {
    /// Creates and configures a surface for `target`.
    pub(crate) fn bind(
        gpu: &GpuInstance,
        target: NativeSurface,
        size: SurfaceSize,
    ) -> Result<Self> {
        anyhow::ensure!(
            !size.is_empty(),
            "unsupported backbuffer size {}x{}",
            size.width,
            size.height
        );

        target
            .validate()
            .context("native surface handles are unavailable")?;

        let surface = gpu
            .instance()
            .create_surface(target.source)
            .context("failed to create wgpu surface")?;

        anyhow::ensure!(
            gpu.adapter().is_surface_supported(&surface),
            "adapter {:?} cannot present to this surface",
            gpu.adapter_info().name
        );

        let init = gpu.config();
        let caps = surface.get_capabilities(gpu.adapter());
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = choose_alpha_mode(&caps, init.alpha_mode);
        let present_mode = choose_present_mode(&caps, init.present_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(gpu.device(), &config);

        log::info!(
            "surface bound: {}x{} {:?} {:?}",
            size.width,
            size.height,
            format,
            present_mode
        );

        Ok(Self {
            surface,
            device: gpu.device().clone(),
            queue: gpu.queue().clone(),
            config,
            size,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the last requested drawable size (physical pixels).
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn config(&self) -> &wgpu::SurfaceConfiguration {
        &self.config
    }

    /// Reconfigures the surface for `new_size`.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that case
    /// only the stored size is updated and configuration is deferred. Returns
    /// whether the surface was reconfigured.
    pub(crate) fn resize(&mut self, new_size: SurfaceSize) -> bool {
        self.size = new_size;
        if new_size.is_empty() {
            return false;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Acquires the next surface texture and creates an encoder.
    ///
    /// The returned frame owns the surface texture; [`submit`](Self::submit) presents it.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ember frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, frame: GpuFrame) {
        let GpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        let action = map_surface_error(&err);
        if action == SurfaceErrorAction::Reconfigured && !self.size.is_empty() {
            self.surface.configure(&self.device, &self.config);
        }
        log::debug!("surface error {err:?} -> {action:?}");
        action
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// FIFO is the only mode every surface must support.
pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: wgpu::PresentMode,
) -> wgpu::PresentMode {
    if caps.present_modes.contains(&requested) {
        requested
    } else {
        wgpu::PresentMode::Fifo
    }
}

pub(crate) fn map_surface_error(err: &SurfaceError) -> SurfaceErrorAction {
    match err {
        SurfaceError::Lost | SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(
        formats: Vec<wgpu::TextureFormat>,
        alpha_modes: Vec<wgpu::CompositeAlphaMode>,
        present_modes: Vec<wgpu::PresentMode>,
    ) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes,
            alpha_modes,
            ..Default::default()
        }
    }

    // ── format ────────────────────────────────────────────────────────────

    #[test]
    fn format_none_when_surface_reports_nothing() {
        let c = caps(vec![], vec![], vec![]);
        assert_eq!(choose_surface_format(&c, true), None);
    }

    #[test]
    fn format_prefers_srgb_when_asked() {
        let c = caps(
            vec![
                wgpu::TextureFormat::Bgra8Unorm,
                wgpu::TextureFormat::Rgba8UnormSrgb,
            ],
            vec![],
            vec![],
        );
        assert_eq!(
            choose_surface_format(&c, true),
            Some(wgpu::TextureFormat::Rgba8UnormSrgb)
        );
    }

    #[test]
    fn format_takes_first_without_srgb_preference() {
        let c = caps(
            vec![
                wgpu::TextureFormat::Bgra8Unorm,
                wgpu::TextureFormat::Bgra8UnormSrgb,
            ],
            vec![],
            vec![],
        );
        assert_eq!(
            choose_surface_format(&c, false),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
    }

    // ── alpha / present mode ──────────────────────────────────────────────

    #[test]
    fn alpha_mode_honours_supported_request() {
        let c = caps(
            vec![],
            vec![
                wgpu::CompositeAlphaMode::Opaque,
                wgpu::CompositeAlphaMode::PreMultiplied,
            ],
            vec![],
        );
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PreMultiplied)),
            wgpu::CompositeAlphaMode::PreMultiplied
        );
    }

    #[test]
    fn alpha_mode_falls_back_to_first_supported() {
        let c = caps(vec![], vec![wgpu::CompositeAlphaMode::Opaque], vec![]);
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::PostMultiplied)),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(
            choose_alpha_mode(&caps(vec![], vec![], vec![]), None),
            wgpu::CompositeAlphaMode::Auto
        );
    }

    #[test]
    fn present_mode_falls_back_to_fifo() {
        let c = caps(vec![], vec![], vec![wgpu::PresentMode::Fifo]);
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Mailbox),
            wgpu::PresentMode::Fifo
        );

        let c = caps(
            vec![],
            vec![],
            vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Mailbox],
        );
        assert_eq!(
            choose_present_mode(&c, wgpu::PresentMode::Mailbox),
            wgpu::PresentMode::Mailbox
        );
    }

    // ── native handles ────────────────────────────────────────────────────

    struct Detached;

    impl HasWindowHandle for Detached {
        fn window_handle(
            &self,
        ) -> std::result::Result<raw_window_handle::WindowHandle<'_>, HandleError> {
            Err(HandleError::Unavailable)
        }
    }

    impl HasDisplayHandle for Detached {
        fn display_handle(
            &self,
        ) -> std::result::Result<raw_window_handle::DisplayHandle<'_>, HandleError> {
            Err(HandleError::Unavailable)
        }
    }

    #[test]
    fn validate_rejects_unavailable_handles() {
        let target = NativeSurface::new(Arc::new(Detached));
        assert!(matches!(target.validate(), Err(HandleError::Unavailable)));
    }

    // ── surface errors ────────────────────────────────────────────────────

    #[test]
    fn surface_errors_map_to_actions() {
        assert_eq!(map_surface_error(&SurfaceError::Lost), SurfaceErrorAction::Reconfigured);
        assert_eq!(map_surface_error(&SurfaceError::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(map_surface_error(&SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
        assert_eq!(map_surface_error(&SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
    }
}
