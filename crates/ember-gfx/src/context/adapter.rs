use std::sync::Arc;
use std::thread::{self, ThreadId};

use anyhow::Context as _;

use crate::device::{GpuApi, SurfaceSize};

use super::state::AtomicState;
use super::{ContextError, ContextResult, ContextState, GraphicsContext, StateWatch};

/// Graphics-context adapter for one platform surface.
///
/// Owns, in nesting order, the GPU instance, the surface binding and the draw
/// handle. Each lives in an `Option` and is released exactly once, either by
/// the explicit shutdown calls or on drop.
pub struct ContextAdapter<A: GpuApi> {
    api: A,
    state: Arc<AtomicState>,

    instance: Option<A::Instance>,
    surface: Option<A::Surface>,
    draw: Option<A::Draw>,

    /// Latest size reported by the platform.
    backbuffer: SurfaceSize,

    /// Size the surface binding is currently configured for.
    applied: SurfaceSize,

    main_thread: Option<ThreadId>,
    render_thread: Option<ThreadId>,
}

impl<A: GpuApi> ContextAdapter<A> {
    /// Creates a `Pending` adapter. No GPU work happens until [`init_api`](Self::init_api).
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Arc::new(AtomicState::new(ContextState::Pending)),
            instance: None,
            surface: None,
            draw: None,
            backbuffer: SurfaceSize::default(),
            applied: SurfaceSize::default(),
            main_thread: None,
            render_thread: None,
        }
    }

    /// The backend this adapter drives.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// A handle other threads can poll for state changes.
    pub fn watch(&self) -> StateWatch {
        StateWatch::new(Arc::clone(&self.state))
    }

    /// Latest size passed to [`set_backbuffer_size`](Self::set_backbuffer_size).
    ///
    /// Not necessarily applied yet; see [`GraphicsContext::resize`].
    pub fn backbuffer_size(&self) -> SurfaceSize {
        self.backbuffer
    }

    /// Whether surface-bound state is currently held, in any state.
    pub fn is_surface_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Surface-bound state, for frame acquisition on the render thread.
    pub fn surface(&self) -> Option<&A::Surface> {
        self.usable_window(self.surface.as_ref())
    }

    /// Mutable surface-bound state, e.g. to recover from a lost surface.
    ///
    /// `None` unless the context is `Initialized` with a surface attached.
    pub fn surface_mut(&mut self) -> Option<&mut A::Surface> {
        if self.state.load() == ContextState::Initialized {
            self.surface.as_mut()
        } else {
            None
        }
    }

    /// Creates the GPU instance. Main thread, once per adapter.
    ///
    /// On failure no instance is retained and the adapter enters `FailedInit`.
    pub fn init_api(&mut self) -> ContextResult {
        let state = self.state.load();
        if state != ContextState::Pending || self.instance.is_some() {
            log::warn!("init_api called in state {state}; ignoring");
            return Err(ContextError::Misordered(
                "init_api may only run once, on a pending context",
            ));
        }

        self.main_thread = Some(thread::current().id());

        match self.api.create_instance() {
            Ok(instance) => {
                self.instance = Some(instance);
                log::debug!("{} instance ready", self.api.name());
                Ok(())
            }
            Err(err) => {
                log::error!("{} instance creation failed: {err:#}", self.api.name());
                self.enter(ContextState::FailedInit);
                Err(ContextError::InstanceCreation(err))
            }
        }
    }

    /// Binds `target` and builds the draw handle. Render thread.
    ///
    /// Requires a successful [`init_api`](Self::init_api). If a surface is
    /// already attached it is detached first; the instance is kept. On failure
    /// every surface-bound resource created by this call is released before
    /// returning and the adapter enters `FailedInit`.
    pub fn init_from_render_thread(
        &mut self,
        target: A::Target,
        width: u32,
        height: u32,
    ) -> ContextResult {
        let state = self.state.load();
        if state.is_terminal() {
            log::warn!("surface attachment refused: context is {state}");
            return Err(ContextError::Unusable(state));
        }

        if self.instance.is_none() {
            log::error!("surface attachment attempted before the GPU instance exists");
            self.enter(ContextState::FailedInit);
            return Err(ContextError::Misordered(
                "init_from_render_thread requires a successful init_api",
            ));
        }

        self.claim_render_thread();

        if self.surface.is_some() || self.draw.is_some() {
            log::debug!("surface already attached; re-attaching");
            self.detach_surface();
        }

        let size = SurfaceSize::new(width, height);
        match self.attach_surface(target, size) {
            Ok(()) => {
                self.backbuffer = size;
                self.applied = size;
                self.enter(ContextState::Initialized);
                log::info!("{} context initialized at {width}x{height}", self.api.name());
                Ok(())
            }
            Err(err) => {
                log::error!("{} surface attachment failed: {err:#}", self.api.name());
                self.enter(ContextState::FailedInit);
                Err(ContextError::SurfaceAttachment(err))
            }
        }
    }

    /// Replaces the attached surface, e.g. after the platform recreated its view.
    pub fn reattach(&mut self, target: A::Target, width: u32, height: u32) -> ContextResult {
        self.shutdown_from_render_thread();
        self.init_from_render_thread(target, width, height)
    }

    /// Records a new backbuffer size; [`GraphicsContext::resize`] applies it.
    pub fn set_backbuffer_size(&mut self, width: u32, height: u32) {
        self.backbuffer = SurfaceSize::new(width, height);
    }

    fn attach_surface(&mut self, target: A::Target, size: SurfaceSize) -> anyhow::Result<()> {
        anyhow::ensure!(
            !size.is_empty(),
            "unsupported backbuffer size {}x{}",
            size.width,
            size.height
        );

        let Some(instance) = self.instance.as_ref() else {
            anyhow::bail!("no GPU instance");
        };

        let surface = self
            .api
            .bind_surface(instance, target, size)
            .context("failed to bind surface")?;

        let draw = match self.api.create_draw_context(instance, &surface) {
            Ok(draw) => draw,
            Err(err) => {
                self.api.unbind_surface(surface);
                return Err(err.context("failed to create draw context"));
            }
        };

        self.surface = Some(surface);
        self.draw = Some(draw);
        Ok(())
    }

    /// Draw handle first, then the surface it was built on.
    fn detach_surface(&mut self) {
        if let Some(draw) = self.draw.take() {
            self.api.destroy_draw_context(draw);
        }
        if let Some(surface) = self.surface.take() {
            self.api.unbind_surface(surface);
        }
        self.applied = SurfaceSize::default();
    }

    fn teardown(&mut self) {
        self.detach_surface();
        if let Some(instance) = self.instance.take() {
            self.api.destroy_instance(instance);
        }
    }

    fn enter(&self, next: ContextState) {
        if let Err(current) = self.state.transition(next) {
            log::warn!("refused context transition {current} -> {next}");
        }
    }

    fn usable_window<'a, T>(&self, handle: Option<&'a T>) -> Option<&'a T> {
        match self.state.load() {
            ContextState::Initialized => handle,
            _ => None,
        }
    }

    fn claim_render_thread(&mut self) {
        let current = thread::current().id();
        if self.main_thread == Some(current) {
            log::debug!("surface attached on the main thread");
        }
        self.render_thread = Some(current);
    }

    fn check_render_thread(&self, op: &str) {
        let current = thread::current().id();
        match self.render_thread {
            Some(render) if render != current => {
                log::warn!("{op} called from {current:?}, render thread is {render:?}");
            }
            _ => {}
        }
    }
}

impl<A: GpuApi> GraphicsContext for ContextAdapter<A> {
    type ApiContext = A::Instance;
    type DrawContext = A::Draw;

    fn shutdown_from_render_thread(&mut self) {
        self.check_render_thread("shutdown_from_render_thread");
        if self.surface.is_some() || self.draw.is_some() {
            log::debug!("detaching surface");
        }
        self.detach_surface();
    }

    fn shutdown(&mut self) {
        if self.surface.is_some() || self.draw.is_some() {
            log::warn!("shutdown called with a surface attached; detaching it first");
        }
        self.teardown();

        match self.state.load() {
            ContextState::Pending | ContextState::Initialized => {
                self.enter(ContextState::Shutdown);
                log::debug!("{} context shut down", self.api.name());
            }
            ContextState::FailedInit | ContextState::Shutdown => {}
        }
    }

    fn resize(&mut self) {
        self.check_render_thread("resize");

        if self.state.load() != ContextState::Initialized {
            return;
        }

        let size = self.backbuffer;
        if size == self.applied {
            return;
        }
        if size.is_empty() {
            log::debug!("deferring resize to {}x{}", size.width, size.height);
            return;
        }

        let (Some(instance), Some(surface), Some(draw)) =
            (self.instance.as_ref(), self.surface.as_mut(), self.draw.as_mut())
        else {
            return;
        };

        match self.api.resize_surface(instance, surface, draw, size) {
            Ok(()) => self.applied = size,
            Err(err) => log::error!("resize to {}x{} failed: {err:#}", size.width, size.height),
        }
    }

    fn api_context(&self) -> Option<&A::Instance> {
        if self.state.load().is_terminal() {
            None
        } else {
            self.instance.as_ref()
        }
    }

    fn draw_context(&self) -> Option<&A::Draw> {
        self.usable_window(self.draw.as_ref())
    }

    fn state(&self) -> ContextState {
        self.state.load()
    }
}

impl<A: GpuApi> Drop for ContextAdapter<A> {
    fn drop(&mut self) {
        if self.instance.is_some() || self.surface.is_some() {
            log::debug!("releasing {} context on drop", self.api.name());
        }
        self.teardown();
        if matches!(
            self.state.load(),
            ContextState::Pending | ContextState::Initialized
        ) {
            self.enter(ContextState::Shutdown);
        }
    }
}
