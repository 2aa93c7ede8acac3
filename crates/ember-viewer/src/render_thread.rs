use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use ember_gfx::device::SurfaceErrorAction;
use ember_gfx::{GraphicsContext, NativeSurface, SurfaceSize, WgpuContext};
use flume::{RecvTimeoutError, TryRecvError};

/// How long the loop waits for commands after a skipped frame.
const SKIP_BACKOFF: Duration = Duration::from_millis(16);

/// Messages from the main thread to the render thread.
///
/// Frames are paced by the render thread itself, so the queue only ever holds
/// control messages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderCommand {
    Resize { width: u32, height: u32 },
    Stop,
}

/// Result of drawing one frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    Skipped,
    Fatal,
}

/// Why the render loop returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    Disconnected,
    Fatal,
}

/// What the render loop draws into.
pub trait FrameTarget {
    fn resize(&mut self, width: u32, height: u32);
    fn draw_frame(&mut self) -> FrameOutcome;
}

/// Render thread owning the context while a surface is attached.
///
/// The context moves in at spawn and comes back from [`RenderThread::stop`]
/// after `shutdown_from_render_thread` has run on the render thread.
pub struct RenderThread<T = WgpuContext> {
    commands: flume::Sender<RenderCommand>,
    handle: JoinHandle<T>,
}

impl RenderThread {
    pub fn spawn(
        ctx: WgpuContext,
        surface: NativeSurface,
        size: SurfaceSize,
        clear: wgpu::Color,
    ) -> Result<Self> {
        Self::start(move |inbox| render_main(ctx, surface, size, clear, inbox))
    }
}

impl<T: Send + 'static> RenderThread<T> {
    pub fn start<F>(body: F) -> Result<Self>
    where
        F: FnOnce(flume::Receiver<RenderCommand>) -> T + Send + 'static,
    {
        let (commands, inbox) = flume::unbounded();

        let handle = thread::Builder::new()
            .name("ember-render".to_string())
            .spawn(move || body(inbox))
            .context("failed to spawn render thread")?;

        Ok(Self { commands, handle })
    }

    pub fn send(&self, cmd: RenderCommand) {
        if self.commands.send(cmd).is_err() {
            log::warn!("render thread already exited; dropping {cmd:?}");
        }
    }

    /// True once the render thread has returned, whether asked to or not.
    pub fn has_exited(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the loop and returns the context once the surface is detached.
    pub fn stop(self) -> Option<T> {
        let _ = self.commands.send(RenderCommand::Stop);
        match self.handle.join() {
            Ok(value) => Some(value),
            Err(_) => {
                log::error!("render thread panicked; context lost");
                None
            }
        }
    }
}

/// Draws frames back to back, applying queued commands between frames.
///
/// Resizes queued between two frames collapse into the latest one. A `Stop`
/// is seen before the next frame starts.
pub fn run_loop(
    inbox: &flume::Receiver<RenderCommand>,
    target: &mut impl FrameTarget,
) -> LoopExit {
    let mut pending = None;

    loop {
        loop {
            match inbox.try_recv() {
                Ok(cmd) => {
                    if let Some(exit) = apply(cmd, &mut pending) {
                        return exit;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return LoopExit::Disconnected,
            }
        }

        if let Some((width, height)) = pending.take() {
            target.resize(width, height);
        }

        match target.draw_frame() {
            FrameOutcome::Presented => {}
            FrameOutcome::Skipped => match inbox.recv_timeout(SKIP_BACKOFF) {
                Ok(cmd) => {
                    if let Some(exit) = apply(cmd, &mut pending) {
                        return exit;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return LoopExit::Disconnected,
            },
            FrameOutcome::Fatal => return LoopExit::Fatal,
        }
    }
}

fn apply(cmd: RenderCommand, pending: &mut Option<(u32, u32)>) -> Option<LoopExit> {
    match cmd {
        RenderCommand::Resize { width, height } => {
            *pending = Some((width, height));
            None
        }
        RenderCommand::Stop => Some(LoopExit::Stopped),
    }
}

fn render_main(
    mut ctx: WgpuContext,
    surface: NativeSurface,
    size: SurfaceSize,
    clear: wgpu::Color,
    inbox: flume::Receiver<RenderCommand>,
) -> WgpuContext {
    if let Err(err) = ctx.init_from_render_thread(surface, size.width, size.height) {
        log::error!("render thread could not attach the surface: {err}");
        return ctx;
    }

    if let Some(draw) = ctx.draw_context() {
        log::info!(
            "drawing on {} with {:?}",
            draw.adapter_info().name,
            draw.surface_format()
        );
    }

    let exit = run_loop(&inbox, &mut ClearTarget { ctx: &mut ctx, clear });
    match exit {
        LoopExit::Fatal => log::error!("fatal surface error; leaving render loop"),
        other => log::debug!("render loop finished: {other:?}"),
    }

    ctx.shutdown_from_render_thread();
    ctx
}

struct ClearTarget<'a> {
    ctx: &'a mut WgpuContext,
    clear: wgpu::Color,
}

impl FrameTarget for ClearTarget<'_> {
    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.set_backbuffer_size(width, height);
        self.ctx.resize();
    }

    /// Clears the backbuffer.
    fn draw_frame(&mut self) -> FrameOutcome {
        let Some(surface) = self.ctx.surface() else {
            return FrameOutcome::Skipped;
        };

        let mut frame = match surface.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self
                    .ctx
                    .surface_mut()
                    .map_or(SurfaceErrorAction::SkipFrame, |s| s.handle_surface_error(err));
                return match action {
                    SurfaceErrorAction::Fatal => FrameOutcome::Fatal,
                    _ => FrameOutcome::Skipped,
                };
            }
        };

        // Dropped before the encoder is moved into submit().
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ember clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        surface.submit(frame);
        FrameOutcome::Presented
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    struct Recorder {
        resizes: Vec<(u32, u32)>,
        frames: usize,
        outcome: FrameOutcome,
        /// Sends `Stop` once this many frames were drawn.
        stop_after: Option<(usize, flume::Sender<RenderCommand>)>,
    }

    impl Recorder {
        fn new(outcome: FrameOutcome) -> Self {
            Self {
                resizes: Vec::new(),
                frames: 0,
                outcome,
                stop_after: None,
            }
        }
    }

    impl FrameTarget for Recorder {
        fn resize(&mut self, width: u32, height: u32) {
            self.resizes.push((width, height));
        }

        fn draw_frame(&mut self) -> FrameOutcome {
            self.frames += 1;
            if let Some((n, tx)) = &self.stop_after
                && self.frames >= *n
            {
                tx.send(RenderCommand::Stop).unwrap();
            }
            self.outcome
        }
    }

    #[test]
    fn stop_is_not_queued_behind_resizes() {
        let (tx, rx) = flume::unbounded();
        for i in 0..1000 {
            tx.send(RenderCommand::Resize { width: i, height: i }).unwrap();
        }
        tx.send(RenderCommand::Stop).unwrap();

        let mut target = Recorder::new(FrameOutcome::Presented);
        assert_eq!(run_loop(&rx, &mut target), LoopExit::Stopped);
        assert_eq!(target.frames, 0);
        assert!(target.resizes.is_empty());
    }

    #[test]
    fn queued_resizes_collapse_into_the_latest() {
        let (tx, rx) = flume::unbounded();
        tx.send(RenderCommand::Resize { width: 800, height: 600 }).unwrap();
        tx.send(RenderCommand::Resize { width: 1024, height: 768 }).unwrap();

        let mut target = Recorder::new(FrameOutcome::Presented);
        target.stop_after = Some((2, tx.clone()));

        assert_eq!(run_loop(&rx, &mut target), LoopExit::Stopped);
        assert_eq!(target.resizes, vec![(1024, 768)]);
        assert_eq!(target.frames, 2);
    }

    #[test]
    fn fatal_frame_ends_the_loop() {
        let (_tx, rx) = flume::unbounded();
        let mut target = Recorder::new(FrameOutcome::Fatal);

        assert_eq!(run_loop(&rx, &mut target), LoopExit::Fatal);
        assert_eq!(target.frames, 1);
    }

    #[test]
    fn skipped_frames_keep_polling_for_commands() {
        let (tx, rx) = flume::unbounded();
        let mut target = Recorder::new(FrameOutcome::Skipped);
        target.stop_after = Some((3, tx.clone()));

        assert_eq!(run_loop(&rx, &mut target), LoopExit::Stopped);
        assert_eq!(target.frames, 3);
    }

    #[test]
    fn dropped_sender_ends_the_loop() {
        let (tx, rx) = flume::unbounded::<RenderCommand>();
        drop(tx);

        let mut target = Recorder::new(FrameOutcome::Presented);
        assert_eq!(run_loop(&rx, &mut target), LoopExit::Disconnected);
    }

    #[test]
    fn main_thread_sees_unrequested_exit() {
        let render = RenderThread::start(|inbox| {
            let mut target = Recorder::new(FrameOutcome::Fatal);
            run_loop(&inbox, &mut target)
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !render.has_exited() {
            assert!(Instant::now() < deadline, "render thread never exited");
            thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(render.stop(), Some(LoopExit::Fatal));
    }

    #[test]
    fn stop_returns_while_frames_are_drawn() {
        let render = RenderThread::start(|inbox| {
            let mut target = Recorder::new(FrameOutcome::Presented);
            run_loop(&inbox, &mut target)
        })
        .unwrap();

        render.send(RenderCommand::Resize { width: 640, height: 480 });
        assert!(!render.has_exited());
        assert_eq!(render.stop(), Some(LoopExit::Stopped));
    }
}
