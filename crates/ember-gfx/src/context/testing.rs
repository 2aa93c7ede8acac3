//! In-memory `GpuApi` that records every call, with failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::device::{GpuApi, SurfaceSize};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Call {
    CreateInstance(u32),
    DestroyInstance(u32),
    Bind(u32),
    Unbind(u32),
    CreateDraw(u32),
    DestroyDraw(u32),
    Resize(u32, SurfaceSize),
}

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    next_id: AtomicU32,
    calls: Mutex<Vec<Call>>,
    fail_instance: AtomicBool,
    fail_draw: AtomicBool,
    fail_resize: AtomicBool,
}

impl Ledger {
    fn id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn fail_instance(&self) {
        self.fail_instance.store(true, Ordering::Relaxed);
    }

    pub(crate) fn fail_draw(&self) {
        self.fail_draw.store(true, Ordering::Relaxed);
    }

    pub(crate) fn fail_resize(&self) {
        self.fail_resize.store(true, Ordering::Relaxed);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(*c)).count()
    }

    pub(crate) fn live_instances(&self) -> usize {
        self.count(|c| matches!(c, Call::CreateInstance(_)))
            - self.count(|c| matches!(c, Call::DestroyInstance(_)))
    }

    pub(crate) fn live_surfaces(&self) -> usize {
        self.count(|c| matches!(c, Call::Bind(_))) - self.count(|c| matches!(c, Call::Unbind(_)))
    }

    /// Every created resource was destroyed exactly once.
    pub(crate) fn assert_balanced(&self) {
        let mut live: HashMap<u32, &'static str> = HashMap::new();
        for call in self.calls() {
            match call {
                Call::CreateInstance(id) => assert!(live.insert(id, "instance").is_none()),
                Call::Bind(id) => assert!(live.insert(id, "surface").is_none()),
                Call::CreateDraw(id) => assert!(live.insert(id, "draw").is_none()),
                Call::DestroyInstance(id) | Call::Unbind(id) | Call::DestroyDraw(id) => {
                    assert!(live.remove(&id).is_some(), "resource {id} released twice");
                }
                Call::Resize(..) => {}
            }
        }
        assert!(live.is_empty(), "leaked resources: {live:?}");
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockApi {
    pub ledger: Arc<Ledger>,
}

#[derive(Debug)]
pub(crate) struct MockInstance {
    pub id: u32,
}

#[derive(Debug)]
pub(crate) struct MockTarget {
    valid: bool,
}

impl MockTarget {
    pub(crate) fn valid() -> Self {
        Self { valid: true }
    }

    pub(crate) fn invalid() -> Self {
        Self { valid: false }
    }
}

#[derive(Debug)]
pub(crate) struct MockSurface {
    pub id: u32,
    pub size: SurfaceSize,
}

#[derive(Debug)]
pub(crate) struct MockDraw {
    pub id: u32,
    pub instance: u32,
    pub size: SurfaceSize,
}

impl GpuApi for MockApi {
    type Instance = MockInstance;
    type Target = MockTarget;
    type Surface = MockSurface;
    type Draw = MockDraw;

    fn name(&self) -> &'static str {
        "mock"
    }

    fn create_instance(&self) -> Result<MockInstance> {
        anyhow::ensure!(
            !self.ledger.fail_instance.load(Ordering::Relaxed),
            "simulated driver absence"
        );
        let id = self.ledger.id();
        self.ledger.record(Call::CreateInstance(id));
        Ok(MockInstance { id })
    }

    fn destroy_instance(&self, instance: MockInstance) {
        self.ledger.record(Call::DestroyInstance(instance.id));
    }

    fn bind_surface(
        &self,
        _instance: &MockInstance,
        target: MockTarget,
        size: SurfaceSize,
    ) -> Result<MockSurface> {
        anyhow::ensure!(target.valid, "invalid native surface");
        let id = self.ledger.id();
        self.ledger.record(Call::Bind(id));
        Ok(MockSurface { id, size })
    }

    fn unbind_surface(&self, surface: MockSurface) {
        self.ledger.record(Call::Unbind(surface.id));
    }

    fn create_draw_context(
        &self,
        instance: &MockInstance,
        surface: &MockSurface,
    ) -> Result<MockDraw> {
        anyhow::ensure!(
            !self.ledger.fail_draw.load(Ordering::Relaxed),
            "simulated draw context failure"
        );
        let id = self.ledger.id();
        self.ledger.record(Call::CreateDraw(id));
        Ok(MockDraw {
            id,
            instance: instance.id,
            size: surface.size,
        })
    }

    fn destroy_draw_context(&self, draw: MockDraw) {
        self.ledger.record(Call::DestroyDraw(draw.id));
    }

    fn resize_surface(
        &self,
        _instance: &MockInstance,
        surface: &mut MockSurface,
        draw: &mut MockDraw,
        size: SurfaceSize,
    ) -> Result<()> {
        anyhow::ensure!(
            !self.ledger.fail_resize.load(Ordering::Relaxed),
            "simulated device loss"
        );
        self.ledger.record(Call::Resize(surface.id, size));
        surface.size = size;
        draw.size = size;
        Ok(())
    }
}
