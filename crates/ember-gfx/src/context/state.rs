use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a graphics context.
///
/// `FailedInit` and `Shutdown` are terminal.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ContextState {
    /// Created; instance and/or surface not ready yet.
    Pending = 0,
    /// Instance created and a surface attached at least once.
    Initialized = 1,
    /// An initialization step failed. Handles are no longer handed out.
    FailedInit = 2,
    /// Torn down by an explicit shutdown.
    Shutdown = 3,
}

impl ContextState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::FailedInit | Self::Shutdown)
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// Staying in a non-terminal state is allowed (surface re-attachment).
    pub fn can_transition_to(self, next: ContextState) -> bool {
        use ContextState::*;

        match (self, next) {
            (Pending, Pending) | (Initialized, Initialized) => true,
            (Pending, Initialized | FailedInit | Shutdown) => true,
            (Initialized, FailedInit | Shutdown) => true,
            _ => false,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Pending,
            1 => Self::Initialized,
            2 => Self::FailedInit,
            3 => Self::Shutdown,
            _ => unreachable!("invalid context state {raw}"),
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Initialized => "initialized",
            Self::FailedInit => "failed-init",
            Self::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}

/// State cell shared between the adapter and its watchers.
///
/// Written by one thread per lifecycle phase; the release/acquire pair makes a
/// transition visible together with the resources it published.
#[derive(Debug)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn new(state: ContextState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> ContextState {
        ContextState::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` if the transition is legal.
    ///
    /// Returns the previous state, or the current one when refused.
    pub(crate) fn transition(&self, next: ContextState) -> Result<ContextState, ContextState> {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                ContextState::from_raw(raw)
                    .can_transition_to(next)
                    .then_some(next as u8)
            })
            .map(ContextState::from_raw)
            .map_err(ContextState::from_raw)
    }
}

/// Read-only view of an adapter's state, usable from any thread.
///
/// Lets the UI thread notice `FailedInit` while the adapter itself lives on the
/// render thread.
#[derive(Debug, Clone)]
pub struct StateWatch {
    state: Arc<AtomicState>,
}

impl StateWatch {
    pub(crate) fn new(state: Arc<AtomicState>) -> Self {
        Self { state }
    }

    pub fn get(&self) -> ContextState {
        self.state.load()
    }

    pub fn has_failed(&self) -> bool {
        self.get() == ContextState::FailedInit
    }
}
