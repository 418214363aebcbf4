use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::mock::config::SpawnConfig;
use crate::mock::runner::Runner;

/// A custom dispatch strategy: inspect the invocation, pick a runner or
/// decline (`None` falls back to the dispatcher's default runner).
pub type StrategyFn = dyn FnMut(&SpawnConfig) -> Option<Runner> + Send;

/// The dispatcher's single strategy slot. Empty until the first
/// `sequence()` call or an explicit `set_strategy`.
pub(crate) enum StrategySlot {
    Unset,
    Sequence(Sequence),
    Custom(Box<StrategyFn>),
}

impl fmt::Debug for StrategySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategySlot::Unset => f.write_str("StrategySlot::Unset"),
            StrategySlot::Sequence(sequence) => {
                f.debug_tuple("StrategySlot::Sequence").field(sequence).finish()
            }
            StrategySlot::Custom(_) => f.write_str("StrategySlot::Custom(..)"),
        }
    }
}

/// Built-in FIFO strategy: queued runners are consumed one per dispatch.
///
/// An empty queue declines, which makes the dispatcher fall back to its
/// default runner. The handle is cheap to clone and shared with the
/// dispatcher, so runners can be queued at any point during a test.
#[derive(Debug, Clone)]
pub struct Sequence {
    queue: Arc<Mutex<VecDeque<Runner>>>,
    verbose: bool,
}

impl Sequence {
    pub(crate) fn new(verbose: bool) -> Self {
        Sequence {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            verbose,
        }
    }

    /// Appends a runner (or a throwing runner via
    /// [`Runner::throws`](crate::mock::runner::Runner::throws)) to the tail.
    pub fn add(&self, runner: impl Into<Runner>) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(runner.into());
    }

    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn next(&self, config: &SpawnConfig) -> Option<Runner> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let runner = queue.pop_front();
        if self.verbose {
            match &runner {
                Some(_) => debug!(
                    command = %config.command,
                    remaining = queue.len(),
                    "sequence runner consumed"
                ),
                None => debug!(command = %config.command, "sequence empty, using default"),
            }
        }
        runner
    }
}
