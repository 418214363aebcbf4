//! The dispatch engine: strategy owner, default runner, signal table and the
//! append-only call log.
//!
//! [`create`] builds an isolated dispatcher; each [`MockSpawn`] handle
//! clones share one registry, so the handle given to the code under test and
//! the handle the test keeps for assertions observe the same state.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::mock::config::SpawnConfig;
use crate::mock::error::MockError;
use crate::mock::process::MockProcess;
use crate::mock::runner::{Runner, Simple};
use crate::mock::signal::SignalTable;
use crate::mock::strategy::{Sequence, StrategySlot};

/// Creates an isolated mock-spawn instance.
///
/// `verbose` turns on `tracing` diagnostics for dispatch decisions and for
/// canned runners created via [`MockSpawn::simple`].
pub fn create(verbose: bool) -> MockSpawn {
    MockSpawn::new(verbose)
}

#[derive(Debug)]
struct Registry {
    verbose: bool,
    next_pid: AtomicU32,
    default_runner: Mutex<Runner>,
    strategy: Mutex<StrategySlot>,
    signals: Mutex<SignalTable>,
    calls: Mutex<Vec<MockProcess>>,
}

/// The spawn-replacement entry point and its control surface.
///
/// Dispatch flow: [`spawn`](MockSpawn::spawn) asks the active strategy for a
/// runner, falls back to the default runner (initially exit code 0), records
/// a new [`MockProcess`] in the call log, starts it, and returns it - the
/// same synchronous shape as the real spawn API. Only a throwing runner
/// makes `spawn` itself fail.
#[derive(Debug, Clone)]
pub struct MockSpawn {
    registry: Arc<Registry>,
}

impl MockSpawn {
    pub fn new(verbose: bool) -> Self {
        MockSpawn {
            registry: Arc::new(Registry {
                verbose,
                next_pid: AtomicU32::new(1),
                default_runner: Mutex::new(Simple::new(0).verbose(verbose).into()),
                strategy: Mutex::new(StrategySlot::Unset),
                signals: Mutex::new(SignalTable::default()),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Simulates one invocation.
    ///
    /// Returns the running [`MockProcess`], or the error carried by a
    /// throwing runner. A failed dispatch is not recorded in the call log.
    pub fn spawn(&self, config: impl Into<SpawnConfig>) -> Result<MockProcess, MockError> {
        let config = config.into();
        let runner = self.select_runner(&config);
        let behavior = match runner.into_behavior() {
            Ok(behavior) => behavior,
            Err(error) => {
                debug!(command = %config.command, error = %error, "dispatch failed at spawn time");
                return Err(error);
            }
        };

        let pid = self.registry.next_pid.fetch_add(1, Ordering::Relaxed);
        let signals = self
            .registry
            .signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let process = MockProcess::new(pid, config, signals);
        self.registry
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(process.clone());
        if self.registry.verbose {
            debug!(pid, command = %process.command(), "dispatched mock process");
        }
        process.start(behavior);
        Ok(process)
    }

    fn select_runner(&self, config: &SpawnConfig) -> Runner {
        let selected = {
            let mut slot = self
                .registry
                .strategy
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &mut *slot {
                StrategySlot::Sequence(sequence) => sequence.next(config),
                StrategySlot::Custom(strategy) => strategy(config),
                StrategySlot::Unset => None,
            }
        };
        match selected {
            Some(runner) => runner,
            None => {
                if self.registry.verbose {
                    debug!(command = %config.command, "strategy declined, using default runner");
                }
                self.registry
                    .default_runner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            }
        }
    }

    /// The built-in FIFO strategy, installed lazily on first access.
    ///
    /// Fails with [`MockError::StrategyConflict`] if a custom strategy is
    /// already installed - queued runners and a custom strategy cannot be
    /// mixed.
    pub fn sequence(&self) -> Result<Sequence, MockError> {
        let mut slot = self
            .registry
            .strategy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match &mut *slot {
            StrategySlot::Sequence(sequence) => Ok(sequence.clone()),
            StrategySlot::Custom(_) => Err(MockError::StrategyConflict),
            StrategySlot::Unset => {
                let sequence = Sequence::new(self.registry.verbose);
                *slot = StrategySlot::Sequence(sequence.clone());
                Ok(sequence)
            }
        }
    }

    /// Replaces the active strategy wholesale, discarding any queued
    /// sequence.
    pub fn set_strategy<F>(&self, strategy: F)
    where
        F: FnMut(&SpawnConfig) -> Option<Runner> + Send + 'static,
    {
        *self
            .registry
            .strategy
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = StrategySlot::Custom(Box::new(strategy));
    }

    /// Replaces the default runner. Affects only future dispatches.
    pub fn set_default(&self, runner: impl Into<Runner>) {
        *self
            .registry
            .default_runner
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = runner.into();
    }

    /// Replaces the signal table for subsequently created processes.
    /// Processes already dispatched keep the table they captured.
    pub fn set_signals(&self, table: SignalTable) {
        *self
            .registry
            .signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = table;
    }

    /// Snapshot of the call log: one entry per successful dispatch, in
    /// dispatch order.
    pub fn calls(&self) -> Vec<MockProcess> {
        self.registry
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Canned-runner builder preseeded with this dispatcher's verbosity.
    pub fn simple(&self, exit_code: i32) -> Simple {
        Simple::new(exit_code).verbose(self.registry.verbose)
    }
}
