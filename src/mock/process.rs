//! The per-invocation state machine.
//!
//! A [`MockProcess`] is created by the dispatcher, starts its runner on the
//! next scheduler tick, and moves `Created -> Running -> Exited -> Closed`.
//! A terminating signal takes the same path to `Exited` with a `None` exit
//! code. All transitions are guarded: `Exit` and `Close` are each emitted at
//! most once, in that order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::mock::bus::EventBus;
use crate::mock::config::{SpawnConfig, SpawnOptions};
use crate::mock::error::MockError;
use crate::mock::event::ProcessEvent;
use crate::mock::runner::BehaviorFn;
use crate::mock::scheduler;
use crate::mock::signal::{ProcessSignal, SignalTable};
use crate::mock::state::ProcessState;
use crate::mock::stream::{SimStream, StreamSource};

/// One simulated process instance.
///
/// Cloning produces another handle to the same process; the dispatcher keeps
/// one clone in its call log, the caller gets another, and the runner a
/// third. State is inspectable at any time through the accessors, and
/// lifecycle events can be observed via [`subscribe`](MockProcess::subscribe).
#[derive(Debug, Clone)]
pub struct MockProcess {
    inner: Arc<ProcessInner>,
}

#[derive(Debug)]
struct ProcessInner {
    config: SpawnConfig,
    pid: u32,
    lifecycle: Mutex<Lifecycle>,
    stdin: SimStream,
    stdout: SimStream,
    stderr: SimStream,
    signals: SignalTable,
    bus: EventBus,
}

#[derive(Debug)]
struct Lifecycle {
    state: ProcessState,
    exit_code: Option<i32>,
    signal: Option<ProcessSignal>,
    ended: bool,
    closed: bool,
}

fn lock(lifecycle: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockProcess {
    pub(crate) fn new(pid: u32, config: SpawnConfig, signals: SignalTable) -> Self {
        let bus = EventBus::new();
        MockProcess {
            inner: Arc::new(ProcessInner {
                config,
                pid,
                lifecycle: Mutex::new(Lifecycle {
                    state: ProcessState::Created,
                    exit_code: None,
                    signal: None,
                    ended: false,
                    closed: false,
                }),
                stdin: SimStream::new(StreamSource::Stdin, None),
                stdout: SimStream::new(StreamSource::Stdout, Some(bus.clone())),
                stderr: SimStream::new(StreamSource::Stderr, Some(bus.clone())),
                signals,
                bus,
            }),
        }
    }

    /// Schedules the runner on the next scheduler tick. Called exactly once,
    /// by the dispatcher, after the process is in the call log.
    pub(crate) fn start(&self, behavior: Arc<BehaviorFn>) {
        let process = self.clone();
        scheduler::defer(async move {
            process.mark_running();
            let completion = Completion::new(process.clone());
            behavior(process, completion).await;
        });
    }

    fn mark_running(&self) {
        let mut lifecycle = lock(&self.inner.lifecycle);
        if lifecycle.state == ProcessState::Created && !lifecycle.ended {
            lifecycle.state = ProcessState::Running;
        }
    }

    /// Records the outcome and emits `Exit` then `Close`. No-op once the
    /// process has ended, so duplicate completions and completion racing a
    /// terminating kill are harmless.
    pub(crate) fn complete(&self, exit_code: Option<i32>, signal: Option<ProcessSignal>) {
        let (code, sig) = {
            let mut lifecycle = lock(&self.inner.lifecycle);
            if lifecycle.ended {
                trace!(pid = self.inner.pid, "completion after end ignored");
                return;
            }
            lifecycle.ended = true;
            lifecycle.state = ProcessState::Exited;
            lifecycle.exit_code = exit_code;
            if signal.is_some() {
                lifecycle.signal = signal;
            }
            (lifecycle.exit_code, lifecycle.signal.clone())
        };
        self.inner.bus.emit(ProcessEvent::Exit {
            code,
            signal: sig,
        });
        self.finalize();
    }

    /// Ends the output channels and emits `Close` exactly once.
    fn finalize(&self) {
        self.inner.stdout.end();
        self.inner.stderr.end();
        let (code, sig) = {
            let mut lifecycle = lock(&self.inner.lifecycle);
            if lifecycle.closed {
                return;
            }
            lifecycle.closed = true;
            lifecycle.state = ProcessState::Closed;
            (lifecycle.exit_code, lifecycle.signal.clone())
        };
        self.inner.bus.emit(ProcessEvent::Close {
            code,
            signal: sig,
        });
    }

    /// Delivers `signal` according to the signal table captured at creation.
    ///
    /// A terminating signal on a live process marks it ended immediately
    /// (any later runner completion becomes a no-op) and schedules the
    /// `Exit`/`Close` emission for the next scheduler tick; returns `true`.
    /// Ignored signals, signals absent from the table, and signals delivered
    /// after the process ended change nothing and return `false`.
    pub fn kill(&self, signal: ProcessSignal) -> bool {
        if !self.inner.signals.terminates(&signal) {
            debug!(pid = self.inner.pid, signal = %signal, "signal ignored");
            return false;
        }
        {
            let mut lifecycle = lock(&self.inner.lifecycle);
            if lifecycle.ended {
                return false;
            }
            lifecycle.ended = true;
            lifecycle.state = ProcessState::Exited;
            lifecycle.exit_code = None;
            lifecycle.signal = Some(signal.clone());
        }
        debug!(pid = self.inner.pid, signal = %signal, "terminating signal delivered");
        let process = self.clone();
        scheduler::defer(async move {
            process.inner.bus.emit(ProcessEvent::Exit {
                code: None,
                signal: process.signal(),
            });
            process.finalize();
        });
        true
    }

    /// [`kill`](MockProcess::kill) with the default signal, SIGTERM.
    pub fn terminate(&self) -> bool {
        self.kill(ProcessSignal::SIGTERM)
    }

    /// Reports a failure without ending the process.
    pub fn emit_error(&self, error: MockError) {
        self.inner.bus.emit(ProcessEvent::Error { error });
    }

    /// New subscription to this process's lifecycle events. Only events
    /// emitted after the call are delivered.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ProcessEvent> {
        self.inner.bus.subscribe()
    }

    pub fn command(&self) -> &str {
        &self.inner.config.command
    }

    pub fn args(&self) -> &[String] {
        &self.inner.config.args
    }

    pub fn options(&self) -> &SpawnOptions {
        &self.inner.config.options
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.inner.config
    }

    pub fn pid(&self) -> u32 {
        self.inner.pid
    }

    pub fn state(&self) -> ProcessState {
        lock(&self.inner.lifecycle).state
    }

    pub fn exit_code(&self) -> Option<i32> {
        lock(&self.inner.lifecycle).exit_code
    }

    pub fn signal(&self) -> Option<ProcessSignal> {
        lock(&self.inner.lifecycle).signal.clone()
    }

    pub fn has_ended(&self) -> bool {
        lock(&self.inner.lifecycle).ended
    }

    pub fn is_running(&self) -> bool {
        self.state() == ProcessState::Running
    }

    pub fn stdin(&self) -> &SimStream {
        &self.inner.stdin
    }

    pub fn stdout(&self) -> &SimStream {
        &self.inner.stdout
    }

    pub fn stderr(&self) -> &SimStream {
        &self.inner.stderr
    }
}

/// Completion callback handed to a runner.
///
/// Invoking it more than once is harmless; only the first call takes effect.
/// A runner that never invokes it leaves its process in the `Running` state
/// forever, simulating a hang.
#[derive(Debug, Clone)]
pub struct Completion {
    process: MockProcess,
}

impl Completion {
    pub(crate) fn new(process: MockProcess) -> Self {
        Completion { process }
    }

    /// The process exited with `code`.
    pub fn exit(&self, code: i32) {
        self.process.complete(Some(code), None);
    }

    /// The process was ended by `signal`; exit code is `None`.
    pub fn signal(&self, signal: ProcessSignal) {
        self.process.complete(None, Some(signal));
    }

    /// Full form: exit code and signal as reported together.
    pub fn exit_with(&self, code: Option<i32>, signal: Option<ProcessSignal>) {
        self.process.complete(code, signal);
    }
}
