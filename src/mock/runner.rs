use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use crate::mock::error::MockError;
use crate::mock::process::{Completion, MockProcess};

/// The behavior closure of a runner: given the process handle and a
/// completion callback, produce the future that simulates the run.
pub type BehaviorFn = dyn Fn(MockProcess, Completion) -> BoxFuture<'static, ()> + Send + Sync;

/// One unit of simulated behavior for one invocation.
///
/// Either a behavior closure invoked asynchronously with the process handle
/// and a [`Completion`] callback, or a pre-built error that makes the
/// dispatch call itself fail (a spawn-time failure such as a missing
/// executable).
///
/// Runners are cheap to clone; a single runner may serve many dispatches
/// (the default runner does exactly that).
#[derive(Clone)]
pub struct Runner {
    kind: RunnerKind,
}

#[derive(Clone)]
enum RunnerKind {
    Behavior(Arc<BehaviorFn>),
    Throws(MockError),
}

impl Runner {
    /// Wraps an async closure as a runner.
    ///
    /// The closure receives the owning [`MockProcess`] (command, arguments,
    /// options and streams are all reachable from it) and must eventually
    /// invoke the completion callback - or never do so, to simulate a hung
    /// process.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(MockProcess, Completion) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Runner {
            kind: RunnerKind::Behavior(Arc::new(
                move |process, completion| -> BoxFuture<'static, ()> {
                    Box::pin(f(process, completion))
                },
            )),
        }
    }

    /// A runner whose selection fails the dispatch call synchronously.
    pub fn throws(error: MockError) -> Self {
        Runner {
            kind: RunnerKind::Throws(error),
        }
    }

    /// Splits the runner into its behavior, or the spawn-time error.
    pub(crate) fn into_behavior(self) -> Result<Arc<BehaviorFn>, MockError> {
        match self.kind {
            RunnerKind::Behavior(behavior) => Ok(behavior),
            RunnerKind::Throws(error) => Err(error),
        }
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RunnerKind::Behavior(_) => f.write_str("Runner::Behavior(..)"),
            RunnerKind::Throws(error) => f.debug_tuple("Runner::Throws").field(error).finish(),
        }
    }
}

impl From<MockError> for Runner {
    fn from(error: MockError) -> Self {
        Runner::throws(error)
    }
}

/// Canned runner: fixed output and exit code.
///
/// ```rust
/// use mock_spawn::mock::runner::{Runner, Simple};
///
/// let runner: Runner = Simple::new(1)
///     .stdout("partial output\n")
///     .stderr("fatal: not a git repository\n")
///     .into();
/// ```
#[derive(Debug, Clone)]
pub struct Simple {
    exit_code: i32,
    stdout: Option<String>,
    stderr: Option<String>,
    verbose: bool,
}

impl Simple {
    pub fn new(exit_code: i32) -> Self {
        Simple {
            exit_code,
            stdout: None,
            stderr: None,
            verbose: false,
        }
    }

    pub fn stdout(mut self, chunk: impl Into<String>) -> Self {
        self.stdout = Some(chunk.into());
        self
    }

    pub fn stderr(mut self, chunk: impl Into<String>) -> Self {
        self.stderr = Some(chunk.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl From<Simple> for Runner {
    fn from(simple: Simple) -> Self {
        Runner::from_fn(move |process, completion| {
            let simple = simple.clone();
            async move {
                if simple.verbose {
                    debug!(
                        command = %process.command(),
                        args = ?process.args(),
                        stdout = ?simple.stdout,
                        stderr = ?simple.stderr,
                        exit_code = simple.exit_code,
                        "canned runner invoked"
                    );
                }
                if let Some(chunk) = &simple.stdout {
                    if let Err(error) = process.stdout().write(chunk.clone()) {
                        process.emit_error(error);
                    }
                }
                if let Some(chunk) = &simple.stderr {
                    if let Err(error) = process.stderr().write(chunk.clone()) {
                        process.emit_error(error);
                    }
                }
                tokio::task::yield_now().await;
                completion.exit(simple.exit_code);
            }
        })
    }
}
