//! # mock-spawn
//!
//! A test double for process-spawning APIs. Test code registers scripted
//! behaviors ("runners"), hands the mock to the code under test in place of
//! the real spawn facility, and later inspects every recorded invocation.
//! No external program is ever executed.
//!
//! ## Features
//!
//! - **Scriptable runners**: canned exit codes and output, async closures,
//!   or spawn-time failures
//! - **Dispatch strategies**: a mutable default runner, a FIFO sequence of
//!   queued runners, or a custom selection function
//! - **Lifecycle events**: `Output`, `Exit`, `Close` and `Error` events per
//!   simulated process, delivered over tokio channels
//! - **Signal semantics**: a per-dispatcher table decides which signals
//!   terminate a simulated process and which are ignored
//! - **Call log**: every dispatch is recorded in order for later assertions
//!
//! ## Quick Start
//!
//! ```rust
//! use mock_spawn::mock::config::SpawnConfig;
//! use mock_spawn::mock::dispatcher::create;
//! use mock_spawn::mock::event::ProcessEvent;
//! use mock_spawn::mock::runner::Simple;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mock = create(false);
//!     mock.sequence()?.add(Simple::new(0).stdout("On branch main\n"));
//!
//!     // Code under test calls the mock exactly like a real spawn.
//!     let process = mock.spawn(SpawnConfig::new("git").args(["status"]))?;
//!
//!     let mut events = process.subscribe();
//!     while let Some(event) = events.recv().await {
//!         if let ProcessEvent::Exit { code, .. } = event {
//!             assert_eq!(code, Some(0));
//!             break;
//!         }
//!     }
//!
//!     assert_eq!(process.stdout().contents(), "On branch main\n");
//!     assert_eq!(mock.calls().len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Injection
//!
//! A queued throwing runner makes the dispatch call itself fail, the way a
//! real spawn fails on a missing executable:
//!
//! ```rust
//! use mock_spawn::mock::dispatcher::create;
//! use mock_spawn::mock::error::MockError;
//! use mock_spawn::mock::runner::Runner;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mock = create(false);
//!     mock.sequence()?
//!         .add(Runner::throws(MockError::Spawn("ENOENT".into())));
//!
//!     let result = mock.spawn("no-such-binary");
//!     assert!(result.is_err());
//!     assert!(mock.calls().is_empty());
//!     Ok(())
//! }
//! ```
//!
//! ## Signal Delivery
//!
//! ```rust
//! use mock_spawn::mock::dispatcher::create;
//! use mock_spawn::mock::runner::Runner;
//! use mock_spawn::mock::signal::{ProcessSignal, SignalTable};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mock = create(false);
//!     mock.set_signals(
//!         SignalTable::empty()
//!             .terminating(ProcessSignal::SIGTERM)
//!             .ignoring(ProcessSignal::SIGINT),
//!     );
//!     // A runner that never completes, like a hung server process.
//!     mock.set_default(Runner::from_fn(|_process, _completion| async {
//!         std::future::pending::<()>().await
//!     }));
//!
//!     let process = mock.spawn("serve")?;
//!     assert!(!process.kill(ProcessSignal::SIGINT));
//!     assert!(process.kill(ProcessSignal::SIGTERM));
//!     Ok(())
//! }
//! ```
//!
//! The mock must be used inside a Tokio runtime: runner execution and
//! signal-triggered exits are deferred to the scheduler and never run inside
//! the call stack that triggered them. Spawn-time failures are the one
//! synchronous exception, mirroring the real API shape.
//!
//! ## Optional Features
//!
//! - `serde`: serialization support for configuration, event and signal types

pub mod mock;
