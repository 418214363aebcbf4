use thiserror::Error;

/// Errors surfaced by the mock, either synchronously from a dispatch call or
/// asynchronously as [`ProcessEvent::Error`](crate::mock::event::ProcessEvent).
///
/// Payloads are plain strings so errors stay clonable and comparable, and can
/// ride inside events.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MockError {
    /// Spawn-time failure injected by a throwing runner, e.g. a simulated
    /// ENOENT for a missing executable.
    #[error("spawn failed: {0}")]
    Spawn(String),

    /// Write attempted on a stream that has already ended.
    #[error("stream already ended")]
    StreamEnded,

    /// `sequence()` requested while a custom strategy is installed.
    #[error("a custom strategy is installed; sequence is unavailable")]
    StrategyConflict,

    #[error("{0}")]
    Custom(String),
}
