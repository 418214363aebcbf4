use crate::mock::error::MockError;
use crate::mock::signal::ProcessSignal;
use crate::mock::stream::StreamSource;

/// Events emitted by a simulated process over its lifetime.
///
/// The set is closed: a [`MockProcess`] emits nothing outside these four
/// variants, and subscribers receive them in emission order.
///
/// # Event Flow
///
/// A typical simulated run delivers events in this order:
/// 1. `Output` - chunks written by the runner to stdout/stderr (ongoing)
/// 2. `Exit` - the runner reported completion, or a terminating signal landed
/// 3. `Close` - output channels have ended; always after `Exit`, exactly once
///
/// `Error` may appear at any point before `Exit` and does not by itself end
/// the process.
///
/// # Examples
///
/// ```rust
/// use mock_spawn::mock::dispatcher::create;
/// use mock_spawn::mock::event::ProcessEvent;
/// use mock_spawn::mock::runner::Simple;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mock = create(false);
///     mock.set_default(Simple::new(2).stderr("boom\n"));
///
///     let process = mock.spawn("fails")?;
///     let mut events = process.subscribe();
///     while let Some(event) = events.recv().await {
///         match event {
///             ProcessEvent::Output { chunk, src } => {
///                 println!("{src:?}: {chunk}");
///             }
///             ProcessEvent::Exit { code, .. } => {
///                 assert_eq!(code, Some(2));
///             }
///             ProcessEvent::Close { .. } => break,
///             ProcessEvent::Error { error } => eprintln!("error: {error}"),
///         }
///     }
///     Ok(())
/// }
/// ```
///
/// [`MockProcess`]: crate::mock::process::MockProcess
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessEvent {
    /// A chunk written by the runner to a simulated output stream
    Output {
        chunk: String,
        /// Source stream (stdout or stderr)
        src: StreamSource,
    },

    /// The process ended
    ///
    /// `code` is `None` when a terminating signal ended the process; the
    /// signal is then carried alongside.
    Exit {
        code: Option<i32>,
        signal: Option<ProcessSignal>,
    },

    /// Output channels have ended; no further events follow
    Close {
        code: Option<i32>,
        signal: Option<ProcessSignal>,
    },

    /// A failure reported by the runner mid-flight
    ///
    /// Does not end the process; the runner remains responsible for
    /// eventually completing (or hanging, if the test wants a hang).
    Error { error: MockError },
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "serde")]
    #[test]
    fn exit_event_serializes() {
        use super::ProcessEvent;
        use crate::mock::signal::ProcessSignal;

        let event = ProcessEvent::Exit {
            code: None,
            signal: Some(ProcessSignal::SIGTERM),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: ProcessEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
