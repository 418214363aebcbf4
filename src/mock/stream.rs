use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::mock::bus::EventBus;
use crate::mock::error::MockError;
use crate::mock::event::ProcessEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamSource {
    Stdin,
    Stdout,
    Stderr,
}

/// A simulated text channel standing in for one of a process's standard
/// streams.
///
/// Runners write to stdout/stderr; tests write to stdin. Writes accumulate
/// in a buffer that stays inspectable via [`contents`](SimStream::contents)
/// after the process has ended. Writes on stdout/stderr also emit
/// [`ProcessEvent::Output`] on the owning process's event bus.
///
/// Once ended, further writes fail with [`MockError::StreamEnded`] - the
/// simulated equivalent of writing to a closed pipe.
#[derive(Debug, Clone)]
pub struct SimStream {
    inner: Arc<StreamInner>,
}

#[derive(Debug)]
struct StreamInner {
    source: StreamSource,
    buf: Mutex<String>,
    ended: AtomicBool,
    bus: Option<EventBus>,
}

impl SimStream {
    pub(crate) fn new(source: StreamSource, bus: Option<EventBus>) -> Self {
        SimStream {
            inner: Arc::new(StreamInner {
                source,
                buf: Mutex::new(String::new()),
                ended: AtomicBool::new(false),
                bus,
            }),
        }
    }

    pub fn source(&self) -> StreamSource {
        self.inner.source
    }

    pub fn write(&self, chunk: impl Into<String>) -> Result<(), MockError> {
        if self.inner.ended.load(Ordering::Acquire) {
            return Err(MockError::StreamEnded);
        }
        let chunk = chunk.into();
        self.inner
            .buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(&chunk);
        if let Some(bus) = &self.inner.bus {
            bus.emit(ProcessEvent::Output {
                chunk,
                src: self.inner.source,
            });
        }
        Ok(())
    }

    /// Ends the stream. Idempotent; buffered contents remain readable.
    pub fn end(&self) {
        self.inner.ended.store(true, Ordering::Release);
    }

    pub fn is_ended(&self) -> bool {
        self.inner.ended.load(Ordering::Acquire)
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.inner
            .buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
