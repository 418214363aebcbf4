use std::collections::HashMap;
use std::fmt;

/// Signals a test can deliver to a simulated process.
///
/// `Other` carries any name outside the common set, so strategies and tables
/// can work with nonstandard or platform-specific signals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessSignal {
    SIGTERM,
    SIGKILL,
    SIGINT,
    SIGQUIT,
    SIGHUP,
    SIGUSR1,
    SIGUSR2,
    Other(String),
}

impl ProcessSignal {
    pub fn name(&self) -> &str {
        match self {
            ProcessSignal::SIGTERM => "SIGTERM",
            ProcessSignal::SIGKILL => "SIGKILL",
            ProcessSignal::SIGINT => "SIGINT",
            ProcessSignal::SIGQUIT => "SIGQUIT",
            ProcessSignal::SIGHUP => "SIGHUP",
            ProcessSignal::SIGUSR1 => "SIGUSR1",
            ProcessSignal::SIGUSR2 => "SIGUSR2",
            ProcessSignal::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "SIGTERM" => ProcessSignal::SIGTERM,
            "SIGKILL" => ProcessSignal::SIGKILL,
            "SIGINT" => ProcessSignal::SIGINT,
            "SIGQUIT" => ProcessSignal::SIGQUIT,
            "SIGHUP" => ProcessSignal::SIGHUP,
            "SIGUSR1" => ProcessSignal::SIGUSR1,
            "SIGUSR2" => ProcessSignal::SIGUSR2,
            other => ProcessSignal::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ProcessSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-dispatcher signal disposition: which signals terminate a simulated
/// process and which are ignored.
///
/// A signal absent from the table is ignored. Each [`MockProcess`] captures
/// the table at creation time; replacing it on the dispatcher never affects
/// processes that already exist.
///
/// [`MockProcess`]: crate::mock::process::MockProcess
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalTable {
    entries: HashMap<ProcessSignal, bool>,
}

impl Default for SignalTable {
    /// The conventional fatal set. SIGUSR1/SIGUSR2 and anything unlisted are
    /// ignored until a test says otherwise.
    fn default() -> Self {
        SignalTable::empty()
            .terminating(ProcessSignal::SIGTERM)
            .terminating(ProcessSignal::SIGKILL)
            .terminating(ProcessSignal::SIGINT)
            .terminating(ProcessSignal::SIGQUIT)
            .terminating(ProcessSignal::SIGHUP)
    }
}

impl SignalTable {
    pub fn empty() -> Self {
        SignalTable {
            entries: HashMap::new(),
        }
    }

    pub fn terminating(mut self, signal: ProcessSignal) -> Self {
        self.entries.insert(signal, true);
        self
    }

    pub fn ignoring(mut self, signal: ProcessSignal) -> Self {
        self.entries.insert(signal, false);
        self
    }

    pub fn set(&mut self, signal: ProcessSignal, terminates: bool) {
        self.entries.insert(signal, terminates);
    }

    /// Whether delivering `signal` ends a simulated process. Absent entries
    /// are not terminating.
    pub fn terminates(&self, signal: &ProcessSignal) -> bool {
        self.entries.get(signal).copied().unwrap_or(false)
    }
}

impl FromIterator<(ProcessSignal, bool)> for SignalTable {
    fn from_iter<I: IntoIterator<Item = (ProcessSignal, bool)>>(iter: I) -> Self {
        SignalTable {
            entries: iter.into_iter().collect(),
        }
    }
}
