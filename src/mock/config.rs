use std::collections::HashMap;

/// Opaque per-invocation options, recorded verbatim.
///
/// The mock assigns no meaning to any field; strategies and runners may
/// inspect them to decide behavior, and tests may assert on them.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnOptions {
    /// Working directory for the command
    pub working_dir: Option<String>,

    /// Environment variables for the command
    pub env: Option<HashMap<String, String>>,
}

/// One recorded invocation: command, arguments and options.
///
/// Immutable once a process has been started. Built with the chainable
/// setters, or converted from a plain command string:
///
/// ```rust
/// use mock_spawn::mock::config::SpawnConfig;
///
/// let config = SpawnConfig::new("cargo")
///     .args(["build", "--release"])
///     .working_dir("/home/user/project");
/// assert_eq!(config.command, "cargo");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpawnConfig {
    /// The command or executable the caller asked for
    pub command: String,

    /// Arguments to pass to the command
    pub args: Vec<String>,

    /// Everything beyond command and arguments
    pub options: SpawnOptions,
}

impl SpawnConfig {
    pub fn new(command: impl Into<String>) -> Self {
        SpawnConfig {
            command: command.into(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.options.working_dir = Some(dir.into());
        self
    }

    pub fn env<K, V, I>(mut self, env: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.options.env = Some(env.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn options(mut self, options: SpawnOptions) -> Self {
        self.options = options;
        self
    }
}

impl From<&str> for SpawnConfig {
    fn from(command: &str) -> Self {
        SpawnConfig::new(command)
    }
}

impl From<String> for SpawnConfig {
    fn from(command: String) -> Self {
        SpawnConfig::new(command)
    }
}
