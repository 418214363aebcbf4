#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessState {
    Created,
    Running,
    // Terminal for the runner, but `close` has not been observed yet
    Exited,
    Closed,
}
