use std::fmt;

/// Lifecycle of an [`Injector`](super::injector::Injector).
///
/// `Configured -> Initialized -> Running -> Completed`, with any failure ending in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InjectorState {
    Configured,
    Initialized,
    Running,
    Completed,
    Failed,
}

impl InjectorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for InjectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configured => "configured",
            Self::Initialized => "initialized",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
