//! Public types for the follow sync coordinator.

/// Session lifecycle state.
///
/// Use [`super::FollowSync::state()`] to check current state or
/// [`super::FollowSync::state_receiver()`] to watch for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Just created, push loop not yet running
    Created,
    /// Push loop running
    Running,
    /// Shutdown requested, mutations rejected
    ShuttingDown,
    /// Push loop exited
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Running => write!(f, "Running"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// What a reconciliation decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Remote and local timestamps matched
    InSync,
    /// Local was newer and was uploaded
    Pushed { records: usize },
    /// Remote was newer and replaced the local collection
    Replaced { records: usize, remote_time: i64 },
    /// Remote had no copy yet; local was uploaded
    Bootstrapped { records: usize },
}

impl ReconcileOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InSync => "in_sync",
            Self::Pushed { .. } => "pushed",
            Self::Replaced { .. } => "replaced",
            Self::Bootstrapped { .. } => "bootstrapped",
        }
    }

    /// Whether the remote copy was overwritten
    #[must_use]
    pub fn pushed(&self) -> bool {
        matches!(self, Self::Pushed { .. } | Self::Bootstrapped { .. })
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushReport {
    /// Records carried in the payload
    pub records: usize,
    /// Encoded payload size
    pub bytes: usize,
    /// Collection timestamp carried in the payload
    pub marker: i64,
}
