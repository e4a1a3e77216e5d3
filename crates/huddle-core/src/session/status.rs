use std::fmt;

/// Progress of the one history load a session performs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HistoryStatus {
    /// Still waiting for the directory to answer.
    #[default]
    Pending,
    /// History arrived; `count` messages were merged from it.
    Loaded { count: usize },
    /// The load failed. The session continues with live messages only.
    Failed { reason: String },
}

impl HistoryStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, HistoryStatus::Pending)
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryStatus::Pending => write!(f, "pending"),
            HistoryStatus::Loaded { count } => write!(f, "loaded ({count} messages)"),
            HistoryStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}
