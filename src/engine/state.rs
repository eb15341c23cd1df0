use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a session started shutting down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// Operator pressed Ctrl-C
    Interrupt,
    /// Collection window elapsed
    WindowElapsed,
    /// Inbound stream ended without being asked to
    TransportClosed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Interrupt => "operator interrupt",
            Self::WindowElapsed => "collection window elapsed",
            Self::TransportClosed => "transport closed",
        };
        f.write_str(text)
    }
}

/// Session lifecycle: `Running -> Stopping -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionState {
    #[default]
    Running,
    Stopping { reason: ShutdownReason },
    Stopped { reason: ShutdownReason },
}

impl SessionState {
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Running, Stopping { .. }) | (Stopping { .. }, Stopped { .. })
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Running => "Running",
            Self::Stopping { .. } => "Stopping",
            Self::Stopped { .. } => "Stopped",
        }
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        match self {
            Self::Running => None,
            Self::Stopping { reason } | Self::Stopped { reason } => Some(*reason),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only() {
        let running = SessionState::Running;
        let stopping = SessionState::Stopping {
            reason: ShutdownReason::Interrupt,
        };
        let stopped = SessionState::Stopped {
            reason: ShutdownReason::Interrupt,
        };

        assert!(running.can_transition_to(&stopping));
        assert!(stopping.can_transition_to(&stopped));
        assert!(!running.can_transition_to(&stopped));
        assert!(!stopping.can_transition_to(&stopping));
        assert!(!stopped.can_transition_to(&running));
    }
}
