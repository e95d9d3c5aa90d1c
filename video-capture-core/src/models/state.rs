use super::error::CaptureError;

/// Capture lifecycle state machine.
///
/// State transitions:
/// ```text
/// not-initialized → initializing → initialized → configured
///                                       ↑             │
///                                       └─ recovery ──┘
///                  any unrecoverable failure → error (terminal)
/// ```
///
/// Exactly one value holds at any time; it is the single source of truth
/// for which lifecycle operations are legal.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    NotInitialized,
    Initializing,
    Initialized,
    Configured,
    Error(CaptureError),
}

impl CaptureState {
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, Self::Initialized)
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured)
    }

    /// Terminal until the manager is rebuilt.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The failure that put the manager into the terminal state, if any.
    pub fn error(&self) -> Option<&CaptureError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}
