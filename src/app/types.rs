use crate::events::SessionEvent;
use std::fmt;

/// Why the session loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// The operator pressed quit
    UserQuit,
    /// SIGINT/SIGTERM
    Interrupted,
    /// Enumeration found no camera that delivers frames
    NoCamera,
    /// The first camera could not be read even after reinitialization
    CameraUnreadable,
    /// Too many consecutive read failures
    ReadFailures,
}

impl SessionExit {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionExit::UserQuit | SessionExit::Interrupted => 0,
            SessionExit::NoCamera => 1,
            SessionExit::CameraUnreadable | SessionExit::ReadFailures => 2,
        }
    }

    pub fn is_error(&self) -> bool {
        self.exit_code() != 0
    }
}

impl fmt::Display for SessionExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SessionExit::UserQuit => "quit requested",
            SessionExit::Interrupted => "interrupted by signal",
            SessionExit::NoCamera => "no cameras found",
            SessionExit::CameraUnreadable => "cannot read from camera",
            SessionExit::ReadFailures => "too many consecutive read failures",
        };
        f.write_str(text)
    }
}

/// Summary of one processed frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_id: u64,
    pub hands: usize,
    pub fingers: usize,
    pub events: Vec<SessionEvent>,
}

/// Result of a single loop iteration
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A frame was read, annotated and presented
    Frame(FrameReport),
    /// The read failed and will be retried
    ReadFailed { consecutive: u32 },
    /// No camera is open; only commands were handled
    Idle,
    Exit(SessionExit),
}
