mod orchestrator;
mod runtime;
mod startup;
mod stats;
mod types;


pub use orchestrator::{SessionBuilder, SessionOrchestrator};
pub use stats::SessionStats;
pub use types::{FrameReport, SessionExit, StepOutcome};
