pub mod app;
pub mod camera;
pub mod coins;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod frame;
pub mod gesture;
pub mod hands;
pub mod keyboard_input;
pub mod overlay;
pub mod piano;
pub mod recovery;

pub use app::{FrameReport, SessionBuilder, SessionExit, SessionOrchestrator, SessionStats, StepOutcome};
pub use camera::{CameraDescriptor, CameraManager, CameraManagerBuilder, CaptureDriver};
pub use coins::{CoinGame, CoinGameState};
pub use config::FingerplayConfig;
pub use error::{FingerplayError, Result};
pub use events::{EventBus, SessionEvent};
pub use frame::{FrameData, FrameProcessor};
pub use gesture::{GestureTracker, HandIdentity, IdentityStrategy, Transition};
pub use hands::{DetectedHand, HandDetector, HandSide, Landmark};
pub use keyboard_input::{Command, CommandSource};
pub use overlay::OverlayRenderer;
pub use piano::{AudioSink, Note, PianoEngine};
pub use recovery::{ReadFailurePolicy, RecoveryAction};
