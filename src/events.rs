use crate::camera::CameraDescriptor;
use crate::gesture::{HandIdentity, FINGER_NAMES};
use crate::hands::HandSide;
use crate::piano::Note;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Something a frame of the session produced
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A finger release started a note
    NotePlayed {
        side: HandSide,
        finger: usize,
        note: Note,
    },
    /// A finger release found no free voice
    NoteDropped {
        side: HandSide,
        finger: usize,
        note: Note,
    },
    /// A finger extended again; reported but never plays
    FingerPressed { hand: HandIdentity, finger: usize },
    CoinSpawned { x: f32, y: f32 },
    CoinCollected { score: u32 },
    /// A hand touched the ball
    GameOver { score: u32 },
    GameRestarted,
    CameraSwitched { descriptor: CameraDescriptor },
    CameraSwitchFailed { index: usize, reason: String },
    ReadFailure { consecutive: u32 },
    /// Inference failed for one frame; the frame counts as handless
    InferenceFailed { reason: String },
    ShutdownRequested { reason: String },
}

impl SessionEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::NotePlayed { side, finger, note } => format!(
                "{} {} played {} ({:.2} Hz)",
                side,
                finger_name(*finger),
                note.name,
                note.frequency
            ),
            SessionEvent::NoteDropped { side, finger, note } => format!(
                "{} {} dropped {} (no free voice)",
                side,
                finger_name(*finger),
                note.name
            ),
            SessionEvent::FingerPressed { hand, finger } => {
                format!("{} {} extended", hand, finger_name(*finger))
            }
            SessionEvent::CoinSpawned { x, y } => format!("Coin spawned at ({:.0}, {:.0})", x, y),
            SessionEvent::CoinCollected { score } => format!("Coin collected, score {}", score),
            SessionEvent::GameOver { score } => format!("Game over with score {}", score),
            SessionEvent::GameRestarted => "Game restarted".to_string(),
            SessionEvent::CameraSwitched { descriptor } => format!("Switched to {}", descriptor),
            SessionEvent::CameraSwitchFailed { index, reason } => {
                format!("Switch to camera {} failed: {}", index, reason)
            }
            SessionEvent::ReadFailure { consecutive } => {
                format!("Frame read failed ({} consecutive)", consecutive)
            }
            SessionEvent::InferenceFailed { reason } => format!("Inference failed: {}", reason),
            SessionEvent::ShutdownRequested { reason } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::NotePlayed { .. } => "note_played",
            SessionEvent::NoteDropped { .. } => "note_dropped",
            SessionEvent::FingerPressed { .. } => "finger_pressed",
            SessionEvent::CoinSpawned { .. } => "coin_spawned",
            SessionEvent::CoinCollected { .. } => "coin_collected",
            SessionEvent::GameOver { .. } => "game_over",
            SessionEvent::GameRestarted => "game_restarted",
            SessionEvent::CameraSwitched { .. } => "camera_switched",
            SessionEvent::CameraSwitchFailed { .. } => "camera_switch_failed",
            SessionEvent::ReadFailure { .. } => "read_failure",
            SessionEvent::InferenceFailed { .. } => "inference_failed",
            SessionEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

fn finger_name(finger: usize) -> &'static str {
    FINGER_NAMES.get(finger).copied().unwrap_or("finger")
}

/// Broadcast channel carrying session events to observers outside the frame
/// loop. Publishing never blocks.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers. Returns how many received it.
    pub fn publish(&self, event: SessionEvent) -> usize {
        match &event {
            SessionEvent::GameOver { score } => info!("Game over! Score: {}", score),
            SessionEvent::GameRestarted => info!("Game restarted"),
            SessionEvent::CameraSwitched { descriptor } => info!("Switched to {}", descriptor),
            SessionEvent::CameraSwitchFailed { .. } => warn!("{}", event.description()),
            SessionEvent::ShutdownRequested { reason } => info!("Shutdown requested: {}", reason),
            _ => debug!(event = event.event_type(), "{}", event.description()),
        }

        // No subscribers is not an error for the frame loop
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piano::note_for;

    #[tokio::test]
    async fn test_event_bus_basic_operations() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let subscriber_count = event_bus.publish(SessionEvent::CoinCollected { score: 3 });
        assert_eq!(subscriber_count, 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received, SessionEvent::CoinCollected { score: 3 });
    }

    #[test]
    fn test_publish_without_subscribers() {
        let event_bus = EventBus::new(4);
        assert_eq!(event_bus.publish(SessionEvent::GameRestarted), 0);
    }

    #[test]
    fn test_event_properties() {
        let note = note_for(HandSide::Left, 1).unwrap();
        let event = SessionEvent::NotePlayed {
            side: HandSide::Left,
            finger: 1,
            note,
        };

        assert_eq!(event.event_type(), "note_played");
        assert_eq!(event.description(), "Left index played B4 (493.88 Hz)");

        let pressed = SessionEvent::FingerPressed {
            hand: HandIdentity::new(HandSide::Right, 0),
            finger: 4,
        };
        assert_eq!(pressed.description(), "Right_0 pinky extended");
    }
}
