use crate::events::SessionEvent;
use std::time::{Duration, Instant};
use tracing::info;

/// Counters kept over a session and logged when it ends
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub started_at: Instant,
    pub frames: u64,
    pub read_failures: u64,
    pub hands_seen: u64,
    pub notes_played: u64,
    pub notes_dropped: u64,
    pub coins_collected: u64,
    pub games_over: u64,
    pub camera_switches: u64,
    pub switch_failures: u64,
    pub inference_failures: u64,
    pub display_errors: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames: 0,
            read_failures: 0,
            hands_seen: 0,
            notes_played: 0,
            notes_dropped: 0,
            coins_collected: 0,
            games_over: 0,
            camera_switches: 0,
            switch_failures: 0,
            inference_failures: 0,
            display_errors: 0,
        }
    }

    /// Count an event towards the totals
    pub fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::NotePlayed { .. } => self.notes_played += 1,
            SessionEvent::NoteDropped { .. } => self.notes_dropped += 1,
            SessionEvent::CoinCollected { .. } => self.coins_collected += 1,
            SessionEvent::GameOver { .. } => self.games_over += 1,
            SessionEvent::CameraSwitched { .. } => self.camera_switches += 1,
            SessionEvent::CameraSwitchFailed { .. } => self.switch_failures += 1,
            SessionEvent::ReadFailure { .. } => self.read_failures += 1,
            SessionEvent::InferenceFailed { .. } => self.inference_failures += 1,
            _ => {}
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Average processed frames per second since the session started
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        info!(
            "Session ran {:.1}s: {} frames ({:.1} fps), {} read failures, {} hands seen",
            self.elapsed().as_secs_f64(),
            self.frames,
            self.fps(),
            self.read_failures,
            self.hands_seen
        );
        info!(
            "Notes played {} (dropped {}), coins {}, games over {}, camera switches {} ({} failed)",
            self.notes_played,
            self.notes_dropped,
            self.coins_collected,
            self.games_over,
            self.camera_switches,
            self.switch_failures
        );
        if self.inference_failures > 0 || self.display_errors > 0 {
            info!(
                "Inference failures {}, display errors {}",
                self.inference_failures, self.display_errors
            );
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
