use super::{SessionExit, SessionOrchestrator};
use crate::error::CameraError;
use std::time::Instant;
use tracing::{error, info, warn};

impl SessionOrchestrator {
    /// Discover cameras and open the first one. A camera that opens but
    /// cannot deliver a test frame is released and reopened once after the
    /// reinit delay.
    pub fn start(&mut self) -> Result<(), SessionExit> {
        info!("Starting hand tracking session");

        let cameras = self.camera.enumerate();
        if cameras.is_empty() {
            error!("No cameras found");
            return Err(SessionExit::NoCamera);
        }
        info!("Found {} camera(s)", cameras.len());
        for (position, descriptor) in cameras.iter().enumerate() {
            info!("  [{}] {}", position, descriptor);
        }

        if let Err(e) = self.open_and_test() {
            warn!("Initial camera test failed: {}; reinitializing", e);
            self.camera.release();
            if !self.reinit_delay.is_zero() {
                std::thread::sleep(self.reinit_delay);
            }

            if let Err(e) = self.open_and_test() {
                error!("Cannot read from camera: {}", e);
                self.camera.release();
                return Err(SessionExit::CameraUnreadable);
            }
        }

        // The first coin waits a full spawn interval after setup
        if let Some(game) = self.coins.as_mut() {
            game.reset(Instant::now());
        }

        self.started = true;
        info!(
            "Session running on {}",
            self.camera
                .session()
                .map(|s| s.descriptor().to_string())
                .unwrap_or_default()
        );
        Ok(())
    }

    fn open_and_test(&mut self) -> Result<(), CameraError> {
        self.camera.switch_to(0)?;
        self.camera.read().map(|_| ())
    }
}
