use super::{FrameReport, SessionExit, SessionOrchestrator, StepOutcome};
use crate::events::SessionEvent;
use crate::frame::{FrameData, FrameProcessor};
use crate::gesture::{compute_finger_states, count_extended, Transition};
use crate::hands::{DetectedHand, HandSide, Landmark};
use crate::keyboard_input::Command;
use crate::piano::NoteOutcome;
use crate::recovery::RecoveryAction;
use std::time::{Duration, Instant};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

impl SessionOrchestrator {
    /// Run the session until quit, a fatal camera condition or cancellation.
    /// Blocks the calling thread; run it on a blocking task.
    pub fn run(&mut self, cancel: &CancellationToken) -> SessionExit {
        let session_id = Uuid::new_v4();
        let span = info_span!("session", id = %session_id);
        let _guard = span.enter();

        if !self.started {
            if let Err(exit) = self.start() {
                self.stats.log_summary();
                return exit;
            }
        }

        let exit = loop {
            if cancel.is_cancelled() {
                break SessionExit::Interrupted;
            }
            if let StepOutcome::Exit(exit) = self.step() {
                break exit;
            }
        };

        self.shutdown(exit);
        exit
    }

    /// One loop iteration: read, annotate and present a frame, then handle
    /// at most one operator command
    pub fn step(&mut self) -> StepOutcome {
        if !self.camera.is_open() {
            // A failed switch leaves no camera open; wait for the operator
            let mut events = Vec::new();
            let exit = self.poll_commands(&mut events);
            self.publish_all(&events);
            if let Some(exit) = exit {
                return StepOutcome::Exit(exit);
            }
            pause(self.policy.pause);
            return StepOutcome::Idle;
        }

        let frame = match self.camera.read() {
            Ok(frame) => frame,
            Err(e) => {
                let consecutive = self.camera.consecutive_failures();
                self.publish_all(&[SessionEvent::ReadFailure { consecutive }]);

                return match self.policy.on_failure(consecutive, &e) {
                    RecoveryAction::Shutdown => StepOutcome::Exit(SessionExit::ReadFailures),
                    RecoveryAction::RetryAfterDelay(delay) => {
                        pause(delay);
                        StepOutcome::ReadFailed { consecutive }
                    }
                };
            }
        };

        let mut report = self.process_frame(frame);
        let exit = self.poll_commands(&mut report.events);
        self.publish_all(&report.events);

        match exit {
            Some(exit) => StepOutcome::Exit(exit),
            None => StepOutcome::Frame(report),
        }
    }

    fn process_frame(&mut self, frame: FrameData) -> FrameReport {
        let (width, height) = self.frame_size;
        let mut image = FrameProcessor::normalize(&frame.image, width, height);
        let now = Instant::now();
        let mut events = Vec::new();

        let hands = match self.detector.detect(&image) {
            Ok(hands) => hands,
            Err(e) => {
                warn!("Hand detection failed on frame {}: {}", frame.id, e);
                events.push(SessionEvent::InferenceFailed {
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };

        if let Some(game) = self.coins.as_mut() {
            events.extend(game.update(now));
            match game.countdown(now) {
                Some(remaining) => self.overlay.draw_game_over(&mut image, remaining),
                None => self.overlay.draw_coin_game(&mut image, game.state()),
            }
        }

        let identities = match self.piano {
            Some(_) => {
                let wrists: Vec<(HandSide, Landmark)> = hands
                    .iter()
                    .map(|hand| (hand.label.mirrored(), hand.wrist()))
                    .collect();
                self.tracker.resolve_identities(&wrists)
            }
            None => Vec::new(),
        };

        let mut total_fingers = 0;
        for (position, hand) in hands.iter().enumerate() {
            // Labels describe the unmirrored image
            let side = hand.label.mirrored();
            let states = compute_finger_states(&hand.landmarks, side);
            let count = count_extended(&states);
            total_fingers += count;

            if let (Some(piano), Some(&identity)) = (self.piano.as_ref(), identities.get(position))
            {
                let transitions = self.tracker.diff(identity, states);
                for (finger, transition) in transitions.into_iter().enumerate() {
                    match transition {
                        Transition::Released => match piano.on_release(side, finger) {
                            NoteOutcome::Dispatched(note) => {
                                events.push(SessionEvent::NotePlayed { side, finger, note })
                            }
                            NoteOutcome::Dropped(note) => {
                                events.push(SessionEvent::NoteDropped { side, finger, note })
                            }
                            NoteOutcome::Unmapped => {}
                        },
                        Transition::Pressed => events.push(SessionEvent::FingerPressed {
                            hand: identity,
                            finger,
                        }),
                        Transition::None => {}
                    }
                }
            }

            if let Some(game) = self.coins.as_mut() {
                let points = contact_points(hand, width, height);
                events.extend(game.register_contacts(&points, now));
            }

            let side_label = self.piano.as_ref().map(|_| side);
            self.overlay.draw_hand(&mut image, hand, count, side_label);
        }

        if self.piano.is_some() && !hands.is_empty() {
            self.tracker.prune(&identities);
        } else {
            self.tracker.reset();
        }

        if self.coins.is_none() {
            self.overlay.draw_totals(&mut image, total_fingers, hands.len());
        }
        self.overlay.draw_camera_status(
            &mut image,
            self.camera.current_index(),
            self.camera.cameras().len(),
        );
        if hands.is_empty() {
            self.overlay.draw_no_hands(&mut image);
        }

        if let Err(e) = self.display.present(&image) {
            warn!("Failed to present frame {}: {}", frame.id, e);
            self.stats.display_errors += 1;
        }

        self.stats.frames += 1;
        self.stats.hands_seen += hands.len() as u64;

        FrameReport {
            frame_id: frame.id,
            hands: hands.len(),
            fingers: total_fingers,
            events,
        }
    }

    /// Poll one command. Returns the exit when the operator quits.
    fn poll_commands(&mut self, events: &mut Vec<SessionEvent>) -> Option<SessionExit> {
        match self.commands.poll()? {
            Command::Quit => {
                events.push(SessionEvent::ShutdownRequested {
                    reason: "quit key pressed".to_string(),
                });
                Some(SessionExit::UserQuit)
            }
            command => {
                self.handle_camera_command(command, events);
                None
            }
        }
    }

    fn handle_camera_command(&mut self, command: Command, events: &mut Vec<SessionEvent>) {
        let count = self.camera.cameras().len();
        if count <= 1 {
            debug!("Ignoring {:?} with {} camera(s)", command, count);
            return;
        }

        let result = match command {
            Command::NextCamera => self.camera.next().cloned(),
            Command::PreviousCamera => self.camera.previous().cloned(),
            Command::SelectCamera(index) if index < count => self.camera.switch_to(index).cloned(),
            Command::SelectCamera(index) => {
                debug!("Ignoring camera {}: only {} available", index, count);
                return;
            }
            Command::Quit => return,
        };

        match result {
            Ok(descriptor) => {
                self.tracker.reset();
                events.push(SessionEvent::CameraSwitched { descriptor });
            }
            Err(e) => events.push(SessionEvent::CameraSwitchFailed {
                index: self.camera.current_index(),
                reason: e.to_string(),
            }),
        }
    }

    fn publish_all(&mut self, events: &[SessionEvent]) {
        for event in events {
            self.stats.record(event);
            self.event_bus.publish(event.clone());
        }
    }

    fn shutdown(&mut self, exit: SessionExit) {
        info!("Stopping session: {}", exit);

        self.camera.release();
        self.tracker.reset();

        if let Some(piano) = &self.piano {
            let active = piano.active_voices();
            if active > 0 {
                debug!("{} note(s) still playing at shutdown", active);
            }
        }

        let display_stats = self.display.stats();
        debug!(
            "Display {}: {} frames presented, {} errors",
            self.display.name(),
            display_stats.frames_presented,
            display_stats.present_errors
        );
        self.stats.log_summary();
    }

    /// Cancel `cancel` on SIGINT or SIGTERM. Must be called inside a tokio
    /// runtime.
    pub fn spawn_signal_handlers(cancel: CancellationToken) {
        // Handle SIGTERM (service stop) - Unix only
        #[cfg(unix)]
        {
            let cancel_sigterm = cancel.clone();
            tokio::spawn(async move {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        if sigterm.recv().await.is_some() {
                            info!("Received SIGTERM signal");
                            cancel_sigterm.cancel();
                        }
                    }
                    Err(e) => warn!("Failed to register SIGTERM handler: {}", e),
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                cancel.cancel();
            }
        });
    }
}

/// Landmark pixels truncated to whole coordinates for contact tests
fn contact_points(hand: &DetectedHand, width: u32, height: u32) -> Vec<(f32, f32)> {
    hand.pixel_points(width, height)
        .into_iter()
        .map(|(x, y)| (x.trunc(), y.trunc()))
        .collect()
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
