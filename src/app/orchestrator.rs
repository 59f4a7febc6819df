use super::stats::SessionStats;
use crate::camera::CameraManager;
use crate::coins::CoinGame;
use crate::config::FingerplayConfig;
use crate::display::{DisplaySurface, HeadlessDisplay};
use crate::error::{FingerplayError, Result};
use crate::events::EventBus;
use crate::gesture::{GestureTracker, IdentityStrategy};
use crate::hands::HandDetector;
use crate::keyboard_input::{CommandSource, ScriptedCommands};
use crate::overlay::OverlayRenderer;
use crate::piano::{AudioSink, NullAudioSink, PianoEngine};
use crate::recovery::ReadFailurePolicy;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

const EVENT_BUS_CAPACITY: usize = 256;

/// Owns every per-session component and drives them one frame at a time
pub struct SessionOrchestrator {
    pub(super) config: FingerplayConfig,
    pub(super) frame_size: (u32, u32),
    pub(super) reinit_delay: Duration,

    // Components
    pub(super) camera: CameraManager,
    pub(super) detector: Box<dyn HandDetector>,
    pub(super) tracker: GestureTracker,
    pub(super) piano: Option<PianoEngine>,
    pub(super) coins: Option<CoinGame>,
    pub(super) overlay: OverlayRenderer,
    pub(super) display: Box<dyn DisplaySurface>,
    pub(super) commands: Box<dyn CommandSource>,

    pub(super) event_bus: EventBus,
    pub(super) policy: ReadFailurePolicy,
    pub(super) stats: SessionStats,
    pub(super) started: bool,
}

impl SessionOrchestrator {
    pub fn builder(config: FingerplayConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    pub fn config(&self) -> &FingerplayConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraManager {
        &self.camera
    }

    pub fn tracker(&self) -> &GestureTracker {
        &self.tracker
    }

    pub fn coin_game(&self) -> Option<&CoinGame> {
        self.coins.as_ref()
    }

    pub fn piano(&self) -> Option<&PianoEngine> {
        self.piano.as_ref()
    }

    pub fn display(&self) -> &dyn DisplaySurface {
        self.display.as_ref()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

/// Assembles a [`SessionOrchestrator`]. The camera manager and the hand
/// detector are required; everything else has a quiet default.
pub struct SessionBuilder {
    config: FingerplayConfig,
    camera: Option<CameraManager>,
    detector: Option<Box<dyn HandDetector>>,
    display: Option<Box<dyn DisplaySurface>>,
    commands: Option<Box<dyn CommandSource>>,
    audio_sink: Option<Arc<dyn AudioSink>>,
    overlay: Option<OverlayRenderer>,
    event_bus: Option<EventBus>,
    coin_seed: Option<u64>,
}

impl SessionBuilder {
    pub fn new(config: FingerplayConfig) -> Self {
        Self {
            config,
            camera: None,
            detector: None,
            display: None,
            commands: None,
            audio_sink: None,
            overlay: None,
            event_bus: None,
            coin_seed: None,
        }
    }

    pub fn camera(mut self, camera: CameraManager) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn detector(mut self, detector: Box<dyn HandDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn display(mut self, display: Box<dyn DisplaySurface>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn commands(mut self, commands: Box<dyn CommandSource>) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn audio_sink(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.audio_sink = Some(sink);
        self
    }

    pub fn overlay(mut self, overlay: OverlayRenderer) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Seed the coin game's spawn positions and launch direction
    pub fn coin_seed(mut self, seed: u64) -> Self {
        self.coin_seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<SessionOrchestrator> {
        let camera = self
            .camera
            .ok_or_else(|| FingerplayError::system("Camera manager must be specified"))?;
        let detector = self
            .detector
            .ok_or_else(|| FingerplayError::system("Hand detector must be specified"))?;

        let config = self.config;
        let frame_size = (config.display.window_width, config.display.window_height);

        let piano = config.games.piano_game.then(|| {
            let sink = self
                .audio_sink
                .unwrap_or_else(|| Arc::new(NullAudioSink));
            PianoEngine::new(sink, &config.audio)
        });

        let coins = config.games.coins_game.then(|| {
            let rng = match self.coin_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            CoinGame::with_rng(frame_size.0, frame_size.1, rng, Instant::now())
        });

        let overlay = self
            .overlay
            .unwrap_or_else(|| OverlayRenderer::load(&config.display.font_path));

        info!(
            "Session configured: piano {}, coins {}, {}x{} frames",
            if piano.is_some() { "on" } else { "off" },
            if coins.is_some() { "on" } else { "off" },
            frame_size.0,
            frame_size.1
        );

        Ok(SessionOrchestrator {
            frame_size,
            reinit_delay: config.camera.reinit_delay(),
            camera,
            detector,
            tracker: GestureTracker::new(IdentityStrategy::from(&config.gesture)),
            piano,
            coins,
            overlay,
            display: self
                .display
                .unwrap_or_else(|| Box::new(HeadlessDisplay::new())),
            commands: self
                .commands
                .unwrap_or_else(|| Box::new(ScriptedCommands::new())),
            event_bus: self
                .event_bus
                .unwrap_or_else(|| EventBus::new(EVENT_BUS_CAPACITY)),
            policy: ReadFailurePolicy::from(&config.camera),
            stats: SessionStats::new(),
            started: false,
            config,
        })
    }
}
