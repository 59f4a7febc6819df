use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FingerplayConfig {
    pub games: GamesConfig,
    pub inference: InferenceConfig,
    pub display: DisplayConfig,
    pub camera: CameraConfig,
    pub gesture: GestureConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GamesConfig {
    /// Play a note whenever a finger curls
    #[serde(default)]
    pub piano_game: bool,

    /// Run the coin collection game
    #[serde(default)]
    pub coins_game: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InferenceConfig {
    /// Ask the inference helper to use the GPU delegate
    #[serde(default)]
    pub gpu_mode: bool,

    /// Python interpreter used to launch the helper
    #[serde(default = "default_python")]
    pub python: String,

    /// Hand detection helper script
    #[serde(default = "default_script")]
    pub script: String,

    /// Minimum handedness score for a detection to be kept
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Maximum number of hands the helper should report
    #[serde(default = "default_max_hands")]
    pub max_hands: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayOutput {
    Framebuffer,
    Headless,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Width every frame is resized to; game coordinates use this space
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Height every frame is resized to
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default = "default_display_output")]
    pub output: DisplayOutput,

    /// Framebuffer device path
    #[serde(default = "default_framebuffer_device")]
    pub framebuffer_device: String,

    /// Framebuffer resolution (width, height)
    #[serde(default = "default_framebuffer_resolution")]
    pub framebuffer_resolution: (u32, u32),

    /// TrueType font used for overlay text
    #[serde(default = "default_font_path")]
    pub font_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaptureDriverKind {
    /// GStreamer when this build includes it, otherwise the test pattern
    Auto,
    Gstreamer,
    Synthetic,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    #[serde(default = "default_capture_driver")]
    pub driver: CaptureDriverKind,

    /// Device indices tried during enumeration are 0..max_devices
    #[serde(default = "default_max_devices")]
    pub max_devices: u32,

    /// Internal buffer depth requested from the capture handle
    #[serde(default = "default_buffer_depth")]
    pub buffer_depth: u32,

    #[serde(default = "default_release_settle_ms")]
    pub release_settle_ms: u64,

    #[serde(default = "default_open_settle_ms")]
    pub open_settle_ms: u64,

    /// Pause before reopening a camera that opened but could not deliver
    #[serde(default = "default_reinit_delay_ms")]
    pub reinit_delay_ms: u64,

    /// Consecutive read failures that end the session
    #[serde(default = "default_read_failure_threshold")]
    pub read_failure_threshold: u32,

    #[serde(default = "default_read_failure_pause_ms")]
    pub read_failure_pause_ms: u64,

    /// Per-read timeout for pull-based drivers
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategyKind {
    Slot,
    NearestWrist,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GestureConfig {
    #[serde(default = "default_identity")]
    pub identity: IdentityStrategyKind,

    /// Normalized wrist distance under which two frames' hands are the same hand
    #[serde(default = "default_wrist_match_distance")]
    pub wrist_match_distance: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_note_duration_ms")]
    pub note_duration_ms: u64,

    /// Concurrent note limit, 0 for unbounded
    #[serde(default = "default_max_voices")]
    pub max_voices: usize,
}

impl CameraConfig {
    pub fn release_settle(&self) -> Duration {
        Duration::from_millis(self.release_settle_ms)
    }

    pub fn open_settle(&self) -> Duration {
        Duration::from_millis(self.open_settle_ms)
    }

    pub fn reinit_delay(&self) -> Duration {
        Duration::from_millis(self.reinit_delay_ms)
    }

    pub fn read_failure_pause(&self) -> Duration {
        Duration::from_millis(self.read_failure_pause_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl AudioConfig {
    pub fn note_duration(&self) -> Duration {
        Duration::from_millis(self.note_duration_ms)
    }
}

impl FingerplayConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("games.piano_game", defaults.games.piano_game)?
            .set_default("games.coins_game", defaults.games.coins_game)?
            .set_default("inference.gpu_mode", defaults.inference.gpu_mode)?
            .set_default("inference.python", defaults.inference.python.clone())?
            .set_default("inference.script", defaults.inference.script.clone())?
            .set_default(
                "inference.min_confidence",
                defaults.inference.min_confidence as f64,
            )?
            .set_default("inference.max_hands", defaults.inference.max_hands)?
            .set_default("display.window_width", defaults.display.window_width)?
            .set_default("display.window_height", defaults.display.window_height)?
            .set_default("display.output", "framebuffer")?
            .set_default(
                "display.framebuffer_device",
                defaults.display.framebuffer_device.clone(),
            )?
            .set_default(
                "display.framebuffer_resolution",
                vec![
                    defaults.display.framebuffer_resolution.0,
                    defaults.display.framebuffer_resolution.1,
                ],
            )?
            .set_default("display.font_path", defaults.display.font_path.clone())?
            .set_default("camera.driver", "auto")?
            .set_default("camera.max_devices", defaults.camera.max_devices)?
            .set_default("camera.buffer_depth", defaults.camera.buffer_depth)?
            .set_default("camera.release_settle_ms", defaults.camera.release_settle_ms)?
            .set_default("camera.open_settle_ms", defaults.camera.open_settle_ms)?
            .set_default("camera.reinit_delay_ms", defaults.camera.reinit_delay_ms)?
            .set_default(
                "camera.read_failure_threshold",
                defaults.camera.read_failure_threshold,
            )?
            .set_default(
                "camera.read_failure_pause_ms",
                defaults.camera.read_failure_pause_ms,
            )?
            .set_default("camera.read_timeout_ms", defaults.camera.read_timeout_ms)?
            .set_default("gesture.identity", "slot")?
            .set_default(
                "gesture.wrist_match_distance",
                defaults.gesture.wrist_match_distance as f64,
            )?
            .set_default("audio.sample_rate", defaults.audio.sample_rate)?
            .set_default("audio.note_duration_ms", defaults.audio.note_duration_ms)?
            .set_default("audio.max_voices", defaults.audio.max_voices as u64)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables with FINGERPLAY_ prefix, e.g. FINGERPLAY_GAMES__PIANO_GAME
            .add_source(
                Environment::with_prefix("FINGERPLAY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: FingerplayConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.display.window_width == 0 || self.display.window_height == 0 {
            return Err(ConfigError::Message(
                "Window dimensions must be greater than 0".to_string(),
            ));
        }

        if self.display.framebuffer_resolution.0 == 0 || self.display.framebuffer_resolution.1 == 0
        {
            return Err(ConfigError::Message(
                "Framebuffer resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.max_devices == 0 {
            return Err(ConfigError::Message(
                "Camera max_devices must be greater than 0".to_string(),
            ));
        }

        if self.camera.buffer_depth == 0 {
            return Err(ConfigError::Message(
                "Camera buffer_depth must be greater than 0".to_string(),
            ));
        }

        if self.camera.read_failure_threshold == 0 {
            return Err(ConfigError::Message(
                "Camera read_failure_threshold must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.inference.min_confidence) {
            return Err(ConfigError::Message(
                "Inference min_confidence must be within 0.0..=1.0".to_string(),
            ));
        }

        if self.inference.max_hands == 0 {
            return Err(ConfigError::Message(
                "Inference max_hands must be greater than 0".to_string(),
            ));
        }

        if self.gesture.wrist_match_distance <= 0.0 {
            return Err(ConfigError::Message(
                "Gesture wrist_match_distance must be positive".to_string(),
            ));
        }

        if self.audio.sample_rate == 0 || self.audio.note_duration_ms == 0 {
            return Err(ConfigError::Message(
                "Audio sample_rate and note_duration_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Default configuration rendered as TOML
    pub fn default_toml() -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}

/// Outcome of reconciling an on-disk config file with the defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFileStatus {
    Created,
    Updated,
    Unchanged,
}

/// Make sure the config file exists and carries every known key.
///
/// Missing files are created from the defaults. Existing files get legacy
/// top-level `piano_game`/`coins_game` keys moved under `[games]` and any
/// missing key backfilled; keys this build does not know are left in place.
pub fn ensure_config_file<P: AsRef<Path>>(path: P) -> crate::error::Result<ConfigFileStatus> {
    let path = path.as_ref();
    let defaults = match toml::Value::try_from(FingerplayConfig::default())? {
        toml::Value::Table(table) => table,
        _ => {
            return Err(crate::error::FingerplayError::system(
                "Default configuration did not serialize to a table",
            ))
        }
    };

    if !path.exists() {
        std::fs::write(path, toml::to_string_pretty(&defaults)?)?;
        info!("Configuration file created: {}", path.display());
        return Ok(ConfigFileStatus::Created);
    }

    let contents = std::fs::read_to_string(path)?;
    let mut table: toml::Table = match contents.parse() {
        Ok(table) => table,
        Err(e) => {
            warn!(
                "Configuration file {} is not valid TOML ({}), leaving it untouched",
                path.display(),
                e
            );
            return Ok(ConfigFileStatus::Unchanged);
        }
    };

    let migrated = migrate_legacy_game_keys(&mut table);
    let backfilled = backfill(&mut table, &defaults);

    if migrated || backfilled {
        std::fs::write(path, toml::to_string_pretty(&table)?)?;
        info!("Configuration file updated with missing fields: {}", path.display());
        Ok(ConfigFileStatus::Updated)
    } else {
        Ok(ConfigFileStatus::Unchanged)
    }
}

fn migrate_legacy_game_keys(table: &mut toml::Table) -> bool {
    if table.contains_key("games") {
        return false;
    }

    let mut games = toml::Table::new();
    for key in ["piano_game", "coins_game"] {
        if let Some(value) = table.remove(key) {
            games.insert(key.to_string(), value);
        }
    }

    if games.is_empty() {
        return false;
    }

    debug!("Migrating legacy top-level game toggles into [games]");
    table.insert("games".to_string(), toml::Value::Table(games));
    true
}

fn backfill(target: &mut toml::Table, defaults: &toml::Table) -> bool {
    let mut changed = false;

    for (key, default_value) in defaults {
        match target.get_mut(key) {
            None => {
                target.insert(key.clone(), default_value.clone());
                changed = true;
            }
            Some(toml::Value::Table(existing)) => {
                if let toml::Value::Table(default_table) = default_value {
                    changed |= backfill(existing, default_table);
                }
            }
            Some(_) => {}
        }
    }

    changed
}

impl Default for FingerplayConfig {
    fn default() -> Self {
        Self {
            games: GamesConfig {
                piano_game: false,
                coins_game: false,
            },
            inference: InferenceConfig {
                gpu_mode: false,
                python: default_python(),
                script: default_script(),
                min_confidence: default_min_confidence(),
                max_hands: default_max_hands(),
            },
            display: DisplayConfig {
                window_width: default_window_width(),
                window_height: default_window_height(),
                output: default_display_output(),
                framebuffer_device: default_framebuffer_device(),
                framebuffer_resolution: default_framebuffer_resolution(),
                font_path: default_font_path(),
            },
            camera: CameraConfig {
                driver: default_capture_driver(),
                max_devices: default_max_devices(),
                buffer_depth: default_buffer_depth(),
                release_settle_ms: default_release_settle_ms(),
                open_settle_ms: default_open_settle_ms(),
                reinit_delay_ms: default_reinit_delay_ms(),
                read_failure_threshold: default_read_failure_threshold(),
                read_failure_pause_ms: default_read_failure_pause_ms(),
                read_timeout_ms: default_read_timeout_ms(),
            },
            gesture: GestureConfig {
                identity: default_identity(),
                wrist_match_distance: default_wrist_match_distance(),
            },
            audio: AudioConfig {
                sample_rate: default_sample_rate(),
                note_duration_ms: default_note_duration_ms(),
                max_voices: default_max_voices(),
            },
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        FingerplayConfig::default().inference
    }
}

// Default value functions
fn default_python() -> String {
    "python3".to_string()
}
fn default_script() -> String {
    "scripts/hand_detect.py".to_string()
}
fn default_min_confidence() -> f32 {
    0.5
}
fn default_max_hands() -> u32 {
    2
}

fn default_window_width() -> u32 {
    960
}
fn default_window_height() -> u32 {
    720
}
fn default_display_output() -> DisplayOutput {
    DisplayOutput::Framebuffer
}
fn default_framebuffer_device() -> String {
    "/dev/fb0".to_string()
}
fn default_framebuffer_resolution() -> (u32, u32) {
    (960, 720)
}
fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}

fn default_capture_driver() -> CaptureDriverKind {
    CaptureDriverKind::Auto
}
fn default_max_devices() -> u32 {
    10
}
fn default_buffer_depth() -> u32 {
    1
}
fn default_release_settle_ms() -> u64 {
    200
}
fn default_open_settle_ms() -> u64 {
    300
}
fn default_reinit_delay_ms() -> u64 {
    1000
}
fn default_read_failure_threshold() -> u32 {
    10
}
fn default_read_failure_pause_ms() -> u64 {
    100
}
fn default_read_timeout_ms() -> u64 {
    500
}

fn default_identity() -> IdentityStrategyKind {
    IdentityStrategyKind::Slot
}
fn default_wrist_match_distance() -> f32 {
    0.15
}

fn default_sample_rate() -> u32 {
    22050
}
fn default_note_duration_ms() -> u64 {
    200
}
fn default_max_voices() -> usize {
    16
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = FingerplayConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.games.piano_game);
        assert!(!config.games.coins_game);
        assert_eq!(config.display.window_width, 960);
        assert_eq!(config.display.window_height, 720);
        assert_eq!(config.camera.read_failure_threshold, 10);
    }

    #[test]
    fn test_config_validation() {
        let mut config = FingerplayConfig::default();
        config.display.window_width = 0;
        assert!(config.validate().is_err());

        config.display.window_width = 640;
        assert!(config.validate().is_ok());

        config.inference.min_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_merges_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fingerplay.toml");
        std::fs::write(
            &path,
            "[games]\npiano_game = true\n\n[display]\nwindow_width = 640\n",
        )
        .unwrap();

        let config = FingerplayConfig::load_from_file(&path).unwrap();
        assert!(config.games.piano_game);
        assert!(!config.games.coins_game);
        assert_eq!(config.display.window_width, 640);
        assert_eq!(config.display.window_height, 720);
        assert_eq!(config.gesture.identity, IdentityStrategyKind::Slot);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = FingerplayConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, FingerplayConfig::default());
    }

    #[test]
    fn test_ensure_config_file_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fingerplay.toml");

        assert_eq!(ensure_config_file(&path).unwrap(), ConfigFileStatus::Created);
        let config = FingerplayConfig::load_from_file(&path).unwrap();
        assert_eq!(config, FingerplayConfig::default());

        assert_eq!(ensure_config_file(&path).unwrap(), ConfigFileStatus::Unchanged);
    }

    #[test]
    fn test_ensure_config_file_backfills_and_keeps_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fingerplay.toml");
        std::fs::write(
            &path,
            "theme = \"dark\"\n\n[games]\ncoins_game = true\n\n[display]\nwindow_width = 800\nbezel = 4\n",
        )
        .unwrap();

        assert_eq!(ensure_config_file(&path).unwrap(), ConfigFileStatus::Updated);

        let table: toml::Table = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(table["theme"].as_str(), Some("dark"));
        assert_eq!(table["display"]["bezel"].as_integer(), Some(4));
        assert_eq!(table["display"]["window_width"].as_integer(), Some(800));
        assert_eq!(table["display"]["window_height"].as_integer(), Some(720));
        assert_eq!(table["games"]["coins_game"].as_bool(), Some(true));
        assert_eq!(table["games"]["piano_game"].as_bool(), Some(false));
        assert!(table.contains_key("audio"));
    }

    #[test]
    fn test_ensure_config_file_migrates_legacy_toggles() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fingerplay.toml");
        std::fs::write(&path, "piano_game = true\n").unwrap();

        ensure_config_file(&path).unwrap();

        let config = FingerplayConfig::load_from_file(&path).unwrap();
        assert!(config.games.piano_game);
        assert!(!config.games.coins_game);

        let table: toml::Table = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert!(!table.contains_key("piano_game"));
    }

    #[test]
    fn test_default_toml_round_trips() {
        let rendered = FingerplayConfig::default_toml().unwrap();
        let parsed: FingerplayConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, FingerplayConfig::default());
    }
}
