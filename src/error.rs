use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FingerplayError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl FingerplayError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("Failed to open camera device {device} via {backend}: {details}")]
    DeviceOpen {
        device: u32,
        backend: String,
        details: String,
    },

    #[error("Camera configuration failed: {details}")]
    Configuration { details: String },

    #[error("Capture stream error: {details}")]
    CaptureStream { details: String },

    #[error("No frame received within {timeout:?}")]
    FrameTimeout { timeout: Duration },

    #[error("No capture handle is open")]
    NotOpen,

    #[error("Camera index {index} out of range ({available} available)")]
    IndexOutOfRange { index: usize, available: usize },

    #[error("Capture driver '{driver}' is not available in this build")]
    DriverUnavailable { driver: String },
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Failed to start inference helper: {details}")]
    Startup { details: String },

    #[error("Inference helper protocol error: {details}")]
    Protocol { details: String },

    #[error("Inference helper I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed inference response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Inference helper reported: {0}")]
    Remote(String),
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Framebuffer error on {device}: {source}")]
    Framebuffer {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Format conversion failed: {details}")]
    FormatConversion { details: String },
}

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No default audio output device")]
    NoDevice,

    #[error("Failed to build output stream: {details}")]
    Stream { details: String },

    #[error("Audio output is not available in this build")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, FingerplayError>;
