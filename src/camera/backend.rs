use crate::error::CameraError;
use image::RgbImage;
use std::fmt;
use std::time::Duration;

/// Identifier of a capture backend within a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendId(pub u32);

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A capture backend a driver can open devices through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureBackend {
    pub id: BackendId,
    pub name: String,
}

impl CaptureBackend {
    pub fn new<S: Into<String>>(id: u32, name: S) -> Self {
        Self {
            id: BackendId(id),
            name: name.into(),
        }
    }
}

/// A (device, backend) pair known to deliver frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDescriptor {
    pub device_index: u32,
    pub backend_id: BackendId,
    pub backend_name: String,
}

impl CameraDescriptor {
    pub fn new(device_index: u32, backend: &CaptureBackend) -> Self {
        Self {
            device_index,
            backend_id: backend.id,
            backend_name: backend.name.clone(),
        }
    }

    pub fn backend(&self) -> CaptureBackend {
        CaptureBackend {
            id: self.backend_id,
            name: self.backend_name.clone(),
        }
    }
}

impl fmt::Display for CameraDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "camera {} ({})", self.device_index, self.backend_name)
    }
}

/// Parameters applied when a capture handle is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    /// Frames the handle may queue internally; 1 keeps latency minimal
    pub buffer_depth: u32,
    pub read_timeout: Duration,
}

/// An open capture device
pub trait CaptureHandle: Send {
    /// Pull the next frame
    fn read_frame(&mut self) -> Result<RgbImage, CameraError>;

    /// Release the underlying device. Must be idempotent.
    fn release(&mut self);
}

/// Opens capture handles for (device, backend) pairs
pub trait CaptureDriver: Send {
    fn name(&self) -> &str;

    /// Backends in preference order
    fn backends(&self) -> Vec<CaptureBackend>;

    fn open(
        &mut self,
        device_index: u32,
        backend: &CaptureBackend,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureHandle>, CameraError>;
}
