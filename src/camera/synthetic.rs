use super::backend::{CaptureBackend, CaptureDriver, CaptureHandle, CaptureSettings};
use crate::error::CameraError;
use image::{Rgb, RgbImage};
use tracing::{info, trace};

/// Test-pattern driver exposing a single device, for running without
/// camera hardware
pub struct SyntheticDriver;

impl SyntheticDriver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SyntheticDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDriver for SyntheticDriver {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn backends(&self) -> Vec<CaptureBackend> {
        vec![CaptureBackend::new(0, "Test pattern")]
    }

    fn open(
        &mut self,
        device_index: u32,
        backend: &CaptureBackend,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureHandle>, CameraError> {
        if device_index != 0 {
            return Err(CameraError::DeviceOpen {
                device: device_index,
                backend: backend.name.clone(),
                details: "synthetic driver only provides device 0".to_string(),
            });
        }

        info!(
            "Synthetic capture opened ({}x{})",
            settings.width, settings.height
        );

        Ok(Box::new(SyntheticHandle {
            width: settings.width.max(1),
            height: settings.height.max(1),
            frame_id: 0,
        }))
    }
}

struct SyntheticHandle {
    width: u32,
    height: u32,
    frame_id: u64,
}

impl CaptureHandle for SyntheticHandle {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        self.frame_id += 1;
        let shift = (self.frame_id % 256) as u32;
        let (width, height) = (self.width, self.height);

        let image = RgbImage::from_fn(width, height, |x, y| {
            let r = ((x * 255) / width + shift) % 256;
            let g = (y * 255) / height;
            let b = ((x + y) * 127) / (width + height);
            Rgb([r as u8, g as u8, b as u8])
        });

        trace!("Generated synthetic frame {}", self.frame_id);
        Ok(image)
    }

    fn release(&mut self) {}
}
