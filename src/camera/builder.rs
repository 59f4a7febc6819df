use super::backend::CaptureDriver;
use super::manager::CameraManager;
use super::synthetic::SyntheticDriver;
use crate::config::{CameraConfig, CaptureDriverKind};
use crate::error::{CameraError, FingerplayError, Result};
#[cfg(not(all(feature = "camera", target_os = "linux")))]
use tracing::warn;

/// Builder for the camera manager
pub struct CameraManagerBuilder {
    config: Option<CameraConfig>,
    driver: Option<Box<dyn CaptureDriver>>,
    resolution: Option<(u32, u32)>,
}

impl CameraManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            driver: None,
            resolution: None,
        }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn driver(mut self, driver: Box<dyn CaptureDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Some((width, height));
        self
    }

    pub fn build(self) -> Result<CameraManager> {
        let config = self
            .config
            .ok_or_else(|| FingerplayError::system("Camera configuration must be specified"))?;

        let resolution = self
            .resolution
            .ok_or_else(|| FingerplayError::system("Capture resolution must be specified"))?;

        let driver = match self.driver {
            Some(driver) => driver,
            None => create_driver(config.driver)?,
        };

        Ok(CameraManager::new(driver, &config, resolution))
    }
}

impl Default for CameraManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Instantiate the capture driver selected in configuration
pub fn create_driver(kind: CaptureDriverKind) -> std::result::Result<Box<dyn CaptureDriver>, CameraError> {
    match kind {
        #[cfg(all(feature = "camera", target_os = "linux"))]
        CaptureDriverKind::Auto => create_driver(CaptureDriverKind::Gstreamer),
        #[cfg(not(all(feature = "camera", target_os = "linux")))]
        CaptureDriverKind::Auto => {
            warn!("Built without the camera feature; using the synthetic test pattern");
            Ok(Box::new(SyntheticDriver::new()))
        }
        CaptureDriverKind::Synthetic => Ok(Box::new(SyntheticDriver::new())),
        #[cfg(all(feature = "camera", target_os = "linux"))]
        CaptureDriverKind::Gstreamer => Ok(Box::new(super::gst_capture::GstreamerDriver::new()?)),
        #[cfg(not(all(feature = "camera", target_os = "linux")))]
        CaptureDriverKind::Gstreamer => Err(CameraError::DriverUnavailable {
            driver: "gstreamer".to_string(),
        }),
    }
}
