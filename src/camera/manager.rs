use super::backend::{CameraDescriptor, CaptureDriver, CaptureHandle, CaptureSettings};
use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::frame::FrameData;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// The currently open capture handle and its read bookkeeping
pub struct CaptureSession {
    descriptor: CameraDescriptor,
    handle: Box<dyn CaptureHandle>,
    consecutive_failures: u32,
}

impl CaptureSession {
    pub fn descriptor(&self) -> &CameraDescriptor {
        &self.descriptor
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

/// Discovers cameras and owns the single active capture session
pub struct CameraManager {
    driver: Box<dyn CaptureDriver>,
    settings: CaptureSettings,
    max_devices: u32,
    release_settle: Duration,
    open_settle: Duration,
    cameras: Vec<CameraDescriptor>,
    current_index: usize,
    session: Option<CaptureSession>,
    frame_counter: u64,
}

impl CameraManager {
    pub fn new(
        driver: Box<dyn CaptureDriver>,
        config: &CameraConfig,
        resolution: (u32, u32),
    ) -> Self {
        info!(
            "Initializing camera manager with {} driver ({}x{}, buffer depth {})",
            driver.name(),
            resolution.0,
            resolution.1,
            config.buffer_depth
        );

        Self {
            driver,
            settings: CaptureSettings {
                width: resolution.0,
                height: resolution.1,
                buffer_depth: config.buffer_depth,
                read_timeout: config.read_timeout(),
            },
            max_devices: config.max_devices,
            release_settle: config.release_settle(),
            open_settle: config.open_settle(),
            cameras: Vec::new(),
            current_index: 0,
            session: None,
            frame_counter: 0,
        }
    }

    /// Try every device index against the driver's backends in preference
    /// order. The first backend that opens and delivers a frame wins for that
    /// index; failures are skipped.
    pub fn enumerate(&mut self) -> Vec<CameraDescriptor> {
        info!("Scanning for available cameras");
        let backends = self.driver.backends();
        let mut found = Vec::new();

        for device_index in 0..self.max_devices {
            for backend in &backends {
                let mut handle = match self.driver.open(device_index, backend, &self.settings) {
                    Ok(handle) => handle,
                    Err(e) => {
                        debug!("Camera {} via {} unavailable: {}", device_index, backend.name, e);
                        continue;
                    }
                };

                let first_frame = handle.read_frame();
                handle.release();

                match first_frame {
                    Ok(_) => {
                        let descriptor = CameraDescriptor::new(device_index, backend);
                        info!("Camera {} found using {}", device_index, backend.name);
                        found.push(descriptor);
                        break;
                    }
                    Err(e) => {
                        debug!(
                            "Camera {} via {} opened but delivered no frame: {}",
                            device_index, backend.name, e
                        );
                    }
                }
            }
        }

        self.cameras = found.clone();
        self.current_index = 0;
        found
    }

    /// Open a descriptor, releasing any current handle first
    pub fn open(&mut self, descriptor: &CameraDescriptor) -> Result<(), CameraError> {
        if self.release() {
            settle(self.release_settle);
        }

        let backend = descriptor.backend();
        let handle = self
            .driver
            .open(descriptor.device_index, &backend, &self.settings)?;

        settle(self.open_settle);

        info!("Opened {}", descriptor);
        self.session = Some(CaptureSession {
            descriptor: descriptor.clone(),
            handle,
            consecutive_failures: 0,
        });
        Ok(())
    }

    /// Release the current handle. Returns whether anything was open.
    pub fn release(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                session.handle.release();
                debug!("Released {}", session.descriptor);
                true
            }
            None => false,
        }
    }

    /// Pull the next frame from the active session
    pub fn read(&mut self) -> Result<FrameData, CameraError> {
        let session = self.session.as_mut().ok_or(CameraError::NotOpen)?;

        match session.handle.read_frame() {
            Ok(image) => {
                session.consecutive_failures = 0;
                self.frame_counter += 1;
                trace!("Read frame {} from {}", self.frame_counter, session.descriptor);
                Ok(FrameData::new(self.frame_counter, image))
            }
            Err(e) => {
                session.consecutive_failures += 1;
                debug!(
                    "Frame read failed on {} ({} consecutive): {}",
                    session.descriptor, session.consecutive_failures, e
                );
                Err(e)
            }
        }
    }

    /// Release the current camera and open the discovered camera at `index`.
    /// On failure the session stays released.
    pub fn switch_to(&mut self, index: usize) -> Result<&CameraDescriptor, CameraError> {
        let descriptor = self
            .cameras
            .get(index)
            .cloned()
            .ok_or(CameraError::IndexOutOfRange {
                index,
                available: self.cameras.len(),
            })?;

        self.current_index = index;

        match self.open(&descriptor) {
            Ok(()) => {
                info!("Switched to {}", descriptor);
                Ok(&self.cameras[index])
            }
            Err(e) => {
                warn!("Could not switch to {}: {}", descriptor, e);
                Err(e)
            }
        }
    }

    /// Cycle forward through discovered cameras
    pub fn next(&mut self) -> Result<&CameraDescriptor, CameraError> {
        let count = self.camera_count_nonzero()?;
        self.switch_to((self.current_index + 1) % count)
    }

    /// Cycle backward through discovered cameras
    pub fn previous(&mut self) -> Result<&CameraDescriptor, CameraError> {
        let count = self.camera_count_nonzero()?;
        self.switch_to((self.current_index + count - 1) % count)
    }

    fn camera_count_nonzero(&self) -> Result<usize, CameraError> {
        match self.cameras.len() {
            0 => Err(CameraError::IndexOutOfRange {
                index: 0,
                available: 0,
            }),
            count => Ok(count),
        }
    }

    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.cameras
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.session
            .as_ref()
            .map(|s| s.consecutive_failures)
            .unwrap_or(0)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
