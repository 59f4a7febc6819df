use super::backend::{BackendId, CaptureBackend, CaptureDriver, CaptureHandle, CaptureSettings};
use crate::error::CameraError;
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Driver call recorded by [`MockCaptureDriver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCameraCall {
    Open { device: u32, backend: BackendId },
    Release { device: u32, backend: BackendId },
    Read { device: u32, backend: BackendId, ok: bool },
}

#[derive(Debug, Default)]
struct MockCameraState {
    working: HashSet<(u32, BackendId)>,
    silent: HashSet<(u32, BackendId)>,
    read_script: VecDeque<bool>,
    calls: Vec<MockCameraCall>,
    open_handles: usize,
}

/// Scripted capture driver for running the camera manager and the session
/// loop without hardware. Clones share state, so a test can keep one clone
/// to script reads after handing the other to the manager.
#[derive(Clone)]
pub struct MockCaptureDriver {
    backends: Vec<CaptureBackend>,
    state: Arc<Mutex<MockCameraState>>,
}

impl MockCaptureDriver {
    pub fn new(backends: Vec<CaptureBackend>) -> Self {
        Self {
            backends,
            state: Arc::new(Mutex::new(MockCameraState::default())),
        }
    }

    /// Four backends named after common capture APIs
    pub fn with_default_backends() -> Self {
        Self::new(vec![
            CaptureBackend::new(0, "DirectShow"),
            CaptureBackend::new(1, "Media Foundation"),
            CaptureBackend::new(2, "V4L2"),
            CaptureBackend::new(3, "Any"),
        ])
    }

    /// Let `device` open and deliver frames through `backend`
    pub fn add_working(&self, device: u32, backend: u32) -> &Self {
        self.state.lock().working.insert((device, BackendId(backend)));
        self
    }

    /// Let `device` open through `backend` but never deliver a frame
    pub fn add_silent(&self, device: u32, backend: u32) -> &Self {
        self.state.lock().silent.insert((device, BackendId(backend)));
        self
    }

    /// Stop `device` from opening through `backend`
    pub fn remove_working(&self, device: u32, backend: u32) -> &Self {
        self.state.lock().working.remove(&(device, BackendId(backend)));
        self
    }

    /// Queue read outcomes; reads succeed once the script is exhausted
    pub fn script_reads<I: IntoIterator<Item = bool>>(&self, outcomes: I) -> &Self {
        self.state.lock().read_script.extend(outcomes);
        self
    }

    pub fn calls(&self) -> Vec<MockCameraCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }
}

impl CaptureDriver for MockCaptureDriver {
    fn name(&self) -> &str {
        "mock"
    }

    fn backends(&self) -> Vec<CaptureBackend> {
        self.backends.clone()
    }

    fn open(
        &mut self,
        device_index: u32,
        backend: &CaptureBackend,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureHandle>, CameraError> {
        let key = (device_index, backend.id);
        let mut state = self.state.lock();

        let readable = state.working.contains(&key);
        if !readable && !state.silent.contains(&key) {
            return Err(CameraError::DeviceOpen {
                device: device_index,
                backend: backend.name.clone(),
                details: "no such mock device".to_string(),
            });
        }

        state.calls.push(MockCameraCall::Open {
            device: device_index,
            backend: backend.id,
        });
        state.open_handles += 1;

        Ok(Box::new(MockCaptureHandle {
            device: device_index,
            backend: backend.id,
            readable,
            size: (settings.width.max(1), settings.height.max(1)),
            released: false,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockCaptureHandle {
    device: u32,
    backend: BackendId,
    readable: bool,
    size: (u32, u32),
    released: bool,
    state: Arc<Mutex<MockCameraState>>,
}

impl CaptureHandle for MockCaptureHandle {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        let mut state = self.state.lock();
        let ok = self.readable && state.read_script.pop_front().unwrap_or(true);

        state.calls.push(MockCameraCall::Read {
            device: self.device,
            backend: self.backend,
            ok,
        });

        if ok {
            Ok(RgbImage::from_pixel(self.size.0, self.size.1, Rgb([32, 32, 32])))
        } else {
            Err(CameraError::CaptureStream {
                details: "scripted read failure".to_string(),
            })
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let mut state = self.state.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
        state.calls.push(MockCameraCall::Release {
            device: self.device,
            backend: self.backend,
        });
    }
}

impl Drop for MockCaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}
