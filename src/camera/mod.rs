mod backend;
mod builder;
#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst_capture;
mod manager;
mod mock;
mod synthetic;

pub use backend::{
    BackendId, CameraDescriptor, CaptureBackend, CaptureDriver, CaptureHandle, CaptureSettings,
};
pub use builder::{create_driver, CameraManagerBuilder};
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst_capture::GstreamerDriver;
pub use manager::{CameraManager, CaptureSession};
pub use mock::{MockCameraCall, MockCaptureDriver};
pub use synthetic::SyntheticDriver;
