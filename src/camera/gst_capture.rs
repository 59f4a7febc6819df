use super::backend::{CaptureBackend, CaptureDriver, CaptureHandle, CaptureSettings};
use crate::error::CameraError;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use image::RgbImage;
use tracing::{debug, info, warn};

const BACKEND_V4L2_RAW: u32 = 0;
const BACKEND_V4L2_MJPEG: u32 = 1;
const BACKEND_AUTO: u32 = 2;

/// GStreamer capture driver. Each backend is a different source pipeline
/// with its own latency/compatibility trade-off.
pub struct GstreamerDriver {
    initialized: bool,
}

impl GstreamerDriver {
    pub fn new() -> Result<Self, CameraError> {
        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        Ok(Self { initialized: true })
    }

    fn build_pipeline_string(
        device_index: u32,
        backend: &CaptureBackend,
        settings: &CaptureSettings,
    ) -> Result<String, CameraError> {
        let source = match backend.id.0 {
            BACKEND_V4L2_RAW => format!("v4l2src device=/dev/video{} io-mode=mmap", device_index),
            BACKEND_V4L2_MJPEG => format!(
                "v4l2src device=/dev/video{} io-mode=mmap ! image/jpeg ! jpegdec",
                device_index
            ),
            // autovideosrc picks its own device, so it only stands in for index 0
            BACKEND_AUTO if device_index == 0 => "autovideosrc".to_string(),
            _ => {
                return Err(CameraError::DeviceOpen {
                    device: device_index,
                    backend: backend.name.clone(),
                    details: "backend does not address this device".to_string(),
                })
            }
        };

        Ok(format!(
            "{} ! videoconvert ! videoscale ! \
             video/x-raw,format=RGB,width={},height={} ! \
             appsink name=sink sync=false max-buffers={} drop=true enable-last-sample=false",
            source, settings.width, settings.height, settings.buffer_depth
        ))
    }
}

impl CaptureDriver for GstreamerDriver {
    fn name(&self) -> &str {
        "gstreamer"
    }

    fn backends(&self) -> Vec<CaptureBackend> {
        vec![
            CaptureBackend::new(BACKEND_V4L2_RAW, "V4L2"),
            CaptureBackend::new(BACKEND_V4L2_MJPEG, "V4L2 MJPEG"),
            CaptureBackend::new(BACKEND_AUTO, "Auto"),
        ]
    }

    fn open(
        &mut self,
        device_index: u32,
        backend: &CaptureBackend,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureHandle>, CameraError> {
        if !self.initialized {
            return Err(CameraError::Configuration {
                details: "GStreamer not initialized".to_string(),
            });
        }

        let open_error = |details: String| CameraError::DeviceOpen {
            device: device_index,
            backend: backend.name.clone(),
            details,
        };

        let pipeline_desc = Self::build_pipeline_string(device_index, backend, settings)?;
        debug!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| open_error(format!("Failed to create pipeline: {}", e)))?
            .downcast::<Pipeline>()
            .map_err(|_| open_error("Failed to downcast to Pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| open_error("Failed to get appsink element".to_string()))?
            .downcast::<AppSink>()
            .map_err(|_| open_error("Failed to downcast to AppSink".to_string()))?;

        pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| open_error(format!("Failed to start pipeline: {}", e)))?;

        let (result, _, _) = pipeline.state(gstreamer::ClockTime::from_seconds(2));
        if let Err(e) = result {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(open_error(format!("Pipeline did not reach PLAYING: {}", e)));
        }

        info!(
            "GStreamer capture started on /dev/video{} via {}",
            device_index, backend.name
        );

        Ok(Box::new(GstreamerHandle {
            pipeline: Some(pipeline),
            appsink,
            read_timeout: settings.read_timeout,
        }))
    }
}

struct GstreamerHandle {
    pipeline: Option<Pipeline>,
    appsink: AppSink,
    read_timeout: std::time::Duration,
}

impl GstreamerHandle {
    fn sample_to_image(sample: &gstreamer::Sample) -> Result<RgbImage, CameraError> {
        let buffer = sample.buffer().ok_or_else(|| CameraError::CaptureStream {
            details: "No buffer in sample".to_string(),
        })?;

        let caps = sample.caps().ok_or_else(|| CameraError::CaptureStream {
            details: "No caps in sample".to_string(),
        })?;

        let video_info = VideoInfo::from_caps(caps).map_err(|e| CameraError::CaptureStream {
            details: format!("Failed to get video info: {}", e),
        })?;

        let width = video_info.width();
        let height = video_info.height();
        let stride = video_info.stride()[0] as usize;
        let row_bytes = width as usize * 3;

        let map = buffer
            .map_readable()
            .map_err(|e| CameraError::CaptureStream {
                details: format!("Failed to map buffer: {}", e),
            })?;
        let data = map.as_slice();

        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let end = start + row_bytes;
            let line = data.get(start..end).ok_or_else(|| CameraError::CaptureStream {
                details: format!("Buffer too small for {}x{} RGB frame", width, height),
            })?;
            pixels.extend_from_slice(line);
        }

        RgbImage::from_raw(width, height, pixels).ok_or_else(|| CameraError::CaptureStream {
            details: "Frame size mismatch".to_string(),
        })
    }
}

impl CaptureHandle for GstreamerHandle {
    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        if self.pipeline.is_none() {
            return Err(CameraError::NotOpen);
        }

        let timeout_ms = self.read_timeout.as_millis() as u64;
        let sample = self
            .appsink
            .try_pull_sample(gstreamer::ClockTime::from_mseconds(timeout_ms))
            .ok_or(CameraError::FrameTimeout {
                timeout: self.read_timeout,
            })?;

        Self::sample_to_image(&sample)
    }

    fn release(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gstreamer::State::Null) {
                warn!("Failed to stop GStreamer pipeline: {}", e);
            }
            debug!("GStreamer capture pipeline released");
        }
    }
}

impl Drop for GstreamerHandle {
    fn drop(&mut self) {
        self.release();
    }
}
