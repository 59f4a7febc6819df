use super::converter::DisplayConverter;
use super::stats::DisplayStats;
use crate::config::{DisplayConfig, DisplayOutput};
use crate::error::DisplayError;
use image::RgbImage;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use tracing::{debug, info, trace, warn};

/// Where annotated frames end up
pub trait DisplaySurface: Send {
    fn name(&self) -> &str;

    fn present(&mut self, frame: &RgbImage) -> Result<(), DisplayError>;

    fn stats(&self) -> &DisplayStats;
}

/// Writes frames as RGB565 straight into a Linux framebuffer device
pub struct FramebufferDisplay {
    device: String,
    resolution: (u32, u32),
    file: File,
    stats: DisplayStats,
}

impl FramebufferDisplay {
    pub fn open(device: &str, resolution: (u32, u32)) -> Result<Self, DisplayError> {
        let file = OpenOptions::new()
            .write(true)
            .open(device)
            .map_err(|e| DisplayError::Framebuffer {
                device: device.to_string(),
                source: e,
            })?;

        info!(
            "Framebuffer {} opened ({}x{} RGB565)",
            device, resolution.0, resolution.1
        );

        Ok(Self {
            device: device.to_string(),
            resolution,
            file,
            stats: DisplayStats::default(),
        })
    }

    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), DisplayError> {
        let (width, height) = frame.dimensions();
        let rgb565 = DisplayConverter::rgb24_to_rgb565(frame.as_raw(), width, height)?;
        let (fb_width, fb_height) = self.resolution;
        let scaled = DisplayConverter::scale_rgb565(&rgb565, width, height, fb_width, fb_height)?;

        let device = self.device.clone();
        let io_error = |e| DisplayError::Framebuffer {
            device: device.clone(),
            source: e,
        };

        self.file.seek(SeekFrom::Start(0)).map_err(io_error)?;
        self.file.write_all(&scaled).map_err(io_error)?;
        self.file.flush().map_err(io_error)?;
        Ok(())
    }
}

impl DisplaySurface for FramebufferDisplay {
    fn name(&self) -> &str {
        "framebuffer"
    }

    fn present(&mut self, frame: &RgbImage) -> Result<(), DisplayError> {
        match self.write_frame(frame) {
            Ok(()) => {
                self.stats.record_present();
                trace!("Presented frame on {}", self.device);
                Ok(())
            }
            Err(e) => {
                self.stats.record_error();
                Err(e)
            }
        }
    }

    fn stats(&self) -> &DisplayStats {
        &self.stats
    }
}

/// Accepts frames without showing them; keeps the last one for inspection
#[derive(Default)]
pub struct HeadlessDisplay {
    last_frame: Option<RgbImage>,
    stats: DisplayStats,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&RgbImage> {
        self.last_frame.as_ref()
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn name(&self) -> &str {
        "headless"
    }

    fn present(&mut self, frame: &RgbImage) -> Result<(), DisplayError> {
        self.last_frame = Some(frame.clone());
        self.stats.record_present();
        Ok(())
    }

    fn stats(&self) -> &DisplayStats {
        &self.stats
    }
}

/// Open the configured display, falling back to headless when the
/// framebuffer cannot be opened
pub fn create_display(config: &DisplayConfig) -> Box<dyn DisplaySurface> {
    match config.output {
        DisplayOutput::Headless => {
            debug!("Running without display output");
            Box::new(HeadlessDisplay::new())
        }
        DisplayOutput::Framebuffer => {
            match FramebufferDisplay::open(&config.framebuffer_device, config.framebuffer_resolution)
            {
                Ok(display) => Box::new(display),
                Err(e) => {
                    warn!("{}; continuing without display output", e);
                    Box::new(HeadlessDisplay::new())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FingerplayConfig;
    use image::Rgb;
    use tempfile::NamedTempFile;

    #[test]
    fn test_framebuffer_writes_scaled_rgb565() {
        let fb = NamedTempFile::new().unwrap();
        let path = fb.path().to_string_lossy().to_string();
        let mut display = FramebufferDisplay::open(&path, (4, 2)).unwrap();

        let frame = RgbImage::from_pixel(2, 1, Rgb([255, 0, 0]));
        display.present(&frame).unwrap();
        display.present(&frame).unwrap();

        let written = std::fs::read(fb.path()).unwrap();
        assert_eq!(written.len(), 4 * 2 * 2);
        assert!(written.chunks_exact(2).all(|px| px == [0x00, 0xF8]));
        assert_eq!(display.stats().frames_presented, 2);
    }

    #[test]
    fn test_missing_framebuffer_falls_back_to_headless() {
        let mut config = FingerplayConfig::default().display;
        config.output = DisplayOutput::Framebuffer;
        config.framebuffer_device = "/nonexistent/fb9".to_string();

        let display = create_display(&config);
        assert_eq!(display.name(), "headless");
    }

    #[test]
    fn test_headless_keeps_last_frame() {
        let mut display = HeadlessDisplay::new();
        display
            .present(&RgbImage::from_pixel(3, 3, Rgb([1, 2, 3])))
            .unwrap();

        assert_eq!(display.last_frame().unwrap().dimensions(), (3, 3));
        assert_eq!(display.stats().frames_presented, 1);
        assert_eq!(display.stats().present_errors, 0);
    }
}
