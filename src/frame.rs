use image::imageops::{self, FilterType};
use image::RgbImage;

/// A captured frame and its metadata
#[derive(Debug, Clone)]
pub struct FrameData {
    /// Monotonic frame identifier for the capture session
    pub id: u64,
    /// RGB pixel data
    pub image: RgbImage,
}

impl FrameData {
    pub fn new(id: u64, image: RgbImage) -> Self {
        Self { id, image }
    }
}

/// Frame processing utilities
pub struct FrameProcessor;

impl FrameProcessor {
    /// Mirror horizontally so on-screen motion follows the user's own
    /// movement, then scale to the display resolution.
    pub fn normalize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
        let mirrored = imageops::flip_horizontal(image);

        if mirrored.width() == width && mirrored.height() == height {
            mirrored
        } else {
            imageops::resize(&mirrored, width, height, FilterType::Triangle)
        }
    }
}
