use crate::error::DisplayError;

/// Pixel format conversion for framebuffer output
pub struct DisplayConverter;

impl DisplayConverter {
    /// Convert packed RGB24 to little-endian RGB565
    pub fn rgb24_to_rgb565(rgb24_data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DisplayError> {
        let expected_size = (width * height * 3) as usize;
        if rgb24_data.len() != expected_size {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Invalid RGB24 data size: expected {}, got {}",
                    expected_size,
                    rgb24_data.len()
                ),
            });
        }

        let mut rgb565_data = Vec::with_capacity((width * height * 2) as usize);

        for chunk in rgb24_data.chunks_exact(3) {
            let r = chunk[0] >> 3;
            let g = chunk[1] >> 2;
            let b = chunk[2] >> 3;

            let rgb565 = ((r as u16) << 11) | ((g as u16) << 5) | (b as u16);
            rgb565_data.extend_from_slice(&rgb565.to_le_bytes());
        }

        Ok(rgb565_data)
    }

    /// Scale RGB565 data to the target resolution with nearest neighbour
    pub fn scale_rgb565(
        data: &[u8],
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    ) -> Result<Vec<u8>, DisplayError> {
        if data.len() != (src_width * src_height * 2) as usize || src_width == 0 || src_height == 0 {
            return Err(DisplayError::FormatConversion {
                details: format!(
                    "Invalid RGB565 data size for {}x{}: got {}",
                    src_width,
                    src_height,
                    data.len()
                ),
            });
        }

        if (src_width, src_height) == (dst_width, dst_height) {
            return Ok(data.to_vec());
        }

        let mut scaled_data = Vec::with_capacity((dst_width * dst_height * 2) as usize);

        let x_ratio = src_width as f32 / dst_width as f32;
        let y_ratio = src_height as f32 / dst_height as f32;

        for dst_y in 0..dst_height {
            let src_y = (((dst_y as f32) * y_ratio) as u32).min(src_height - 1);
            for dst_x in 0..dst_width {
                let src_x = (((dst_x as f32) * x_ratio) as u32).min(src_width - 1);
                let src_index = ((src_y * src_width + src_x) * 2) as usize;

                scaled_data.push(data[src_index]);
                scaled_data.push(data[src_index + 1]);
            }
        }

        Ok(scaled_data)
    }
}
