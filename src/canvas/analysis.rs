use std::fmt;

use crate::buffer::PixelBuffer;
use crate::filters::tone::bt601;

/// Summary of the canvas's current image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAnalysis {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub aspect_ratio: f64,
    pub color_space: &'static str,
    /// Mean luma over all pixels, in `0..=255`.
    pub average_brightness: f64,
}

impl ImageAnalysis {
    pub fn of(buffer: &PixelBuffer) -> Self {
        let (width, height, channels) = buffer.dims();
        let color_space = match channels {
            1 => "GRAY",
            2 => "GRAY_ALPHA",
            3 => "RGB",
            _ => "RGBA",
        };
        let total: u64 = buffer
            .as_raw()
            .chunks_exact(channels)
            .map(|px| {
                if channels >= 3 {
                    bt601(px[0], px[1], px[2]) as u64
                } else {
                    px[0] as u64
                }
            })
            .sum();

        Self {
            width,
            height,
            channels,
            aspect_ratio: width as f64 / height as f64,
            color_space,
            average_brightness: total as f64 / (width * height) as f64,
        }
    }
}

impl fmt::Display for ImageAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {} (aspect {:.3}, brightness {:.1})",
            self.width, self.height, self.color_space, self.aspect_ratio, self.average_brightness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_shape_and_brightness() {
        let img = PixelBuffer::from_fn(4, 2, 3, |x, _, _| if x < 2 { 0 } else { 200 }).unwrap();
        let analysis = ImageAnalysis::of(&img);
        assert_eq!(analysis.color_space, "RGB");
        assert_eq!(analysis.aspect_ratio, 2.0);
        assert_eq!(analysis.average_brightness, 100.0);
        assert_eq!(analysis.to_string(), "4x2 RGB (aspect 2.000, brightness 100.0)");
    }
}
