use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};
use crate::filters::blur::clamp_index;
use crate::parallel::TileFilter;

/// Longest accepted streak, in taps.
pub const MAX_MOTION_LENGTH: usize = 1024;

/// Averages `length` samples along a line through each pixel, like a camera
/// moving at `angle` degrees (0 is horizontal, 90 points down).
#[derive(Clone, Debug)]
pub struct MotionBlur {
    length: usize,
    angle: f32,
    offsets: Vec<(isize, isize)>,
}

impl MotionBlur {
    pub fn new(length: usize, angle: f32) -> Result<Self> {
        if length == 0 || length > MAX_MOTION_LENGTH {
            return Err(EngineError::config(format!(
                "motion blur length must lie in 1..={MAX_MOTION_LENGTH}, got {length}"
            )));
        }
        if !angle.is_finite() {
            return Err(EngineError::config(format!(
                "motion blur angle must be finite, got {angle}"
            )));
        }
        let (sin, cos) = angle.to_radians().sin_cos();
        let center = (length - 1) as f32 / 2.0;
        let offsets = (0..length)
            .map(|i| {
                let t = i as f32 - center;
                ((t * cos).round() as isize, (t * sin).round() as isize)
            })
            .collect();
        Ok(Self {
            length,
            angle,
            offsets,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl TileFilter for MotionBlur {
    fn radius(&self) -> usize {
        self.offsets
            .iter()
            .map(|&(_, dy)| dy.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    fn process(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        if self.length == 1 {
            return Ok(input.clone());
        }
        let (w, h, c) = input.dims();
        let src = input.as_raw();
        let taps = self.offsets.len() as u32;

        let mut out = vec![0u8; w * h * c];
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    let mut sum = 0u32;
                    for &(dx, dy) in &self.offsets {
                        let sx = clamp_index(x as isize + dx, w);
                        let sy = clamp_index(y as isize + dy, h);
                        sum += u32::from(src[(sy * w + sx) * c + ch]);
                    }
                    out[(y * w + x) * c + ch] = ((sum + taps / 2) / taps) as u8;
                }
            }
        }
        PixelBuffer::from_raw(w, h, c, out)
    }
}
