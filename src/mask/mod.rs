pub mod blend;
pub mod gradient;
pub mod refine;

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};

pub use blend::{blend, MaskCompositor};
pub use gradient::{linear_gradient, radial_gradient};
pub use refine::refine_with_edges;

/// Hardness at or above which a brush paints full coverage with no falloff.
pub const HARD_BRUSH: f32 = 0.99;

/// Produces a per-pixel subject raster for an image, e.g. a person segmentation model.
///
/// Implementations return a single-channel 8-bit buffer already resized to the
/// image's width and height; any thresholding or softening is theirs to apply.
pub trait Segmenter {
    fn segment(&self, image: &PixelBuffer, softness: u32) -> Result<PixelBuffer>;
}

/// Dense per-pixel coverage in `[0, 1]`, used to confine an effect to a region.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Mask {
    /// An all-zero mask.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::config(format!(
                "mask dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            data: vec![clamp_unit(value); width * height],
        })
    }

    /// Build a mask from a single-channel 8-bit buffer, mapping `0..=255` to `0..=1`.
    pub fn from_gray(gray: &PixelBuffer) -> Result<Self> {
        let mut mask = Self::new(gray.width(), gray.height())?;
        mask.load_gray(gray)?;
        Ok(mask)
    }

    /// Ask `segmenter` for a subject raster of `image` and convert it.
    pub fn from_segmentation(
        segmenter: &dyn Segmenter,
        image: &PixelBuffer,
        softness: u32,
    ) -> Result<Self> {
        let raster = segmenter.segment(image, softness)?;
        if raster.width() != image.width() || raster.height() != image.height() {
            return Err(EngineError::DimensionMismatch {
                context: "segmentation raster",
                expected: (image.width(), image.height(), 1),
                found: raster.dims(),
            });
        }
        Self::from_gray(&raster)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, y: usize) -> &[f32] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    /// Coverage at `(x, y)`; 0 outside the mask.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        if x < self.width && y < self.height {
            self.data[y * self.width + x]
        } else {
            0.0
        }
    }

    /// Set coverage at `(x, y)`, clamped to `[0, 1]`. Ignored outside the mask.
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = clamp_unit(value);
        }
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(clamp_unit(value));
    }

    /// Swap covered and uncovered regions.
    pub fn invert(&mut self) {
        for v in &mut self.data {
            *v = 1.0 - *v;
        }
    }

    /// Overwrite coverage from a single-channel 8-bit buffer of the same size.
    pub fn load_gray(&mut self, gray: &PixelBuffer) -> Result<()> {
        if gray.channels() != 1 {
            return Err(EngineError::config(format!(
                "mask source must be single-channel, got {} channels",
                gray.channels()
            )));
        }
        self.ensure_covers(gray, "mask load")?;
        for (v, &sample) in self.data.iter_mut().zip(gray.as_raw()) {
            *v = sample as f32 / 255.0;
        }
        Ok(())
    }

    /// Quantize to a single-channel 8-bit buffer.
    pub fn to_gray(&self) -> Result<PixelBuffer> {
        let data = self
            .data
            .iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        PixelBuffer::from_raw(self.width, self.height, 1, data)
    }

    /// Fail with `DimensionMismatch` unless `buffer` has this mask's width and height.
    pub fn ensure_covers(&self, buffer: &PixelBuffer, context: &'static str) -> Result<()> {
        if buffer.width() == self.width && buffer.height() == self.height {
            Ok(())
        } else {
            Err(EngineError::DimensionMismatch {
                context,
                expected: (self.width, self.height, buffer.channels()),
                found: buffer.dims(),
            })
        }
    }

    /// Add a round brush dab. Coverage only ever grows, so overlapping dabs keep
    /// the strongest value and repeating a dab changes nothing.
    pub fn paint(&mut self, cx: i32, cy: i32, radius: f32, hardness: f32) {
        self.stroke(cx, cy, radius, hardness, |old, falloff| old.max(falloff));
    }

    /// Remove coverage with a round brush dab. Coverage only ever shrinks.
    pub fn erase(&mut self, cx: i32, cy: i32, radius: f32, hardness: f32) {
        self.stroke(cx, cy, radius, hardness, |old, falloff| (old - falloff).max(0.0));
    }

    fn stroke(
        &mut self,
        cx: i32,
        cy: i32,
        radius: f32,
        hardness: f32,
        combine: impl Fn(f32, f32) -> f32,
    ) {
        // Also rejects NaN.
        if !(radius > 0.0) {
            return;
        }
        let r = radius as f64;
        let (cx, cy) = (cx as f64, cy as f64);

        let min_x = (cx - r).floor().max(0.0) as usize;
        let max_x = ((cx + r).floor() + 1.0).clamp(0.0, self.width as f64) as usize;
        let min_y = (cy - r).floor().max(0.0) as usize;
        let max_y = ((cy + r).floor() + 1.0).clamp(0.0, self.height as f64) as usize;

        for y in min_y..max_y {
            let dy = y as f64 - cy;
            let row = y * self.width;
            for x in min_x..max_x {
                let dx = x as f64 - cx;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance >= r {
                    continue;
                }
                let falloff = brush_falloff(distance as f32, radius, hardness);
                let v = &mut self.data[row + x];
                *v = clamp_unit(combine(*v, falloff));
            }
        }
    }
}

/// Coverage a dab of `radius` and `hardness` contributes at `distance` from its center.
pub fn brush_falloff(distance: f32, radius: f32, hardness: f32) -> f32 {
    if hardness >= HARD_BRUSH {
        1.0
    } else {
        (1.0 - distance / radius + hardness * 0.5).clamp(0.0, 1.0)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
