use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};
use crate::parallel::TileFilter;

/// Largest accepted box blur radius.
pub const MAX_BOX_RADIUS: usize = 4096;
/// Largest accepted gaussian sigma; the kernel spans `2 * ceil(3 * sigma) + 1` taps.
pub const MAX_SIGMA: f32 = 1024.0;

/// Clamp a signed sample index into `0..len` (replicate border).
#[inline]
pub(crate) fn clamp_index(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// Separable box blur with a replicated border. Integer arithmetic, exact rounding.
#[derive(Clone, Copy, Debug)]
pub struct BoxBlur {
    radius: usize,
}

impl BoxBlur {
    pub fn new(radius: usize) -> Result<Self> {
        if radius > MAX_BOX_RADIUS {
            return Err(EngineError::config(format!(
                "box blur radius {radius} exceeds {MAX_BOX_RADIUS}"
            )));
        }
        Ok(Self { radius })
    }
}

impl TileFilter for BoxBlur {
    fn radius(&self) -> usize {
        self.radius
    }

    fn process(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        if self.radius == 0 {
            return Ok(input.clone());
        }
        let (w, h, c) = input.dims();
        let src = input.as_raw();
        let r = self.radius as isize;

        let mut horizontal = vec![0u64; w * h * c];
        for y in 0..h {
            let row = y * w;
            for x in 0..w {
                for ch in 0..c {
                    let mut sum = 0u64;
                    for k in -r..=r {
                        let sx = clamp_index(x as isize + k, w);
                        sum += u64::from(src[(row + sx) * c + ch]);
                    }
                    horizontal[(row + x) * c + ch] = sum;
                }
            }
        }

        let taps = (2 * self.radius + 1) as u64;
        let area = taps * taps;
        let mut out = vec![0u8; w * h * c];
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    let mut sum = 0u64;
                    for k in -r..=r {
                        let sy = clamp_index(y as isize + k, h);
                        sum += horizontal[(sy * w + x) * c + ch];
                    }
                    out[(y * w + x) * c + ch] = ((sum + area / 2) / area) as u8;
                }
            }
        }
        PixelBuffer::from_raw(w, h, c, out)
    }
}

/// Separable gaussian blur truncated at `ceil(3 * sigma)`, replicated border.
#[derive(Clone, Debug)]
pub struct GaussianBlur {
    sigma: f32,
    kernel: Vec<f32>,
}

impl GaussianBlur {
    /// A sigma of zero gives the identity filter. Negative, non-finite or
    /// oversized sigmas are rejected.
    pub fn new(sigma: f32) -> Result<Self> {
        if !sigma.is_finite() || sigma < 0.0 || sigma > MAX_SIGMA {
            return Err(EngineError::config(format!(
                "gaussian sigma must lie in [0, {MAX_SIGMA}], got {sigma}"
            )));
        }
        Ok(Self {
            sigma,
            kernel: build_gaussian_kernel(sigma),
        })
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }
}

/// Normalized 1-D gaussian kernel of length `2 * ceil(3 * sigma) + 1`.
fn build_gaussian_kernel(sigma: f32) -> Vec<f32> {
    if !(sigma > 0.0) {
        return vec![1.0];
    }
    let radius = (sigma * 3.0).ceil() as usize;
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

impl TileFilter for GaussianBlur {
    fn radius(&self) -> usize {
        self.kernel.len() / 2
    }

    fn process(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        let radius = self.radius() as isize;
        if radius == 0 {
            return Ok(input.clone());
        }
        let (w, h, c) = input.dims();
        let src = input.as_raw();

        let mut horizontal = vec![0.0f32; w * h * c];
        for y in 0..h {
            let row = y * w;
            for x in 0..w {
                for ch in 0..c {
                    let mut acc = 0.0f32;
                    for (ki, &kv) in self.kernel.iter().enumerate() {
                        let sx = clamp_index(x as isize + ki as isize - radius, w);
                        acc += src[(row + sx) * c + ch] as f32 * kv;
                    }
                    horizontal[(row + x) * c + ch] = acc;
                }
            }
        }

        let mut out = vec![0u8; w * h * c];
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    let mut acc = 0.0f32;
                    for (ki, &kv) in self.kernel.iter().enumerate() {
                        let sy = clamp_index(y as isize + ki as isize - radius, h);
                        acc += horizontal[(sy * w + x) * c + ch] * kv;
                    }
                    out[(y * w + x) * c + ch] = acc.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
        PixelBuffer::from_raw(w, h, c, out)
    }
}
