use wide::f32x4;

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};
use crate::mask::Mask;
use crate::parallel::RowRangeScheduler;

/// Mask values at or above this are treated as full overlay and left untouched.
const OPAQUE_SKIP: f32 = 0.99;

/// Blend `base` into `overlay` by `mask`, writing the result into `overlay`:
/// `overlay = round(base * (1 - m) + overlay * m)` per channel.
///
/// All shapes are checked before anything is written.
pub fn blend(base: &PixelBuffer, overlay: &mut PixelBuffer, mask: &Mask) -> Result<()> {
    check_shapes(base, overlay, mask)?;
    blend_rows(base, mask, 0, overlay.as_raw_mut());
    Ok(())
}

/// Row-parallel [`blend`] running on a shared scheduler.
#[derive(Clone)]
pub struct MaskCompositor {
    scheduler: RowRangeScheduler,
}

impl MaskCompositor {
    pub fn new(scheduler: RowRangeScheduler) -> Self {
        Self { scheduler }
    }

    pub fn blend(&self, base: &PixelBuffer, overlay: &mut PixelBuffer, mask: &Mask) -> Result<()> {
        check_shapes(base, overlay, mask)?;
        let row_len = overlay.row_len();
        self.scheduler
            .run_rows_mut(overlay.as_raw_mut(), row_len, |start, _end, rows| {
                blend_rows(base, mask, start, rows);
                Ok(())
            })
    }
}

fn check_shapes(base: &PixelBuffer, overlay: &PixelBuffer, mask: &Mask) -> Result<()> {
    base.ensure_same_shape(overlay, "blend overlay")?;
    if mask.width() != base.width() || mask.height() != base.height() {
        return Err(EngineError::DimensionMismatch {
            context: "blend mask",
            expected: base.dims(),
            found: (mask.width(), mask.height(), base.channels()),
        });
    }
    Ok(())
}

/// Blend the rows of `overlay_rows`, which start at image row `start_row`.
fn blend_rows(base: &PixelBuffer, mask: &Mask, start_row: usize, overlay_rows: &mut [u8]) {
    let channels = base.channels();
    let row_len = base.row_len();

    for (i, out_row) in overlay_rows.chunks_exact_mut(row_len).enumerate() {
        let y = start_row + i;
        let base_row = base.rows(y..y + 1);
        let coverage = mask.row(y);

        for (x, &m) in coverage.iter().enumerate() {
            if m >= OPAQUE_SKIP {
                continue;
            }
            let idx = x * channels;
            let src = &base_row[idx..idx + channels];
            let dst = &mut out_row[idx..idx + channels];
            if channels == 4 {
                lerp_rgba(src, dst, m);
            } else {
                lerp_samples(src, dst, m);
            }
        }
    }
}

#[inline]
fn lerp_samples(base: &[u8], overlay: &mut [u8], m: f32) {
    let keep = 1.0 - m;
    for (o, &b) in overlay.iter_mut().zip(base) {
        *o = (b as f32 * keep + *o as f32 * m).round() as u8;
    }
}

#[inline]
fn lerp_rgba(base: &[u8], overlay: &mut [u8], m: f32) {
    let b = f32x4::from([
        base[0] as f32,
        base[1] as f32,
        base[2] as f32,
        base[3] as f32,
    ]);
    let o = f32x4::from([
        overlay[0] as f32,
        overlay[1] as f32,
        overlay[2] as f32,
        overlay[3] as f32,
    ]);
    let mixed = (b * f32x4::splat(1.0 - m) + o * f32x4::splat(m)).to_array();
    // Scalar rounding keeps half-way cases identical to `lerp_samples`.
    for (dst, v) in overlay.iter_mut().zip(mixed) {
        *dst = v.round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_and_scalar_paths_agree() {
        let base = [10u8, 200, 33, 255];
        let overlay = [250u8, 1, 34, 0];
        for step in 0..=20 {
            let m = step as f32 / 20.0;
            let mut simd = overlay;
            let mut scalar = overlay;
            lerp_rgba(&base, &mut simd, m);
            lerp_samples(&base, &mut scalar, m);
            assert_eq!(simd, scalar, "mask {m}");
        }
    }

    #[test]
    fn mismatched_mask_is_rejected_before_writing() {
        let base = PixelBuffer::filled(4, 4, 3, 10).unwrap();
        let mut overlay = PixelBuffer::filled(4, 4, 3, 20).unwrap();
        let mask = Mask::filled(4, 5, 0.0).unwrap();
        let err = blend(&base, &mut overlay, &mask).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { .. }));
        assert!(overlay.as_raw().iter().all(|&v| v == 20));
    }
}
