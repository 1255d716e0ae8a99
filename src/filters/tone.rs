use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};
use crate::parallel::RowRangeScheduler;

/// Number of leading channels that carry color. Alpha (the last channel of a
/// 2- or 4-channel buffer) is never touched by tone operations.
fn color_channels(channels: usize) -> usize {
    match channels {
        2 => 1,
        4 => 3,
        c => c,
    }
}

/// ITU-R BT.601 luma of an 8-bit RGB triple, rounded to nearest.
#[inline]
pub fn bt601(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

/// `v = sat(alpha * v + beta)` on every color channel.
pub fn brightness_contrast(
    scheduler: &RowRangeScheduler,
    buffer: &mut PixelBuffer,
    alpha: f32,
    beta: f32,
) -> Result<()> {
    if !alpha.is_finite() || !beta.is_finite() {
        return Err(EngineError::config(format!(
            "brightness/contrast needs finite gains, got alpha {alpha} beta {beta}"
        )));
    }
    let channels = buffer.channels();
    let colors = color_channels(channels);
    let row_len = buffer.row_len();
    scheduler.run_rows_mut(buffer.as_raw_mut(), row_len, |_, _, rows| {
        for px in rows.chunks_exact_mut(channels) {
            for v in &mut px[..colors] {
                *v = (alpha * *v as f32 + beta).round().clamp(0.0, 255.0) as u8;
            }
        }
        Ok(())
    })
}

/// Replace RGB with its BT.601 luma. Single-channel buffers are left as they are.
pub fn grayscale(scheduler: &RowRangeScheduler, buffer: &mut PixelBuffer) -> Result<()> {
    let channels = buffer.channels();
    if color_channels(channels) < 3 {
        return Ok(());
    }
    let row_len = buffer.row_len();
    scheduler.run_rows_mut(buffer.as_raw_mut(), row_len, |_, _, rows| {
        for px in rows.chunks_exact_mut(channels) {
            let y = bt601(px[0], px[1], px[2]);
            px[..3].fill(y);
        }
        Ok(())
    })
}

/// Classic warm sepia matrix on RGB.
pub fn sepia(scheduler: &RowRangeScheduler, buffer: &mut PixelBuffer) -> Result<()> {
    let channels = buffer.channels();
    if color_channels(channels) < 3 {
        return Err(EngineError::config(format!(
            "sepia needs a color image, got {channels} channels"
        )));
    }
    let row_len = buffer.row_len();
    scheduler.run_rows_mut(buffer.as_raw_mut(), row_len, |_, _, rows| {
        for px in rows.chunks_exact_mut(channels) {
            let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
            px[0] = sat(0.393 * r + 0.769 * g + 0.189 * b);
            px[1] = sat(0.349 * r + 0.686 * g + 0.168 * b);
            px[2] = sat(0.272 * r + 0.534 * g + 0.131 * b);
        }
        Ok(())
    })
}

/// Darken towards the corners: color is scaled by `1 - strength * (d / d_max)^2`
/// where `d` is the distance from the image center.
pub fn vignette(
    scheduler: &RowRangeScheduler,
    buffer: &mut PixelBuffer,
    strength: f32,
) -> Result<()> {
    if !(0.0..=1.0).contains(&strength) {
        return Err(EngineError::config(format!(
            "vignette strength must be within [0, 1], got {strength}"
        )));
    }
    let (width, height, channels) = buffer.dims();
    let colors = color_channels(channels);
    let cx = (width as f32 - 1.0) * 0.5;
    let cy = (height as f32 - 1.0) * 0.5;
    let max_sq = (cx * cx + cy * cy).max(f32::EPSILON);
    let row_len = buffer.row_len();

    scheduler.run_rows_mut(buffer.as_raw_mut(), row_len, |start, _, rows| {
        for (i, row) in rows.chunks_exact_mut(row_len).enumerate() {
            let dy = (start + i) as f32 - cy;
            for (x, px) in row.chunks_exact_mut(channels).enumerate() {
                let dx = x as f32 - cx;
                let gain = 1.0 - strength * (dx * dx + dy * dy) / max_sq;
                for v in &mut px[..colors] {
                    *v = sat(*v as f32 * gain);
                }
            }
        }
        Ok(())
    })
}

/// Single-channel luma copy of `buffer`; alpha is dropped.
pub fn luma(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    let channels = buffer.channels();
    let data = match color_channels(channels) {
        1 => buffer.as_raw().iter().step_by(channels).copied().collect(),
        _ => buffer
            .as_raw()
            .chunks_exact(channels)
            .map(|px| bt601(px[0], px[1], px[2]))
            .collect(),
    };
    PixelBuffer::from_raw(buffer.width(), buffer.height(), 1, data)
}

#[inline]
fn sat(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
