use image::imageops::FilterType;

use crate::buffer::PixelBuffer;
use crate::codec;
use crate::error::{EngineError, Result};
use crate::parallel::RowRangeScheduler;

/// Mirror every row left to right, in place.
pub fn flip_horizontal(scheduler: &RowRangeScheduler, buffer: &mut PixelBuffer) -> Result<()> {
    let (width, _, channels) = buffer.dims();
    let row_len = buffer.row_len();
    scheduler.run_rows_mut(buffer.as_raw_mut(), row_len, |_, _, rows| {
        for row in rows.chunks_exact_mut(row_len) {
            for x in 0..width / 2 {
                let mirror = width - 1 - x;
                let (left, right) = row.split_at_mut(mirror * channels);
                left[x * channels..(x + 1) * channels].swap_with_slice(&mut right[..channels]);
            }
        }
        Ok(())
    })
}

/// Copy out the `width x height` rectangle whose top-left corner is `(x, y)`.
pub fn crop(
    buffer: &PixelBuffer,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Result<PixelBuffer> {
    let fits = x.checked_add(width).is_some_and(|r| r <= buffer.width())
        && y.checked_add(height).is_some_and(|b| b <= buffer.height());
    if !fits || width == 0 || height == 0 {
        return Err(EngineError::config(format!(
            "crop {width}x{height}+{x}+{y} does not fit a {}x{} image",
            buffer.width(),
            buffer.height()
        )));
    }
    let channels = buffer.channels();
    let mut data = Vec::with_capacity(width * height * channels);
    for row in y..y + height {
        let line = buffer.rows(row..row + 1);
        data.extend_from_slice(&line[x * channels..(x + width) * channels]);
    }
    PixelBuffer::from_raw(width, height, channels, data)
}

/// Largest centered square.
pub fn crop_center_square(buffer: &PixelBuffer) -> Result<PixelBuffer> {
    let side = buffer.width().min(buffer.height());
    crop(
        buffer,
        (buffer.width() - side) / 2,
        (buffer.height() - side) / 2,
        side,
        side,
    )
}

/// Resample to exactly `width x height` with a triangle filter.
///
/// The filter support widens with the shrink ratio, so downscaling averages every
/// source pixel it covers. Channel layout is preserved.
pub fn resize(buffer: &PixelBuffer, width: usize, height: usize) -> Result<PixelBuffer> {
    let (w, h) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(EngineError::config(format!(
                "cannot resize to {width}x{height}"
            )));
        }
    };
    if (width, height) == (buffer.width(), buffer.height()) {
        return Ok(buffer.clone());
    }
    log::debug!(
        "resizing {}x{} -> {width}x{height}",
        buffer.width(),
        buffer.height()
    );
    let img = codec::to_dynamic(buffer)?.resize_exact(w, h, FilterType::Triangle);
    codec::from_dynamic(img)
}

/// Resize both sides by `factor`, truncating to whole pixels.
pub fn scale(buffer: &PixelBuffer, factor: f64) -> Result<PixelBuffer> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(EngineError::config(format!(
            "scale factor must be positive, got {factor}"
        )));
    }
    let width = (buffer.width() as f64 * factor) as usize;
    let height = (buffer.height() as f64 * factor) as usize;
    resize(buffer, width, height)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::parallel::WorkerPool;

    #[test]
    fn flip_mirrors_pixels() {
        let scheduler = RowRangeScheduler::new(Arc::new(WorkerPool::new(2).unwrap()), 2);
        let mut img =
            PixelBuffer::from_fn(5, 3, 2, |x, y, c| (x * 10 + y + c * 100) as u8).unwrap();
        let original = img.clone();
        flip_horizontal(&scheduler, &mut img).unwrap();
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(img.pixel(x, y), original.pixel(4 - x, y));
            }
        }
    }

    #[test]
    fn crop_copies_the_rectangle() {
        let img = PixelBuffer::from_fn(6, 4, 1, |x, y, _| (y * 6 + x) as u8).unwrap();
        let out = crop(&img, 2, 1, 3, 2).unwrap();
        assert_eq!(out.as_raw(), &[8, 9, 10, 14, 15, 16]);
        assert!(crop(&img, 4, 0, 3, 1).is_err());
    }

    #[test]
    fn center_square_uses_short_side() {
        let img = PixelBuffer::from_fn(7, 3, 1, |x, _, _| x as u8).unwrap();
        let out = crop_center_square(&img).unwrap();
        assert_eq!(out.dims(), (3, 3, 1));
        assert_eq!(out.pixel(0, 0)[0], 2);
    }

    #[test]
    fn resize_keeps_flat_color_and_channels() {
        let img = PixelBuffer::filled(8, 6, 3, 140).unwrap();
        for (w, h) in [(3, 2), (17, 11)] {
            let out = resize(&img, w, h).unwrap();
            assert_eq!(out.dims(), (w, h, 3));
            assert!(out.as_raw().iter().all(|&v| v == 140));
        }
        assert_eq!(resize(&img, 8, 6).unwrap(), img);
        assert!(resize(&img, 0, 6).is_err());
    }

    #[test]
    fn scale_truncates_to_whole_pixels() {
        let img = PixelBuffer::new(10, 7, 3).unwrap();
        assert_eq!(scale(&img, 0.5).unwrap().dims(), (5, 3, 3));
        assert_eq!(scale(&img, 1.55).unwrap().dims(), (15, 10, 3));
        assert!(scale(&img, 0.05).is_err());
        assert!(scale(&img, f64::NAN).is_err());
    }
}
