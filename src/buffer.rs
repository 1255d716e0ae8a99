use std::ops::Range;

use crate::error::{EngineError, Result};

/// Row-major 8-bit raster with 1 to 4 interleaved channels.
///
/// A buffer has exactly one owner. It is only cloned when two owners must evolve
/// independently, e.g. a history snapshot taken before an edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a buffer filled with zeros.
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self> {
        Self::filled(width, height, channels, 0)
    }

    /// Allocate a buffer with every sample set to `value`.
    pub fn filled(width: usize, height: usize, channels: usize, value: u8) -> Result<Self> {
        check_dims(width, height, channels)?;
        Ok(Self {
            width,
            height,
            channels,
            data: vec![value; width * height * channels],
        })
    }

    /// Wrap existing samples. The length must equal `width * height * channels`.
    pub fn from_raw(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        check_dims(width, height, channels)?;
        if data.len() != width * height * channels {
            return Err(EngineError::config(format!(
                "buffer of {width}x{height}x{channels} needs {} samples, got {}",
                width * height * channels,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Build a buffer by evaluating `f(x, y, channel)` for every sample.
    pub fn from_fn(
        width: usize,
        height: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> u8,
    ) -> Result<Self> {
        check_dims(width, height, channels)?;
        let mut data = Vec::with_capacity(width * height * channels);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    data.push(f(x, y, c));
                }
            }
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(width, height, channels)`, the shape used in dimension checks.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.channels)
    }

    /// Number of samples in one row.
    pub fn row_len(&self) -> usize {
        self.width * self.channels
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let idx = (y * self.width + x) * self.channels;
        &self.data[idx..idx + self.channels]
    }

    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let idx = (y * self.width + x) * self.channels;
        &mut self.data[idx..idx + self.channels]
    }

    /// Samples of rows `rows.start..rows.end`.
    pub fn rows(&self, rows: Range<usize>) -> &[u8] {
        let row_len = self.row_len();
        &self.data[rows.start * row_len..rows.end * row_len]
    }

    /// Copy rows `rows` into a standalone buffer of the same width and channels.
    pub fn row_window(&self, rows: Range<usize>) -> Result<PixelBuffer> {
        if rows.start >= rows.end || rows.end > self.height {
            return Err(EngineError::config(format!(
                "row window {}..{} outside 0..{}",
                rows.start, rows.end, self.height
            )));
        }
        let height = rows.end - rows.start;
        PixelBuffer::from_raw(self.width, height, self.channels, self.rows(rows).to_vec())
    }

    /// Same width, height and channel count.
    pub fn same_shape(&self, other: &PixelBuffer) -> bool {
        self.dims() == other.dims()
    }

    /// Fail with `DimensionMismatch` unless `other` has the same shape.
    pub fn ensure_same_shape(&self, other: &PixelBuffer, context: &'static str) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(EngineError::DimensionMismatch {
                context,
                expected: self.dims(),
                found: other.dims(),
            })
        }
    }
}

fn check_dims(width: usize, height: usize, channels: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EngineError::config(format!(
            "buffer dimensions must be non-zero, got {width}x{height}"
        )));
    }
    if !(1..=4).contains(&channels) {
        return Err(EngineError::config(format!(
            "channel count must be 1..=4, got {channels}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_wrong_length() {
        assert!(PixelBuffer::new(0, 4, 3).is_err());
        assert!(PixelBuffer::new(4, 4, 5).is_err());
        assert!(PixelBuffer::from_raw(2, 2, 3, vec![0; 11]).is_err());
        assert!(PixelBuffer::from_raw(2, 2, 3, vec![0; 12]).is_ok());
    }

    #[test]
    fn row_window_copies_requested_rows() {
        let buf = PixelBuffer::from_fn(3, 5, 1, |_, y, _| y as u8).unwrap();
        let window = buf.row_window(1..4).unwrap();
        assert_eq!(window.dims(), (3, 3, 1));
        assert_eq!(window.as_raw(), &[1, 1, 1, 2, 2, 2, 3, 3, 3]);
        assert!(buf.row_window(4..6).is_err());
    }

    #[test]
    fn pixel_addressing_is_row_major() {
        let mut buf = PixelBuffer::new(4, 2, 3).unwrap();
        buf.pixel_mut(1, 1).copy_from_slice(&[7, 8, 9]);
        let idx = (4 + 1) * 3;
        assert_eq!(&buf.as_raw()[idx..idx + 3], &[7, 8, 9]);
        assert_eq!(buf.pixel(1, 1), &[7, 8, 9]);
    }
}
