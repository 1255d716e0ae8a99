use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};
use crate::filters::blur::clamp_index;
use crate::parallel::TileFilter;

/// Edge strength map of a single-channel image.
///
/// Smooths with a 3x3 binomial kernel, takes 3x3 sobel derivatives, saturates
/// their magnitudes to 8 bits and averages the two. Reads two rows on each side.
#[derive(Clone, Copy, Debug, Default)]
pub struct SobelEdges;

impl TileFilter for SobelEdges {
    fn radius(&self) -> usize {
        2
    }

    fn process(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        if input.channels() != 1 {
            return Err(EngineError::config(format!(
                "sobel edges expect a single-channel image, got {} channels",
                input.channels()
            )));
        }
        let (w, h, _) = input.dims();
        let smooth = smooth3(input.as_raw(), w, h);
        let at = |x: isize, y: isize| smooth[clamp_index(y, h) * w + clamp_index(x, w)] as i32;

        let mut out = vec![0u8; w * h];
        for y in 0..h as isize {
            for x in 0..w as isize {
                let gx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
                let gy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                    - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
                let ax = gx.unsigned_abs().min(255);
                let ay = gy.unsigned_abs().min(255);
                out[y as usize * w + x as usize] = ((ax + ay + 1) / 2) as u8;
            }
        }
        PixelBuffer::from_raw(w, h, 1, out)
    }
}

/// 3x3 `[1 2 1]` binomial smoothing with replicated border.
fn smooth3(src: &[u8], w: usize, h: usize) -> Vec<u8> {
    let mut horizontal = vec![0u16; w * h];
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let l = src[row + clamp_index(x as isize - 1, w)] as u16;
            let r = src[row + clamp_index(x as isize + 1, w)] as u16;
            horizontal[row + x] = l + 2 * src[row + x] as u16 + r;
        }
    }
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let up = clamp_index(y as isize - 1, h) * w;
        let down = clamp_index(y as isize + 1, h) * w;
        let row = y * w;
        for x in 0..w {
            let sum = horizontal[up + x] + 2 * horizontal[row + x] + horizontal[down + x];
            out[row + x] = ((sum + 8) / 16) as u8;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_has_no_edges() {
        let flat = PixelBuffer::filled(6, 6, 1, 120).unwrap();
        let edges = SobelEdges.process(&flat).unwrap();
        assert!(edges.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn vertical_step_is_detected() {
        let step = PixelBuffer::from_fn(8, 4, 1, |x, _, _| if x < 4 { 0 } else { 255 }).unwrap();
        let edges = SobelEdges.process(&step).unwrap();
        assert!(edges.pixel(4, 2)[0] > 80);
        assert_eq!(edges.pixel(0, 2)[0], 0);
    }

    #[test]
    fn rejects_color_input() {
        let rgb = PixelBuffer::new(4, 4, 3).unwrap();
        assert!(SobelEdges.process(&rgb).is_err());
    }
}
