use crate::error::{EngineError, Result};
use crate::mask::Mask;

/// Linear ramp from full coverage at `start` to none at `end`.
///
/// Each pixel is projected onto the `start -> end` segment; the projection
/// parameter `t` is clamped to `[0, 1]` and coverage is `1 - t`. A zero-length
/// segment gives full coverage everywhere.
pub fn linear_gradient(
    width: usize,
    height: usize,
    start: (f32, f32),
    end: (f32, f32),
) -> Result<Mask> {
    let mut mask = Mask::new(width, height)?;
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f32::EPSILON {
        mask.fill(1.0);
        return Ok(mask);
    }

    for y in 0..height {
        let py = y as f32 - start.1;
        for x in 0..width {
            let px = x as f32 - start.0;
            let t = (px * dx + py * dy) / length_sq;
            mask.set(x, y, 1.0 - t.clamp(0.0, 1.0));
        }
    }
    Ok(mask)
}

/// Radial falloff: full coverage at `center`, none at `radius` and beyond.
pub fn radial_gradient(
    width: usize,
    height: usize,
    center: (f32, f32),
    radius: f32,
) -> Result<Mask> {
    if !(radius > 0.0) {
        return Err(EngineError::config(format!(
            "radial gradient radius must be positive, got {radius}"
        )));
    }
    let mut mask = Mask::new(width, height)?;
    for y in 0..height {
        let dy = y as f32 - center.1;
        for x in 0..width {
            let dx = x as f32 - center.0;
            let distance = (dx * dx + dy * dy).sqrt();
            mask.set(x, y, 1.0 - distance / radius);
        }
    }
    Ok(mask)
}
