//! Region-limited effects. Each one builds a new image and leaves its input alone.

use crate::buffer::PixelBuffer;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::filters::{grayscale, resize, GaussianBlur, MotionBlur};
use crate::mask::Mask;
use crate::parallel::TileFilter;
use crate::utils::profiler::ScopeTimer;

/// Filter `source`, then keep the filtered pixels only where `mask` covers.
pub fn masked_filter<F>(
    engine: &Engine,
    source: &PixelBuffer,
    filter: &F,
    mask: &Mask,
) -> Result<PixelBuffer>
where
    F: TileFilter + ?Sized,
{
    let _timer = ScopeTimer::new("masked_filter");
    mask.ensure_covers(source, "masked filter mask")?;
    let mut filtered = engine.executor().run(source, filter.radius(), filter)?;
    engine.compositor().blend(source, &mut filtered, mask)?;
    Ok(filtered)
}

/// Blur the background with a gaussian of `sigma`, keeping the subject sharp.
pub fn portrait(
    engine: &Engine,
    source: &PixelBuffer,
    subject: &Mask,
    sigma: f32,
) -> Result<PixelBuffer> {
    let _timer = ScopeTimer::new("portrait");
    let blur = GaussianBlur::new(sigma)?;
    mask_keeps_subject(engine, source, subject, |engine| {
        engine.executor().run(source, blur.radius(), &blur)
    })
}

/// Streak the background along `angle` degrees over `length` pixels, keeping the
/// subject still.
pub fn motion_blur(
    engine: &Engine,
    source: &PixelBuffer,
    subject: &Mask,
    length: usize,
    angle: f32,
) -> Result<PixelBuffer> {
    let _timer = ScopeTimer::new("motion_blur");
    let blur = MotionBlur::new(length, angle)?;
    mask_keeps_subject(engine, source, subject, |engine| {
        engine.executor().run(source, blur.radius(), &blur)
    })
}

/// Desaturate everything outside the subject.
pub fn color_splash(engine: &Engine, source: &PixelBuffer, subject: &Mask) -> Result<PixelBuffer> {
    let _timer = ScopeTimer::new("color_splash");
    mask_keeps_subject(engine, source, subject, |engine| {
        let mut gray = source.clone();
        grayscale(engine.scheduler(), &mut gray)?;
        Ok(gray)
    })
}

/// Put the subject in front of `background`.
///
/// A background of another size is resized to the source first. Its channel
/// count must match.
pub fn replace_background(
    engine: &Engine,
    source: &PixelBuffer,
    subject: &Mask,
    background: &PixelBuffer,
) -> Result<PixelBuffer> {
    let _timer = ScopeTimer::new("replace_background");
    if background.channels() != source.channels() {
        return Err(EngineError::DimensionMismatch {
            context: "replacement background channels",
            expected: source.dims(),
            found: background.dims(),
        });
    }
    mask_keeps_subject(engine, source, subject, |_| {
        resize(background, source.width(), source.height())
    })
}

/// Composite the original `source` over a derived backdrop by `subject`.
fn mask_keeps_subject(
    engine: &Engine,
    source: &PixelBuffer,
    subject: &Mask,
    backdrop: impl FnOnce(&Engine) -> Result<PixelBuffer>,
) -> Result<PixelBuffer> {
    subject.ensure_covers(source, "subject mask")?;
    let backdrop = backdrop(engine)?;
    let mut out = source.clone();
    engine.compositor().blend(&backdrop, &mut out, subject)?;
    Ok(out)
}
