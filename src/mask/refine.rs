use crate::buffer::PixelBuffer;
use crate::error::Result;
use crate::filters::{luma, SobelEdges};
use crate::mask::Mask;
use crate::parallel::{TileFilter, TiledFilterExecutor};

/// Edge strength above which a partially covered pixel is pushed towards full coverage.
const EDGE_THRESHOLD: u8 = 80;

/// Sharpen a soft mask along strong image edges.
///
/// Only pixels whose 8-bit coverage `m` lies strictly between 0 and 255 are
/// touched. Where the edge map exceeds the threshold the coverage becomes
/// `min(255, m + edge) / 255`. Every other pixel keeps its exact value.
pub fn refine_with_edges(
    mask: &Mask,
    image: &PixelBuffer,
    executor: &TiledFilterExecutor,
) -> Result<Mask> {
    mask.ensure_covers(image, "edge refinement image")?;
    let gray = luma(image)?;
    let edges = executor.run(&gray, SobelEdges.radius(), &SobelEdges)?;

    let mut refined = mask.clone();
    let mut touched = 0usize;
    for (v, &edge) in refined.data.iter_mut().zip(edges.as_raw()) {
        let m = (*v * 255.0).round().clamp(0.0, 255.0) as u8;
        if m > 0 && m < 255 && edge > EDGE_THRESHOLD {
            *v = f32::from(m.saturating_add(edge)) / 255.0;
            touched += 1;
        }
    }
    log::trace!("edge refinement raised {touched} mask pixels");
    Ok(refined)
}
