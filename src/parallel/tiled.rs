use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::error::Result;
use crate::parallel::scheduler::{RowRangeScheduler, WorkerPool};
use crate::utils::profiler::ScopeTimer;

/// A filter that maps an input window to an output window of the same size.
///
/// `process` takes `&self` and implementors must be `Sync`: the same filter value
/// runs concurrently on overlapping windows, so its output may depend only on the
/// window it is given.
pub trait TileFilter: Sync {
    /// Rows above and below an output row that the filter reads.
    fn radius(&self) -> usize {
        0
    }

    fn process(&self, input: &PixelBuffer) -> Result<PixelBuffer>;
}

/// Wraps a pure closure as a [`TileFilter`] with a declared radius.
pub struct FnFilter<F> {
    radius: usize,
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(&PixelBuffer) -> PixelBuffer + Sync,
{
    pub fn new(radius: usize, f: F) -> Self {
        Self { radius, f }
    }
}

impl<F> TileFilter for FnFilter<F>
where
    F: Fn(&PixelBuffer) -> PixelBuffer + Sync,
{
    fn radius(&self) -> usize {
        self.radius
    }

    fn process(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        Ok((self.f)(input))
    }
}

/// Runs neighborhood filters chunk by chunk with a ghost border around each chunk.
///
/// Each chunk reads `padding` extra rows above and below the rows it owns, filters
/// that window, then keeps only its own rows. With `padding >= radius` the result
/// matches a single whole-image run exactly.
#[derive(Clone)]
pub struct TiledFilterExecutor {
    scheduler: RowRangeScheduler,
    tiling_rows: usize,
}

impl TiledFilterExecutor {
    pub fn new(pool: Arc<WorkerPool>, small_image_rows: usize, tiling_rows: usize) -> Self {
        Self::from_scheduler(RowRangeScheduler::new(pool, small_image_rows), tiling_rows)
    }

    pub fn from_scheduler(scheduler: RowRangeScheduler, tiling_rows: usize) -> Self {
        Self {
            scheduler,
            tiling_rows,
        }
    }

    pub fn scheduler(&self) -> &RowRangeScheduler {
        &self.scheduler
    }

    pub fn tiling_rows(&self) -> usize {
        self.tiling_rows
    }

    /// Filter `source` into `destination`, which is reallocated if its shape differs.
    ///
    /// On error the destination contents are unspecified.
    pub fn apply<F>(
        &self,
        source: &PixelBuffer,
        destination: &mut PixelBuffer,
        padding: usize,
        filter: &F,
    ) -> Result<()>
    where
        F: TileFilter + ?Sized,
    {
        let _timer = ScopeTimer::new("tiled_apply");

        if padding < filter.radius() {
            log::warn!(
                "padding {padding} is below filter radius {}; chunk seams will show",
                filter.radius()
            );
        }
        if !destination.same_shape(source) {
            *destination = PixelBuffer::new(source.width(), source.height(), source.channels())?;
        }

        let total_rows = source.height();
        if total_rows < self.tiling_rows {
            let out = filter.process(source)?;
            source.ensure_same_shape(&out, "tile filter output")?;
            *destination = out;
            return Ok(());
        }

        let row_len = source.row_len();
        self.scheduler
            .run_rows_mut(destination.as_raw_mut(), row_len, |start, end, rows| {
                let pad_top = start.saturating_sub(padding);
                let pad_bottom = end.saturating_add(padding).min(total_rows);
                let window = source.row_window(pad_top..pad_bottom)?;
                let out = filter.process(&window)?;
                window.ensure_same_shape(&out, "tile filter output")?;

                let local = start - pad_top;
                rows.copy_from_slice(out.rows(local..local + (end - start)));
                Ok(())
            })
    }

    /// [`TiledFilterExecutor::apply`] with `padding` set to the filter's radius.
    pub fn apply_auto<F>(
        &self,
        source: &PixelBuffer,
        destination: &mut PixelBuffer,
        filter: &F,
    ) -> Result<()>
    where
        F: TileFilter + ?Sized,
    {
        self.apply(source, destination, filter.radius(), filter)
    }

    /// Filter `source` into a freshly allocated buffer.
    pub fn run<F>(&self, source: &PixelBuffer, padding: usize, filter: &F) -> Result<PixelBuffer>
    where
        F: TileFilter + ?Sized,
    {
        let mut destination =
            PixelBuffer::new(source.width(), source.height(), source.channels())?;
        self.apply(source, &mut destination, padding, filter)?;
        Ok(destination)
    }
}
