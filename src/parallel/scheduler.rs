use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Fixed-size worker pool shared by every scheduler that holds a handle to it.
///
/// Built once and passed around as `Arc<WorkerPool>`; the threads exit when the
/// last handle is dropped or [`WorkerPool::shutdown`] consumes it.
pub struct WorkerPool {
    pool: ThreadPool,
    threads: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(EngineError::config("worker pool needs at least one thread"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("retouch-worker-{i}"))
            .build()
            .map_err(|e| EngineError::config(format!("failed to build worker pool: {e}")))?;
        log::debug!("worker pool started with {threads} threads");
        Ok(Self { pool, threads })
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(config.resolved_threads())
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `op` inside the pool, blocking the caller until it returns.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }

    /// Stop the worker threads.
    pub fn shutdown(self) {
        log::debug!("worker pool with {} threads shutting down", self.threads);
        drop(self.pool);
    }
}

/// Split `total_rows` into `chunks` contiguous ranges of `total_rows / chunks`
/// rows, the last range absorbing the remainder.
///
/// The chunk count is capped at `total_rows` so no range is empty.
pub fn partition_rows(total_rows: usize, chunks: usize) -> Vec<Range<usize>> {
    if total_rows == 0 {
        return Vec::new();
    }
    let chunks = chunks.clamp(1, total_rows);
    let chunk_height = total_rows / chunks;
    (0..chunks)
        .map(|i| {
            let start = i * chunk_height;
            let end = if i == chunks - 1 {
                total_rows
            } else {
                start + chunk_height
            };
            start..end
        })
        .collect()
}

/// Runs per-row-range tasks on a [`WorkerPool`], one task per chunk.
///
/// Every call blocks until all chunks are done. A failing chunk does not cancel
/// its siblings; the lowest-indexed failure is returned after the join.
#[derive(Clone)]
pub struct RowRangeScheduler {
    pool: Arc<WorkerPool>,
    small_image_rows: usize,
}

impl RowRangeScheduler {
    pub fn new(pool: Arc<WorkerPool>, small_image_rows: usize) -> Self {
        Self {
            pool,
            small_image_rows,
        }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    /// Number of chunks a large job is split into.
    pub fn chunk_count(&self) -> usize {
        self.pool.threads()
    }

    pub fn small_image_rows(&self) -> usize {
        self.small_image_rows
    }

    /// Ranges a job of `total_rows` rows would be split into.
    pub fn plan(&self, total_rows: usize) -> Vec<Range<usize>> {
        if total_rows < self.small_image_rows {
            partition_rows(total_rows, 1)
        } else {
            partition_rows(total_rows, self.chunk_count())
        }
    }

    /// Run `task(start, end)` over `[0, total_rows)`.
    ///
    /// The task sees only row bounds; whatever it touches must be safe to share.
    /// Use [`RowRangeScheduler::run_rows_mut`] to write into a buffer.
    pub fn run<F>(&self, total_rows: usize, task: F) -> Result<()>
    where
        F: Fn(usize, usize) -> Result<()> + Sync,
    {
        if total_rows == 0 {
            return Ok(());
        }
        if total_rows < self.small_image_rows {
            return task(0, total_rows);
        }

        let ranges = partition_rows(total_rows, self.chunk_count());
        let outcomes: Vec<Result<()>> = self.pool.install(|| {
            ranges
                .par_iter()
                .enumerate()
                .map(|(chunk, rows)| run_chunk(chunk, rows, || task(rows.start, rows.end)))
                .collect()
        });
        first_failure(outcomes)
    }

    /// Run `task(start, end, rows)` where `rows` holds exactly the samples of
    /// rows `start..end` of `data`.
    ///
    /// `data` is split up front, so each chunk writes only its own rows.
    pub fn run_rows_mut<F>(&self, data: &mut [u8], row_len: usize, task: F) -> Result<()>
    where
        F: Fn(usize, usize, &mut [u8]) -> Result<()> + Sync,
    {
        if row_len == 0 || data.len() % row_len != 0 {
            return Err(EngineError::config(format!(
                "buffer of {} samples is not a whole number of {row_len}-sample rows",
                data.len()
            )));
        }
        let total_rows = data.len() / row_len;
        if total_rows == 0 {
            return Ok(());
        }
        if total_rows < self.small_image_rows {
            return task(0, total_rows, data);
        }

        let ranges = partition_rows(total_rows, self.chunk_count());
        let mut chunks = Vec::with_capacity(ranges.len());
        let mut rest = data;
        for rows in ranges {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(rows.len() * row_len);
            chunks.push((rows, head));
            rest = tail;
        }

        let outcomes: Vec<Result<()>> = self.pool.install(|| {
            chunks
                .into_par_iter()
                .enumerate()
                .map(|(chunk, (rows, samples))| {
                    run_chunk(chunk, &rows, || task(rows.start, rows.end, samples))
                })
                .collect()
        });
        first_failure(outcomes)
    }
}

/// Run one chunk, turning errors and panics into `WorkerFailure`.
fn run_chunk(chunk: usize, rows: &Range<usize>, job: impl FnOnce() -> Result<()>) -> Result<()> {
    let failure = |message: String| EngineError::WorkerFailure {
        chunk,
        start: rows.start,
        end: rows.end,
        message,
    };
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(failure(err.to_string())),
        Err(payload) => Err(failure(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

fn first_failure(outcomes: Vec<Result<()>>) -> Result<()> {
    let mut failures = outcomes.into_iter().filter_map(Result::err);
    match failures.next() {
        None => Ok(()),
        Some(first) => {
            let others = failures.count();
            if others > 0 {
                log::warn!("{others} more chunk(s) failed after: {first}");
            }
            Err(first)
        }
    }
}
