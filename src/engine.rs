use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::canvas::EditableCanvas;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::mask::MaskCompositor;
use crate::parallel::{RowRangeScheduler, TiledFilterExecutor, WorkerPool};

/// One worker pool and the schedulers that share it.
///
/// Build one per process (or per test) and pass it by reference to canvases
/// and effects.
pub struct Engine {
    config: EngineConfig,
    pool: Arc<WorkerPool>,
    scheduler: RowRangeScheduler,
    executor: TiledFilterExecutor,
    compositor: MaskCompositor,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = Arc::new(WorkerPool::from_config(config)?);
        Self::with_pool(config, pool)
    }

    /// Share an existing pool.
    pub fn with_pool(config: &EngineConfig, pool: Arc<WorkerPool>) -> Result<Self> {
        config.validate()?;
        let scheduler = RowRangeScheduler::new(Arc::clone(&pool), config.small_image_rows);
        let executor = TiledFilterExecutor::from_scheduler(scheduler.clone(), config.tiling_rows);
        let compositor = MaskCompositor::new(scheduler.clone());
        log::info!(
            "engine ready: {} threads, small image below {} rows, tiling from {} rows",
            pool.threads(),
            config.small_image_rows,
            config.tiling_rows
        );
        Ok(Self {
            config: config.clone(),
            pool,
            scheduler,
            executor,
            compositor,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn scheduler(&self) -> &RowRangeScheduler {
        &self.scheduler
    }

    pub fn executor(&self) -> &TiledFilterExecutor {
        &self.executor
    }

    pub fn compositor(&self) -> &MaskCompositor {
        &self.compositor
    }

    /// Open a canvas using this engine's history depth.
    pub fn canvas(&self, image: PixelBuffer) -> Result<EditableCanvas> {
        EditableCanvas::new(image, &self.config)
    }

    /// Decode `bytes` and open a canvas on the result.
    pub fn open(&self, bytes: &[u8]) -> Result<EditableCanvas> {
        EditableCanvas::from_bytes(bytes, &self.config)
    }

    /// Stop the worker threads if no other engine shares the pool.
    pub fn shutdown(self) {
        let Self {
            pool,
            scheduler,
            executor,
            compositor,
            ..
        } = self;
        drop((scheduler, executor, compositor));
        match Arc::try_unwrap(pool) {
            Ok(pool) => pool.shutdown(),
            Err(shared) => log::debug!(
                "worker pool still has {} other handles, leaving it running",
                Arc::strong_count(&shared) - 1
            ),
        }
    }
}
