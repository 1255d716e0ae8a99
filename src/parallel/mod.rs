pub mod scheduler;
pub mod tiled;

pub use scheduler::{partition_rows, RowRangeScheduler, WorkerPool};
pub use tiled::{FnFilter, TileFilter, TiledFilterExecutor};
