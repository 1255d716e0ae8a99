pub mod buffer;
pub mod canvas;
pub mod cli;
pub mod codec;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod filters;
pub mod mask;
pub mod parallel;
pub mod utils;

pub use buffer::PixelBuffer;
pub use canvas::{EditableCanvas, ImageAnalysis};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use mask::{Mask, MaskCompositor, Segmenter};
pub use parallel::{FnFilter, RowRangeScheduler, TileFilter, TiledFilterExecutor, WorkerPool};
