//! Neighborhood filters for the tiled executor, and point and geometry operations.

pub mod blur;
pub mod edges;
pub mod geometry;
pub mod motion;
pub mod tone;

pub use blur::{BoxBlur, GaussianBlur};
pub use edges::SobelEdges;
pub use geometry::{crop, crop_center_square, flip_horizontal, resize, scale};
pub use motion::MotionBlur;
pub use tone::{brightness_contrast, grayscale, luma, sepia, vignette};
