pub mod analysis;
pub mod canvas;
pub mod history;

pub use analysis::ImageAnalysis;
pub use canvas::EditableCanvas;
pub use history::History;
