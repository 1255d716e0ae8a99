use std::path::Path;

use crate::buffer::PixelBuffer;
use crate::canvas::analysis::ImageAnalysis;
use crate::canvas::history::History;
use crate::codec::{self, ExportFormat};
use crate::config::EngineConfig;
use crate::effects;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::mask::Mask;
use crate::parallel::{RowRangeScheduler, TileFilter};
use crate::utils::profiler::ScopeTimer;

/// Single-owner image with bounded undo and redo.
///
/// Every edit goes through [`EditableCanvas::commit_edit`] or
/// [`EditableCanvas::commit_in_place`], which record exactly one snapshot of
/// the pre-edit image. A failed edit leaves the image and its history as they
/// were.
pub struct EditableCanvas {
    current: Option<PixelBuffer>,
    history: History,
    analysis: Option<ImageAnalysis>,
}

impl EditableCanvas {
    pub fn new(buffer: PixelBuffer, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let history = History::new(config.history_depth)?;
        log::debug!(
            "canvas opened: {}x{}x{}, history depth {}",
            buffer.width(),
            buffer.height(),
            buffer.channels(),
            config.history_depth
        );
        let analysis = Some(ImageAnalysis::of(&buffer));
        Ok(Self {
            current: Some(buffer),
            history,
            analysis,
        })
    }

    /// Decode `bytes` and open a canvas on the result.
    pub fn from_bytes(bytes: &[u8], config: &EngineConfig) -> Result<Self> {
        Self::new(codec::decode(bytes)?, config)
    }

    pub fn current(&self) -> Result<&PixelBuffer> {
        self.current.as_ref().ok_or_else(released)
    }

    pub fn analysis(&self) -> Result<&ImageAnalysis> {
        self.analysis.as_ref().ok_or_else(released)
    }

    pub fn is_released(&self) -> bool {
        self.current.is_none()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Record a copy of the current image as an undo point.
    pub fn save_step(&mut self) -> Result<()> {
        let snapshot = self.current()?.clone();
        self.record(snapshot);
        Ok(())
    }

    /// Replace the current image without touching history.
    pub fn swap_image(&mut self, image: PixelBuffer) -> Result<()> {
        let slot = self.current.as_mut().ok_or_else(released)?;
        *slot = image;
        self.refresh_analysis();
        Ok(())
    }

    /// Build a new image from the current one. On success the old image becomes
    /// the undo snapshot; on failure nothing changes.
    pub fn commit_edit<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&PixelBuffer) -> Result<PixelBuffer>,
    {
        let next = edit(self.current()?)?;
        if let Some(previous) = self.current.replace(next) {
            self.record(previous);
        }
        self.refresh_analysis();
        Ok(())
    }

    /// Mutate the current image in place, restoring it if `edit` fails.
    pub fn commit_in_place<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut PixelBuffer) -> Result<()>,
    {
        let current = self.current.as_mut().ok_or_else(released)?;
        let snapshot = current.clone();
        match edit(current) {
            Ok(()) => {
                self.record(snapshot);
                self.refresh_analysis();
                Ok(())
            }
            Err(err) => {
                *current = snapshot;
                Err(err)
            }
        }
    }

    /// Step back one edit. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(current) = self.current.take() else {
            return false;
        };
        match self.history.pop_undo() {
            Some(previous) => {
                self.history.push_redo(current);
                self.current = Some(previous);
                self.refresh_analysis();
                true
            }
            None => {
                self.current = Some(current);
                false
            }
        }
    }

    /// Re-apply the last undone edit. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(current) = self.current.take() else {
            return false;
        };
        match self.history.pop_redo() {
            Some(next) => {
                self.push_undo(current);
                self.current = Some(next);
                self.refresh_analysis();
                true
            }
            None => {
                self.current = Some(current);
                false
            }
        }
    }

    /// Drop the image and every snapshot. Later edits fail; undo/redo do nothing.
    pub fn release(&mut self) {
        let image = self.current.take();
        let snapshots = self.history.clear();
        self.analysis = None;
        if image.is_some() || snapshots > 0 {
            log::debug!("canvas released with {snapshots} history snapshots");
        }
    }

    /// Run a neighborhood filter over the whole image.
    pub fn apply_filter<F>(&mut self, engine: &Engine, filter: &F) -> Result<()>
    where
        F: TileFilter + ?Sized,
    {
        let _timer = ScopeTimer::new("canvas_apply_filter");
        self.commit_edit(|current| engine.executor().run(current, filter.radius(), filter))
    }

    /// Run a filter and keep its output only where `mask` covers.
    pub fn apply_masked_filter<F>(
        &mut self,
        engine: &Engine,
        filter: &F,
        mask: &Mask,
    ) -> Result<()>
    where
        F: TileFilter + ?Sized,
    {
        let _timer = ScopeTimer::new("canvas_apply_masked_filter");
        self.commit_edit(|current| effects::masked_filter(engine, current, filter, mask))
    }

    /// Run a row-parallel in-place operation such as [`crate::filters::grayscale`].
    pub fn apply_point<F>(&mut self, engine: &Engine, op: F) -> Result<()>
    where
        F: FnOnce(&RowRangeScheduler, &mut PixelBuffer) -> Result<()>,
    {
        let _timer = ScopeTimer::new("canvas_apply_point");
        self.commit_in_place(|current| op(engine.scheduler(), current))
    }

    pub fn encode(&self, format: ExportFormat) -> Result<Vec<u8>> {
        codec::encode(self.current()?, format)
    }

    pub fn save(&self, path: &Path, scale: f64) -> Result<()> {
        codec::save(self.current()?, path, scale)
    }

    /// New undo point: redo is invalidated, the ring may evict its oldest entry.
    fn record(&mut self, snapshot: PixelBuffer) {
        let dropped = self.history.clear_redo();
        if dropped > 0 {
            log::trace!("new edit discarded {dropped} redo snapshots");
        }
        self.push_undo(snapshot);
    }

    fn push_undo(&mut self, snapshot: PixelBuffer) {
        if self.history.push_undo(snapshot).is_some() {
            log::trace!(
                "undo history full at {}, evicted oldest snapshot",
                self.history.max_depth()
            );
        }
    }

    fn refresh_analysis(&mut self) {
        self.analysis = self.current.as_ref().map(ImageAnalysis::of);
    }
}

impl Drop for EditableCanvas {
    fn drop(&mut self) {
        self.release();
    }
}

fn released() -> EngineError {
    EngineError::config("canvas has been released")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas(depth: usize) -> EditableCanvas {
        let config = EngineConfig::default().with_history_depth(depth);
        EditableCanvas::new(PixelBuffer::filled(2, 2, 1, 0).unwrap(), &config).unwrap()
    }

    fn value(canvas: &EditableCanvas) -> u8 {
        canvas.current().unwrap().as_raw()[0]
    }

    fn set(canvas: &mut EditableCanvas, v: u8) {
        canvas
            .commit_edit(|_| PixelBuffer::filled(2, 2, 1, v))
            .unwrap();
    }

    #[test]
    fn edit_undo_redo_cycle() {
        let mut canvas = canvas(7);
        set(&mut canvas, 1);
        set(&mut canvas, 2);
        assert!(canvas.undo());
        assert_eq!(value(&canvas), 1);
        assert!(canvas.redo());
        assert_eq!(value(&canvas), 2);
        assert!(!canvas.redo());
    }

    #[test]
    fn failed_in_place_edit_restores_image() {
        let mut canvas = canvas(7);
        let err = canvas.commit_in_place(|buf| {
            buf.as_raw_mut().fill(99);
            Err(EngineError::config("nope"))
        });
        assert!(err.is_err());
        assert_eq!(value(&canvas), 0);
        assert_eq!(canvas.undo_depth(), 0);
    }

    #[test]
    fn swap_image_leaves_history_alone() {
        let mut canvas = canvas(7);
        canvas.swap_image(PixelBuffer::filled(3, 1, 3, 50).unwrap()).unwrap();
        assert_eq!(canvas.undo_depth(), 0);
        assert_eq!(canvas.analysis().unwrap().color_space, "RGB");
    }

    #[test]
    fn released_canvas_rejects_edits() {
        let mut canvas = canvas(7);
        set(&mut canvas, 1);
        canvas.release();
        assert!(canvas.is_released());
        assert!(!canvas.undo());
        assert!(canvas.save_step().is_err());
        assert!(canvas.current().is_err());
        assert_eq!(canvas.undo_depth(), 0);
    }
}
