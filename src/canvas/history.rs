use std::collections::VecDeque;

use crate::buffer::PixelBuffer;
use crate::error::{EngineError, Result};

/// Bounded undo ring plus an unbounded redo stack of whole-image snapshots.
///
/// Redo is only non-empty directly after an undo; the canvas clears it on every
/// new edit.
pub struct History {
    undo_stack: VecDeque<PixelBuffer>,
    redo_stack: Vec<PixelBuffer>,
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Result<Self> {
        if max_depth == 0 {
            return Err(EngineError::config("history depth must be at least 1"));
        }
        Ok(Self {
            undo_stack: VecDeque::with_capacity(max_depth + 1),
            redo_stack: Vec::new(),
            max_depth,
        })
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Push a snapshot, returning the oldest one if the ring overflowed.
    pub fn push_undo(&mut self, snapshot: PixelBuffer) -> Option<PixelBuffer> {
        self.undo_stack.push_back(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front()
        } else {
            None
        }
    }

    pub fn pop_undo(&mut self) -> Option<PixelBuffer> {
        self.undo_stack.pop_back()
    }

    pub fn push_redo(&mut self, snapshot: PixelBuffer) {
        self.redo_stack.push(snapshot);
    }

    pub fn pop_redo(&mut self) -> Option<PixelBuffer> {
        self.redo_stack.pop()
    }

    /// Drop every redo entry, returning how many there were.
    pub fn clear_redo(&mut self) -> usize {
        let n = self.redo_stack.len();
        self.redo_stack.clear();
        n
    }

    /// Drop both stacks, returning the number of snapshots released.
    pub fn clear(&mut self) -> usize {
        let n = self.undo_stack.len() + self.redo_stack.len();
        self.undo_stack.clear();
        self.redo_stack.clear();
        n
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo snapshots, oldest first.
    pub fn iter_undo(&self) -> impl Iterator<Item = &PixelBuffer> {
        self.undo_stack.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(v: u8) -> PixelBuffer {
        PixelBuffer::filled(1, 1, 1, v).unwrap()
    }

    #[test]
    fn ring_evicts_oldest_first() {
        let mut history = History::new(3).unwrap();
        for v in 0..3 {
            assert!(history.push_undo(snap(v)).is_none());
        }
        let evicted = history.push_undo(snap(3)).unwrap();
        assert_eq!(evicted.as_raw(), &[0]);
        let kept: Vec<u8> = history.iter_undo().map(|b| b.as_raw()[0]).collect();
        assert_eq!(kept, vec![1, 2, 3]);
        assert_eq!(history.pop_undo().unwrap().as_raw(), &[3]);
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert!(History::new(0).is_err());
    }

    #[test]
    fn clear_reports_released_snapshots() {
        let mut history = History::new(4).unwrap();
        history.push_undo(snap(1));
        history.push_redo(snap(2));
        history.push_redo(snap(3));
        assert_eq!(history.clear_redo(), 2);
        assert_eq!(history.clear(), 1);
        assert!(!history.can_undo() && !history.can_redo());
    }
}
