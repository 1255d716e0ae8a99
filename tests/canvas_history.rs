mod common;

use common::{engine, random_image};
use rusty_retouch::filters::{self, GaussianBlur};
use rusty_retouch::{EditableCanvas, EngineConfig, EngineError, PixelBuffer};

fn flat(v: u8) -> PixelBuffer {
    PixelBuffer::filled(4, 3, 3, v).unwrap()
}

fn value(canvas: &EditableCanvas) -> u8 {
    canvas.current().unwrap().as_raw()[0]
}

#[test]
fn eighth_save_step_evicts_the_oldest() {
    let mut canvas = EditableCanvas::new(flat(0), &EngineConfig::default()).unwrap();
    for v in 1..=8u8 {
        canvas.save_step().unwrap();
        canvas.swap_image(flat(v)).unwrap();
        assert!(canvas.undo_depth() <= 7);
    }
    assert_eq!(canvas.undo_depth(), 7);

    // Snapshots 1..=7 survive; the one holding 0 was evicted.
    let mut seen = Vec::new();
    while canvas.undo() {
        seen.push(value(&canvas));
    }
    assert_eq!(seen, vec![7, 6, 5, 4, 3, 2, 1]);
    assert!(!canvas.undo());
}

#[test]
fn history_depth_is_configurable() {
    let config = EngineConfig::default().with_history_depth(2);
    let mut canvas = EditableCanvas::new(flat(0), &config).unwrap();
    for v in 1..=5 {
        canvas.commit_edit(|_| PixelBuffer::filled(4, 3, 3, v)).unwrap();
    }
    assert_eq!(canvas.undo_depth(), 2);
}

#[test]
fn undo_redo_round_trip_is_exact() {
    let engine = engine(4, 1, 8);
    let original = random_image(31, 40, 3, 17);
    let mut canvas = engine.canvas(original.clone()).unwrap();

    canvas.apply_filter(&engine, &GaussianBlur::new(1.2).unwrap()).unwrap();
    let blurred = canvas.current().unwrap().clone();
    assert_ne!(blurred, original);
    assert_eq!(canvas.undo_depth(), 1);

    assert!(canvas.undo());
    assert_eq!(canvas.current().unwrap(), &original);
    assert!(canvas.can_redo());
    assert!(canvas.redo());
    assert_eq!(canvas.current().unwrap(), &blurred);
    assert!(canvas.undo());
    assert_eq!(canvas.current().unwrap(), &original);
}

#[test]
fn new_edit_after_undo_clears_redo() {
    let engine = engine(2, 1, 8);
    let mut canvas = engine.canvas(random_image(8, 8, 3, 2)).unwrap();
    canvas.apply_point(&engine, filters::grayscale).unwrap();
    canvas.apply_point(&engine, filters::sepia).unwrap();
    assert!(canvas.undo());
    assert_eq!(canvas.redo_depth(), 1);

    canvas.apply_point(&engine, filters::flip_horizontal).unwrap();
    assert_eq!(canvas.redo_depth(), 0);
    assert!(!canvas.redo());
    assert_eq!(canvas.undo_depth(), 2);
}

#[test]
fn undo_and_redo_on_empty_stacks_do_nothing() {
    let mut canvas = EditableCanvas::new(flat(9), &EngineConfig::default()).unwrap();
    assert!(!canvas.undo());
    assert!(!canvas.redo());
    assert_eq!(value(&canvas), 9);
}

#[test]
fn failed_edits_leave_image_and_history_untouched() {
    let engine = engine(4, 1, 4);
    let mut canvas = engine.canvas(random_image(6, 20, 1, 8)).unwrap();
    canvas.apply_point(&engine, filters::grayscale).unwrap();
    let before = canvas.current().unwrap().clone();
    let (undo, redo) = (canvas.undo_depth(), canvas.redo_depth());

    let err = canvas
        .commit_edit(|current| filters::crop(current, 5, 5, 4, 4))
        .unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));

    // Sepia needs color; the single-channel image makes it fail mid-edit.
    assert!(canvas.apply_point(&engine, filters::sepia).is_err());

    let err = canvas
        .apply_point(&engine, |scheduler, buf| {
            filters::brightness_contrast(scheduler, buf, 2.0, 0.0)?;
            Err(EngineError::Configuration("abort after writing".into()))
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));

    assert_eq!(canvas.current().unwrap(), &before);
    assert_eq!((canvas.undo_depth(), canvas.redo_depth()), (undo, redo));
}

#[test]
fn analysis_tracks_the_current_image() {
    let engine = engine(2, 1, 8);
    let mut canvas = engine.canvas(PixelBuffer::filled(10, 5, 3, 40).unwrap()).unwrap();
    assert_eq!(canvas.analysis().unwrap().average_brightness, 40.0);

    canvas.commit_edit(filters::crop_center_square).unwrap();
    let analysis = canvas.analysis().unwrap();
    assert_eq!((analysis.width, analysis.height), (5, 5));
    assert_eq!(analysis.aspect_ratio, 1.0);

    assert!(canvas.undo());
    assert_eq!(canvas.analysis().unwrap().width, 10);
}

#[test]
fn zero_history_depth_is_rejected() {
    let config = EngineConfig::default().with_history_depth(0);
    let err = EditableCanvas::new(flat(0), &config).err().unwrap();
    assert!(matches!(err, EngineError::Configuration(_)));
}
