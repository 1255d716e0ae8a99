use crate::error::{EngineError, Result};

pub const DEFAULT_SMALL_IMAGE_ROWS: usize = 100;
pub const DEFAULT_TILING_ROWS: usize = 500;
pub const DEFAULT_HISTORY_DEPTH: usize = 7;

/// Tunables shared by the worker pool, the schedulers and the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Worker thread count. 0 means "use hardware parallelism".
    pub worker_threads: usize,
    /// Below this row count the row scheduler runs on the calling thread.
    pub small_image_rows: usize,
    /// Below this row count the tiled executor runs the filter once, untiled.
    pub tiling_rows: usize,
    /// Maximum number of undo snapshots kept by a canvas.
    pub history_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            small_image_rows: DEFAULT_SMALL_IMAGE_ROWS,
            tiling_rows: DEFAULT_TILING_ROWS,
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `RETOUCH_*` environment variables when they parse.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`EngineConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).and_then(|raw| parse_usize(key, &raw));
        let mut config = Self::default();
        if let Some(v) = read("RETOUCH_THREADS") {
            config.worker_threads = v;
        }
        if let Some(v) = read("RETOUCH_HISTORY_DEPTH") {
            config.history_depth = v;
        }
        if let Some(v) = read("RETOUCH_SMALL_IMAGE_ROWS") {
            config.small_image_rows = v;
        }
        if let Some(v) = read("RETOUCH_TILING_ROWS") {
            config.tiling_rows = v;
        }
        config
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_small_image_rows(mut self, rows: usize) -> Self {
        self.small_image_rows = rows;
        self
    }

    pub fn with_tiling_rows(mut self, rows: usize) -> Self {
        self.tiling_rows = rows;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    /// Thread count after resolving the "0 = hardware" default.
    pub fn resolved_threads(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_depth == 0 {
            return Err(EngineError::config("history_depth must be at least 1"));
        }
        Ok(())
    }
}

fn parse_usize(key: &str, raw: &str) -> Option<usize> {
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring {key}={raw:?}: not an unsigned integer");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn variables_override_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("RETOUCH_THREADS", "3"),
            ("RETOUCH_HISTORY_DEPTH", " 12 "),
            ("RETOUCH_SMALL_IMAGE_ROWS", "8"),
            ("RETOUCH_TILING_ROWS", "64"),
        ]));
        assert_eq!(config.worker_threads, 3);
        assert_eq!(config.history_depth, 12);
        assert_eq!(config.small_image_rows, 8);
        assert_eq!(config.tiling_rows, 64);
    }

    #[test]
    fn unparsable_variables_are_ignored() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("RETOUCH_THREADS", "many"),
            ("RETOUCH_HISTORY_DEPTH", "-1"),
            ("RETOUCH_TILING_ROWS", "32"),
        ]));
        let defaults = EngineConfig::default();
        assert_eq!(config.worker_threads, defaults.worker_threads);
        assert_eq!(config.history_depth, defaults.history_depth);
        assert_eq!(config.small_image_rows, defaults.small_image_rows);
        assert_eq!(config.tiling_rows, 32);
    }

    #[test]
    fn defaults_match_engine_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.small_image_rows, 100);
        assert_eq!(config.tiling_rows, 500);
        assert_eq!(config.history_depth, 7);
        assert!(config.resolved_threads() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_history_depth_is_rejected() {
        let config = EngineConfig::default().with_history_depth(0);
        assert!(matches!(
            config.validate(),
            Err(EngineError::Configuration(_))
        ));
    }

    #[test]
    fn explicit_thread_count_wins() {
        let config = EngineConfig::default().with_worker_threads(3);
        assert_eq!(config.resolved_threads(), 3);
    }
}
