#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusty_retouch::{Engine, EngineConfig, PixelBuffer};

pub fn engine(threads: usize, small_image_rows: usize, tiling_rows: usize) -> Engine {
    let config = EngineConfig::default()
        .with_worker_threads(threads)
        .with_small_image_rows(small_image_rows)
        .with_tiling_rows(tiling_rows);
    Engine::new(&config).unwrap()
}

pub fn random_image(width: usize, height: usize, channels: usize, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    PixelBuffer::from_fn(width, height, channels, |_, _, _| rng.random()).unwrap()
}
