use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusty_retouch::mask::{blend, radial_gradient};
use rusty_retouch::{Engine, EngineConfig, Mask, PixelBuffer};

fn random_image(width: usize, height: usize, channels: usize, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    PixelBuffer::from_fn(width, height, channels, |_, _, _| rng.random()).unwrap()
}

fn bench_blend_channels(c: &mut Criterion) {
    let (w, h) = (1024, 768);
    let mask = radial_gradient(w, h, (w as f32 / 2.0, h as f32 / 2.0), 500.0).unwrap();
    let engine = Engine::new(&EngineConfig::default()).unwrap();

    let mut group = c.benchmark_group("blend");
    group.throughput(Throughput::Elements((w * h) as u64));

    // 4 channels takes the f32x4 path, 3 the scalar one.
    for channels in [3usize, 4] {
        let base = random_image(w, h, channels, 1);
        let overlay = random_image(w, h, channels, 2);

        group.bench_with_input(BenchmarkId::new("serial", channels), &channels, |b, _| {
            let mut out = overlay.clone();
            b.iter(|| blend(black_box(&base), black_box(&mut out), black_box(&mask)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("parallel", channels), &channels, |b, _| {
            let mut out = overlay.clone();
            b.iter(|| {
                engine
                    .compositor()
                    .blend(black_box(&base), black_box(&mut out), black_box(&mask))
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_brush_dabs(c: &mut Criterion) {
    let mut mask = Mask::new(2048, 2048).unwrap();
    c.bench_function("mask_paint_soft_r64", |b| {
        let mut x = 0;
        b.iter(|| {
            x = (x + 37) % 2048;
            mask.paint(black_box(x), 1024, 64.0, 0.3);
        })
    });
}

criterion_group!(benches, bench_blend_channels, bench_brush_dabs);
criterion_main!(benches);
