use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusty_retouch::filters::{BoxBlur, GaussianBlur};
use rusty_retouch::{Engine, EngineConfig, PixelBuffer, TileFilter};

fn random_image(width: usize, height: usize, channels: usize) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    PixelBuffer::from_fn(width, height, channels, |_, _, _| rng.random()).unwrap()
}

fn bench_gaussian_by_threads(c: &mut Criterion) {
    let source = random_image(1024, 1024, 3);
    let blur = GaussianBlur::new(2.0).unwrap();

    let mut group = c.benchmark_group("gaussian_1024");
    group.throughput(Throughput::Elements((1024 * 1024) as u64));
    group.sample_size(10);

    for threads in [1usize, 2, 4, 8] {
        let engine = Engine::new(&EngineConfig::default().with_worker_threads(threads)).unwrap();
        group.bench_with_input(BenchmarkId::new("tiled", threads), &threads, |b, _| {
            b.iter(|| {
                black_box(
                    engine
                        .executor()
                        .run(black_box(&source), blur.radius(), &blur)
                        .unwrap(),
                )
            })
        });
    }

    // Untiled baseline on the calling thread.
    group.bench_function("untiled", |b| {
        b.iter(|| black_box(blur.process(black_box(&source)).unwrap()))
    });

    group.finish();
}

fn bench_box_blur_radius(c: &mut Criterion) {
    let source = random_image(512, 2048, 1);
    let engine = Engine::new(&EngineConfig::default()).unwrap();

    let mut group = c.benchmark_group("box_blur_radius");
    group.sample_size(10);
    for radius in [1usize, 4, 13] {
        let blur = BoxBlur::new(radius).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, _| {
            b.iter(|| black_box(engine.executor().run(&source, radius, &blur).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_gaussian_by_threads, bench_box_blur_radius);
criterion_main!(benches);
