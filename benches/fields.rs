//! Benchmarks for grid sampling and per-frame field updates.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glyphdust::image_field::{CellColor, ImageField, ImageParticle};
use glyphdust::input::{InputContext, PointerState};
use glyphdust::{sample_grid, GridRequest, ImageFieldConfig, TextField, TextFieldConfig, Vec2};

fn gradient(side: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((side * side * 4) as usize);
    for y in 0..side {
        for x in 0..side {
            data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
        }
    }
    data
}

fn bench_sample_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_grid");

    for side in [256u32, 1024] {
        let data = gradient(side);
        for grid_size in [10u32, 50, 100] {
            let request = GridRequest {
                image_data: data.clone(),
                width: side,
                height: side,
                grid_size,
            };
            group.bench_with_input(
                BenchmarkId::new(format!("{}px", side), grid_size),
                &request,
                |b, request| b.iter(|| black_box(sample_grid(request))),
            );
        }
    }

    group.finish();
}

fn bench_text_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_step");

    for word in ["HI", "HELLO WORLD", "ABCDEFGHIJKLMNOPQRST"] {
        group.bench_function(BenchmarkId::from_parameter(word.len()), |b| {
            let config = TextFieldConfig {
                seed: Some(7),
                ..Default::default()
            };
            let mut field = TextField::new(config, Vec2::new(1280.0, 720.0));
            field.set_word(word);
            let ctx = InputContext::at(Vec2::new(640.0, 360.0));
            b.iter(|| black_box(field.step(&ctx, false)))
        });
    }

    group.finish();
}

fn bench_image_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("image_step");

    for grid_size in [20u32, 50, 100] {
        group.bench_function(BenchmarkId::from_parameter(grid_size), |b| {
            let step = 100.0 / grid_size as f32;
            let particles = (0..grid_size)
                .flat_map(|y| (0..grid_size).map(move |x| (x, y)))
                .map(|(x, y)| {
                    let origin = Vec2::new(x as f32 * step, y as f32 * step);
                    ImageParticle::at_rest(origin, CellColor::new(200, 100, 50))
                })
                .collect();
            let mut field = ImageField::new(ImageFieldConfig::default());
            field.load(grid_size, particles);

            let ctx = InputContext::new(
                PointerState {
                    position: Vec2::new(50.0, 50.0),
                    active: true,
                    touch: false,
                },
                true,
            );
            b.iter(|| black_box(field.step(&ctx)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sample_grid, bench_text_step, bench_image_step);
criterion_main!(benches);
