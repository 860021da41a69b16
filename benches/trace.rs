#[macro_use]
extern crate criterion;
extern crate buddhaplot;
extern crate num;

use buddhaplot::histogram::Histogram;
use buddhaplot::orbit::{escape_time, Mode, Orbit};
use buddhaplot::register::trace_and_register;
use buddhaplot::{ComplexPlane, FractalConfig, Renderer, Sampling};
use criterion::{black_box, Criterion};
use num::Complex;

fn escape(c: &mut Criterion) {
    let config = FractalConfig::new(256, 256, 2000).unwrap();
    c.bench_function("escape_time near the boundary", move |b| {
        b.iter(|| escape_time(black_box(Complex::new(-0.7435, 0.1314)), &config))
    });
}

fn register(c: &mut Criterion) {
    let config = FractalConfig::new(256, 256, 2000).unwrap();
    let policy = Mode::Escaped.policy(&config);
    let mut orbit = Orbit::for_config(&config);
    let mut histogram = Histogram::new(256, 256, false);
    c.bench_function("trace_and_register escaped", move |b| {
        b.iter(|| {
            trace_and_register(
                Complex::new(0.0, 0.0),
                black_box(Complex::new(-0.75, 0.1)),
                &config,
                &policy,
                &mut orbit,
                &mut histogram,
            )
        })
    });
}

fn render(c: &mut Criterion) {
    let config = FractalConfig::new(128, 128, 500).unwrap();
    let region = ComplexPlane::new(Complex::new(-2.0, -1.5), Complex::new(1.0, 1.5)).unwrap();
    let sampling = Sampling::Random { samples: 10_000, seed: 1 };
    let renderer = Renderer::new(config, Mode::Escaped, region, sampling, 2).unwrap();
    c.bench_function("render 10k samples", move |b| b.iter(|| renderer.render().unwrap()));
}

criterion_group!(benches, escape, register, render);
criterion_main!(benches);
