// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The sampling driver.  Picks parameters from a region of the complex
//! plane, hands them to the tracer on a pool of scoped worker
//! threads, and merges what the workers accumulated.
//!
//! Each worker owns its orbit buffer, its histogram and its counters,
//! so the hot loop shares nothing mutable.  The partial histograms are
//! summed only after every worker has joined.

use std::ops::Range;
use std::sync::Mutex;

use crossbeam::thread::ScopedJoinHandle;
use itertools::{iproduct, Product};
use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::errors::BuddhaError;
use crate::fractal::FractalConfig;
use crate::histogram::Histogram;
use crate::orbit::{Mode, Orbit, Outcome, Policy};
use crate::planes::ComplexPlane;
use crate::register::{trace_and_register, Registration};

type Cells = Mutex<Product<Range<usize>, Range<usize>>>;

// How many grid cells a worker claims at a time.
const GRID_BATCH: usize = 256;

/// How parameters are chosen.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Sampling {
    /// Uniformly at random.  Worker `i` seeds its generator with
    /// `seed + i`, so a render is repeatable for a given thread count.
    Random {
        /// Total number of samples across all workers.
        samples: u64,
        /// Base seed.
        seed: u64,
    },
    /// At the centres of a regular grid of cells.
    Grid {
        /// Cells along the real axis.
        columns: usize,
        /// Cells along the imaginary axis.
        rows: usize,
    },
}

/// Counters kept by every worker and summed at the end.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// Parameters handed to the tracer, pruned ones included.
    pub sampled: u64,
    /// Parameters skipped by the bulb test.
    pub pruned: u64,
    /// Orbits written into the histogram.
    pub registered: u64,
    /// Histogram cells incremented.
    pub written: u64,
    /// Length of the longest registered orbit.
    pub longest: usize,
}

impl RenderStats {
    fn record(&mut self, registration: &Registration) {
        self.sampled += 1;
        if registration.trace.outcome == Outcome::Pruned {
            self.pruned += 1;
        }
        if registration.registered {
            self.registered += 1;
            self.written += registration.written as u64;
            self.longest = self.longest.max(registration.trace.len);
        }
    }

    /// Adds another worker's counters to these.
    pub fn merge(&mut self, other: &RenderStats) {
        self.sampled += other.sampled;
        self.pruned += other.pruned;
        self.registered += other.registered;
        self.written += other.written;
        self.longest = self.longest.max(other.longest);
    }
}

/// A render: the configuration, the mode, where to sample and how.
#[derive(Clone, Debug)]
pub struct Renderer {
    config: FractalConfig,
    mode: Mode,
    region: ComplexPlane,
    sampling: Sampling,
    threads: usize,
}

struct Worker<'a> {
    config: &'a FractalConfig,
    policy: Policy,
    orbit: Orbit,
    histogram: Histogram,
    stats: RenderStats,
}

impl<'a> Worker<'a> {
    fn new(config: &'a FractalConfig, policy: Policy) -> Worker<'a> {
        Worker {
            config,
            policy,
            orbit: Orbit::for_config(config),
            histogram: Histogram::new(config.width(), config.height(), config.importance),
            stats: RenderStats::default(),
        }
    }

    #[inline]
    fn sample(&mut self, c: Complex<f64>) {
        let registration = trace_and_register(
            Complex::new(0.0, 0.0),
            c,
            self.config,
            &self.policy,
            &mut self.orbit,
            &mut self.histogram,
        );
        self.stats.record(&registration);
    }

    fn finish(self, index: usize) -> (Histogram, RenderStats) {
        debug!(
            "worker {} done: {} sampled, {} pruned, {} registered, {} cells written",
            index, self.stats.sampled, self.stats.pruned, self.stats.registered, self.stats.written
        );
        (self.histogram, self.stats)
    }
}

impl Renderer {
    /// Checks the configuration and the sampling parameters.
    pub fn new(
        config: FractalConfig,
        mode: Mode,
        region: ComplexPlane,
        sampling: Sampling,
        threads: usize,
    ) -> Result<Renderer, BuddhaError> {
        config.validate()?;
        if threads == 0 {
            return Err(BuddhaError::InvalidParameter("threads", "0".to_string()));
        }
        if let Sampling::Grid { columns, rows } = sampling {
            if columns == 0 || rows == 0 {
                return Err(BuddhaError::InvalidParameter(
                    "grid",
                    format!("{}x{}", columns, rows),
                ));
            }
        }
        Ok(Renderer {
            config,
            mode,
            region,
            sampling,
            threads,
        })
    }

    /// The configuration this renderer was built with.
    pub fn config(&self) -> &FractalConfig {
        &self.config
    }

    // The share of `samples` that worker `index` takes.
    fn share(&self, samples: u64, index: usize) -> u64 {
        let threads = self.threads as u64;
        samples / threads + if (index as u64) < samples % threads { 1 } else { 0 }
    }

    fn sample_random(&self, worker: &mut Worker, index: usize, samples: u64, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
        let re = Uniform::new(self.region.0.re, self.region.1.re);
        let im = Uniform::new(self.region.0.im, self.region.1.im);
        for _ in 0..self.share(samples, index) {
            let c = Complex::new(re.sample(&mut rng), im.sample(&mut rng));
            worker.sample(c);
        }
    }

    fn sample_grid(&self, worker: &mut Worker, cells: &Cells, columns: usize, rows: usize) {
        let dre = self.region.width() / columns as f64;
        let dim = self.region.height() / rows as f64;
        let mut batch = Vec::with_capacity(GRID_BATCH);
        loop {
            batch.clear();
            match cells.lock() {
                Ok(mut cells) => batch.extend(cells.by_ref().take(GRID_BATCH)),
                Err(_) => break,
            }
            if batch.is_empty() {
                break;
            }
            for &(column, row) in &batch {
                let c = Complex::new(
                    self.region.0.re + (column as f64 + 0.5) * dre,
                    self.region.0.im + (row as f64 + 0.5) * dim,
                );
                worker.sample(c);
            }
        }
    }

    /// Runs the render and returns the merged histogram with the
    /// summed counters.
    pub fn render(&self) -> Result<(Histogram, RenderStats), BuddhaError> {
        let policy = self.mode.policy(&self.config);
        info!(
            "rendering {} on {} threads, {} iterations, {:?}",
            self.mode.name(),
            self.threads,
            self.config.iterations,
            self.sampling
        );

        let cells: Cells = match self.sampling {
            Sampling::Grid { columns, rows } => Mutex::new(iproduct!(0..columns, 0..rows)),
            Sampling::Random { .. } => Mutex::new(iproduct!(0..0, 0..0)),
        };

        let parts = crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<(Histogram, RenderStats)>> = (0..self.threads)
                .map(|index| {
                    let cells = &cells;
                    spawner.spawn(move |_| {
                        let mut worker = Worker::new(&self.config, policy);
                        match self.sampling {
                            Sampling::Random { samples, seed } => {
                                self.sample_random(&mut worker, index, samples, seed)
                            }
                            Sampling::Grid { columns, rows } => {
                                self.sample_grid(&mut worker, cells, columns, rows)
                            }
                        }
                        worker.finish(index)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().map_err(|_| BuddhaError::WorkerPanicked))
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(|_| BuddhaError::WorkerPanicked)??;

        let mut stats = RenderStats::default();
        for (_, part) in &parts {
            stats.merge(part);
        }
        let histogram = Histogram::merged(
            self.config.width(),
            self.config.height(),
            self.config.importance,
            parts.iter().map(|(histogram, _)| histogram),
        );
        info!(
            "traced {} points, {} pruned, {} orbits registered, longest {}",
            stats.sampled, stats.pruned, stats.registered, stats.longest
        );
        Ok((histogram, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> ComplexPlane {
        ComplexPlane::new(Complex::new(-2.0, -1.5), Complex::new(1.0, 1.5)).unwrap()
    }

    fn total(histogram: &Histogram) -> f64 {
        histogram.r.cells().iter().sum::<f64>()
            + histogram.g.cells().iter().sum::<f64>()
            + histogram.b.cells().iter().sum::<f64>()
    }

    #[test]
    fn refuses_zero_threads_and_empty_grids() {
        let config = FractalConfig::new(32, 32, 100).unwrap();
        let random = Sampling::Random { samples: 10, seed: 1 };
        assert!(Renderer::new(config.clone(), Mode::Escaped, region(), random, 0).is_err());
        let grid = Sampling::Grid { columns: 0, rows: 4 };
        assert!(Renderer::new(config, Mode::Escaped, region(), grid, 1).is_err());
    }

    #[test]
    fn shares_add_up() {
        let config = FractalConfig::new(32, 32, 100).unwrap();
        let random = Sampling::Random { samples: 10, seed: 1 };
        let renderer = Renderer::new(config, Mode::Escaped, region(), random, 3).unwrap();
        let shares: Vec<u64> = (0..3).map(|i| renderer.share(10, i)).collect();
        assert_eq!(shares, vec![4, 3, 3]);
    }

    #[test]
    fn random_render_is_repeatable() {
        let mut config = FractalConfig::new(48, 48, 200).unwrap();
        config.threshold = 3;
        let random = Sampling::Random { samples: 4000, seed: 7 };
        let renderer = Renderer::new(config, Mode::Escaped, region(), random, 2).unwrap();
        let (first, stats) = renderer.render().unwrap();
        let (second, again) = renderer.render().unwrap();
        assert_eq!(first, second);
        assert_eq!(stats, again);
        assert_eq!(stats.sampled, 4000);
        assert!(stats.pruned > 0);
        assert!(stats.registered > 0);
        assert!(stats.longest >= 3 && stats.longest < 200);
        assert!(total(&first) > 0.0);
    }

    #[test]
    fn grid_render_does_not_depend_on_thread_count() {
        let mut config = FractalConfig::new(40, 40, 150).unwrap();
        config.importance = true;
        let grid = Sampling::Grid { columns: 60, rows: 50 };
        let one = Renderer::new(config.clone(), Mode::Path, region(), grid, 1).unwrap();
        let four = Renderer::new(config, Mode::Path, region(), grid, 4).unwrap();
        let (h1, s1) = one.render().unwrap();
        let (h4, s4) = four.render().unwrap();
        assert_eq!(s1, s4);
        assert_eq!(s1.sampled, 3000);
        assert_eq!(s1.pruned, 0);
        assert!((total(&h1) - total(&h4)).abs() < 1e-6 * total(&h1).max(1.0));
        assert!(h1.importance.unwrap().max() > 0.0);
    }

    #[test]
    fn every_mode_renders() {
        for &mode in Mode::ALL.iter() {
            let config = FractalConfig::new(24, 24, 100).unwrap();
            let random = Sampling::Random { samples: 500, seed: 3 };
            let renderer = Renderer::new(config, mode, region(), random, 2).unwrap();
            let (_, stats) = renderer.render().unwrap();
            assert_eq!(stats.sampled, 500, "{:?}", mode);
        }
    }
}
