use std::env;
use std::time::Duration;

use criterion::measurement::Measurement;
use criterion::{BenchmarkGroup, Throughput};

use strata_core::{BBox, Glyph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchTier {
    Quick,
    Full,
}

impl BenchTier {
    pub fn from_env() -> Self {
        match env::var("STRATA_BENCH_TIER").as_deref() {
            Ok("full") => Self::Full,
            _ => Self::Quick,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub tier: BenchTier,
    pub seed: u64,
    pub sample_size: usize,
    pub measurement: Duration,
}

pub fn bench_config() -> BenchConfig {
    let tier = BenchTier::from_env();
    let seed = env::var("STRATA_BENCH_SEED")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0xC0FFEE);
    let (sample_size, measurement) = match tier {
        BenchTier::Quick => (20, Duration::from_secs(3)),
        BenchTier::Full => (30, Duration::from_secs(8)),
    };
    BenchConfig {
        tier,
        seed,
        sample_size,
        measurement,
    }
}

pub fn configure_group<M: Measurement>(group: &mut BenchmarkGroup<'_, M>, cfg: &BenchConfig) {
    group.sample_size(cfg.sample_size);
    group.measurement_time(cfg.measurement);
}

pub fn glyphs_throughput(count: usize) -> Throughput {
    Throughput::Elements(count as u64)
}

#[derive(Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    pub fn gen_f64(&mut self, min: f64, max: f64) -> f64 {
        let n = self.next_u64() as f64 / u64::MAX as f64;
        min + (max - min) * n
    }
}

/// Rows of jittered glyphs in three columns, eight glyphs per word.
pub fn generate_glyphs(seed: u64, rows: usize) -> Vec<Glyph> {
    let mut rng = XorShift64::new(seed);
    let mut glyphs = Vec::with_capacity(rows * 3 * 8);
    for row in 0..rows {
        let top = 36.0 + row as f64 * 14.0 + rng.gen_f64(0.0, 1.0);
        for col in 0..3 {
            let base_x = 36.0 + col as f64 * 180.0 + rng.gen_f64(0.0, 4.0);
            let char_w = 5.0 + (row % 4) as f64;
            for ch in 0..8 {
                let x0 = base_x + ch as f64 * char_w;
                let Ok(bbox) = BBox::new(x0, top, x0 + char_w, top + 10.0) else {
                    continue;
                };
                let text = char::from(b'a' + ((row + ch) % 26) as u8);
                glyphs.push(Glyph::new(1, bbox, text.to_string(), "Helvetica", 10.0));
            }
        }
    }
    glyphs
}
