//! Localization benchmarks.
//!
//! Benchmarks for the CPU-heavy localization paths:
//! - Floor-wide grid relocalization sweep
//! - One adaptive tracking generation at the particle cap
//! - One fixed-size tracking generation
//! - Single-pose sensor weighting and systematic resampling
//!
//! Run with: `cargo bench`
//! View HTML reports in: `target/criterion/`

use std::f64::consts::FRAC_PI_2;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use tula_loc::{
    grid_search_seed, pose_weight, seed_around_point, systematic_resample, BeamConfig,
    GridSearchConfig, KldConfig, KldFilter, ParticleCloud, PlanarScene, Pose, RangeModel,
    RobotGeometry, SensorFrame, StandardConfig, StandardFilter,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Square floor with forward, left, and right beams.
fn bench_scene(side: f64) -> PlanarScene {
    PlanarScene::new(
        side,
        side,
        vec![
            BeamConfig::level([0.0, 0.0, 0.0], 0.0, 800.0),
            BeamConfig::level([0.0, 0.0, 0.0], FRAC_PI_2, 800.0),
            BeamConfig::level([0.0, 0.0, 0.0], -FRAC_PI_2, 800.0),
        ],
    )
}

fn bench_readings() -> Vec<f64> {
    vec![400.0, 700.0, 300.0]
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_relocalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("relocalization");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));

    let scene = bench_scene(1000.0);
    let geometry = RobotGeometry::default();
    let model = RangeModel::default();
    let grid = GridSearchConfig::default();
    let readings = bench_readings();
    let mut cloud = ParticleCloud::preallocated(2000, 3);
    let mut rng = StdRng::seed_from_u64(77);

    group.bench_function("grid_sweep/1000mm_floor", |b| {
        b.iter(|| {
            grid_search_seed(
                black_box(&scene),
                &[],
                &model,
                &grid,
                &geometry,
                0.0,
                black_box(&readings),
                &mut cloud,
                &mut rng,
            )
        })
    });

    group.finish();
}

fn bench_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracking");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(5));

    let geometry = RobotGeometry::default();
    let frame = SensorFrame::new(0.0, 0.2, 0.2, bench_readings());

    let kld_config = KldConfig { max_particles: 2000, seed: 77, ..KldConfig::default() };
    let mut adaptive = KldFilter::new(kld_config, geometry, bench_scene(1000.0))
        .expect("adaptive engine builds");
    adaptive.init(0.0, &bench_readings());

    group.bench_function("kld_generation/2000", |b| {
        b.iter(|| adaptive.track(black_box(&frame)))
    });

    let std_config = StandardConfig { particles: 2000, seed: 77, ..StandardConfig::default() };
    let mut fixed = StandardFilter::new(std_config, geometry, bench_scene(1000.0))
        .expect("fixed engine builds");
    fixed.init(0.0, &bench_readings());

    group.bench_function("standard_generation/2000", |b| {
        b.iter(|| fixed.track(black_box(&frame)))
    });

    group.finish();
}

fn bench_weighting(c: &mut Criterion) {
    let mut group = c.benchmark_group("weighting");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(2));

    let scene = bench_scene(1000.0);
    let model = RangeModel::default();
    let pose = Pose::new(600.0, 300.0, 0.0, 0.0);
    let readings = bench_readings();

    group.bench_function("pose_weight/3_beams", |b| {
        b.iter(|| {
            pose_weight(
                black_box(&scene),
                &[],
                &model,
                black_box(&pose),
                &readings,
                None,
                None,
            )
        })
    });

    let geometry = RobotGeometry::default();
    let mut rng = StdRng::seed_from_u64(77);
    let mut source = ParticleCloud::preallocated(2000, 3);
    seed_around_point((500.0, 500.0), 0.0, 100.0, 2000, &geometry, &mut source, &mut rng);
    let mut target = ParticleCloud::preallocated(2000, 3);

    group.bench_function("systematic_resample/2000", |b| {
        b.iter(|| systematic_resample(black_box(&source), &mut target))
    });

    group.finish();
}

criterion_group!(benches, bench_relocalization, bench_tracking, bench_weighting);
criterion_main!(benches);
