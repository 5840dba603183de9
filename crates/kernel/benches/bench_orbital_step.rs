use std::hint::black_box;
use std::time::Instant;

use glam::DVec3;
use orrery_kernel::{Attachment, Body, BodyRegistry, OrbitalSystem};

/// A root with `planets` planets, each carrying `moons` moons and one attachment.
fn make_system(planets: usize, moons: usize) -> OrbitalSystem {
    let mut reg = BodyRegistry::new();
    reg.register(Body::root("star").with_spin(0.01, DVec3::Y))
        .expect("root");
    for p in 0..planets {
        let planet = format!("planet-{p}");
        reg.register(
            Body::orbiting(planet.as_str(), "star", 10.0 + p as f64 * 4.0)
                .with_period(365.0 * (p + 1) as f64),
        )
        .expect("planet");
        reg.attach(Attachment::new(format!("{planet}-clouds"), planet.as_str()))
            .expect("attachment");
        for m in 0..moons {
            reg.register(
                Body::orbiting(format!("{planet}-moon-{m}"), planet.as_str(), 1.0 + m as f64)
                    .with_period(20.0 + m as f64),
            )
            .expect("moon");
        }
    }
    OrbitalSystem::new(reg).expect("valid system")
}

fn bench_step(planets: usize, moons: usize, iterations: usize) {
    let mut system = make_system(planets, moons);
    let start = Instant::now();
    for _ in 0..iterations {
        system.step();
        black_box(&system);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    let bodies = system.registry().len();
    println!("  step ({bodies} bodies, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_seek(planets: usize, moons: usize, iterations: usize) {
    let mut system = make_system(planets, moons);
    let start = Instant::now();
    for i in 0..iterations {
        system.seek(black_box(i as u64 * 7919));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  seek ({planets} planets x {moons} moons, {iterations} iters): {per_iter:?}/iter");
}

fn main() {
    println!("orbital step benchmarks");
    bench_step(8, 0, 100_000);
    bench_step(8, 4, 100_000);
    bench_step(64, 8, 10_000);
    bench_seek(8, 4, 100_000);
}
