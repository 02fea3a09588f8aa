//! Benchmarks for layout generation.
//!
//! Run with: cargo bench -p facility-logic

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use facility_logic::grid::{CellGrid, CellPosition};
use facility_logic::pathfinding::find_path;
use facility_logic::{run_attempt, FacilityPreset};

const WAREHOUSE_PRESET: &str = include_str!("../../../data/presets/warehouse.json");

fn bench_attempt(c: &mut Criterion) {
    let mut group = c.benchmark_group("attempt");
    let presets = [
        ("default", FacilityPreset::default()),
        (
            "warehouse",
            FacilityPreset::from_json(WAREHOUSE_PRESET).expect("warehouse preset parses"),
        ),
    ];

    for (name, preset) in &presets {
        group.bench_with_input(BenchmarkId::new("run_attempt", name), preset, |b, preset| {
            let mut seed = 0u64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                black_box(run_attempt(preset, black_box(seed)).is_ok())
            });
        });
    }
    group.finish();
}

fn bench_pathfinding(c: &mut Criterion) {
    let mut group = c.benchmark_group("pathfinding");

    for side in [16u32, 64, 128] {
        let grid = CellGrid::new(side, side);
        let goal = CellPosition::new(side as i32 - 1, side as i32 - 1);
        group.bench_with_input(BenchmarkId::new("corner_to_corner", side), &side, |b, _| {
            b.iter(|| {
                let path = find_path(&grid, black_box(CellPosition::new(0, 0)), black_box(goal));
                black_box(path.map(|p| p.steps()))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_attempt, bench_pathfinding);
criterion_main!(benches);
