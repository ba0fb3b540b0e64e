//! 单元残差组装基准
//!
//! 运行：`cargo bench -p mt_physics --bench assembly`
//!
//! 比较不同网格规模下各组装策略的耗时。

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec2;
use mt_config::AssemblyStrategy;
use mt_mesh::{RectMeshBuilder, TriMesh};
use mt_physics::current::{CurrentField, CurrentProvider};
use mt_physics::{Species, TransportModel, TransportSettings, UniformCurrent};

fn setup(n: usize, strategy: AssemblyStrategy) -> (TriMesh, CurrentField, TransportModel) {
    let mesh = RectMeshBuilder::new(n, n, 1000.0, 1000.0)
        .with_bed_level(-5.0)
        .with_bed_slope(DVec2::new(0.002, 0.0))
        .build()
        .expect("mesh");

    let mut field = CurrentField::for_mesh(&mesh);
    let settings = TransportSettings::default()
        .with_dispersion(0.5)
        .with_strategy(strategy);
    UniformCurrent::new(DVec2::new(0.5, 0.3), 0.0)
        .with_dispersion(1.0)
        .update(0.0, &mesh, &mut field)
        .expect("current");
    field.refresh_derived(&mesh, &settings.wetting);

    let mut model = TransportModel::new(&mesh, &field, settings, Species::Salinity, Vec::new())
        .expect("model");
    let initial: Vec<f64> = (0..mesh.n_nodes())
        .map(|i| 30.0 + (mesh.node_xy(i).x * 0.01).sin())
        .collect();
    model.set_initial(&initial).expect("initial");

    (mesh, field, model)
}

fn bench_assembly_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("element_assembly");
    group.sample_size(30);

    for n in [32, 64, 128] {
        for strategy in [
            AssemblyStrategy::Sequential,
            AssemblyStrategy::Atomic,
            AssemblyStrategy::Colored,
            AssemblyStrategy::CollectThenAccumulate,
        ] {
            let (mesh, field, mut model) = setup(n, strategy);
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), 2 * n * n),
                &n,
                |b, _| {
                    b.iter(|| {
                        model.prepare(0.0, &mesh, &field);
                        black_box(model.assemble(black_box(&mesh), black_box(&field)))
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_full_step(c: &mut Criterion) {
    let (mesh, field, mut model) = setup(64, AssemblyStrategy::Atomic);
    c.bench_function("full_step_64x64", |b| {
        b.iter(|| {
            model.prepare(0.0, &mesh, &field);
            let stable = model.assemble(&mesh, &field);
            black_box(model.integrate(0.5 * stable.min(10.0)))
        });
    });
}

criterion_group!(benches, bench_assembly_strategies, bench_full_step);
criterion_main!(benches);
