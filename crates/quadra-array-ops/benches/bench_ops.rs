use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use quadra_array::{Backend, BackendKind, CpuAllocator, DType, Dim4};
use quadra_array_ops::{
    generate::iota,
    manip::{join, shift, tile},
    matrix::lower,
    random::{randu, RandomEngine},
};

fn backends() -> Vec<(&'static str, Box<dyn Backend>)> {
    vec![
        (
            "cpu",
            BackendKind::Cpu.build(CpuAllocator::new()).unwrap(),
        ),
        (
            "parallel",
            BackendKind::Parallel { threads: None }
                .build(CpuAllocator::new())
                .unwrap(),
        ),
    ]
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    let shape = Dim4::from((512, 512));

    for (name, backend) in backends() {
        group.bench_with_input(BenchmarkId::new("randu", name), &shape, |b, &shape| {
            let mut engine = RandomEngine::new(42);
            b.iter(|| black_box(randu(backend.as_ref(), &mut engine, shape, DType::F32).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("iota", name), &shape, |b, &shape| {
            b.iter(|| {
                black_box(iota(backend.as_ref(), shape, Dim4::from((1, 2)), DType::S32).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_transforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("transforms");

    for (name, backend) in backends() {
        let mut engine = RandomEngine::new(7);
        let a = randu(
            backend.as_ref(),
            &mut engine,
            Dim4::from((256, 256)),
            DType::F32,
        )
        .unwrap();

        group.bench_function(BenchmarkId::new("join", name), |b| {
            b.iter(|| black_box(join(backend.as_ref(), 1, &[&a, &a, &a]).unwrap()))
        });

        group.bench_function(BenchmarkId::new("tile", name), |b| {
            b.iter(|| black_box(tile(backend.as_ref(), &a, Dim4::from((2, 2))).unwrap()))
        });

        group.bench_function(BenchmarkId::new("shift", name), |b| {
            b.iter(|| black_box(shift(backend.as_ref(), &a, [3, -5, 0, 0]).unwrap()))
        });

        group.bench_function(BenchmarkId::new("lower", name), |b| {
            b.iter(|| black_box(lower(backend.as_ref(), &a, false).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_transforms);
criterion_main!(benches);
