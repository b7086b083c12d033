//! Elaboration and simulation performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use redtree::sim::Simulator;
use redtree::{input_name, Operation, Tree, CLOCK_ENABLE};

fn benchmark_elaboration(c: &mut Criterion) {
    let mut group = c.benchmark_group("elaboration");

    for stages in [2usize, 4, 6, 8] {
        group.throughput(Throughput::Elements(1 << stages));
        group.bench_with_input(BenchmarkId::new("add_signed", stages), &stages, |b, &n| {
            b.iter(|| {
                let tree = Tree::new(Operation::AddSigned, 16, n, true, true).unwrap();
                black_box(tree.elaborate().unwrap())
            });
        });
    }

    group.finish();
}

fn benchmark_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");

    for stages in [2usize, 4, 6] {
        let tree = Tree::new(Operation::MaxSigned, 16, stages, true, false).unwrap();
        let design = tree.elaborate().unwrap();
        let mut sim = Simulator::new(&design).unwrap();
        sim.set_input(CLOCK_ENABLE, 1).unwrap();
        for i in 0..tree.num_inputs() {
            sim.set_input(&input_name(i), (i as i64 * 37) % 1000 - 500).unwrap();
        }

        // 100 cycles per iteration
        group.throughput(Throughput::Elements(100));
        group.bench_function(BenchmarkId::new("max_signed_100_cycles", stages), |b| {
            b.iter(|| {
                sim.run(100).unwrap();
                black_box(sim.get_output("output").unwrap())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_elaboration, benchmark_simulation);
criterion_main!(benches);
