use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use plangraph_core::GraphEngine;
use plangraph_core::config::{ImportancePolicy, LayoutConfig, ScheduleConfig};
use plangraph_core::model::{DurationEstimate, Issue, Priority};
use plangraph_plan::{BlockerImportance, EstimateSet, compute_layout, compute_schedule};

const SIZES: [usize; 3] = [20, 200, 2_000];

/// Layered synthetic plan: every issue depends on up to three issues from
/// the previous band of ten, chosen by a fixed stride.
fn synthetic_plan(size: usize) -> GraphEngine {
    let issues = (0..size).map(|i| {
        let mut issue = Issue::new(format!("n{i}"), format!("task {i}"))
            .with_priority(Priority::new(u8::try_from(i % 5).unwrap_or(2)))
            .with_estimate(DurationEstimate::fixed(u32::try_from(i % 7 + 1).unwrap_or(1)))
            .with_description("x".repeat(i % 90));
        if i >= 10 {
            let band = (i / 10 - 1) * 10;
            for k in 0..3 {
                issue = issue.depends_on(format!("n{}", band + (i * 7 + k * 3) % 10));
            }
        }
        issue
    });
    GraphEngine::from_issues(issues)
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");

    for size in SIZES {
        let graph = synthetic_plan(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("layout", size), &graph, |b, graph| {
            b.iter(|| black_box(compute_layout(graph, &LayoutConfig::default())));
        });

        group.bench_with_input(BenchmarkId::new("schedule", size), &graph, |b, graph| {
            b.iter(|| {
                black_box(compute_schedule(
                    graph,
                    &EstimateSet::default(),
                    &ScheduleConfig::default(),
                ))
            });
        });

        group.bench_with_input(BenchmarkId::new("importance", size), &graph, |b, graph| {
            b.iter(|| black_box(BlockerImportance::new(graph, ImportancePolicy::Uniform)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
