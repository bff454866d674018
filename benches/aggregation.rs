use clawstat::{
    aggregation::{Aggregator, UsageAccumulator},
    cost_calculator::CostCalculator,
    data_loader::{DataLoader, SessionTranscript, WorkspaceScan},
    types::{Message, MessageUsage, ModelName, SessionId, TokenCounts, UsageEntry},
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use futures::stream;
use std::hint::black_box;
use std::path::PathBuf;

const MODELS: &[&str] = &["gpt-4o", "claude-sonnet-4", "qwen3-coder"];

fn create_test_scan(sessions: usize, messages_per_session: usize) -> WorkspaceScan {
    let sessions = (0..sessions)
        .map(|s| SessionTranscript {
            session_id: SessionId::new(format!("session-{s}")),
            path: PathBuf::from(format!("sessions/session-{s}/transcript.json")),
            messages: (0..messages_per_session)
                .map(|m| Message {
                    usage: (m % 4 != 3).then(|| MessageUsage {
                        prompt_tokens: Some((m * 100) as u64),
                        completion_tokens: Some((s * 10) as u64),
                    }),
                    model: Some(MODELS[(s + m) % MODELS.len()].to_string()),
                })
                .collect(),
            modified: None,
        })
        .collect();

    WorkspaceScan {
        sessions,
        warnings: Vec::new(),
    }
}

fn create_test_entries(count: usize) -> Vec<UsageEntry> {
    (0..count)
        .map(|i| UsageEntry {
            session_id: SessionId::new(format!("session-{}", i / 50)),
            model: ModelName::new(MODELS[i % MODELS.len()]),
            tokens: TokenCounts::new((i * 100) as u64, (i * 50) as u64),
        })
        .collect()
}

fn benchmark_accumulator(c: &mut Criterion) {
    let entries = create_test_entries(10_000);

    c.bench_function("accumulate_10000_entries", |b| {
        b.iter(|| {
            let mut acc = UsageAccumulator::new();
            for entry in &entries {
                acc.add_entry(black_box(entry));
            }
            black_box(acc.into_report(&CostCalculator::default()))
        });
    });
}

fn benchmark_sequential_vs_parallel(c: &mut Criterion) {
    let aggregator = Aggregator::new(CostCalculator::default());
    let mut group = c.benchmark_group("scan_aggregation");

    for sessions in [10, 100, 1000] {
        let scan = create_test_scan(sessions, 200);

        group.bench_with_input(
            BenchmarkId::new("sequential", sessions),
            &scan,
            |b, scan| b.iter(|| black_box(aggregator.aggregate_scan(scan))),
        );
        group.bench_with_input(
            BenchmarkId::new("parallel", sessions),
            &scan,
            |b, scan| b.iter(|| black_box(aggregator.aggregate_parallel(scan))),
        );
    }

    group.finish();
}

fn benchmark_stream_aggregation(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let aggregator = Aggregator::new(CostCalculator::default());
    let entries = create_test_entries(10_000);

    c.bench_function("aggregate_report_stream", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let stream = stream::iter(entries.clone().into_iter().map(Ok));
                black_box(aggregator.aggregate_report(stream).await.unwrap())
            })
        });
    });
}

fn benchmark_workspace_scan(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().unwrap();
    let scan = create_test_scan(200, 100);
    for session in &scan.sessions {
        let session_dir = dir.path().join(&session.path).parent().unwrap().to_path_buf();
        std::fs::create_dir_all(&session_dir).unwrap();
        let body = serde_json::to_string(&session.messages).unwrap();
        std::fs::write(session_dir.join("transcript.json"), body).unwrap();
    }

    let loader = DataLoader::new(dir.path()).unwrap();
    let mut group = c.benchmark_group("workspace_scan");
    group.sample_size(20);

    group.bench_function("scan_blocking_200_sessions", |b| {
        b.iter(|| black_box(loader.scan_blocking().unwrap()))
    });
    group.bench_function("scan_parallel_blocking_200_sessions", |b| {
        b.iter(|| black_box(loader.scan_parallel_blocking().unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_accumulator,
    benchmark_sequential_vs_parallel,
    benchmark_stream_aggregation,
    benchmark_workspace_scan
);
criterion_main!(benches);
