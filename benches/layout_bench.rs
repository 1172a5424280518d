// Benchmark for event layout
// Measures placing a busy day's games with and without lane assignment

use club_calendar::models::event::EventRecord;
use club_calendar::services::layout::{layout_events, LaneMode, LayoutConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn busy_day(count: usize) -> Vec<EventRecord> {
    (0..count)
        .map(|index| {
            let start = (index * 37) % 1200;
            let end = start + 45 + (index % 4) * 30;
            EventRecord::new(
                index as i64,
                format!("Game {}", index),
                format!("2025-03-07T{:02}:{:02}:00", start / 60, start % 60),
                format!("2025-03-07T{:02}:{:02}:00", end / 60, end % 60),
            )
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_events");

    for count in [10, 100, 1000].iter() {
        let records = busy_day(*count);

        group.bench_with_input(BenchmarkId::new("overlap", count), &records, |b, records| {
            let config = LayoutConfig::default();
            b.iter(|| layout_events(black_box(records), &config));
        });

        group.bench_with_input(BenchmarkId::new("lanes", count), &records, |b, records| {
            let config = LayoutConfig {
                lanes: LaneMode::Lanes,
                ..LayoutConfig::default()
            };
            b.iter(|| layout_events(black_box(records), &config));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
