//! Criterion measurements of parameter adaptation: keyed binds with list values,
//! and wide bulk-row payloads, both pushed through the recording bridge so the
//! serialization cost is included.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sql_bridge::prelude::*;
use sql_bridge::test_utils::RecordingBridge;
use std::sync::{Arc, LazyLock};
use tokio::runtime::Runtime;

static TOKIO_RUNTIME: LazyLock<Runtime> =
    LazyLock::new(|| Runtime::new().expect("create tokio runtime"));

fn host_rows(count: usize) -> Vec<Vec<HostValue>> {
    (0..count)
        .map(|i| {
            vec![
                HostValue::Int(i as i64),
                HostValue::Text(format!("name-{i}")),
                HostValue::Bool(i % 2 == 0),
                HostValue::Buffer(ByteBuffer::U16(vec![i as u16; 8])),
            ]
        })
        .collect()
}

fn bench_process_rows(c: &mut Criterion) {
    let adapter = ParamAdapter::default();
    let mut group = c.benchmark_group("process_rows");
    for count in [10_usize, 100, 1_000] {
        let rows = host_rows(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &rows, |b, rows| {
            b.to_async(&*TOKIO_RUNTIME)
                .iter(|| async { black_box(adapter.process_rows(rows).await.expect("adapt")) });
        });
    }
    group.finish();
}

fn bench_keyed_execute(c: &mut Criterion) {
    let bridge = Arc::new(RecordingBridge::discarding());
    let db = TOKIO_RUNTIME
        .block_on(Sqlite::new(bridge, BridgeConfig::default()).open("file:///bench.db", true))
        .expect("open");
    let query = Query::new("SELECT * FROM test WHERE id IN (:ids) AND name = :name").bind(
        ParamBuilder::new()
            .list("ids", 0_i64..256)
            .text("name", "bench"),
    );

    c.bench_function("keyed_execute", |b| {
        b.to_async(&*TOKIO_RUNTIME)
            .iter(|| async { black_box(query.execute(&db).await.expect("execute")) });
    });
}

criterion_group!(benches, bench_process_rows, bench_keyed_execute);
criterion_main!(benches);
