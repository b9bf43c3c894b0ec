use criterion::{Criterion, criterion_group, criterion_main};
use jlog::{
    Format, Level, LockRegistry, Logger, SessionCoordinator, WorkerPool, debug, info, meta,
};
use std::hint::black_box;
use std::io;
use std::sync::Arc;

fn logger(format: Format, level: Level) -> Logger {
    Logger::builder()
        .app_name("bench")
        .host_name("bench-host")
        .format(format)
        .colors(false)
        .capture_stack(false)
        .pool(Arc::new(WorkerPool::default()))
        .registry(Arc::new(LockRegistry::new()))
        .coordinator(Arc::new(SessionCoordinator::new()))
        .level(level)
        .writer(io::sink())
        .done()
        .build()
}

fn bench_gated(c: &mut Criterion) {
    let log = logger(Format::Structured, Level::Info);

    c.bench_function("emit::gated_debug", |b| {
        b.iter(|| debug!(log, black_box("skipped"), 1_u32));
    });
}

fn bench_structured(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit::structured");
    let log = logger(Format::Structured, Level::Info).with_field("service", &"api");

    group.bench_function("message", |b| {
        b.iter(|| info!(log, black_box("request handled")));
    });

    let fields = meta!("status" => 200_u16, "route" => "/orders");
    let payload: Vec<u32> = (0..32).collect();
    group.bench_function("meta_and_payload", |b| {
        b.iter(|| info!(log, fields, black_box("request handled"), payload));
    });

    group.finish();
    log.pool().wait_idle();
}

fn bench_pretty(c: &mut Criterion) {
    let log = logger(Format::Pretty, Level::Info);

    c.bench_function("emit::pretty", |b| {
        b.iter(|| info!(log, black_box("request handled"), 1299_u64));
    });
}

fn bench_session(c: &mut Criterion) {
    let log = logger(Format::Structured, Level::Info);

    c.bench_function("emit::session_of_ten", |b| {
        b.iter(|| {
            let session = log.locked_session();
            for i in 0..10_u32 {
                info!(session, "step", i);
            }
            session.release();
        });
    });
}

criterion_group!(benches, bench_gated, bench_structured, bench_pretty, bench_session);

criterion_main!(benches);
