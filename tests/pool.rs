//! Tests for the worker pool.

use jlog::{PoolConfig, WorkerPool};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

#[test]
fn ten_thousand_jobs_all_run() {
    let pool = WorkerPool::new(PoolConfig::with_size(10));
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..10_000 {
        let counter = Arc::clone(&counter);
        pool.run(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }
    pool.wait_idle();
    assert_eq!(counter.load(Ordering::SeqCst), 10_000);
    assert_eq!(pool.in_flight(), 0);
    assert_eq!(pool.completed(), 10_000);
}

#[test]
fn panicking_job_does_not_kill_the_pool() {
    let pool = WorkerPool::new(PoolConfig::with_size(1));
    pool.run(Box::new(|| panic!("job failure")));
    pool.wait_idle();
    assert_eq!(pool.in_flight(), 0);

    let (tx, rx) = mpsc::channel();
    pool.run(Box::new(move || tx.send(7).unwrap()));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
    pool.wait_idle();
}

#[test]
fn saturated_pool_spills_to_overflow_threads() {
    let pool = WorkerPool::new(PoolConfig {
        size: 1,
        overflow_threshold: 1,
        max_overflow: 4,
    });
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Arc::new(std::sync::Mutex::new(release_rx));

    // Occupies the only worker until released.
    let blocker = Arc::clone(&release_rx);
    pool.run(Box::new(move || {
        let _ = blocker.lock().unwrap().recv();
    }));

    // Must run while the worker is still blocked.
    let (done_tx, done_rx) = mpsc::channel();
    pool.run(Box::new(move || done_tx.send(()).unwrap()));
    done_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    release_tx.send(()).unwrap();
    pool.wait_idle();
    assert_eq!(pool.overflow_active(), 0);
}

#[test]
fn full_overflow_queues_instead_of_blocking() {
    let pool = WorkerPool::new(PoolConfig {
        size: 2,
        overflow_threshold: 2,
        max_overflow: 0,
    });
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..100 {
        let counter = Arc::clone(&counter);
        pool.run(Box::new(move || {
            std::thread::sleep(Duration::from_micros(50));
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }
    assert!(pool.wait_idle_timeout(Duration::from_secs(10)));
    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn zero_size_still_starts_one_worker() {
    let pool = WorkerPool::new(PoolConfig::with_size(0));
    assert_eq!(pool.size(), 1);
    let (tx, rx) = mpsc::channel();
    pool.run(Box::new(move || tx.send(()).unwrap()));
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
}

#[test]
fn idle_pool_reports_drained_immediately() {
    let pool = WorkerPool::default();
    assert!(pool.wait_idle_timeout(Duration::from_millis(1)));
    assert_eq!(pool.config(), PoolConfig::default());
}
