//! Stress tests for the thread pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use taskpool::prelude::*;

fn is_prime(n: u64) -> bool {
    if n == 2 || n == 3 {
        return true;
    }
    if n <= 1 || n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5;
    while i * i <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

fn count_primes(pool: &ThreadPool, upper: u64) -> usize {
    let counter = Arc::new(AtomicUsize::new(0));
    for n in 1..=upper {
        let counter = counter.clone();
        pool.submit(move || {
            if is_prime(n) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        })
        .unwrap();
    }
    pool.wait_all();
    counter.load(Ordering::Relaxed)
}

#[test]
#[ignore] // Run with --ignored flag
fn stress_test_prime_counts() {
    let config = PoolConfig::builder()
        .num_threads(4)
        .status_retention(std::time::Duration::ZERO)
        .build()
        .unwrap();
    let pool = ThreadPool::with_config(config).unwrap();

    assert_eq!(count_primes(&pool, 100_000), 9_592);
    assert_eq!(count_primes(&pool, 1_000_000), 78_498);
}

#[test]
#[ignore]
fn stress_test_repeated_create_and_drop() {
    for i in 0..50 {
        let pool = ThreadPool::new(4).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..100 {
            let counter = counter.clone();
            pool.submit(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        pool.wait_all();
        assert_eq!(counter.load(Ordering::Relaxed), 100, "Iteration {}", i);
    }
}

#[test]
#[ignore]
fn stress_test_submit_and_wait_from_many_threads() {
    let pool = Arc::new(ThreadPool::new(8).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    let callers: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                for _ in 0..1_000 {
                    let counter = counter.clone();
                    let id = pool
                        .submit(move || {
                            counter.fetch_add(1, Ordering::Relaxed);
                        })
                        .unwrap();
                    let status = pool.wait(id);
                    assert_eq!(status, TaskStatus::Finished);
                }
            })
        })
        .collect();

    for caller in callers {
        caller.join().unwrap();
    }

    pool.wait_all();
    assert_eq!(counter.load(Ordering::Relaxed), 16_000);
    assert_eq!(pool.metrics().tasks_executed, 16_000);
}

#[test]
#[ignore]
fn stress_test_shutdown_under_load() {
    for _ in 0..20 {
        let pool = ThreadPool::new(4).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        let submitted = 10_000;
        for _ in 0..submitted {
            let ran = ran.clone();
            pool.submit(move || {
                ran.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }

        let report = pool.shutdown();
        assert_eq!(
            ran.load(Ordering::Relaxed) + report.discarded.len(),
            submitted
        );
    }
}
