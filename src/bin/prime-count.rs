//! Count the primes in an inclusive range, one pool task per number.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use taskpool::{PoolConfig, ThreadPool, MAX_THREADS};
use tracing::info;

/// Count prime numbers in [LOWER, UPPER] on a thread pool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of worker threads (1 to 1024)
    threads: usize,

    /// Inclusive lower bound
    lower: u64,

    /// Inclusive upper bound
    upper: u64,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn is_prime(n: u64) -> bool {
    if n == 2 || n == 3 {
        return true;
    }
    if n <= 1 || n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    // 6k ± 1
    let mut i = 5;
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

fn run(cli: &Cli) -> Result<u64> {
    // nothing queries per-task status here, so skip the terminal records
    let config = PoolConfig::builder()
        .num_threads(cli.threads)
        .status_retention(Duration::ZERO)
        .build()
        .context("invalid pool configuration")?;
    let pool = ThreadPool::with_config(config).context("failed to start thread pool")?;

    let counter = Arc::new(AtomicU64::new(0));
    for n in cli.lower..=cli.upper {
        let counter = counter.clone();
        pool.submit(move || {
            if is_prime(n) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        })
        .with_context(|| format!("failed to submit {}", n))?;
    }

    pool.wait_all();

    let count = counter.load(Ordering::Relaxed);
    let metrics = pool.metrics();
    info!(
        executed = metrics.tasks_executed,
        p99_ns = metrics.p99_latency_ns,
        "all tasks finished"
    );

    println!(
        "Between {} and {} there are: {} prime numbers",
        cli.lower, cli.upper, count
    );
    println!(
        "Calculation took {} nanoseconds",
        pool.elapsed_time().as_nanos()
    );

    Ok(count)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
