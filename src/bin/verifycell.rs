use std::hint::black_box;
use std::process;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use parking_lot::lock_api::RawRwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use verifycell::lock::strategy_name;
use verifycell::simd::{salted_sum, salted_sum_scalar, simd_level};
use verifycell::{SpinLock, Verified, audit};

/// mimalloc is noticeably faster than the system allocator for the many
/// small boxed payloads the audit and stress commands create.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "verifycell",
    version,
    about = "Exercise tamper-evident value containers"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long = "log-level", global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the end-to-end scenarios and report PASS/FAIL for each
    Scenarios,

    /// Hammer one container with concurrent writers and verifiers
    Stress {
        /// Writer threads incrementing the counter
        #[arg(long, default_value_t = 4)]
        writers: usize,

        /// Reader threads calling verify() in a loop
        #[arg(long, default_value_t = 4)]
        readers: usize,

        /// Increments per writer
        #[arg(long, default_value_t = 10_000)]
        iterations: usize,

        /// Use the spin lock instead of the default lock
        #[arg(long)]
        spin: bool,
    },

    /// Measure salted-sum throughput, dispatched vs scalar
    Throughput {
        /// Buffer size in bytes
        #[arg(long, default_value_t = 1 << 20)]
        size: usize,

        /// Passes over the buffer per measurement
        #[arg(long, default_value_t = 200)]
        rounds: usize,
    },

    /// Print the header fields and checksum of an i32 container
    Inspect {
        #[arg(long, default_value_t = 100, allow_hyphen_values = true)]
        value: i32,

        /// Fixed salt (random when omitted)
        #[arg(long)]
        salt: Option<u16>,
    },

    /// Build many containers, tamper with some, and run a parallel audit
    Audit {
        #[arg(long, default_value_t = 10_000)]
        count: usize,

        /// Containers to overwrite through the raw pointer
        #[arg(long, default_value_t = 3)]
        tamper: usize,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Command::Scenarios => run_scenarios(),
        Command::Stress {
            writers,
            readers,
            iterations,
            spin,
        } => {
            if spin {
                run_stress::<SpinLock>(writers, readers, iterations)
            } else {
                run_stress::<parking_lot::RawRwLock>(writers, readers, iterations)
            }
        }
        Command::Throughput { size, rounds } => run_throughput(size, rounds),
        Command::Inspect { value, salt } => run_inspect(value, salt),
        Command::Audit { count, tamper } => run_audit(count, tamper),
    };

    if let Err(e) = result {
        eprintln!("verifycell: {e:#}");
        process::exit(1);
    }
}

// ── scenarios ───────────────────────────────────────────────────────

fn run_scenarios() -> Result<()> {
    let scenarios: [(&str, fn() -> bool); 5] = [
        ("construct and verify", || {
            let v = Verified::new(100i32);
            v.verify() && v.checksum() != 0
        }),
        ("modify refreshes checksum", || {
            let v = Verified::new(100i32);
            let old = v.checksum();
            *v.modify() = 999;
            v.verify() && v.checksum() != old
        }),
        ("string append", || {
            let s = Verified::new(String::from("hello"));
            s.modify().push_str(" world");
            &*s.as_str() == "hello world" && s.verify()
        }),
        ("raw write detected", || {
            let v = Verified::new(100i32);
            // bypasses the guard on purpose
            unsafe { v.as_ptr().write(999) };
            !v.verify()
        }),
        ("array indexing", || {
            let a = Verified::new([1, 2, 3, 4, 5]);
            *a.at(4) == 5 && a.verify()
        }),
    ];

    let mut failed = 0;
    for (name, scenario) in scenarios {
        let ok = scenario();
        println!("{} {name}", if ok { "PASS" } else { "FAIL" });
        if !ok {
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} scenario(s) failed");
    }
    Ok(())
}

// ── stress ──────────────────────────────────────────────────────────

fn run_stress<R>(writers: usize, readers: usize, iterations: usize) -> Result<()>
where
    R: RawRwLock + Send + Sync,
{
    let cell: Verified<u64, R> = Verified::with_lock(0);
    let done = AtomicBool::new(false);
    let checks = AtomicUsize::new(0);
    let false_alarms = AtomicUsize::new(0);

    info!(
        lock = strategy_name::<R>(),
        writers, readers, iterations, "starting stress run"
    );
    let start = Instant::now();
    let panicked = thread::scope(|s| {
        for _ in 0..readers {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    checks.fetch_add(1, Ordering::Relaxed);
                    if !cell.verify() {
                        false_alarms.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
        let handles: Vec<_> = (0..writers)
            .map(|_| {
                s.spawn(|| {
                    for _ in 0..iterations {
                        *cell.modify() += 1;
                    }
                })
            })
            .collect();
        let panicked = join_counting_panics(handles);
        done.store(true, Ordering::Release);
        panicked
    });
    let elapsed = start.elapsed();
    if panicked > 0 {
        bail!("{panicked} writer thread(s) panicked");
    }

    let expected = (writers * iterations) as u64;
    let final_value = cell.value();
    let bad = false_alarms.load(Ordering::Relaxed);
    println!("lock:             {}", strategy_name::<R>());
    println!("final value:      {final_value} (expected {expected})");
    println!("verifications:    {}", checks.load(Ordering::Relaxed));
    println!("false alarms:     {bad}");
    println!("elapsed:          {:.3}s", elapsed.as_secs_f64());

    if bad > 0 {
        bail!("{bad} verification(s) failed under concurrency");
    }
    if final_value != expected {
        bail!("lost updates: got {final_value}, expected {expected}");
    }
    if !cell.verify() {
        bail!("final state does not verify");
    }
    Ok(())
}

/// Join every handle, returning how many threads panicked. Joining
/// consumes the panic, so the enclosing scope does not re-raise it.
fn join_counting_panics<T>(handles: Vec<ScopedJoinHandle<'_, T>>) -> usize {
    handles
        .into_iter()
        .map(ScopedJoinHandle::join)
        .filter(|joined| joined.is_err())
        .count()
}

// ── throughput ──────────────────────────────────────────────────────

fn run_throughput(size: usize, rounds: usize) -> Result<()> {
    if size == 0 || rounds == 0 {
        bail!("--size and --rounds must be non-zero");
    }
    let data: Vec<u8> = (0..size).map(|i| (i * 31 + 7) as u8).collect();
    let salt = 0x5A3C;

    let measure = |f: fn(&[u8], u16) -> u64| {
        let start = Instant::now();
        let mut acc = 0u64;
        for _ in 0..rounds {
            acc = acc.wrapping_add(f(black_box(&data), salt));
        }
        let secs = start.elapsed().as_secs_f64().max(f64::EPSILON);
        (acc, (size * rounds) as f64 / secs / 1e6)
    };

    let (fast, fast_mbs) = measure(salted_sum);
    let (slow, slow_mbs) = measure(salted_sum_scalar);
    if fast != slow {
        bail!("dispatched and scalar sums disagree ({fast:#x} vs {slow:#x})");
    }

    println!("simd level:  {}", simd_level().name());
    println!("buffer:      {size} bytes x {rounds} rounds");
    println!("dispatched:  {fast_mbs:.1} MB/s");
    println!("scalar:      {slow_mbs:.1} MB/s");
    println!("speedup:     {:.2}x", fast_mbs / slow_mbs.max(f64::EPSILON));
    Ok(())
}

// ── inspect ─────────────────────────────────────────────────────────

fn run_inspect(value: i32, salt: Option<u16>) -> Result<()> {
    let cell = match salt {
        Some(salt) => Verified::with_salt(value, salt),
        None => Verified::new(value),
    };
    let header = cell.header();
    let verified = cell.verify();
    println!("raw header:  {:#018x}", header.to_raw());
    println!("magic:       {:#010x}", header.magic());
    println!("size:        {}", header.size());
    println!("salt:        {:#06x}", header.salt());
    println!("checksum:    {:#018x}", cell.checksum());
    println!("storage:     {}", if cell.is_inline() { "inline" } else { "owned" });
    println!("verified:    {verified}");
    if !verified {
        bail!("freshly built container failed verification");
    }
    Ok(())
}

// ── audit ───────────────────────────────────────────────────────────

fn run_audit(count: usize, tamper: usize) -> Result<()> {
    if tamper > count {
        bail!("cannot tamper {tamper} of {count} containers");
    }
    let cells: Vec<Verified<u64>> = (0..count as u64).map(Verified::new).collect();

    // spread the tampered cells over the whole range
    let stride = if tamper == 0 { 1 } else { count / tamper };
    let targets: Vec<usize> = (0..tamper).map(|i| i * stride).collect();
    for &i in &targets {
        let cell = cells.get(i).context("tamper index out of range")?;
        // flip one bit without going through the guard
        unsafe { *cell.as_ptr() ^= 1 };
    }

    let start = Instant::now();
    let report = audit(&cells);
    let elapsed = start.elapsed();

    println!("checked:     {}", report.checked);
    println!("failed:      {}", report.failed);
    println!("elapsed:     {:.3}s", elapsed.as_secs_f64());
    if !report.failures.is_empty() {
        let shown: Vec<String> = report.failures.iter().take(16).map(|i| i.to_string()).collect();
        println!("failures:    {}", shown.join(", "));
    }

    if report.failures != targets {
        warn!(expected = ?targets, found = ?report.failures, "audit mismatch");
        bail!(
            "audit reported {} failure(s), expected {}",
            report.failed,
            targets.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_counts_panicked_writers() {
        fn writer(fail: bool) {
            if fail {
                panic!("writer failed");
            }
        }
        let panicked = thread::scope(|s| {
            let handles = vec![
                s.spawn(|| writer(false)),
                s.spawn(|| writer(true)),
                s.spawn(|| writer(false)),
            ];
            join_counting_panics(handles)
        });
        assert_eq!(panicked, 1);
    }

    #[test]
    fn test_stress_run_reports_no_false_alarms() {
        assert!(run_stress::<parking_lot::RawRwLock>(2, 2, 500).is_ok());
        assert!(run_stress::<SpinLock>(2, 1, 200).is_ok());
    }

    #[test]
    fn test_scenarios_pass() {
        assert!(run_scenarios().is_ok());
    }
}
