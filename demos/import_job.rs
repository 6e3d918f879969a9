//! Demo: a fake import job reporting its progress through a stats directory.
//!
//! Run with:
//! ```bash
//! RUST_LOG=statdir=debug cargo run --example import_job --features demo -- --dir /tmp/STAT
//! ```
//!
//! While it runs, watch the progress from another terminal:
//! ```bash
//! watch cat /tmp/STAT/SUCCESS /tmp/STAT/FAILURE
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use statdir::Collector;

/// Simulated import job writing its counters to a directory.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Stats directory
    #[arg(short, long, default_value = "/tmp/STAT")]
    dir: PathBuf,

    /// Number of worker threads
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Records imported by each worker
    #[arg(short, long, default_value = "1000")]
    records: usize,

    /// Pause between records, in milliseconds
    #[arg(long, default_value = "1")]
    delay: u64,

    /// Every Nth record fails
    #[arg(long, default_value = "25")]
    fail_every: usize,

    /// Print a JSON snapshot when done
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let collector = Arc::new(
        Collector::new(&args.dir)
            .with_counter("SUCCESS")
            .with_counter("FAILURE")
            .with_counter("WORKERS"),
    );

    let handle = Collector::spawn(&collector)?;
    collector.wait_ready()?;
    collector.set("WORKERS", args.workers as i64)?;

    let mut workers = vec![];
    for i in 0..args.workers {
        let collector = Arc::clone(&collector);
        let args_records = args.records;
        let fail_every = args.fail_every.max(1);
        let delay = Duration::from_millis(args.delay);
        workers.push(thread::spawn(move || -> statdir::Result<()> {
            for j in 0..args_records {
                if (i * args_records + j) % fail_every == 0 {
                    collector.inc("FAILURE", 1)?;
                } else {
                    collector.inc("SUCCESS", 1)?;
                }
                thread::sleep(delay);
            }
            collector.inc("WORKERS", -1)
        }));
    }

    for worker in workers {
        worker.join().map_err(|_| "worker panicked")??;
    }

    collector.finish()?;
    handle.join().map_err(|_| "collector panicked")??;

    if args.json {
        println!("{}", collector.snapshot().to_json_pretty()?);
    } else {
        println!(
            "imported {} records ({} failed) into {}",
            collector.value_of("SUCCESS")?,
            collector.value_of("FAILURE")?,
            collector.path().display()
        );
    }

    Ok(())
}
