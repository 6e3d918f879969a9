//! # Statdir - Counters Mirrored Into Plain Files
//!
//! A small, asynchronous stats collector that writes every registered counter
//! to its own file in a directory, updated each time the counter changes.
//!
//! It was made for long-running batch and import jobs: the job updates a few
//! counters, and anything that can read a file can follow the progress. No
//! network service, no database, just:
//!
//! ```text
//! $ cat /tmp/STAT/SUCCESS
//! 30
//! ```
//!
//! Every update performs a blocking file write, so this is a low-volume
//! progress indicator, not a metrics pipeline.
//!
//! ## Directory Layout
//!
//! | File | Content |
//! |------|---------|
//! | `STARTED` | Start time of the collection loop (RFC3339) |
//! | `FINISHED` | Finish time of the collection loop (RFC3339) |
//! | `<NAME>` | Current value of counter `NAME` in decimal, name upper-cased |
//!
//! ## Workflow
//!
//! 1. Create a collector pointed at the stats directory and register counters.
//! 2. Start collecting, on a dedicated thread, and wait until it is ready.
//! 3. Send updates from any number of threads.
//! 4. Finish.
//!
//! ```rust
//! use statdir::Collector;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let dir = std::env::temp_dir().join("statdir-doc-lib");
//! let collector = Arc::new(
//!     Collector::new(&dir)
//!         .with_counter("SUCCESS")
//!         .with_counter("FAILURE"),
//! );
//!
//! let handle = Collector::spawn(&collector).unwrap();
//! collector.wait_ready().unwrap();
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let collector = Arc::clone(&collector);
//!         thread::spawn(move || {
//!             for _ in 0..10 {
//!                 collector.inc("SUCCESS", 1).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//!
//! collector.finish().unwrap();
//! handle.join().unwrap().unwrap();
//!
//! assert_eq!(collector.value_of("SUCCESS").unwrap(), 40);
//! assert_eq!(std::fs::read_to_string(dir.join("SUCCESS")).unwrap(), "40");
//! ```
//!
//! ## Concurrency
//!
//! A single loop owns the directory and applies updates one at a time, so
//! each counter's file is always written in the order its updates were
//! accepted. [`Collector::inc`], [`Collector::set`] and
//! [`Collector::finish`] hand their request over a zero-capacity channel and
//! block until the loop takes it. [`Collector::value_of`] is a plain atomic
//! load and never waits.
//!
//! ## Errors
//!
//! Only startup fails loudly ([`Error::CreateDir`]). Updates to unknown
//! counters are dropped and failed writes are logged through the [`log`]
//! facade; [`Collector::write_errors`] opts in to receiving them.
//!
//! ## Testing
//!
//! The collector writes through the [`fs::FileSystem`] trait.
//! [`fs::MemoryFs`] keeps everything in memory:
//!
//! ```rust
//! use statdir::fs::MemoryFs;
//! use statdir::Collector;
//!
//! let fs = MemoryFs::new();
//! let collector = Collector::with_file_system("stats", fs.clone()).with_counter("ROWS");
//!
//! std::thread::scope(|s| {
//!     let handle = s.spawn(|| collector.collect());
//!     collector.wait_ready().unwrap();
//!     collector.inc("ROWS", 3).unwrap();
//!     collector.finish().unwrap();
//!     handle.join().unwrap().unwrap();
//! });
//!
//! assert_eq!(fs.read_to_string("stats/ROWS").as_deref(), Some("3"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | [`snapshot`] module with serializable collector snapshots |
//! | `json` | JSON helpers on snapshots |
//! | `demo` | Dependencies of the `import_job` demo |

pub mod collector;
pub mod error;
pub mod fs;
pub mod timestamp;

#[cfg(feature = "serde")]
pub mod snapshot;

pub use collector::{Collector, FINISHED_FILE, STARTED_FILE};
pub use error::{Error, Result};
