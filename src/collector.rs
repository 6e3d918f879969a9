//! The collector: named counters mirrored into a directory of plain files.
//!
//! A [`Collector`] owns a set of counters registered up front. Once
//! [`Collector::collect`] runs, a single loop applies every update sent by
//! producers and rewrites the file of the updated counter, so the directory
//! always shows the latest value of each counter:
//!
//! ```text
//! <path>/STARTED    # RFC3339 timestamp, written once when the loop starts
//! <path>/FINISHED   # RFC3339 timestamp, written once when the loop exits
//! <path>/<NAME>     # decimal value of counter NAME (upper-cased)
//! ```
//!
//! # Architecture
//!
//! ```text
//!   producer ──inc/set──┐
//!   producer ──inc/set──┼──► rendezvous ──► loop ──► counter cell ──► <path>/<NAME>
//!   producer ──finish───┘                     │
//!                                             └──► <path>/FINISHED on exit
//!
//!   reader ──value_of──► counter cell (atomic load, never waits for the loop)
//! ```
//!
//! The request channels have zero capacity: `inc`, `set` and `finish` return
//! only once the loop has taken the request, so a slow file system throttles
//! producers instead of growing a queue.
//!
//! # Example
//!
//! ```rust
//! use statdir::Collector;
//! use std::sync::Arc;
//!
//! let dir = std::env::temp_dir().join("statdir-doc-collector");
//! let collector = Arc::new(
//!     Collector::new(&dir)
//!         .with_counter("SUCCESS")
//!         .with_counter("FAILURE"),
//! );
//!
//! let handle = Collector::spawn(&collector).unwrap();
//! collector.wait_ready().unwrap();
//!
//! collector.inc("SUCCESS", 30).unwrap();
//! collector.inc("FAILURE", 10).unwrap();
//! collector.finish().unwrap();
//! handle.join().unwrap().unwrap();
//!
//! assert_eq!(std::fs::read_to_string(dir.join("SUCCESS")).unwrap(), "30");
//! assert!(dir.join("FINISHED").exists());
//! ```

mod lifecycle;
mod op;

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use atomic_time::AtomicOptionSystemTime;
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use crossbeam_utils::CachePadded;
use log::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::fs::{FileSystem, OsFs};
use crate::timestamp;

use lifecycle::{Lifecycle, Phase};
use op::Op;

/// Name of the marker file holding the start time.
pub const STARTED_FILE: &str = "STARTED";

/// Name of the marker file holding the finish time.
pub const FINISHED_FILE: &str = "FINISHED";

/// Receiving ends of the request channels, taken by the single run of the loop.
struct Inbox {
    ops: Receiver<Op>,
    shutdown: Receiver<()>,
}

/// A stats collector that writes its counters to a directory.
///
/// Counters are registered with [`add_counter`](Self::add_counter) before
/// collection starts. Registration needs `&mut self`, while the loop and the
/// producers only need `&self`: once the collector is shared (through an
/// [`Arc`] or a scoped borrow) the set of counters is frozen.
///
/// All producer methods are thread safe. See the [module docs](self) for the
/// full workflow.
pub struct Collector {
    path: PathBuf,
    counters: HashMap<String, CachePadded<AtomicI64>>,
    started_at: AtomicOptionSystemTime,
    finished_at: AtomicOptionSystemTime,
    lifecycle: Lifecycle,
    ops: Sender<Op>,
    shutdown: Sender<()>,
    inbox: Mutex<Option<Inbox>>,
    write_errors: Option<Sender<Error>>,
    fs: Box<dyn FileSystem>,
}

impl Collector {
    /// Creates a collector that will write to the directory at `path`.
    ///
    /// Nothing is created on disk until [`collect`](Self::collect) runs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statdir::Collector;
    /// use std::path::Path;
    ///
    /// let collector = Collector::new("/tmp/STAT");
    /// assert_eq!(collector.path(), Path::new("/tmp/STAT"));
    /// assert!(collector.started_at().is_none());
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_file_system(path, OsFs)
    }

    /// Creates a collector writing through the given file system.
    pub fn with_file_system(path: impl Into<PathBuf>, fs: impl FileSystem + 'static) -> Self {
        let (ops, ops_rx) = bounded(0);
        let (shutdown, shutdown_rx) = bounded(0);
        Self {
            path: path.into(),
            counters: HashMap::new(),
            started_at: AtomicOptionSystemTime::none(),
            finished_at: AtomicOptionSystemTime::none(),
            lifecycle: Lifecycle::new(),
            ops,
            shutdown,
            inbox: Mutex::new(Some(Inbox {
                ops: ops_rx,
                shutdown: shutdown_rx,
            })),
            write_errors: None,
            fs: Box::new(fs),
        }
    }

    /// Registers a counter starting at zero.
    ///
    /// Registering a name twice keeps the existing counter and its value.
    /// The file of the counter is named after the upper-cased name, joined
    /// to the stats directory as a path component: a name containing `/` or
    /// `..` points outside the directory.
    ///
    /// A counter whose upper-cased name is `STARTED` or `FINISHED` is kept in
    /// memory only; it never overwrites the marker files.
    pub fn add_counter(&mut self, name: impl Into<String>) {
        self.counters
            .entry(name.into())
            .or_insert_with(|| CachePadded::new(AtomicI64::new(0)));
    }

    /// Registers a counter, returning `self` for method chaining.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statdir::Collector;
    ///
    /// let collector = Collector::new("/tmp/STAT")
    ///     .with_counter("SUCCESS")
    ///     .with_counter("FAILURE");
    /// assert_eq!(collector.counter_names(), vec!["FAILURE", "SUCCESS"]);
    /// ```
    pub fn with_counter(mut self, name: impl Into<String>) -> Self {
        self.add_counter(name);
        self
    }

    /// Opts in to reports of failed file writes.
    ///
    /// By default a failed write is logged and otherwise ignored. After this
    /// call every failed write is also sent as [`Error::Write`] on the
    /// returned channel. Calling it again replaces the previous channel.
    pub fn write_errors(&mut self) -> Receiver<Error> {
        let (tx, rx) = unbounded();
        self.write_errors = Some(tx);
        rx
    }

    /// Returns the path of the stats directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the time the loop started, or `None` before that.
    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at.load(Ordering::Acquire)
    }

    /// Returns the time the loop exited, or `None` before that.
    pub fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at.load(Ordering::Acquire)
    }

    /// Returns the names of all registered counters, sorted.
    pub fn counter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.counters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the current value of a counter.
    ///
    /// This is a single atomic load and never waits for the loop, so the
    /// value can be one update ahead of the counter's file.
    ///
    /// # Errors
    ///
    /// [`Error::CounterNotFound`] if `name` was never registered.
    pub fn value_of(&self, name: &str) -> Result<i64> {
        self.counters
            .get(name)
            .map(|cell| cell.load(Ordering::Relaxed))
            .ok_or_else(|| Error::CounterNotFound(name.to_string()))
    }

    /// Returns `true` while the loop accepts updates.
    pub fn is_ready(&self) -> bool {
        self.lifecycle.phase() == Phase::Running
    }

    /// Returns `true` once the loop exited and `FINISHED` was written.
    pub fn is_finished(&self) -> bool {
        self.lifecycle.phase() == Phase::Finished
    }

    /// Blocks until the loop accepts updates.
    ///
    /// Any number of threads may wait, before or after `collect` was called.
    /// Returns immediately if the loop already ran to completion.
    ///
    /// # Errors
    ///
    /// [`Error::StartupFailed`] if `collect` failed before becoming ready.
    pub fn wait_ready(&self) -> Result<()> {
        self.lifecycle.wait_ready(None)
    }

    /// Like [`wait_ready`](Self::wait_ready), giving up after `timeout`
    /// with [`Error::ReadyTimeout`].
    pub fn wait_ready_timeout(&self, timeout: Duration) -> Result<()> {
        self.lifecycle.wait_ready(Some(timeout))
    }

    /// Adds `delta` (possibly negative) to a counter.
    ///
    /// Blocks until the loop takes the request. Updates to unregistered
    /// counters are accepted and dropped by the loop.
    ///
    /// # Errors
    ///
    /// [`Error::NotCollecting`] if the loop is not running.
    pub fn inc(&self, name: &str, delta: i64) -> Result<()> {
        self.submit(Op::Inc {
            name: name.to_string(),
            delta,
        })
    }

    /// Sets a counter to `value`.
    ///
    /// Same blocking and error behavior as [`inc`](Self::inc).
    pub fn set(&self, name: &str, value: i64) -> Result<()> {
        self.submit(Op::Set {
            name: name.to_string(),
            value,
        })
    }

    /// Stops the loop.
    ///
    /// Blocks until the loop takes the request; the loop then writes
    /// `FINISHED` and returns from [`collect`](Self::collect). Join the
    /// collecting thread to wait for that.
    ///
    /// # Errors
    ///
    /// [`Error::NotCollecting`] if the loop is not running.
    pub fn finish(&self) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::NotCollecting);
        }
        self.shutdown.send(()).map_err(|_| Error::NotCollecting)
    }

    fn submit(&self, op: Op) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::NotCollecting);
        }
        self.ops.send(op).map_err(|_| Error::NotCollecting)
    }

    /// Runs the collection loop on the calling thread until [`finish`](Self::finish).
    ///
    /// Creates the directory, writes `STARTED`, signals readiness and then
    /// applies updates one at a time, rewriting the file of each updated
    /// counter. `FINISHED` is written when the loop exits, even if it
    /// unwinds.
    ///
    /// A collector runs at most once.
    ///
    /// # Errors
    ///
    /// - [`Error::CreateDir`] if the directory cannot be created.
    /// - [`Error::AlreadyStarted`] on a second call.
    ///
    /// Failed counter writes are not errors; see [`write_errors`](Self::write_errors).
    pub fn collect(&self) -> Result<()> {
        self.lifecycle.begin()?;
        let inbox = self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::AlreadyStarted)?;

        if let Err(source) = self.fs.create_dir_all(&self.path) {
            self.lifecycle.transition(Phase::Failed);
            return Err(Error::CreateDir {
                path: self.path.clone(),
                source,
            });
        }

        let files = self.counter_files();

        let started = SystemTime::now();
        self.started_at.store(Some(started), Ordering::Release);
        self.write(
            &self.path.join(STARTED_FILE),
            timestamp::format(started).as_bytes(),
        );

        // Declared after the inbox so it runs first: FINISHED is on disk
        // before blocked producers see the channel close.
        let _finish = FinishGuard { collector: self };

        self.lifecycle.transition(Phase::Running);
        info!(
            "collecting {} counter(s) into {}",
            files.len(),
            self.path.display()
        );

        loop {
            select! {
                recv(inbox.ops) -> op => match op {
                    Ok(op) => self.apply(&files, op),
                    Err(_) => break,
                },
                recv(inbox.shutdown) -> _ => break,
            }
        }

        Ok(())
    }

    /// Runs [`collect`](Self::collect) on a dedicated thread.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use statdir::fs::MemoryFs;
    /// use statdir::Collector;
    /// use std::sync::Arc;
    ///
    /// let collector = Arc::new(Collector::with_file_system("stats", MemoryFs::new()));
    /// let handle = Collector::spawn(&collector).unwrap();
    /// collector.wait_ready().unwrap();
    /// collector.finish().unwrap();
    /// assert!(handle.join().unwrap().is_ok());
    /// ```
    pub fn spawn(collector: &Arc<Self>) -> Result<JoinHandle<Result<()>>> {
        let collector = Arc::clone(collector);
        thread::Builder::new()
            .name("statdir-collector".to_string())
            .spawn(move || collector.collect())
            .map_err(Error::Spawn)
    }

    /// Maps every counter name to its file, upper-casing the name.
    ///
    /// Names differing only by case stay distinct in memory but share one
    /// file; that is reported once here. Names colliding with a marker file
    /// get no file at all.
    fn counter_files(&self) -> HashMap<&str, PathBuf> {
        let mut by_file: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for name in self.counters.keys() {
            by_file
                .entry(name.to_uppercase())
                .or_default()
                .push(name.as_str());
        }

        let mut files = HashMap::with_capacity(self.counters.len());
        for (file, mut names) in by_file {
            if file == STARTED_FILE || file == FINISHED_FILE {
                names.sort_unstable();
                warn!(
                    "counters {:?} collide with the {} marker and are not persisted",
                    names, file
                );
                continue;
            }
            if names.len() > 1 {
                names.sort_unstable();
                warn!("counters {:?} share the file {}", names, file);
            }
            let path = self.path.join(&file);
            for name in names {
                files.insert(name, path.clone());
            }
        }
        files
    }

    fn apply(&self, files: &HashMap<&str, PathBuf>, op: Op) {
        let Some(cell) = self.counters.get(op.name()) else {
            trace!("dropping update of unknown counter {}", op.name());
            return;
        };
        let value = op.apply(cell);
        if let Some(file) = files.get(op.name()) {
            self.write(file, value.to_string().as_bytes());
        }
        debug!("{} = {}", op.name(), value);
    }

    /// Best-effort write: failures are logged and, if requested, reported.
    fn write(&self, path: &Path, contents: &[u8]) {
        if let Err(source) = self.fs.write_file(path, contents) {
            warn!("cannot write {}: {}", path.display(), source);
            if let Some(errors) = &self.write_errors {
                let _ = errors.send(Error::Write {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }
}

/// Writes `FINISHED` and closes the collector when the loop exits.
struct FinishGuard<'a> {
    collector: &'a Collector,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        let collector = self.collector;
        let finished = SystemTime::now();
        collector.finished_at.store(Some(finished), Ordering::Release);
        collector.write(
            &collector.path.join(FINISHED_FILE),
            timestamp::format(finished).as_bytes(),
        );
        collector.lifecycle.transition(Phase::Finished);
        info!("finished collecting into {}", collector.path.display());
    }
}

impl Debug for Collector {
    /// Formats the collector with its phase and current counter values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counters: BTreeMap<&str, i64> = self
            .counters
            .iter()
            .map(|(name, cell)| (name.as_str(), cell.load(Ordering::Relaxed)))
            .collect();
        f.debug_struct("Collector")
            .field("path", &self.path)
            .field("phase", &self.lifecycle.phase())
            .field("counters", &counters)
            .finish()
    }
}
