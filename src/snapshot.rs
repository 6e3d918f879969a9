//! Serializable snapshots of a collector.
//!
//! The files in the stats directory are meant for shell scripts. A
//! [`CollectorSnapshot`] captures the same information in one value that can
//! be logged, returned from an API or written elsewhere with any serde
//! format.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature; the JSON helpers also need
//! `json`:
//!
//! ```toml
//! [dependencies]
//! statdir = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use statdir::Collector;
//!
//! let collector = Collector::new("/tmp/STAT").with_counter("ROWS");
//! let json = collector.snapshot().to_json()?;
//! // {"path":"/tmp/STAT","counters":[{"name":"ROWS","value":0}]}
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::collector::Collector;
use crate::timestamp;

/// Name and value of one counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// The name of the counter, as registered.
    pub name: String,
    /// The value of the counter.
    pub value: i64,
}

impl CounterSnapshot {
    /// Creates a new counter snapshot.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A point-in-time capture of a collector.
///
/// Timestamps use the same RFC3339 text as the marker files and are omitted
/// until the corresponding event happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectorSnapshot {
    /// The stats directory.
    pub path: PathBuf,
    /// Content of `STARTED`, if the loop started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// Content of `FINISHED`, if the loop exited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// All registered counters, sorted by name.
    pub counters: Vec<CounterSnapshot>,
}

impl CollectorSnapshot {
    /// Finds a counter by name.
    pub fn get(&self, name: &str) -> Option<&CounterSnapshot> {
        self.counters.iter().find(|c| c.name == name)
    }

    /// Serializes the snapshot to compact JSON.
    #[cfg(feature = "json")]
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the snapshot to indented JSON.
    #[cfg(feature = "json")]
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Collector {
    /// Captures the current state of the collector.
    ///
    /// Counter values are read with the same atomic loads as
    /// [`value_of`](Collector::value_of), so they may lead the files on disk
    /// by one update.
    pub fn snapshot(&self) -> CollectorSnapshot {
        let counters = self
            .counter_names()
            .into_iter()
            .filter_map(|name| {
                self.value_of(name)
                    .ok()
                    .map(|value| CounterSnapshot::new(name, value))
            })
            .collect();
        CollectorSnapshot {
            path: self.path().to_path_buf(),
            started_at: self.started_at().map(timestamp::format),
            finished_at: self.finished_at().map(timestamp::format),
            counters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use std::thread;

    #[test]
    fn test_snapshot_before_collect() {
        let collector = Collector::new("/tmp/STAT")
            .with_counter("b")
            .with_counter("a");
        let snapshot = collector.snapshot();

        assert_eq!(snapshot.path, PathBuf::from("/tmp/STAT"));
        assert!(snapshot.started_at.is_none());
        assert!(snapshot.finished_at.is_none());
        assert_eq!(
            snapshot.counters,
            vec![CounterSnapshot::new("a", 0), CounterSnapshot::new("b", 0)]
        );
    }

    #[test]
    fn test_snapshot_after_collect() {
        let fs = MemoryFs::new();
        let collector = Collector::with_file_system("stats", fs.clone()).with_counter("ROWS");

        thread::scope(|s| {
            let handle = s.spawn(|| collector.collect());
            collector.wait_ready().unwrap();
            collector.set("ROWS", 12).unwrap();
            collector.finish().unwrap();
            handle.join().unwrap().unwrap();
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.get("ROWS").map(|c| c.value), Some(12));
        assert!(snapshot.get("MISSING").is_none());
        assert_eq!(
            snapshot.started_at,
            fs.read_to_string("stats/STARTED")
        );
        assert_eq!(
            snapshot.finished_at,
            fs.read_to_string("stats/FINISHED")
        );
    }

    #[test]
    fn test_serialize_skips_missing_timestamps() {
        let snapshot = CollectorSnapshot {
            path: PathBuf::from("stats"),
            started_at: None,
            finished_at: None,
            counters: vec![CounterSnapshot::new("ROWS", -4)],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"path":"stats","counters":[{"name":"ROWS","value":-4}]}"#);
    }

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{"path":"stats","started_at":"2014-05-13T16:53:20Z","counters":[{"name":"ROWS","value":3}]}"#;
        let snapshot: CollectorSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.started_at.as_deref(), Some("2014-05-13T16:53:20Z"));
        assert!(snapshot.finished_at.is_none());
        assert_eq!(snapshot.counters, vec![CounterSnapshot::new("ROWS", 3)]);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_to_json() {
        let collector = Collector::new("stats").with_counter("ROWS");
        let json = collector.snapshot().to_json().unwrap();
        assert_eq!(json, r#"{"path":"stats","counters":[{"name":"ROWS","value":0}]}"#);
        assert!(collector.snapshot().to_json_pretty().unwrap().contains('\n'));
    }
}
