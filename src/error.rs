//! Unified error type for the collector.
//!
//! Every fallible operation in this crate returns [`Result`], so callers can
//! handle startup failures, unknown counters and misuse of the producer API
//! with a single error type.
//!
//! # Example
//!
//! ```rust
//! use statdir::{Collector, Error};
//!
//! let collector = Collector::new("/tmp/stats").with_counter("SUCCESS");
//!
//! match collector.value_of("FAILURE") {
//!     Err(Error::CounterNotFound(name)) => assert_eq!(name, "FAILURE"),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for all collector operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The stats directory could not be created; the loop never started.
    #[error("cannot create stats directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A counter file could not be written.
    ///
    /// Only reported through [`Collector::write_errors`](crate::Collector::write_errors);
    /// the loop itself keeps running.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested counter was never registered.
    #[error("counter {0}: doesn't exist")]
    CounterNotFound(String),

    /// An update or shutdown request was sent while no loop was running.
    #[error("collector is not collecting")]
    NotCollecting,

    /// `collect` was called on a collector that already ran.
    #[error("collector has already been started")]
    AlreadyStarted,

    /// The loop failed during startup, so it will never become ready.
    #[error("collector failed to start")]
    StartupFailed,

    /// The background collector thread could not be spawned.
    #[error("cannot spawn collector thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A bounded readiness wait elapsed.
    #[error("timed out waiting for the collector to become ready")]
    ReadyTimeout,

    /// A snapshot could not be serialized.
    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for collector operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_counter_not_found_message() {
        let err = Error::CounterNotFound("FOO".to_string());
        assert_eq!(err.to_string(), "counter FOO: doesn't exist");
    }

    #[test]
    fn test_create_dir_keeps_source() {
        use std::error::Error as _;

        let err = Error::CreateDir {
            path: PathBuf::from("/nope/stats"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("cannot create stats directory /nope/stats"));
        assert!(err.source().is_some());
    }
}
