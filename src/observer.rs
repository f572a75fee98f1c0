// src/observer.rs

//! Observation of bag operations
//!
//! Every operation that does work on behalf of a caller (`discover`,
//! `charge`, `deliver`) takes an explicit `&dyn Observer`. Implementations
//! include:
//! - `SilentObserver`: No-op for scripted/quiet use
//! - `LogObserver`: Forwards events to tracing
//! - `CallbackObserver`: Calls a user-provided closure
//!
//! # Example
//!
//! ```ignore
//! use bagman::observer::{BagEvent, CallbackObserver};
//!
//! let observer = CallbackObserver::new(|event: &BagEvent| eprintln!("{event}"));
//! bag.deliver(&requests, &instructions, &observer)?;
//! ```

use std::fmt;
use tracing::{info, warn};

/// Events emitted while resolving, charging and delivering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BagEvent {
    /// A requirement was taken off the work queue
    Requested { requirement: String },
    /// Repository lookup returned these versions
    CandidatesFound { name: String, versions: Vec<String> },
    /// A version was chosen for a name
    Selected { name: String, version: String },
    /// Resolution failed on a conflict
    Conflict { package: String, detail: String },
    /// A package was stored
    Charged { name: String, version: String, digest: String },
    /// A resolved package was unpacked
    Unboxed { name: String, version: String, files: usize },
    /// An operation completed
    Finished { operation: &'static str, count: usize },
}

impl fmt::Display for BagEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BagEvent::Requested { requirement } => write!(f, "requested {requirement}"),
            BagEvent::CandidatesFound { name, versions } => {
                write!(f, "found {} version(s) of {}: {}", versions.len(), name, versions.join(", "))
            }
            BagEvent::Selected { name, version } => write!(f, "selected {name} {version}"),
            BagEvent::Conflict { package, detail } => write!(f, "conflict on {package}: {detail}"),
            BagEvent::Charged {
                name,
                version,
                digest,
            } => write!(f, "charged {name} {version} ({digest})"),
            BagEvent::Unboxed {
                name,
                version,
                files,
            } => write!(f, "unboxed {name} {version}: {files} file(s)"),
            BagEvent::Finished { operation, count } => write!(f, "{operation} finished ({count})"),
        }
    }
}

/// Receiver of bag events
///
/// Implementations should be thread-safe (Send + Sync) so one observer can
/// watch operations running on several threads.
pub trait Observer: Send + Sync {
    fn notify(&self, event: &BagEvent);
}

/// Silent observer (no-op)
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl Observer for SilentObserver {
    fn notify(&self, _event: &BagEvent) {}
}

/// Logging observer
///
/// Logs events to tracing at info level, conflicts at warn level.
#[derive(Debug, Clone)]
pub struct LogObserver {
    name: String,
}

impl LogObserver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new("bag")
    }
}

impl Observer for LogObserver {
    fn notify(&self, event: &BagEvent) {
        match event {
            BagEvent::Conflict { .. } => warn!("{}: {}", self.name, event),
            _ => info!("{}: {}", self.name, event),
        }
    }
}

/// Callback-based observer
///
/// Calls a user-provided function for every event.
pub struct CallbackObserver<F>
where
    F: Fn(&BagEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackObserver<F>
where
    F: Fn(&BagEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> Observer for CallbackObserver<F>
where
    F: Fn(&BagEvent) + Send + Sync,
{
    fn notify(&self, event: &BagEvent) {
        (self.callback)(event);
    }
}
