//! Background runner with a single-run guard.
//!
//! [`Organizer::start`] validates its arguments, claims the engine with an
//! atomic state transition and hands the run to a dedicated worker thread.
//! Everything after that reaches the caller only through its [`EventSink`].

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::StartError;
use crate::events::EventSink;
use crate::job::run_job;
use crate::model::{Options, RunState, RunSummary};
use crate::naming::{TokenSource, UuidTokens};

const WORKER_NAME: &str = "sorter-worker";

/// A file-organizing engine that runs at most one job at a time.
///
/// Cloning is cheap and clones share the same run guard.
#[derive(Clone)]
pub struct Organizer {
    state: Arc<AtomicU8>,
    tokens: Arc<dyn TokenSource>,
}

impl Organizer {
    pub fn new() -> Self {
        Self::with_token_source(UuidTokens)
    }

    /// Use `tokens` for collision suffixes instead of random UUIDs.
    pub fn with_token_source<T: TokenSource + 'static>(tokens: T) -> Self {
        Organizer {
            state: Arc::new(AtomicU8::new(RunState::Idle as u8)),
            tokens: Arc::new(tokens),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    /// Start organizing `sources` into `destination` on a background thread.
    ///
    /// Returns immediately. Bad arguments and a run already in progress are
    /// reported here and never through `sink`.
    pub fn start<S: EventSink>(
        &self,
        sources: &[PathBuf],
        destination: &Path,
        options: Options,
        sink: S,
    ) -> Result<RunHandle, StartError> {
        if sources.is_empty() {
            return Err(StartError::NoSources);
        }
        if destination.as_os_str().is_empty() {
            return Err(StartError::NoDestination);
        }

        let previous = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if RunState::from_u8(current).is_active() {
                    None
                } else {
                    Some(RunState::Discovering as u8)
                }
            })
            .map_err(|_| StartError::AlreadyRunning)?;

        let sources = sources.to_vec();
        let destination = destination.to_path_buf();
        let tokens = Arc::clone(&self.tokens);
        let guard = RunGuard::claimed(Arc::clone(&self.state));
        let mut sink = sink;

        let spawned = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                tracing::info!(sources = sources.len(), mode = %options.mode, "organize run started");
                run_job(
                    &sources,
                    &destination,
                    options,
                    tokens.as_ref(),
                    &mut sink,
                    |phase| guard.set(phase),
                )
            });

        match spawned {
            Ok(join) => Ok(RunHandle { join }),
            Err(e) => {
                // The closure never ran and its guard released the claim as
                // Completed; put back the state we claimed from unless another
                // start has already taken it.
                let _ = self.state.compare_exchange(
                    RunState::Completed as u8,
                    previous,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                Err(StartError::Spawn(e))
            }
        }
    }
}

impl Default for Organizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Organizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Organizer")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Handle to a run in progress.
#[derive(Debug)]
pub struct RunHandle {
    join: JoinHandle<RunSummary>,
}

impl RunHandle {
    /// Block until the worker finishes and return its totals.
    ///
    /// Errors only if the worker panicked.
    pub fn join(self) -> thread::Result<RunSummary> {
        self.join.join()
    }
}

/// Publishes one run's phase changes and releases the engine if the worker unwinds.
///
/// The guard only ever replaces the exact value it stored last. Once its run
/// has published `Completed` it holds nothing, so a newer run started from
/// the completion event is never touched by this one's teardown.
struct RunGuard {
    state: Arc<AtomicU8>,
    held: Cell<Option<u8>>,
}

impl RunGuard {
    /// Guard for a run that has just stored `Discovering`.
    fn claimed(state: Arc<AtomicU8>) -> Self {
        RunGuard {
            state,
            held: Cell::new(Some(RunState::Discovering as u8)),
        }
    }

    fn set(&self, phase: RunState) {
        let Some(last) = self.held.get() else {
            return;
        };
        let next = phase as u8;
        let swapped = self
            .state
            .compare_exchange(last, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !swapped {
            tracing::warn!(?phase, "run state changed underneath the worker");
        }
        self.held.set((swapped && phase.is_active()).then_some(next));
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(last) = self.held.take() {
            let _ = self.state.compare_exchange(
                last,
                RunState::Completed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
        }
    }
}
