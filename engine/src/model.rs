//! Core data model for organize runs.
//!
//! This module defines the main data structures for an organize run:
//! - Options: what a run does with each file
//! - FileTask / FileOutcome: one discovered file and what happened to it
//! - ProgressState: processed/total counters and the derived percentage
//! - RunState, RunSummary: engine lifecycle and end-of-run totals

use std::path::PathBuf;

use crate::category::Category;
use crate::checksums::ChecksumAlgorithm;

/// The operation applied to every file of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Duplicate files; sources remain unchanged
    #[default]
    Copy,
    /// Relocate files; a source is removed only after its copy is confirmed
    Move,
}

impl Mode {
    /// Past-tense verb used in log lines.
    pub fn verb(self) -> &'static str {
        match self {
            Mode::Copy => "Copied",
            Mode::Move => "Moved",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Copy => write!(f, "Copy"),
            Mode::Move => write!(f, "Move"),
        }
    }
}

/// Settings fixed for the whole of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    pub mode: Mode,

    /// Compare content checksums after each copy, on top of the size check
    pub verify: Option<ChecksumAlgorithm>,
}

impl Options {
    pub fn new(mode: Mode) -> Self {
        Options { mode, verify: None }
    }

    pub fn with_verify(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.verify = Some(algorithm);
        self
    }
}

/// Lifecycle of an [`Organizer`](crate::Organizer) run.
///
/// `Completed` is terminal for a run; the engine accepts a new run from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Discovering = 1,
    Processing = 2,
    Completed = 3,
}

impl RunState {
    /// True while a run owns the engine.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Discovering | RunState::Processing)
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Discovering,
            2 => RunState::Processing,
            3 => RunState::Completed,
            _ => RunState::Idle,
        }
    }
}

/// One discovered file and the category folder it is headed for.
#[derive(Debug, Clone)]
pub struct FileTask {
    pub source_path: PathBuf,
    pub category: Category,
    pub outcome: FileOutcome,
}

impl FileTask {
    pub fn new(source_path: PathBuf, category: Category) -> Self {
        FileTask {
            source_path,
            category,
            outcome: FileOutcome::Pending,
        }
    }
}

/// The state of an individual file within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Not yet processed
    Pending,
    /// Copied or moved into its category folder
    Transferred,
    /// Error occurred; message as logged
    Failed(String),
}

/// Processed/total counters for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub processed: usize,
    pub total: usize,
}

impl ProgressState {
    pub fn new(total: usize) -> Self {
        ProgressState {
            processed: 0,
            total,
        }
    }

    /// Record one more processed file and return the new percentage.
    pub fn advance(&mut self) -> u8 {
        if self.processed < self.total {
            self.processed += 1;
        }
        self.percent()
    }

    /// `floor(processed * 100 / total)`, or 0 for an empty run.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.processed * 100) / self.total).min(100) as u8
    }

    pub fn is_done(&self) -> bool {
        self.processed == self.total
    }
}

/// End-of-run totals, returned from the worker once it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub transferred: usize,
    pub failed: usize,
}
