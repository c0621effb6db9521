//! # Sorter Engine - File Organizing Library
//!
//! A headless engine that sorts files from one or more source folders into
//! category folders (`Images`, `Videos`, `Audio`, `Documents`, `Archives`,
//! `Others`) under a destination root.
//! Designed as the foundation for multiple front ends (CLI, GUI, automation).
//!
//! ## Overview
//!
//! - Recursive discovery of regular files, frozen before any transfer starts
//! - Extension-based classification, case-insensitive
//! - Collision-free naming: an existing `clip.mp4` makes the newcomer `clip_<8 hex>.mp4`
//! - Copy with timestamp preservation, or move that never deletes a source
//!   before its copy is confirmed
//! - Per-file error isolation: one bad file never stops a run
//! - Progress and log events delivered in order through an [`EventSink`]
//! - One dedicated worker thread per run; a second start while busy is refused
//!
//! ## Basic Usage
//!
//! ```no_run
//! use std::path::{Path, PathBuf};
//! use sorter_engine::{events, EngineEvent, Mode, Options, Organizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let organizer = Organizer::new();
//! let (sink, events) = events::channel();
//!
//! let handle = organizer.start(
//!     &[PathBuf::from("/home/me/Downloads")],
//!     Path::new("/home/me/Sorted"),
//!     Options::new(Mode::Copy),
//!     sink,
//! )?;
//!
//! for event in events {
//!     match event {
//!         EngineEvent::Progress(percent) => println!("{}%", percent),
//!         EngineEvent::Log(line) => println!("{}", line),
//!         EngineEvent::Completed => break,
//!     }
//! }
//!
//! let summary = handle.join().expect("worker panicked");
//! println!("{} of {} files organized", summary.transferred, summary.total);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **category**: extension tables and `categorize`
//! - **naming**: collision-free destination names, injectable token source
//! - **fs_ops**: discovery, directory creation, copy and move
//! - **checksums**: optional content verification after a copy
//! - **events**: the event sink trait and a channel-backed sink
//! - **job**: one run, start to finish, on the calling thread
//! - **organizer**: the background runner and its single-run guard
//! - **model**: options, per-file tasks, progress and summaries
//! - **error**: start-time rejections and per-file failures

pub mod category;
pub mod checksums;
pub mod error;
pub mod events;
pub mod fs_ops;
pub mod job;
pub mod model;
pub mod naming;
pub mod organizer;

// Re-export main types and functions
pub use category::{categorize, Category};
pub use checksums::{compute_file_checksum, ChecksumAlgorithm, ChecksumValue};
pub use error::{EngineError, StartError};
pub use events::{ChannelSink, EngineEvent, EventSink};
pub use job::{run_job, NO_FILES_MESSAGE};
pub use model::{FileOutcome, FileTask, Mode, Options, ProgressState, RunState, RunSummary};
pub use naming::{unique_name, TokenSource, UuidTokens};
pub use organizer::{Organizer, RunHandle};
