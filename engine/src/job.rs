//! Run orchestration.
//!
//! [`run_job`] is the body of one organize run. It executes synchronously on
//! whatever thread calls it; [`Organizer`](crate::Organizer) calls it from its
//! worker thread. The two phases are:
//! - Discovery: scan every source root once and freeze the file list
//! - Processing: for each file in order, classify, ensure the category
//!   folder, pick a free name, transfer, then report
//!
//! A failure on one file is logged and the run moves on to the next.

use std::path::{Path, PathBuf};

use crate::category::categorize;
use crate::error::EngineError;
use crate::events::EventSink;
use crate::fs_ops::{self, MoveMethod};
use crate::model::{FileOutcome, FileTask, Mode, Options, ProgressState, RunState, RunSummary};
use crate::naming::{self, TokenSource};

/// Log line emitted when discovery finds nothing to do.
pub const NO_FILES_MESSAGE: &str = "No files found, nothing to organize.";

/// Execute one organize run, reporting to `sink`.
///
/// `on_phase` is told when the run moves from discovery to processing and
/// when it completes. `sink.on_completed` is called exactly once, after
/// every discovered file has been processed.
pub fn run_job(
    sources: &[PathBuf],
    destination: &Path,
    options: Options,
    tokens: &dyn TokenSource,
    sink: &mut dyn EventSink,
    mut on_phase: impl FnMut(RunState),
) -> RunSummary {
    on_phase(RunState::Discovering);
    let discovery = fs_ops::discover_files(sources);
    for problem in &discovery.problems {
        sink.on_log(problem_message(problem));
    }

    let mut tasks: Vec<FileTask> = discovery
        .files
        .into_iter()
        .map(|path| {
            let category = categorize(&file_name_of(&path));
            FileTask::new(path, category)
        })
        .collect();

    let mut progress = ProgressState::new(tasks.len());
    tracing::info!(
        files = tasks.len(),
        destination = %destination.display(),
        mode = %options.mode,
        "discovery finished"
    );

    if tasks.is_empty() {
        sink.on_log(NO_FILES_MESSAGE.to_string());
        on_phase(RunState::Completed);
        sink.on_completed();
        return RunSummary::default();
    }

    on_phase(RunState::Processing);
    for task in tasks.iter_mut() {
        match process_file(task, destination, options, tokens) {
            Ok(dst) => {
                task.outcome = FileOutcome::Transferred;
                sink.on_log(format!(
                    "{}: {} -> {}",
                    options.mode.verb(),
                    task.source_path.display(),
                    dst.display()
                ));
            }
            Err(e) => {
                tracing::warn!(
                    path = %task.source_path.display(),
                    error = %e,
                    os_error = ?e.raw_os_error(),
                    "file failed"
                );
                let message = format!("Error processing {}: {}", task.source_path.display(), e);
                task.outcome = FileOutcome::Failed(e.to_string());
                sink.on_log(message);
            }
        }

        let percent = progress.advance();
        sink.on_progress(percent);
    }

    debug_assert!(progress.is_done());
    let summary = summarize(&tasks, progress);
    tracing::info!(
        transferred = summary.transferred,
        failed = summary.failed,
        "run finished"
    );

    on_phase(RunState::Completed);
    sink.on_completed();
    summary
}

/// Classify-ensure-resolve-transfer for one file. Returns the destination path.
fn process_file(
    task: &FileTask,
    destination: &Path,
    options: Options,
    tokens: &dyn TokenSource,
) -> Result<PathBuf, EngineError> {
    let target_dir = destination.join(task.category.folder_name());
    fs_ops::ensure_dir(&target_dir)?;

    let name = naming::unique_name(&target_dir, &file_name_of(&task.source_path), tokens)?;
    let dst = target_dir.join(name);

    match options.mode {
        Mode::Copy => {
            let bytes = fs_ops::copy_file_with_metadata(&task.source_path, &dst, options.verify)?;
            tracing::debug!(src = %task.source_path.display(), dst = %dst.display(), bytes, "copied");
        }
        Mode::Move => {
            let method = fs_ops::move_file(&task.source_path, &dst, options.verify)?;
            tracing::debug!(
                src = %task.source_path.display(),
                dst = %dst.display(),
                renamed = method == MoveMethod::Renamed,
                "moved"
            );
        }
    }

    Ok(dst)
}

fn problem_message(problem: &EngineError) -> String {
    match problem {
        EngineError::SourceNotFound { .. } => format!("Skipped: {}", problem),
        _ => format!("Warning: {}", problem),
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn summarize(tasks: &[FileTask], progress: ProgressState) -> RunSummary {
    let transferred = tasks
        .iter()
        .filter(|t| t.outcome == FileOutcome::Transferred)
        .count();
    RunSummary {
        total: progress.total,
        processed: progress.processed,
        transferred,
        failed: tasks.len() - transferred,
    }
}
