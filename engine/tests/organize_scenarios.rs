//! End-to-end runs through `Organizer`, observed via the event channel.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};
use sorter_engine::{
    events, EngineEvent, EventSink, Mode, Options, Organizer, RunHandle, RunState, StartError,
    TokenSource, NO_FILES_MESSAGE,
};

const SCENARIO_FILES: [(&str, &str); 4] = [
    ("photo.jpg", "Images"),
    ("clip.mp4", "Videos"),
    ("notes.txt", "Documents"),
    ("unknown.xyz", "Others"),
];

fn write_scenario_sources(src: &Path) {
    fs::create_dir_all(src).expect("Failed to create src dir");
    for (name, _) in SCENARIO_FILES {
        fs::write(src.join(name), format!("original {}", name)).expect("write source");
    }
}

fn run_to_end(
    organizer: &Organizer,
    sources: &[PathBuf],
    dst: &Path,
    options: Options,
) -> Vec<EngineEvent> {
    let (sink, rx) = events::channel();
    let handle = organizer
        .start(sources, dst, options, sink)
        .expect("start should be accepted");
    handle.join().expect("worker panicked");
    rx.iter().collect()
}

fn logs(events: &[EngineEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Log(line) => Some(line.as_str()),
            _ => None,
        })
        .collect()
}

fn progress(events: &[EngineEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

fn completions(events: &[EngineEvent]) -> usize {
    events
        .iter()
        .filter(|e| **e == EngineEvent::Completed)
        .count()
}

struct CountingTokens(AtomicUsize);

impl TokenSource for CountingTokens {
    fn token(&self) -> String {
        format!("{:08x}", self.0.fetch_add(1, Ordering::SeqCst) + 0xa0)
    }
}

#[test]
fn copy_sorts_every_file_into_its_category() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_scenario_sources(&src);

    let events = run_to_end(&Organizer::new(), &[src.clone()], &dst, Options::new(Mode::Copy));

    for (name, category) in SCENARIO_FILES {
        let placed = dst.join(category).join(name);
        assert_eq!(
            fs::read_to_string(&placed).expect("placed file"),
            format!("original {}", name)
        );
        assert!(src.join(name).is_file(), "{} should stay in the source", name);
    }

    assert_eq!(logs(&events).len(), 4);
    assert_eq!(progress(&events).last(), Some(&100));
    assert_eq!(completions(&events), 1);
    assert_eq!(events.last(), Some(&EngineEvent::Completed));
}

#[test]
fn rerun_renames_instead_of_overwriting() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_scenario_sources(&src);

    let organizer = Organizer::new();
    run_to_end(&organizer, &[src.clone()], &dst, Options::new(Mode::Copy));

    // Change the sources so overwrites would be detectable
    for (name, _) in SCENARIO_FILES {
        fs::write(src.join(name), format!("second {}", name)).expect("rewrite source");
    }
    let events = run_to_end(&organizer, &[src.clone()], &dst, Options::new(Mode::Copy));
    assert_eq!(completions(&events), 1);

    for (name, category) in SCENARIO_FILES {
        let folder = dst.join(category);
        assert_eq!(
            fs::read_to_string(folder.join(name)).expect("first-run file"),
            format!("original {}", name),
            "first run's {} must be untouched",
            name
        );

        let (stem, ext) = name.split_once('.').expect("scenario names have extensions");
        let renamed: Vec<String> = fs::read_dir(&folder)
            .expect("read category folder")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .filter(|n| n != name)
            .collect();
        assert_eq!(renamed.len(), 1, "expected one renamed copy in {:?}", folder);

        let token = renamed[0]
            .strip_prefix(&format!("{}_", stem))
            .and_then(|rest| rest.strip_suffix(&format!(".{}", ext)))
            .expect("renamed file keeps stem and extension");
        assert_eq!(token.len(), 8);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            fs::read_to_string(folder.join(&renamed[0])).expect("renamed file"),
            format!("second {}", name)
        );
    }
}

#[test]
fn injected_token_source_controls_renames() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(&src).expect("mkdir src");
    fs::write(src.join("clip.mp4"), b"new").expect("write");
    fs::create_dir_all(dst.join("Videos")).expect("mkdir videos");
    fs::write(dst.join("Videos/clip.mp4"), b"old").expect("write existing");

    let organizer = Organizer::with_token_source(CountingTokens(AtomicUsize::new(0)));
    let events = run_to_end(&organizer, &[src], &dst, Options::new(Mode::Move));

    assert_eq!(fs::read(dst.join("Videos/clip.mp4")).expect("old"), b"old");
    assert_eq!(fs::read(dst.join("Videos/clip_000000a0.mp4")).expect("new"), b"new");
    assert!(logs(&events)[0].starts_with("Moved: "));
}

#[test]
fn empty_source_reports_once_and_completes() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    fs::create_dir_all(src.join("only").join("dirs")).expect("mkdir");

    let events = run_to_end(
        &Organizer::new(),
        &[src],
        &temp_dir.path().join("dst"),
        Options::default(),
    );

    assert_eq!(
        events,
        vec![
            EngineEvent::Log(NO_FILES_MESSAGE.to_string()),
            EngineEvent::Completed
        ]
    );
}

#[test]
fn progress_is_monotonic_and_ends_at_100() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    fs::create_dir_all(src.join("nested")).expect("mkdir");
    for i in 0..7 {
        fs::write(src.join(format!("file{}.txt", i)), b"x").expect("write");
        fs::write(src.join("nested").join(format!("pic{}.png", i)), b"y").expect("write");
    }

    let events = run_to_end(
        &Organizer::new(),
        &[src],
        &temp_dir.path().join("dst"),
        Options::default(),
    );

    let seen = progress(&events);
    assert_eq!(seen.len(), 14);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", seen);
    assert!(seen.iter().all(|p| *p <= 100));
    assert_eq!(seen.last(), Some(&100));
}

#[test]
fn move_with_failed_destination_keeps_source_bytes() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    fs::create_dir_all(&src).expect("mkdir src");
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    fs::write(src.join("clip.mp4"), &payload).expect("write");

    // Occupy the category folder's path with a plain file so nothing can be written there
    fs::create_dir_all(&dst).expect("mkdir dst");
    fs::write(dst.join("Videos"), b"in the way").expect("write blocker");

    let events = run_to_end(&Organizer::new(), &[src.clone()], &dst, Options::new(Mode::Move));

    assert_eq!(fs::read(src.join("clip.mp4")).expect("source kept"), payload);
    let lines = logs(&events);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Error processing"), "got {:?}", lines);
    assert_eq!(progress(&events), vec![100]);
    assert_eq!(completions(&events), 1);
}

#[test]
fn move_with_verification_relocates_files() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_scenario_sources(&src);

    let options = Options::new(Mode::Move).with_verify(sorter_engine::ChecksumAlgorithm::Blake3);
    let events = run_to_end(&Organizer::new(), &[src.clone()], &dst, options);

    for (name, category) in SCENARIO_FILES {
        assert!(!src.join(name).exists());
        assert!(dst.join(category).join(name).is_file());
    }
    assert!(logs(&events).iter().all(|l| l.starts_with("Moved: ")));
}

/// Blocks the worker inside its first log call until released.
struct GateSink {
    entered: Sender<()>,
    release: Receiver<()>,
    forward: events::ChannelSink,
    gated: bool,
}

impl EventSink for GateSink {
    fn on_progress(&mut self, percent: u8) {
        self.forward.on_progress(percent);
    }

    fn on_log(&mut self, message: String) {
        if !self.gated {
            self.gated = true;
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
        self.forward.on_log(message);
    }

    fn on_completed(&mut self) {
        self.forward.on_completed();
    }
}

#[test]
fn second_start_while_processing_is_rejected() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_scenario_sources(&src);

    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let (forward, rx) = events::channel();
    let sink = GateSink {
        entered: entered_tx,
        release: release_rx,
        forward,
        gated: false,
    };

    let organizer = Organizer::new();
    let handle = organizer
        .start(&[src.clone()], &dst, Options::default(), sink)
        .expect("first start");
    entered_rx.recv().expect("worker reached first file");
    assert_eq!(organizer.state(), RunState::Processing);
    assert!(organizer.is_running());

    let (other_sink, other_rx) = events::channel();
    let second = organizer.start(&[src.clone()], &dst, Options::default(), other_sink);
    assert!(matches!(second, Err(StartError::AlreadyRunning)));
    // A rejected start never reports through its sink
    assert!(other_rx.try_recv().is_err());

    release_tx.send(()).expect("release worker");
    let summary = handle.join().expect("worker panicked");
    assert_eq!(summary.processed, 4);
    assert_eq!(organizer.state(), RunState::Completed);

    let events: Vec<_> = rx.iter().collect();
    assert_eq!(logs(&events).len(), 4);
    assert_eq!(progress(&events), vec![25, 50, 75, 100]);
    assert_eq!(completions(&events), 1);
}

/// Starts the follow-up run from inside `on_completed`, the earliest point a
/// caller learns the engine is free again.
struct RestartOnCompletion {
    organizer: Organizer,
    sources: Vec<PathBuf>,
    dst: PathBuf,
    next_sink: Option<GateSink>,
    started: Sender<Result<RunHandle, StartError>>,
}

impl EventSink for RestartOnCompletion {
    fn on_progress(&mut self, _percent: u8) {}

    fn on_log(&mut self, _message: String) {}

    fn on_completed(&mut self) {
        if let Some(sink) = self.next_sink.take() {
            let result = self
                .organizer
                .start(&self.sources, &self.dst, Options::default(), sink);
            let _ = self.started.send(result);
        }
    }
}

#[test]
fn run_started_from_completion_keeps_the_engine_claimed() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    write_scenario_sources(&src);

    // The missing root makes the follow-up run log (and block) while still discovering
    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let (forward, follow_up_events) = events::channel();
    let gate = GateSink {
        entered: entered_tx,
        release: release_rx,
        forward,
        gated: false,
    };

    let organizer = Organizer::new();
    let (started_tx, started_rx) = bounded(1);
    let first = organizer
        .start(
            &[src.clone()],
            &dst,
            Options::default(),
            RestartOnCompletion {
                organizer: organizer.clone(),
                sources: vec![temp_dir.path().join("missing"), src.clone()],
                dst: dst.clone(),
                next_sink: Some(gate),
                started: started_tx,
            },
        )
        .expect("first start");

    let follow_up = started_rx
        .recv()
        .expect("completion handler ran")
        .expect("engine accepts a new run once the previous one completed");
    entered_rx.recv().expect("follow-up run is parked in discovery");

    // Let the first worker finish tearing down while the follow-up is still active
    first.join().expect("first worker panicked");
    assert_eq!(organizer.state(), RunState::Discovering);

    let (third_sink, _third_rx) = events::channel();
    let third = organizer.start(&[src.clone()], &dst, Options::default(), third_sink);
    assert!(matches!(third, Err(StartError::AlreadyRunning)));

    release_tx.send(()).expect("release follow-up");
    let summary = follow_up.join().expect("follow-up worker panicked");
    assert_eq!(summary.transferred, 4);
    assert_eq!(organizer.state(), RunState::Completed);

    let events: Vec<_> = follow_up_events.iter().collect();
    assert!(logs(&events)[0].starts_with("Skipped: "));
    assert_eq!(completions(&events), 1);
}
