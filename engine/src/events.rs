//! Event reporting.
//!
//! The engine reports everything a caller can observe through [`EventSink`]:
//! progress percentages, human-readable log lines and a single completion
//! notice. A CLI, a test harness or a GUI can all implement it. Calls arrive
//! on the worker thread, in processing order, so an implementation that needs
//! to render elsewhere should forward them, which is what [`ChannelSink`] does.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Receiver of engine events for one run.
pub trait EventSink: Send + 'static {
    /// Percentage of discovered files processed so far, `0..=100`.
    fn on_progress(&mut self, percent: u8);

    /// One action or one failure, in processing order.
    fn on_log(&mut self, message: String);

    /// Called exactly once, after the last file.
    fn on_completed(&mut self);
}

/// Owned form of a sink call, for delivery across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(u8),
    Log(String),
    Completed,
}

/// An [`EventSink`] that forwards every call over a channel.
///
/// A disconnected receiver is ignored: the run still finishes.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<EngineEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<EngineEvent>) -> Self {
        ChannelSink { sender }
    }
}

impl EventSink for ChannelSink {
    fn on_progress(&mut self, percent: u8) {
        let _ = self.sender.send(EngineEvent::Progress(percent));
    }

    fn on_log(&mut self, message: String) {
        let _ = self.sender.send(EngineEvent::Log(message));
    }

    fn on_completed(&mut self) {
        let _ = self.sender.send(EngineEvent::Completed);
    }
}

/// Create a connected [`ChannelSink`] and the receiver that drains it.
pub fn channel() -> (ChannelSink, Receiver<EngineEvent>) {
    let (tx, rx) = unbounded();
    (ChannelSink::new(tx), rx)
}
