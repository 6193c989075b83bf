use chrono::{DateTime, Local};
use std::fmt::{self, Display, Formatter};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: DateTime<Local>,
    pub level: Level,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            message: message.into(),
        }
    }
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            Level::Info => "",
            Level::Success => "[SUCCESS] ",
            Level::Error => "[ERROR] ",
        };
        write!(
            f,
            "[{}]{marker}{}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Outcome of a run that got past authentication and destination resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub posted: Vec<String>,
    pub failed: Vec<String>,
    pub unresolved: Vec<String>,
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posted, {} failed, {} not found",
            self.posted.len(),
            self.failed.len(),
            self.unresolved.len()
        )
    }
}

/// Messages from the worker to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Log(LogEntry),
    Finished(Result<RunSummary, String>),
}

/// Sends log entries to the UI and mirrors them to the `log` facade.
#[derive(Debug, Clone)]
pub struct Reporter {
    tx: UnboundedSender<RunEvent>,
}

impl Reporter {
    pub fn new(tx: UnboundedSender<RunEvent>) -> Self {
        Self { tx }
    }
    pub fn info(&self, message: impl Into<String>) {
        self.send(Level::Info, message.into());
    }
    pub fn success(&self, message: impl Into<String>) {
        self.send(Level::Success, message.into());
    }
    pub fn error(&self, message: impl Display) {
        self.send(Level::Error, message.to_string());
    }
    pub fn finish(&self, result: Result<RunSummary, String>) {
        if self.tx.send(RunEvent::Finished(result)).is_err() {
            log::warn!("run finished after the receiver was dropped");
        }
    }
    fn send(&self, level: Level, message: String) {
        match level {
            Level::Error => log::error!("{message}"),
            _ => log::info!("{message}"),
        }
        if let Err(e) = self.tx.send(RunEvent::Log(LogEntry::new(level, message))) {
            log::warn!("failed to send log entry: {e}");
        }
    }
}
