use chrono::{DateTime, Local};
use crossbeam_channel::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Log { level: EventLevel, message: String },
    /// Batch progress in percent, `0.0..=100.0`.
    Progress(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn log(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            kind: EventKind::Log {
                level,
                message: message.into(),
            },
        }
    }

    #[must_use]
    pub fn progress(percent: f64) -> Self {
        Self {
            timestamp: Local::now(),
            kind: EventKind::Progress(percent.clamp(0.0, 100.0)),
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Log { message, .. } => Some(message),
            EventKind::Progress(_) => None,
        }
    }

    #[must_use]
    pub fn level(&self) -> Option<EventLevel> {
        match &self.kind {
            EventKind::Log { level, .. } => Some(*level),
            EventKind::Progress(_) => None,
        }
    }
}

/// Upward channel for log lines and progress, decoupled from any front end.
pub trait EventSink {
    fn emit(&self, event: Event);

    fn log(&self, level: EventLevel, message: String) {
        tracing::debug!(?level, "{message}");
        self.emit(Event::log(level, message));
    }

    fn debug(&self, message: String) {
        self.log(EventLevel::Debug, message);
    }

    fn info(&self, message: String) {
        self.log(EventLevel::Info, message);
    }

    fn warn(&self, message: String) {
        self.log(EventLevel::Warn, message);
    }

    fn error(&self, message: String) {
        self.log(EventLevel::Error, message);
    }

    fn progress(&self, percent: f64) {
        self.emit(Event::progress(percent));
    }
}

impl EventSink for Sender<Event> {
    fn emit(&self, event: Event) {
        // A dropped receiver means nobody is watching any more; keep working.
        let _ = self.send(event);
    }
}
