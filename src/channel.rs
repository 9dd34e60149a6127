use std::fmt;

use tokio::sync::mpsc;

/// Per-article verdict. Exactly one is produced for every submitted title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Ok,
    Error,
    Missing,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Ok => "ok",
            Classification::Error => "error",
            Classification::Missing => "missing",
        };
        write!(f, "{}", name)
    }
}

/// Events flowing from the worker to whatever renders them. The worker knows
/// nothing about the presentation side.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Log(String),
    Progress { fraction: f64, message: String },
    Result { classification: Classification, text: String },
    Done(RunSummary),
}

/// Running totals of one check run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    pub missing: usize,
    /// Stop was requested and observed at an article boundary.
    pub cancelled: bool,
    /// A systemic failure ended the run before all articles were checked.
    pub aborted: bool,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Ok => self.ok += 1,
            Classification::Error => self.errors += 1,
            Classification::Missing => self.missing += 1,
        }
    }

    pub fn processed(&self) -> usize {
        self.ok + self.errors + self.missing
    }
}

pub type EventReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

/// Producer half of the event stream. FIFO and unbounded; the worker never
/// blocks on a slow consumer.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

impl EventSender {
    pub fn log(&self, message: impl Into<String>) {
        self.send(ChannelEvent::Log(message.into()));
    }

    pub fn progress(&self, fraction: f64, message: impl Into<String>) {
        self.send(ChannelEvent::Progress {
            fraction,
            message: message.into(),
        });
    }

    pub fn result(&self, classification: Classification, text: impl Into<String>) {
        self.send(ChannelEvent::Result {
            classification,
            text: text.into(),
        });
    }

    pub fn done(&self, summary: RunSummary) {
        self.send(ChannelEvent::Done(summary));
    }

    fn send(&self, event: ChannelEvent) {
        // A dropped receiver means nobody is rendering anymore; the worker
        // still runs to completion
        let _ = self.tx.send(event);
    }
}
