/// How loudly an event should surface once forwarded to a logger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
}

/// Structured trace entry recorded by the dashboard core.
///
/// The core never logs directly; whoever owns the bus drains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// 0-based, monotonically increasing per bus.
    pub seq: u64,
    pub severity: Severity,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, severity: Severity, kind: &'static str, message: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.events.push(Event {
            seq,
            severity,
            kind,
            message: message.into(),
        });
    }

    pub fn debug(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(Severity::Debug, kind, message);
    }

    pub fn info(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(Severity::Info, kind, message);
    }

    pub fn warn(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(Severity::Warn, kind, message);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
