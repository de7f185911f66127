//! Events emitted by committed game mutations, and the sinks that receive them

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// Name tag of an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Claim,
    Reinforce,
    Move,
    Conquer,
    Defeat,
    Victory,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Claim => "claim",
            EventKind::Reinforce => "reinforce",
            EventKind::Move => "move",
            EventKind::Conquer => "conquer",
            EventKind::Defeat => "defeat",
            EventKind::Victory => "victory",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single event argument
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Text(String),
    Int(u32),
    /// Before/after or attacker/defender force snapshot
    Pair(u32, u32),
}

impl From<&str> for EventValue {
    fn from(value: &str) -> Self {
        EventValue::Text(value.to_string())
    }
}

impl From<String> for EventValue {
    fn from(value: String) -> Self {
        EventValue::Text(value)
    }
}

impl From<u32> for EventValue {
    fn from(value: u32) -> Self {
        EventValue::Int(value)
    }
}

impl From<(u32, u32)> for EventValue {
    fn from((a, b): (u32, u32)) -> Self {
        EventValue::Pair(a, b)
    }
}

impl fmt::Display for EventValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventValue::Text(s) => f.write_str(s),
            EventValue::Int(n) => write!(f, "{}", n),
            EventValue::Pair(a, b) => write!(f, "({}, {})", a, b),
        }
    }
}

/// Immutable record of one committed mutation
///
/// Argument layouts:
/// - `claim`, `reinforce`: player, territory, forces
/// - `move`: player, source, destination, forces
/// - `conquer`, `defeat`: attacker, defender (empty when unowned), source,
///   destination, (attacker, defender) before, (source, destination) after
/// - `victory`: player
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub kind: EventKind,
    pub args: Vec<EventValue>,
}

impl Event {
    pub fn new(kind: EventKind, args: Vec<EventValue>) -> Self {
        Self { kind, args }
    }

    /// Text argument at `index`, if that argument is text
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.args.get(index) {
            Some(EventValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer argument at `index`, if that argument is an integer
    pub fn int(&self, index: usize) -> Option<u32> {
        match self.args.get(index) {
            Some(EventValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Pair argument at `index`, if that argument is a pair
    pub fn pair(&self, index: usize) -> Option<(u32, u32)> {
        match self.args.get(index) {
            Some(EventValue::Pair(a, b)) => Some((*a, *b)),
            _ => None,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// SINKS
// ============================================================================

/// Receiver of every committed event, in commit order
pub trait EventSink {
    fn record(&mut self, event: &Event) -> Result<(), SinkError>;
}

impl<F: FnMut(&Event)> EventSink for F {
    fn record(&mut self, event: &Event) -> Result<(), SinkError> {
        self(event);
        Ok(())
    }
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &Event) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-memory event collector
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events of one kind
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

impl EventSink for EventLog {
    fn record(&mut self, event: &Event) -> Result<(), SinkError> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Writes one JSON object per line
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn record(&mut self, event: &Event) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
