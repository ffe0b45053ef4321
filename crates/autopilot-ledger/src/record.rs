use autopilot_core::{LogEntry, MetricEntry, ReflectionEntry, SnapshotEntry};
use std::fmt;

/// One record stream per entity kind. Streams never share storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Logs,
    Metrics,
    Reflections,
    Snapshots,
}

impl Stream {
    pub const ALL: [Stream; 4] = [
        Stream::Logs,
        Stream::Metrics,
        Stream::Reflections,
        Stream::Snapshots,
    ];

    /// File stem and table name.
    pub fn name(&self) -> &'static str {
        match self {
            Stream::Logs => "logs",
            Stream::Metrics => "metrics",
            Stream::Reflections => "reflections",
            Stream::Snapshots => "snapshots",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A persisted, immutable entry. The stream is implied by the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Log(LogEntry),
    Metric(MetricEntry),
    Reflection(ReflectionEntry),
    Snapshot(SnapshotEntry),
}

impl Record {
    pub fn stream(&self) -> Stream {
        match self {
            Record::Log(_) => Stream::Logs,
            Record::Metric(_) => Stream::Metrics,
            Record::Reflection(_) => Stream::Reflections,
            Record::Snapshot(_) => Stream::Snapshots,
        }
    }

    pub fn agent(&self) -> &str {
        match self {
            Record::Log(e) => &e.agent,
            Record::Metric(e) => &e.agent,
            Record::Reflection(e) => &e.agent,
            Record::Snapshot(e) => &e.agent,
        }
    }

    /// Flat JSON object for the record, without the stream tag.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Record::Log(e) => serde_json::to_string(e),
            Record::Metric(e) => serde_json::to_string(e),
            Record::Reflection(e) => serde_json::to_string(e),
            Record::Snapshot(e) => serde_json::to_string(e),
        }
    }

    pub fn from_json(stream: Stream, line: &str) -> serde_json::Result<Self> {
        Ok(match stream {
            Stream::Logs => Record::Log(serde_json::from_str(line)?),
            Stream::Metrics => Record::Metric(serde_json::from_str(line)?),
            Stream::Reflections => Record::Reflection(serde_json::from_str(line)?),
            Stream::Snapshots => Record::Snapshot(serde_json::from_str(line)?),
        })
    }
}

/// Keep the last `limit` items, preserving order.
pub(crate) fn keep_tail<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    if items.len() > limit {
        items.drain(..items.len() - limit);
    }
    items
}
