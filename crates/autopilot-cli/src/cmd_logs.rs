use crate::workspace::Workspace;
use autopilot_ledger::{LogStore, Record, Stream};
use std::path::Path;

fn parse_stream(name: &str) -> anyhow::Result<Stream> {
    Stream::ALL
        .into_iter()
        .find(|s| s.name() == name)
        .ok_or_else(|| {
            let names: Vec<&str> = Stream::ALL.iter().map(|s| s.name()).collect();
            anyhow::anyhow!("unknown stream {name:?}, expected one of: {}", names.join(", "))
        })
}

pub fn execute(cwd: &Path, agent: &str, stream: &str, limit: usize, json: bool) -> anyhow::Result<()> {
    let stream = parse_stream(stream)?;
    let ws = Workspace::open(cwd)?;
    let store = ws.store()?;
    let records = store.recent(stream, agent, limit)?;

    if records.is_empty() {
        if !json {
            println!("No {stream} for agent {agent}.");
        }
        return Ok(());
    }
    for record in &records {
        if json {
            println!("{}", record.to_json()?);
        } else {
            println!("{}", format_record(record));
        }
    }
    Ok(())
}

fn format_record(record: &Record) -> String {
    match record {
        Record::Log(e) => {
            let first = e.output.lines().next().unwrap_or("");
            format!("{}  [{}] {}  {}", e.timestamp, e.status, e.action, first)
        }
        Record::Metric(m) => format!("{}  {} = {}", m.timestamp, m.metric_name, m.value),
        Record::Reflection(r) => format!("{}\n{}\n", r.timestamp, r.insight),
        Record::Snapshot(s) => format!("{}  {}", s.snapshot.timestamp, s.snapshot.summary()),
    }
}
