//! JSON-lines output. Records are written by a single writer; `OrderedSink`
//! holds back early completions until every earlier position is settled.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use paperprep_core::error::Result;
use paperprep_core::types::OutputRecord;

pub struct JsonlSink<W: Write> {
    writer: W,
    written: usize,
}

impl JsonlSink<BufWriter<File>> {
    /// Creates (or truncates) `path`, creating parent directories as needed.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn write(&mut self, record: &OutputRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Accepts results in completion order and writes them in input order.
/// `None` marks a position that produced no record (a skipped document).
pub struct OrderedSink<W: Write> {
    sink: JsonlSink<W>,
    next: usize,
    pending: BTreeMap<usize, Option<OutputRecord>>,
}

impl<W: Write> OrderedSink<W> {
    pub fn new(sink: JsonlSink<W>) -> Self {
        Self { sink, next: 0, pending: BTreeMap::new() }
    }

    pub fn push(&mut self, index: usize, record: Option<OutputRecord>) -> Result<()> {
        self.pending.insert(index, record);
        while let Some(entry) = self.pending.remove(&self.next) {
            if let Some(record) = entry {
                self.sink.write(&record)?;
            }
            self.next += 1;
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn written(&self) -> usize {
        self.sink.written()
    }

    /// Flushes the writer. Records still waiting on an earlier position are dropped.
    pub fn finish(self) -> Result<W> {
        if !self.pending.is_empty() {
            debug!(dropped = self.pending.len(), next = self.next, "ordered sink closed with gaps");
        }
        self.sink.finish()
    }
}

/// Writes `records` to `path` as JSON lines, returning how many were written.
pub fn write_records(path: &Path, records: &[OutputRecord]) -> Result<usize> {
    let mut sink = JsonlSink::create(path)?;
    for record in records {
        sink.write(record)?;
    }
    let written = sink.written();
    sink.finish()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperprep_core::types::{Chunk, MetadataRecord};

    fn record(title: &str) -> OutputRecord {
        let metadata = MetadataRecord { title: title.to_string(), ..Default::default() };
        OutputRecord::new(metadata, vec![Chunk { text: format!("{title} body"), index: 0 }])
    }

    fn titles(bytes: &[u8]) -> Vec<String> {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str::<OutputRecord>(line).unwrap().metadata.title)
            .collect()
    }

    #[test]
    fn ordered_sink_waits_for_earlier_positions() {
        let mut sink = OrderedSink::new(JsonlSink::new(Vec::new()));
        sink.push(2, Some(record("c"))).unwrap();
        sink.push(1, None).unwrap();
        assert_eq!(sink.written(), 0);
        assert_eq!(sink.pending(), 2);

        sink.push(0, Some(record("a"))).unwrap();
        assert_eq!(sink.written(), 2);
        sink.push(3, Some(record("d"))).unwrap();

        let out = sink.finish().unwrap();
        assert_eq!(titles(&out), vec!["a", "c", "d"]);
    }

    #[test]
    fn write_records_creates_parent_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out/nested/records.jsonl");
        assert_eq!(write_records(&path, &[record("x"), record("y")]).unwrap(), 2);
        let contents = fs::read(&path).unwrap();
        assert_eq!(titles(&contents), vec!["x", "y"]);
        assert!(String::from_utf8(contents).unwrap().ends_with("]}\n"));
    }
}
