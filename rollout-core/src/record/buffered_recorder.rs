use super::{Record, Recorder};

/// Buffered recorder.
///
/// This is used for keeping the records of an evaluation run in memory,
/// for example to aggregate them with [`RecordStorage`](super::RecordStorage)
/// after the run.
#[derive(Debug, Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Takes the records out of the buffer.
    pub fn into_records(self) -> Vec<Record> {
        self.buf
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}
