use super::{Record, RecordStorage, Recorder};

/// Keeps every written and flushed record in memory.
///
/// Stored records are aggregated on [`Recorder::flush`] and the aggregate is
/// appended to the buffer, so tests can inspect exactly what a logging
/// recorder would have printed.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// Returns the number of buffered records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record has been written or flushed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, _step: i64) {
        if !self.storage.is_empty() {
            let record = self.storage.aggregate();
            self.buf.push(record);
        }
    }
}
