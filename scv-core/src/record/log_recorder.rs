use super::{Record, RecordStorage, RecordValue, Recorder};
use log::info;

/// Aggregates stored records and writes them to the log.
#[derive(Default)]
pub struct LogRecorder {
    storage: RecordStorage,
}

impl LogRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn format(record: &Record) -> String {
        record
            .iter()
            .map(|(k, v)| match v {
                RecordValue::Scalar(v) => format!("{}={:.4}", k, v),
                RecordValue::DateTime(v) => format!("{}={}", k, v.format("%Y-%m-%d %H:%M:%S")),
                RecordValue::String(v) => format!("{}={}", k, v),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        if !record.is_empty() {
            info!("{}", Self::format(&record));
        }
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let record = self.storage.aggregate();
        info!("epoch {}: {}", step, Self::format(&record));
    }
}
