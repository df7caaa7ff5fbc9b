use super::{AggregateRecorder, Record, RecordValue, Recorder};
use log::info;
use std::collections::BTreeMap;

/// Buffered recorder.
///
/// Written records are kept in memory. Stored records are aggregated at
/// [`AggregateRecorder::flush`]: scalars with the same key are averaged and
/// the last value is kept for other types. The aggregated record is stamped
/// with the local time under `"datetime"`, logged with [`log::info`] and
/// appended to the buffer.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: Vec<Record>,
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

    /// Number of records in the buffer.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn aggregate(&mut self) -> Record {
        let mut scalars: BTreeMap<String, Vec<f32>> = BTreeMap::new();
        let mut record = Record::empty();

        for r in self.storage.drain(..) {
            for (k, v) in r.into_iter_in_record() {
                match v {
                    RecordValue::Scalar(x) => scalars.entry(k).or_default().push(x),
                    v => record.insert(k, v),
                }
            }
        }

        for (k, vs) in scalars {
            let mean = vs.iter().sum::<f32>() / vs.len() as f32;
            record.insert(k, RecordValue::Scalar(mean));
        }

        record
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.push(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }

        let mut record = self.aggregate().with_datetime();
        let mut scalars = record
            .iter()
            .filter_map(|(k, v)| match v {
                RecordValue::Scalar(x) => Some(format!("{} = {:.4}", k, x)),
                _ => None,
            })
            .collect::<Vec<_>>();
        scalars.sort();
        info!("step = {}, {}", step, scalars.join(", "));

        record.insert("step", RecordValue::Scalar(step as f32));
        self.write(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_averages_scalars() {
        let mut recorder = BufferedRecorder::new();
        recorder.store(Record::from_scalar("loss", 1.0));
        recorder.store(Record::from_slice(&[
            ("loss", RecordValue::Scalar(3.0)),
            ("algo", RecordValue::String("reinforce".into())),
        ]));
        recorder.flush(10);
        recorder.flush(11);

        assert_eq!(recorder.len(), 1);
        let record = recorder.iter().next().unwrap();
        assert_eq!(record.get_scalar("loss").unwrap(), 2.0);
        assert_eq!(record.get_scalar("step").unwrap(), 10.0);
        assert_eq!(record.get_string("algo").unwrap(), "reinforce");
        assert!(matches!(
            record.get("datetime"),
            Some(RecordValue::DateTime(_))
        ));
    }
}
