//! Writes metric records to TFRecord files readable by TensorBoard.
use log::debug;
use std::path::Path;
use stride_core::record::{Record, RecordValue, Recorder, STEP_KEY};
use tensorboard_rs::summary_writer::SummaryWriter;

/// Write records to TFRecord.
pub struct TensorboardRecorder {
    writer: SummaryWriter,
    step_key: String,
}

impl TensorboardRecorder {
    /// Construct a [`TensorboardRecorder`].
    ///
    /// TFRecord will be stored in `logdir`.
    pub fn new<P: AsRef<Path>>(logdir: P) -> Self {
        Self {
            writer: SummaryWriter::new(logdir),
            step_key: STEP_KEY.to_string(),
        }
    }
}

impl Recorder for TensorboardRecorder {
    /// Write a given [Record] into a TFRecord.
    ///
    /// Only [RecordValue::Scalar] values are written, at the step stored
    /// under the step key. Records without a step, like hyperparameters,
    /// are skipped.
    fn write(&mut self, record: Record) {
        let step = match record.get_scalar(&self.step_key) {
            Ok(v) => v as usize,
            Err(_) => {
                debug!("Skip a record without {:?}", self.step_key);
                return;
            }
        };

        for (k, v) in record.iter() {
            if *k == self.step_key {
                continue;
            }
            if let RecordValue::Scalar(v) = v {
                self.writer.add_scalar(k, *v, step);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use stride_core::record::{MetricKind, Metrics};
    use tempdir::TempDir;

    #[test]
    fn test_write_metrics() -> Result<()> {
        let dir = TempDir::new("tensorboard_recorder")?;
        let logdir = dir.path().join("run");
        {
            let mut metrics = Metrics::new(Box::new(TensorboardRecorder::new(&logdir)));
            metrics.register("reward", MetricKind::Queue);
            metrics.log_parameters(&vec![1, 2, 3])?;
            metrics.add("reward", 1.0)?;
            metrics.log_metric("reward", 10)?;
            metrics.log_metric("reward", 20)?;
        }
        assert!(std::fs::read_dir(&logdir)?.next().is_some());
        Ok(())
    }
}
