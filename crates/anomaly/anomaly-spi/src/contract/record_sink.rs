//! Output side of the detection pipeline.

use crate::error::Result;
use crate::model::AnomalyRecord;

/// Consumer of classification records.
///
/// Called synchronously, in arrival order, once per classified tick. A sink
/// failure is reported to the caller and never touches detector state.
pub trait RecordSink {
    /// Accept one record.
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()>;

    /// Flush any buffered output. The default does nothing.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()> {
        (**self).emit(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    fn emit(&mut self, record: &AnomalyRecord) -> Result<()> {
        (**self).emit(record)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
