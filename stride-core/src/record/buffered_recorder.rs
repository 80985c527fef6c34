use super::{Record, Recorder};
use std::{cell::RefCell, rc::Rc};

/// Buffered recorder.
///
/// Keeps every written record in memory. Cloning the recorder yields a second
/// handle on the same buffer, so one handle can be moved into
/// [`Metrics`](super::Metrics) while the other is kept for inspection.
#[derive(Clone, Default)]
pub struct BufferedRecorder {
    buf: Rc<RefCell<Vec<Record>>>,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the records written so far.
    pub fn records(&self) -> Vec<Record> {
        self.buf.borrow().clone()
    }

    /// Returns the number of records written so far.
    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.borrow().is_empty()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.borrow_mut().push(record);
    }
}
