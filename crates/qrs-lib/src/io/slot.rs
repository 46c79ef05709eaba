//! Single-slot handoff from an acquisition context to the detector loop.
//!
//! The producer posts one sample per sampling period; the consumer blocks
//! until the next one arrives. The slot holds at most one unconsumed sample.

use crate::{error::SlotError, signal::Sample};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

pub struct SampleProducer {
    tx: Sender<Sample>,
}

pub struct SampleSlot {
    rx: Receiver<Sample>,
}

pub fn sample_slot() -> (SampleProducer, SampleSlot) {
    let (tx, rx) = bounded(1);
    (SampleProducer { tx }, SampleSlot { rx })
}

impl SampleProducer {
    /// Wait for the slot to drain, then hand over `sample`.
    pub fn post(&self, sample: Sample) -> Result<(), SlotError> {
        self.tx.send(sample).map_err(|_| SlotError::Closed)
    }

    /// Hand over `sample` without waiting. Fails with `Overrun` when the
    /// consumer has not taken the previous one.
    pub fn try_post(&self, sample: Sample) -> Result<(), SlotError> {
        self.tx.try_send(sample).map_err(|err| match err {
            TrySendError::Full(_) => SlotError::Overrun,
            TrySendError::Disconnected(_) => SlotError::Closed,
        })
    }
}

impl SampleSlot {
    /// Block until a sample is available. `None` once the producer is gone
    /// and the slot is empty.
    pub fn recv(&self) -> Option<Sample> {
        self.rx.recv().ok()
    }

    pub fn is_pending(&self) -> bool {
        !self.rx.is_empty()
    }
}

impl Iterator for SampleSlot {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        self.recv()
    }
}
