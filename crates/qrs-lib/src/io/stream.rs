//! Boundary between the detector and whatever feeds and consumes it.

use crate::{
    detectors::{qrs::QrsDetector, rr::RrVerdict},
    error::SinkError,
    signal::{BeatEvent, Sample, StreamSummary},
};
use log::{debug, trace};
use std::io::Write;

/// Supplies one amplitude per tick; `None` ends the stream.
pub trait SampleSource {
    fn next_sample(&mut self) -> Option<Sample>;
}

impl<I: Iterator<Item = Sample>> SampleSource for I {
    fn next_sample(&mut self) -> Option<Sample> {
        self.next()
    }
}

/// Receives every emitted beat, fire-and-forget.
pub trait EventSink {
    fn emit(&mut self, event: &BeatEvent) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl EventSink for Vec<BeatEvent> {
    fn emit(&mut self, event: &BeatEvent) -> Result<(), SinkError> {
        self.push(*event);
        Ok(())
    }
}

/// Writes the bare phase discriminant, one byte per beat.
pub struct SymbolSink<W: Write> {
    writer: W,
}

impl<W: Write> SymbolSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for SymbolSink<W> {
    fn emit(&mut self, event: &BeatEvent) -> Result<(), SinkError> {
        self.writer.write_all(&[event.phase.symbol()])?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn emit(&mut self, event: &BeatEvent) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV with a header row.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|err| SinkError::Io(err.into_error()))
    }
}

impl<W: Write> EventSink for CsvSink<W> {
    fn emit(&mut self, event: &BeatEvent) -> Result<(), SinkError> {
        self.writer.serialize(event)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Drain `source` through `detector`, forwarding every event to `sink`.
pub fn run_stream<S, K>(
    detector: &mut QrsDetector,
    source: &mut S,
    sink: &mut K,
) -> Result<StreamSummary, SinkError>
where
    S: SampleSource + ?Sized,
    K: EventSink + ?Sized,
{
    let mut summary = StreamSummary::default();
    while let Some(sample) = source.next_sample() {
        summary.record_sample();
        if let Some(event) = detector.process(sample) {
            trace!(
                "beat at sample {}: {:?} (rr {} {:?})",
                event.sample_index,
                event.phase,
                event.rr_interval,
                event.rr_verdict
            );
            if event.rr_verdict == RrVerdict::Rejected {
                debug!(
                    "implausible rr interval {} at sample {}",
                    event.rr_interval, event.sample_index
                );
            }
            summary.record_event(&event);
            sink.emit(&event)?;
        }
    }
    sink.flush()?;
    debug!(
        "stream ended after {} samples, {} beats",
        summary.samples, summary.beats
    );
    Ok(summary)
}
