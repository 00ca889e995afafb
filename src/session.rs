use std::io::{ErrorKind, Read};

use log::{info, warn};

use crate::error::{Error, Result};
use crate::parameters::Parameters;
use crate::scanner::{ImageScanner, RowSink, ScanStats};

/// Outcome of a single non-blocking read from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    Good(Vec<u8>),
    Eof,
    Cancelled,
    Failed(String),
}

pub trait ScanSession {
    fn start(&mut self) -> Result<Parameters>;

    fn read(&mut self) -> ReadStatus;

    fn cancel(&mut self);
}

/// Drives one scan from `session` into `sink`.
pub fn run_scan<T, S>(session: &mut T, sink: &mut S) -> Result<ScanStats>
where
    T: ScanSession + ?Sized,
    S: RowSink + ?Sized,
{
    let parameters = session.start()?;

    let mut scanner = match ImageScanner::initialize(&parameters) {
        Ok(scanner) => scanner,
        Err(reason) => {
            sink.on_rejected(&reason);
            session.cancel();

            return Err(reason.into());
        }
    };

    info!(
        "scanning {} x {} ({}, {} bit)",
        parameters.pixels_per_line, parameters.lines, parameters.format, parameters.depth
    );

    let layout = *scanner.layout();
    sink.on_start(layout.pixels_per_line, layout.lines);

    let cancelled = loop {
        match session.read() {
            ReadStatus::Good(data) => {
                if !data.is_empty() {
                    scanner.consume_into(&data, sink);
                }
            }

            ReadStatus::Eof => {
                session.cancel();
                break false;
            }

            ReadStatus::Cancelled => break true,

            ReadStatus::Failed(status) => return Err(Error::Session(status)),
        }
    };

    let mut stats = scanner.finish();
    stats.cancelled = cancelled;

    if !cancelled && stats.lines < stats.expected_lines {
        warn!(
            "scan ended after {} of {} lines",
            stats.lines, stats.expected_lines
        );
    }

    info!("scan finished: {:?}", stats);

    Ok(stats)
}

/// Replays a raw byte dump as if it came from a device.
pub struct RawSession<R> {
    reader: R,
    parameters: Parameters,
    chunk_size: usize,
    cancelled: bool,
}

impl<R: Read> RawSession<R> {
    pub fn new(reader: R, parameters: Parameters, chunk_size: usize) -> Self {
        RawSession {
            reader,
            parameters,
            chunk_size: chunk_size.max(1),
            cancelled: false,
        }
    }
}

impl<R: Read> ScanSession for RawSession<R> {
    fn start(&mut self) -> Result<Parameters> {
        self.cancelled = false;

        Ok(self.parameters)
    }

    fn read(&mut self) -> ReadStatus {
        if self.cancelled {
            return ReadStatus::Cancelled;
        }

        let mut buffer = vec![0; self.chunk_size];

        loop {
            match self.reader.read(&mut buffer) {
                Ok(0) => return ReadStatus::Eof,
                Ok(n) => {
                    buffer.truncate(n);
                    return ReadStatus::Good(buffer);
                }
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => return ReadStatus::Failed(error.to_string()),
            }
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

#[cfg(test)]
use crate::error::UnsupportedEncoding;
#[cfg(test)]
use crate::parameters::FrameFormat;
#[cfg(test)]
use crate::scanner::RowBatch;
#[cfg(test)]
use std::collections::VecDeque;

#[cfg(test)]
fn gray_parameters(lines: i32) -> Parameters {
    Parameters {
        format: FrameFormat::Gray,
        last_frame: true,
        bytes_per_line: 3,
        pixels_per_line: 3,
        lines,
        depth: 8,
    }
}

#[cfg(test)]
struct ScriptedSession {
    parameters: Parameters,
    reads: VecDeque<ReadStatus>,
    cancels: usize,
}

#[cfg(test)]
impl ScanSession for ScriptedSession {
    fn start(&mut self) -> Result<Parameters> {
        Ok(self.parameters)
    }

    fn read(&mut self) -> ReadStatus {
        self.reads.pop_front().unwrap_or(ReadStatus::Eof)
    }

    fn cancel(&mut self) {
        self.cancels += 1;
    }
}

#[cfg(test)]
#[derive(Default)]
struct RecordingSink {
    started: Option<(usize, usize)>,
    batches: Vec<RowBatch>,
    rejected: Option<UnsupportedEncoding>,
}

#[cfg(test)]
impl RowSink for RecordingSink {
    fn on_start(&mut self, width: usize, height: usize) {
        self.started = Some((width, height));
    }

    fn on_row_batch(&mut self, batch: RowBatch) {
        self.batches.push(batch);
    }

    fn on_rejected(&mut self, reason: &UnsupportedEncoding) {
        self.rejected = Some(reason.clone());
    }
}

#[test]
fn raw_session_chunks_test() {
    let data: Vec<u8> = (0..10).collect();
    let mut session = RawSession::new(&data[..], gray_parameters(3), 4);

    assert_eq!(session.start().unwrap(), gray_parameters(3));
    assert_eq!(session.read(), ReadStatus::Good(vec![0, 1, 2, 3]));
    assert_eq!(session.read(), ReadStatus::Good(vec![4, 5, 6, 7]));
    assert_eq!(session.read(), ReadStatus::Good(vec![8, 9]));
    assert_eq!(session.read(), ReadStatus::Eof);

    session.cancel();
    assert_eq!(session.read(), ReadStatus::Cancelled);
}

#[test]
fn run_scan_raw_test() {
    let data: Vec<u8> = (1..=10).collect();
    let mut session = RawSession::new(&data[..], gray_parameters(3), 2);
    let mut sink = RecordingSink::default();

    let stats = run_scan(&mut session, &mut sink).unwrap();

    assert_eq!(
        stats,
        ScanStats {
            lines: 3,
            expected_lines: 3,
            leftover: 1,
            cancelled: false,
        }
    );
    assert_eq!(sink.started, Some((3, 3)));

    let gray: Vec<u8> = sink
        .batches
        .iter()
        .flat_map(|batch| batch.pixels.chunks(4).map(|pixel| pixel[0]))
        .collect();
    assert_eq!(gray, (1..=9).collect::<Vec<u8>>());
}

#[test]
fn run_scan_rejected_test() {
    let mut parameters = gray_parameters(3);
    parameters.depth = 16;

    let mut session = ScriptedSession {
        parameters,
        reads: VecDeque::new(),
        cancels: 0,
    };
    let mut sink = RecordingSink::default();

    match run_scan(&mut session, &mut sink) {
        Err(Error::Unsupported(UnsupportedEncoding::Depth(16))) => {}
        other => panic!("unexpected result {:?}", other),
    }

    assert_eq!(sink.rejected, Some(UnsupportedEncoding::Depth(16)));
    assert_eq!(sink.started, None);
    assert_eq!(session.cancels, 1);
}

#[test]
fn run_scan_skips_empty_reads_test() {
    let mut session = ScriptedSession {
        parameters: gray_parameters(2),
        reads: vec![
            ReadStatus::Good(vec![]),
            ReadStatus::Good(vec![1, 2]),
            ReadStatus::Good(vec![]),
            ReadStatus::Good(vec![3, 4, 5, 6]),
            ReadStatus::Eof,
        ]
        .into(),
        cancels: 0,
    };
    let mut sink = RecordingSink::default();

    let stats = run_scan(&mut session, &mut sink).unwrap();

    assert_eq!(stats.lines, 2);
    assert_eq!(sink.batches.len(), 1);
    assert_eq!(sink.batches[0].height, 2);
    assert_eq!(session.cancels, 1);
}

#[test]
fn run_scan_cancelled_test() {
    let mut session = ScriptedSession {
        parameters: gray_parameters(4),
        reads: vec![ReadStatus::Good(vec![1, 2, 3, 4]), ReadStatus::Cancelled].into(),
        cancels: 0,
    };
    let mut sink = RecordingSink::default();

    let stats = run_scan(&mut session, &mut sink).unwrap();

    assert!(stats.cancelled);
    assert_eq!(stats.lines, 1);
    assert_eq!(stats.leftover, 1);
    assert_eq!(session.cancels, 0);
}

#[test]
fn run_scan_failed_test() {
    let mut session = ScriptedSession {
        parameters: gray_parameters(4),
        reads: vec![
            ReadStatus::Good(vec![1, 2, 3]),
            ReadStatus::Failed("io error".to_string()),
        ]
        .into(),
        cancels: 0,
    };
    let mut sink = RecordingSink::default();

    match run_scan(&mut session, &mut sink) {
        Err(Error::Session(status)) => assert_eq!(status, "io error"),
        other => panic!("unexpected result {:?}", other),
    }

    assert_eq!(sink.batches.len(), 1);
}
