//! Reporting surface for collected results
//!
//! A reporter is called on the collector's thread, once per result, in the order
//! the collector releases them.

use std::io::{self, Write};

use super::ResultPair;
use crate::cli::Output;
use crate::error::UnitFailure;

pub trait Reporter {
    /// Surface one result
    fn report(&mut self, pair: &ResultPair) -> io::Result<()>;

    /// Surface a unit that was skipped
    fn failure(&mut self, failure: &UnitFailure);

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One `<unit>, <score>` line per result
pub struct TextReporter<W: Write> {
    writer: W,
    output: Output,
}

impl<W: Write> TextReporter<W> {
    pub fn new(writer: W, output: Output) -> Self {
        Self { writer, output }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, pair: &ResultPair) -> io::Result<()> {
        writeln!(self.writer, "{}, {}", pair.unit, pair.score)
    }

    fn failure(&mut self, failure: &UnitFailure) {
        self.output.warning(&failure.to_string());
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// One JSON object per line
pub struct JsonReporter<W: Write> {
    writer: W,
    output: Output,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W, output: Output) -> Self {
        Self { writer, output }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, pair: &ResultPair) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, pair)?;
        self.writer.write_all(b"\n")
    }

    fn failure(&mut self, failure: &UnitFailure) {
        self.output.warning(&failure.to_string());
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps everything in memory, for library callers and tests
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub pairs: Vec<ResultPair>,
    pub failures: Vec<UnitFailure>,
}

impl Reporter for CollectingReporter {
    fn report(&mut self, pair: &ResultPair) -> io::Result<()> {
        self.pairs.push(pair.clone());
        Ok(())
    }

    fn failure(&mut self, failure: &UnitFailure) {
        self.failures.push(failure.clone());
    }
}
