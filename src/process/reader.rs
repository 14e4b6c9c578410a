// src/process/reader.rs

use std::io::{self, BufRead};
use tracing::debug;

/// Line that closes a COPY data section.
pub const END_OF_DATA: &str = "\\.";

/// Pulls one record line at a time out of a COPY text stream.
///
/// The stream ends early at `\.`. Line endings are removed; nothing else
/// about the line is touched, so an empty line is an empty record.
pub struct DumpReader<R> {
    reader: R,
    buf: String,
    line_no: u64,
    finished: bool,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            finished: false,
        }
    }

    /// 1-based number of the line most recently returned.
    pub fn line_no(&self) -> u64 {
        self.line_no
    }

    /// Next record line, or `None` at EOF / end-of-data marker.
    pub fn next_line(&mut self) -> io::Result<Option<&str>> {
        if self.finished {
            return Ok(None);
        }
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            self.finished = true;
            return Ok(None);
        }
        self.line_no += 1;

        let line = self.buf.trim_end_matches(&['\n', '\r'][..]);
        if line == END_OF_DATA {
            debug!(line_no = self.line_no, "end-of-data marker");
            self.finished = true;
            return Ok(None);
        }
        Ok(Some(line))
    }
}
