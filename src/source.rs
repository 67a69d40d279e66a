// src/source.rs
use std::io::{self, BufRead};

/// A single raw line and its 1-based position in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub number: usize,
    pub text: String,
}

/// Iterator over the lines of a byte source.
///
/// Splits on `\n`, drops a trailing `\r`, and decodes each line lossily so
/// that stray non-UTF-8 bytes in a build log never abort an analysis. Only
/// genuine read failures are reported.
pub struct LogLines<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    done: bool,
}

impl<R: BufRead> LogLines<R> {
    pub fn new(reader: R) -> Self {
        LogLines {
            reader,
            buf: Vec::new(),
            line_number: 0,
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LogLines<R> {
    type Item = io::Result<LogLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        let read = loop {
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        };

        if read == 0 {
            self.done = true;
            return None;
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        self.line_number += 1;
        Some(Ok(LogLine {
            number: self.line_number,
            text: String::from_utf8_lossy(&self.buf).into_owned(),
        }))
    }
}
