//! Live copy of the scan log on the debug probe
//!
//! Bytes are collected into lines and each line is emitted as one defmt
//! message, so a probe session shows the records as they are written.
//! Lines longer than the buffer are emitted in pieces.

use core::convert::Infallible;

use defmt::*;
use embedded_io::{ErrorType, Write};
use heapless::Vec;

/// Bytes held before a partial line is emitted
const LINE_CAPACITY: usize = 256;

/// `embedded_io::Write` sink that forwards lines to defmt
#[derive(Default)]
pub struct DefmtMirror {
    line: Vec<u8, LINE_CAPACITY>,
}

impl DefmtMirror {
    /// Create an empty mirror
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self) {
        let text = trim_line_end(&self.line);
        if !text.is_empty() {
            info!("log: {=[u8]:a}", text);
        }
        self.line.clear();
    }
}

fn trim_line_end(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && matches!(bytes[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    &bytes[..end]
}

impl ErrorType for DefmtMirror {
    type Error = Infallible;
}

impl Write for DefmtMirror {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            if self.line.push(byte).is_err() {
                self.emit();
                // Empty after emit
                let _ = self.line.push(byte);
            }
            if byte == b'\n' {
                self.emit();
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.emit();
        Ok(())
    }
}
