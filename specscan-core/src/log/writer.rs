//! Scan log writer

use core::fmt::{Display, Write};

use heapless::String;
use specscan_hal::StorageError;

use super::RecordKind;
use crate::scan::{PathKind, ScanPoint};
use crate::spectrum::{SpectralFrame, WavelengthTable};

/// Version written to `h,0`
pub const FILE_VERSION: u32 = 1;

const LINE_END: &str = "\r\n";

/// Wall-clock capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Default for DateTime {
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

/// Attitude of the scanner head at a position, in degrees
///
/// Zero when the head has no attitude sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Orientation {
    pub head_deg: f32,
    pub pitch_deg: f32,
    pub roll_deg: f32,
}

/// Everything written before the first pixel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanHeader {
    /// Capture time
    pub captured_at: DateTime,
    /// Field size (x, y) in degrees
    pub extent_xy_deg: (f32, f32),
    /// Pitch (x, y) in degrees
    pub step_xy_deg: (f32, f32),
    /// Number of positions the scan will visit
    pub pixel_count: usize,
    /// Channels per frame
    pub channel_count: usize,
    /// Exposure per frame in seconds
    pub integration_s: f32,
    /// Visiting order
    pub path: PathKind,
}

/// Longest record line, CRLF included
pub const MAX_LINE_LEN: usize = 4096;

/// Formatted record lines
type LineBuffer = String<MAX_LINE_LEN>;

/// One record line under construction
struct Line<'b> {
    buf: &'b mut LineBuffer,
    first: bool,
}

impl<'b> Line<'b> {
    fn begin(buf: &'b mut LineBuffer, kind: RecordKind, sequence: u32) -> Result<Self, StorageError> {
        buf.clear();
        write!(buf, "{},{}|", kind.tag(), sequence).map_err(|_| StorageError::Write)?;
        Ok(Self { buf, first: true })
    }

    fn key(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.first {
            self.push(";")?;
        }
        self.first = false;
        write!(self.buf, "{}=", key).map_err(|_| StorageError::Write)
    }

    fn push(&mut self, text: &str) -> Result<(), StorageError> {
        self.buf.push_str(text).map_err(|_| StorageError::Write)
    }

    fn field(&mut self, key: &str, value: impl Display) -> Result<&mut Self, StorageError> {
        self.key(key)?;
        write!(self.buf, "{}", value).map_err(|_| StorageError::Write)?;
        Ok(self)
    }

    fn list<T: Display>(
        &mut self,
        key: &str,
        values: impl IntoIterator<Item = T>,
    ) -> Result<&mut Self, StorageError> {
        self.key(key)?;
        self.push("[")?;
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push(",")?;
            }
            write!(self.buf, "{}", value).map_err(|_| StorageError::Write)?;
        }
        self.push("]")?;
        Ok(self)
    }

    fn finish(&mut self) -> Result<(), StorageError> {
        self.push(LINE_END)
    }
}

/// Append-only writer for one scan
///
/// Each record is formatted in full before any byte reaches the sink.
/// If the sink fails partway through a line, the fragment is closed with
/// a line ending before the next record, so a retried record always
/// starts on a line of its own.
pub struct ScanLog<W> {
    out: W,
    line: LineBuffer,
    torn: bool,
    next_sequence: u32,
    pixels_written: u32,
}

impl<W: embedded_io::Write> ScanLog<W> {
    /// Start a log on an empty sink
    pub fn new(out: W) -> Self {
        Self {
            out,
            line: LineBuffer::new(),
            torn: false,
            next_sequence: 0,
            pixels_written: 0,
        }
    }

    /// Write `h,0`, `h,1` and `h,2`
    pub fn write_header(&mut self, header: &ScanHeader) -> Result<(), StorageError> {
        Line::begin(&mut self.line, RecordKind::Header, 0)?
            .field("file_version", FILE_VERSION)?
            .finish()?;
        self.emit()?;

        let t = header.captured_at;
        Line::begin(&mut self.line, RecordKind::Header, 1)?
            .list("date_yyyymmdd", [t.year, t.month as u16, t.day as u16])?
            .list("time_hhmmss", [t.hour, t.minute, t.second])?
            .finish()?;
        self.emit()?;

        Line::begin(&mut self.line, RecordKind::Header, 2)?
            .list("extent_xy_deg", [header.extent_xy_deg.0, header.extent_xy_deg.1])?
            .list("step_xy_deg", [header.step_xy_deg.0, header.step_xy_deg.1])?
            .field("n_pixels", header.pixel_count)?
            .field("n_spect", header.channel_count)?
            .field("t_int_s", header.integration_s)?
            .field("path", header.path.as_str())?
            .finish()?;
        self.emit()
    }

    /// Write `w,0`
    pub fn write_wavelengths(&mut self, table: &WavelengthTable) -> Result<(), StorageError> {
        Line::begin(&mut self.line, RecordKind::Wavelengths, 0)?
            .list("wavelength_nm", table.as_slice())?
            .finish()?;
        self.emit()
    }

    /// Write the next `p` record
    ///
    /// Returns the record's sequence number, which is the pixel index. The
    /// counter only advances when the whole line was written.
    pub fn write_pixel(
        &mut self,
        point: ScanPoint,
        orientation: Orientation,
        frame: &SpectralFrame,
    ) -> Result<u32, StorageError> {
        let sequence = self.next_sequence;
        Line::begin(&mut self.line, RecordKind::Pixel, sequence)?
            .list("xy", [point.x, point.y])?
            .field("head_deg", orientation.head_deg)?
            .field("pitch_deg", orientation.pitch_deg)?
            .field("roll_deg", orientation.roll_deg)?
            .list("spect_au", frame.samples())?
            .finish()?;
        self.emit()?;
        self.next_sequence += 1;
        self.pixels_written += 1;
        Ok(sequence)
    }

    /// Give up a sequence number without writing a record
    ///
    /// Keeps later sequence numbers equal to their pixel index; the gap
    /// marks the missing pixel.
    pub fn skip_pixel(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Send the formatted line, closing any fragment left by a failed write
    fn emit(&mut self) -> Result<(), StorageError> {
        if self.torn {
            self.out
                .write_all(LINE_END.as_bytes())
                .map_err(|_| StorageError::Write)?;
            self.torn = false;
        }

        let bytes = self.line.as_bytes();
        let mut written = 0;
        while written < bytes.len() {
            match self.out.write(&bytes[written..]) {
                Ok(n) if n > 0 => written += n,
                _ => {
                    self.torn = written > 0;
                    return Err(StorageError::Write);
                }
            }
        }
        Ok(())
    }

    /// True when the sink holds an unterminated fragment
    pub fn is_torn(&self) -> bool {
        self.torn
    }

    /// Pixel records written so far
    pub fn pixels_written(&self) -> u32 {
        self.pixels_written
    }

    /// Push buffered bytes to the sink
    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.out.flush().map_err(|_| StorageError::Write)
    }

    /// Give the sink back
    pub fn into_inner(self) -> W {
        self.out
    }
}
