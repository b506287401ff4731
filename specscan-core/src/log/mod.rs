//! Scan log record format
//!
//! A scan log is line-oriented text, one record per line, CRLF
//! terminated:
//!
//! ```text
//! h,0|file_version=1
//! h,1|date_yyyymmdd=[2026,10,16];time_hhmmss=[14,5,0]
//! h,2|extent_xy_deg=[10,10];step_xy_deg=[5,5];n_pixels=9;n_spect=288;t_int_s=0.01;path=raster
//! w,0|wavelength_nm=[317.93,320.58,...]
//! p,0|xy=[0,0];head_deg=0;pitch_deg=0;roll_deg=0;spect_au=[812,799,...]
//! ```
//!
//! Records are only ever appended. Pixel sequence numbers equal the pixel
//! index. Readers should dispatch on record kind, not line position, and
//! accept logs with no pixel records.

pub mod reader;
pub mod tee;
pub mod writer;

pub use reader::{parse_list, records, Record, RecordError};
pub use tee::{MirroredStore, Tee};
pub use writer::{DateTime, Orientation, ScanHeader, ScanLog, FILE_VERSION};

/// Record kind tag at the start of every line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordKind {
    /// `h`: file version, capture time, scan geometry
    Header,
    /// `w`: wavelength table
    Wavelengths,
    /// `p`: one scan position and its frame
    Pixel,
}

impl RecordKind {
    /// Single-letter tag
    pub fn tag(&self) -> char {
        match self {
            RecordKind::Header => 'h',
            RecordKind::Wavelengths => 'w',
            RecordKind::Pixel => 'p',
        }
    }

    /// Kind for a tag, if known
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h" => Some(RecordKind::Header),
            "w" => Some(RecordKind::Wavelengths),
            "p" => Some(RecordKind::Pixel),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory sinks and stores

    use std::string::String;
    use std::vec::Vec;

    use embedded_io::{ErrorKind, ErrorType, Write};
    use specscan_hal::{RecordStore, StorageError};

    /// Growable sink that can be told to fail after a byte budget
    ///
    /// `limit` fails every write past the budget; `fail_once_at` fails a
    /// single write once the sink holds that many bytes, then recovers.
    #[derive(Debug, Default)]
    pub(crate) struct MemorySink {
        pub(crate) bytes: Vec<u8>,
        pub(crate) limit: Option<usize>,
        pub(crate) fail_once_at: Option<usize>,
        pub(crate) flushed: bool,
    }

    impl MemorySink {
        pub(crate) fn text(&self) -> &str {
            core::str::from_utf8(&self.bytes).unwrap()
        }
    }

    impl ErrorType for MemorySink {
        type Error = ErrorKind;
    }

    impl Write for MemorySink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let held = self.bytes.len();
            let mut n = match self.limit {
                Some(limit) if held >= limit => return Err(ErrorKind::Other),
                Some(limit) => buf.len().min(limit - held),
                None => buf.len(),
            };
            if let Some(at) = self.fail_once_at {
                if held >= at {
                    self.fail_once_at = None;
                    return Err(ErrorKind::Other);
                }
                n = n.min(at - held);
            }
            self.bytes.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            self.flushed = true;
            Ok(())
        }
    }

    /// Store keeping every closed record set in memory
    #[derive(Debug, Default)]
    pub(crate) struct MemoryStore {
        pub(crate) closed: Vec<(String, MemorySink)>,
        pub(crate) existing: Vec<String>,
        pub(crate) open: Option<String>,
        pub(crate) write_limit: Option<usize>,
        pub(crate) fail_once_at: Option<usize>,
        pub(crate) unavailable: bool,
    }

    impl MemoryStore {
        pub(crate) fn last_text(&self) -> &str {
            self.closed.last().map(|(_, sink)| sink.text()).unwrap_or("")
        }
    }

    impl RecordStore for MemoryStore {
        type Writer = MemorySink;

        fn create(&mut self, name: &str, overwrite: bool) -> Result<MemorySink, StorageError> {
            if self.unavailable || self.open.is_some() {
                return Err(StorageError::Unavailable);
            }
            if !overwrite && self.existing.iter().any(|n| n == name) {
                return Err(StorageError::AlreadyExists);
            }
            self.open = Some(name.into());
            Ok(MemorySink {
                limit: self.write_limit,
                fail_once_at: self.fail_once_at,
                ..MemorySink::default()
            })
        }

        fn close(&mut self, writer: MemorySink) -> Result<(), StorageError> {
            let name = self.open.take().ok_or(StorageError::Unavailable)?;
            if !self.existing.contains(&name) {
                self.existing.push(name.clone());
            }
            self.closed.push((name, writer));
            Ok(())
        }
    }
}
