//! Scan log storage streamed over a UART
//!
//! The board has no file system, so a record set is written straight to a
//! serial port and captured on the host under whatever name the capture
//! tool chooses. A stream cannot refuse to overwrite, so the name and
//! `overwrite` flag are ignored.

use embassy_rp::uart::{Blocking, UartTx};
use embedded_io::{ErrorKind, ErrorType, Write};
use specscan_hal::{RecordStore, StorageError};

/// Blocking UART transmitter used as a log sink
pub struct UartSink<'d> {
    tx: UartTx<'d, Blocking>,
}

impl ErrorType for UartSink<'_> {
    type Error = ErrorKind;
}

impl Write for UartSink<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.blocking_write(buf).map_err(|_| ErrorKind::Other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.blocking_flush().map_err(|_| ErrorKind::Other)
    }
}

/// Record store with a single UART destination
///
/// The transmitter is handed to the open writer and comes back on close;
/// a second `create` while a record set is open is
/// [`StorageError::Unavailable`].
pub struct UartRecordStore<'d> {
    tx: Option<UartTx<'d, Blocking>>,
}

impl<'d> UartRecordStore<'d> {
    /// Use `tx` as the log destination
    pub fn new(tx: UartTx<'d, Blocking>) -> Self {
        Self { tx: Some(tx) }
    }

    /// True while no record set is open
    pub fn is_idle(&self) -> bool {
        self.tx.is_some()
    }
}

impl<'d> RecordStore for UartRecordStore<'d> {
    type Writer = UartSink<'d>;

    fn create(&mut self, _name: &str, _overwrite: bool) -> Result<Self::Writer, StorageError> {
        let tx = self.tx.take().ok_or(StorageError::Unavailable)?;
        Ok(UartSink { tx })
    }

    fn close(&mut self, writer: Self::Writer) -> Result<(), StorageError> {
        let mut tx = writer.tx;
        let flushed = tx.blocking_flush();
        self.tx = Some(tx);
        flushed.map_err(|_| StorageError::Write)
    }
}
