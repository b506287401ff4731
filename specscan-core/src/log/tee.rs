//! Mirroring a scan log to a live channel
//!
//! The durable sink is authoritative. The mirror is best effort: a mirror
//! that fails is counted and skipped, never allowed to fail the scan.

use embedded_io::{ErrorType, Write};
use specscan_hal::{RecordStore, StorageError};

/// Writer that copies every byte to a second writer
pub struct Tee<A, B> {
    primary: A,
    mirror: B,
    mirror_faults: u32,
}

impl<A: Write, B: Write> Tee<A, B> {
    /// Mirror `primary` onto `mirror`
    pub fn new(primary: A, mirror: B) -> Self {
        Self {
            primary,
            mirror,
            mirror_faults: 0,
        }
    }

    /// Writes the mirror rejected
    pub fn mirror_faults(&self) -> u32 {
        self.mirror_faults
    }

    /// Split back into the primary and the mirror
    pub fn into_parts(self) -> (A, B) {
        (self.primary, self.mirror)
    }
}

impl<A: Write, B: Write> ErrorType for Tee<A, B> {
    type Error = A::Error;
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let n = self.primary.write(buf)?;
        if self.mirror.write_all(&buf[..n]).is_err() {
            self.mirror_faults = self.mirror_faults.saturating_add(1);
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.primary.flush()?;
        if self.mirror.flush().is_err() {
            self.mirror_faults = self.mirror_faults.saturating_add(1);
        }
        Ok(())
    }
}

/// Record store whose writers are mirrored onto a live channel
///
/// The mirror is lent to each record set while it is open and taken back
/// on close.
pub struct MirroredStore<S, M> {
    store: S,
    mirror: Option<M>,
}

impl<S: RecordStore, M: Write> MirroredStore<S, M> {
    /// Wrap `store`, mirroring every record set onto `mirror`
    pub fn new(store: S, mirror: M) -> Self {
        Self {
            store,
            mirror: Some(mirror),
        }
    }

    /// Underlying store
    pub fn inner(&self) -> &S {
        &self.store
    }
}

impl<S: RecordStore, M: Write> RecordStore for MirroredStore<S, M> {
    type Writer = Tee<S::Writer, M>;

    fn create(&mut self, name: &str, overwrite: bool) -> Result<Self::Writer, StorageError> {
        let mirror = self.mirror.take().ok_or(StorageError::Unavailable)?;
        match self.store.create(name, overwrite) {
            Ok(primary) => Ok(Tee::new(primary, mirror)),
            Err(e) => {
                self.mirror = Some(mirror);
                Err(e)
            }
        }
    }

    fn close(&mut self, writer: Self::Writer) -> Result<(), StorageError> {
        let (primary, mirror) = writer.into_parts();
        self.mirror = Some(mirror);
        self.store.close(primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::mock::{MemorySink, MemoryStore};

    #[test]
    fn test_tee_copies_bytes() {
        let mut tee = Tee::new(MemorySink::default(), MemorySink::default());
        tee.write_all(b"h,0|file_version=1\r\n").unwrap();
        tee.flush().unwrap();

        let (primary, mirror) = tee.into_parts();
        assert_eq!(primary.bytes, mirror.bytes);
        assert!(mirror.flushed);
    }

    #[test]
    fn test_failing_mirror_is_counted_not_fatal() {
        let mirror = MemorySink {
            limit: Some(0),
            ..MemorySink::default()
        };
        let mut tee = Tee::new(MemorySink::default(), mirror);
        tee.write_all(b"abc").unwrap();
        tee.write_all(b"def").unwrap();

        assert_eq!(tee.mirror_faults(), 2);
        let (primary, _) = tee.into_parts();
        assert_eq!(primary.text(), "abcdef");
    }

    #[test]
    fn test_failing_primary_is_fatal() {
        let primary = MemorySink {
            limit: Some(0),
            ..MemorySink::default()
        };
        let mut tee = Tee::new(primary, MemorySink::default());
        assert!(tee.write_all(b"abc").is_err());
    }

    #[test]
    fn test_mirrored_store_lends_mirror() {
        let mut store = MirroredStore::new(MemoryStore::default(), MemorySink::default());

        let mut writer = store.create("scan.txt", true).unwrap();
        writer.write_all(b"p,0|\r\n").unwrap();
        // Mirror is out on loan while a record set is open
        assert_eq!(store.create("other.txt", true).err(), Some(StorageError::Unavailable));

        store.close(writer).unwrap();
        assert_eq!(store.inner().last_text(), "p,0|\r\n");
        assert!(store.create("next.txt", true).is_ok());
    }

    #[test]
    fn test_failed_create_keeps_mirror() {
        let inner = MemoryStore {
            unavailable: true,
            ..MemoryStore::default()
        };
        let mut store = MirroredStore::new(inner, MemorySink::default());
        assert!(store.create("scan.txt", true).is_err());
        assert!(store.mirror.is_some());
    }
}
