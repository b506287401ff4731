//! Record storage abstraction
//!
//! A record store is where scan logs end up: a file on flash, an SD card,
//! or a live serial channel. The store owns creation and teardown; the
//! scan log only ever appends bytes through the writer it hands out.

/// Errors from record storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StorageError {
    /// The destination cannot be opened or created
    Unavailable,
    /// A record set with this name exists and overwriting was not allowed
    AlreadyExists,
    /// Writing to an open destination failed
    Write,
    /// Storage is full
    Full,
}

/// Destination for append-only record sets
///
/// At most one writer is outstanding at a time. Implementations that can
/// hold only one open destination should return
/// [`StorageError::Unavailable`] from [`RecordStore::create`] until the
/// previous writer has been handed back through [`RecordStore::close`].
pub trait RecordStore {
    /// Append-only writer for one record set
    type Writer: embedded_io::Write;

    /// Create (or truncate, when `overwrite` is set) the named record set
    ///
    /// # Arguments
    /// * `name` - Destination name, e.g. a file name
    /// * `overwrite` - Replace an existing record set with the same name
    fn create(&mut self, name: &str, overwrite: bool) -> Result<Self::Writer, StorageError>;

    /// Close a record set previously returned by [`RecordStore::create`]
    ///
    /// Implementations flush and persist whatever the writer buffered.
    fn close(&mut self, writer: Self::Writer) -> Result<(), StorageError>;
}
