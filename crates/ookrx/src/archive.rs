//! Archival storage of bursts
//!
//! Captured bursts are stored as members of a tar stream, one wire
//! record per member. The container makes capture files inspectable
//! with ordinary tools and keeps appends cheap.

use std::io::{self, Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::burst::{Burst, WireError, MAX_WIRE_PULSES};

// Largest member a wire record can fill: the 16-byte record header
// plus 12 bytes per pulse. Headers claiming more are corrupt, and
// their sizes must not reach the allocator.
const MAX_MEMBER_BYTES: u64 = 16 + 12 * MAX_WIRE_PULSES as u64;

/// Error reading or writing a burst archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Container-level I/O failure
    #[error("archive i/o: {0}")]
    Io(#[from] io::Error),

    /// An archive member claims a size no burst record can have
    #[error("archive member claims {0} bytes, larger than any burst record")]
    OversizeMember(u64),

    /// An archive member did not decode as a burst record
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Writes bursts to a tar container
///
/// Members are named `NNNN-<position>.burst`, where `NNNN` is a
/// 1-based sequence number and `<position>` is the capture offset in
/// nanoseconds. Call [`finish()`](BurstWriter::finish) to write the
/// container footer before dropping the writer.
pub struct BurstWriter<W: Write> {
    inner: tar::Builder<W>,
    sequence: usize,
}

impl<W: Write> BurstWriter<W> {
    /// New writer over `sink`
    pub fn new(sink: W) -> Self {
        Self {
            inner: tar::Builder::new(sink),
            sequence: 1,
        }
    }

    /// Append one burst to the archive
    pub fn write(&mut self, burst: &Burst) -> Result<(), ArchiveError> {
        let mut record = Vec::new();
        burst.encode_to(&mut record)?;

        let mut header = tar::Header::new_gnu();
        header.set_size(record.len() as u64);
        header.set_mode(0o775);
        header.set_mtime(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|t| t.as_secs())
                .unwrap_or(0),
        );
        header.set_entry_type(tar::EntryType::Regular);

        let name = format!(
            "{:04}-{}.burst",
            self.sequence,
            burst.position().as_nanos()
        );
        self.inner.append_data(&mut header, name, record.as_slice())?;
        self.sequence += 1;
        Ok(())
    }

    /// Write the archive footer
    pub fn finish(&mut self) -> Result<(), ArchiveError> {
        self.inner.finish()?;
        Ok(())
    }
}

/// Reads bursts back out of a tar container
pub struct BurstArchive<R: Read> {
    inner: tar::Archive<R>,
}

impl<R: Read> BurstArchive<R> {
    /// New archive reader over `source`
    pub fn new(source: R) -> Self {
        Self {
            inner: tar::Archive::new(source),
        }
    }

    /// Iterate the archived bursts in storage order
    ///
    /// The archive is read as a stream, so this may only be called
    /// once per reader.
    pub fn bursts(&mut self) -> Result<Bursts<'_, R>, ArchiveError> {
        Ok(Bursts {
            entries: self.inner.entries()?,
        })
    }
}

/// Iterator over the bursts of a [`BurstArchive`]
pub struct Bursts<'a, R: 'a + Read> {
    entries: tar::Entries<'a, R>,
}

impl<'a, R: Read> Iterator for Bursts<'a, R> {
    type Item = Result<Burst, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        Some(read_burst(entry))
    }
}

fn read_burst<R: Read>(
    entry: io::Result<tar::Entry<'_, R>>,
) -> Result<Burst, ArchiveError> {
    let mut entry = entry?;
    if entry.size() > MAX_MEMBER_BYTES {
        return Err(ArchiveError::OversizeMember(entry.size()));
    }
    let mut record = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut record)?;
    Ok(Burst::decode_from(record.as_slice())?)
}
