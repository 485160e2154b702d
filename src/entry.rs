use crate::errors::Error;
use crate::format::{CompressionMethod, LocalFileHeaderFixed};
use crate::level::CompressionLevel;
use crate::mode::EntryMode;
use crate::path::EntryName;
use crate::source::{ConsumerFn, DataConsumer, DataFn, EntrySource, StreamFn};
use crate::time::ZipDateTime;
use crate::writer::EntryWriter;
use std::io::{self, Cursor, Read};

/// One logical file or directory inside a zip archive.
///
/// An entry is immutable once constructed. The crc and size fields are zero
/// for entries that have never been serialized; a finished
/// [`EntryWriter`](crate::EntryWriter) yields them in its
/// [`WrittenEntry`](crate::WrittenEntry), and entries captured from an
/// existing archive carry them from the start. Content acquisition is
/// deferred: the data source runs only when a writer serializes the entry or
/// a data accessor is called.
pub struct ZipEntry {
    name: EntryName,
    mode: EntryMode,
    modified: ZipDateTime,
    level: CompressionLevel,
    source: Option<EntrySource>,
    encoded: Option<EncodedLocalFile>,
    crc32: u32,
    uncompressed_size: u64,
    compressed_size: u64,
}

impl ZipEntry {
    /// The canonical constructor behind every factory form.
    ///
    /// At most one of the three optional producers becomes the entry's data
    /// source; when several are supplied, the first in (data, stream,
    /// consumer) argument order wins and the rest are dropped without ever
    /// being invoked. Directory names reject producers outright.
    pub fn new(
        name: EntryName,
        mode: EntryMode,
        modified: ZipDateTime,
        level: CompressionLevel,
        data: Option<DataFn>,
        stream: Option<StreamFn>,
        consumer: Option<ConsumerFn>,
    ) -> Result<ZipEntry, Error> {
        let source = EntrySource::select(data, stream, consumer);

        if name.is_dir() && source.is_some() {
            return Err(Error::invalid_input(
                "directory entries cannot carry a data producer",
            ));
        }

        let level = if name.is_dir() {
            CompressionLevel::Store
        } else {
            level
        };

        Ok(ZipEntry {
            name,
            mode,
            modified,
            level,
            source,
            encoded: None,
            crc32: 0,
            uncompressed_size: 0,
            compressed_size: 0,
        })
    }

    /// Creates a file entry whose content is pushed by a stream callback.
    pub fn from_stream_fn(
        name: impl Into<String>,
        compress: bool,
        stream: StreamFn,
    ) -> Result<ZipEntry, Error> {
        Self::new(
            EntryName::file(name)?,
            EntryMode::unknown(),
            ZipDateTime::now(),
            CompressionLevel::from_flag(compress),
            None,
            Some(stream),
            None,
        )
    }

    /// Creates a file entry whose content is returned as one buffer.
    pub fn from_data_fn(
        name: impl Into<String>,
        compress: bool,
        data: DataFn,
    ) -> Result<ZipEntry, Error> {
        Self::new(
            EntryName::file(name)?,
            EntryMode::unknown(),
            ZipDateTime::now(),
            CompressionLevel::from_flag(compress),
            Some(data),
            None,
            None,
        )
    }

    /// Creates a file entry whose content is fed to a data consumer.
    pub fn from_consumer_fn(
        name: impl Into<String>,
        compress: bool,
        consumer: ConsumerFn,
    ) -> Result<ZipEntry, Error> {
        Self::new(
            EntryName::file(name)?,
            EntryMode::unknown(),
            ZipDateTime::now(),
            CompressionLevel::from_flag(compress),
            None,
            None,
            Some(consumer),
        )
    }

    /// Creates a directory entry. A trailing `/` is appended when missing.
    pub fn directory(name: impl Into<String>) -> Result<ZipEntry, Error> {
        Self::new(
            EntryName::directory(name)?,
            EntryMode::unknown(),
            ZipDateTime::now(),
            CompressionLevel::Store,
            None,
            None,
            None,
        )
    }

    /// Creates an entry from a local record captured out of a source archive.
    ///
    /// `raw` must hold the entry's complete local file record, starting at
    /// the local header signature: header, name, extra field, and the
    /// compressed payload (plus trailing data descriptor, when the original
    /// archive wrote one). The crc and sizes come from the source archive's
    /// central directory and are trusted, not recomputed.
    ///
    /// `method` is recorded alongside the payload and re-emitted with it.
    /// Methods other than store and deflate are carried through intact, but
    /// their payloads cannot be decoded by the data accessors.
    ///
    /// Such an entry is eligible for the skip path when serialized with
    /// [`ZipEntry::writer`] and `can_skip_local_file` set.
    #[allow(clippy::too_many_arguments)]
    pub fn from_encoded(
        name: EntryName,
        mode: EntryMode,
        modified: ZipDateTime,
        method: CompressionMethod,
        crc32: u32,
        uncompressed_size: u64,
        compressed_size: u64,
        raw: Vec<u8>,
    ) -> Result<ZipEntry, Error> {
        let encoded = EncodedLocalFile::parse(raw, compressed_size, method)?;
        let level = match method {
            CompressionMethod::Store => CompressionLevel::Store,
            // The original effort is unrecoverable; irrelevant as long as the
            // payload is copied rather than re-encoded.
            _ => CompressionLevel::Default,
        };

        Ok(ZipEntry {
            name,
            mode,
            modified,
            level,
            source: None,
            encoded: Some(encoded),
            crc32,
            uncompressed_size,
            compressed_size,
        })
    }

    /// The file name of the entry. Directories end with `/`.
    pub fn name(&self) -> &EntryName {
        &self.name
    }

    /// The unix file mode: zero for new or non-unix entries.
    pub fn mode(&self) -> EntryMode {
        self.mode
    }

    /// The last modified time, accurate to 2 seconds once serialized.
    pub fn modified(&self) -> ZipDateTime {
        self.modified
    }

    /// The compression configuration serialized with.
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// The compression method recorded in the entry's local header: derived
    /// from the level for fresh entries, captured for archive copies.
    pub fn method(&self) -> CompressionMethod {
        match &self.encoded {
            Some(encoded) => encoded.method(),
            None => self.level.method(),
        }
    }

    /// Whether the entry's payload bytes differ from its content bytes.
    pub fn compressed(&self) -> bool {
        !matches!(self.method(), CompressionMethod::Store)
    }

    /// Whether the entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.name.is_dir()
    }

    /// The CRC-32 of the entry content: 0 for entries not yet written.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// The uncompressed size: 0 for entries not yet written.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// The compressed size: 0 for entries not yet written.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    pub(crate) fn source(&self) -> Option<&EntrySource> {
        self.source.as_ref()
    }

    pub(crate) fn encoded(&self) -> Option<&EncodedLocalFile> {
        self.encoded.as_ref()
    }

    /// Materializes the entry's uncompressed content as one buffer.
    ///
    /// Returns `None` for directories and entries with no content available.
    /// Each call materializes afresh from the underlying producer.
    pub fn data(&self) -> Option<io::Result<Vec<u8>>> {
        if let Some(source) = &self.source {
            return Some(source.bytes());
        }
        self.encoded
            .as_ref()
            .map(|enc| enc.decode(self.compressed_size))
    }

    /// Materializes a fresh forward-only reader over the entry's content.
    ///
    /// Returns `None` for directories and entries with no content available.
    pub fn reader(&self) -> Option<io::Result<Cursor<Vec<u8>>>> {
        self.data()
            .map(|data| data.map(Cursor::new))
    }

    /// Feeds the entry's uncompressed content into an external consumer,
    /// re-offering the unconsumed tail until the consumer has taken it all.
    ///
    /// Returns `None` for directories and entries with no content available.
    pub fn write_data(&self, consumer: &mut dyn DataConsumer) -> Option<io::Result<()>> {
        let data = match self.data()? {
            Ok(data) => data,
            Err(err) => return Some(Err(err)),
        };

        let mut rest = &data[..];
        while !rest.is_empty() {
            match consumer.put_bytes(rest) {
                Ok(0) => {
                    return Some(Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "data consumer stopped accepting bytes",
                    )))
                }
                Ok(taken) => rest = &rest[taken..],
                Err(err) => return Some(Err(err)),
            }
        }
        Some(Ok(()))
    }

    /// Creates the single-use writer that serializes this entry.
    ///
    /// With `can_skip_local_file` set and a captured local record present,
    /// the writer copies the record's raw bytes through verbatim instead of
    /// re-invoking the data source and codec. Identity with the destination
    /// archive's expectations is the caller's responsibility; nothing is
    /// verified byte-for-byte.
    pub fn writer(&self, can_skip_local_file: bool) -> EntryWriter<'_> {
        EntryWriter::new(self, can_skip_local_file)
    }
}

impl std::fmt::Debug for ZipEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ZipEntry")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("modified", &self.modified)
            .field("level", &self.level)
            .field("source", &self.source)
            .field("encoded", &self.encoded.is_some())
            .field("crc32", &self.crc32)
            .field("uncompressed_size", &self.uncompressed_size)
            .field("compressed_size", &self.compressed_size)
            .finish()
    }
}

/// A local file record captured verbatim from a source archive.
#[derive(Debug, Clone)]
pub(crate) struct EncodedLocalFile {
    bytes: Vec<u8>,
    payload_offset: usize,
    method: CompressionMethod,
}

impl EncodedLocalFile {
    fn parse(
        bytes: Vec<u8>,
        compressed_size: u64,
        method: CompressionMethod,
    ) -> Result<EncodedLocalFile, Error> {
        let header = LocalFileHeaderFixed::parse(&bytes)?;
        let payload_offset = LocalFileHeaderFixed::SIZE + header.variable_length();

        let payload_end = payload_offset as u64 + compressed_size;
        if (bytes.len() as u64) < payload_end {
            return Err(Error::from(crate::errors::ErrorKind::Eof));
        }

        Ok(EncodedLocalFile {
            bytes,
            payload_offset,
            method,
        })
    }

    /// The compression method the payload bytes were captured in.
    pub(crate) fn method(&self) -> CompressionMethod {
        self.method
    }

    /// The complete captured record, emitted verbatim on the skip path.
    pub(crate) fn raw_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The compressed payload alone, without header or trailing descriptor.
    pub(crate) fn payload(&self, compressed_size: u64) -> &[u8] {
        &self.bytes[self.payload_offset..self.payload_offset + compressed_size as usize]
    }

    fn decode(&self, compressed_size: u64) -> io::Result<Vec<u8>> {
        let payload = self.payload(compressed_size);

        match self.method {
            CompressionMethod::Store => Ok(payload.to_vec()),
            CompressionMethod::Deflate => {
                let mut decoded = Vec::new();
                flate2::read::DeflateDecoder::new(payload).read_to_end(&mut decoded)?;
                Ok(decoded)
            }
            CompressionMethod::Unknown(id) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("cannot decode compression method {}", id),
            )),
        }
    }
}
