use crate::crc::Crc32;
use crate::entry::{EncodedLocalFile, ZipEntry};
use crate::errors::Error;
use crate::format::{
    CompressionMethod, DataDescriptor, LocalFileHeaderFixed, FLAG_DATA_DESCRIPTOR,
    LOCAL_FILE_HEADER_SIGNATURE, VERSION_NEEDED,
};
use crate::path::EntryName;
use crate::time::DosDateTime;
use std::io::{self, Seek, SeekFrom, Write};

/// Destination for serialized local file records.
///
/// The two implementations fix the header finalization strategy for a whole
/// archive write: [`SeekableSink`] rewrites each local header in place once
/// crc and sizes are known, [`StreamSink`] leaves placeholder fields, sets
/// general purpose bit 3, and appends a trailing data descriptor. Pick one
/// per destination; mixing strategies within an archive is on the caller.
pub trait EntrySink: Write {
    /// Current absolute offset in the destination byte stream.
    fn offset(&self) -> u64;

    /// Whether local headers are written with placeholder sizes that are
    /// carried in a trailing data descriptor instead.
    fn uses_data_descriptor(&self) -> bool;

    /// Finalizes the local record whose header starts at `header_offset`.
    fn finish_local_file(
        &mut self,
        header_offset: u64,
        descriptor: &DataDescriptor,
    ) -> io::Result<()>;
}

/// An append-only destination: sizes travel in trailing data descriptors.
#[derive(Debug)]
pub struct StreamSink<W> {
    inner: CountWriter<W>,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        StreamSink {
            inner: CountWriter::new(writer, 0),
        }
    }

    /// Starts counting at `offset`, for archives appended to existing bytes.
    pub fn at_offset(writer: W, offset: u64) -> Self {
        StreamSink {
            inner: CountWriter::new(writer, offset),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner.writer
    }
}

impl<W: Write> Write for StreamSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> EntrySink for StreamSink<W> {
    fn offset(&self) -> u64 {
        self.inner.count()
    }

    fn uses_data_descriptor(&self) -> bool {
        true
    }

    fn finish_local_file(
        &mut self,
        _header_offset: u64,
        descriptor: &DataDescriptor,
    ) -> io::Result<()> {
        descriptor.write(&mut self.inner)
    }
}

/// A seekable destination: local headers are rewritten in place, so no data
/// descriptors are emitted.
#[derive(Debug)]
pub struct SeekableSink<W> {
    inner: CountWriter<W>,
}

impl<W: Write + Seek> SeekableSink<W> {
    pub fn new(writer: W) -> Self {
        SeekableSink {
            inner: CountWriter::new(writer, 0),
        }
    }

    /// Starts counting at `offset`, for archives appended to existing bytes.
    /// The underlying writer must already be positioned there.
    pub fn at_offset(writer: W, offset: u64) -> Self {
        SeekableSink {
            inner: CountWriter::new(writer, offset),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner.writer
    }
}

impl<W: Write> Write for SeekableSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Seek> EntrySink for SeekableSink<W> {
    fn offset(&self) -> u64 {
        self.inner.count()
    }

    fn uses_data_descriptor(&self) -> bool {
        false
    }

    fn finish_local_file(
        &mut self,
        header_offset: u64,
        descriptor: &DataDescriptor,
    ) -> io::Result<()> {
        // Offsets are absolute; translate to a relative seek so a writer that
        // did not start at position zero still lands on its own header.
        let end = self.inner.count();
        let patch_at = header_offset + LocalFileHeaderFixed::CRC_OFFSET;
        let back = (end - patch_at) as i64;

        self.inner.writer.flush()?;
        self.inner.writer.seek(SeekFrom::Current(-back))?;

        let mut fields = [0u8; 12];
        fields[0..4].copy_from_slice(&descriptor.crc32.to_le_bytes());
        fields[4..8].copy_from_slice(&descriptor.compressed_size.to_le_bytes());
        fields[8..12].copy_from_slice(&descriptor.uncompressed_size.to_le_bytes());
        self.inner.writer.write_all(&fields)?;

        self.inner.writer.seek(SeekFrom::Current(back - 12))?;
        Ok(())
    }
}

/// Serialization states of an [`EntryWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Idle,
    Streaming,
    Skipped,
    Finalized,
    Failed,
}

/// Single-use serializer turning one entry into its local file record.
///
/// Created by [`ZipEntry::writer`] immediately before serialization and
/// consumed by [`EntryWriter::write_to`]. Dropping a writer mid-stream
/// releases everything it holds; any bytes already written to the sink are
/// the caller's to discard.
pub struct EntryWriter<'a> {
    entry: &'a ZipEntry,
    can_skip_local_file: bool,
    state: WriterState,
}

impl<'a> EntryWriter<'a> {
    pub(crate) fn new(entry: &'a ZipEntry, can_skip_local_file: bool) -> Self {
        EntryWriter {
            entry,
            can_skip_local_file,
            state: WriterState::Idle,
        }
    }

    /// Serializes the entry into `sink` and returns the finalized record
    /// metadata for the archive's central directory.
    ///
    /// On any producer, codec, or sink failure the writer ends in a terminal
    /// failed state: no finalization is performed and a header already
    /// emitted with placeholder sizes is left unresolved, so the surrounding
    /// archive write must be reported failed rather than letting a partial
    /// record pass as valid.
    pub fn write_to<S: EntrySink>(mut self, sink: &mut S) -> Result<WrittenEntry, Error> {
        let result = self.serialize(sink);
        if result.is_err() {
            let phase = self.state;
            self.state = WriterState::Failed;
            log::debug!(
                "entry {:?} failed during {:?}",
                self.entry.name().as_str(),
                phase
            );
        }
        result
    }

    fn serialize<S: EntrySink>(&mut self, sink: &mut S) -> Result<WrittenEntry, Error> {
        if self.can_skip_local_file {
            if let Some(encoded) = self.entry.encoded() {
                return self.copy_encoded(sink, encoded);
            }
        }

        let entry = self.entry;
        let header_offset = sink.offset();
        let pre_known = entry.encoded().is_some() || entry.is_dir();

        // Sizes already known (directories, archive copies) go straight into
        // the header; otherwise the sink's finalization strategy applies.
        let mut flags = 0u16;
        if !pre_known && sink.uses_data_descriptor() {
            flags |= FLAG_DATA_DESCRIPTOR;
        }

        // Archive copies keep the method their payload was captured in.
        let method = entry.method();
        let (crc32, uncompressed_size, compressed_size) = if pre_known {
            (
                entry.crc32(),
                entry.uncompressed_size(),
                entry.compressed_size(),
            )
        } else {
            (0, 0, 0)
        };

        check_u32_limits(compressed_size, uncompressed_size)?;

        self.write_local_header(
            sink,
            flags,
            method,
            crc32,
            compressed_size as u32,
            uncompressed_size as u32,
        )?;

        self.state = WriterState::Streaming;
        log::trace!(
            "entry {:?} streaming at offset {}",
            entry.name().as_str(),
            header_offset
        );

        let descriptor = if let Some(encoded) = entry.encoded() {
            // Re-emitted archive copy: fresh header, payload copied verbatim,
            // crc and sizes trusted from the source central directory.
            sink.write_all(encoded.payload(entry.compressed_size()))
                .map_err(sink_io_error)?;
            None
        } else if entry.is_dir() {
            None
        } else {
            let payload_start = sink.offset();
            let (crc32, uncompressed_size) = self.stream_payload(sink)?;
            let compressed_size = sink.offset() - payload_start;

            check_u32_limits(compressed_size, uncompressed_size)?;
            Some(DataDescriptor {
                crc32,
                compressed_size: compressed_size as u32,
                uncompressed_size: uncompressed_size as u32,
            })
        };

        let descriptor = match descriptor {
            Some(descriptor) => {
                sink.finish_local_file(header_offset, &descriptor)
                    .map_err(sink_io_error)?;
                descriptor
            }
            None => DataDescriptor {
                crc32,
                compressed_size: compressed_size as u32,
                uncompressed_size: uncompressed_size as u32,
            },
        };

        self.state = WriterState::Finalized;
        log::trace!(
            "entry {:?} finalized, {} -> {} bytes",
            entry.name().as_str(),
            descriptor.uncompressed_size,
            descriptor.compressed_size
        );

        Ok(WrittenEntry {
            name: entry.name().clone(),
            mode: entry.mode().normalized(entry.is_dir()),
            dos_datetime: DosDateTime::from(&entry.modified()),
            method,
            flags,
            crc32: descriptor.crc32,
            compressed_size: descriptor.compressed_size as u64,
            uncompressed_size: descriptor.uncompressed_size as u64,
            local_header_offset: header_offset,
        })
    }

    /// The skip path: the captured record is copied through verbatim without
    /// touching the data source or the codec. Identity with the original is
    /// caller-trusted.
    fn copy_encoded<S: EntrySink>(
        &mut self,
        sink: &mut S,
        encoded: &EncodedLocalFile,
    ) -> Result<WrittenEntry, Error> {
        let entry = self.entry;
        let header_offset = sink.offset();

        self.state = WriterState::Skipped;
        log::trace!(
            "entry {:?} skipping local file re-encoding at offset {}",
            entry.name().as_str(),
            header_offset
        );

        sink.write_all(encoded.raw_bytes()).map_err(sink_io_error)?;

        // Flags and method come from the captured header so the central
        // directory stays consistent with the copied record.
        let header = LocalFileHeaderFixed::parse(encoded.raw_bytes())?;

        self.state = WriterState::Finalized;
        Ok(WrittenEntry {
            name: entry.name().clone(),
            mode: entry.mode().normalized(entry.is_dir()),
            dos_datetime: DosDateTime::new(header.last_mod_time, header.last_mod_date),
            method: CompressionMethod::from(header.compression_method),
            flags: header.flags,
            crc32: entry.crc32(),
            compressed_size: entry.compressed_size(),
            uncompressed_size: entry.uncompressed_size(),
            local_header_offset: header_offset,
        })
    }

    fn write_local_header<S: EntrySink>(
        &mut self,
        sink: &mut S,
        flags: u16,
        method: CompressionMethod,
        crc32: u32,
        compressed_size: u32,
        uncompressed_size: u32,
    ) -> Result<(), Error> {
        let entry = self.entry;
        let (dos_time, dos_date) = DosDateTime::from(&entry.modified()).into_parts();

        let header = LocalFileHeaderFixed {
            signature: LOCAL_FILE_HEADER_SIGNATURE,
            version_needed: VERSION_NEEDED,
            flags,
            compression_method: method.as_id(),
            last_mod_time: dos_time,
            last_mod_date: dos_date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name_len: entry.name().len() as u16,
            extra_field_len: 0,
        };

        header.write(&mut *sink).map_err(sink_io_error)?;
        sink.write_all(entry.name().as_bytes())
            .map_err(sink_io_error)?;
        Ok(())
    }

    /// Pulls the entry's bytes through the configured codec into the sink,
    /// folding every uncompressed byte into the crc and counting both sides.
    fn stream_payload<S: EntrySink>(&mut self, sink: &mut S) -> Result<(u32, u64), Error> {
        let entry = self.entry;
        let empty;
        let source = match entry.source() {
            Some(source) => source,
            // A file entry constructed with no producer: zero bytes of
            // content. Deflate still has to emit its empty-payload epilogue.
            None => {
                empty = crate::source::EntrySource::Buffer(Box::new(|| Ok(Vec::new())));
                &empty
            }
        };

        match entry.level().effort() {
            Some(effort) => {
                let encoder = flate2::write::DeflateEncoder::new(&mut *sink, effort);
                let mut tracker = TrackingWriter::new(encoder);
                source.write_to(&mut tracker).map_err(producer_io_error)?;

                let (encoder, crc32, uncompressed_size) = tracker.finish();
                encoder.finish().map_err(codec_io_error)?;
                Ok((crc32, uncompressed_size))
            }
            None => {
                let mut tracker = TrackingWriter::new(&mut *sink);
                source.write_to(&mut tracker).map_err(producer_io_error)?;

                let (inner, crc32, uncompressed_size) = tracker.finish();
                inner.flush().map_err(sink_io_error)?;
                Ok((crc32, uncompressed_size))
            }
        }
    }
}

impl std::fmt::Debug for EntryWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("EntryWriter")
            .field("entry", &self.entry.name().as_str())
            .field("can_skip_local_file", &self.can_skip_local_file)
            .field("state", &self.state)
            .finish()
    }
}

/// The finalized metadata of one serialized entry.
///
/// This is the descriptor copy the archive's central directory assembler
/// consumes: the write-once crc/size triple together with the fields the
/// central file header repeats.
#[derive(Debug, Clone)]
pub struct WrittenEntry {
    name: EntryName,
    mode: u32,
    dos_datetime: DosDateTime,
    method: CompressionMethod,
    flags: u16,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    local_header_offset: u64,
}

impl WrittenEntry {
    pub fn name(&self) -> &EntryName {
        &self.name
    }

    /// The full unix mode, file type bits included.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// The external file attributes value for the central directory, which
    /// carries the unix mode in its high 16 bits.
    pub fn external_attributes(&self) -> u32 {
        self.mode << 16
    }

    pub fn dos_datetime(&self) -> DosDateTime {
        self.dos_datetime
    }

    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    /// General purpose flags the local header was written with.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Offset of the local header within the destination byte stream.
    pub fn local_header_offset(&self) -> u64 {
        self.local_header_offset
    }
}

#[derive(Debug)]
struct CountWriter<W> {
    writer: W,
    count: u64,
}

impl<W> CountWriter<W> {
    fn new(writer: W, count: u64) -> Self {
        CountWriter { writer, count }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Tag destination failures so they stay distinguishable from
        // producer failures after passing through the codec.
        let bytes_written = self
            .writer
            .write(buf)
            .map_err(|err| io::Error::new(err.kind(), SinkFailed(err)))?;
        self.count += bytes_written as u64;
        Ok(bytes_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer
            .flush()
            .map_err(|err| io::Error::new(err.kind(), SinkFailed(err)))
    }
}

/// Counts uncompressed bytes and folds them into a running CRC-32 on their
/// way into the codec.
struct TrackingWriter<W> {
    inner: W,
    uncompressed_bytes: u64,
    crc: Crc32,
}

impl<W: Write> TrackingWriter<W> {
    fn new(inner: W) -> Self {
        TrackingWriter {
            inner,
            uncompressed_bytes: 0,
            crc: Crc32::new(),
        }
    }

    fn finish(self) -> (W, u32, u64) {
        (self.inner, self.crc.finalize(), self.uncompressed_bytes)
    }
}

impl<W: Write> Write for TrackingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let bytes_written = self.inner.write(buf)?;
        self.uncompressed_bytes += bytes_written as u64;
        self.crc.update(&buf[..bytes_written]);
        Ok(bytes_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Marker wrapped around io errors originating at the destination.
#[derive(Debug)]
struct SinkFailed(io::Error);

impl std::fmt::Display for SinkFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for SinkFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

fn untag(err: io::Error) -> Result<io::Error, io::Error> {
    if err.get_ref().map_or(false, |inner| inner.is::<SinkFailed>()) {
        match err.into_inner().map(|boxed| boxed.downcast::<SinkFailed>()) {
            Some(Ok(sink_failed)) => Ok(sink_failed.0),
            // Unreachable given the check above, but do not panic on it.
            Some(Err(boxed)) => Err(io::Error::new(io::ErrorKind::Other, boxed)),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "sink failure lost its payload",
            )),
        }
    } else {
        Err(err)
    }
}

/// An error surfaced while the producer was driving bytes: a tagged error is
/// the sink's fault, anything else is the data source's.
fn producer_io_error(err: io::Error) -> Error {
    match untag(err) {
        Ok(sink_err) => Error::sink(sink_err),
        Err(err) => Error::producer(err),
    }
}

/// An error surfaced while the codec was finalizing its stream.
fn codec_io_error(err: io::Error) -> Error {
    match untag(err) {
        Ok(sink_err) => Error::sink(sink_err),
        Err(err) => Error::codec(err),
    }
}

/// An error from writing directly to the sink.
fn sink_io_error(err: io::Error) -> Error {
    match untag(err) {
        Ok(sink_err) => Error::sink(sink_err),
        Err(err) => Error::sink(err),
    }
}

fn check_u32_limits(compressed_size: u64, uncompressed_size: u64) -> Result<(), Error> {
    if compressed_size >= u32::MAX as u64 || uncompressed_size >= u32::MAX as u64 {
        return Err(Error::invalid_input(
            "entry exceeds 32-bit zip size limits (zip64 is not supported here)",
        ));
    }
    Ok(())
}
