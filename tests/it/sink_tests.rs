use crate::{data_entry, inflate, read_local_record};
use std::io::{Cursor, Seek, SeekFrom, Write};
use zipentry::{crc32, CompressionLevel, EntrySink, LocalFileHeaderFixed, SeekableSink, StreamSink};

#[test]
fn test_stream_sink_defers_sizes_to_descriptor() {
    let entry = data_entry("deferred.txt", CompressionLevel::Default, b"payload bytes");
    let mut sink = StreamSink::new(Vec::new());
    assert!(sink.uses_data_descriptor());

    let written = entry.writer(false).write_to(&mut sink).unwrap();
    let record = read_local_record(&sink.into_inner());

    // Placeholder header, real values trail the payload.
    assert_eq!(record.header.flags & 0x08, 0x08);
    assert_eq!(record.header.crc32, 0);
    assert_eq!(record.header.compressed_size, 0);
    assert_eq!(record.header.uncompressed_size, 0);

    let descriptor = record.descriptor.unwrap();
    assert_eq!(descriptor.crc32, written.crc32());
    assert_eq!(descriptor.compressed_size as u64, written.compressed_size());
    assert_eq!(
        descriptor.uncompressed_size as u64,
        written.uncompressed_size()
    );
}

#[test]
fn test_seekable_sink_rewrites_header_in_place() {
    let entry = data_entry("patched.txt", CompressionLevel::Default, b"payload bytes");
    let mut sink = SeekableSink::new(Cursor::new(Vec::new()));
    assert!(!sink.uses_data_descriptor());

    let written = entry.writer(false).write_to(&mut sink).unwrap();
    let mut cursor = sink.into_inner();

    // The cursor must be back at the end of the record, ready for the next
    // entry.
    let end = cursor.stream_position().unwrap();
    let output = cursor.into_inner();
    assert_eq!(end, output.len() as u64);

    let record = read_local_record(&output);
    assert_eq!(record.header.flags & 0x08, 0);
    assert_eq!(record.header.crc32, written.crc32());
    assert_eq!(record.header.compressed_size as u64, written.compressed_size());
    assert_eq!(
        record.header.uncompressed_size as u64,
        written.uncompressed_size()
    );
    assert!(record.descriptor.is_none());
    assert_eq!(inflate(&record.payload), b"payload bytes");
}

#[test]
fn test_seekable_sink_at_nonzero_offset() {
    let prefix = b"PREAMBLE";
    let mut cursor = Cursor::new(Vec::new());
    cursor.write_all(prefix).unwrap();
    cursor.seek(SeekFrom::End(0)).unwrap();

    let entry = data_entry("offset.txt", CompressionLevel::Store, b"hi there");
    let mut sink = SeekableSink::at_offset(cursor, prefix.len() as u64);
    let written = entry.writer(false).write_to(&mut sink).unwrap();

    assert_eq!(written.local_header_offset(), prefix.len() as u64);

    let output = sink.into_inner().into_inner();
    assert_eq!(&output[..prefix.len()], prefix, "preamble left untouched");

    let record = read_local_record(&output[prefix.len()..]);
    assert_eq!(record.header.crc32, crc32(b"hi there"));
    assert_eq!(record.payload, b"hi there");
}

#[test]
fn test_entries_are_written_in_order() {
    let first = data_entry("a.txt", CompressionLevel::Store, b"aaaa");
    let second = data_entry("b.txt", CompressionLevel::Store, b"bb");

    let mut sink = StreamSink::new(Vec::new());
    let written_a = first.writer(false).write_to(&mut sink).unwrap();
    let written_b = second.writer(false).write_to(&mut sink).unwrap();

    assert_eq!(written_a.local_header_offset(), 0);
    let record_a_len = LocalFileHeaderFixed::SIZE + "a.txt".len() + 4 + 16;
    assert_eq!(written_b.local_header_offset(), record_a_len as u64);

    let output = sink.into_inner();
    let record_b = read_local_record(&output[record_a_len..]);
    assert_eq!(record_b.name, "b.txt");
    assert_eq!(record_b.payload, b"bb");
}
