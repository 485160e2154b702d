use quickcheck_macros::quickcheck;
use std::io::{self, Cursor, Read};
use zipentry::{
    crc32, CompressionLevel, DataConsumer, DataDescriptor, EntryMode, EntryName,
    LocalFileHeaderFixed, SeekableSink, StreamSink, ZipEntry,
};

mod failure_tests;
mod sink_tests;

/// One decoded local file record, pulled back out of raw sink output.
pub struct LocalRecord {
    pub header: LocalFileHeaderFixed,
    pub name: String,
    pub payload: Vec<u8>,
    pub descriptor: Option<DataDescriptor>,
}

/// Splits a single-entry byte stream into header, name, payload, and the
/// trailing data descriptor when general purpose bit 3 is set.
pub fn read_local_record(bytes: &[u8]) -> LocalRecord {
    let header = LocalFileHeaderFixed::parse(bytes).unwrap();
    let name_end = LocalFileHeaderFixed::SIZE + header.variable_length();
    let name = String::from_utf8(bytes[LocalFileHeaderFixed::SIZE..name_end].to_vec()).unwrap();

    let has_descriptor = header.flags & 0x08 != 0;
    let payload_end = if has_descriptor {
        bytes.len() - DataDescriptor::SIZE
    } else {
        name_end + header.compressed_size as usize
    };
    let payload = bytes[name_end..payload_end].to_vec();

    let descriptor = has_descriptor.then(|| {
        let d = &bytes[payload_end..];
        assert_eq!(&d[0..4], &0x08074b50u32.to_le_bytes(), "descriptor magic");
        DataDescriptor {
            crc32: u32::from_le_bytes([d[4], d[5], d[6], d[7]]),
            compressed_size: u32::from_le_bytes([d[8], d[9], d[10], d[11]]),
            uncompressed_size: u32::from_le_bytes([d[12], d[13], d[14], d[15]]),
        }
    });

    LocalRecord {
        header,
        name,
        payload,
        descriptor,
    }
}

pub fn inflate(payload: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::new();
    flate2::read::DeflateDecoder::new(payload)
        .read_to_end(&mut decoded)
        .unwrap();
    decoded
}

pub fn data_entry(name: &str, level: CompressionLevel, content: &'static [u8]) -> ZipEntry {
    ZipEntry::new(
        EntryName::file(name).unwrap(),
        EntryMode::new(0o644),
        zipentry::time::ZipDateTime::from_components(2024, 6, 15, 10, 30, 44).unwrap(),
        level,
        Some(Box::new(move || Ok(content.to_vec()))),
        None,
        None,
    )
    .unwrap()
}

#[test]
fn test_hello_deflate_scenario() {
    let _ = env_logger::builder().is_test(true).try_init();

    let entry = data_entry("hello.txt", CompressionLevel::Default, b"hi");
    let mut sink = StreamSink::new(Vec::new());
    let written = entry.writer(false).write_to(&mut sink).unwrap();
    let output = sink.into_inner();

    let record = read_local_record(&output);
    assert_eq!(record.name, "hello.txt");
    assert_eq!(record.header.compression_method, 8);

    let expected_crc = crc32(b"hi");
    assert_ne!(expected_crc, 0);
    assert_eq!(written.crc32(), expected_crc);
    assert_eq!(written.uncompressed_size(), 2);
    assert_eq!(written.compressed_size(), record.payload.len() as u64);
    assert_eq!(written.mode(), 0o100644);
    assert_eq!(written.external_attributes(), 0o100644 << 16);

    assert_eq!(inflate(&record.payload), b"hi");

    let descriptor = record.descriptor.expect("stream sink uses a descriptor");
    assert_eq!(descriptor.crc32, expected_crc);
    assert_eq!(descriptor.uncompressed_size, 2);
    assert_eq!(
        descriptor.compressed_size as usize,
        record.payload.len()
    );
}

#[test]
fn test_store_sizes_equal() {
    let entry = data_entry("store.bin", CompressionLevel::Store, b"uncompressed bytes");
    let mut sink = StreamSink::new(Vec::new());
    let written = entry.writer(false).write_to(&mut sink).unwrap();

    assert_eq!(written.compressed_size(), written.uncompressed_size());
    assert_eq!(written.uncompressed_size(), 18);

    let record = read_local_record(&sink.into_inner());
    assert_eq!(record.header.compression_method, 0);
    assert_eq!(record.payload, b"uncompressed bytes");
}

#[test]
fn test_zero_byte_file_compressed() {
    let entry = data_entry("empty.txt", CompressionLevel::Default, b"");
    let mut sink = StreamSink::new(Vec::new());
    let written = entry.writer(false).write_to(&mut sink).unwrap();

    assert_eq!(written.uncompressed_size(), 0);
    assert_eq!(written.crc32(), 0);

    // Deflate of nothing is still a well-formed empty-payload stream.
    let record = read_local_record(&sink.into_inner());
    assert_eq!(record.header.compression_method, 8);
    assert!(!record.payload.is_empty());
    assert_eq!(inflate(&record.payload), b"");
}

#[test]
fn test_directory_entry() {
    let entry = ZipEntry::directory("assets/images").unwrap();
    assert!(entry.is_dir());
    assert!(!entry.compressed());
    assert!(entry.data().is_none());
    assert!(entry.reader().is_none());

    let mut sink = StreamSink::new(Vec::new());
    let written = entry.writer(false).write_to(&mut sink).unwrap();

    assert_eq!(written.crc32(), 0);
    assert_eq!(written.compressed_size(), 0);
    assert_eq!(written.uncompressed_size(), 0);

    let output = sink.into_inner();
    let record = read_local_record(&output);
    assert_eq!(record.name, "assets/images/");
    assert_eq!(record.header.compression_method, 0);
    assert!(record.payload.is_empty());
    assert!(record.descriptor.is_none(), "directories have known sizes");
    assert_eq!(
        output.len(),
        LocalFileHeaderFixed::SIZE + record.name.len()
    );
}

#[test]
fn test_compression_level_efforts_round_trip() {
    let content = b"abababababababababababababab ministry of redundancy ministry";
    for level in [
        CompressionLevel::Precise(1),
        CompressionLevel::Precise(9),
        CompressionLevel::Default,
    ] {
        let entry = data_entry("leveled.txt", level, content);
        let mut sink = StreamSink::new(Vec::new());
        let written = entry.writer(false).write_to(&mut sink).unwrap();
        let record = read_local_record(&sink.into_inner());

        assert_eq!(inflate(&record.payload), content);
        assert_eq!(written.crc32(), crc32(content));
        assert!(written.compressed_size() < written.uncompressed_size());
    }
}

#[test]
fn test_losing_producers_never_run() {
    use std::cell::Cell;
    use std::rc::Rc;

    let stream_calls = Rc::new(Cell::new(0u32));
    let counter = stream_calls.clone();

    let entry = ZipEntry::new(
        EntryName::file("winner.txt").unwrap(),
        EntryMode::unknown(),
        zipentry::time::ZipDateTime::now(),
        CompressionLevel::Store,
        Some(Box::new(|| Ok(b"from buffer".to_vec()))),
        Some(Box::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        })),
        None,
    )
    .unwrap();

    let mut sink = StreamSink::new(Vec::new());
    entry.writer(false).write_to(&mut sink).unwrap();

    let record = read_local_record(&sink.into_inner());
    assert_eq!(record.payload, b"from buffer");
    assert_eq!(stream_calls.get(), 0, "stream producer must never run");
}

#[test]
fn test_entry_accessors_match_written_payload() {
    let entry = data_entry("view.txt", CompressionLevel::Default, b"same bytes");

    assert_eq!(entry.data().unwrap().unwrap(), b"same bytes");

    let mut via_reader = Vec::new();
    entry
        .reader()
        .unwrap()
        .unwrap()
        .read_to_end(&mut via_reader)
        .unwrap();
    assert_eq!(via_reader, b"same bytes");

    let mut via_consumer = Vec::new();
    entry.write_data(&mut via_consumer).unwrap().unwrap();
    assert_eq!(via_consumer, b"same bytes");
}

#[test]
fn test_write_data_drives_partial_consumers() {
    struct Trickle {
        received: Vec<u8>,
    }

    // Accepts at most 4 bytes per call; the unconsumed tail must be
    // re-offered until the buffer is drained.
    impl DataConsumer for Trickle {
        fn put_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
            let taken = buf.len().min(4);
            self.received.extend_from_slice(&buf[..taken]);
            Ok(taken)
        }
    }

    let entry = data_entry("trickle.txt", CompressionLevel::Store, b"0123456789");
    let mut consumer = Trickle { received: Vec::new() };
    entry.write_data(&mut consumer).unwrap().unwrap();
    assert_eq!(consumer.received, b"0123456789");
}

#[test]
fn test_write_data_rejects_stalled_consumer() {
    struct Stalled;

    impl DataConsumer for Stalled {
        fn put_bytes(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    let entry = data_entry("stalled.txt", CompressionLevel::Store, b"bytes");
    let err = entry.write_data(&mut Stalled).unwrap().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WriteZero);
}

#[quickcheck]
fn test_deflate_round_trips(data: Vec<u8>) -> bool {
    let entry = ZipEntry::new(
        EntryName::file("random.bin").unwrap(),
        EntryMode::unknown(),
        zipentry::time::ZipDateTime::now(),
        CompressionLevel::Default,
        Some(Box::new(move || Ok(data.clone()))),
        None,
        None,
    )
    .unwrap();

    let mut sink = SeekableSink::new(Cursor::new(Vec::new()));
    let written = entry.writer(false).write_to(&mut sink).unwrap();
    let output = sink.into_inner().into_inner();

    let record = read_local_record(&output);
    let decoded = inflate(&record.payload);

    written.crc32() == crc32(&decoded)
        && record.header.crc32 == written.crc32()
        && written.uncompressed_size() == decoded.len() as u64
}
