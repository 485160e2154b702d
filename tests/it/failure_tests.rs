use crate::data_entry;
use std::io::{self, Write};
use zipentry::{
    CompressionLevel, EntryMode, EntryName, ErrorKind, StreamSink, ZipEntry,
};

/// A destination that accepts a fixed number of bytes before failing.
struct FullDisk {
    remaining: usize,
}

impl Write for FullDisk {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "disk full"));
        }
        let accepted = buf.len().min(self.remaining);
        self.remaining -= accepted;
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_producer_failure_is_surfaced() {
    let entry = ZipEntry::from_stream_fn(
        "flaky.txt",
        true,
        Box::new(|sink| {
            sink.write_all(b"partial")?;
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "upstream gone"))
        }),
    )
    .unwrap();

    let mut sink = StreamSink::new(Vec::new());
    let err = entry.writer(false).write_to(&mut sink).unwrap_err();

    match err.kind() {
        ErrorKind::Producer(inner) => {
            assert_eq!(inner.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("expected producer failure, got {:?}", other),
    }
}

#[test]
fn test_sink_failure_is_distinguished_from_producer() {
    // Room for the header and name but not the payload, so the failure
    // surfaces mid-stream through the codec.
    let entry = data_entry("big.bin", CompressionLevel::Store, &[0xAB; 4096]);
    let mut sink = StreamSink::new(FullDisk { remaining: 40 });
    let err = entry.writer(false).write_to(&mut sink).unwrap_err();

    match err.kind() {
        ErrorKind::Sink(inner) => {
            assert_eq!(inner.kind(), io::ErrorKind::WriteZero);
        }
        other => panic!("expected sink failure, got {:?}", other),
    }
}

#[test]
fn test_sink_failure_during_header() {
    let entry = data_entry("any.txt", CompressionLevel::Store, b"x");
    let mut sink = StreamSink::new(FullDisk { remaining: 10 });
    let err = entry.writer(false).write_to(&mut sink).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Sink(_)));
}

#[test]
fn test_directory_rejects_data_producer() {
    let err = ZipEntry::new(
        EntryName::directory("dir").unwrap(),
        EntryMode::unknown(),
        zipentry::time::ZipDateTime::now(),
        CompressionLevel::Store,
        Some(Box::new(|| Ok(Vec::new()))),
        None,
        None,
    )
    .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::InvalidInput { .. }));
}

#[test]
fn test_empty_name_rejected() {
    let err = ZipEntry::from_data_fn("", true, Box::new(|| Ok(Vec::new()))).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidName { .. }));
}

#[test]
fn test_failed_write_leaves_no_finalized_record() {
    let entry = ZipEntry::from_stream_fn(
        "aborted.txt",
        true,
        Box::new(|_| Err(io::Error::new(io::ErrorKind::Other, "boom"))),
    )
    .unwrap();

    let mut sink = StreamSink::new(Vec::new());
    assert!(entry.writer(false).write_to(&mut sink).is_err());

    // The placeholder header may have been emitted, but it is never
    // finalized: crc/sizes stay zero and no data descriptor follows, so the
    // record cannot be mistaken for a valid one.
    let output = sink.into_inner();
    let header = zipentry::LocalFileHeaderFixed::parse(&output).unwrap();
    assert_eq!(header.crc32, 0);
    assert_eq!(header.uncompressed_size, 0);
    assert_eq!(header.flags & 0x08, 0x08);

    let descriptor_magic = 0x08074b50u32.to_le_bytes();
    assert!(
        !output.windows(4).any(|w| w == descriptor_magic),
        "no data descriptor may follow a failed entry"
    );
}
