//! Lazy zip archive entries and their local file record serialization.
//!
//! A [`ZipEntry`] describes one file or directory destined for a zip
//! archive without touching its content: the bytes come from a pluggable
//! [`EntrySource`] producer that runs only when the entry is serialized.
//! An [`EntryWriter`] turns the entry into its local file record (header,
//! compressed payload, finalized crc/sizes) against either a seekable or an
//! append-only [`EntrySink`], and hands back the [`WrittenEntry`] metadata a
//! central directory assembler needs. Entries copied unmodified from an
//! existing archive can skip re-encoding entirely.
//!
//! ```rust
//! use std::io::Cursor;
//! use zipentry::{SeekableSink, ZipEntry};
//!
//! let entry = ZipEntry::from_data_fn("hello.txt", true, Box::new(|| Ok(b"hi".to_vec())))?;
//! let mut sink = SeekableSink::new(Cursor::new(Vec::new()));
//! let written = entry.writer(false).write_to(&mut sink)?;
//! assert_eq!(written.uncompressed_size(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![forbid(unsafe_code)]

mod crc;
mod entry;
mod errors;
mod format;
mod level;
mod mode;
mod path;
mod source;
pub mod time;
mod writer;

pub use crc::{crc32, Crc32};
pub use entry::ZipEntry;
pub use errors::{Error, ErrorKind};
pub use format::{CompressionMethod, DataDescriptor, LocalFileHeaderFixed};
pub use level::CompressionLevel;
pub use mode::EntryMode;
pub use path::EntryName;
pub use source::{ConsumerFn, DataConsumer, DataFn, EntrySource, StreamFn};
pub use writer::{EntrySink, EntryWriter, SeekableSink, StreamSink, WrittenEntry};
