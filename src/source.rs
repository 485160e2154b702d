//! Pluggable producers of an entry's uncompressed bytes.
//!
//! A producer is never invoked when the entry is constructed. Archives may
//! enumerate thousands of entries while serializing only a few, so content
//! is materialized only when a writer (or an accessor) asks for it.

use std::io::{self, Cursor, Write};

/// Push-style producer: writes the entry's bytes into the given sink.
pub type StreamFn = Box<dyn Fn(&mut dyn Write) -> io::Result<()>>;

/// Buffer producer: returns the entry's bytes as one materialized buffer.
pub type DataFn = Box<dyn Fn() -> io::Result<Vec<u8>>>;

/// Consumer producer: feeds the entry's bytes into a [`DataConsumer`].
pub type ConsumerFn = Box<dyn Fn(&mut dyn DataConsumer) -> io::Result<()>>;

/// A lower-level consuming sink, for producers written against an external
/// byte-consumer abstraction rather than [`std::io::Write`].
pub trait DataConsumer {
    /// Accepts some bytes, returning how many were consumed.
    fn put_bytes(&mut self, buf: &[u8]) -> io::Result<usize>;
}

impl<W: Write + ?Sized> DataConsumer for W {
    fn put_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all(buf)?;
        Ok(buf.len())
    }
}

/// The single active producer of an entry's uncompressed content.
///
/// Exactly one variant is chosen at construction; directory entries have no
/// source at all. Whichever accessor is used, the underlying producer runs
/// once per call. Callers must not assume idempotent side effects when
/// invoking a stream- or consumer-backed source repeatedly.
pub enum EntrySource {
    /// Incremental push into a sink.
    Stream(StreamFn),
    /// Whole-buffer retrieval.
    Buffer(DataFn),
    /// Push into an external consumer handle.
    Consumer(ConsumerFn),
}

impl EntrySource {
    /// Picks the active producer from the canonical constructor's optional
    /// arguments: the first supplied one, in (data, stream, consumer) order,
    /// wins. The others are dropped unused.
    pub(crate) fn select(
        data: Option<DataFn>,
        stream: Option<StreamFn>,
        consumer: Option<ConsumerFn>,
    ) -> Option<EntrySource> {
        if let Some(data) = data {
            Some(EntrySource::Buffer(data))
        } else if let Some(stream) = stream {
            Some(EntrySource::Stream(stream))
        } else {
            consumer.map(EntrySource::Consumer)
        }
    }

    /// Runs the producer once, pushing every uncompressed byte into `sink`.
    ///
    /// This is the writer's view of the source: all three producer styles
    /// reduce to it.
    pub fn write_to(&self, sink: &mut dyn Write) -> io::Result<()> {
        match self {
            EntrySource::Stream(produce) => produce(sink),
            EntrySource::Buffer(produce) => {
                let data = produce()?;
                sink.write_all(&data)
            }
            EntrySource::Consumer(produce) => {
                let mut consumer: &mut dyn Write = sink;
                produce(&mut consumer)
            }
        }
    }

    /// Materializes the complete content as one buffer.
    ///
    /// Byte-identical to what [`EntrySource::write_to`] would push.
    pub fn bytes(&self) -> io::Result<Vec<u8>> {
        match self {
            EntrySource::Buffer(produce) => produce(),
            _ => {
                let mut buf = Vec::new();
                self.write_to(&mut buf)?;
                Ok(buf)
            }
        }
    }

    /// Materializes a fresh sequential, forward-only view of the content.
    pub fn reader(&self) -> io::Result<Cursor<Vec<u8>>> {
        Ok(Cursor::new(self.bytes()?))
    }
}

impl std::fmt::Debug for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let variant = match self {
            EntrySource::Stream(_) => "Stream",
            EntrySource::Buffer(_) => "Buffer",
            EntrySource::Consumer(_) => "Consumer",
        };
        f.debug_tuple(variant).field(&"..").finish()
    }
}
