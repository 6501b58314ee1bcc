//! Writer implementations for FQC containers.
//!
//! The writer is a forward-only state machine: the header goes out on
//! construction, then any number of chunks, then [`Writer::finish`].

use std::{fs::File, io::Write, path::Path};

use tracing::{debug, warn};

use crate::{Algorithm, Chunk, EncodedChunk, Header, SelectionStrategy, HEADER_SIZE};

pub type BoxedWriter = Box<dyn Write + Send>;

/// Streaming writer for FQC containers.
///
/// Each chunk is compressed fully in memory before any of its bytes reach
/// the sink, so a failing chunk leaves the stream at the previous chunk
/// boundary.
///
/// # Examples
///
/// ```rust
/// use fqc::{Algorithm, Chunk, Reader, Writer};
/// use std::io::Cursor;
///
/// # fn main() -> fqc::Result<()> {
/// let chunk = Chunk::new(vec![
///     vec![b"1".to_vec(), b"2".to_vec()],
///     vec![b"a".to_vec(), b"b".to_vec()],
/// ])?;
///
/// let mut writer = Writer::new(Vec::new())?;
/// writer.write_chunk(&chunk, Some(&[Algorithm::Zstd, Algorithm::Gzip][..]))?;
/// writer.write_chunk(&chunk, None)?; // pick the smallest per column
/// writer.finish()?;
///
/// let reader = Reader::new(Cursor::new(writer.into_inner()))?;
/// let chunks = reader.collect::<fqc::Result<Vec<_>>>()?;
/// assert_eq!(chunks, vec![chunk.clone(), chunk]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Writer<W: Write> {
    /// Inner writer providing the data sink
    inner: W,

    /// How algorithms are picked when a chunk comes without a list
    strategy: SelectionStrategy,

    /// Number of chunks written so far
    chunks_written: u64,

    /// Number of bytes written so far, header included
    bytes_written: usize,
}

impl<W: Write> Writer<W> {
    /// Creates a new writer and writes the container header.
    pub fn new(mut inner: W) -> crate::Result<Self> {
        let header = Header::new();
        inner.write_all(header.as_bytes())?;
        Ok(Self {
            inner,
            strategy: SelectionStrategy::default(),
            chunks_written: 0,
            bytes_written: HEADER_SIZE,
        })
    }

    /// Creates a new writer without writing a header.
    ///
    /// Useful for framing chunks into a side buffer that is later merged into
    /// a full container with [`Writer::ingest`].
    pub fn new_headless(inner: W) -> Self {
        Self {
            inner,
            strategy: SelectionStrategy::default(),
            chunks_written: 0,
            bytes_written: 0,
        }
    }

    /// Sets how algorithms are picked for chunks written without a list.
    pub fn with_selection(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Current selection strategy.
    pub fn selection(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Number of chunks written so far.
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// Number of bytes written so far, including the header unless headless.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Compresses and writes a chunk.
    ///
    /// With `algorithms` set, column `i` is compressed with `algorithms[i]`.
    /// Without it, every column is assigned an algorithm independently for
    /// this chunk.
    ///
    /// A chunk without rows is skipped: a column with no items can't be told
    /// apart from a column holding a single empty item once framed.
    ///
    /// # Errors
    ///
    /// - [`FqcError::ColumnCountMismatch`](crate::FqcError::ColumnCountMismatch) if the list length differs from the column count
    /// - [`FqcError::InvalidItem`](crate::FqcError::InvalidItem) if any item contains a line-feed
    /// - I/O errors from the sink
    pub fn write_chunk(
        &mut self,
        chunk: &Chunk,
        algorithms: Option<&[Algorithm]>,
    ) -> crate::Result<()> {
        if chunk.is_empty() {
            warn!(
                chunk = self.chunks_written,
                columns = chunk.num_columns(),
                "skipping chunk without rows"
            );
            return Ok(());
        }
        let encoded = EncodedChunk::encode(chunk, algorithms, self.strategy)?;
        debug!(
            chunk = self.chunks_written,
            rows = chunk.num_rows(),
            columns = chunk.num_columns(),
            algorithms = ?encoded.algorithms(),
            "encoded chunk"
        );
        self.write_encoded(&encoded)
    }

    /// Writes a chunk that was already compressed.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, or with `InvalidInput` if a length does not fit
    /// in a `u32`. Nothing is written for the chunk in the latter case.
    pub fn write_encoded(&mut self, chunk: &EncodedChunk) -> crate::Result<()> {
        chunk.write_bytes(&mut self.inner)?;
        self.chunks_written += 1;
        self.bytes_written += chunk.encoded_len();
        Ok(())
    }

    /// Writes every chunk yielded by an iterator, stopping at the first error.
    pub fn write_iter<'a, I>(
        &mut self,
        chunks: I,
        algorithms: Option<&[Algorithm]>,
    ) -> crate::Result<()>
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        for chunk in chunks {
            self.write_chunk(chunk, algorithms)?;
        }
        Ok(())
    }

    /// Moves the chunks framed by a headless writer into this one.
    ///
    /// The other writer's buffer is cleared afterwards.
    pub fn ingest(&mut self, other: &mut Writer<Vec<u8>>) -> crate::Result<()> {
        self.inner.write_all(&other.inner)?;
        self.chunks_written += other.chunks_written;
        self.bytes_written += other.inner.len();
        other.inner.clear();
        other.chunks_written = 0;
        other.bytes_written = 0;
        Ok(())
    }

    /// Flushes the sink. No chunk may be written afterwards.
    pub fn finish(&mut self) -> crate::Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl Writer<BoxedWriter> {
    /// Creates a writer that writes to a file at the specified path.
    ///
    /// ```rust,no_run
    /// use fqc::Writer;
    ///
    /// # fn main() -> fqc::Result<()> {
    /// let mut writer = Writer::from_path("reads.fqc")?;
    /// writer.finish()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::create(path)?;
        Self::new(Box::new(std::io::BufWriter::new(file)))
    }
    /// Creates a writer that writes to standard output.
    pub fn from_stdout() -> crate::Result<Self> {
        Self::new(Box::new(std::io::BufWriter::new(std::io::stdout())))
    }
    /// Writes to the file if a path is given, otherwise to standard output.
    pub fn from_optional_path<P: AsRef<Path>>(path: Option<P>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::from_stdout(),
        }
    }
}
