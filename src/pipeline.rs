//! FASTQ to FQC and back.
//!
//! Compression reads records, groups them into chunks of `chunk_size`,
//! columnizes every chunk and frames it into the container. Decompression
//! walks the container and writes the records back out as FASTQ text.

use std::io::{BufRead, Read, Write};

use tracing::info;

use crate::{
    chunked, columnize, decolumnize, parallel::resolve_threads, write_chunks_parallel, Algorithm,
    AlgorithmChoice, FastqReader, FastqWriter, FqcError, Reader, Result, SelectionStrategy,
    Writer, NUM_FIELDS,
};

/// Number of records per chunk unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Settings for [`compress_fastq`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressOptions {
    /// Records per chunk
    pub chunk_size: usize,

    /// Per column algorithms, or per chunk selection
    pub algorithms: AlgorithmChoice,

    /// How selection resolves when `algorithms` is [`AlgorithmChoice::Best`]
    pub selection: SelectionStrategy,

    /// Worker threads for compression (0 = all cores)
    pub threads: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithms: AlgorithmChoice::Best,
            selection: SelectionStrategy::Smallest,
            threads: 1,
        }
    }
}

impl CompressOptions {
    /// Starts from the defaults.
    pub fn builder() -> CompressOptionsBuilder {
        CompressOptionsBuilder::default()
    }

    /// Checks the options against the FASTQ column layout.
    ///
    /// # Errors
    ///
    /// - [`FqcError::InvalidChunkSize`] if `chunk_size` is zero
    /// - [`FqcError::ColumnCountMismatch`] if a fixed algorithm list doesn't have one entry per FASTQ field
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FqcError::InvalidChunkSize);
        }
        if let Some(algorithms) = self.algorithms.fixed() {
            if algorithms.len() != NUM_FIELDS {
                return Err(FqcError::ColumnCountMismatch {
                    expected: NUM_FIELDS,
                    actual: algorithms.len(),
                });
            }
        }
        Ok(())
    }
}

/// Fluent construction of [`CompressOptions`].
///
/// # Examples
///
/// ```rust
/// use fqc::{Algorithm, CompressOptions, SelectionStrategy};
///
/// let options = CompressOptions::builder()
///     .chunk_size(500)
///     .fixed_algorithms([Algorithm::Zstd, Algorithm::Lzma, Algorithm::Lzma])
///     .threads(4)
///     .build()
///     .unwrap();
/// assert_eq!(options.chunk_size, 500);
/// assert_eq!(options.selection, SelectionStrategy::Smallest);
///
/// assert!(CompressOptions::builder().chunk_size(0).build().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CompressOptionsBuilder {
    options: CompressOptions,
}

impl CompressOptionsBuilder {
    /// Records per chunk. Must be positive.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.options.chunk_size = chunk_size;
        self
    }

    /// Fixed per column algorithms or per chunk selection.
    pub fn algorithms(mut self, algorithms: AlgorithmChoice) -> Self {
        self.options.algorithms = algorithms;
        self
    }

    /// Uses the same algorithms for every chunk: name, sequence, quality.
    pub fn fixed_algorithms<I: IntoIterator<Item = Algorithm>>(self, algorithms: I) -> Self {
        self.algorithms(AlgorithmChoice::Fixed(algorithms.into_iter().collect()))
    }

    /// Selection strategy for [`AlgorithmChoice::Best`].
    pub fn selection(mut self, selection: SelectionStrategy) -> Self {
        self.options.selection = selection;
        self
    }

    /// Worker threads, where zero means all cores.
    pub fn threads(mut self, threads: usize) -> Self {
        self.options.threads = threads;
        self
    }

    /// Validates and returns the options.
    ///
    /// # Errors
    ///
    /// Same as [`CompressOptions::validate`].
    pub fn build(self) -> Result<CompressOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}

/// Totals for one compression or decompression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stats {
    /// FASTQ records read or written
    pub records: u64,

    /// Container chunks written or read
    pub chunks: u64,
}

/// Compresses FASTQ text from `source` into an FQC container on `sink`.
///
/// The input is parsed with a [strict](FastqReader::strict) reader, so every
/// line must end in a terminator and no blank lines may follow the last
/// record. `\r\n` terminators are accepted and restored as `\n`.
///
/// # Errors
///
/// - option errors from [`CompressOptions::validate`], before anything is written
/// - [`FqcError::MalformedRecord`] for input that is not four line FASTQ
/// - [`FqcError::InvalidItem`] and I/O errors from the container writer
///
/// # Examples
///
/// ```rust
/// use fqc::{compress_fastq, decompress_fastq, CompressOptions};
///
/// # fn main() -> fqc::Result<()> {
/// let fastq = b"@r1\nGATTACA\n+\nIIIIIII\n@r2\nNNNNAAA\n+\n#######\n";
///
/// let mut container = Vec::new();
/// let stats = compress_fastq(&fastq[..], &mut container, &CompressOptions::default())?;
/// assert_eq!(stats.records, 2);
///
/// let mut restored = Vec::new();
/// decompress_fastq(&container[..], &mut restored)?;
/// assert_eq!(restored, fastq);
/// # Ok(())
/// # }
/// ```
pub fn compress_fastq<R, W>(source: R, sink: W, options: &CompressOptions) -> Result<Stats>
where
    R: BufRead,
    W: Write,
{
    options.validate()?;
    let algorithms = options.algorithms.fixed();
    let threads = resolve_threads(options.threads);

    let mut writer = Writer::new(sink)?.with_selection(options.selection);
    let mut batches = chunked(FastqReader::new(source).strict(), options.chunk_size);
    let mut stats = Stats::default();

    if threads <= 1 {
        for batch in batches {
            let batch = batch?;
            stats.records += batch.len() as u64;
            writer.write_chunk(&columnize(batch), algorithms)?;
        }
    } else {
        loop {
            let mut pending = Vec::with_capacity(threads);
            for batch in batches.by_ref().take(threads) {
                let batch = batch?;
                stats.records += batch.len() as u64;
                pending.push(columnize(batch));
            }
            if pending.is_empty() {
                break;
            }
            write_chunks_parallel(&mut writer, &pending, algorithms, threads)?;
        }
    }
    writer.finish()?;
    stats.chunks = writer.chunks_written();

    info!(
        records = stats.records,
        chunks = stats.chunks,
        bytes = writer.bytes_written(),
        threads,
        "compressed FASTQ"
    );
    Ok(stats)
}

/// Restores FASTQ text from an FQC container.
///
/// Records of every chunk are written as soon as the chunk is decoded, so on
/// error the sink holds all records of the chunks before the failing one.
///
/// # Errors
///
/// - any container error from [`Reader`]
/// - [`FqcError::ColumnCountMismatch`] for chunks without exactly three columns
/// - I/O errors from the sink
pub fn decompress_fastq<R, W>(source: R, sink: W) -> Result<Stats>
where
    R: Read,
    W: Write,
{
    let mut reader = Reader::new(source)?;
    let mut writer = FastqWriter::new(sink);
    let mut stats = Stats::default();

    for chunk in reader.by_ref() {
        let records = decolumnize(chunk?)?;
        writer.write_batch(&records)?;
        stats.chunks += 1;
    }
    writer.finish()?;
    stats.records = writer.records_written();

    info!(
        records = stats.records,
        chunks = stats.chunks,
        bytes = reader.bytes_read(),
        "decompressed FASTQ"
    );
    Ok(stats)
}
