//! # fqc - Columnar compression for FASTQ files
//!
//! `fqc` stores FASTQ records in a chunked binary container. Records are
//! grouped into chunks, every chunk is split into three columns (names,
//! sequences, qualities) and each column is compressed on its own with gzip,
//! xz or zstd, whichever suits that column best.
//!
//! A compact 3-bit packing of DNA bases is available in the [`dna`] module.
//!
//! ## Format Specification
//!
//! ```text
//! container := magic("FQC") version(0x01) chunk*
//! chunk     := n_cols(u32) tag(u8){n_cols} blob{n_cols}
//! blob      := length(u32) payload(length bytes)
//! tag       := 0 = gzip | 1 = xz | 2 = zstd
//! ```
//!
//! Integers are little-endian. A column payload is the column's items joined
//! by `\n` and compressed with the algorithm named by its tag.
//!
//! ## Basic Usage
//!
//! ### Writing and Reading Chunks
//!
//! ```rust
//! use fqc::{columnize, decolumnize, Algorithm, FastqRecord, Reader, Writer};
//! use std::io::Cursor;
//!
//! # fn main() -> fqc::Result<()> {
//! let records = vec![
//!     FastqRecord::new("@seq1", "GATTACA", "IIIIIII"),
//!     FastqRecord::new("@seq2", "NNNNAAA", "#######"),
//! ];
//!
//! let mut writer = Writer::new(Vec::new())?;
//! writer.write_chunk(
//!     &columnize(records.clone()),
//!     Some(&[Algorithm::Zstd, Algorithm::Lzma, Algorithm::Gzip][..]),
//! )?;
//! writer.finish()?;
//!
//! let mut reader = Reader::new(Cursor::new(writer.into_inner()))?;
//! let chunk = reader.read_chunk()?.expect("one chunk");
//! assert_eq!(decolumnize(chunk)?, records);
//! assert!(reader.read_chunk()?.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! ### Whole Files
//!
//! ```rust,no_run
//! use fqc::{compress_fastq, decompress_fastq, CompressOptions, SelectionStrategy};
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//!
//! # fn main() -> fqc::Result<()> {
//! let options = CompressOptions::builder()
//!     .chunk_size(10_000)
//!     .selection(SelectionStrategy::Smallest)
//!     .threads(4)
//!     .build()?;
//!
//! let source = BufReader::new(File::open("reads.fastq")?);
//! let sink = BufWriter::new(File::create("reads.fqc")?);
//! compress_fastq(source, sink, &options)?;
//!
//! let restored = BufWriter::new(File::create("restored.fastq")?);
//! decompress_fastq(File::open("reads.fqc")?, restored)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, FqcError>`](Result). Truncated or
//! corrupted containers surface as distinct variants such as
//! [`FqcError::TruncatedContainer`] or [`FqcError::Decompress`].
//!
//! ## Logging
//!
//! Events are emitted through [`tracing`](https://docs.rs/tracing); install a
//! subscriber to see them.
//!
//! ## Features
//!
//! - `niffler` (default): transparent decompression of FASTQ input opened by path
//! - `serde` (default): serialization support for the public option types

pub mod dna;

mod column;
mod constructs;
mod error;
mod io;
mod parallel;
mod pipeline;

pub use column::{
    compress_column, decompress_column, select_algorithm, select_best_algorithm,
    SelectionStrategy, SEPARATOR,
};
pub use constructs::{
    columnize, decolumnize, Algorithm, AlgorithmChoice, Chunk, Column, EncodedChunk,
    FastqRecord, Header, HEADER_SIZE, LZMA_PRESET, MAGIC, NUM_FIELDS, VERSION, ZSTD_LEVEL,
};
pub use error::{FqcError, IntoFqcError, Result};
pub use io::{chunked, BoxedWriter, Chunked, FastqReader, FastqWriter, Reader, Writer};
pub use parallel::{encode_chunks_parallel, resolve_threads, write_chunks_parallel};
pub use pipeline::{
    compress_fastq, decompress_fastq, CompressOptions, CompressOptionsBuilder, Stats,
    DEFAULT_CHUNK_SIZE,
};
