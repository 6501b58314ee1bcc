//! Multi-threaded chunk compression.
//!
//! Chunks are independent once columnized, so a batch of them is split into
//! contiguous ranges and each range is compressed on its own thread. The
//! output keeps the input order and is byte-identical to compressing the
//! chunks one after another.

use std::{io::Write, thread};

use tracing::debug;

use crate::{Algorithm, Chunk, EncodedChunk, IntoFqcError, Result, SelectionStrategy, Writer};

/// Resolves a requested thread count, where zero means all available cores.
pub fn resolve_threads(num_threads: usize) -> usize {
    if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads.min(num_cpus::get())
    }
}

/// Compresses `chunks` across up to `num_threads` worker threads.
///
/// `algorithms` and `strategy` have the same meaning as in
/// [`EncodedChunk::encode`]. When several chunks fail, the error of the
/// earliest one is returned.
///
/// # Examples
///
/// ```rust
/// use fqc::{encode_chunks_parallel, Chunk, SelectionStrategy, Writer};
///
/// # fn main() -> fqc::Result<()> {
/// let chunks = (0..8)
///     .map(|i| Chunk::new(vec![vec![format!("@r{i}").into_bytes()]]))
///     .collect::<fqc::Result<Vec<_>>>()?;
///
/// let encoded = encode_chunks_parallel(&chunks, None, SelectionStrategy::Smallest, 4)?;
/// let mut writer = Writer::new(Vec::new())?;
/// for chunk in &encoded {
///     writer.write_encoded(chunk)?;
/// }
/// assert_eq!(writer.chunks_written(), 8);
/// # Ok(())
/// # }
/// ```
pub fn encode_chunks_parallel(
    chunks: &[Chunk],
    algorithms: Option<&[Algorithm]>,
    strategy: SelectionStrategy,
    num_threads: usize,
) -> Result<Vec<EncodedChunk>> {
    let batches = run_ranges(chunks, num_threads, |range| {
        encode_range(range, algorithms, strategy)
    })?;
    Ok(batches.into_iter().flatten().collect())
}

/// Compresses `chunks` in parallel and appends them to `writer` in order.
///
/// Every worker frames its range into a headless buffer using the writer's
/// selection strategy, and the buffers are then ingested one after another.
/// The result is byte-identical to [`Writer::write_iter`]. If any chunk
/// fails, nothing is written.
///
/// # Examples
///
/// ```rust
/// use fqc::{write_chunks_parallel, Chunk, Reader, Writer};
/// use std::io::Cursor;
///
/// # fn main() -> fqc::Result<()> {
/// let chunks = (0..8)
///     .map(|i| Chunk::new(vec![vec![format!("@r{i}").into_bytes()]]))
///     .collect::<fqc::Result<Vec<_>>>()?;
///
/// let mut writer = Writer::new(Vec::new())?;
/// write_chunks_parallel(&mut writer, &chunks, None, 4)?;
/// assert_eq!(writer.chunks_written(), 8);
///
/// let reader = Reader::new(Cursor::new(writer.into_inner()))?;
/// assert_eq!(reader.collect::<fqc::Result<Vec<_>>>()?, chunks);
/// # Ok(())
/// # }
/// ```
pub fn write_chunks_parallel<W: Write>(
    writer: &mut Writer<W>,
    chunks: &[Chunk],
    algorithms: Option<&[Algorithm]>,
    num_threads: usize,
) -> Result<()> {
    let strategy = writer.selection();
    let parts = run_ranges(chunks, num_threads, |range| {
        let mut part = Writer::new_headless(Vec::new()).with_selection(strategy);
        part.write_iter(range, algorithms)?;
        Ok(part)
    })?;
    for mut part in parts {
        writer.ingest(&mut part)?;
    }
    Ok(())
}

/// Compresses `chunks` one after another on the current thread.
fn encode_range(
    chunks: &[Chunk],
    algorithms: Option<&[Algorithm]>,
    strategy: SelectionStrategy,
) -> Result<Vec<EncodedChunk>> {
    chunks
        .iter()
        .map(|chunk| EncodedChunk::encode(chunk, algorithms, strategy))
        .collect()
}

/// Runs `work` over contiguous ranges of `chunks`, one range per thread,
/// and returns the per-range results in input order.
fn run_ranges<T, F>(chunks: &[Chunk], num_threads: usize, work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&[Chunk]) -> Result<T> + Sync,
{
    if chunks.is_empty() {
        return Ok(Vec::new());
    }
    let num_threads = resolve_threads(num_threads).min(chunks.len());
    if num_threads <= 1 {
        return Ok(vec![work(chunks)?]);
    }

    let per_thread = chunks.len().div_ceil(num_threads);
    debug!(
        chunks = chunks.len(),
        threads = num_threads,
        per_thread,
        "encoding chunks in parallel"
    );

    let work = &work;
    thread::scope(|scope| {
        let handles = chunks
            .chunks(per_thread)
            .map(|range| scope.spawn(move || work(range)))
            .collect::<Vec<_>>();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.join() {
                Ok(result) => results.push(result?),
                Err(_) => {
                    return Err(std::io::Error::other("chunk encoding thread panicked")
                        .into_fqc_error())
                }
            }
        }
        Ok(results)
    })
}
