//! Line oriented FASTQ source and sink.
//!
//! Records are exactly four lines: `@name`, sequence, `+`, quality. Only the
//! splitting into fields happens here; the fields themselves are not checked.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Cursor, Read, Write},
    path::Path,
};

use crate::{FastqRecord, FqcError};

use super::read_full;

type BoxedReader = Box<dyn Read + Send>;
type BoxedWriter = Box<dyn Write + Send>;

/// Shortest input niffler can sniff a format from.
const SNIFF_LEN: usize = 5;

/// Wraps `rdr` in a decompressor when its leading bytes name a known format.
///
/// Inputs shorter than the sniff window are passed through as plain text.
fn sniffed<R: Read + Send + 'static>(mut rdr: R) -> crate::Result<BoxedReader> {
    let mut prefix = [0u8; SNIFF_LEN];
    let n = read_full(&mut rdr, &mut prefix)?;
    let rdr: BoxedReader = Box::new(Cursor::new(prefix[..n].to_vec()).chain(rdr));

    #[cfg(feature = "niffler")]
    {
        if n == SNIFF_LEN {
            let (rdr, _format) = niffler::send::get_reader(rdr)?;
            return Ok(rdr);
        }
    }
    Ok(rdr)
}

/// Streaming FASTQ parser.
///
/// Line terminators (`\n` or `\r\n`) are removed from every field. Blank
/// lines are only accepted at the very end of the input, and the last line
/// may lack its terminator. A [`strict`](FastqReader::strict) reader rejects
/// both, so that every accepted input is restored byte for byte by
/// [`FastqWriter`] (up to `\r\n` becoming `\n`).
///
/// # Examples
///
/// ```rust
/// use fqc::FastqReader;
///
/// # fn main() -> fqc::Result<()> {
/// let input = b"@r1\nGATTACA\n+\nIIIIIII\n";
/// let records = FastqReader::new(&input[..]).collect::<fqc::Result<Vec<_>>>()?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].name, b"@r1");
/// # Ok(())
/// # }
/// ```
pub struct FastqReader<R: BufRead> {
    inner: R,

    /// Number of lines consumed so far
    line: usize,

    /// Number of records parsed so far
    records_read: u64,

    /// Set once the input is exhausted or an error was returned
    done: bool,

    /// Reject a missing final terminator and trailing blank lines
    strict: bool,
}

impl<R: BufRead> FastqReader<R> {
    /// Creates a lenient reader over `inner`.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: 0,
            records_read: 0,
            done: false,
            strict: false,
        }
    }

    /// Rejects input that [`FastqWriter`] could not reproduce exactly.
    ///
    /// A last line without a terminator, or blank lines after the last
    /// record, fail with [`FqcError::MalformedRecord`].
    ///
    /// ```rust
    /// use fqc::{FastqReader, FqcError};
    ///
    /// let mut reader = FastqReader::new(&b"@r1\nACGT\n+\nIIII"[..]).strict();
    /// assert!(matches!(
    ///     reader.next(),
    ///     Some(Err(FqcError::MalformedRecord { line: 4, .. }))
    /// ));
    /// ```
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Number of records parsed so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    fn read_line(&mut self) -> crate::Result<Option<Vec<u8>>> {
        let mut buffer = Vec::new();
        if self.inner.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(None);
        }
        self.line += 1;
        if buffer.last() == Some(&b'\n') {
            buffer.pop();
            if buffer.last() == Some(&b'\r') {
                buffer.pop();
            }
        } else if self.strict {
            return Err(self.malformed(self.line, "missing line terminator at end of file"));
        }
        Ok(Some(buffer))
    }

    fn malformed(&self, line: usize, reason: &'static str) -> FqcError {
        FqcError::MalformedRecord { line, reason }
    }

    fn expect_line(&mut self) -> crate::Result<Vec<u8>> {
        match self.read_line()? {
            Some(line) => Ok(line),
            None => Err(self.malformed(self.line + 1, "unexpected end of file inside record")),
        }
    }

    /// Parses the next record, or returns `Ok(None)` at the end of input.
    ///
    /// # Errors
    ///
    /// - [`FqcError::MalformedRecord`] for a record that breaks the four line layout
    /// - I/O errors from the source
    pub fn read_record(&mut self) -> crate::Result<Option<FastqRecord>> {
        let mut first_blank = None;
        let name = loop {
            match self.read_line()? {
                None => match first_blank {
                    Some(line) if self.strict => {
                        return Err(self.malformed(line, "blank line at end of file"))
                    }
                    _ => return Ok(None),
                },
                Some(line) if line.is_empty() => {
                    first_blank.get_or_insert(self.line);
                }
                Some(line) => break line,
            }
        };
        if let Some(line) = first_blank {
            return Err(self.malformed(line, "blank line between records"));
        }
        if name.first() != Some(&b'@') {
            return Err(self.malformed(self.line, "missing '@' header"));
        }

        let seq = self.expect_line()?;
        let separator = self.expect_line()?;
        if separator != b"+" {
            return Err(self.malformed(self.line, "missing '+' separator"));
        }
        let qual = self.expect_line()?;

        self.records_read += 1;
        Ok(Some(FastqRecord { name, seq, qual }))
    }
}

impl<R: BufRead> Iterator for FastqReader<R> {
    type Item = crate::Result<FastqRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FastqReader<BufReader<BoxedReader>> {
    /// Opens a FASTQ file, decompressing gzip/zstd/xz input transparently
    /// when the `niffler` feature is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its compression
    /// format is recognized but unsupported.
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(sniffed(file)?)))
    }

    /// Reads FASTQ from standard input, decompressing it like
    /// [`FastqReader::from_path`].
    pub fn from_stdin() -> crate::Result<Self> {
        Ok(Self::new(BufReader::new(sniffed(std::io::stdin())?)))
    }

    /// Reads from the file if a path is given, otherwise from standard input.
    pub fn from_optional_path<P: AsRef<Path>>(path: Option<P>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::from_stdin(),
        }
    }
}

/// Writes records back as four line FASTQ text.
pub struct FastqWriter<W: Write> {
    inner: W,
    records_written: u64,
}

impl<W: Write> FastqWriter<W> {
    /// Creates a writer over `inner`. Nothing is written until the first record.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records_written: 0,
        }
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Writes one record as `name\nseq\n+\nqual\n`.
    ///
    /// # Errors
    ///
    /// Returns [`FqcError::Io`] if the sink fails.
    pub fn write_record(&mut self, record: &FastqRecord) -> crate::Result<()> {
        self.inner.write_all(&record.name)?;
        self.inner.write_all(b"\n")?;
        self.inner.write_all(&record.seq)?;
        self.inner.write_all(b"\n+\n")?;
        self.inner.write_all(&record.qual)?;
        self.inner.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    /// Writes records in order, stopping at the first failure.
    pub fn write_batch(&mut self, records: &[FastqRecord]) -> crate::Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Flushes the sink.
    pub fn finish(&mut self) -> crate::Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl FastqWriter<BoxedWriter> {
    /// Creates (or truncates) a plain text FASTQ file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }
    pub fn from_stdout() -> Self {
        Self::new(Box::new(BufWriter::new(std::io::stdout())))
    }
    pub fn from_optional_path<P: AsRef<Path>>(path: Option<P>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::from_stdout()),
        }
    }
}

/// Groups records into batches of `size`, the last one possibly shorter.
///
/// A `size` of zero is treated as one.
pub fn chunked<I>(records: I, size: usize) -> Chunked<I::IntoIter>
where
    I: IntoIterator<Item = crate::Result<FastqRecord>>,
{
    Chunked {
        records: records.into_iter(),
        size: size.max(1),
        done: false,
    }
}

/// Iterator returned by [`chunked`].
pub struct Chunked<I> {
    records: I,
    size: usize,
    done: bool,
}

impl<I> Iterator for Chunked<I>
where
    I: Iterator<Item = crate::Result<FastqRecord>>,
{
    type Item = crate::Result<Vec<FastqRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.records.next() {
                Some(Ok(record)) => batch.push(record),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }
        (!batch.is_empty()).then_some(Ok(batch))
    }
}
