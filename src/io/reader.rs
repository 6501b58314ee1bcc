//! Reader implementations for FQC containers.
//!
//! The header is read once during construction, then chunks are pulled one
//! at a time until the stream ends cleanly at a chunk boundary.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use tracing::debug;

use crate::{Algorithm, Chunk, EncodedChunk, FqcError, Header, HEADER_SIZE, MAGIC};

use super::read_full;

type BoxedReader = Box<dyn Read + Send>;

/// Streaming reader for FQC containers.
///
/// The reader yields one [`Chunk`] per framed chunk through its `Iterator`
/// implementation. A stream that ends exactly between two chunks finishes
/// the iteration; a stream that ends anywhere else is a
/// [`FqcError::TruncatedContainer`]. After the first error the iterator is
/// fused, but every chunk yielded before it stays valid.
///
/// # Examples
///
/// ```rust
/// use fqc::{FqcError, Reader};
/// use std::io::Cursor;
///
/// # fn main() {
/// match Reader::new(Cursor::new(Vec::new())) {
///     Err(FqcError::EmptyFile) => println!("nothing to read"),
///     Err(e) => println!("Other error: {}", e),
///     Ok(_) => unreachable!(),
/// }
///
/// // A bare header is a valid, empty container
/// let reader = Reader::new(Cursor::new(b"FQC\x01".to_vec())).unwrap();
/// assert_eq!(reader.count(), 0);
/// # }
/// ```
#[derive(Clone)]
pub struct Reader<R: Read> {
    /// Inner reader providing the data stream
    inner: R,

    /// Header from the container
    header: Header,

    /// Number of chunks read so far
    chunks_read: u64,

    /// Total number of bytes consumed from the inner reader
    bytes_read: usize,

    /// Set once the end of stream or an error has been reached
    done: bool,
}
impl<R: Read> Reader<R> {
    /// Creates a new reader, reading and validating the header.
    ///
    /// # Errors
    ///
    /// - [`FqcError::EmptyFile`] if the source has no bytes at all
    /// - [`FqcError::BadMagic`] if the first bytes aren't `FQC`
    /// - [`FqcError::TruncatedContainer`] if the version byte is missing
    /// - [`FqcError::UnsupportedVersion`] if the version isn't understood
    pub fn new(mut inner: R) -> crate::Result<Self> {
        let mut header_bytes = [0u8; HEADER_SIZE];

        let magic_len = MAGIC.len();
        let n = read_full(&mut inner, &mut header_bytes[..magic_len])?;
        if n == 0 {
            return Err(FqcError::EmptyFile);
        }
        if header_bytes[..n] != MAGIC[..] || n < magic_len {
            return Err(FqcError::BadMagic {
                expected: MAGIC.to_vec(),
                actual: header_bytes[..n].to_vec(),
            });
        }
        if read_full(&mut inner, &mut header_bytes[magic_len..])? == 0 {
            return Err(FqcError::TruncatedContainer { pos: magic_len });
        }

        let header = Header::from_bytes(&header_bytes);
        header.validate()?;

        Ok(Self {
            inner,
            header,
            chunks_read: 0,
            bytes_read: HEADER_SIZE,
            done: false,
        })
    }

    /// The header read on construction.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Number of chunks read so far.
    pub fn chunks_read(&self) -> u64 {
        self.chunks_read
    }

    /// Bytes consumed so far, header included. Always a chunk boundary
    /// after a successful read.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Fills `buf` completely or fails with the offset where data ran out.
    fn read_exact_at(&mut self, buf: &mut [u8]) -> crate::Result<()> {
        let n = read_full(&mut self.inner, buf)?;
        self.bytes_read += n;
        if n < buf.len() {
            return Err(FqcError::TruncatedContainer {
                pos: self.bytes_read,
            });
        }
        Ok(())
    }

    /// Reads `len` bytes without trusting `len` for the allocation.
    fn read_vec_at(&mut self, len: usize) -> crate::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let n = (&mut self.inner).take(len as u64).read_to_end(&mut buffer)?;
        self.bytes_read += n;
        if n < len {
            return Err(FqcError::TruncatedContainer {
                pos: self.bytes_read,
            });
        }
        Ok(buffer)
    }

    fn read_u32_at(&mut self) -> crate::Result<u32> {
        let mut buffer = [0u8; 4];
        self.read_exact_at(&mut buffer)?;
        Ok(u32::from_le_bytes(buffer))
    }

    /// Reads the next chunk without decompressing its columns.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a chunk.
    pub fn read_raw_chunk(&mut self) -> crate::Result<Option<EncodedChunk>> {
        let mut n_cols = [0u8; 4];
        match read_full(&mut self.inner, &mut n_cols)? {
            0 => return Ok(None),
            4 => self.bytes_read += 4,
            n => {
                self.bytes_read += n;
                return Err(FqcError::TruncatedContainer {
                    pos: self.bytes_read,
                });
            }
        }
        let n_cols = u32::from_le_bytes(n_cols) as usize;

        let algorithms = self
            .read_vec_at(n_cols)?
            .into_iter()
            .map(Algorithm::try_from)
            .collect::<crate::Result<Vec<_>>>()?;

        let mut blobs = Vec::with_capacity(algorithms.len());
        for _ in 0..n_cols {
            let len = self.read_u32_at()? as usize;
            blobs.push(self.read_vec_at(len)?);
        }

        self.chunks_read += 1;
        EncodedChunk::from_parts(algorithms, blobs).map(Some)
    }

    /// Reads and decompresses the next chunk.
    ///
    /// Returns `Ok(None)` when the stream ends cleanly before a chunk.
    pub fn read_chunk(&mut self) -> crate::Result<Option<Chunk>> {
        let Some(encoded) = self.read_raw_chunk()? else {
            return Ok(None);
        };
        let chunk = encoded.decode()?;
        debug!(
            chunk = self.chunks_read - 1,
            rows = chunk.num_rows(),
            columns = chunk.num_columns(),
            algorithms = ?encoded.algorithms(),
            "decoded chunk"
        );
        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for Reader<R> {
    type Item = crate::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
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

impl Reader<BoxedReader> {
    /// Creates a reader from a file path.
    ///
    /// ```rust,no_run
    /// use fqc::Reader;
    ///
    /// # fn main() -> fqc::Result<()> {
    /// for chunk in Reader::from_path("reads.fqc")? {
    ///     println!("{} rows", chunk?.num_rows());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let rdr = File::open(path).map(BufReader::new)?;
        Self::new(Box::new(rdr))
    }

    /// Creates a reader from standard input.
    pub fn from_stdin() -> crate::Result<Self> {
        Self::new(Box::new(BufReader::new(std::io::stdin())))
    }

    /// Reads from the file if a path is given, otherwise from standard input.
    pub fn from_optional_path<P: AsRef<Path>>(path: Option<P>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::from_stdin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;
    use std::io::Cursor;

    fn build_chunk(offset: usize) -> Chunk {
        let names = (0..4).map(|i| format!("@r{}", offset + i).into_bytes()).collect();
        let seqs = (0..4).map(|i| b"ACGTN".repeat(i + 1)).collect();
        Chunk::new(vec![names, seqs]).unwrap()
    }

    fn create_test_data(chunks: &[Chunk], algorithms: Option<&[Algorithm]>) -> Vec<u8> {
        let mut writer = Writer::new(Vec::new()).unwrap();
        for chunk in chunks {
            writer.write_chunk(chunk, algorithms).unwrap();
        }
        writer.finish().unwrap();
        writer.into_inner()
    }

    #[test]
    fn test_reader_creation() {
        let buffer = create_test_data(&[build_chunk(0)], None);
        let reader = Reader::new(Cursor::new(buffer)).unwrap();
        assert_eq!(reader.header(), Header::new());
        assert_eq!(reader.bytes_read(), HEADER_SIZE);
    }

    #[test]
    fn test_reader_empty_file() {
        let result = Reader::new(Cursor::new(Vec::new()));
        assert!(matches!(result, Err(FqcError::EmptyFile)));
    }

    #[test]
    fn test_reader_bad_magic() {
        let result = Reader::new(Cursor::new(b"@SEQ1\nACGT\n".to_vec()));
        assert!(matches!(result, Err(FqcError::BadMagic { .. })));

        // too short to hold the magic
        let result = Reader::new(Cursor::new(b"FQ".to_vec()));
        assert!(matches!(result, Err(FqcError::BadMagic { .. })));
    }

    #[test]
    fn test_reader_missing_version() {
        let result = Reader::new(Cursor::new(b"FQC".to_vec()));
        assert!(matches!(result, Err(FqcError::TruncatedContainer { pos: 3 })));
    }

    #[test]
    fn test_reader_unsupported_version() {
        let result = Reader::new(Cursor::new(b"FQC\x02".to_vec()));
        assert!(matches!(
            result,
            Err(FqcError::UnsupportedVersion {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_reader_header_only() {
        let buffer = create_test_data(&[], None);
        let mut reader = Reader::new(Cursor::new(buffer)).unwrap();
        assert!(reader.read_chunk().unwrap().is_none());
        assert!(reader.next().is_none());
        assert_eq!(reader.chunks_read(), 0);
    }

    #[test]
    fn test_reader_iterator() {
        let chunks = vec![build_chunk(0), build_chunk(4), build_chunk(8)];
        for algorithm in Algorithm::ALL {
            let buffer = create_test_data(&chunks, Some(&[algorithm, algorithm][..]));
            let reader = Reader::new(Cursor::new(buffer)).unwrap();
            let read_chunks = reader.collect::<crate::Result<Vec<_>>>().unwrap();
            assert_eq!(read_chunks, chunks);
        }
    }

    #[test]
    fn test_reader_mixed_algorithms() {
        let chunks = vec![build_chunk(0), build_chunk(4)];
        let mut writer = Writer::new(Vec::new()).unwrap();
        writer
            .write_chunk(&chunks[0], Some(&[Algorithm::Gzip, Algorithm::Lzma][..]))
            .unwrap();
        writer
            .write_chunk(&chunks[1], Some(&[Algorithm::Zstd, Algorithm::Gzip][..]))
            .unwrap();

        let mut reader = Reader::new(Cursor::new(writer.into_inner())).unwrap();
        let first = reader.read_raw_chunk().unwrap().unwrap();
        assert_eq!(first.algorithms(), &[Algorithm::Gzip, Algorithm::Lzma]);
        assert_eq!(first.decode().unwrap(), chunks[0]);
        let second = reader.read_chunk().unwrap().unwrap();
        assert_eq!(second, chunks[1]);
        assert!(reader.read_chunk().unwrap().is_none());
        assert_eq!(reader.chunks_read(), 2);
    }

    #[test]
    fn test_reader_truncated_blob() {
        let mut buffer = create_test_data(&[build_chunk(0)], None);
        buffer.truncate(buffer.len() - 3);

        let mut reader = Reader::new(Cursor::new(buffer)).unwrap();
        let result = reader.next();
        assert!(matches!(
            result,
            Some(Err(FqcError::TruncatedContainer { .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_reader_truncated_at_every_offset() {
        let buffer = create_test_data(&[build_chunk(0)], Some(&[Algorithm::Zstd, Algorithm::Gzip][..]));
        for len in HEADER_SIZE + 1..buffer.len() {
            let mut reader = Reader::new(Cursor::new(buffer[..len].to_vec())).unwrap();
            match reader.read_chunk() {
                Err(FqcError::TruncatedContainer { pos }) => assert_eq!(pos, len),
                other => panic!("expected truncation at {len}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_reader_keeps_chunks_before_truncation() {
        let chunks = vec![build_chunk(0), build_chunk(4)];
        let mut buffer = create_test_data(&chunks, None);
        buffer.truncate(buffer.len() - 1);

        let mut reader = Reader::new(Cursor::new(buffer)).unwrap();
        assert_eq!(reader.next().unwrap().unwrap(), chunks[0]);
        assert!(matches!(
            reader.next(),
            Some(Err(FqcError::TruncatedContainer { .. }))
        ));
    }

    #[test]
    fn test_reader_unknown_algorithm() {
        let mut buffer =
            create_test_data(&[build_chunk(0)], Some(&[Algorithm::Gzip, Algorithm::Gzip][..]));
        buffer[HEADER_SIZE + 4] = 7;
        let mut reader = Reader::new(Cursor::new(buffer)).unwrap();
        assert!(matches!(
            reader.read_chunk(),
            Err(FqcError::UnknownAlgorithm(7))
        ));
    }

    #[test]
    fn test_reader_huge_length_is_truncation() {
        let mut buffer = Header::new().as_bytes().to_vec();
        buffer.extend_from_slice(&1u32.to_le_bytes());
        buffer.push(Algorithm::Zstd.tag());
        buffer.extend_from_slice(&u32::MAX.to_le_bytes());
        buffer.extend_from_slice(b"short");

        let mut reader = Reader::new(Cursor::new(buffer)).unwrap();
        assert!(matches!(
            reader.read_chunk(),
            Err(FqcError::TruncatedContainer { .. })
        ));
    }

    #[test]
    fn test_reader_row_count_mismatch() {
        let one = Algorithm::Zstd.compress(b"a").unwrap();
        let two = Algorithm::Zstd.compress(b"a\nb").unwrap();
        let encoded =
            EncodedChunk::from_parts(vec![Algorithm::Zstd, Algorithm::Zstd], vec![one, two])
                .unwrap();
        let mut writer = Writer::new(Vec::new()).unwrap();
        writer.write_encoded(&encoded).unwrap();

        let mut reader = Reader::new(Cursor::new(writer.into_inner())).unwrap();
        assert!(matches!(
            reader.read_chunk(),
            Err(FqcError::RowCountMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_reader_corrupt_payload() {
        let encoded =
            EncodedChunk::from_parts(vec![Algorithm::Lzma], vec![b"not xz".to_vec()]).unwrap();
        let mut writer = Writer::new(Vec::new()).unwrap();
        writer.write_encoded(&encoded).unwrap();

        let mut reader = Reader::new(Cursor::new(writer.into_inner())).unwrap();
        assert!(matches!(
            reader.read_chunk(),
            Err(FqcError::Decompress {
                algorithm: Algorithm::Lzma,
                ..
            })
        ));
    }

    #[test]
    fn test_reader_bytes_read_tracking() {
        let buffer = create_test_data(&[build_chunk(0), build_chunk(4)], None);
        let total = buffer.len();
        let mut reader = Reader::new(Cursor::new(buffer)).unwrap();
        while reader.read_chunk().unwrap().is_some() {}
        assert_eq!(reader.bytes_read(), total);
    }

    #[test]
    fn test_reader_clone() {
        let buffer = create_test_data(&[build_chunk(0)], None);
        let reader = Reader::new(Cursor::new(buffer)).unwrap();
        let reader_clone = reader.clone();
        assert_eq!(reader.header(), reader_clone.header());
    }
}
