use std::io::Write;

use crate::{
    column::{compress_best, compress_column, decompress_column, SelectionStrategy},
    Algorithm, FqcError,
};

/// One field across all the records of a chunk.
pub type Column = Vec<Vec<u8>>;

/// A group of columns sharing the same number of rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    columns: Vec<Column>,
}
impl Chunk {
    /// Builds a chunk, checking that every column has the same number of rows.
    pub fn new(columns: Vec<Column>) -> crate::Result<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(column) = columns.iter().find(|column| column.len() != expected) {
                return Err(FqcError::RowCountMismatch {
                    expected,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns })
    }
    pub(crate) fn from_equal_columns(columns: Vec<Column>) -> Self {
        debug_assert!(columns.windows(2).all(|pair| pair[0].len() == pair[1].len()));
        Self { columns }
    }
    /// Number of columns, one per record field.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
    /// Number of rows, zero for a chunk without columns.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
    /// Returns true if the chunk holds no rows.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }
    /// All columns, in field order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    /// Returns the column at `idx`, or `None` past the last column.
    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }
    /// Consumes the chunk, returning its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }
}

/// A chunk whose columns have been compressed and tagged.
///
/// This is exactly what a chunk looks like on the wire, held in memory so it
/// can be built away from the writer and framed later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    algorithms: Vec<Algorithm>,
    blobs: Vec<Vec<u8>>,
}
impl EncodedChunk {
    /// Compresses every column of `chunk`.
    ///
    /// With `algorithms` set, column `i` uses `algorithms[i]`; otherwise each
    /// column is measured and assigned an algorithm with `strategy`.
    ///
    /// # Errors
    ///
    /// - [`FqcError::ColumnCountMismatch`] if `algorithms` doesn't have one entry per column
    /// - [`FqcError::InvalidItem`] if any item contains a line-feed
    pub fn encode(
        chunk: &Chunk,
        algorithms: Option<&[Algorithm]>,
        strategy: SelectionStrategy,
    ) -> crate::Result<Self> {
        match algorithms {
            Some(algorithms) if algorithms.len() != chunk.num_columns() => {
                Err(FqcError::ColumnCountMismatch {
                    expected: chunk.num_columns(),
                    actual: algorithms.len(),
                })
            }
            Some(algorithms) => {
                let blobs = chunk
                    .columns()
                    .iter()
                    .zip(algorithms)
                    .map(|(column, algorithm)| compress_column(column, *algorithm))
                    .collect::<crate::Result<Vec<_>>>()?;
                Ok(Self {
                    algorithms: algorithms.to_vec(),
                    blobs,
                })
            }
            None => {
                let (algorithms, blobs) = chunk
                    .columns()
                    .iter()
                    .map(|column| compress_best(column, strategy))
                    .collect::<crate::Result<Vec<_>>>()?
                    .into_iter()
                    .unzip();
                Ok(Self { algorithms, blobs })
            }
        }
    }

    /// Pairs tags with payloads, which must have the same length.
    ///
    /// # Errors
    ///
    /// Returns [`FqcError::ColumnCountMismatch`] if the lengths differ.
    pub fn from_parts(algorithms: Vec<Algorithm>, blobs: Vec<Vec<u8>>) -> crate::Result<Self> {
        if algorithms.len() != blobs.len() {
            return Err(FqcError::ColumnCountMismatch {
                expected: algorithms.len(),
                actual: blobs.len(),
            });
        }
        Ok(Self { algorithms, blobs })
    }

    /// Decompresses every column back into a [`Chunk`].
    ///
    /// # Errors
    ///
    /// - [`FqcError::Decompress`] if a payload is rejected by its algorithm
    /// - [`FqcError::RowCountMismatch`] if the columns decode to different lengths
    pub fn decode(&self) -> crate::Result<Chunk> {
        let columns = self
            .blobs
            .iter()
            .zip(&self.algorithms)
            .map(|(blob, algorithm)| decompress_column(blob, *algorithm))
            .collect::<crate::Result<Vec<_>>>()?;
        Chunk::new(columns)
    }

    /// Number of compressed columns.
    pub fn num_columns(&self) -> usize {
        self.algorithms.len()
    }
    /// Algorithm of each column, in column order.
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }
    /// Compressed payload of each column, in column order.
    pub fn blobs(&self) -> &[Vec<u8>] {
        &self.blobs
    }

    /// Size of the framed chunk in bytes.
    pub fn encoded_len(&self) -> usize {
        4 + self.algorithms.len() + self.blobs.iter().map(|blob| 4 + blob.len()).sum::<usize>()
    }

    /// Frames the chunk: column count, one tag per column, then each blob
    /// behind its length. Integers are little-endian `u32`.
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> crate::Result<()> {
        let lens = self
            .blobs
            .iter()
            .map(|blob| to_u32(blob.len()))
            .collect::<crate::Result<Vec<_>>>()?;
        let mut frame = Vec::with_capacity(4 + self.algorithms.len());
        frame.extend_from_slice(&to_u32(self.algorithms.len())?.to_le_bytes());
        frame.extend(self.algorithms.iter().map(|algorithm| algorithm.tag()));
        writer.write_all(&frame)?;
        for (len, blob) in lens.iter().zip(&self.blobs) {
            writer.write_all(&len.to_le_bytes())?;
            writer.write_all(blob)?;
        }
        Ok(())
    }
}

fn to_u32(len: usize) -> crate::Result<u32> {
    u32::try_from(len).map_err(|_| {
        FqcError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("length {len} does not fit in a u32 field"),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_chunk() -> Chunk {
        Chunk::new(vec![
            vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec(), b"4".to_vec()],
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()],
        ])
        .unwrap()
    }

    #[test]
    fn test_chunk_shape() {
        let chunk = build_chunk();
        assert_eq!(chunk.num_columns(), 2);
        assert_eq!(chunk.num_rows(), 4);
        assert!(!chunk.is_empty());
        assert_eq!(chunk.column(1).unwrap()[2], b"c");
        assert!(chunk.column(2).is_none());
    }

    #[test]
    fn test_chunk_row_mismatch() {
        let result = Chunk::new(vec![
            vec![b"1".to_vec(), b"2".to_vec()],
            vec![b"a".to_vec()],
        ]);
        assert!(matches!(
            result,
            Err(FqcError::RowCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_empty_chunk() {
        let chunk = Chunk::new(vec![]).unwrap();
        assert_eq!(chunk.num_rows(), 0);
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_encode_with_fixed_algorithms() {
        let chunk = build_chunk();
        let encoded = EncodedChunk::encode(
            &chunk,
            Some(&[Algorithm::Zstd, Algorithm::Gzip][..]),
            SelectionStrategy::Smallest,
        )
        .unwrap();
        assert_eq!(encoded.num_columns(), 2);
        assert_eq!(encoded.algorithms(), &[Algorithm::Zstd, Algorithm::Gzip]);
        assert_eq!(encoded.decode().unwrap(), chunk);
    }

    #[test]
    fn test_encode_algorithm_count_mismatch() {
        let chunk = build_chunk();
        let result = EncodedChunk::encode(&chunk, Some(&[Algorithm::Zstd][..]), Default::default());
        assert!(matches!(
            result,
            Err(FqcError::ColumnCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_encode_selects_per_column() {
        let chunk = build_chunk();
        let encoded =
            EncodedChunk::encode(&chunk, None, SelectionStrategy::LastEvaluated).unwrap();
        assert_eq!(encoded.algorithms(), &[Algorithm::Zstd, Algorithm::Zstd]);
        assert_eq!(encoded.decode().unwrap(), chunk);
    }

    #[test]
    fn test_selected_blobs_match_fixed_encoding() {
        let chunk = build_chunk();
        for strategy in [SelectionStrategy::Smallest, SelectionStrategy::LastEvaluated] {
            let selected = EncodedChunk::encode(&chunk, None, strategy).unwrap();
            let fixed =
                EncodedChunk::encode(&chunk, Some(selected.algorithms()), strategy).unwrap();
            assert_eq!(selected, fixed);
        }
    }

    #[test]
    fn test_frame_layout() {
        let chunk = build_chunk();
        let encoded = EncodedChunk::encode(
            &chunk,
            Some(&[Algorithm::Lzma, Algorithm::Gzip][..]),
            Default::default(),
        )
        .unwrap();

        let mut buffer = Vec::new();
        encoded.write_bytes(&mut buffer).unwrap();
        assert_eq!(buffer.len(), encoded.encoded_len());
        assert_eq!(&buffer[..4], &2u32.to_le_bytes());
        assert_eq!(&buffer[4..6], &[1, 0]);

        let first_len = u32::from_le_bytes(buffer[6..10].try_into().unwrap()) as usize;
        assert_eq!(first_len, encoded.blobs()[0].len());
        assert_eq!(&buffer[10..10 + first_len], &encoded.blobs()[0][..]);
    }

    #[test]
    fn test_from_parts_mismatch() {
        assert!(EncodedChunk::from_parts(vec![Algorithm::Gzip], vec![]).is_err());
        let encoded = EncodedChunk::from_parts(vec![], vec![]).unwrap();
        assert_eq!(encoded.encoded_len(), 4);
    }
}
