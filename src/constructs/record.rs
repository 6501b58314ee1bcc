use crate::{Chunk, FqcError};

/// Number of columns a FASTQ chunk is split into.
pub const NUM_FIELDS: usize = 3;

/// A FASTQ record without line terminators.
///
/// `name` is the whole header line, including the leading `@`.
#[derive(Debug, PartialEq, Eq, Clone, Default, Hash)]
pub struct FastqRecord {
    pub name: Vec<u8>,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}
impl FastqRecord {
    /// Builds a record from anything convertible to bytes.
    pub fn new(name: impl Into<Vec<u8>>, seq: impl Into<Vec<u8>>, qual: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            seq: seq.into(),
            qual: qual.into(),
        }
    }
}

/// Transposes records into a three column chunk: names, sequences, qualities.
///
/// # Examples
///
/// ```rust
/// use fqc::{columnize, decolumnize, FastqRecord};
///
/// # fn main() -> fqc::Result<()> {
/// let records = vec![
///     FastqRecord::new("@r1", "GATTACA", "IIIIIII"),
///     FastqRecord::new("@r2", "TTTTTTT", "#######"),
/// ];
/// let chunk = columnize(records.clone());
/// assert_eq!(chunk.num_columns(), 3);
/// assert_eq!(chunk.num_rows(), 2);
/// assert_eq!(decolumnize(chunk)?, records);
/// # Ok(())
/// # }
/// ```
pub fn columnize(records: Vec<FastqRecord>) -> Chunk {
    let mut names = Vec::with_capacity(records.len());
    let mut seqs = Vec::with_capacity(records.len());
    let mut quals = Vec::with_capacity(records.len());
    for record in records {
        names.push(record.name);
        seqs.push(record.seq);
        quals.push(record.qual);
    }
    Chunk::from_equal_columns(vec![names, seqs, quals])
}

/// Transposes a three column chunk back into records.
///
/// # Errors
///
/// - [`FqcError::ColumnCountMismatch`] if the chunk doesn't have exactly three columns
/// - [`FqcError::RowCountMismatch`] if the columns differ in length
pub fn decolumnize(chunk: Chunk) -> crate::Result<Vec<FastqRecord>> {
    let columns = chunk.into_columns();
    let [names, seqs, quals]: [Vec<Vec<u8>>; NUM_FIELDS] =
        columns
            .try_into()
            .map_err(|columns: Vec<_>| FqcError::ColumnCountMismatch {
                expected: NUM_FIELDS,
                actual: columns.len(),
            })?;
    for column in [&seqs, &quals] {
        if column.len() != names.len() {
            return Err(FqcError::RowCountMismatch {
                expected: names.len(),
                actual: column.len(),
            });
        }
    }
    Ok(names
        .into_iter()
        .zip(seqs)
        .zip(quals)
        .map(|((name, seq), qual)| FastqRecord { name, seq, qual })
        .collect())
}
