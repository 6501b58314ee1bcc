//! Compression of a single column.
//!
//! A column is stored as its items joined by a line-feed, with no trailing
//! separator, then run through one [`Algorithm`].

use tracing::trace;

use crate::{Algorithm, Column, FqcError, Result};

/// Separator placed between the items of a column.
pub const SEPARATOR: u8 = b'\n';

/// How [`select_algorithm`] turns per-algorithm sizes into a choice.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionStrategy {
    /// The algorithm with the smallest output, ties going to the lowest tag.
    #[default]
    Smallest,
    /// Sizes are measured, but the last algorithm measured is reported.
    ///
    /// This reproduces the tags written by earlier versions of the format,
    /// which always resolved to [`Algorithm::Zstd`].
    LastEvaluated,
}

fn join_items<I: AsRef<[u8]>>(items: &[I]) -> Result<Vec<u8>> {
    let total = items.iter().map(|item| item.as_ref().len() + 1).sum::<usize>();
    let mut joined = Vec::with_capacity(total);
    for (row, item) in items.iter().enumerate() {
        let item = item.as_ref();
        if item.contains(&SEPARATOR) {
            return Err(FqcError::InvalidItem { row });
        }
        if row > 0 {
            joined.push(SEPARATOR);
        }
        joined.extend_from_slice(item);
    }
    Ok(joined)
}

/// Joins the items of a column and compresses them.
///
/// # Errors
///
/// Returns [`FqcError::InvalidItem`] if any item contains a line-feed.
///
/// # Examples
///
/// ```rust
/// use fqc::{compress_column, decompress_column, Algorithm};
///
/// # fn main() -> fqc::Result<()> {
/// let items = vec![b"GATTACA".to_vec(), b"TTTTTTT".to_vec()];
/// let compressed = compress_column(&items, Algorithm::Zstd)?;
/// assert_eq!(decompress_column(&compressed, Algorithm::Zstd)?, items);
/// # Ok(())
/// # }
/// ```
pub fn compress_column<I: AsRef<[u8]>>(items: &[I], algorithm: Algorithm) -> Result<Vec<u8>> {
    let joined = join_items(items)?;
    Ok(algorithm.compress(&joined)?)
}

/// Decompresses a column and splits it back into items.
///
/// The result always holds one more item than there are separators, so an
/// empty payload gives a single empty item. Checking the row count against
/// the rest of the chunk is left to the caller.
pub fn decompress_column(data: &[u8], algorithm: Algorithm) -> Result<Column> {
    let raw = algorithm
        .decompress(data)
        .map_err(|source| FqcError::Decompress { algorithm, source })?;
    Ok(raw.split(|&b| b == SEPARATOR).map(<[u8]>::to_vec).collect())
}

/// Compresses the column with every algorithm and returns the smallest.
///
/// Ties go to the algorithm with the lowest tag.
///
/// # Errors
///
/// Returns [`FqcError::InvalidItem`] if any item contains a line-feed.
pub fn select_best_algorithm<I: AsRef<[u8]>>(items: &[I]) -> Result<Algorithm> {
    select_algorithm(items, SelectionStrategy::Smallest)
}

/// Measures the column under every algorithm and picks one per `strategy`.
///
/// # Errors
///
/// Returns [`FqcError::InvalidItem`] if any item contains a line-feed.
pub fn select_algorithm<I: AsRef<[u8]>>(
    items: &[I],
    strategy: SelectionStrategy,
) -> Result<Algorithm> {
    compress_best(items, strategy).map(|(algorithm, _)| algorithm)
}

/// Compresses the column with every algorithm and keeps the output of the
/// one picked by `strategy`.
pub(crate) fn compress_best<I: AsRef<[u8]>>(
    items: &[I],
    strategy: SelectionStrategy,
) -> Result<(Algorithm, Vec<u8>)> {
    let joined = join_items(items)?;
    let mut outputs = Vec::with_capacity(Algorithm::ALL.len());
    for algorithm in Algorithm::ALL {
        let compressed = algorithm.compress(&joined)?;
        trace!(%algorithm, size = compressed.len(), raw = joined.len(), "measured column");
        outputs.push((algorithm, compressed));
    }

    let sizes = outputs
        .iter()
        .map(|(algorithm, compressed)| (*algorithm, compressed.len()))
        .collect::<Vec<_>>();
    let chosen = pick(&sizes, strategy);
    match outputs.into_iter().find(|(algorithm, _)| *algorithm == chosen) {
        Some(output) => Ok(output),
        None => Ok((chosen, chosen.compress(&joined)?)),
    }
}

/// Turns measured sizes into a choice. `sizes` is in tag order.
fn pick(sizes: &[(Algorithm, usize)], strategy: SelectionStrategy) -> Algorithm {
    let chosen = match strategy {
        // min_by_key keeps the first of equal minima
        SelectionStrategy::Smallest => sizes.iter().min_by_key(|(_, size)| *size),
        SelectionStrategy::LastEvaluated => sizes.last(),
    };
    chosen.map_or(Algorithm::Zstd, |(algorithm, _)| *algorithm)
}
