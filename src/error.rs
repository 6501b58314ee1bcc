//! Error handling for the FQC library.
//!
//! This module defines all error types that can occur while packing DNA,
//! compressing columns, and reading or writing FQC containers.

use std::error::Error as StdError;
use thiserror::Error;

use crate::Algorithm;

/// A specialized `Result` type for FQC operations.
///
/// It's equivalent to `std::result::Result<T, FqcError>`.
///
/// # Examples
///
/// ```rust
/// use fqc::{dna, Result};
///
/// fn pack(seq: &[u8]) -> Result<Vec<u8>> {
///     let packed = dna::encode(seq)?;
///     Ok(packed)
/// }
/// # assert_eq!(pack(b"ACGTN").unwrap().len(), 2);
/// ```
pub type Result<T> = std::result::Result<T, FqcError>;

/// Error types for FQC operations.
///
/// Every stage of the pipeline fails with its own variant so that callers can
/// report where a file went wrong. None of these are retried internally.
///
/// # Examples
///
/// ```rust
/// use fqc::{FqcError, Reader};
/// use std::io::Cursor;
///
/// match Reader::new(Cursor::new(b"BAM\x01".to_vec())) {
///     Err(FqcError::BadMagic { expected, actual }) => {
///         println!("Wrong file type: expected {:?}, got {:?}", expected, actual);
///     }
///     Err(e) => println!("Other error: {}", e),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug)]
pub enum FqcError {
    /// I/O error from the underlying reader or writer.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Error from niffler while sniffing or opening a compressed input.
    #[cfg(feature = "niffler")]
    #[error("Niffler error")]
    Niffler(#[from] niffler::Error),

    /// A byte outside the `{A, C, G, T, N}` alphabet was handed to the DNA encoder.
    #[error("Invalid DNA symbol ({symbol:#04x}) at position {pos}")]
    InvalidSymbol { symbol: u8, pos: usize },

    /// Packed DNA whose length is not a whole number of 16-bit words.
    #[error("Malformed packed DNA: length {len} is not a multiple of 2")]
    MalformedInput { len: usize },

    /// A packed word carried a reserved code, or padding before a real base.
    #[error("Invalid packed DNA code ({code}) at base {pos}")]
    InvalidCode { code: u8, pos: usize },

    /// A column element contained the line-feed separator.
    #[error("Column item at row {row} contains a line-feed")]
    InvalidItem { row: usize },

    /// Nothing at all could be read from the container source.
    #[error("The file is empty")]
    EmptyFile,

    /// The container does not start with `FQC`.
    #[error("Invalid magic, expected ({expected:?}), found ({actual:?})")]
    BadMagic { expected: Vec<u8>, actual: Vec<u8> },

    /// The container was written with a format version this library can't read.
    #[error("Unsupported version, expected ({expected}), found ({actual})")]
    UnsupportedVersion { expected: u8, actual: u8 },

    /// The container ended in the middle of a header or chunk.
    #[error("Truncated container at position {pos}")]
    TruncatedContainer { pos: usize },

    /// An algorithm tag outside the known set.
    #[error("Unknown compression algorithm tag: {0}")]
    UnknownAlgorithm(u8),

    /// A column payload was rejected by its decompressor.
    #[error("Failed to decompress {algorithm} column")]
    Decompress {
        algorithm: Algorithm,
        #[source]
        source: std::io::Error,
    },

    /// The number of columns does not match what was expected.
    #[error("Column count mismatch, expected ({expected}), found ({actual})")]
    ColumnCountMismatch { expected: usize, actual: usize },

    /// Columns of the same chunk have different numbers of rows.
    #[error("Row count mismatch, expected ({expected}), found ({actual})")]
    RowCountMismatch { expected: usize, actual: usize },

    /// A FASTQ record that does not follow the four line layout.
    #[error("Malformed FASTQ record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: &'static str },

    /// Chunks must hold at least one record.
    #[error("Invalid chunk size: 0 (must be at least 1)")]
    InvalidChunkSize,

    /// Error occurred inside a worker thread.
    #[error("Processing error: {0}")]
    Process(Box<dyn StdError + Send + Sync>),
}

/// Trait for converting errors into `FqcError::Process` variants.
///
/// # Examples
///
/// ```rust
/// use fqc::{FqcError, IntoFqcError};
///
/// let err = std::fmt::Error.into_fqc_error();
/// assert!(matches!(err, FqcError::Process(_)));
/// ```
pub trait IntoFqcError {
    /// Converts the error into an `FqcError`.
    fn into_fqc_error(self) -> FqcError;
}

impl<E> IntoFqcError for E
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn into_fqc_error(self) -> FqcError {
        FqcError::Process(self.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct CustomError(String);

    impl fmt::Display for CustomError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Custom error: {}", self.0)
        }
    }

    impl std::error::Error for CustomError {}

    #[test]
    fn test_error_display_messages() {
        let err = FqcError::BadMagic {
            expected: b"FQC".to_vec(),
            actual: b"BAM".to_vec(),
        };
        let display = format!("{}", err);
        assert!(display.contains("[70, 81, 67]"));

        let err = FqcError::UnsupportedVersion {
            expected: 1,
            actual: 2,
        };
        let display = format!("{}", err);
        assert!(display.contains("expected (1)"));
        assert!(display.contains("found (2)"));

        let err = FqcError::TruncatedContainer { pos: 1024 };
        assert!(format!("{}", err).contains("1024"));

        let err = FqcError::InvalidSymbol {
            symbol: b'x',
            pos: 7,
        };
        let display = format!("{}", err);
        assert!(display.contains("0x78"));
        assert!(display.contains("7"));

        let err = FqcError::MalformedInput { len: 3 };
        assert!(format!("{}", err).contains("not a multiple of 2"));

        let err = FqcError::UnknownAlgorithm(9);
        assert!(format!("{}", err).contains("9"));

        let err = FqcError::Decompress {
            algorithm: Algorithm::Lzma,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "bad"),
        };
        assert!(format!("{}", err).contains("lzma"));

        let err = FqcError::ColumnCountMismatch {
            expected: 3,
            actual: 2,
        };
        let display = format!("{}", err);
        assert!(display.contains("expected (3)"));
        assert!(display.contains("found (2)"));

        let err = FqcError::MalformedRecord {
            line: 9,
            reason: "missing '+' separator",
        };
        let display = format!("{}", err);
        assert!(display.contains("line 9"));
        assert!(display.contains("separator"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let fqc_err: FqcError = io_err.into();

        match fqc_err {
            FqcError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_decompress_source_chain() {
        let err = FqcError::Decompress {
            algorithm: Algorithm::Gzip,
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "corrupt deflate"),
        };
        let source = err.source().expect("source should be set");
        let io_source = source.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io_source.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_error_send_sync() {
        fn is_send<T: Send>() {}
        fn is_sync<T: Sync>() {}

        is_send::<FqcError>();
        is_sync::<FqcError>();
    }

    #[test]
    fn test_into_fqc_error_trait() {
        let custom_err = CustomError("test".to_string());
        let fqc_err = custom_err.into_fqc_error();

        match fqc_err {
            FqcError::Process(boxed) => {
                let display = format!("{}", boxed);
                assert!(display.contains("Custom error: test"));
            }
            _ => panic!("Expected Process variant"),
        }
    }
}
