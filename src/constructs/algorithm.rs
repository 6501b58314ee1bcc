use std::{
    fmt,
    io::{Read, Write},
};

use flate2::{read::MultiGzDecoder, write::GzEncoder, Compression};
use xz2::{read::XzDecoder, write::XzEncoder};

use crate::FqcError;

/// xz preset used for LZMA columns.
pub const LZMA_PRESET: u32 = 6;

/// zstd level used for ZSTD columns.
pub const ZSTD_LEVEL: i32 = 3;

/// General purpose compressor applied to a column.
///
/// The discriminant is the tag byte stored in the container, and the
/// declaration order is the precedence used to break size ties.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Algorithm {
    /// gzip via `flate2`
    Gzip = 0,
    /// xz container via `xz2`
    Lzma = 1,
    Zstd = 2,
}

impl Algorithm {
    /// Every supported algorithm, in tag order.
    pub const ALL: [Algorithm; 3] = [Algorithm::Gzip, Algorithm::Lzma, Algorithm::Zstd];

    /// Byte identifying the algorithm on the wire.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Lowercase name, as used by [`Display`](fmt::Display).
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Gzip => "gzip",
            Algorithm::Lzma => "lzma",
            Algorithm::Zstd => "zstd",
        }
    }

    /// Compresses `data` with fixed settings, so equal inputs give equal bytes.
    ///
    /// # Errors
    ///
    /// Propagates errors from the underlying encoder.
    pub fn compress(self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Algorithm::Gzip => {
                // GzEncoder::new writes a zero mtime and no file name
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Algorithm::Lzma => {
                let mut encoder = XzEncoder::new(Vec::new(), LZMA_PRESET);
                encoder.write_all(data)?;
                encoder.finish()
            }
            Algorithm::Zstd => zstd::bulk::compress(data, ZSTD_LEVEL),
        }
    }

    /// Decompresses a payload produced by [`Algorithm::compress`].
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `data` is not a valid stream for this algorithm.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fqc::Algorithm;
    ///
    /// let packed = Algorithm::Lzma.compress(b"GATTACA").unwrap();
    /// assert_eq!(Algorithm::Lzma.decompress(&packed).unwrap(), b"GATTACA");
    /// assert!(Algorithm::Gzip.decompress(&packed).is_err());
    /// ```
    pub fn decompress(self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        match self {
            Algorithm::Gzip => {
                MultiGzDecoder::new(data).read_to_end(&mut buffer)?;
            }
            Algorithm::Lzma => {
                XzDecoder::new(data).read_to_end(&mut buffer)?;
            }
            Algorithm::Zstd => {
                buffer = zstd::stream::decode_all(data)?;
            }
        }
        Ok(buffer)
    }
}

impl TryFrom<u8> for Algorithm {
    type Error = FqcError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Algorithm::Gzip),
            1 => Ok(Algorithm::Lzma),
            2 => Ok(Algorithm::Zstd),
            _ => Err(FqcError::UnknownAlgorithm(tag)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the algorithm of each column is decided.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmChoice {
    /// Pick per column and per chunk with the writer's [`SelectionStrategy`](crate::SelectionStrategy).
    #[default]
    Best,
    /// Use these algorithms, one per column, for every chunk.
    Fixed(Vec<Algorithm>),
}

impl AlgorithmChoice {
    /// Returns the fixed algorithm list, if any.
    pub fn fixed(&self) -> Option<&[Algorithm]> {
        match self {
            AlgorithmChoice::Best => None,
            AlgorithmChoice::Fixed(algorithms) => Some(algorithms.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(Algorithm::Gzip.tag(), 0);
        assert_eq!(Algorithm::Lzma.tag(), 1);
        assert_eq!(Algorithm::Zstd.tag(), 2);
        for algorithm in Algorithm::ALL {
            assert_eq!(Algorithm::try_from(algorithm.tag()).unwrap(), algorithm);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            Algorithm::try_from(3),
            Err(FqcError::UnknownAlgorithm(3))
        ));
        assert!(matches!(
            Algorithm::try_from(255),
            Err(FqcError::UnknownAlgorithm(255))
        ));
    }

    #[test]
    fn test_compress_roundtrip() {
        let data = b"@SEQ1\nGATTACA\n+\nIIIIIII".repeat(20);
        for algorithm in Algorithm::ALL {
            let compressed = algorithm.compress(&data).unwrap();
            assert!(compressed.len() < data.len(), "{algorithm}");
            assert_eq!(algorithm.decompress(&compressed).unwrap(), data);
        }
    }

    #[test]
    fn test_compress_deterministic() {
        let data = b"NNNNACGTACGTTTTT".repeat(50);
        for algorithm in Algorithm::ALL {
            assert_eq!(
                algorithm.compress(&data).unwrap(),
                algorithm.compress(&data).unwrap()
            );
        }
    }

    #[test]
    fn test_container_signatures() {
        let gz = Algorithm::Gzip.compress(b"x").unwrap();
        assert_eq!(&gz[..2], &[0x1f, 0x8b]);
        let xz = Algorithm::Lzma.compress(b"x").unwrap();
        assert_eq!(&xz[..6], &[0xfd, b'7', b'z', b'X', b'Z', 0x00]);
        let zst = Algorithm::Zstd.compress(b"x").unwrap();
        assert_eq!(&zst[..4], &[0x28, 0xb5, 0x2f, 0xfd]);
    }

    #[test]
    fn test_decompress_garbage() {
        for algorithm in Algorithm::ALL {
            assert!(algorithm.decompress(b"definitely not compressed").is_err());
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Algorithm::Gzip.to_string(), "gzip");
        assert_eq!(Algorithm::Lzma.to_string(), "lzma");
        assert_eq!(Algorithm::Zstd.to_string(), "zstd");
    }

    #[test]
    fn test_choice_fixed() {
        assert!(AlgorithmChoice::Best.fixed().is_none());
        let choice = AlgorithmChoice::Fixed(vec![Algorithm::Zstd]);
        assert_eq!(choice.fixed(), Some(&[Algorithm::Zstd][..]));
    }
}
