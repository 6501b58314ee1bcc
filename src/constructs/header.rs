use bytemuck::{Pod, Zeroable};

use crate::FqcError;

pub const MAGIC: [u8; 3] = *b"FQC"; // "FASTQ Compressed"
/// Format version written by this crate, the only one it reads.
pub const VERSION: u8 = 1;
/// Size of the header on the wire.
pub const HEADER_SIZE: usize = std::mem::size_of::<Header>();

/// 4-byte container header: raw magic followed by the format version.
#[derive(Copy, Clone, Pod, Zeroable, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Header {
    pub magic: [u8; 3], // "FQC" - file type validation
    pub version: u8,    // Format version (1)
}
impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}
impl Header {
    /// Header for the current format version.
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
        }
    }
    /// Checks the magic first, then the version.
    ///
    /// # Errors
    ///
    /// - [`FqcError::BadMagic`] if the magic bytes are not `FQC`
    /// - [`FqcError::UnsupportedVersion`] for any version other than [`VERSION`]
    pub fn validate(&self) -> crate::Result<()> {
        if self.magic != MAGIC {
            return Err(FqcError::BadMagic {
                expected: MAGIC.to_vec(),
                actual: self.magic.to_vec(),
            });
        }
        if self.version != VERSION {
            return Err(FqcError::UnsupportedVersion {
                expected: VERSION,
                actual: self.version,
            });
        }
        Ok(())
    }
    /// The header as it appears on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
    /// Reinterprets raw bytes without validating them.
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        bytemuck::pod_read_unaligned(bytes)
    }
}
