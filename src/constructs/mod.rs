mod algorithm;
mod chunk;
mod header;
mod record;

pub use algorithm::{Algorithm, AlgorithmChoice, LZMA_PRESET, ZSTD_LEVEL};
pub use chunk::{Chunk, Column, EncodedChunk};
pub use header::{Header, HEADER_SIZE, MAGIC, VERSION};
pub use record::{columnize, decolumnize, FastqRecord, NUM_FIELDS};
