//! Fixed-width 3-bit packing of nucleotide sequences.
//!
//! Five bases are packed into one big-endian `u16` word, most significant
//! base first. Bit 15 is always zero on encode and ignored on decode.
//!
//! | symbol | code |
//! |--------|------|
//! | pad    | 0    |
//! | C      | 1    |
//! | G      | 2    |
//! | A      | 3    |
//! | T      | 4    |
//! | N      | 5    |
//!
//! Codes 6 and 7 are reserved. The final word of a sequence whose length is
//! not a multiple of five is filled with padding, which [`decode`] drops again.
//!
//! ```rust
//! use fqc::dna;
//!
//! # fn main() -> fqc::Result<()> {
//! let packed = dna::encode(b"GATTACA")?;
//! assert_eq!(packed.len(), 4);
//! assert_eq!(dna::decode(&packed)?, b"GATTACA");
//! # Ok(())
//! # }
//! ```

use crate::{FqcError, Result};

/// Number of bases held by one packed word.
pub const BASES_PER_WORD: usize = 5;

/// Size in bytes of one packed word.
pub const WORD_SIZE: usize = std::mem::size_of::<u16>();

/// Code of the padding sentinel.
pub const PAD: u8 = 0b000;

const BITS_PER_BASE: u32 = 3;
const CODE_MASK: u16 = 0b111;
const INVALID: u8 = 0xFF;

/// Shift of each base inside a word, most significant first.
const SHIFTS: [u32; BASES_PER_WORD] = [12, 9, 6, 3, 0];

const ENCODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    table[b'C' as usize] = 0b001;
    table[b'G' as usize] = 0b010;
    table[b'A' as usize] = 0b011;
    table[b'T' as usize] = 0b100;
    table[b'N' as usize] = 0b101;
    table
};

// Index 0 (pad) and the reserved codes never reach the output.
const DECODE_TABLE: [u8; 8] = [0, b'C', b'G', b'A', b'T', b'N', 0, 0];

/// Returns the number of packed bytes needed for `num_bases` bases.
pub fn packed_len(num_bases: usize) -> usize {
    num_bases.div_ceil(BASES_PER_WORD) * WORD_SIZE
}

/// Packs a sequence into 3-bit codes.
///
/// # Errors
///
/// Returns [`FqcError::InvalidSymbol`] for any byte outside `ACGTN`
/// (lowercase bases included).
pub fn encode(seq: &[u8]) -> Result<Vec<u8>> {
    let mut packed = Vec::with_capacity(packed_len(seq.len()));
    encode_into(seq, &mut packed)?;
    Ok(packed)
}

/// Packs a sequence, appending the words to `out`.
///
/// On error `out` is left as it was before the call.
pub fn encode_into(seq: &[u8], out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    out.reserve(packed_len(seq.len()));
    for (group_idx, group) in seq.chunks(BASES_PER_WORD).enumerate() {
        match pack_group(group) {
            Ok(word) => out.extend_from_slice(&word.to_be_bytes()),
            Err(offset) => {
                out.truncate(start);
                return Err(FqcError::InvalidSymbol {
                    symbol: group[offset],
                    pos: group_idx * BASES_PER_WORD + offset,
                });
            }
        }
    }
    Ok(())
}

/// Packs up to five bases into a word, right padded. Errors with the offset
/// of the first unknown byte.
fn pack_group(group: &[u8]) -> std::result::Result<u16, usize> {
    let mut word = 0u16;
    for idx in 0..BASES_PER_WORD {
        let code = match group.get(idx) {
            Some(&base) => match ENCODE_TABLE[base as usize] {
                INVALID => return Err(idx),
                code => code,
            },
            None => PAD,
        };
        word = (word << BITS_PER_BASE) | u16::from(code);
    }
    Ok(word)
}

/// Unpacks a sequence produced by [`encode`].
///
/// # Errors
///
/// - [`FqcError::MalformedInput`] if `packed` is not a whole number of words
/// - [`FqcError::InvalidCode`] for a reserved code, or padding followed by a base
pub fn decode(packed: &[u8]) -> Result<Vec<u8>> {
    let mut seq = Vec::with_capacity(packed.len() / WORD_SIZE * BASES_PER_WORD);
    decode_into(packed, &mut seq)?;
    Ok(seq)
}

/// Unpacks a sequence, appending the bases to `out`.
///
/// On error `out` is left as it was before the call.
pub fn decode_into(packed: &[u8], out: &mut Vec<u8>) -> Result<()> {
    if packed.len() % WORD_SIZE != 0 {
        return Err(FqcError::MalformedInput { len: packed.len() });
    }

    let start = out.len();
    let fail = |out: &mut Vec<u8>, code: u8, pos: usize| {
        out.truncate(start);
        Err(FqcError::InvalidCode { code, pos })
    };

    // run of pad codes not yet known to be trailing
    let mut pending_pad = 0usize;
    for (word_idx, bytes) in packed.chunks_exact(WORD_SIZE).enumerate() {
        let word = u16::from_be_bytes([bytes[0], bytes[1]]);
        for (idx, shift) in SHIFTS.iter().enumerate() {
            let code = ((word >> shift) & CODE_MASK) as u8;
            let pos = word_idx * BASES_PER_WORD + idx;
            match code {
                PAD => pending_pad += 1,
                1..=5 if pending_pad > 0 => return fail(out, PAD, pos - pending_pad),
                1..=5 => out.push(DECODE_TABLE[code as usize]),
                _ => return fail(out, code, pos),
            }
        }
    }
    Ok(())
}
