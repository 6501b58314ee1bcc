mod fastq;
mod reader;
mod writer;

use std::io::{self, Read};

pub use fastq::{chunked, Chunked, FastqReader, FastqWriter};
pub use reader::Reader;
pub use writer::{BoxedWriter, Writer};

/// Reads until `buf` is full or the stream ends, returning the bytes read.
///
/// Unlike [`Read::read_exact`] this reports how far a short read got, which
/// is what tells a clean end of stream apart from a truncated field.
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Algorithm, Chunk};
    use std::io::Cursor;

    /// Hands out one byte per call and interrupts every other call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        interrupt: bool,
    }
    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.pos == self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    fn trickle(data: Vec<u8>) -> Trickle {
        Trickle {
            data,
            pos: 0,
            interrupt: false,
        }
    }

    #[test]
    fn test_read_full_fills_buffer() {
        let mut reader = trickle(b"abcdef".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn test_read_full_short_read() {
        let mut reader = Cursor::new(b"ab".to_vec());
        let mut buf = [0u8; 4];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 2);
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_container_over_trickling_source() {
        let chunk = Chunk::new(vec![
            vec![b"@r1".to_vec(), b"@r2".to_vec()],
            vec![b"ACGT".to_vec(), b"TTNA".to_vec()],
            vec![b"IIII".to_vec(), b"#II#".to_vec()],
        ])
        .unwrap();

        let mut writer = Writer::new(Vec::new()).unwrap();
        writer
            .write_chunk(
                &chunk,
                Some(&[Algorithm::Gzip, Algorithm::Lzma, Algorithm::Zstd][..]),
            )
            .unwrap();
        writer.write_chunk(&chunk, None).unwrap();
        writer.finish().unwrap();

        let reader = Reader::new(trickle(writer.into_inner())).unwrap();
        let chunks = reader.collect::<crate::Result<Vec<_>>>().unwrap();
        assert_eq!(chunks, vec![chunk.clone(), chunk]);
    }
}
