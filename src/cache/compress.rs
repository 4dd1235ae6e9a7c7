//! Compression Module
//!
//! Entry payloads are stored zlib-compressed (DEFLATE with header and
//! checksum). Both directions work on in-memory buffers; a failed
//! decompression signals a corrupt or foreign file and the caller decides
//! what to do with it.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

// == Compress ==
/// Compresses `bytes` at the default (balanced) zlib level.
pub fn compress(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

// == Decompress ==
/// Inflates a zlib stream back into the original payload.
///
/// The whole stream must be present: truncated input, a checksum mismatch
/// or bytes that were never zlib in the first place all fail. flate2's
/// streaming decoders accept an unfinished stream, so completion is
/// checked by driving [`Decompress`] until [`Status::StreamEnd`].
pub fn decompress(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut inflate = Decompress::new(true);
    let mut content = Vec::with_capacity(bytes.len().saturating_mul(2).max(64));
    loop {
        let consumed = inflate.total_in() as usize;
        let status =
            inflate.decompress_vec(&bytes[consumed..], &mut content, FlushDecompress::Finish)?;
        match status {
            Status::StreamEnd => return Ok(content),
            // decompress_vec only fills spare capacity
            Status::Ok | Status::BufError if content.len() == content.capacity() => {
                content.reserve(content.capacity().max(64));
            }
            Status::Ok => {}
            Status::BufError => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "zlib stream ended before its end marker",
                ));
            }
        }
    }
}
