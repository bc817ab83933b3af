//! zlib compression of archive bodies.

use std::io::{Read, Write};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::util::{Error, Result};

/// Compress data using zlib.
///
/// # Arguments
/// * `data` - Data to compress
/// * `level` - Compression level (0-9, where 0 stores without compression, 9 is max)
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a zlib stream.
///
/// `size_hint` is only used to preallocate the output.
pub fn decompress(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    if !is_compressed(data) {
        return Err(Error::invalid("body is not a zlib stream"));
    }

    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::with_capacity(size_hint);
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::invalid(format!("corrupt compressed body: {}", e)))?;
    Ok(decompressed)
}

/// Check if data starts with a zlib header.
///
/// zlib header: 0x78 followed by 0x01, 0x5E, 0x9C, or 0xDA
pub fn is_compressed(data: &[u8]) -> bool {
    if data.len() < 2 {
        return false;
    }
    data[0] == 0x78 && matches!(data[1], 0x01 | 0x5E | 0x9C | 0xDA)
}
