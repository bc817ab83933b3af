//! Binary encoding of archive trees.
//!
//! All integers are little-endian. A node is encoded as:
//!
//! ```text
//! attr_count: u32, (name: str, dataset)*   attributes
//! tag: u8                                   TAG_GROUP or TAG_DATA
//! child_count: u32, (name: str, node)*      if group
//! dataset                                   if data
//!
//! dataset = kind: u8, rank: u8, dims: u64 * rank, byte_len: u64, bytes
//! str     = len: u32, utf-8 bytes
//! ```
//!
//! Element bytes are stored little-endian per component (complex kinds are
//! two or four f64 components).

use std::collections::BTreeMap;
use std::io::{self, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::compression;
use super::format::*;
use super::tree::{Body, Dataset, Node, Tree};
use crate::util::{Dimensions, Error, NativeKind, Result};

/// Nesting limit when decoding, so corrupt input cannot exhaust the stack.
const MAX_DEPTH: usize = 512;

/// Encode a tree into a complete file image (header + body).
pub fn encode_file(tree: &Tree, compressed: bool) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    encode_node(&mut body, tree.root())?;
    if compressed {
        body = compression::compress(&body, COMPRESSION_LEVEL)?;
    }

    let header = Header {
        version: CURRENT_VERSION,
        compressed,
        body_len: body.len() as u64,
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Decode a complete file image.
///
/// The header's compression flag decides how the body is read.
pub fn decode_file(data: &[u8]) -> Result<Tree> {
    let header = Header::from_bytes(data)?;
    let body_len = usize::try_from(header.body_len)
        .map_err(|_| Error::invalid("body length overflows"))?;
    let body = data
        .get(HEADER_SIZE..)
        .and_then(|rest| rest.get(..body_len))
        .ok_or_else(|| {
            Error::invalid(format!(
                "body of {} bytes truncated to {}",
                body_len,
                data.len() - HEADER_SIZE
            ))
        })?;

    let inflated;
    let body = if header.compressed {
        inflated = compression::decompress(body, body_len.saturating_mul(4))?;
        &inflated[..]
    } else {
        body
    };

    let mut decoder = Decoder { data: body };
    let root = decoder.node(0)?;
    if !decoder.data.is_empty() {
        return Err(Error::invalid(format!(
            "{} trailing bytes after root node",
            decoder.data.len()
        )));
    }
    Tree::from_root(root)
}

// ============================================================================
// Encoding
// ============================================================================

fn encode_node(w: &mut Vec<u8>, node: &Node) -> Result<()> {
    w.write_u32::<LittleEndian>(count(node.attributes.len())?)?;
    for (name, dataset) in &node.attributes {
        encode_str(w, name)?;
        encode_dataset(w, dataset)?;
    }

    match &node.body {
        Body::Group(children) => {
            w.write_u8(TAG_GROUP)?;
            w.write_u32::<LittleEndian>(count(children.len())?)?;
            for (name, child) in children {
                encode_str(w, name)?;
                encode_node(w, child)?;
            }
        }
        Body::Data(dataset) => {
            w.write_u8(TAG_DATA)?;
            encode_dataset(w, dataset)?;
        }
    }
    Ok(())
}

fn encode_dataset(w: &mut Vec<u8>, dataset: &Dataset) -> Result<()> {
    let dims = dataset.dims();
    let rank = u8::try_from(dims.rank())
        .map_err(|_| Error::range(format!("rank {} too large to store", dims.rank())))?;

    w.write_u8(dataset.kind() as u8)?;
    w.write_u8(rank)?;
    for &size in dims.sizes() {
        w.write_u64::<LittleEndian>(size as u64)?;
    }
    w.write_u64::<LittleEndian>(dataset.bytes().len() as u64)?;

    let start = w.len();
    w.write_all(dataset.bytes())?;
    to_little_endian(dataset.kind(), &mut w[start..]);
    Ok(())
}

fn encode_str(w: &mut Vec<u8>, s: &str) -> Result<()> {
    w.write_u32::<LittleEndian>(count(s.len())?)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn count(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| Error::range(format!("{} entries too many to store", n)))
}

// ============================================================================
// Decoding
// ============================================================================

struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    fn node(&mut self, depth: usize) -> Result<Node> {
        if depth > MAX_DEPTH {
            return Err(Error::invalid("nodes nested too deeply"));
        }

        let mut attributes = BTreeMap::new();
        for _ in 0..self.u32()? {
            let name = self.string()?;
            let dataset = self.dataset()?;
            attributes.insert(name, dataset);
        }

        let body = match self.u8()? {
            TAG_GROUP => {
                let mut children = BTreeMap::new();
                for _ in 0..self.u32()? {
                    let name = self.string()?;
                    let child = self.node(depth + 1)?;
                    children.insert(name, child);
                }
                Body::Group(children)
            }
            TAG_DATA => Body::Data(self.dataset()?),
            tag => return Err(Error::invalid(format!("unknown node tag {}", tag))),
        };

        Ok(Node { attributes, body })
    }

    fn dataset(&mut self) -> Result<Dataset> {
        let tag = self.u8()?;
        let kind = NativeKind::from_u8(tag)
            .ok_or_else(|| Error::invalid(format!("unknown element kind {}", tag)))?;

        let rank = self.u8()? as usize;
        let mut sizes = Vec::with_capacity(rank);
        for _ in 0..rank {
            sizes.push(self.size()?);
        }

        let byte_len = self.size()?;
        let mut bytes = self.take(byte_len)?.to_vec();
        to_little_endian(kind, &mut bytes);
        Dataset::from_bytes(kind, Dimensions::from(sizes), bytes)
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| Error::invalid("name is not valid UTF-8"))
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(Error::invalid(format!(
                "{} bytes requested, {} left",
                len,
                self.data.len()
            )));
        }
        let (head, rest) = self.data.split_at(len);
        self.data = rest;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8> {
        self.data.read_u8().map_err(truncated)
    }

    fn u32(&mut self) -> Result<u32> {
        self.data.read_u32::<LittleEndian>().map_err(truncated)
    }

    fn size(&mut self) -> Result<usize> {
        let v = self.data.read_u64::<LittleEndian>().map_err(truncated)?;
        usize::try_from(v).map_err(|_| Error::invalid(format!("length {} overflows", v)))
    }
}

fn truncated(e: io::Error) -> Error {
    Error::invalid(format!("truncated body: {}", e))
}

/// Size of one scalar component of `kind`.
fn component_bytes(kind: NativeKind) -> usize {
    match kind {
        NativeKind::Complex64 | NativeKind::ComplexOp => 8,
        _ => kind.num_bytes(),
    }
}

/// Convert between native and little-endian order in place (an involution).
fn to_little_endian(kind: NativeKind, bytes: &mut [u8]) {
    if cfg!(target_endian = "big") {
        let n = component_bytes(kind);
        if n > 1 {
            for component in bytes.chunks_exact_mut(n) {
                component.reverse();
            }
        }
    }
}
