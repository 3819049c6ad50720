//! Deterministic binary codec primitives.
//!
//! Everything the SDK puts on the wire goes through [`WireWriter`] and comes
//! back through [`WireReader`]. The format is deliberately boring: fixed-width
//! little-endian integers, `u32`-length-prefixed byte vectors, one-byte
//! presence flags for optionals. No serde, no varints, no field reordering —
//! a transaction body must serialize to the *exact* bytes the signature was
//! computed over, every time, on every machine.

use bytes::{BufMut, BytesMut};

use crate::config::MAX_FRAME_SIZE;
use crate::error::CodecError;

/// Anything that knows how to write itself into a [`WireWriter`].
pub trait WireEncode {
    /// Appends the canonical encoding of `self` to the writer.
    fn encode(&self, w: &mut WireWriter);

    /// Convenience: the canonical encoding as a fresh byte vector.
    fn to_wire_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        self.encode(&mut w);
        w.finish()
    }
}

/// Anything that can be reconstructed from a [`WireReader`].
pub trait WireDecode: Sized {
    /// Reads one value off the front of the reader.
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError>;

    /// Decodes a value that must consume the whole buffer.
    fn from_wire_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = WireReader::new(bytes);
        let value = Self::decode(&mut r)?;
        r.expect_end()?;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Append-only encoder producing canonical wire bytes.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    /// A fresh writer with a small preallocation.
    pub fn new() -> Self {
        WireWriter {
            buf: BytesMut::with_capacity(256),
        }
    }

    /// Consumes the writer, returning the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Current encoded length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` when nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.put_u8(v as u8);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.put_u16_le(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    pub fn put_i32(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    pub fn put_i64(&mut self, v: i64) {
        self.buf.put_i64_le(v);
    }

    /// Length-prefixed byte vector (`u32` LE length, then the bytes).
    pub fn put_bytes(&mut self, v: &[u8]) {
        self.buf.put_u32_le(v.len() as u32);
        self.buf.put_slice(v);
    }

    /// Length-prefixed UTF-8 string.
    pub fn put_str(&mut self, v: &str) {
        self.put_bytes(v.as_bytes());
    }

    /// One-byte presence flag followed by the value when present.
    pub fn put_option<T: ?Sized, F>(&mut self, v: Option<&T>, f: F)
    where
        F: FnOnce(&mut WireWriter, &T),
    {
        match v {
            Some(inner) => {
                self.put_u8(1);
                f(self, inner);
            }
            None => self.put_u8(0),
        }
    }

    /// `u32` element count followed by each element in order.
    pub fn put_seq<T, F>(&mut self, items: &[T], mut f: F)
    where
        F: FnMut(&mut WireWriter, &T),
    {
        self.put_u32(items.len() as u32);
        for item in items {
            f(self, item);
        }
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Cursor over a byte slice, mirroring [`WireWriter`] field for field.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Starts reading at the front of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        WireReader { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fails unless the buffer is fully consumed.
    pub fn expect_end(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], CodecError> {
        if self.remaining() < n {
            return Err(CodecError::UnexpectedEof(what));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self, what: &'static str) -> Result<u8, CodecError> {
        Ok(self.take(1, what)?[0])
    }

    pub fn read_bool(&mut self, what: &'static str) -> Result<bool, CodecError> {
        match self.read_u8(what)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CodecError::MalformedField(what)),
        }
    }

    pub fn read_u16(&mut self, what: &'static str) -> Result<u16, CodecError> {
        let b = self.take(2, what)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32, CodecError> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64(&mut self, what: &'static str) -> Result<u64, CodecError> {
        let b = self.take(8, what)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_i32(&mut self, what: &'static str) -> Result<i32, CodecError> {
        Ok(self.read_u32(what)? as i32)
    }

    pub fn read_i64(&mut self, what: &'static str) -> Result<i64, CodecError> {
        Ok(self.read_u64(what)? as i64)
    }

    /// Length-prefixed byte vector. Lengths beyond the frame limit are a
    /// protocol violation, not an allocation request.
    pub fn read_bytes(&mut self, what: &'static str) -> Result<Vec<u8>, CodecError> {
        let len = self.read_u32(what)? as usize;
        if len > MAX_FRAME_SIZE {
            return Err(CodecError::LengthOverflow(len));
        }
        Ok(self.take(len, what)?.to_vec())
    }

    /// Length-prefixed UTF-8 string.
    pub fn read_str(&mut self, what: &'static str) -> Result<String, CodecError> {
        let bytes = self.read_bytes(what)?;
        String::from_utf8(bytes).map_err(|_| CodecError::MalformedField(what))
    }

    /// Mirrors [`WireWriter::put_option`].
    pub fn read_option<T, F>(&mut self, what: &'static str, f: F) -> Result<Option<T>, CodecError>
    where
        F: FnOnce(&mut WireReader<'a>) -> Result<T, CodecError>,
    {
        if self.read_bool(what)? {
            Ok(Some(f(self)?))
        } else {
            Ok(None)
        }
    }

    /// Mirrors [`WireWriter::put_seq`].
    pub fn read_seq<T, F>(&mut self, what: &'static str, mut f: F) -> Result<Vec<T>, CodecError>
    where
        F: FnMut(&mut WireReader<'a>) -> Result<T, CodecError>,
    {
        let count = self.read_u32(what)? as usize;
        if count > MAX_FRAME_SIZE {
            return Err(CodecError::LengthOverflow(count));
        }
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            items.push(f(self)?);
        }
        Ok(items)
    }
}
