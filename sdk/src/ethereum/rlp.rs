//! Minimal recursive-length-prefix codec.
//!
//! Just the two RLP shapes — byte strings and lists — with canonical
//! encoding enforced on decode: no leading zeros in lengths, no
//! single-byte strings dressed up with a length prefix. Canonicality
//! matters because these bytes sit under an Ethereum signature.

/// One RLP value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    /// A byte string (possibly empty).
    Bytes(Vec<u8>),
    /// An ordered list of items.
    List(Vec<RlpItem>),
}

/// Failures from RLP encoding or decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RlpError {
    /// The buffer ended inside an item.
    #[error("rlp input truncated")]
    Truncated,

    /// Bytes remained after the outermost item.
    #[error("{0} trailing bytes after rlp item")]
    TrailingBytes(usize),

    /// A length or single-byte value was not minimally encoded.
    #[error("non-canonical rlp encoding")]
    NonCanonical,

    /// A list was found where a byte string was required, or vice versa.
    #[error("rlp item has the wrong shape: expected {0}")]
    WrongShape(&'static str),

    /// A list had the wrong number of fields for its transaction type.
    #[error("rlp list has {got} fields, expected {expected}")]
    WrongArity { expected: usize, got: usize },

    /// The first byte names a transaction envelope this build cannot parse.
    #[error("unsupported ethereum transaction type {0:#04x}")]
    UnsupportedType(u8),
}

impl RlpItem {
    /// Encodes the item, appending to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RlpItem::Bytes(bytes) => {
                if bytes.len() == 1 && bytes[0] < 0x80 {
                    out.push(bytes[0]);
                } else {
                    encode_length(bytes.len(), 0x80, out);
                    out.extend_from_slice(bytes);
                }
            }
            RlpItem::List(items) => {
                let mut payload = Vec::new();
                for item in items {
                    item.encode_into(&mut payload);
                }
                encode_length(payload.len(), 0xC0, out);
                out.extend_from_slice(&payload);
            }
        }
    }

    /// The item as a standalone encoding.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Decodes exactly one item spanning the whole input.
    pub fn decode_all(input: &[u8]) -> Result<Self, RlpError> {
        let (item, rest) = Self::decode_prefix(input)?;
        if !rest.is_empty() {
            return Err(RlpError::TrailingBytes(rest.len()));
        }
        Ok(item)
    }

    /// Decodes one item off the front, returning the remainder.
    pub fn decode_prefix(input: &[u8]) -> Result<(Self, &[u8]), RlpError> {
        let (&first, rest) = input.split_first().ok_or(RlpError::Truncated)?;
        match first {
            0x00..=0x7F => Ok((RlpItem::Bytes(vec![first]), rest)),
            0x80..=0xBF => {
                let (len, rest) = decode_length(first, 0x80, rest)?;
                let (payload, rest) = split_checked(rest, len)?;
                if len == 1 && payload[0] < 0x80 {
                    return Err(RlpError::NonCanonical);
                }
                Ok((RlpItem::Bytes(payload.to_vec()), rest))
            }
            0xC0..=0xFF => {
                let (len, rest) = decode_length(first, 0xC0, rest)?;
                let (mut payload, rest) = split_checked(rest, len)?;
                let mut items = Vec::new();
                while !payload.is_empty() {
                    let (item, remaining) = Self::decode_prefix(payload)?;
                    items.push(item);
                    payload = remaining;
                }
                Ok((RlpItem::List(items), rest))
            }
        }
    }

    /// The byte-string payload, or a shape error.
    pub fn as_bytes(&self) -> Result<&[u8], RlpError> {
        match self {
            RlpItem::Bytes(bytes) => Ok(bytes),
            RlpItem::List(_) => Err(RlpError::WrongShape("byte string")),
        }
    }

    /// The list elements, or a shape error.
    pub fn as_list(&self) -> Result<&[RlpItem], RlpError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(RlpError::WrongShape("list")),
        }
    }
}

fn encode_length(len: usize, offset: u8, out: &mut Vec<u8>) {
    if len <= 55 {
        out.push(offset + len as u8);
    } else {
        let be = len.to_be_bytes();
        let first = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
        let len_bytes = &be[first..];
        out.push(offset + 55 + len_bytes.len() as u8);
        out.extend_from_slice(len_bytes);
    }
}

fn decode_length<'a>(
    first: u8,
    offset: u8,
    rest: &'a [u8],
) -> Result<(usize, &'a [u8]), RlpError> {
    let marker = first - offset;
    if marker <= 55 {
        return Ok((marker as usize, rest));
    }
    let len_of_len = (marker - 55) as usize;
    let (len_bytes, rest) = split_checked(rest, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(RlpError::NonCanonical);
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(RlpError::NonCanonical);
    }
    let mut len = 0usize;
    for &b in len_bytes {
        len = (len << 8) | b as usize;
    }
    if len <= 55 {
        return Err(RlpError::NonCanonical);
    }
    Ok((len, rest))
}

fn split_checked(input: &[u8], at: usize) -> Result<(&[u8], &[u8]), RlpError> {
    if input.len() < at {
        return Err(RlpError::Truncated);
    }
    Ok(input.split_at(at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_low_byte_encodes_as_itself() {
        let item = RlpItem::Bytes(vec![0x42]);
        assert_eq!(item.to_vec(), vec![0x42]);
        assert_eq!(RlpItem::decode_all(&[0x42]).unwrap(), item);
    }

    #[test]
    fn empty_string_is_0x80() {
        let item = RlpItem::Bytes(vec![]);
        assert_eq!(item.to_vec(), vec![0x80]);
        assert_eq!(RlpItem::decode_all(&[0x80]).unwrap(), item);
    }

    #[test]
    fn short_string_round_trips() {
        let item = RlpItem::Bytes(b"dog".to_vec());
        assert_eq!(item.to_vec(), vec![0x83, b'd', b'o', b'g']);
        assert_eq!(RlpItem::decode_all(&item.to_vec()).unwrap(), item);
    }

    #[test]
    fn long_string_uses_length_of_length() {
        let item = RlpItem::Bytes(vec![0xAB; 60]);
        let encoded = item.to_vec();
        assert_eq!(encoded[0], 0xB8);
        assert_eq!(encoded[1], 60);
        assert_eq!(RlpItem::decode_all(&encoded).unwrap(), item);
    }

    #[test]
    fn nested_list_round_trips() {
        let item = RlpItem::List(vec![
            RlpItem::Bytes(b"cat".to_vec()),
            RlpItem::List(vec![RlpItem::Bytes(vec![0x01])]),
            RlpItem::Bytes(vec![]),
        ]);
        assert_eq!(RlpItem::decode_all(&item.to_vec()).unwrap(), item);
    }

    #[test]
    fn truncated_input_is_rejected() {
        // Declares 3 payload bytes, provides 2.
        assert_eq!(RlpItem::decode_all(&[0x83, b'd', b'o']), Err(RlpError::Truncated));
    }

    #[test]
    fn non_canonical_single_byte_is_rejected() {
        // 0x42 wrapped in a needless length prefix.
        assert_eq!(RlpItem::decode_all(&[0x81, 0x42]), Err(RlpError::NonCanonical));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert_eq!(
            RlpItem::decode_all(&[0x42, 0x43]),
            Err(RlpError::TrailingBytes(1))
        );
    }

    #[test]
    fn shape_accessors() {
        let bytes = RlpItem::Bytes(vec![1]);
        let list = RlpItem::List(vec![]);
        assert!(bytes.as_bytes().is_ok());
        assert!(bytes.as_list().is_err());
        assert!(list.as_list().is_ok());
        assert!(list.as_bytes().is_err());
    }
}
