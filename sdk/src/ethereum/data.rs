//! Typed views of the three supported Ethereum transaction envelopes.

use crate::ethereum::rlp::{RlpError, RlpItem};

/// One entry of an EIP-2930 access list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEntry {
    /// 20-byte address being warmed.
    pub address: Vec<u8>,
    /// 32-byte storage slots being warmed.
    pub storage_keys: Vec<Vec<u8>>,
}

/// One EIP-7702 authorization tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub chain_id: Vec<u8>,
    pub address: Vec<u8>,
    pub nonce: Vec<u8>,
    pub y_parity: Vec<u8>,
    pub r: Vec<u8>,
    pub s: Vec<u8>,
}

/// A parsed Ethereum transaction, one variant per supported envelope.
///
/// All numeric fields stay as the minimal big-endian byte strings RLP
/// carries them in; the SDK never interprets the amounts, it only needs the
/// envelope to round-trip byte-exactly under the embedded signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EthereumData {
    /// Pre-EIP-2718 transaction: a bare 9-field RLP list, no type prefix.
    Legacy {
        nonce: Vec<u8>,
        gas_price: Vec<u8>,
        gas_limit: Vec<u8>,
        to: Vec<u8>,
        value: Vec<u8>,
        call_data: Vec<u8>,
        v: Vec<u8>,
        r: Vec<u8>,
        s: Vec<u8>,
    },
    /// EIP-1559 dynamic-fee transaction, type byte `0x02`.
    Eip1559 {
        chain_id: Vec<u8>,
        nonce: Vec<u8>,
        max_priority_gas: Vec<u8>,
        max_gas: Vec<u8>,
        gas_limit: Vec<u8>,
        to: Vec<u8>,
        value: Vec<u8>,
        call_data: Vec<u8>,
        access_list: Vec<AccessEntry>,
        recovery_id: Vec<u8>,
        r: Vec<u8>,
        s: Vec<u8>,
    },
    /// EIP-7702 set-code transaction, type byte `0x04`.
    Eip7702 {
        chain_id: Vec<u8>,
        nonce: Vec<u8>,
        max_priority_gas: Vec<u8>,
        max_gas: Vec<u8>,
        gas_limit: Vec<u8>,
        to: Vec<u8>,
        value: Vec<u8>,
        call_data: Vec<u8>,
        access_list: Vec<AccessEntry>,
        authorization_list: Vec<Authorization>,
        recovery_id: Vec<u8>,
        r: Vec<u8>,
        s: Vec<u8>,
    },
}

impl EthereumData {
    /// Parses raw transaction bytes, dispatching on the first byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RlpError> {
        let (&first, _) = bytes.split_first().ok_or(RlpError::Truncated)?;
        match first {
            0x02 => Self::decode_eip1559(&bytes[1..]),
            0x04 => Self::decode_eip7702(&bytes[1..]),
            0xC0..=0xFF => Self::decode_legacy(bytes),
            other => Err(RlpError::UnsupportedType(other)),
        }
    }

    /// Re-encodes to the exact raw transaction bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            EthereumData::Legacy { .. } => self.payload_item().to_vec(),
            EthereumData::Eip1559 { .. } => {
                let mut out = vec![0x02];
                self.payload_item().encode_into(&mut out);
                out
            }
            EthereumData::Eip7702 { .. } => {
                let mut out = vec![0x04];
                self.payload_item().encode_into(&mut out);
                out
            }
        }
    }

    /// Call data, whichever envelope carries it.
    pub fn call_data(&self) -> &[u8] {
        match self {
            EthereumData::Legacy { call_data, .. }
            | EthereumData::Eip1559 { call_data, .. }
            | EthereumData::Eip7702 { call_data, .. } => call_data,
        }
    }

    fn payload_item(&self) -> RlpItem {
        let bytes = |v: &Vec<u8>| RlpItem::Bytes(v.clone());
        match self {
            EthereumData::Legacy { nonce, gas_price, gas_limit, to, value, call_data, v, r, s } => {
                RlpItem::List(vec![
                    bytes(nonce),
                    bytes(gas_price),
                    bytes(gas_limit),
                    bytes(to),
                    bytes(value),
                    bytes(call_data),
                    bytes(v),
                    bytes(r),
                    bytes(s),
                ])
            }
            EthereumData::Eip1559 {
                chain_id,
                nonce,
                max_priority_gas,
                max_gas,
                gas_limit,
                to,
                value,
                call_data,
                access_list,
                recovery_id,
                r,
                s,
            } => RlpItem::List(vec![
                bytes(chain_id),
                bytes(nonce),
                bytes(max_priority_gas),
                bytes(max_gas),
                bytes(gas_limit),
                bytes(to),
                bytes(value),
                bytes(call_data),
                encode_access_list(access_list),
                bytes(recovery_id),
                bytes(r),
                bytes(s),
            ]),
            EthereumData::Eip7702 {
                chain_id,
                nonce,
                max_priority_gas,
                max_gas,
                gas_limit,
                to,
                value,
                call_data,
                access_list,
                authorization_list,
                recovery_id,
                r,
                s,
            } => RlpItem::List(vec![
                bytes(chain_id),
                bytes(nonce),
                bytes(max_priority_gas),
                bytes(max_gas),
                bytes(gas_limit),
                bytes(to),
                bytes(value),
                bytes(call_data),
                encode_access_list(access_list),
                encode_authorization_list(authorization_list),
                bytes(recovery_id),
                bytes(r),
                bytes(s),
            ]),
        }
    }

    fn decode_legacy(bytes: &[u8]) -> Result<Self, RlpError> {
        let fields = decode_fields(bytes, 9)?;
        let mut f = fields.into_iter();
        let mut next = || field_bytes(&mut f);
        Ok(EthereumData::Legacy {
            nonce: next()?,
            gas_price: next()?,
            gas_limit: next()?,
            to: next()?,
            value: next()?,
            call_data: next()?,
            v: next()?,
            r: next()?,
            s: next()?,
        })
    }

    fn decode_eip1559(bytes: &[u8]) -> Result<Self, RlpError> {
        let fields = decode_fields(bytes, 12)?;
        let mut f = fields.into_iter();
        Ok(EthereumData::Eip1559 {
            chain_id: field_bytes(&mut f)?,
            nonce: field_bytes(&mut f)?,
            max_priority_gas: field_bytes(&mut f)?,
            max_gas: field_bytes(&mut f)?,
            gas_limit: field_bytes(&mut f)?,
            to: field_bytes(&mut f)?,
            value: field_bytes(&mut f)?,
            call_data: field_bytes(&mut f)?,
            access_list: decode_access_list(&next_item(&mut f)?)?,
            recovery_id: field_bytes(&mut f)?,
            r: field_bytes(&mut f)?,
            s: field_bytes(&mut f)?,
        })
    }

    fn decode_eip7702(bytes: &[u8]) -> Result<Self, RlpError> {
        let fields = decode_fields(bytes, 13)?;
        let mut f = fields.into_iter();
        Ok(EthereumData::Eip7702 {
            chain_id: field_bytes(&mut f)?,
            nonce: field_bytes(&mut f)?,
            max_priority_gas: field_bytes(&mut f)?,
            max_gas: field_bytes(&mut f)?,
            gas_limit: field_bytes(&mut f)?,
            to: field_bytes(&mut f)?,
            value: field_bytes(&mut f)?,
            call_data: field_bytes(&mut f)?,
            access_list: decode_access_list(&next_item(&mut f)?)?,
            authorization_list: decode_authorization_list(&next_item(&mut f)?)?,
            recovery_id: field_bytes(&mut f)?,
            r: field_bytes(&mut f)?,
            s: field_bytes(&mut f)?,
        })
    }
}

fn decode_fields(bytes: &[u8], expected: usize) -> Result<Vec<RlpItem>, RlpError> {
    let item = RlpItem::decode_all(bytes)?;
    let list = item.as_list()?;
    if list.len() != expected {
        return Err(RlpError::WrongArity { expected, got: list.len() });
    }
    Ok(list.to_vec())
}

fn next_item(f: &mut impl Iterator<Item = RlpItem>) -> Result<RlpItem, RlpError> {
    f.next().ok_or(RlpError::Truncated)
}

fn field_bytes(f: &mut impl Iterator<Item = RlpItem>) -> Result<Vec<u8>, RlpError> {
    Ok(next_item(f)?.as_bytes()?.to_vec())
}

fn encode_access_list(entries: &[AccessEntry]) -> RlpItem {
    RlpItem::List(
        entries
            .iter()
            .map(|entry| {
                RlpItem::List(vec![
                    RlpItem::Bytes(entry.address.clone()),
                    RlpItem::List(
                        entry.storage_keys.iter().map(|k| RlpItem::Bytes(k.clone())).collect(),
                    ),
                ])
            })
            .collect(),
    )
}

fn decode_access_list(item: &RlpItem) -> Result<Vec<AccessEntry>, RlpError> {
    item.as_list()?
        .iter()
        .map(|entry| {
            let pair = entry.as_list()?;
            if pair.len() != 2 {
                return Err(RlpError::WrongArity { expected: 2, got: pair.len() });
            }
            Ok(AccessEntry {
                address: pair[0].as_bytes()?.to_vec(),
                storage_keys: pair[1]
                    .as_list()?
                    .iter()
                    .map(|k| Ok(k.as_bytes()?.to_vec()))
                    .collect::<Result<_, RlpError>>()?,
            })
        })
        .collect()
}

fn encode_authorization_list(entries: &[Authorization]) -> RlpItem {
    RlpItem::List(
        entries
            .iter()
            .map(|auth| {
                RlpItem::List(vec![
                    RlpItem::Bytes(auth.chain_id.clone()),
                    RlpItem::Bytes(auth.address.clone()),
                    RlpItem::Bytes(auth.nonce.clone()),
                    RlpItem::Bytes(auth.y_parity.clone()),
                    RlpItem::Bytes(auth.r.clone()),
                    RlpItem::Bytes(auth.s.clone()),
                ])
            })
            .collect(),
    )
}

fn decode_authorization_list(item: &RlpItem) -> Result<Vec<Authorization>, RlpError> {
    item.as_list()?
        .iter()
        .map(|entry| {
            let fields = entry.as_list()?;
            if fields.len() != 6 {
                return Err(RlpError::WrongArity { expected: 6, got: fields.len() });
            }
            Ok(Authorization {
                chain_id: fields[0].as_bytes()?.to_vec(),
                address: fields[1].as_bytes()?.to_vec(),
                nonce: fields[2].as_bytes()?.to_vec(),
                y_parity: fields[3].as_bytes()?.to_vec(),
                r: fields[4].as_bytes()?.to_vec(),
                s: fields[5].as_bytes()?.to_vec(),
            })
        })
        .collect()
}
