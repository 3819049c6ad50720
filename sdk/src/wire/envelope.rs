//! Request and response envelopes.
//!
//! Each RPC frame on a node channel is one envelope. Requests open with the
//! protocol preamble (magic + version) so a node can reject stray traffic
//! without parsing further; responses are only ever read off a connection we
//! opened, so they skip the preamble and carry the `(precheck, cost, body)`
//! header the query and transaction layers both consume.

use crate::config::{PROTOCOL_MAGIC, WIRE_PROTOCOL_VERSION};
use crate::error::CodecError;
use crate::wire::codec::{WireDecode, WireEncode, WireReader, WireWriter};
use crate::wire::service::{RequestKind, Service};
use crate::wire::status::Status;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One routed request: preamble, service tag, kind, opaque payload.
///
/// For transactions the payload is the *outer* transaction bytes (signed
/// envelope); for queries it is the encoded query (header + variant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    /// Which ledger service should handle this.
    pub service: Service,
    /// Transaction or query.
    pub kind: RequestKind,
    /// Variant-specific wire bytes, opaque at this layer.
    pub payload: Vec<u8>,
}

impl WireEncode for RequestEnvelope {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u32(PROTOCOL_MAGIC);
        w.put_u16(WIRE_PROTOCOL_VERSION);
        w.put_u8(self.service.tag());
        w.put_u8(self.kind.tag());
        w.put_bytes(&self.payload);
    }
}

impl WireDecode for RequestEnvelope {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let magic = r.read_u32("magic")?;
        if magic != PROTOCOL_MAGIC {
            return Err(CodecError::MalformedField("magic"));
        }
        let version = r.read_u16("protocol version")?;
        if version != WIRE_PROTOCOL_VERSION {
            return Err(CodecError::MalformedField("protocol version"));
        }
        let service = Service::from_tag(r.read_u8("service")?)?;
        let kind = RequestKind::from_tag(r.read_u8("request kind")?)?;
        let payload = r.read_bytes("payload")?;
        Ok(RequestEnvelope { service, kind, payload })
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The header every node response carries, plus the variant body.
///
/// `cost` doubles as the answer to a `COST_ANSWER` query and as the fee
/// actually required when a pre-check fails with an insufficient-fee status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// Pre-check (outer) status.
    pub precheck: Status,
    /// Cost in tinybars; meaning depends on the request.
    pub cost: u64,
    /// Variant-specific response bytes; empty for plain transaction acks.
    pub body: Vec<u8>,
}

impl ResponseEnvelope {
    /// A bare acknowledgement with the given status and no body.
    pub fn ack(precheck: Status) -> Self {
        ResponseEnvelope { precheck, cost: 0, body: Vec::new() }
    }
}

impl WireEncode for ResponseEnvelope {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u32(self.precheck.code());
        w.put_u64(self.cost);
        w.put_bytes(&self.body);
    }
}

impl WireDecode for ResponseEnvelope {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let precheck = Status::from_code(r.read_u32("precheck")?);
        let cost = r.read_u64("cost")?;
        let body = r.read_bytes("response body")?;
        Ok(ResponseEnvelope { precheck, cost, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trip() {
        let req = RequestEnvelope {
            service: Service::Consensus,
            kind: RequestKind::Transaction,
            payload: vec![1, 2, 3, 4],
        };
        let bytes = req.to_wire_bytes();
        assert_eq!(RequestEnvelope::from_wire_bytes(&bytes).unwrap(), req);
    }

    #[test]
    fn request_rejects_bad_magic() {
        let req = RequestEnvelope {
            service: Service::Crypto,
            kind: RequestKind::Query,
            payload: vec![],
        };
        let mut bytes = req.to_wire_bytes();
        bytes[0] ^= 0xFF;
        assert!(RequestEnvelope::from_wire_bytes(&bytes).is_err());
    }

    #[test]
    fn request_rejects_future_version() {
        let req = RequestEnvelope {
            service: Service::Crypto,
            kind: RequestKind::Query,
            payload: vec![],
        };
        let mut bytes = req.to_wire_bytes();
        bytes[4] = 0xFF;
        assert!(RequestEnvelope::from_wire_bytes(&bytes).is_err());
    }

    #[test]
    fn response_round_trip() {
        let resp = ResponseEnvelope {
            precheck: Status::Busy,
            cost: 25_000,
            body: b"answer".to_vec(),
        };
        let bytes = resp.to_wire_bytes();
        assert_eq!(ResponseEnvelope::from_wire_bytes(&bytes).unwrap(), resp);
    }

    #[test]
    fn ack_has_no_body() {
        let ack = ResponseEnvelope::ack(Status::Ok);
        assert_eq!(ack.cost, 0);
        assert!(ack.body.is_empty());
    }
}
