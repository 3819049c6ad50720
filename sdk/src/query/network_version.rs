//! Network version probe. Paid in principle; most networks quote zero.

use std::fmt;

use crate::error::{CodecError, Result};
use crate::query::{tag, Query, QueryData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Asks a node which protocol and services versions it runs.
pub type NetworkVersionInfoQuery = Query<NetworkVersionInfoQueryData>;

#[derive(Debug, Clone, Default)]
pub struct NetworkVersionInfoQueryData;

/// A `major.minor.patch` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SemanticVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl WireEncode for SemanticVersion {
    fn encode(&self, w: &mut WireWriter) {
        w.put_u32(self.major);
        w.put_u32(self.minor);
        w.put_u32(self.patch);
    }
}

impl WireDecode for SemanticVersion {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(SemanticVersion {
            major: r.read_u32("version major")?,
            minor: r.read_u32("version minor")?,
            patch: r.read_u32("version patch")?,
        })
    }
}

/// The answer: what the node is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkVersionInfo {
    /// Wire-protocol version the node speaks.
    pub protocol_version: SemanticVersion,
    /// Version of the node's service software.
    pub services_version: SemanticVersion,
}

impl WireEncode for NetworkVersionInfo {
    fn encode(&self, w: &mut WireWriter) {
        self.protocol_version.encode(w);
        self.services_version.encode(w);
    }
}

impl WireDecode for NetworkVersionInfo {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(NetworkVersionInfo {
            protocol_version: SemanticVersion::decode(r)?,
            services_version: SemanticVersion::decode(r)?,
        })
    }
}

impl QueryData for NetworkVersionInfoQueryData {
    type Response = NetworkVersionInfo;

    fn service(&self) -> Service {
        Service::Network
    }

    fn variant_tag(&self) -> u8 {
        tag::NETWORK_VERSION_INFO
    }

    fn encode_fields(&self, _w: &mut WireWriter) {}

    fn decode_response(&self, body: &[u8]) -> Result<Self::Response> {
        Ok(NetworkVersionInfo::from_wire_bytes(body)?)
    }
}

impl NetworkVersionInfoQuery {
    pub fn new() -> Self {
        Query::default()
    }
}
