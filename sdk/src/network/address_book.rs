//! The node address book: who the network's peers are and how to reach them.
//!
//! The ledger publishes a signed address book as an on-ledger file; the SDK
//! consumes it (from the wire codec or from JSON) to hot-swap the node map
//! and to refresh per-node certificate hashes when TLS pinning is on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Error};
use crate::ids::AccountId;
use crate::wire::{WireDecode, WireEncode, WireReader, WireWriter};

/// A `host:port` pair a node listens on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// DNS name or IP literal.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint { host: host.into(), port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::argument(format!("`{s}` is not a host:port endpoint")))?;
        if host.is_empty() {
            return Err(Error::argument(format!("`{s}` has an empty host")));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| Error::argument(format!("`{s}` has an invalid port")))?;
        Ok(Endpoint::new(host, port))
    }
}

impl WireEncode for Endpoint {
    fn encode(&self, w: &mut WireWriter) {
        w.put_str(&self.host);
        w.put_u16(self.port);
    }
}

impl WireDecode for Endpoint {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let host = r.read_str("endpoint host")?;
        let port = r.read_u16("endpoint port")?;
        Ok(Endpoint { host, port })
    }
}

/// One node's published contact card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAddress {
    /// The node's peer identity.
    pub account_id: AccountId,
    /// Every endpoint this node serves; any of them is the same peer.
    pub endpoints: Vec<Endpoint>,
    /// SHA-384 of the node's TLS certificate, for pinning. Hex in JSON.
    #[serde(default, with = "hex_opt")]
    pub cert_hash: Option<Vec<u8>>,
    /// Free-text operator description.
    #[serde(default)]
    pub description: String,
}

impl WireEncode for NodeAddress {
    fn encode(&self, w: &mut WireWriter) {
        self.account_id.encode(w);
        w.put_seq(&self.endpoints, |w, e| e.encode(w));
        w.put_option(self.cert_hash.as_ref(), |w, h| w.put_bytes(h));
        w.put_str(&self.description);
    }
}

impl WireDecode for NodeAddress {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let account_id = AccountId::decode(r)?;
        let endpoints = r.read_seq("node endpoints", Endpoint::decode)?;
        let cert_hash = r.read_option("node cert hash", |r| r.read_bytes("node cert hash"))?;
        let description = r.read_str("node description")?;
        Ok(NodeAddress { account_id, endpoints, cert_hash, description })
    }
}

/// The full address book.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeAddressBook {
    /// One entry per node.
    pub node_addresses: Vec<NodeAddress>,
}

impl NodeAddressBook {
    /// Finds the entry for a peer, if present.
    pub fn address_for(&self, account_id: &AccountId) -> Option<&NodeAddress> {
        self.node_addresses.iter().find(|a| &a.account_id == account_id)
    }

    /// Parses the JSON form (mirror-node export format).
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::argument(format!("address book json: {e}")))
    }
}

impl WireEncode for NodeAddressBook {
    fn encode(&self, w: &mut WireWriter) {
        w.put_seq(&self.node_addresses, |w, a| a.encode(w));
    }
}

impl WireDecode for NodeAddressBook {
    fn decode(r: &mut WireReader<'_>) -> Result<Self, CodecError> {
        let node_addresses = r.read_seq("address book", NodeAddress::decode)?;
        Ok(NodeAddressBook { node_addresses })
    }
}

mod hex_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let opt: Option<String> = Option::deserialize(d)?;
        opt.map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> NodeAddressBook {
        NodeAddressBook {
            node_addresses: vec![
                NodeAddress {
                    account_id: AccountId::new(3),
                    endpoints: vec![Endpoint::new("node0.example.net", 50211)],
                    cert_hash: Some(vec![0xAB; 48]),
                    description: "node 0".into(),
                },
                NodeAddress {
                    account_id: AccountId::new(4),
                    endpoints: vec![
                        Endpoint::new("node1.example.net", 50211),
                        Endpoint::new("node1-alt.example.net", 50211),
                    ],
                    cert_hash: None,
                    description: String::new(),
                },
            ],
        }
    }

    #[test]
    fn endpoint_parse_and_display() {
        let e: Endpoint = "node0.example.net:50211".parse().unwrap();
        assert_eq!(e, Endpoint::new("node0.example.net", 50211));
        assert_eq!(e.to_string(), "node0.example.net:50211");

        assert!("no-port".parse::<Endpoint>().is_err());
        assert!(":50211".parse::<Endpoint>().is_err());
        assert!("host:99999".parse::<Endpoint>().is_err());
    }

    #[test]
    fn wire_round_trip() {
        let book = sample_book();
        let bytes = book.to_wire_bytes();
        assert_eq!(NodeAddressBook::from_wire_bytes(&bytes).unwrap(), book);
    }

    #[test]
    fn json_round_trip() {
        let book = sample_book();
        let json = serde_json::to_string(&book).unwrap();
        assert_eq!(NodeAddressBook::from_json(&json).unwrap(), book);
    }

    #[test]
    fn address_lookup() {
        let book = sample_book();
        assert!(book.address_for(&AccountId::new(3)).is_some());
        assert!(book.address_for(&AccountId::new(99)).is_none());
    }
}
