//! Service routing tags.
//!
//! Every request names the ledger service that should handle it. Nodes use
//! the tag to dispatch before touching the payload, so the tag lives in the
//! request envelope, not inside the (signed, opaque) transaction bytes.

use crate::error::CodecError;

/// The fixed set of ledger services a request can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Accounts, transfers, allowances.
    Crypto,
    /// Fungible and non-fungible tokens.
    Token,
    /// The on-ledger file store.
    File,
    /// Smart contract deployment and calls.
    Contract,
    /// Consensus topics and messages.
    Consensus,
    /// Scheduled transactions.
    Schedule,
    /// Network metadata (version info, receipts).
    Network,
    /// Utility operations (pseudorandom numbers, atomic batches).
    Util,
    /// The signed node address book.
    AddressBook,
    /// Network freeze / upgrade coordination.
    Freeze,
}

impl Service {
    /// On-wire routing tag.
    pub const fn tag(self) -> u8 {
        match self {
            Service::Crypto => 1,
            Service::Token => 2,
            Service::File => 3,
            Service::Contract => 4,
            Service::Consensus => 5,
            Service::Schedule => 6,
            Service::Network => 7,
            Service::Util => 8,
            Service::AddressBook => 9,
            Service::Freeze => 10,
        }
    }

    /// Reverse of [`Service::tag`].
    pub const fn from_tag(tag: u8) -> Result<Self, CodecError> {
        Ok(match tag {
            1 => Service::Crypto,
            2 => Service::Token,
            3 => Service::File,
            4 => Service::Contract,
            5 => Service::Consensus,
            6 => Service::Schedule,
            7 => Service::Network,
            8 => Service::Util,
            9 => Service::AddressBook,
            10 => Service::Freeze,
            other => return Err(CodecError::UnknownTag { kind: "service", tag: other }),
        })
    }
}

/// Whether a request envelope carries a transaction or a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// A signed, fee-paying state change.
    Transaction,
    /// A read, optionally carrying an embedded payment.
    Query,
}

impl RequestKind {
    pub const fn tag(self) -> u8 {
        match self {
            RequestKind::Transaction => 1,
            RequestKind::Query => 2,
        }
    }

    pub const fn from_tag(tag: u8) -> Result<Self, CodecError> {
        Ok(match tag {
            1 => RequestKind::Transaction,
            2 => RequestKind::Query,
            other => return Err(CodecError::UnknownTag { kind: "request kind", tag: other }),
        })
    }
}
