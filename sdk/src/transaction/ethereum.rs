//! The Ethereum interop transaction: submits a raw, already-signed Ethereum
//! transaction for execution on the ledger's EVM surface.

use crate::error::{CodecError, Error, Result};
use crate::ethereum::EthereumData;
use crate::hbar::Hbar;
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Wraps RLP-encoded Ethereum transaction bytes for on-ledger execution.
pub type EthereumTransaction = Transaction<EthereumTransactionData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EthereumTransactionData {
    /// The raw RLP bytes, exactly as an Ethereum client would broadcast
    /// them. The ledger re-verifies the embedded signature.
    ethereum_data: Vec<u8>,
    /// Extra fee the payer is willing to cover beyond what the Ethereum
    /// transaction itself offers.
    max_gas_allowance: Hbar,
}

impl TransactionData for EthereumTransactionData {
    fn service(&self) -> Service {
        Service::Contract
    }

    fn variant_tag(&self) -> u8 {
        tag::ETHEREUM
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_bytes(&self.ethereum_data);
        w.put_i64(self.max_gas_allowance.to_tinybars());
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::ETHEREUM {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let ethereum_data = r.read_bytes("ethereum data")?;
        let max_gas_allowance = Hbar::from_tinybars(r.read_i64("max gas allowance")?);
        Ok(EthereumTransactionData { ethereum_data, max_gas_allowance })
    }

    fn validate(&self) -> Result<()> {
        if self.ethereum_data.is_empty() {
            return Err(Error::argument("ethereum transaction requires ethereum data"));
        }
        // Must at least parse as one of the supported envelope types.
        EthereumData::from_bytes(&self.ethereum_data)?;
        Ok(())
    }
}

impl EthereumTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// Raw RLP bytes of the signed Ethereum transaction.
    pub fn set_ethereum_data(&mut self, data: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut()?.ethereum_data = data.into();
        Ok(self)
    }

    /// Typed Ethereum data, re-encoded to RLP on the way in.
    pub fn set_ethereum_data_typed(&mut self, data: &EthereumData) -> Result<&mut Self> {
        self.data_mut()?.ethereum_data = data.to_bytes();
        Ok(self)
    }

    /// The payer's extra fee allowance.
    pub fn set_max_gas_allowance(&mut self, allowance: Hbar) -> Result<&mut Self> {
        self.data_mut()?.max_gas_allowance = allowance;
        Ok(self)
    }

    /// The raw Ethereum bytes.
    pub fn ethereum_data(&self) -> &[u8] {
        &self.data().ethereum_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_data_fails_validation() {
        let data = EthereumTransactionData::default();
        assert!(data.validate().is_err());
    }

    #[test]
    fn garbage_data_fails_validation() {
        let data = EthereumTransactionData {
            ethereum_data: vec![0x01, 0x02],
            max_gas_allowance: Hbar::ZERO,
        };
        assert!(data.validate().is_err());
    }

    #[test]
    fn fields_round_trip() {
        let legacy = crate::ethereum::EthereumData::Legacy {
            nonce: vec![0x01],
            gas_price: vec![0x09],
            gas_limit: vec![0x52, 0x08],
            to: vec![0x11; 20],
            value: vec![],
            call_data: vec![],
            v: vec![0x25],
            r: vec![0x44; 32],
            s: vec![0x55; 32],
        };
        let mut tx = EthereumTransaction::new();
        tx.set_ethereum_data_typed(&legacy)
            .unwrap()
            .set_max_gas_allowance(Hbar::new(2).unwrap())
            .unwrap();
        tx.data().validate().unwrap();

        let mut w = WireWriter::new();
        tx.data().encode_fields(&mut w);
        let bytes = w.finish();
        let mut r = WireReader::new(&bytes);
        let decoded = EthereumTransactionData::decode_for_tag(tag::ETHEREUM, &mut r).unwrap();
        assert_eq!(&decoded, tx.data());
    }
}
