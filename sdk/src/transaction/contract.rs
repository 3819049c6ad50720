//! Smart contract calls.

use crate::error::{CodecError, Error, Result};
use crate::hbar::Hbar;
use crate::ids::{ContractId, LedgerId};
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Calls a function of a deployed contract.
pub type ContractExecuteTransaction = Transaction<ContractExecuteTransactionData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractExecuteTransactionData {
    contract_id: Option<ContractId>,
    gas: u64,
    payable_amount: Hbar,
    function_parameters: Vec<u8>,
}

impl TransactionData for ContractExecuteTransactionData {
    fn service(&self) -> Service {
        Service::Contract
    }

    fn variant_tag(&self) -> u8 {
        tag::CONTRACT_EXECUTE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.contract_id.as_ref(), |w, id| id.encode(w));
        w.put_u64(self.gas);
        w.put_i64(self.payable_amount.to_tinybars());
        w.put_bytes(&self.function_parameters);
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::CONTRACT_EXECUTE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let contract_id = r.read_option("contract id", ContractId::decode)?;
        let gas = r.read_u64("gas")?;
        let payable_amount = Hbar::from_tinybars(r.read_i64("payable amount")?);
        let function_parameters = r.read_bytes("function parameters")?;
        Ok(ContractExecuteTransactionData {
            contract_id,
            gas,
            payable_amount,
            function_parameters,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.contract_id.is_none() {
            return Err(Error::argument("contract execute requires a contract id"));
        }
        if self.payable_amount.is_negative() {
            return Err(Error::argument("payable amount cannot be negative"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.contract_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl ContractExecuteTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The contract being called.
    pub fn set_contract_id(&mut self, id: ContractId) -> Result<&mut Self> {
        self.data_mut()?.contract_id = Some(id);
        Ok(self)
    }

    /// Gas limit for the call.
    pub fn set_gas(&mut self, gas: u64) -> Result<&mut Self> {
        self.data_mut()?.gas = gas;
        Ok(self)
    }

    /// Hbar sent along with the call, for payable functions.
    pub fn set_payable_amount(&mut self, amount: Hbar) -> Result<&mut Self> {
        self.data_mut()?.payable_amount = amount;
        Ok(self)
    }

    /// ABI-encoded call data.
    pub fn set_function_parameters(&mut self, parameters: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut()?.function_parameters = parameters.into();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_contract_id() {
        let data = ContractExecuteTransactionData::default();
        assert!(data.validate().is_err());
    }

    #[test]
    fn fields_round_trip() {
        let mut tx = ContractExecuteTransaction::new();
        tx.set_contract_id(ContractId::new(3_000))
            .unwrap()
            .set_gas(200_000)
            .unwrap()
            .set_payable_amount(Hbar::new(1).unwrap())
            .unwrap()
            .set_function_parameters(vec![0xde, 0xad, 0xbe, 0xef])
            .unwrap();

        let mut w = WireWriter::new();
        tx.data().encode_fields(&mut w);
        let bytes = w.finish();
        let mut r = WireReader::new(&bytes);
        let decoded =
            ContractExecuteTransactionData::decode_for_tag(tag::CONTRACT_EXECUTE, &mut r).unwrap();
        r.expect_end().unwrap();
        assert_eq!(&decoded, tx.data());
    }
}
