//! Network freeze / upgrade coordination.

use crate::error::{CodecError, Error, Result};
use crate::ids::{FileId, Timestamp};
use crate::transaction::{tag, Transaction, TransactionData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Schedules a network-wide freeze or upgrade.
pub type FreezeTransaction = Transaction<FreezeTransactionData>;

/// What kind of freeze is being scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreezeType {
    /// No meaning; rejected by validation.
    #[default]
    Unknown,
    /// Freeze at the given time, resume manually.
    FreezeOnly,
    /// Stage an upgrade file without freezing.
    PrepareUpgrade,
    /// Freeze and apply a previously prepared upgrade.
    FreezeUpgrade,
    /// Cancel a pending freeze.
    FreezeAbort,
    /// Update auxiliary telemetry software without a freeze.
    TelemetryUpgrade,
}

impl FreezeType {
    const fn code(self) -> u8 {
        match self {
            FreezeType::Unknown => 0,
            FreezeType::FreezeOnly => 1,
            FreezeType::PrepareUpgrade => 2,
            FreezeType::FreezeUpgrade => 3,
            FreezeType::FreezeAbort => 4,
            FreezeType::TelemetryUpgrade => 5,
        }
    }

    fn from_code(code: u8) -> std::result::Result<Self, CodecError> {
        Ok(match code {
            0 => FreezeType::Unknown,
            1 => FreezeType::FreezeOnly,
            2 => FreezeType::PrepareUpgrade,
            3 => FreezeType::FreezeUpgrade,
            4 => FreezeType::FreezeAbort,
            5 => FreezeType::TelemetryUpgrade,
            other => return Err(CodecError::UnknownTag { kind: "freeze type", tag: other }),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreezeTransactionData {
    start_time: Option<Timestamp>,
    file_id: Option<FileId>,
    file_hash: Vec<u8>,
    freeze_type: FreezeType,
}

impl TransactionData for FreezeTransactionData {
    fn service(&self) -> Service {
        Service::Freeze
    }

    fn variant_tag(&self) -> u8 {
        tag::FREEZE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.start_time.as_ref(), |w, t| t.encode(w));
        w.put_option(self.file_id.as_ref(), |w, id| id.encode(w));
        w.put_bytes(&self.file_hash);
        w.put_u8(self.freeze_type.code());
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::FREEZE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let start_time = r.read_option("start time", Timestamp::decode)?;
        let file_id = r.read_option("upgrade file id", FileId::decode)?;
        let file_hash = r.read_bytes("upgrade file hash")?;
        let freeze_type = FreezeType::from_code(r.read_u8("freeze type")?)?;
        Ok(FreezeTransactionData { start_time, file_id, file_hash, freeze_type })
    }

    fn validate(&self) -> Result<()> {
        match self.freeze_type {
            FreezeType::Unknown => Err(Error::argument("freeze type must be set")),
            FreezeType::FreezeOnly | FreezeType::FreezeUpgrade if self.start_time.is_none() => {
                Err(Error::argument("this freeze type requires a start time"))
            }
            FreezeType::PrepareUpgrade | FreezeType::FreezeUpgrade | FreezeType::TelemetryUpgrade
                if self.file_id.is_none() =>
            {
                Err(Error::argument("this freeze type requires an upgrade file"))
            }
            _ => Ok(()),
        }
    }
}

impl FreezeTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// When the freeze takes effect.
    pub fn set_start_time(&mut self, time: Timestamp) -> Result<&mut Self> {
        self.data_mut()?.start_time = Some(time);
        Ok(self)
    }

    /// The staged upgrade file.
    pub fn set_file_id(&mut self, id: FileId) -> Result<&mut Self> {
        self.data_mut()?.file_id = Some(id);
        Ok(self)
    }

    /// Hash the upgrade file must match.
    pub fn set_file_hash(&mut self, hash: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut()?.file_hash = hash.into();
        Ok(self)
    }

    /// The kind of freeze.
    pub fn set_freeze_type(&mut self, freeze_type: FreezeType) -> Result<&mut Self> {
        self.data_mut()?.freeze_type = freeze_type;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_freeze_type_fails_validation() {
        let data = FreezeTransactionData::default();
        assert!(data.validate().is_err());
    }

    #[test]
    fn freeze_only_requires_start_time() {
        let mut data = FreezeTransactionData { freeze_type: FreezeType::FreezeOnly, ..Default::default() };
        assert!(data.validate().is_err());
        data.start_time = Some(Timestamp { seconds: 2_000_000_000, nanos: 0 });
        data.validate().unwrap();
    }

    #[test]
    fn upgrade_requires_file() {
        let data = FreezeTransactionData {
            freeze_type: FreezeType::PrepareUpgrade,
            ..Default::default()
        };
        assert!(data.validate().is_err());
    }

    #[test]
    fn fields_round_trip() {
        let data = FreezeTransactionData {
            start_time: Some(Timestamp { seconds: 2_000_000_000, nanos: 5 }),
            file_id: Some(FileId::new(150)),
            file_hash: vec![0xAA; 48],
            freeze_type: FreezeType::FreezeUpgrade,
        };
        let mut w = WireWriter::new();
        data.encode_fields(&mut w);
        let bytes = w.finish();
        let mut r = WireReader::new(&bytes);
        let decoded = FreezeTransactionData::decode_for_tag(tag::FREEZE, &mut r).unwrap();
        assert_eq!(decoded, data);
    }
}
