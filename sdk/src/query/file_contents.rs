//! File contents download. Paid.

use crate::error::{CodecError, Error, Result};
use crate::ids::{FileId, LedgerId};
use crate::query::{tag, Query, QueryData};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

/// Downloads the full contents of an on-ledger file.
pub type FileContentsQuery = Query<FileContentsQueryData>;

#[derive(Debug, Clone, Default)]
pub struct FileContentsQueryData {
    file_id: Option<FileId>,
}

/// The answer: the file and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    /// The queried file.
    pub file_id: FileId,
    /// The file's full contents at consensus.
    pub contents: Vec<u8>,
}

impl WireEncode for FileContents {
    fn encode(&self, w: &mut WireWriter) {
        self.file_id.encode(w);
        w.put_bytes(&self.contents);
    }
}

impl WireDecode for FileContents {
    fn decode(r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        Ok(FileContents {
            file_id: FileId::decode(r)?,
            contents: r.read_bytes("file contents")?,
        })
    }
}

impl QueryData for FileContentsQueryData {
    type Response = FileContents;

    fn service(&self) -> Service {
        Service::File
    }

    fn variant_tag(&self) -> u8 {
        tag::FILE_CONTENTS
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.file_id.as_ref(), |w, id| id.encode(w));
    }

    fn decode_response(&self, body: &[u8]) -> Result<Self::Response> {
        Ok(FileContents::from_wire_bytes(body)?)
    }

    fn validate(&self) -> Result<()> {
        if self.file_id.is_none() {
            return Err(Error::argument("file contents query requires a file id"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.file_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }
}

impl FileContentsQuery {
    pub fn new() -> Self {
        Query::default()
    }

    /// The file to download.
    pub fn set_file_id(&mut self, id: FileId) -> &mut Self {
        self.data_mut().file_id = Some(id);
        self
    }
}
