//! File service transactions: create and (chunked) append.

use crate::crypto::KeyList;
use crate::error::{CodecError, Error, Result};
use crate::ids::{FileId, LedgerId, Timestamp};
use crate::transaction::{
    tag, ChunkInfo, ChunkedTransactionData, Transaction, TransactionData,
};
use crate::wire::{Service, WireDecode, WireEncode, WireReader, WireWriter};

// ---------------------------------------------------------------------------
// FileCreate
// ---------------------------------------------------------------------------

/// Creates a file on the ledger with initial contents.
pub type FileCreateTransaction = Transaction<FileCreateTransactionData>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCreateTransactionData {
    keys: Option<KeyList>,
    contents: Vec<u8>,
    file_memo: String,
    expiration_time: Option<Timestamp>,
}

impl TransactionData for FileCreateTransactionData {
    fn service(&self) -> Service {
        Service::File
    }

    fn variant_tag(&self) -> u8 {
        tag::FILE_CREATE
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.keys.as_ref(), |w, keys| keys.encode(w));
        w.put_bytes(&self.contents);
        w.put_str(&self.file_memo);
        w.put_option(self.expiration_time.as_ref(), |w, t| t.encode(w));
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::FILE_CREATE {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let keys = r.read_option("file keys", KeyList::decode)?;
        let contents = r.read_bytes("file contents")?;
        let file_memo = r.read_str("file memo")?;
        let expiration_time = r.read_option("expiration time", Timestamp::decode)?;
        Ok(FileCreateTransactionData { keys, contents, file_memo, expiration_time })
    }
}

impl FileCreateTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The keys that may modify or delete the file.
    pub fn set_keys(&mut self, keys: KeyList) -> Result<&mut Self> {
        self.data_mut()?.keys = Some(keys);
        Ok(self)
    }

    /// Initial file contents. Large files are created small and extended
    /// with [`super::FileAppendTransaction`].
    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut()?.contents = contents.into();
        Ok(self)
    }

    /// The file's memo.
    pub fn set_file_memo(&mut self, memo: impl Into<String>) -> Result<&mut Self> {
        self.data_mut()?.file_memo = memo.into();
        Ok(self)
    }

    /// When the file expires.
    pub fn set_expiration_time(&mut self, time: Timestamp) -> Result<&mut Self> {
        self.data_mut()?.expiration_time = Some(time);
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// FileAppend (chunked)
// ---------------------------------------------------------------------------

/// Appends contents to an existing file, splitting large payloads into
/// chained chunks.
pub type FileAppendTransaction = Transaction<FileAppendTransactionData>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAppendTransactionData {
    file_id: Option<FileId>,
    contents: Vec<u8>,
    chunk_info: Option<ChunkInfo>,
}

impl TransactionData for FileAppendTransactionData {
    fn service(&self) -> Service {
        Service::File
    }

    fn variant_tag(&self) -> u8 {
        tag::FILE_APPEND
    }

    fn encode_fields(&self, w: &mut WireWriter) {
        w.put_option(self.file_id.as_ref(), |w, id| id.encode(w));
        w.put_bytes(&self.contents);
        w.put_option(self.chunk_info.as_ref(), |w, info| info.encode(w));
    }

    fn decode_for_tag(tag_byte: u8, r: &mut WireReader<'_>) -> std::result::Result<Self, CodecError> {
        if tag_byte != tag::FILE_APPEND {
            return Err(CodecError::UnknownTag { kind: "transaction variant", tag: tag_byte });
        }
        let file_id = r.read_option("file id", FileId::decode)?;
        let contents = r.read_bytes("append contents")?;
        let chunk_info = r.read_option("chunk info", ChunkInfo::decode)?;
        Ok(FileAppendTransactionData { file_id, contents, chunk_info })
    }

    fn validate(&self) -> Result<()> {
        if self.file_id.is_none() {
            return Err(Error::argument("file append requires a file id"));
        }
        Ok(())
    }

    fn validate_checksums(&self, ledger_id: &LedgerId) -> Result<()> {
        if let Some(id) = &self.file_id {
            id.validate_checksum(ledger_id)?;
        }
        Ok(())
    }

    fn chunk_payload_len(&self) -> Option<usize> {
        Some(self.contents.len())
    }

    fn for_chunk(&self, info: ChunkInfo, chunk_size: usize) -> Self {
        let start = (info.number as usize - 1) * chunk_size;
        let end = (start + chunk_size).min(self.contents.len());
        FileAppendTransactionData {
            file_id: self.file_id,
            contents: self.contents[start..end].to_vec(),
            chunk_info: Some(info),
        }
    }

    fn finish_from_chunks(&mut self, tail: Vec<Self>) {
        self.chunk_info = None;
        for part in tail {
            self.contents.extend_from_slice(&part.contents);
        }
    }
}

impl ChunkedTransactionData for FileAppendTransactionData {}

impl FileAppendTransaction {
    pub fn new() -> Self {
        Transaction::default()
    }

    /// The file being appended to.
    pub fn set_file_id(&mut self, id: FileId) -> Result<&mut Self> {
        self.data_mut()?.file_id = Some(id);
        Ok(self)
    }

    /// The bytes to append.
    pub fn set_contents(&mut self, contents: impl Into<Vec<u8>>) -> Result<&mut Self> {
        self.data_mut()?.contents = contents.into();
        Ok(self)
    }

    /// The full (unchunked) contents.
    pub fn contents(&self) -> &[u8] {
        &self.data().contents
    }
}
