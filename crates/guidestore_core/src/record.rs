//! Log record format.
//!
//! Every record in the database file has the same envelope:
//!
//! ```text
//! | record_len (4) | kind (1) | collection_id (4) | entity_id (16) | payload | crc32 (4) |
//! ```
//!
//! All integers are little-endian. `record_len` covers the whole record,
//! including itself and the trailing checksum.

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};
use crate::types::CollectionId;

/// Kind of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Declares a collection; the payload is its UTF-8 name.
    Collection,
    /// Latest version of a document; the payload is CBOR.
    Put,
    /// The document was deleted.
    Tombstone,
}

impl RecordKind {
    const fn as_byte(self) -> u8 {
        match self {
            Self::Collection => 1,
            Self::Put => 2,
            Self::Tombstone => 3,
        }
    }

    fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Collection),
            2 => Some(Self::Put),
            3 => Some(Self::Tombstone),
            _ => None,
        }
    }
}

/// A single record in the database log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Record kind.
    pub kind: RecordKind,
    /// Collection the record belongs to.
    pub collection_id: CollectionId,
    /// Document id (nil for collection declarations).
    pub entity_id: EntityId,
    /// Record payload.
    pub payload: Vec<u8>,
}

impl Record {
    /// record_len (4) + kind (1) + collection_id (4) + entity_id (16)
    pub const HEADER_SIZE: usize = 25;
    /// Trailing CRC32.
    pub const CRC_SIZE: usize = 4;

    /// Creates a collection declaration.
    #[must_use]
    pub fn collection(collection_id: CollectionId, name: &str) -> Self {
        Self {
            kind: RecordKind::Collection,
            collection_id,
            entity_id: EntityId::nil(),
            payload: name.as_bytes().to_vec(),
        }
    }

    /// Creates a document put record.
    #[must_use]
    pub fn put(collection_id: CollectionId, entity_id: EntityId, payload: Vec<u8>) -> Self {
        Self {
            kind: RecordKind::Put,
            collection_id,
            entity_id,
            payload,
        }
    }

    /// Creates a tombstone record.
    #[must_use]
    pub fn tombstone(collection_id: CollectionId, entity_id: EntityId) -> Self {
        Self {
            kind: RecordKind::Tombstone,
            collection_id,
            entity_id,
            payload: Vec::new(),
        }
    }

    /// Returns the encoded size of this record.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len() + Self::CRC_SIZE
    }

    /// Encodes the record to bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let record_len = self.encoded_size();
        let mut buf = Vec::with_capacity(record_len);

        buf.extend_from_slice(&(record_len as u32).to_le_bytes());
        buf.push(self.kind.as_byte());
        buf.extend_from_slice(&self.collection_id.as_u32().to_le_bytes());
        buf.extend_from_slice(self.entity_id.as_bytes());
        buf.extend_from_slice(&self.payload);

        let crc = compute_crc32(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());

        buf
    }

    /// Reads the length prefix of a record.
    ///
    /// Returns `None` if fewer than four bytes are available.
    #[must_use]
    pub fn peek_len(data: &[u8]) -> Option<usize> {
        let prefix: [u8; 4] = data.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(prefix) as usize)
    }

    /// Decodes a record that starts at `offset` in the file.
    ///
    /// # Errors
    ///
    /// Returns `ChecksumMismatch` if the CRC does not match and
    /// `InvalidFormat` for structurally impossible records.
    pub fn decode(data: &[u8], offset: u64) -> CoreResult<Self> {
        let record_len = Self::peek_len(data)
            .ok_or_else(|| CoreError::invalid_format(format!("record at {offset} too short")))?;

        if record_len < Self::HEADER_SIZE + Self::CRC_SIZE || data.len() < record_len {
            return Err(CoreError::invalid_format(format!(
                "record at {offset} has invalid length {record_len}"
            )));
        }

        let body = &data[..record_len - Self::CRC_SIZE];
        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&data[record_len - Self::CRC_SIZE..record_len]);
        let expected = u32::from_le_bytes(crc_bytes);
        let actual = compute_crc32(body);
        if expected != actual {
            return Err(CoreError::ChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }

        let kind = RecordKind::from_byte(body[4]).ok_or_else(|| {
            CoreError::invalid_format(format!("unknown record kind {} at {offset}", body[4]))
        })?;

        let mut collection_bytes = [0u8; 4];
        collection_bytes.copy_from_slice(&body[5..9]);
        let collection_id = CollectionId::new(u32::from_le_bytes(collection_bytes));

        let entity_id = EntityId::from_slice(&body[9..Self::HEADER_SIZE])
            .ok_or_else(|| CoreError::invalid_format("invalid entity id"))?;

        Ok(Self {
            kind,
            collection_id,
            entity_id,
            payload: body[Self::HEADER_SIZE..].to_vec(),
        })
    }
}

/// Computes the IEEE CRC32 of `data`.
#[must_use]
pub fn compute_crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                crc = if crc & 1 != 0 {
                    (crc >> 1) ^ 0xEDB8_8320
                } else {
                    crc >> 1
                };
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        crc = (crc >> 8) ^ TABLE[((crc ^ u32::from(byte)) & 0xFF) as usize];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_known_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(compute_crc32(b""), 0);
    }

    #[test]
    fn put_record_decodes() {
        let id = EntityId::new();
        let record = Record::put(CollectionId::new(3), id, vec![0xA1, 0x01, 0x02]);
        let bytes = record.encode();

        assert_eq!(bytes.len(), record.encoded_size());
        assert_eq!(Record::peek_len(&bytes), Some(bytes.len()));
        assert_eq!(Record::decode(&bytes, 0).unwrap(), record);
    }

    #[test]
    fn collection_record_carries_name() {
        let record = Record::collection(CollectionId::new(1), "guides");
        let decoded = Record::decode(&record.encode(), 0).unwrap();

        assert_eq!(decoded.kind, RecordKind::Collection);
        assert!(decoded.entity_id.is_nil());
        assert_eq!(decoded.payload, b"guides");
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let record = Record::put(CollectionId::new(1), EntityId::new(), b"payload".to_vec());
        let mut bytes = record.encode();
        bytes[Record::HEADER_SIZE] ^= 0xFF;

        let err = Record::decode(&bytes, 64).unwrap_err();
        assert!(matches!(err, CoreError::ChecksumMismatch { offset: 64, .. }));
    }

    #[test]
    fn truncated_record_is_rejected() {
        let record = Record::tombstone(CollectionId::new(1), EntityId::new());
        let bytes = record.encode();

        assert!(Record::decode(&bytes[..bytes.len() - 1], 0).is_err());
        assert_eq!(Record::peek_len(&bytes[..3]), None);
    }
}
