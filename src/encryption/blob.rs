//! Encrypted payload header codec
//!
//! Every encrypted value is a binary of subtype 6 (`Encrypt`) whose first
//! bytes are a fixed header:
//! - Scheme subtype (u8)
//! - Data key id (16 bytes, UUID byte order)
//! - Original BSON type (u8)
//! - Ciphertext (variable, opaque here)
//!
//! Documents carry binaries as Extended JSON:
//! `{"$binary": {"base64": "...", "subType": "06"}}`, or the legacy
//! `{"$binary": "...", "$type": "06"}`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Map, Value};
use thiserror::Error;
use uuid::Uuid;

use super::types::{BsonType, EncryptedBinDataType, EncryptedField};

/// Binary subtype marking an encrypted-data container
pub const BIN_DATA_SUBTYPE_ENCRYPT: u8 = 6;

/// Binary subtype for generic, unencrypted data
pub const BIN_DATA_SUBTYPE_GENERAL: u8 = 0;

/// Size in bytes of the fixed header
pub const FLE_BLOB_HEADER_LEN: usize = 1 + 16 + 1;

/// Why a value could not be read as an encrypted payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobDecodeError {
    #[error("value is not an Extended JSON binary")]
    NotBinary,
    #[error("binary payload is not valid base64")]
    InvalidBase64,
    #[error("binary subtype '{0}' is not a hex byte")]
    InvalidSubtype(String),
    #[error("binary subtype {0} is not an encrypted container")]
    NotEncrypted(u8),
    #[error("payload of {len} bytes is shorter than the 18-byte header")]
    TooShort { len: usize },
    #[error("unknown encrypted payload subtype {0}")]
    UnknownScheme(u8),
}

/// A binary value pulled out of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinData {
    pub subtype: u8,
    pub bytes: Vec<u8>,
}

impl BinData {
    pub fn new(subtype: u8, bytes: Vec<u8>) -> Self {
        Self { subtype, bytes }
    }

    /// Reads an Extended JSON binary.
    pub fn from_extended_json(value: &Value) -> Result<Self, BlobDecodeError> {
        let (b64, subtype) = binary_parts(value).ok_or(BlobDecodeError::NotBinary)?;
        let subtype = u8::from_str_radix(subtype, 16)
            .map_err(|_| BlobDecodeError::InvalidSubtype(subtype.to_string()))?;
        let bytes = STANDARD
            .decode(b64)
            .map_err(|_| BlobDecodeError::InvalidBase64)?;
        Ok(Self { subtype, bytes })
    }

    /// Renders as canonical Extended JSON.
    pub fn to_extended_json(&self) -> Value {
        json!({
            "$binary": {
                "base64": STANDARD.encode(&self.bytes),
                "subType": format!("{:02x}", self.subtype),
            }
        })
    }
}

/// Returns true if `value` has the structure of an Extended JSON binary.
///
/// Only the shape is checked; the payload may still fail to decode.
pub fn is_binary(value: &Value) -> bool {
    binary_parts(value).is_some()
}

fn binary_parts(value: &Value) -> Option<(&str, &str)> {
    let obj: &Map<String, Value> = value.as_object()?;
    match obj.len() {
        1 => {
            let inner = obj.get("$binary")?.as_object()?;
            if inner.len() != 2 {
                return None;
            }
            Some((inner.get("base64")?.as_str()?, inner.get("subType")?.as_str()?))
        }
        2 => Some((obj.get("$binary")?.as_str()?, obj.get("$type")?.as_str()?)),
        _ => None,
    }
}

/// Header prefixing an encrypted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleBlobHeader {
    pub subtype: EncryptedBinDataType,
    pub key_id: Uuid,
    /// Raw type byte; not every byte names a `BsonType`
    pub original_bson_type: u8,
}

impl FleBlobHeader {
    pub fn new(subtype: EncryptedBinDataType, key_id: Uuid, original: BsonType) -> Self {
        Self {
            subtype,
            key_id,
            original_bson_type: original.as_byte(),
        }
    }

    /// Header for a payload encrypting `field` under the given scheme.
    pub fn for_field(field: &EncryptedField, subtype: EncryptedBinDataType) -> Self {
        Self::new(subtype, field.key_id, field.bson_type)
    }

    /// Returns the original type, if the stored byte names one
    pub fn original_type(&self) -> Option<BsonType> {
        BsonType::from_byte(self.original_bson_type)
    }

    /// Decodes the header from the front of a payload.
    ///
    /// Bytes past the header are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, BlobDecodeError> {
        if bytes.len() < FLE_BLOB_HEADER_LEN {
            return Err(BlobDecodeError::TooShort { len: bytes.len() });
        }
        let subtype = EncryptedBinDataType::from_u8(bytes[0])
            .ok_or(BlobDecodeError::UnknownScheme(bytes[0]))?;

        let mut key = [0u8; 16];
        key.copy_from_slice(&bytes[1..17]);

        Ok(Self {
            subtype,
            key_id: Uuid::from_bytes(key),
            original_bson_type: bytes[17],
        })
    }

    /// Decodes the header of an encrypted binary held in a document.
    pub fn decode_value(value: &Value) -> Result<Self, BlobDecodeError> {
        let bin = BinData::from_extended_json(value)?;
        if bin.subtype != BIN_DATA_SUBTYPE_ENCRYPT {
            return Err(BlobDecodeError::NotEncrypted(bin.subtype));
        }
        Self::decode(&bin.bytes)
    }

    /// Encodes the header alone.
    pub fn encode(&self) -> Vec<u8> {
        self.encode_with_ciphertext(&[])
    }

    /// Encodes the header followed by `ciphertext`.
    pub fn encode_with_ciphertext(&self, ciphertext: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FLE_BLOB_HEADER_LEN + ciphertext.len());
        buf.push(self.subtype.as_u8());
        buf.extend_from_slice(self.key_id.as_bytes());
        buf.push(self.original_bson_type);
        buf.extend_from_slice(ciphertext);
        buf
    }

    /// Wraps the encoded header as an encrypted Extended JSON binary.
    pub fn to_extended_json(&self) -> Value {
        BinData::new(BIN_DATA_SUBTYPE_ENCRYPT, self.encode()).to_extended_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Uuid {
        Uuid::parse_str("deadbeef-0000-0000-0000-0000deadbeef").unwrap()
    }

    #[test]
    fn test_header_layout() {
        let header = FleBlobHeader::new(
            EncryptedBinDataType::Fle2EqualityIndexedValue,
            key(),
            BsonType::String,
        );
        let bytes = header.encode_with_ciphertext(&[0xAA, 0xBB]);

        assert_eq!(bytes.len(), FLE_BLOB_HEADER_LEN + 2);
        assert_eq!(bytes[0], 7);
        assert_eq!(&bytes[1..17], key().as_bytes());
        assert_eq!(bytes[17], 2);
        assert_eq!(&bytes[18..], &[0xAA, 0xBB]);

        let decoded = FleBlobHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.original_type(), Some(BsonType::String));
    }

    #[test]
    fn test_decode_too_short() {
        let bytes = [7u8; FLE_BLOB_HEADER_LEN - 1];
        assert_eq!(
            FleBlobHeader::decode(&bytes),
            Err(BlobDecodeError::TooShort { len: FLE_BLOB_HEADER_LEN - 1 })
        );
        assert_eq!(FleBlobHeader::decode(&[]), Err(BlobDecodeError::TooShort { len: 0 }));
    }

    #[test]
    fn test_decode_unknown_scheme() {
        let mut bytes = vec![0u8; FLE_BLOB_HEADER_LEN];
        bytes[0] = 0xEE;
        assert_eq!(FleBlobHeader::decode(&bytes), Err(BlobDecodeError::UnknownScheme(0xEE)));
    }

    #[test]
    fn test_decode_value_requires_encrypt_subtype() {
        let header = FleBlobHeader::new(EncryptedBinDataType::Fle2RangeIndexedValue, key(), BsonType::Int);
        assert_eq!(FleBlobHeader::decode_value(&header.to_extended_json()), Ok(header));

        let general = BinData::new(BIN_DATA_SUBTYPE_GENERAL, header.encode()).to_extended_json();
        assert_eq!(
            FleBlobHeader::decode_value(&general),
            Err(BlobDecodeError::NotEncrypted(0))
        );
        assert_eq!(
            FleBlobHeader::decode_value(&json!("plaintext")),
            Err(BlobDecodeError::NotBinary)
        );
    }

    #[test]
    fn test_extended_json_forms() {
        let canonical = json!({"$binary": {"base64": "AQID", "subType": "06"}});
        let legacy = json!({"$binary": "AQID", "$type": "6"});

        for v in [&canonical, &legacy] {
            assert!(is_binary(v));
            assert_eq!(BinData::from_extended_json(v), Ok(BinData::new(6, vec![1, 2, 3])));
        }
        assert_eq!(BinData::new(6, vec![1, 2, 3]).to_extended_json(), canonical);
    }

    #[test]
    fn test_binary_shape_is_strict() {
        assert!(!is_binary(&json!({"$binary": {"base64": "AQID", "subType": "06"}, "x": 1})));
        assert!(!is_binary(&json!({"$binary": {"base64": "AQID"}})));
        assert!(!is_binary(&json!({"$binary": 5})));
        assert!(!is_binary(&json!({"b": {}})));
        assert!(!is_binary(&json!([1, 2])));

        let bad_b64 = json!({"$binary": {"base64": "!!!", "subType": "06"}});
        assert!(is_binary(&bad_b64));
        assert_eq!(BinData::from_extended_json(&bad_b64), Err(BlobDecodeError::InvalidBase64));

        let bad_subtype = json!({"$binary": {"base64": "AQID", "subType": "zz"}});
        assert_eq!(
            BinData::from_extended_json(&bad_subtype),
            Err(BlobDecodeError::InvalidSubtype("zz".into()))
        );
    }
}
