//! Encrypted-field type definitions
//!
//! - `BsonType`: the original (pre-encryption) type of a field
//! - `EncryptedBinDataType`: the scheme byte leading every encrypted payload
//! - `EncryptedField`: one declared encrypted path

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// BSON type codes, as carried in the `originalBsonType` header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BsonType {
    MinKey,
    Double,
    String,
    Object,
    Array,
    BinData,
    Undefined,
    ObjectId,
    Bool,
    Date,
    Null,
    Regex,
    DbPointer,
    JavaScript,
    Symbol,
    JavaScriptWithScope,
    Int,
    Timestamp,
    Long,
    Decimal,
    MaxKey,
}

impl BsonType {
    const ALL: [BsonType; 21] = [
        BsonType::MinKey,
        BsonType::Double,
        BsonType::String,
        BsonType::Object,
        BsonType::Array,
        BsonType::BinData,
        BsonType::Undefined,
        BsonType::ObjectId,
        BsonType::Bool,
        BsonType::Date,
        BsonType::Null,
        BsonType::Regex,
        BsonType::DbPointer,
        BsonType::JavaScript,
        BsonType::Symbol,
        BsonType::JavaScriptWithScope,
        BsonType::Int,
        BsonType::Timestamp,
        BsonType::Long,
        BsonType::Decimal,
        BsonType::MaxKey,
    ];

    /// Returns the signed BSON type code (`minKey` is -1).
    pub fn code(&self) -> i32 {
        match self {
            BsonType::MinKey => -1,
            BsonType::Double => 1,
            BsonType::String => 2,
            BsonType::Object => 3,
            BsonType::Array => 4,
            BsonType::BinData => 5,
            BsonType::Undefined => 6,
            BsonType::ObjectId => 7,
            BsonType::Bool => 8,
            BsonType::Date => 9,
            BsonType::Null => 10,
            BsonType::Regex => 11,
            BsonType::DbPointer => 12,
            BsonType::JavaScript => 13,
            BsonType::Symbol => 14,
            BsonType::JavaScriptWithScope => 15,
            BsonType::Int => 16,
            BsonType::Timestamp => 17,
            BsonType::Long => 18,
            BsonType::Decimal => 19,
            BsonType::MaxKey => 127,
        }
    }

    /// Returns the type code as stored in a single header byte.
    pub fn as_byte(&self) -> u8 {
        self.code() as i8 as u8
    }

    /// Parses a header byte back into a type, `None` for unassigned codes.
    pub fn from_byte(byte: u8) -> Option<Self> {
        let code = byte as i8 as i32;
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Returns the canonical type alias (`"string"`, `"int"`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            BsonType::MinKey => "minKey",
            BsonType::Double => "double",
            BsonType::String => "string",
            BsonType::Object => "object",
            BsonType::Array => "array",
            BsonType::BinData => "binData",
            BsonType::Undefined => "undefined",
            BsonType::ObjectId => "objectId",
            BsonType::Bool => "bool",
            BsonType::Date => "date",
            BsonType::Null => "null",
            BsonType::Regex => "regex",
            BsonType::DbPointer => "dbPointer",
            BsonType::JavaScript => "javascript",
            BsonType::Symbol => "symbol",
            BsonType::JavaScriptWithScope => "javascriptWithScope",
            BsonType::Int => "int",
            BsonType::Timestamp => "timestamp",
            BsonType::Long => "long",
            BsonType::Decimal => "decimal",
            BsonType::MaxKey => "maxKey",
        }
    }

    /// Parses a canonical type alias.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<String> for BsonType {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        BsonType::from_name(&name).ok_or_else(|| format!("unknown BSON type name '{}'", name))
    }
}

impl From<BsonType> for String {
    fn from(t: BsonType) -> Self {
        t.name().to_string()
    }
}

/// Scheme byte leading every encrypted binary payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EncryptedBinDataType {
    Placeholder = 0,
    Deterministic = 1,
    Random = 2,
    Fle2Placeholder = 3,
    Fle2InsertUpdatePayload = 4,
    Fle2FindEqualityPayload = 5,
    Fle2UnindexedEncryptedValue = 6,
    Fle2EqualityIndexedValue = 7,
    Fle2TransientRaw = 8,
    Fle2RangeIndexedValue = 9,
    Fle2FindRangePayload = 10,
    Fle2InsertUpdatePayloadV2 = 11,
    Fle2FindEqualityPayloadV2 = 12,
    Fle2FindRangePayloadV2 = 13,
    Fle2EqualityIndexedValueV2 = 14,
    Fle2RangeIndexedValueV2 = 15,
    Fle2UnindexedEncryptedValueV2 = 16,
    Fle2IndexedTextEncryptedValue = 17,
    Fle2FindTextPayload = 18,
}

impl EncryptedBinDataType {
    /// Convert from u8, returns None for unassigned values
    pub fn from_u8(value: u8) -> Option<Self> {
        use EncryptedBinDataType::*;
        let t = match value {
            0 => Placeholder,
            1 => Deterministic,
            2 => Random,
            3 => Fle2Placeholder,
            4 => Fle2InsertUpdatePayload,
            5 => Fle2FindEqualityPayload,
            6 => Fle2UnindexedEncryptedValue,
            7 => Fle2EqualityIndexedValue,
            8 => Fle2TransientRaw,
            9 => Fle2RangeIndexedValue,
            10 => Fle2FindRangePayload,
            11 => Fle2InsertUpdatePayloadV2,
            12 => Fle2FindEqualityPayloadV2,
            13 => Fle2FindRangePayloadV2,
            14 => Fle2EqualityIndexedValueV2,
            15 => Fle2RangeIndexedValueV2,
            16 => Fle2UnindexedEncryptedValueV2,
            17 => Fle2IndexedTextEncryptedValue,
            18 => Fle2FindTextPayload,
            _ => return None,
        };
        Some(t)
    }

    /// Convert to u8
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns true for the payload kinds that may be stored in a document
    /// of an encrypted collection.
    pub fn is_stored_fle2_value(self) -> bool {
        use EncryptedBinDataType::*;
        matches!(
            self,
            Fle2UnindexedEncryptedValue
                | Fle2EqualityIndexedValue
                | Fle2RangeIndexedValue
                | Fle2EqualityIndexedValueV2
                | Fle2RangeIndexedValueV2
                | Fle2UnindexedEncryptedValueV2
                | Fle2IndexedTextEncryptedValue
        )
    }
}

/// A declared encrypted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedField {
    /// Dotted path (e.g. "patient.ssn")
    pub path: String,
    /// Original type of the value before encryption
    pub bson_type: BsonType,
    /// Data key used to encrypt this field
    #[serde(default = "Uuid::nil")]
    pub key_id: Uuid,
}

impl EncryptedField {
    pub fn new(key_id: Uuid, path: impl Into<String>, bson_type: BsonType) -> Self {
        Self {
            path: path.into(),
            bson_type,
            key_id,
        }
    }

    /// Returns the path split into its segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}
