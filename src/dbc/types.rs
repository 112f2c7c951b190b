//! Field types and cell values for the DBC format

use std::fmt;

use serde::{Deserialize, Serialize};

/// Storage type of a single schema field
///
/// The names match the strings used in schema JSON files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Int32,
    Uint8,
    Uint32,
    Float32,
    /// Double precision float
    Float64,
    /// 4-byte signed offset into the trailing string block
    StringOffset,
    /// Column of unknown meaning, stored like `Int32`
    Unknown,
}

impl FieldType {
    /// Size of the field in bytes inside a record
    pub const fn size_of(self) -> u32 {
        match self {
            FieldType::Uint8 => 1,
            FieldType::Int32
            | FieldType::Uint32
            | FieldType::Float32
            | FieldType::StringOffset
            | FieldType::Unknown => 4,
            FieldType::Float64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Int32 => "int32",
            FieldType::Uint8 => "uint8",
            FieldType::Uint32 => "uint32",
            FieldType::Float32 => "float32",
            FieldType::Float64 => "float64",
            FieldType::StringOffset => "string_offset",
            FieldType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded cell
///
/// `string_offset` fields hold the resolved string, never the raw offset.
/// `unknown` fields decode as `Int32`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int32(i32),
    Uint8(u8),
    Uint32(u32),
    Float32(f32),
    Float64(f64),
    String(String),
}

impl Value {
    /// Short name of the variant, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int32(_) => "int32",
            Value::Uint8(_) => "uint8",
            Value::Uint32(_) => "uint32",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
        }
    }

    /// Parse a text cell according to the field type it belongs to
    pub fn parse(field_type: FieldType, text: &str) -> std::result::Result<Value, String> {
        let value = match field_type {
            FieldType::Int32 | FieldType::Unknown => {
                Value::Int32(text.parse().map_err(|e| format!("{}", e))?)
            }
            FieldType::Uint8 => Value::Uint8(text.parse().map_err(|e| format!("{}", e))?),
            FieldType::Uint32 => Value::Uint32(text.parse().map_err(|e| format!("{}", e))?),
            FieldType::Float32 => Value::Float32(text.parse().map_err(|e| format!("{}", e))?),
            FieldType::Float64 => Value::Float64(text.parse().map_err(|e| format!("{}", e))?),
            FieldType::StringOffset => Value::from(text),
        };
        Ok(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{}", v),
            Value::Uint8(v) => write!(f, "{}", v),
            Value::Uint32(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
