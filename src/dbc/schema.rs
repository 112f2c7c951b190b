//! Schema definitions driving the record layout

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dbc::header::DbcHeader;
use crate::dbc::types::FieldType;
use crate::error::{Error, Result};

/// One column of a DBC schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub name: String,
}

impl SchemaField {
    pub fn new(field_type: FieldType, name: impl Into<String>) -> Self {
        SchemaField {
            field_type,
            name: name.into(),
        }
    }
}

/// Ordered field list of a DBC file
///
/// Loaded from a JSON array such as
/// `[{"type": "int32", "name": "ID"}, {"type": "string_offset", "name": "Name"}]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DbcSchema {
    fields: Vec<SchemaField>,
}

impl DbcSchema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        DbcSchema { fields }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let fields: Vec<SchemaField> = serde_json::from_reader(reader)?;
        Ok(DbcSchema { fields })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let fields: Vec<SchemaField> = serde_json::from_str(json)?;
        Ok(DbcSchema { fields })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_json_reader(BufReader::new(file))
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> &SchemaField {
        &self.fields[index]
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Display name of a field, `field_<index>` when unnamed
    pub fn field_name(&self, index: usize) -> Cow<'_, str> {
        match self.fields[index].name.as_str() {
            "" => Cow::Owned(format!("field_{}", index)),
            name => Cow::Borrowed(name),
        }
    }

    /// Sum of the field widths
    pub fn record_size(&self) -> u32 {
        self.fields.iter().map(|f| f.field_type.size_of()).sum()
    }

    pub fn field_count(&self) -> u32 {
        self.fields.len() as u32
    }

    /// Check that a header describes records laid out by this schema
    pub fn validate_header(&self, header: &DbcHeader) -> Result<()> {
        if header.field_count != self.field_count() {
            return Err(Error::InvalidFieldCount {
                context: "DBC header vs schema",
                expected: header.field_count,
                found: self.field_count(),
            });
        }
        let schema_record_size = self.record_size();
        if header.record_size != schema_record_size {
            return Err(Error::InvalidRecordSize {
                header: header.record_size,
                schema: schema_record_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"[
        {"type": "int32", "name": "ID"},
        {"type": "uint8", "name": ""},
        {"type": "float64"},
        {"type": "string_offset", "name": "Name"},
        {"type": "unknown", "name": "Flags"}
    ]"#;

    #[test]
    fn test_load_schema() {
        let schema = DbcSchema::from_json_str(SCHEMA).unwrap();
        assert_eq!(schema.len(), 5);
        assert_eq!(schema.field(0).field_type, FieldType::Int32);
        assert_eq!(schema.field(2).name, "");
        assert_eq!(schema.record_size(), 4 + 1 + 8 + 4 + 4);
    }

    #[test]
    fn test_field_name_fallback() {
        let schema = DbcSchema::from_json_str(SCHEMA).unwrap();
        assert_eq!(schema.field_name(0), "ID");
        assert_eq!(schema.field_name(1), "field_1");
        assert_eq!(schema.field_name(2), "field_2");
        assert_eq!(schema.field_name(3), "Name");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = DbcSchema::from_json_str(r#"[{"type": "int64", "name": "X"}]"#).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_validate_header() {
        let schema = DbcSchema::new(vec![
            SchemaField::new(FieldType::Int32, "ID"),
            SchemaField::new(FieldType::StringOffset, "Name"),
        ]);
        assert!(schema.validate_header(&DbcHeader::new(2, 8)).is_ok());
        assert!(matches!(
            schema.validate_header(&DbcHeader::new(3, 8)),
            Err(Error::InvalidFieldCount { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            schema.validate_header(&DbcHeader::new(2, 12)),
            Err(Error::InvalidRecordSize { header: 12, schema: 8 })
        ));
    }
}
