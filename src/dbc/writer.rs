//! DBC encoding

use byteorder::{LittleEndian, WriteBytesExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dbc::header::HEADER_SIZE;
use crate::dbc::observer::DbcEvent;
use crate::dbc::table::Dbc;
use crate::dbc::types::{FieldType, Value};
use crate::error::{codec_defect, Error, Result};

impl Dbc {
    /// Encode the table in the binary layout
    ///
    /// Everything is validated before the first byte is written, so a failed
    /// export leaves `writer` untouched.
    pub fn export<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.schema.validate_header(&self.header)?;
        if self.header.record_count as usize != self.rows.len() {
            codec_defect(format_args!(
                "header record count {} does not match {} rows",
                self.header.record_count,
                self.rows.len()
            ));
        }

        let blob = self.strings.to_bytes()?;
        if blob.len() as u64 != self.header.string_block_size as u64 {
            return Err(Error::InvalidStringBlockOffset(format!(
                "string block encodes to {} bytes, header says {}",
                blob.len(),
                self.header.string_block_size
            )));
        }
        let offsets = self.strings.offsets();
        let mut records = Vec::with_capacity(self.header.records_len() as usize);
        for row in &self.rows {
            self.write_row(&mut records, row, &offsets)?;
        }

        self.header.write(writer)?;
        writer.write_all(&records)?;
        writer.write_all(&blob)?;
        writer.flush()?;

        self.notify(DbcEvent::Exported {
            record_count: self.header.record_count,
            bytes: HEADER_SIZE + records.len() as u64 + blob.len() as u64,
        });
        Ok(())
    }

    /// Encode the table into a new buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.header.file_len() as usize);
        self.export(&mut out)?;
        Ok(out)
    }

    /// Encode the table into a file, replacing it if it exists
    pub fn export_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        // encode fully before truncating, so the input can be its own output
        let data = self.to_bytes()?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&data)?;
        writer.flush()?;
        Ok(())
    }

    fn write_row(&self, out: &mut Vec<u8>, row: &[Value], offsets: &HashMap<&str, u32>) -> Result<()> {
        if row.len() != self.schema.len() {
            codec_defect(format_args!(
                "row has {} values, schema has {} fields",
                row.len(),
                self.schema.len()
            ));
        }
        for (index, (value, field)) in row.iter().zip(self.schema.fields()).enumerate() {
            let written = match (field.field_type, value) {
                (FieldType::Int32 | FieldType::Unknown, Value::Int32(v)) => {
                    out.write_i32::<LittleEndian>(*v)
                }
                (FieldType::Uint8, Value::Uint8(v)) => out.write_u8(*v),
                (FieldType::Uint32, Value::Uint32(v)) => out.write_u32::<LittleEndian>(*v),
                (FieldType::Float32, Value::Float32(v)) => out.write_f32::<LittleEndian>(*v),
                (FieldType::Float64, Value::Float64(v)) => out.write_f64::<LittleEndian>(*v),
                (FieldType::StringOffset, Value::String(s)) => {
                    let offset = offsets.get(s.as_str()).copied().ok_or_else(|| {
                        Error::InvalidDataStringOffset {
                            index,
                            name: self.schema.field_name(index).into_owned(),
                            value: format!("'{}' has no string block entry", s),
                        }
                    })?;
                    out.write_i32::<LittleEndian>(offset as i32)
                }
                (FieldType::StringOffset, other) => {
                    return Err(Error::InvalidDataStringOffset {
                        index,
                        name: self.schema.field_name(index).into_owned(),
                        value: format!("{} value {}", other.kind(), other),
                    });
                }
                (field_type, other) => codec_defect(format_args!(
                    "field_index {} ({}) is {} but holds a {} value",
                    index,
                    self.schema.field_name(index),
                    field_type,
                    other.kind()
                )),
            };
            written.map_err(|source| Error::FieldWrite {
                index,
                name: self.schema.field_name(index).into_owned(),
                field_type: field.field_type,
                value: value.to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbc::schema::{DbcSchema, SchemaField};

    fn id_name_schema() -> DbcSchema {
        DbcSchema::new(vec![
            SchemaField::new(FieldType::Int32, "ID"),
            SchemaField::new(FieldType::StringOffset, "Name"),
        ])
    }

    fn sample_file() -> Vec<u8> {
        let mut data = b"WDBC".to_vec();
        for v in [2u32, 2, 8, 9] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        for (id, offset) in [(1000i32, 1i32), (1001, 5)] {
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&offset.to_le_bytes());
        }
        data.extend_from_slice(b"\0Foo\0Bar\0");
        data
    }

    #[test]
    fn test_export_is_byte_exact() {
        let data = sample_file();
        let dbc = Dbc::parse(&data, id_name_schema()).unwrap();
        assert_eq!(dbc.to_bytes().unwrap(), data);
    }

    #[test]
    fn test_export_rejects_broken_string_block() {
        let mut dbc = Dbc::parse(&sample_file(), id_name_schema()).unwrap();
        dbc.strings.insert_raw(20, "Baz");
        let mut out = Vec::new();
        let err = dbc.export(&mut out).unwrap_err();
        assert!(matches!(err, Error::InvalidStringBlockOffset(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_export_rejects_non_string_value() {
        let mut dbc = Dbc::parse(&sample_file(), id_name_schema()).unwrap();
        dbc.rows[1][1] = Value::Int32(5);
        let err = dbc.to_bytes().unwrap_err();
        assert!(matches!(err, Error::InvalidDataStringOffset { index: 1, .. }));
    }

    #[test]
    fn test_export_rejects_size_mismatch() {
        let mut dbc = Dbc::parse(&sample_file(), id_name_schema()).unwrap();
        dbc.header.string_block_size = 4;
        let err = dbc.to_bytes().unwrap_err();
        assert!(matches!(err, Error::InvalidStringBlockOffset(_)));
    }

    #[test]
    #[should_panic(expected = "codec defect")]
    fn test_numeric_mismatch_is_a_defect() {
        let mut dbc = Dbc::parse(&sample_file(), id_name_schema()).unwrap();
        dbc.rows[0][0] = Value::Float32(1.0);
        let _ = dbc.to_bytes();
    }

    #[test]
    fn test_export_empty_table() {
        let dbc = Dbc::new(id_name_schema());
        let bytes = dbc.to_bytes().unwrap();
        assert_eq!(bytes.len(), 21);
        assert_eq!(&bytes[..4], b"WDBC");
        assert_eq!(bytes[20], 0);

        let decoded = Dbc::parse(&bytes, id_name_schema()).unwrap();
        assert_eq!(decoded, dbc);
    }
}
