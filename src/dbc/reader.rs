//! DBC decoding

use byteorder::{LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;

use crate::dbc::header::{DbcHeader, HEADER_SIZE};
use crate::dbc::observer::{DbcEvent, DbcObserver, TracingObserver};
use crate::dbc::schema::DbcSchema;
use crate::dbc::strings::StringBlock;
use crate::dbc::table::{Dbc, Row};
use crate::dbc::types::{FieldType, Value};
use crate::error::{Error, Result};

impl Dbc {
    /// Decode a DBC file with the schema file describing its records
    pub fn extract_file<P: AsRef<Path>, S: AsRef<Path>>(dbc_path: P, schema_path: S) -> Result<Self> {
        let schema = DbcSchema::from_file(schema_path)?;
        let file = File::open(dbc_path)?;
        Self::extract(&mut BufReader::new(file), schema)
    }

    /// Decode an in-memory DBC image
    pub fn parse(data: &[u8], schema: DbcSchema) -> Result<Self> {
        Self::extract(&mut Cursor::new(data), schema)
    }

    /// Decode a DBC from a seekable stream
    pub fn extract<R: Read + Seek>(reader: &mut R, schema: DbcSchema) -> Result<Self> {
        Self::extract_with_observer(reader, schema, Arc::new(TracingObserver))
    }

    pub fn extract_with_observer<R: Read + Seek>(
        reader: &mut R,
        schema: DbcSchema,
        observer: Arc<dyn DbcObserver>,
    ) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = DbcHeader::parse(reader)?;
        observer.on_event(&DbcEvent::HeaderDecoded {
            record_count: header.record_count,
            field_count: header.field_count,
            record_size: header.record_size,
            string_block_size: header.string_block_size,
        });
        schema.validate_header(&header)?;
        check_stream_len(reader, &header)?;

        // Strings first: string fields are resolved while reading records
        let strings = read_string_block(reader, &header, observer.as_ref())?;
        reader.seek(SeekFrom::Start(HEADER_SIZE))?;
        let rows = read_rows(reader, &header, &schema, &strings, observer.as_ref())?;

        Ok(Dbc::from_parts(header, schema, rows, strings, observer))
    }
}

/// The header's sizes must fit the stream before anything is allocated for them
fn check_stream_len<R: Seek>(reader: &mut R, header: &DbcHeader) -> Result<()> {
    if header.record_size == 0 && header.record_count > 0 {
        return Err(Error::ZeroWidthRecords {
            record_count: header.record_count,
        });
    }
    let found = reader.seek(SeekFrom::End(0))?;
    let expected = header.file_len();
    if expected > found {
        return Err(Error::Truncated { expected, found });
    }
    Ok(())
}

fn read_string_block<R: Read + Seek>(
    reader: &mut R,
    header: &DbcHeader,
    observer: &dyn DbcObserver,
) -> Result<StringBlock> {
    let size = header.string_block_size;
    let read_err = |source| Error::StringBlockRead { size, source };

    reader
        .seek(SeekFrom::End(-(size as i64)))
        .map_err(read_err)?;
    let mut blob = Vec::with_capacity(size as usize);
    reader.read_to_end(&mut blob).map_err(read_err)?;

    let (strings, lossy) = StringBlock::decode(&blob);
    for offset in lossy {
        observer.on_event(&DbcEvent::LossyString { offset });
    }
    observer.on_event(&DbcEvent::StringsDecoded {
        count: strings.len(),
        bytes: size,
    });
    Ok(strings)
}

fn read_rows<R: Read>(
    reader: &mut R,
    header: &DbcHeader,
    schema: &DbcSchema,
    strings: &StringBlock,
    observer: &dyn DbcObserver,
) -> Result<Vec<Row>> {
    let mut rows = Vec::with_capacity(header.record_count as usize);
    for record in 0..header.record_count {
        let mut row = Vec::with_capacity(schema.len());
        for (index, field) in schema.fields().iter().enumerate() {
            let value = read_value(reader, field.field_type, strings).map_err(|source| {
                Error::FieldRead {
                    record,
                    index,
                    name: schema.field_name(index).into_owned(),
                    field_type: field.field_type,
                    source,
                }
            })?;
            let value = match value {
                Ok(value) => value,
                Err(offset) => {
                    observer.on_event(&DbcEvent::UnmappedStringOffset {
                        record,
                        field_index: index,
                        field_type: field.field_type,
                        offset,
                    });
                    Value::from("")
                }
            };
            row.push(value);
        }
        rows.push(row);
    }
    observer.on_event(&DbcEvent::RowsDecoded {
        count: header.record_count,
    });
    Ok(rows)
}

/// Read one field; the inner `Err` carries a string offset with no entry
fn read_value<R: Read>(
    reader: &mut R,
    field_type: FieldType,
    strings: &StringBlock,
) -> std::io::Result<std::result::Result<Value, i32>> {
    let value = match field_type {
        FieldType::Int32 | FieldType::Unknown => Value::Int32(reader.read_i32::<LittleEndian>()?),
        FieldType::Uint8 => Value::Uint8(reader.read_u8()?),
        FieldType::Uint32 => Value::Uint32(reader.read_u32::<LittleEndian>()?),
        FieldType::Float32 => Value::Float32(reader.read_f32::<LittleEndian>()?),
        FieldType::Float64 => Value::Float64(reader.read_f64::<LittleEndian>()?),
        FieldType::StringOffset => {
            let offset = reader.read_i32::<LittleEndian>()?;
            match strings.resolve(offset) {
                Some(s) => Value::String(s.to_string()),
                None => return Ok(Err(offset)),
            }
        }
    };
    Ok(Ok(value))
}
