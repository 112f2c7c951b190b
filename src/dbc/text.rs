//! CSV bridge for DBC tables
//!
//! The first CSV record holds the field names, every following record holds
//! one row. Columns are positional: names and order must match the schema.

use std::borrow::Cow;
use std::io::{Read, Write};

use crate::dbc::observer::DbcEvent;
use crate::dbc::schema::DbcSchema;
use crate::dbc::table::{Dbc, Row};
use crate::dbc::types::{FieldType, Value};
use crate::error::{Error, Result};

impl Dbc {
    /// Build a fresh table from a schema and CSV text
    pub fn from_text<R: Read>(schema: DbcSchema, reader: R) -> Result<Self> {
        let mut dbc = Dbc::new(schema);
        dbc.append_text(reader)?;
        Ok(dbc)
    }

    /// Build a fresh table from a schema and already split CSV records
    pub fn from_records<S: AsRef<str>>(schema: DbcSchema, records: &[Vec<S>]) -> Result<Self> {
        let mut dbc = Dbc::new(schema);
        dbc.append_records(records)?;
        Ok(dbc)
    }

    /// Append the rows of a CSV document
    pub fn append_text<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let records = parse_csv(&text)?;
        self.append_records(&records)
    }

    /// Append CSV records; the first one is the header row
    pub fn append_records<S: AsRef<str>>(&mut self, records: &[Vec<S>]) -> Result<()> {
        let (header, rows) = records
            .split_first()
            .ok_or_else(|| Error::InvalidText("missing header row".into()))?;
        self.append_rows(header, rows)
    }

    /// Append rows given a header row and data rows
    ///
    /// All rows are parsed before anything changes, so on error the table is
    /// left as it was.
    pub fn append_rows<S: AsRef<str>>(&mut self, header: &[S], rows: &[Vec<S>]) -> Result<()> {
        let field_count = self.header.field_count;
        if header.len() as u32 != field_count {
            return Err(Error::InvalidFieldCount {
                context: "CSV header vs DBC header",
                expected: field_count,
                found: header.len() as u32,
            });
        }
        for (index, name) in header.iter().enumerate() {
            let name = name.as_ref();
            if name != self.schema.field(index).name && name != self.schema.field_name(index) {
                return Err(Error::InvalidFieldName {
                    index,
                    schema: self.schema.field_name(index).into_owned(),
                    found: name.to_string(),
                });
            }
        }

        let parsed = rows
            .iter()
            .enumerate()
            .map(|(row, cells)| self.parse_row(row, cells))
            .collect::<Result<Vec<Row>>>()?;

        let string_fields: Vec<usize> = self
            .schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.field_type == FieldType::StringOffset)
            .map(|(i, _)| i)
            .collect();
        let mut interner = self.strings.interner();
        for row in &parsed {
            for &index in &string_fields {
                if let Value::String(s) = &row[index] {
                    interner.intern(s);
                }
            }
        }
        let (string_block_size, new_strings) = interner.finish();

        self.header.string_block_size = string_block_size;
        self.header.record_count += parsed.len() as u32;
        self.rows.extend(parsed);

        self.notify(DbcEvent::RowsAppended {
            count: rows.len(),
            new_strings,
            record_count: self.header.record_count,
            string_block_size,
        });
        Ok(())
    }

    fn parse_row<S: AsRef<str>>(&self, row: usize, cells: &[S]) -> Result<Row> {
        if cells.len() as u32 != self.header.field_count {
            return Err(Error::InvalidFieldCount {
                context: "CSV row vs DBC header",
                expected: self.header.field_count,
                found: cells.len() as u32,
            });
        }
        cells
            .iter()
            .zip(self.schema.fields())
            .enumerate()
            .map(|(index, (cell, field))| {
                let cell = cell.as_ref();
                let parse_err = |reason: String| Error::FieldParse {
                    row,
                    index,
                    name: self.schema.field_name(index).into_owned(),
                    field_type: field.field_type,
                    value: cell.to_string(),
                    reason,
                };
                if field.field_type == FieldType::StringOffset && cell.contains('\0') {
                    return Err(parse_err("string contains a null byte".into()));
                }
                Value::parse(field.field_type, cell).map_err(parse_err)
            })
            .collect()
    }

    /// Header row followed by one record per row, every value as text
    pub fn to_records(&self) -> Vec<Vec<String>> {
        let mut records = Vec::with_capacity(self.rows.len() + 1);
        records.push(
            (0..self.schema.len())
                .map(|i| self.schema.field_name(i).into_owned())
                .collect(),
        );
        records.extend(
            self.rows
                .iter()
                .map(|row| row.iter().map(Value::to_string).collect()),
        );
        records
    }

    /// Write the table as CSV
    pub fn export_text<W: Write>(&self, writer: &mut W) -> Result<()> {
        for record in self.to_records() {
            write_csv_record(writer, &record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Write one CSV record, quoting cells per RFC 4180
///
/// A record made of a single empty cell is written as `""` so it does not
/// read back as a blank line.
pub fn write_csv_record<W: Write, S: AsRef<str>>(writer: &mut W, cells: &[S]) -> Result<()> {
    let line = match cells {
        [only] if only.as_ref().is_empty() => "\"\"".to_string(),
        _ => cells
            .iter()
            .map(|cell| csv_cell(cell.as_ref()))
            .collect::<Vec<_>>()
            .join(","),
    };
    writeln!(writer, "{}", line)?;
    Ok(())
}

fn csv_cell(cell: &str) -> Cow<'_, str> {
    if cell.contains(&[',', '"', '\n', '\r'][..]) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

/// Split CSV text into records
///
/// Accepts LF and CRLF line endings and skips blank lines. A line holding
/// only `""` is a record with one empty cell, not a blank line.
pub fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    // inside quotes right now / current record has seen a quoted cell
    let mut quoted = false;
    let mut had_quotes = false;
    let mut line = 1usize;
    let mut quote_line = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => quoted = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => {
                quoted = true;
                had_quotes = true;
                quote_line = line;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                end_record(&mut records, &mut record, &mut field, had_quotes);
                had_quotes = false;
            }
            _ => field.push(c),
        }
    }
    if quoted {
        return Err(Error::InvalidText(format!(
            "unterminated quoted field starting on line {}",
            quote_line
        )));
    }
    if !record.is_empty() || !field.is_empty() || had_quotes {
        end_record(&mut records, &mut record, &mut field, had_quotes);
    }
    Ok(records)
}

fn end_record(
    records: &mut Vec<Vec<String>>,
    record: &mut Vec<String>,
    field: &mut String,
    had_quotes: bool,
) {
    record.push(std::mem::take(field));
    let record = std::mem::take(record);
    let blank = record.len() == 1 && record[0].is_empty() && !had_quotes;
    if !blank {
        records.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbc::schema::SchemaField;

    fn id_name_schema() -> DbcSchema {
        DbcSchema::new(vec![
            SchemaField::new(FieldType::Int32, "ID"),
            SchemaField::new(FieldType::StringOffset, "Name"),
        ])
    }

    #[test]
    fn test_parse_csv() {
        let records = parse_csv("ID,Name\r\n1,\"a, \"\"b\"\"\"\n\n2,\"multi\nline\"\n").unwrap();
        assert_eq!(
            records,
            vec![
                vec!["ID", "Name"],
                vec!["1", "a, \"b\""],
                vec!["2", "multi\nline"],
            ]
        );
        assert_eq!(parse_csv("a,b").unwrap(), vec![vec!["a", "b"]]);
        assert_eq!(parse_csv("a,\n").unwrap(), vec![vec!["a", ""]]);
        assert!(parse_csv("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_csv_unterminated_quote() {
        let err = parse_csv("ID,Name\n1,\"oops\n").unwrap_err();
        assert!(matches!(err, Error::InvalidText(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_write_csv_record() {
        let mut out = Vec::new();
        write_csv_record(&mut out, &["1", "a,b", "say \"hi\"", "plain"]).unwrap();
        assert_eq!(out, b"1,\"a,b\",\"say \"\"hi\"\"\",plain\n");
    }

    #[test]
    fn test_from_records() {
        let dbc = Dbc::from_records(
            id_name_schema(),
            &[vec!["ID", "Name"], vec!["1", "Foo"], vec!["2", "Bar"]],
        )
        .unwrap();
        assert_eq!(dbc.header().record_count, 2);
        assert_eq!(dbc.header().string_block_size, 9);
        assert_eq!(dbc.rows()[1], vec![Value::Int32(2), Value::from("Bar")]);
        assert_eq!(
            dbc.strings().iter().collect::<Vec<_>>(),
            vec![(0, ""), (1, "Foo"), (5, "Bar"), (9, "")]
        );
    }

    #[test]
    fn test_append_counts() {
        let mut dbc = Dbc::from_records(id_name_schema(), &[vec!["ID", "Name"], vec!["1", "Foo"]])
            .unwrap();
        let before = dbc.header().clone();
        dbc.append_rows(&["ID", "Name"], &[vec!["2", "Bar"], vec!["3", ""]])
            .unwrap();
        assert_eq!(dbc.header().record_count, before.record_count + 2);
        assert_eq!(dbc.header().record_size, before.record_size);
        assert_eq!(dbc.header().field_count, before.field_count);
    }

    #[test]
    fn test_duplicate_string_interned_once() {
        let dbc = Dbc::from_records(
            id_name_schema(),
            &[vec!["ID", "Name"], vec!["1", "Foo"], vec!["2", "Foo"]],
        )
        .unwrap();
        let foo: Vec<_> = dbc.strings().iter().filter(|(_, s)| *s == "Foo").collect();
        assert_eq!(foo, vec![(1, "Foo")]);
        let bytes = dbc.to_bytes().unwrap();
        // both records point at offset 1
        assert_eq!(&bytes[24..28], &1i32.to_le_bytes());
        assert_eq!(&bytes[32..36], &1i32.to_le_bytes());
    }

    #[test]
    fn test_field_name_mismatch() {
        let mut dbc = Dbc::new(id_name_schema());
        let err = dbc
            .append_rows(&["Name", "ID"], &[vec!["1", "Foo"]])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFieldName { index: 0, .. }));
        assert_eq!(dbc.record_count(), 0);
    }

    #[test]
    fn test_field_count_mismatch() {
        let mut dbc = Dbc::new(id_name_schema());
        let err = dbc.append_rows(&["ID"], &[vec!["1"]]).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldCount { expected: 2, found: 1, .. }));

        let err = dbc
            .append_rows(&["ID", "Name"], &[vec!["1", "Foo", "x"]])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFieldCount { expected: 2, found: 3, .. }));
    }

    #[test]
    fn test_parse_failure_leaves_table_untouched() {
        let mut dbc = Dbc::from_records(id_name_schema(), &[vec!["ID", "Name"], vec!["1", "Foo"]])
            .unwrap();
        let before = dbc.clone();
        let err = dbc
            .append_rows(&["ID", "Name"], &[vec!["2", "Bar"], vec!["x", "Baz"]])
            .unwrap_err();
        match err {
            Error::FieldParse {
                row, index, name, ..
            } => assert_eq!((row, index, name.as_str()), (1, 0, "ID")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(dbc, before);
    }

    #[test]
    fn test_null_byte_rejected() {
        let mut dbc = Dbc::new(id_name_schema());
        let err = dbc
            .append_rows(&["ID", "Name"], &[vec!["1", "a\0b"]])
            .unwrap_err();
        assert!(matches!(err, Error::FieldParse { index: 1, .. }));
    }

    #[test]
    fn test_unnamed_fields_accept_synthesized_names() {
        let schema = DbcSchema::new(vec![
            SchemaField::new(FieldType::Int32, "ID"),
            SchemaField::new(FieldType::Uint8, ""),
        ]);
        let dbc = Dbc::from_records(schema.clone(), &[vec!["ID", "field_1"], vec!["1", "2"]])
            .unwrap();
        assert_eq!(dbc.to_records()[0], vec!["ID", "field_1"]);
        let dbc = Dbc::from_records(schema, &[vec!["ID", ""], vec!["1", "2"]]).unwrap();
        assert_eq!(dbc.rows()[0][1], Value::Uint8(2));
    }

    #[test]
    fn test_text_round_trip() {
        let schema = DbcSchema::new(vec![
            SchemaField::new(FieldType::Int32, "ID"),
            SchemaField::new(FieldType::StringOffset, "Name"),
            SchemaField::new(FieldType::Float32, "Scale"),
            SchemaField::new(FieldType::StringOffset, "Desc"),
        ]);
        let csv = "ID,Name,Scale,Desc\n1,Foo,0.1,\"x, y\"\n2,Bar,-3,Foo\n3,,1e30,\n";
        let first = Dbc::from_text(schema.clone(), csv.as_bytes()).unwrap();
        let mut text = Vec::new();
        first.export_text(&mut text).unwrap();
        let second = Dbc::from_text(schema, text.as_slice()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_quoted_empty_line_is_a_record() {
        let records = parse_csv("Name\nFoo\n\"\"\n\nBar\n\"\"").unwrap();
        assert_eq!(
            records,
            vec![vec!["Name"], vec!["Foo"], vec![""], vec!["Bar"], vec![""]]
        );

        let mut out = Vec::new();
        write_csv_record(&mut out, &[""]).unwrap();
        write_csv_record(&mut out, &["", ""]).unwrap();
        assert_eq!(out, b"\"\"\n,\n");
    }

    #[test]
    fn test_single_string_column_keeps_empty_values() {
        let schema = DbcSchema::new(vec![SchemaField::new(FieldType::StringOffset, "Name")]);
        let first =
            Dbc::from_records(schema.clone(), &[vec!["Name"], vec!["Foo"], vec![""], vec!["Bar"]])
                .unwrap();
        let mut text = Vec::new();
        first.export_text(&mut text).unwrap();
        assert_eq!(text, b"Name\nFoo\n\"\"\nBar\n");

        let second = Dbc::from_text(schema, text.as_slice()).unwrap();
        assert_eq!(second.record_count(), 3);
        assert_eq!(second.rows()[1], vec![Value::from("")]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_header_row() {
        let err = Dbc::from_text(id_name_schema(), "".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidText(_)));
    }
}
