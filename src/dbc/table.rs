//! The in-memory DBC table

use std::fmt;
use std::sync::Arc;

use crate::dbc::header::DbcHeader;
use crate::dbc::observer::{DbcEvent, DbcObserver, TracingObserver};
use crate::dbc::schema::DbcSchema;
use crate::dbc::strings::StringBlock;
use crate::dbc::types::Value;

/// One decoded record, values in schema order
pub type Row = Vec<Value>;

/// A DBC file held in memory
///
/// Created by [`extract`](Dbc::extract) or [`from_text`](Dbc::from_text),
/// grown only by appending rows, written back with [`export`](Dbc::export).
#[derive(Clone)]
pub struct Dbc {
    pub(crate) header: DbcHeader,
    pub(crate) schema: DbcSchema,
    pub(crate) rows: Vec<Row>,
    pub(crate) strings: StringBlock,
    observer: Arc<dyn DbcObserver>,
}

impl Dbc {
    /// Empty table for a schema, ready for appends
    pub fn new(schema: DbcSchema) -> Self {
        let header = DbcHeader::new(schema.field_count(), schema.record_size());
        Dbc {
            header,
            schema,
            rows: Vec::new(),
            // a lone terminator, matching the header's one byte block
            strings: StringBlock::from_bytes(b"\0"),
            observer: Arc::new(TracingObserver),
        }
    }

    pub(crate) fn from_parts(
        header: DbcHeader,
        schema: DbcSchema,
        rows: Vec<Row>,
        strings: StringBlock,
        observer: Arc<dyn DbcObserver>,
    ) -> Self {
        Dbc {
            header,
            schema,
            rows,
            strings,
            observer,
        }
    }

    /// Replace the diagnostics sink
    pub fn with_observer(mut self, observer: Arc<dyn DbcObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub(crate) fn notify(&self, event: DbcEvent) {
        self.observer.on_event(&event);
    }

    pub fn header(&self) -> &DbcHeader {
        &self.header
    }

    pub fn schema(&self) -> &DbcSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn strings(&self) -> &StringBlock {
        &self.strings
    }

    pub fn record_count(&self) -> u32 {
        self.header.record_count
    }

    /// Value of a field by display name
    pub fn value(&self, row: usize, field: &str) -> Option<&Value> {
        let index = (0..self.schema.len()).find(|&i| self.schema.field_name(i) == field)?;
        self.rows.get(row).map(|r| &r[index])
    }
}

impl PartialEq for Dbc {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.schema == other.schema
            && self.rows == other.rows
            && self.strings == other.strings
    }
}

impl fmt::Debug for Dbc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dbc")
            .field("header", &self.header)
            .field("schema", &self.schema)
            .field("rows", &self.rows.len())
            .field("strings", &self.strings.len())
            .finish()
    }
}
