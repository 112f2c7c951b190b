//! Error types for wdbc
//!
//! Malformed input data is always reported through [`Error`]. Broken internal
//! invariants (the codec and schema definitions disagreeing with each other)
//! go through [`codec_defect`] instead and abort.

use std::fmt;

use thiserror::Error;

use crate::dbc::FieldType;

/// Main error type for wdbc operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error(
        "DBC has an invalid signature {found:?}, does not begin with 'WDBC' or have a uint32 value of {expected}",
        expected = crate::dbc::DBC_MAGIC_U32
    )]
    InvalidSignature { found: [u8; 4] },

    #[error("Unable to read DBC header {field}: {source}")]
    HeaderRead {
        field: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Field count mismatch ({context}): expected {expected}, found {found}")]
    InvalidFieldCount {
        context: &'static str,
        expected: u32,
        found: u32,
    },

    #[error("DBC record size was {header}, schema was {schema}")]
    InvalidRecordSize { header: u32, schema: u32 },

    #[error("Field names do not tally at field_index {index}: schema is '{schema}', CSV header is '{found}'")]
    InvalidFieldName {
        index: usize,
        schema: String,
        found: String,
    },

    #[error("DBC is truncated: header describes {expected} bytes, stream has {found}")]
    Truncated { expected: u64, found: u64 },

    #[error("DBC header declares {record_count} records of zero width")]
    ZeroWidthRecords { record_count: u32 },

    #[error("DBC string block offsets are wrong: {0}")]
    InvalidStringBlockOffset(String),

    #[error("DBC string is not a string at field_index {index}, field_name {name}: {value}")]
    InvalidDataStringOffset {
        index: usize,
        name: String,
        value: String,
    },

    #[error("Unable to read DBC string block ({size} bytes): {source}")]
    StringBlockRead {
        size: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to read field in DBC: record {record}, field_index {index}, field_name {name}, field_type {field_type}: {source}")]
    FieldRead {
        record: u32,
        index: usize,
        name: String,
        field_type: FieldType,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to write field in DBC: field_index {index}, field_name {name}, field_type {field_type}, value {value}: {source}")]
    FieldWrite {
        index: usize,
        name: String,
        field_type: FieldType,
        value: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse field in CSV: row {row}, field_index {index}, field_name {name}, field_type {field_type}, value '{value}': {reason}")]
    FieldParse {
        row: usize,
        index: usize,
        name: String,
        field_type: FieldType,
        value: String,
        reason: String,
    },

    #[error("Invalid CSV text: {0}")]
    InvalidText(String),
}

/// Result type alias for wdbc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Abort on a schema/codec inconsistency.
///
/// Reaching this means the in-memory table no longer matches its own schema.
#[track_caller]
#[cold]
pub(crate) fn codec_defect(args: fmt::Arguments<'_>) -> ! {
    tracing::error!(target: "wdbc", "codec defect: {}", args);
    panic!("wdbc codec defect: {}", args)
}
