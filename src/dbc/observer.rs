//! Diagnostics sink for table operations
//!
//! A [`Dbc`](super::Dbc) reports what it does to a [`DbcObserver`] instead of
//! logging through global state. The default observer forwards everything to
//! `tracing`.

use tracing::{debug, info, warn};

use crate::dbc::types::FieldType;

/// Something noteworthy that happened while decoding, appending or exporting
#[derive(Debug, Clone, PartialEq)]
pub enum DbcEvent {
    HeaderDecoded {
        record_count: u32,
        field_count: u32,
        record_size: u32,
        string_block_size: u32,
    },
    StringsDecoded {
        count: usize,
        bytes: u32,
    },
    /// A string piece was not valid UTF-8 and was replaced lossily
    LossyString {
        offset: u32,
    },
    /// A string field pointed at an offset with no string; it decoded as ""
    UnmappedStringOffset {
        record: u32,
        field_index: usize,
        field_type: FieldType,
        offset: i32,
    },
    RowsDecoded {
        count: u32,
    },
    RowsAppended {
        count: usize,
        new_strings: usize,
        record_count: u32,
        string_block_size: u32,
    },
    Exported {
        record_count: u32,
        bytes: u64,
    },
}

pub trait DbcObserver: Send + Sync {
    fn on_event(&self, event: &DbcEvent);
}

/// Forwards events to `tracing` under the `wdbc` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DbcObserver for TracingObserver {
    fn on_event(&self, event: &DbcEvent) {
        match event {
            DbcEvent::HeaderDecoded {
                record_count,
                field_count,
                record_size,
                string_block_size,
            } => debug!(
                target: "wdbc",
                record_count, field_count, record_size, string_block_size, "decoded DBC header"
            ),
            DbcEvent::StringsDecoded { count, bytes } => {
                debug!(target: "wdbc", count, bytes, "decoded string block")
            }
            DbcEvent::LossyString { offset } => {
                warn!(target: "wdbc", offset, "string block entry is not valid UTF-8")
            }
            DbcEvent::UnmappedStringOffset {
                record,
                field_index,
                field_type,
                offset,
            } => warn!(
                target: "wdbc",
                record, field_index, %field_type, offset, "string offset has no entry, using empty string"
            ),
            DbcEvent::RowsDecoded { count } => debug!(target: "wdbc", count, "decoded records"),
            DbcEvent::RowsAppended {
                count,
                new_strings,
                record_count,
                string_block_size,
            } => info!(
                target: "wdbc",
                count, new_strings, record_count, string_block_size, "appended rows"
            ),
            DbcEvent::Exported {
                record_count,
                bytes,
            } => info!(target: "wdbc", record_count, bytes, "exported DBC"),
        }
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl DbcObserver for NullObserver {
    fn on_event(&self, _event: &DbcEvent) {}
}
