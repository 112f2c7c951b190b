//! WDBC binary format codec
//!
//! DBC is the fixed-record table format used by the game client for its
//! client-side databases (`ItemRandomSuffix.dbc`, `SpellItemEnchantment.dbc`
//! and friends). The file carries no type information, so every file is read
//! with an external schema describing its fields.
//!
//! ## Format Overview
//!
//! A DBC file consists of:
//! - 20 byte header: `WDBC`, record count, field count, record size, string
//!   block size (all little-endian u32)
//! - `record_count * record_size` bytes of fixed-width records
//! - The string block: null-separated strings, referenced from records by
//!   byte offset, offset 0 always being the empty string
//!
//! ## Example
//!
//! ```rust,no_run
//! use wdbc::dbc::Dbc;
//!
//! let mut dbc = Dbc::extract_file("ItemRandomSuffix.dbc", "ItemRandomSuffix.json")?;
//! dbc.append_text(std::fs::File::open("extra_suffixes.csv")?)?;
//! dbc.export_file("ItemRandomSuffix.new.dbc")?;
//! # Ok::<(), wdbc::Error>(())
//! ```

mod header;
mod observer;
mod reader;
mod schema;
mod strings;
mod table;
mod text;
mod types;
mod writer;
pub mod utils;

pub use header::{DbcHeader, DBC_MAGIC, DBC_MAGIC_U32, HEADER_SIZE};
pub use observer::{DbcEvent, DbcObserver, NullObserver, TracingObserver};
pub use schema::{DbcSchema, SchemaField};
pub use strings::StringBlock;
pub use table::{Dbc, Row};
pub use text::{parse_csv, write_csv_record};
pub use types::{FieldType, Value};
pub use utils::{
    append_csv_to_dbc, dump_directory, export_from_csv, extract_to_csv, show_dbc_info,
};
