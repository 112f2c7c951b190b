//! # wdbc
//!
//! A Rust library for reading, extending and writing WDBC (`.dbc`) client
//! database files.
//!
//! ## Overview
//!
//! DBC files are flat binary tables: a fixed header, fixed-width records and a
//! trailing block of deduplicated strings. The files carry no column types, so
//! every file is paired with a JSON schema. This library provides:
//!
//! - Decoding a DBC file into a [`Dbc`] table with typed [`Value`]s
//! - Appending rows authored as CSV, interning their strings
//! - Encoding the table back to the exact binary layout
//! - Exporting the table as CSV for inspection or editing
//!
//! ## Example - Reading
//!
//! ```rust,no_run
//! use wdbc::Dbc;
//!
//! fn main() -> wdbc::Result<()> {
//!     let dbc = Dbc::extract_file("ItemRandomSuffix.dbc", "ItemRandomSuffix.json")?;
//!
//!     for row in dbc.rows() {
//!         println!("{:?}", row);
//!     }
//!
//!     dbc.export_text(&mut std::io::stdout())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Example - Appending
//!
//! ```rust,no_run
//! use wdbc::Dbc;
//!
//! fn main() -> wdbc::Result<()> {
//!     let mut dbc = Dbc::extract_file("ItemRandomSuffix.dbc", "ItemRandomSuffix.json")?;
//!
//!     dbc.append_rows(
//!         &["ID", "Name", "InternalName"],
//!         &[vec!["3000", "of the Bear", "bear"]],
//!     )?;
//!
//!     dbc.export_file("ItemRandomSuffix.new.dbc")?;
//!     Ok(())
//! }
//! ```

pub mod dbc;
pub mod error;
pub mod utils;

pub use dbc::{Dbc, DbcHeader, DbcSchema, FieldType, SchemaField, StringBlock, Value};
pub use error::{Error, Result};
pub use utils::{collect_files, create_glob_matcher, format_size, matches_filter, mk_base_dirs};
