//! DBC file conversion helpers
//!
//! File-to-file wrappers around [`Dbc`] used by the command line tool.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{Dbc, DbcHeader, DbcSchema, FieldType, DBC_MAGIC};
use crate::utils::{collect_files, create_glob_matcher, format_size, matches_filter, mk_base_dirs};

/// Extract a DBC file to CSV
///
/// Without an explicit output the CSV is written next to the DBC file.
/// Returns the path written.
pub fn extract_to_csv(dbc_path: &Path, schema_path: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let csv_path = output.map(PathBuf::from).unwrap_or_else(|| dbc_path.with_extension("csv"));
    mk_base_dirs(&[&csv_path])?;

    let dbc = Dbc::extract_file(dbc_path, schema_path)
        .with_context(|| format!("Failed to extract {}", dbc_path.display()))?;

    let mut writer = BufWriter::new(
        File::create(&csv_path).with_context(|| format!("Failed to create {}", csv_path.display()))?,
    );
    dbc.export_text(&mut writer)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;

    info!(
        dbc = %dbc_path.display(),
        csv = %csv_path.display(),
        records = dbc.record_count(),
        "extracted DBC to CSV"
    );
    Ok(csv_path)
}

/// Build a fresh DBC file from a CSV file and a schema
pub fn export_from_csv(csv_path: &Path, schema_path: &Path, dbc_path: &Path) -> Result<()> {
    mk_base_dirs(&[dbc_path])?;

    let schema = DbcSchema::from_file(schema_path)
        .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;
    let csv = File::open(csv_path).with_context(|| format!("Failed to open {}", csv_path.display()))?;
    let dbc = Dbc::from_text(schema, BufReader::new(csv))
        .with_context(|| format!("Failed to read rows from {}", csv_path.display()))?;

    dbc.export_file(dbc_path)
        .with_context(|| format!("Failed to write {}", dbc_path.display()))?;

    info!(
        csv = %csv_path.display(),
        dbc = %dbc_path.display(),
        records = dbc.record_count(),
        "built DBC from CSV"
    );
    Ok(())
}

/// Append the rows of a CSV file to a DBC file
///
/// Writes to `output`, or back over `dbc_path` when no output is given. The
/// new image is fully encoded before the destination is touched.
pub fn append_csv_to_dbc(
    dbc_path: &Path,
    csv_path: &Path,
    schema_path: &Path,
    output: Option<&Path>,
) -> Result<Dbc> {
    let output = output.unwrap_or(dbc_path);
    mk_base_dirs(&[output])?;

    let mut dbc = Dbc::extract_file(dbc_path, schema_path)
        .with_context(|| format!("Failed to extract {}", dbc_path.display()))?;
    let before = dbc.record_count();

    let csv = File::open(csv_path).with_context(|| format!("Failed to open {}", csv_path.display()))?;
    dbc.append_text(BufReader::new(csv))
        .with_context(|| format!("Failed to append rows from {}", csv_path.display()))?;

    dbc.export_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Appended {} records to {} ({} total)",
        dbc.record_count() - before,
        output.display(),
        dbc.record_count()
    );
    Ok(dbc)
}

/// Display DBC file information
///
/// The header is always shown; with a schema the records are decoded too.
pub fn show_dbc_info(dbc_path: &Path, schema_path: Option<&Path>) -> Result<()> {
    let mut file =
        BufReader::new(File::open(dbc_path).with_context(|| format!("Failed to open {}", dbc_path.display()))?);
    let header = DbcHeader::parse(&mut file)
        .with_context(|| format!("Failed to read header of {}", dbc_path.display()))?;
    let file_len = fs::metadata(dbc_path)?.len();

    println!("\nDBC Info: {}", dbc_path.display());
    println!("  File size: {}", format_size(file_len));
    println!("  Records: {}", header.record_count);
    println!("  Fields: {}", header.field_count);
    println!("  Record size: {} bytes", header.record_size);
    println!("  String block: {}", format_size(header.string_block_size as u64));
    if header.file_len() != file_len {
        println!(
            "  Warning: header describes {} bytes, file has {}",
            header.file_len(),
            file_len
        );
    }

    let Some(schema_path) = schema_path else {
        return Ok(());
    };
    let dbc = Dbc::extract_file(dbc_path, schema_path)
        .with_context(|| format!("Failed to extract {}", dbc_path.display()))?;
    println!("  Strings: {}", dbc.strings().len());
    println!("\nFields:");
    for (i, field) in dbc.schema().fields().iter().enumerate() {
        println!("  {:>3}. {:<32} {}", i, dbc.schema().field_name(i), field.field_type);
    }
    let string_fields = dbc
        .schema()
        .fields()
        .iter()
        .filter(|f| f.field_type == FieldType::StringOffset)
        .count();
    println!("\n{} of {} fields are strings", string_fields, dbc.schema().len());
    Ok(())
}

fn has_dbc_signature(path: &Path) -> Result<bool> {
    let mut head = Vec::with_capacity(DBC_MAGIC.len());
    File::open(path)
        .and_then(|f| f.take(DBC_MAGIC.len() as u64).read_to_end(&mut head))
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(DbcHeader::is_dbc(&head))
}

/// Extract every DBC under a directory to CSV
///
/// Each `<name>.dbc` is decoded with `<schema_dir>/<name>.json`; files without
/// a schema or without the DBC signature are skipped. CSV files mirror the input layout under `output`
/// (default: the input directory). Returns `(extracted, failed, skipped)`.
pub fn dump_directory(
    input_dir: &Path,
    schema_dir: &Path,
    filter: Option<&str>,
    output: Option<&Path>,
) -> Result<(u64, u64, u64)> {
    let matcher = create_glob_matcher(filter.unwrap_or("*.dbc"))?;
    let output_dir = output.unwrap_or(input_dir);

    let files: Vec<PathBuf> = collect_files(input_dir)?
        .into_iter()
        .filter(|path| {
            let rel = path.strip_prefix(input_dir).unwrap_or(path);
            matches_filter(&rel.to_string_lossy().replace('\\', "/"), Some(&matcher))
        })
        .collect();

    println!(
        "\nExtracting {} DBC files from {} to {}...",
        files.len(),
        input_dir.display(),
        output_dir.display()
    );
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let (mut success, mut failed, mut skipped) = (0u64, 0u64, 0u64);
    for path in &files {
        pb.inc(1);

        match has_dbc_signature(path) {
            Ok(true) => {}
            Ok(false) => {
                warn!(file = %path.display(), "not a DBC file, skipping");
                skipped += 1;
                continue;
            }
            Err(e) => {
                pb.suspend(|| eprintln!("Warning: Failed to read {}: {:#}", path.display(), e));
                failed += 1;
                continue;
            }
        }

        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        let schema_path = schema_dir.join(format!("{}.json", stem));
        if !schema_path.is_file() {
            warn!(dbc = %path.display(), "no schema found, skipping");
            skipped += 1;
            continue;
        }

        let rel = path.strip_prefix(input_dir).unwrap_or(path);
        let csv_path = output_dir.join(rel).with_extension("csv");
        match extract_to_csv(path, &schema_path, Some(&csv_path)) {
            Ok(_) => success += 1,
            Err(e) => {
                pb.suspend(|| eprintln!("Warning: Failed to extract {}: {:#}", path.display(), e));
                failed += 1;
            }
        }
    }

    pb.finish_with_message("Done");
    println!(
        "\nExtracted {} files ({} failed, {} skipped) to {}",
        success,
        failed,
        skipped,
        output_dir.display()
    );
    Ok((success, failed, skipped))
}
