//! Table encoding on disk.
//!
//! CSV goes through Arrow's CSV reader/writer with schema inference on
//! load. Parquet goes through the `parquet` crate's Arrow bridge and is
//! only compiled in with the `parquet` feature.
//!
//! Writes land in a temporary file next to the destination and are renamed
//! over it, so a failed encode never leaves a partial table behind.

use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::record_batch::RecordBatch;
use tempfile::NamedTempFile;

use super::format::{PARQUET_COMPILED, TableFormat};
use crate::{Error, Table};

/// Encode `table` to `path` in `format`, replacing any existing file.
///
/// The codec check runs before anything touches disk. Missing parent
/// directories are created.
pub fn write_table(path: &Path, table: &Table, format: TableFormat) -> Result<(), Error> {
    write_table_gated(path, table, format, PARQUET_COMPILED)
}

pub(crate) fn write_table_gated(
    path: &Path, table: &Table, format: TableFormat, parquet_compiled: bool,
) -> Result<(), Error> {
    format.require_codec_with(parquet_compiled)?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::InvalidInput(format!("cache path has no parent: {}", path.display())))?;
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    match format {
        TableFormat::Csv => write_csv(tmp.as_file_mut(), path, table)?,
        TableFormat::Parquet => write_parquet(tmp.as_file_mut(), path, table)?,
    }
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(())
}

/// Decode the table stored at `path`.
pub fn read_table(path: &Path, format: TableFormat) -> Result<Table, Error> {
    format.require_codec()?;

    match format {
        TableFormat::Csv => read_csv(path),
        TableFormat::Parquet => read_parquet(path),
    }
}

fn write_csv(file: &mut File, path: &Path, table: &Table) -> Result<(), Error> {
    let mut buf = Vec::new();
    {
        let mut writer = WriterBuilder::new().with_header(true).build(&mut buf);
        writer.write(table).map_err(|e| Error::codec(path, e))?;
    }
    file.write_all(&buf)?;
    file.flush()?;
    Ok(())
}

fn read_csv(path: &Path) -> Result<Table, Error> {
    let mut file = File::open(path)?;

    let (schema, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, None)
        .map_err(|e| Error::codec(path, e))?;
    file.rewind()?;

    let schema = Arc::new(schema);
    if schema.fields().is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .build(file)
        .map_err(|e| Error::codec(path, e))?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::codec(path, e))?;

    concat_batches(&schema, &batches).map_err(|e| Error::codec(path, e))
}

#[cfg(feature = "parquet")]
fn write_parquet(file: &mut File, path: &Path, table: &Table) -> Result<(), Error> {
    use parquet::arrow::ArrowWriter;
    use parquet::basic::Compression;
    use parquet::file::properties::WriterProperties;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, table.schema(), Some(props)).map_err(|e| Error::codec(path, e))?;
    writer.write(table).map_err(|e| Error::codec(path, e))?;
    writer.close().map_err(|e| Error::codec(path, e))?;
    Ok(())
}

#[cfg(feature = "parquet")]
fn read_parquet(path: &Path) -> Result<Table, Error> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| Error::codec(path, e))?;
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(|e| Error::codec(path, e))?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::codec(path, e))?;

    concat_batches(&schema, &batches).map_err(|e| Error::codec(path, e))
}

#[cfg(not(feature = "parquet"))]
fn write_parquet(_file: &mut File, _path: &Path, _table: &Table) -> Result<(), Error> {
    Err(TableFormat::Parquet.missing_codec())
}

#[cfg(not(feature = "parquet"))]
fn read_parquet(_path: &Path) -> Result<Table, Error> {
    Err(TableFormat::Parquet.missing_codec())
}
