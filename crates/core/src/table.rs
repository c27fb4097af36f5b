//! Rectangular tables exchanged with the cache.
//!
//! A table is an Arrow `RecordBatch`: named columns with a concrete type
//! each. Normalizers describe their columns once with [`schema`] and feed
//! plain serde row structs through [`rows_to_table`].

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::json::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::Error;

/// A cached table.
pub type Table = RecordBatch;

/// Build a schema of nullable columns, in order.
pub fn schema(columns: &[(&str, DataType)]) -> SchemaRef {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, data_type)| Field::new(*name, data_type.clone(), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Convert serializable rows into a table with the given schema.
///
/// Row field names must match column names; missing or `None` fields
/// become nulls. An empty slice yields an empty table that still carries
/// the schema.
pub fn rows_to_table<S: Serialize>(schema: SchemaRef, rows: &[S]) -> Result<Table, Error> {
    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_batch_size(rows.len().max(1))
        .build_decoder()
        .map_err(|e| Error::InvalidInput(format!("failed to build table decoder: {e}")))?;

    decoder
        .serialize(rows)
        .map_err(|e| Error::InvalidInput(format!("row does not fit table schema: {e}")))?;

    let batch = decoder
        .flush()
        .map_err(|e| Error::InvalidInput(format!("failed to assemble table: {e}")))?;

    Ok(batch.unwrap_or_else(|| RecordBatch::new_empty(schema)))
}
