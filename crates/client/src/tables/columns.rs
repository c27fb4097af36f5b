//! Typed column access on tables of uncertain provenance.
//!
//! A table read back from CSV has re-inferred types (`car_number` may come
//! back as integers, an all-empty column as `Null`). Readers here cast to
//! the type they want and treat unreadable cells as null.

use arrow::array::{Array, AsArray, Int64Array};
use arrow::compute::kernels::cmp;
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use pitlane_core::{Error, Table};

fn cast_column(table: &Table, name: &str, to: &DataType) -> Result<Option<arrow::array::ArrayRef>, Error> {
    let Some(column) = table.column_by_name(name) else {
        return Ok(None);
    };
    cast(column, to)
        .map(Some)
        .map_err(|e| Error::InvalidInput(format!("column {name} cannot be read as {to}: {e}")))
}

/// Values of `name` as integers, or `None` when the column is absent.
pub fn int_column(table: &Table, name: &str) -> Result<Option<Vec<Option<i64>>>, Error> {
    Ok(cast_column(table, name, &DataType::Int64)?.map(|a| a.as_primitive::<Int64Type>().iter().collect()))
}

pub fn float_column(table: &Table, name: &str) -> Result<Option<Vec<Option<f64>>>, Error> {
    Ok(cast_column(table, name, &DataType::Float64)?.map(|a| a.as_primitive::<Float64Type>().iter().collect()))
}

pub fn string_column(table: &Table, name: &str) -> Result<Option<Vec<Option<String>>>, Error> {
    Ok(cast_column(table, name, &DataType::Utf8)?
        .map(|a| a.as_string::<i32>().iter().map(|v| v.map(str::to_string)).collect()))
}

/// Rows whose `column` equals `value`. A missing column matches nothing.
pub fn filter_eq_int(table: &Table, column: &str, value: i64) -> Result<Table, Error> {
    let Some(values) = cast_column(table, column, &DataType::Int64)? else {
        return Ok(RecordBatch::new_empty(table.schema()));
    };
    let mask = cmp::eq(&values, &Int64Array::new_scalar(value))
        .map_err(|e| Error::InvalidInput(format!("cannot compare column {column}: {e}")))?;
    filter_record_batch(table, &mask).map_err(|e| Error::InvalidInput(format!("cannot filter on {column}: {e}")))
}
