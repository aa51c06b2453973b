//! Arrow schema inference and JSON/Arrow conversion
//!
//! Columns appear in the order they are first seen across the records, so a
//! decoded CSV keeps its header order.

use crate::error::{Error, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, NullArray, StringArray,
    StructArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::json::writer::{JsonArray, WriterBuilder};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Infer an Arrow schema from a set of JSON records
///
/// Every field is nullable. Conflicting types widen: integers and floats
/// become Float64, anything else falls back to Utf8.
pub fn infer_schema(records: &[Value]) -> Result<Schema> {
    let mut order: Vec<String> = Vec::new();
    let mut field_types: HashMap<String, DataType> = HashMap::new();

    for record in records {
        let Value::Object(obj) = record else {
            continue;
        };
        for (key, value) in obj {
            let inferred = infer_type(value);
            match field_types.get_mut(key) {
                Some(existing) => *existing = merge_types(existing, &inferred),
                None => {
                    order.push(key.clone());
                    field_types.insert(key.clone(), inferred);
                }
            }
        }
    }

    let fields: Vec<Field> = order
        .into_iter()
        .map(|name| {
            let dtype = field_types.remove(&name).unwrap_or(DataType::Null);
            Field::new(name, dtype, true)
        })
        .collect();

    Ok(Schema::new(fields))
}

/// Convert JSON records to an Arrow RecordBatch
///
/// Uses the provided schema or infers one from the data.
pub fn json_to_arrow(records: &[Value], schema: Option<&Schema>) -> Result<RecordBatch> {
    let schema = match schema {
        Some(schema) => schema.clone(),
        None => infer_schema(records)?,
    };
    let schema = Arc::new(schema);

    if records.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| record.as_object().and_then(|obj| obj.get(field.name())))
            .collect();
        columns.push(build_array(&values, field.data_type())?);
    }

    // A schema without columns still needs the row count
    let options = arrow::record_batch::RecordBatchOptions::new().with_row_count(Some(records.len()));
    RecordBatch::try_new_with_options(schema, columns, &options).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

/// Convert an Arrow RecordBatch to JSON records
///
/// Returns one JSON object per row; null cells are kept as explicit nulls.
pub fn arrow_to_json(batch: &RecordBatch) -> Result<Vec<Value>> {
    if batch.num_rows() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = WriterBuilder::new()
        .with_explicit_nulls(true)
        .build::<_, JsonArray>(Vec::new());
    writer.write(batch)?;
    writer.finish()?;

    Ok(serde_json::from_slice(&writer.into_inner())?)
}

/// Replace list and struct columns with their JSON text
///
/// Text writers such as CSV only accept primitive columns.
pub fn stringify_nested(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let nested: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.data_type().is_nested())
        .map(|(i, _)| i)
        .collect();

    if nested.is_empty() {
        return Ok(batch.clone());
    }

    let records = arrow_to_json(batch)?;
    let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for (i, field) in schema.fields().iter().enumerate() {
        if nested.contains(&i) {
            let column = batch.column(i);
            let text: StringArray = records
                .iter()
                .enumerate()
                .map(|(row, record)| {
                    if column.is_null(row) {
                        None
                    } else {
                        record.get(field.name()).map(ToString::to_string)
                    }
                })
                .collect();
            fields.push(Field::new(field.name(), DataType::Utf8, true));
            columns.push(Arc::new(text));
        } else {
            fields.push(field.as_ref().clone());
            columns.push(Arc::clone(batch.column(i)));
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Infer Arrow DataType from a JSON value
fn infer_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Null,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) => DataType::Utf8,
        Value::Array(arr) => {
            let element_type = arr
                .iter()
                .filter(|v| !v.is_null())
                .map(infer_type)
                .reduce(|a, b| merge_types(&a, &b))
                .unwrap_or(DataType::Null);
            DataType::List(Arc::new(Field::new("item", element_type, true)))
        }
        // An empty struct has no children to carry its length
        Value::Object(obj) if obj.is_empty() => DataType::Utf8,
        Value::Object(obj) => {
            let fields: Vec<Field> = obj
                .iter()
                .map(|(k, v)| Field::new(k, infer_type(v), true))
                .collect();
            DataType::Struct(Fields::from(fields))
        }
    }
}

/// Merge two data types into a compatible type
fn merge_types(type1: &DataType, type2: &DataType) -> DataType {
    match (type1, type2) {
        (a, b) if a == b => a.clone(),

        (DataType::Null, other) | (other, DataType::Null) => other.clone(),

        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        }

        (DataType::List(a), DataType::List(b)) => {
            let item = merge_types(a.data_type(), b.data_type());
            DataType::List(Arc::new(Field::new("item", item, true)))
        }

        (DataType::Struct(a), DataType::Struct(b)) => DataType::Struct(merge_fields(a, b)),

        _ => DataType::Utf8,
    }
}

/// Union of two struct field sets, keeping first-seen order
fn merge_fields(a: &Fields, b: &Fields) -> Fields {
    let mut merged: Vec<Field> = a.iter().map(|f| f.as_ref().clone()).collect();
    for field in b {
        match merged.iter_mut().find(|f| f.name() == field.name()) {
            Some(existing) => {
                let dtype = merge_types(existing.data_type(), field.data_type());
                *existing = Field::new(field.name(), dtype, true);
            }
            None => merged.push(field.as_ref().clone()),
        }
    }
    Fields::from(merged)
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(values, field),

        DataType::Struct(fields) => build_struct_array(values, fields),

        // Utf8 and anything unexpected use the value's text
        _ => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.filter(|v| !v.is_null()).map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }
    }
}

/// Build a list array from JSON arrays
fn build_list_array(values: &[Option<&Value>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&Value>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];

    for value in values {
        if let Some(Value::Array(arr)) = value {
            all_items.extend(arr.iter().map(Some));
        }
        let offset = i32::try_from(all_items.len()).map_err(|_| Error::Output {
            message: "Array too large for i32 offset".to_string(),
        })?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, field.data_type())?;
    let list_array = ListArray::try_new(
        Arc::clone(field),
        OffsetBuffer::new(offsets.into()),
        items_array,
        None,
    )?;
    Ok(Arc::new(list_array))
}

/// Build a struct array from JSON objects
fn build_struct_array(values: &[Option<&Value>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::with_capacity(fields.len());

    for field in fields {
        let child_values: Vec<Option<&Value>> = values
            .iter()
            .map(|v| v.and_then(Value::as_object).and_then(|obj| obj.get(field.name())))
            .collect();
        child_arrays.push(build_array(&child_values, field.data_type())?);
    }

    let struct_array = StructArray::try_new(fields.clone(), child_arrays, None)?;
    Ok(Arc::new(struct_array))
}
