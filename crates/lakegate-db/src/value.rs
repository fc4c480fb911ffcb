//! Conversion of DuckDB cell values into JSON.

use base64::Engine as _;
use duckdb::types::{TimeUnit, Value, ValueRef};
use serde_json::{Map, Value as JsonValue};

/// Converts a single DuckDB value into its JSON representation.
///
/// Integers become numbers (HUGEINT values outside the `i64` range become
/// strings), non-finite floats become `null`, blobs are base64 encoded, and
/// dates, times and timestamps are rendered as ISO-8601 text. Lists and
/// arrays become JSON arrays, structs and maps become objects, and intervals
/// become ISO-8601 durations.
pub fn duckdb_value_to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Boolean(b) => JsonValue::Bool(b),
        ValueRef::TinyInt(i) => JsonValue::Number(i.into()),
        ValueRef::SmallInt(i) => JsonValue::Number(i.into()),
        ValueRef::Int(i) => JsonValue::Number(i.into()),
        ValueRef::BigInt(i) => JsonValue::Number(i.into()),
        ValueRef::HugeInt(i) => hugeint_to_json(i),
        ValueRef::UTinyInt(i) => JsonValue::Number(i.into()),
        ValueRef::USmallInt(i) => JsonValue::Number(i.into()),
        ValueRef::UInt(i) => JsonValue::Number(i.into()),
        ValueRef::UBigInt(i) => JsonValue::Number(i.into()),
        ValueRef::Float(f) => real_to_json(f),
        ValueRef::Double(f) => float_to_json(f),
        ValueRef::Decimal(d) => JsonValue::String(d.to_string()),
        ValueRef::Text(s) => JsonValue::String(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => blob_to_json(b),
        ValueRef::Date32(days) => date_to_json(days),
        ValueRef::Timestamp(unit, raw) => timestamp_to_json(unit, raw),
        ValueRef::Time64(unit, raw) => time_to_json(unit, raw),
        ValueRef::Interval {
            months,
            days,
            nanos,
        } => JsonValue::String(interval_to_iso(months, days, nanos)),
        // Containers are materialized once, then walked recursively.
        nested @ (ValueRef::List(..)
        | ValueRef::Array(..)
        | ValueRef::Struct(..)
        | ValueRef::Map(..)
        | ValueRef::Union(..)
        | ValueRef::Enum(..)) => owned_to_json(&nested.to_owned()),
        other => JsonValue::String(format!("{other:?}")),
    }
}

fn owned_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::TinyInt(i) => JsonValue::Number((*i).into()),
        Value::SmallInt(i) => JsonValue::Number((*i).into()),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::BigInt(i) => JsonValue::Number((*i).into()),
        Value::HugeInt(i) => hugeint_to_json(*i),
        Value::UTinyInt(i) => JsonValue::Number((*i).into()),
        Value::USmallInt(i) => JsonValue::Number((*i).into()),
        Value::UInt(i) => JsonValue::Number((*i).into()),
        Value::UBigInt(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => real_to_json(*f),
        Value::Double(f) => float_to_json(*f),
        Value::Decimal(d) => JsonValue::String(d.to_string()),
        Value::Text(s) | Value::Enum(s) => JsonValue::String(s.clone()),
        Value::Blob(b) => blob_to_json(b),
        Value::Date32(days) => date_to_json(*days),
        Value::Timestamp(unit, raw) => timestamp_to_json(*unit, *raw),
        Value::Time64(unit, raw) => time_to_json(*unit, *raw),
        Value::Interval {
            months,
            days,
            nanos,
        } => JsonValue::String(interval_to_iso(*months, *days, *nanos)),
        Value::List(items) | Value::Array(items) => {
            JsonValue::Array(items.iter().map(owned_to_json).collect())
        }
        Value::Struct(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), owned_to_json(v)))
                .collect(),
        ),
        Value::Map(entries) => {
            let mut object = Map::new();
            for (key, v) in entries.iter() {
                let key = match owned_to_json(key) {
                    JsonValue::String(s) => s,
                    other => other.to_string(),
                };
                object.insert(key, owned_to_json(v));
            }
            JsonValue::Object(object)
        }
        Value::Union(inner) => owned_to_json(inner),
        other => JsonValue::String(format!("{other:?}")),
    }
}

fn hugeint_to_json(i: i128) -> JsonValue {
    match i64::try_from(i) {
        Ok(n) => JsonValue::Number(n.into()),
        Err(_) => JsonValue::String(i.to_string()),
    }
}

/// REAL values go through their shortest `f32` text so `0.79` stays `0.79`.
fn real_to_json(f: f32) -> JsonValue {
    match f.to_string().parse::<f64>() {
        Ok(widened) => float_to_json(widened),
        Err(_) => JsonValue::Null,
    }
}

fn float_to_json(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

fn blob_to_json(b: &[u8]) -> JsonValue {
    JsonValue::String(base64::engine::general_purpose::STANDARD.encode(b))
}

fn date_to_json(days: i32) -> JsonValue {
    chrono::DateTime::from_timestamp(i64::from(days) * 86_400, 0)
        .map(|dt| JsonValue::String(dt.date_naive().format("%Y-%m-%d").to_string()))
        .unwrap_or(JsonValue::Null)
}

fn timestamp_to_json(unit: TimeUnit, raw: i64) -> JsonValue {
    chrono::DateTime::from_timestamp_micros(to_micros(unit, raw))
        .map(|dt| JsonValue::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
        .unwrap_or(JsonValue::Null)
}

fn time_to_json(unit: TimeUnit, raw: i64) -> JsonValue {
    let micros = to_micros(unit, raw);
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1_000;
    u32::try_from(secs)
        .ok()
        .zip(u32::try_from(nanos).ok())
        .and_then(|(secs, nanos)| chrono::NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
        .map(|t| JsonValue::String(t.format("%H:%M:%S%.f").to_string()))
        .unwrap_or(JsonValue::Null)
}

fn to_micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

/// Renders an interval as an ISO-8601 duration, e.g. `P1Y2M3DT4H5M6.5S`.
/// Components keep DuckDB's sign per field; a zero interval is `PT0S`.
fn interval_to_iso(months: i32, days: i32, nanos: i64) -> String {
    let mut out = String::from("P");
    let (years, months) = (months / 12, months % 12);
    if years != 0 {
        out.push_str(&format!("{years}Y"));
    }
    if months != 0 {
        out.push_str(&format!("{months}M"));
    }
    if days != 0 {
        out.push_str(&format!("{days}D"));
    }

    if nanos != 0 {
        out.push('T');
        let hours = nanos / 3_600_000_000_000;
        let minutes = (nanos / 60_000_000_000) % 60;
        let secs = (nanos / 1_000_000_000) % 60;
        let frac = (nanos % 1_000_000_000).abs();
        if hours != 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes != 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if secs != 0 || frac != 0 {
            if frac == 0 {
                out.push_str(&format!("{secs}S"));
            } else {
                let sign = if nanos < 0 && secs == 0 { "-" } else { "" };
                let digits = format!("{frac:09}");
                out.push_str(&format!("{sign}{secs}.{}S", digits.trim_end_matches('0')));
            }
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    out
}
