// src/codec/input.rs
//! Plain inputs accepted by property writes.

use crate::error::AppError;
use crate::types::{DateInstant, DateValue, FileReference, ValidationError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// A bare value a caller wants to store in a property.
///
/// The target property's configured type decides what it becomes; see
/// `codec::from_plain`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyInput {
    /// Clears the property.
    Clear,
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
    Date(DateValue),
    Files(Vec<FileReference>),
}

impl PropertyInput {
    /// Short description used in mismatch errors, e.g. `number 42`.
    pub fn describe(&self) -> String {
        match self {
            Self::Clear => "an empty value".to_string(),
            Self::Text(text) => format!("text {:?}", text),
            Self::Number(number) => format!("number {}", number),
            Self::Bool(flag) => format!("boolean {}", flag),
            Self::List(items) => format!("list {:?}", items),
            Self::Date(date) => format!("date {}", date.start),
            Self::Files(files) => format!("{} file reference(s)", files.len()),
        }
    }

    /// Maps a JSON value onto an input.
    ///
    /// Arrays of strings become lists, arrays of objects file references,
    /// and an object with a `start` key a date.
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        match value {
            Value::Null => Ok(Self::Clear),
            Value::Bool(flag) => Ok(Self::Bool(flag)),
            Value::Number(number) => number
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| unsupported(&number.to_string())),
            Value::String(text) => Ok(Self::Text(text)),
            Value::Array(items) if items.iter().all(Value::is_string) => Ok(Self::List(
                items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            )),
            Value::Array(items) => {
                let description = Value::Array(items.clone()).to_string();
                serde_json::from_value::<Vec<FileReference>>(Value::Array(items))
                    .map(Self::Files)
                    .map_err(|_| unsupported(&description))
            }
            Value::Object(map) if map.contains_key("start") => {
                let description = Value::Object(map.clone()).to_string();
                serde_json::from_value::<DateValue>(Value::Object(map))
                    .map(Self::Date)
                    .map_err(|_| unsupported(&description))
            }
            other => Err(unsupported(&other.to_string())),
        }
    }
}

fn unsupported(description: &str) -> AppError {
    AppError::Validation(ValidationError::UnsupportedInput(description.to_string()))
}

impl From<&str> for PropertyInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PropertyInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&String> for PropertyInput {
    fn from(text: &String) -> Self {
        Self::Text(text.clone())
    }
}

impl From<bool> for PropertyInput {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

macro_rules! number_input {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropertyInput {
                fn from(number: $ty) -> Self {
                    Self::Number(number as f64)
                }
            }
        )*
    };
}

number_input!(f64, f32, i64, i32, u64, u32, usize);

impl From<Vec<String>> for PropertyInput {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for PropertyInput {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for PropertyInput {
    fn from(items: &[&str]) -> Self {
        Self::List(items.iter().map(|item| item.to_string()).collect())
    }
}

impl From<DateValue> for PropertyInput {
    fn from(date: DateValue) -> Self {
        Self::Date(date)
    }
}

impl From<DateInstant> for PropertyInput {
    fn from(instant: DateInstant) -> Self {
        Self::Date(DateValue::starting(instant))
    }
}

impl From<NaiveDate> for PropertyInput {
    fn from(date: NaiveDate) -> Self {
        Self::Date(DateValue::starting(date))
    }
}

impl From<NaiveDateTime> for PropertyInput {
    fn from(local: NaiveDateTime) -> Self {
        Self::Date(DateValue::starting(local))
    }
}

impl From<DateTime<FixedOffset>> for PropertyInput {
    fn from(zoned: DateTime<FixedOffset>) -> Self {
        Self::Date(DateValue::starting(zoned))
    }
}

impl From<DateTime<Utc>> for PropertyInput {
    fn from(utc: DateTime<Utc>) -> Self {
        Self::Date(DateValue::starting(utc))
    }
}

/// A `(start, end)` range.
impl<S, E> From<(S, E)> for PropertyInput
where
    S: Into<DateInstant>,
    E: Into<DateInstant>,
{
    fn from((start, end): (S, E)) -> Self {
        Self::Date(DateValue::starting(start).with_end(end))
    }
}

/// A `(start, end, time_zone)` range.
impl<S, E> From<(S, E, &str)> for PropertyInput
where
    S: Into<DateInstant>,
    E: Into<DateInstant>,
{
    fn from((start, end, time_zone): (S, E, &str)) -> Self {
        Self::Date(DateValue::starting(start).with_end(end).with_time_zone(time_zone))
    }
}

impl From<FileReference> for PropertyInput {
    fn from(file: FileReference) -> Self {
        Self::Files(vec![file])
    }
}

impl From<Vec<FileReference>> for PropertyInput {
    fn from(files: Vec<FileReference>) -> Self {
        Self::Files(files)
    }
}

impl<T: Into<PropertyInput>> From<Option<T>> for PropertyInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Into::into)
    }
}
