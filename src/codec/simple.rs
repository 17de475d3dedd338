// src/codec/simple.rs
//! Reading property values as plain data.

use crate::error::AppError;
use crate::model::{FormulaValue, PropertyItem, PropertyValue, RollupValue};
use crate::pagination::rollup::resolve_embedded;
use crate::types::{join_rich_text, DateValue, FileReference};
use serde::Serialize;

/// A property value reduced to what a caller usually wants from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SimpleValue {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateValue),
    File(NamedFile),
    List(Vec<SimpleValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedFile {
    pub name: Option<String>,
    pub url: Option<String>,
}

impl From<&FileReference> for NamedFile {
    fn from(file: &FileReference) -> Self {
        Self {
            name: file.name.clone(),
            url: file.url().map(str::to_string),
        }
    }
}

impl SimpleValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SimpleValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    fn text(text: Option<&str>) -> Self {
        text.map_or(Self::Null, |text| Self::Text(text.to_string()))
    }
}

impl PartialEq<&str> for SimpleValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<f64> for SimpleValue {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl PartialEq<bool> for SimpleValue {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

/// Reads one property item. Embedded rollups are resolved on the spot.
pub fn read(item: &PropertyItem) -> Result<SimpleValue, AppError> {
    let value = match &item.value {
        PropertyValue::Title(runs) | PropertyValue::RichText(runs) => {
            SimpleValue::Text(join_rich_text(runs))
        }
        PropertyValue::Number(number) => number.map_or(SimpleValue::Null, SimpleValue::Number),
        PropertyValue::Select(option) | PropertyValue::Status(option) => {
            SimpleValue::text(option.as_ref().map(|o| o.name.as_str()))
        }
        PropertyValue::MultiSelect(options) => SimpleValue::List(
            options
                .iter()
                .map(|o| SimpleValue::Text(o.name.clone()))
                .collect(),
        ),
        PropertyValue::Date(date) => date.clone().map_or(SimpleValue::Null, SimpleValue::Date),
        PropertyValue::People(users) => SimpleValue::List(
            users
                .iter()
                .map(|u| SimpleValue::Text(u.display_name()))
                .collect(),
        ),
        PropertyValue::Files(files) => SimpleValue::List(
            files
                .iter()
                .map(|f| SimpleValue::File(NamedFile::from(f)))
                .collect(),
        ),
        PropertyValue::Checkbox(flag) => SimpleValue::Bool(*flag),
        PropertyValue::Url(text) | PropertyValue::Email(text) | PropertyValue::PhoneNumber(text) => {
            SimpleValue::text(text.as_deref())
        }
        PropertyValue::Formula(formula) => read_formula(formula),
        PropertyValue::Relation(refs) => SimpleValue::List(
            refs.iter()
                .map(|r| SimpleValue::Text(r.id.to_string()))
                .collect(),
        ),
        PropertyValue::Rollup(summary) => {
            let id = item.id.as_deref().unwrap_or_default();
            return read_rollup(resolve_embedded(id, summary)?);
        }
        PropertyValue::CreatedTime(time) | PropertyValue::LastEditedTime(time) => {
            SimpleValue::Text(time.clone())
        }
        PropertyValue::CreatedBy(user) | PropertyValue::LastEditedBy(user) => {
            SimpleValue::Text(user.display_name())
        }
        PropertyValue::UniqueId(unique) => SimpleValue::Text(unique.to_string()),
    };
    Ok(value)
}

fn read_formula(formula: &FormulaValue) -> SimpleValue {
    match formula {
        FormulaValue::String { string } => SimpleValue::text(string.as_deref()),
        FormulaValue::Number { number } => number.map_or(SimpleValue::Null, SimpleValue::Number),
        FormulaValue::Boolean { boolean } => boolean.map_or(SimpleValue::Null, SimpleValue::Bool),
        FormulaValue::Date { date } => date.clone().map_or(SimpleValue::Null, SimpleValue::Date),
    }
}

/// Reads a resolved rollup; array elements are read one by one.
pub fn read_rollup(value: RollupValue) -> Result<SimpleValue, AppError> {
    match value {
        RollupValue::Number(number) => Ok(number.map_or(SimpleValue::Null, SimpleValue::Number)),
        RollupValue::Date(date) => Ok(date.map_or(SimpleValue::Null, SimpleValue::Date)),
        RollupValue::Array(items) => items
            .iter()
            .map(read)
            .collect::<Result<Vec<_>, _>>()
            .map(SimpleValue::List),
    }
}
