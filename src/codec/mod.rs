// src/codec/mod.rs
//! Converting property values between plain inputs, the typed model, and
//! the wire shape used for writes.
//!
//! Reads go wire → `PropertyItem` (through the registry) → `SimpleValue`.
//! Writes go `PropertyInput` → `PropertyValue` (checked against the
//! property's configured type) → write JSON.

mod input;
mod simple;

pub use input::PropertyInput;
pub use simple::{read, read_rollup, NamedFile, SimpleValue};

use crate::error::AppError;
use crate::model::{decode, PropertyItem, PropertyValue};
use crate::types::{
    parse_user_id, DateInstant, DateValue, PageId, RelationRef, RichTextItem, SelectOption, User,
    ValidatedUrl,
};
use serde_json::{json, Map, Value};

/// Property types that are computed by Notion and cannot be written.
pub const READ_ONLY_PROPERTY_TYPES: &[&str] = &[
    "formula",
    "rollup",
    "created_time",
    "created_by",
    "last_edited_time",
    "last_edited_by",
    "unique_id",
];

/// Builds the value a property of `config_type` should hold for `input`.
pub fn from_plain(config_type: &str, input: PropertyInput) -> Result<PropertyValue, AppError> {
    use PropertyInput as In;

    if READ_ONLY_PROPERTY_TYPES.contains(&config_type) {
        return Err(AppError::UnsupportedWrite {
            property_type: config_type.to_string(),
        });
    }

    let supplied = input.describe();
    let mismatch = || AppError::ConfigurationMismatch {
        expected: config_type.to_string(),
        supplied: supplied.clone(),
    };

    let value = match (config_type, input) {
        ("title", In::Text(text)) => PropertyValue::Title(vec![RichTextItem::plain(text)]),
        ("title", In::Clear) => PropertyValue::Title(Vec::new()),
        ("rich_text", In::Text(text)) => PropertyValue::RichText(vec![RichTextItem::plain(text)]),
        ("rich_text", In::Clear) => PropertyValue::RichText(Vec::new()),

        ("number", In::Number(number)) => PropertyValue::Number(Some(number)),
        ("number", In::Clear) => PropertyValue::Number(None),

        ("select", In::Text(name)) => PropertyValue::Select(Some(SelectOption::named(name))),
        ("select", In::Clear) => PropertyValue::Select(None),
        ("status", In::Text(name)) => PropertyValue::Status(Some(SelectOption::named(name))),
        ("status", In::Clear) => PropertyValue::Status(None),
        ("multi_select", In::List(names)) => {
            PropertyValue::MultiSelect(names.into_iter().map(SelectOption::named).collect())
        }
        ("multi_select", In::Clear) => PropertyValue::MultiSelect(Vec::new()),

        ("date", In::Date(date)) => PropertyValue::Date(Some(date)),
        ("date", In::Text(text)) => {
            let start: DateInstant = text.parse()?;
            PropertyValue::Date(Some(DateValue::starting(start)))
        }
        ("date", In::Clear) => PropertyValue::Date(None),

        ("people", In::Text(id)) => PropertyValue::People(vec![User::reference(parse_user_id(&id)?)]),
        ("people", In::List(ids)) => PropertyValue::People(
            ids.iter()
                .map(|id| parse_user_id(id).map(User::reference))
                .collect::<Result<_, _>>()?,
        ),
        ("people", In::Clear) => PropertyValue::People(Vec::new()),

        ("files", In::Files(files)) => PropertyValue::Files(files),
        ("files", In::List(items)) if items.is_empty() => PropertyValue::Files(Vec::new()),
        ("files", In::Clear) => PropertyValue::Files(Vec::new()),

        ("checkbox", In::Bool(flag)) => PropertyValue::Checkbox(flag),

        ("url", In::Text(url)) => {
            ValidatedUrl::parse(&url)?;
            PropertyValue::Url(Some(url))
        }
        ("url", In::Clear) => PropertyValue::Url(None),
        ("email", In::Text(email)) => PropertyValue::Email(Some(email)),
        ("email", In::Clear) => PropertyValue::Email(None),
        ("phone_number", In::Text(phone)) => PropertyValue::PhoneNumber(Some(phone)),
        ("phone_number", In::Clear) => PropertyValue::PhoneNumber(None),

        ("relation", In::Text(id)) => PropertyValue::Relation(vec![RelationRef {
            id: PageId::parse(&id)?,
        }]),
        ("relation", In::List(ids)) => PropertyValue::Relation(
            ids.iter()
                .map(|id| PageId::parse(id).map(|id| RelationRef { id }))
                .collect::<Result<_, _>>()?,
        ),
        ("relation", In::Clear) => PropertyValue::Relation(Vec::new()),

        (
            "title" | "rich_text" | "number" | "select" | "status" | "multi_select" | "date"
            | "people" | "files" | "checkbox" | "url" | "email" | "phone_number" | "relation",
            _,
        ) => return Err(mismatch()),

        (other, _) => {
            return Err(AppError::UnsupportedWrite {
                property_type: other.to_string(),
            })
        }
    };

    Ok(value)
}

fn rich_text_for_write(runs: &[RichTextItem]) -> Value {
    Value::Array(
        runs.iter()
            .map(|run| match &run.text {
                Some(text) => json!({"text": {"content": text.content, "link": text.link}}),
                None => json!({"text": {"content": run.display_text()}}),
            })
            .collect(),
    )
}

fn option_for_write(option: &Option<SelectOption>) -> Value {
    match option {
        Some(option) => json!({"name": option.name}),
        None => Value::Null,
    }
}

/// The write payload for one property, keyed by its type: `{type: ...}`.
pub fn to_wire(value: &PropertyValue) -> Result<Value, AppError> {
    let payload = match value {
        PropertyValue::Title(runs) | PropertyValue::RichText(runs) => rich_text_for_write(runs),
        PropertyValue::Number(number) => json!(number),
        PropertyValue::Select(option) | PropertyValue::Status(option) => option_for_write(option),
        PropertyValue::MultiSelect(options) => Value::Array(
            options
                .iter()
                .map(|option| json!({"name": option.name}))
                .collect(),
        ),
        PropertyValue::Date(date) => serde_json::to_value(date)?,
        PropertyValue::People(users) => Value::Array(
            users
                .iter()
                .map(|user| json!({"object": "user", "id": user.id}))
                .collect(),
        ),
        PropertyValue::Files(files) => serde_json::to_value(files)?,
        PropertyValue::Checkbox(flag) => Value::Bool(*flag),
        PropertyValue::Url(text) | PropertyValue::Email(text) | PropertyValue::PhoneNumber(text) => {
            json!(text)
        }
        PropertyValue::Relation(refs) => {
            Value::Array(refs.iter().map(|r| json!({"id": r.id})).collect())
        }
        PropertyValue::Formula(_)
        | PropertyValue::Rollup(_)
        | PropertyValue::CreatedTime(_)
        | PropertyValue::CreatedBy(_)
        | PropertyValue::LastEditedTime(_)
        | PropertyValue::LastEditedBy(_)
        | PropertyValue::UniqueId(_) => {
            return Err(AppError::UnsupportedWrite {
                property_type: value.property_type().to_string(),
            })
        }
    };

    let mut wire = Map::new();
    wire.insert(value.property_type().to_string(), payload);
    Ok(Value::Object(wire))
}

/// Decodes a value payload of `property_type`, e.g. the output of `to_wire`.
///
/// `None` for property kinds this client does not model.
pub fn from_wire(property_type: &str, raw: &Value) -> Result<Option<PropertyItem>, AppError> {
    let mut tagged = match raw {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert(property_type.to_string(), other.clone());
            map
        }
    };
    tagged.insert("type".to_string(), Value::from(property_type));
    decode::<PropertyItem>(&Value::Object(tagged))
}
