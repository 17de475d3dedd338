// src/model/property.rs
//! Property items: the runtime value of one property on one page.
//!
//! The same shape arrives in three places: embedded in a page's
//! `properties` map, as the body of a single-item property fetch, and as
//! the elements of a paginated property fetch. All three decode through the
//! `PropertyItem` registry.

use super::registry::{construct, construct_field, one_or_many, Discriminated, Registry};
use crate::error::AppError;
use crate::types::{
    DateValue, FileReference, RelationRef, RichTextItem, SelectOption, UniqueIdValue, User,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property kinds the API returns but this client does not model.
pub const UNSUPPORTED_PROPERTY_TYPES: &[&str] = &["button", "verification"];

/// One decoded property value with its pagination hints.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyItem {
    pub id: Option<String>,
    /// Set on embedded list values that were truncated by the server.
    pub has_more: bool,
    pub next_url: Option<String>,
    pub value: PropertyValue,
}

impl PropertyItem {
    pub fn property_type(&self) -> &'static str {
        self.value.property_type()
    }
}

/// The typed value, one variant per property type.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(Vec<RichTextItem>),
    RichText(Vec<RichTextItem>),
    Number(Option<f64>),
    Select(Option<SelectOption>),
    Status(Option<SelectOption>),
    MultiSelect(Vec<SelectOption>),
    Date(Option<DateValue>),
    People(Vec<User>),
    Files(Vec<FileReference>),
    Checkbox(bool),
    Url(Option<String>),
    Email(Option<String>),
    PhoneNumber(Option<String>),
    Formula(FormulaValue),
    Relation(Vec<RelationRef>),
    Rollup(RollupSummary),
    CreatedTime(String),
    CreatedBy(User),
    LastEditedTime(String),
    LastEditedBy(User),
    UniqueId(UniqueIdValue),
}

impl PropertyValue {
    /// The wire discriminator for this variant.
    pub fn property_type(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::RichText(_) => "rich_text",
            Self::Number(_) => "number",
            Self::Select(_) => "select",
            Self::Status(_) => "status",
            Self::MultiSelect(_) => "multi_select",
            Self::Date(_) => "date",
            Self::People(_) => "people",
            Self::Files(_) => "files",
            Self::Checkbox(_) => "checkbox",
            Self::Url(_) => "url",
            Self::Email(_) => "email",
            Self::PhoneNumber(_) => "phone_number",
            Self::Formula(_) => "formula",
            Self::Relation(_) => "relation",
            Self::Rollup(_) => "rollup",
            Self::CreatedTime(_) => "created_time",
            Self::CreatedBy(_) => "created_by",
            Self::LastEditedTime(_) => "last_edited_time",
            Self::LastEditedBy(_) => "last_edited_by",
            Self::UniqueId(_) => "unique_id",
        }
    }
}

/// The computed result of a formula, tagged by its output type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    String {
        #[serde(default)]
        string: Option<String>,
    },
    Number {
        #[serde(default)]
        number: Option<f64>,
    },
    Boolean {
        #[serde(default)]
        boolean: Option<bool>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
}

/// The `rollup` object of a property item.
///
/// `rollup_type` stays a string: the resolver decides what an unfamiliar
/// variant means, and it only knows once pagination has finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupSummary {
    #[serde(rename = "type")]
    pub rollup_type: String,
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub number: Option<f64>,
    #[serde(default)]
    pub date: Option<DateValue>,
    /// Embedded array results, still undecoded property items.
    #[serde(default)]
    pub array: Option<Vec<Value>>,
}

/// A rollup after pagination has finished and the variant is known.
///
/// The `incomplete` and `unsupported` states never become values; the
/// resolver reports them as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum RollupValue {
    Number(Option<f64>),
    Date(Option<DateValue>),
    Array(Vec<PropertyItem>),
}

/// Fields every item shares regardless of type.
#[derive(Deserialize)]
struct ItemHeader {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_url: Option<String>,
}

fn item(type_name: &'static str, raw: &Value, value: PropertyValue) -> Result<Option<PropertyItem>, AppError> {
    let header: ItemHeader = construct(type_name, raw)?;
    Ok(Some(PropertyItem {
        id: header.id,
        has_more: header.has_more,
        next_url: header.next_url,
        value,
    }))
}

/// Decodes `raw[field]` as `P` and wraps it into a property item.
fn scalar<P: serde::de::DeserializeOwned>(
    type_name: &'static str,
    field: &'static str,
    raw: &Value,
    wrap: fn(P) -> PropertyValue,
) -> Result<Option<PropertyItem>, AppError> {
    let payload = construct_field::<P>(type_name, field, raw)?;
    item(type_name, raw, wrap(payload))
}

/// Decodes a list payload. Paginated results carry one element per item
/// where embedded values carry the whole array.
fn listed<P: serde::de::DeserializeOwned>(
    type_name: &'static str,
    field: &'static str,
    raw: &Value,
    wrap: fn(Vec<P>) -> PropertyValue,
) -> Result<Option<PropertyItem>, AppError> {
    let payload = raw.get(field).ok_or_else(|| {
        AppError::invalid_payload(type_name, format!("missing field `{}`", field), raw)
    })?;
    let items: Vec<P> =
        one_or_many(payload).map_err(|e| AppError::invalid_payload(type_name, e, raw))?;
    item(type_name, raw, wrap(items))
}

static PROPERTY_ITEMS: Lazy<Registry<PropertyItem>> = Lazy::new(|| {
    Registry::new("PropertyItem", "type")
        .register("title", |raw| listed("TitlePropertyItem", "title", raw, PropertyValue::Title))
        .register("rich_text", |raw| {
            listed("RichTextPropertyItem", "rich_text", raw, PropertyValue::RichText)
        })
        .register("number", |raw| scalar("NumberPropertyItem", "number", raw, PropertyValue::Number))
        .register("select", |raw| scalar("SelectPropertyItem", "select", raw, PropertyValue::Select))
        .register("status", |raw| scalar("StatusPropertyItem", "status", raw, PropertyValue::Status))
        .register("multi_select", |raw| {
            listed("MultiSelectPropertyItem", "multi_select", raw, PropertyValue::MultiSelect)
        })
        .register("date", |raw| scalar("DatePropertyItem", "date", raw, PropertyValue::Date))
        .register("people", |raw| listed("PeoplePropertyItem", "people", raw, PropertyValue::People))
        .register("files", |raw| listed("FilesPropertyItem", "files", raw, PropertyValue::Files))
        .register("checkbox", |raw| {
            scalar("CheckboxPropertyItem", "checkbox", raw, PropertyValue::Checkbox)
        })
        .register("url", |raw| scalar("UrlPropertyItem", "url", raw, PropertyValue::Url))
        .register("email", |raw| scalar("EmailPropertyItem", "email", raw, PropertyValue::Email))
        .register("phone_number", |raw| {
            scalar("PhoneNumberPropertyItem", "phone_number", raw, PropertyValue::PhoneNumber)
        })
        .register("formula", |raw| scalar("FormulaPropertyItem", "formula", raw, PropertyValue::Formula))
        .register("relation", |raw| {
            listed("RelationPropertyItem", "relation", raw, PropertyValue::Relation)
        })
        .register("rollup", |raw| scalar("RollupPropertyItem", "rollup", raw, PropertyValue::Rollup))
        .register("created_time", |raw| {
            scalar("CreatedTimePropertyItem", "created_time", raw, PropertyValue::CreatedTime)
        })
        .register("created_by", |raw| {
            scalar("CreatedByPropertyItem", "created_by", raw, PropertyValue::CreatedBy)
        })
        .register("last_edited_time", |raw| {
            scalar("LastEditedTimePropertyItem", "last_edited_time", raw, PropertyValue::LastEditedTime)
        })
        .register("last_edited_by", |raw| {
            scalar("LastEditedByPropertyItem", "last_edited_by", raw, PropertyValue::LastEditedBy)
        })
        .register("unique_id", |raw| {
            scalar("UniqueIdPropertyItem", "unique_id", raw, PropertyValue::UniqueId)
        })
        .unsupported(UNSUPPORTED_PROPERTY_TYPES)
});

impl Discriminated for PropertyItem {
    fn registry() -> &'static Registry<Self> {
        &PROPERTY_ITEMS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::registry::decode;
    use serde_json::json;

    #[test]
    fn test_embedded_title_is_an_array() {
        let raw = json!({
            "id": "title",
            "type": "title",
            "title": [
                {"type": "text", "text": {"content": "Hello ", "link": null}, "plain_text": "Hello "},
                {"type": "text", "text": {"content": "world", "link": null}, "plain_text": "world"}
            ]
        });
        let item = decode::<PropertyItem>(&raw).unwrap().unwrap();
        assert_eq!(item.id.as_deref(), Some("title"));
        match item.value {
            PropertyValue::Title(runs) => assert_eq!(runs.len(), 2),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_paginated_element_is_a_single_object() {
        let raw = json!({
            "object": "property_item",
            "id": "abc",
            "type": "relation",
            "relation": {"id": "page-2"}
        });
        let item = decode::<PropertyItem>(&raw).unwrap().unwrap();
        match item.value {
            PropertyValue::Relation(refs) => assert_eq!(refs[0].id.as_str(), "page-2"),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_nullable_value_must_still_be_present() {
        let null = json!({"id": "n", "type": "number", "number": null});
        let item = decode::<PropertyItem>(&null).unwrap().unwrap();
        assert_eq!(item.value, PropertyValue::Number(None));

        let missing = json!({"id": "n", "type": "number"});
        let err = decode::<PropertyItem>(&missing).unwrap_err();
        assert!(err.to_string().contains("NumberPropertyItem"));
    }

    #[test]
    fn test_formula_variants() {
        let raw = json!({"id": "f", "type": "formula", "formula": {"type": "boolean", "boolean": true}});
        let item = decode::<PropertyItem>(&raw).unwrap().unwrap();
        assert_eq!(
            item.value,
            PropertyValue::Formula(FormulaValue::Boolean { boolean: Some(true) })
        );
    }

    #[test]
    fn test_embedded_rollup_keeps_variant_as_text() {
        let raw = json!({
            "id": "r",
            "type": "rollup",
            "rollup": {"type": "number", "number": 3.0, "function": "sum"}
        });
        let item = decode::<PropertyItem>(&raw).unwrap().unwrap();
        match item.value {
            PropertyValue::Rollup(summary) => {
                assert_eq!(summary.rollup_type, "number");
                assert_eq!(summary.number, Some(3.0));
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn test_truncated_embedded_list_reports_has_more() {
        let raw = json!({"id": "p", "type": "people", "people": [], "has_more": true});
        let item = decode::<PropertyItem>(&raw).unwrap().unwrap();
        assert!(item.has_more);
    }

    #[test]
    fn test_unsupported_and_unknown_types() {
        let button = json!({"id": "b", "type": "button", "button": {}});
        assert!(decode::<PropertyItem>(&button).unwrap().is_none());

        let future = json!({"id": "x", "type": "hologram", "hologram": {}});
        let err = decode::<PropertyItem>(&future).unwrap_err();
        assert!(matches!(
            err,
            AppError::UnknownDiscriminator { base: "PropertyItem", ref value } if value == "hologram"
        ));
    }
}
