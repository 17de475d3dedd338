// src/model/configuration.rs
//! Database column metadata.

use super::property::UNSUPPORTED_PROPERTY_TYPES;
use super::registry::{construct, construct_field, Discriminated, Registry};
use crate::error::AppError;
use crate::types::{DatabaseId, SelectOption};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One column of a database: identity plus the type-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyConfiguration {
    pub id: String,
    pub name: String,
    pub kind: ConfigurationKind,
}

impl PropertyConfiguration {
    pub fn config_type(&self) -> &'static str {
        self.kind.config_type()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationKind {
    Title,
    RichText,
    Number(NumberConfiguration),
    Select(OptionsConfiguration),
    Status(StatusConfiguration),
    MultiSelect(OptionsConfiguration),
    Date,
    People,
    Files,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    Formula(FormulaConfiguration),
    Relation(RelationConfiguration),
    Rollup(RollupConfiguration),
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    UniqueId(UniqueIdConfiguration),
}

impl ConfigurationKind {
    /// The wire discriminator, shared with the matching property item.
    pub fn config_type(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::RichText => "rich_text",
            Self::Number(_) => "number",
            Self::Select(_) => "select",
            Self::Status(_) => "status",
            Self::MultiSelect(_) => "multi_select",
            Self::Date => "date",
            Self::People => "people",
            Self::Files => "files",
            Self::Checkbox => "checkbox",
            Self::Url => "url",
            Self::Email => "email",
            Self::PhoneNumber => "phone_number",
            Self::Formula(_) => "formula",
            Self::Relation(_) => "relation",
            Self::Rollup(_) => "rollup",
            Self::CreatedTime => "created_time",
            Self::CreatedBy => "created_by",
            Self::LastEditedTime => "last_edited_time",
            Self::LastEditedBy => "last_edited_by",
            Self::UniqueId(_) => "unique_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberConfiguration {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsConfiguration {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusConfiguration {
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub groups: Vec<StatusGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusGroup {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub option_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaConfiguration {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationConfiguration {
    pub database_id: DatabaseId,
    #[serde(rename = "type", default)]
    pub relation_type: Option<String>,
    #[serde(default)]
    pub synced_property_name: Option<String>,
    #[serde(default)]
    pub synced_property_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupConfiguration {
    pub relation_property_name: String,
    pub relation_property_id: String,
    pub rollup_property_name: String,
    pub rollup_property_id: String,
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueIdConfiguration {
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Deserialize)]
struct ConfigurationHeader {
    id: String,
    name: String,
}

/// A configuration whose payload carries nothing this client reads.
fn plain(
    type_name: &'static str,
    raw: &Value,
    kind: ConfigurationKind,
) -> Result<Option<PropertyConfiguration>, AppError> {
    let header: ConfigurationHeader = construct(type_name, raw)?;
    Ok(Some(PropertyConfiguration {
        id: header.id,
        name: header.name,
        kind,
    }))
}

/// A configuration whose payload sits under `field`.
fn detailed<P: serde::de::DeserializeOwned>(
    type_name: &'static str,
    field: &'static str,
    raw: &Value,
    wrap: fn(P) -> ConfigurationKind,
) -> Result<Option<PropertyConfiguration>, AppError> {
    let payload = construct_field::<P>(type_name, field, raw)?;
    plain(type_name, raw, wrap(payload))
}

static CONFIGURATIONS: Lazy<Registry<PropertyConfiguration>> = Lazy::new(|| {
    Registry::new("PropertyConfiguration", "type")
        .register("title", |raw| plain("TitleConfiguration", raw, ConfigurationKind::Title))
        .register("rich_text", |raw| plain("RichTextConfiguration", raw, ConfigurationKind::RichText))
        .register("number", |raw| {
            detailed("NumberConfiguration", "number", raw, ConfigurationKind::Number)
        })
        .register("select", |raw| {
            detailed("SelectConfiguration", "select", raw, ConfigurationKind::Select)
        })
        .register("status", |raw| {
            detailed("StatusConfiguration", "status", raw, ConfigurationKind::Status)
        })
        .register("multi_select", |raw| {
            detailed("MultiSelectConfiguration", "multi_select", raw, ConfigurationKind::MultiSelect)
        })
        .register("date", |raw| plain("DateConfiguration", raw, ConfigurationKind::Date))
        .register("people", |raw| plain("PeopleConfiguration", raw, ConfigurationKind::People))
        .register("files", |raw| plain("FilesConfiguration", raw, ConfigurationKind::Files))
        .register("checkbox", |raw| plain("CheckboxConfiguration", raw, ConfigurationKind::Checkbox))
        .register("url", |raw| plain("UrlConfiguration", raw, ConfigurationKind::Url))
        .register("email", |raw| plain("EmailConfiguration", raw, ConfigurationKind::Email))
        .register("phone_number", |raw| {
            plain("PhoneNumberConfiguration", raw, ConfigurationKind::PhoneNumber)
        })
        .register("formula", |raw| {
            detailed("FormulaConfiguration", "formula", raw, ConfigurationKind::Formula)
        })
        .register("relation", |raw| {
            detailed("RelationConfiguration", "relation", raw, ConfigurationKind::Relation)
        })
        .register("rollup", |raw| {
            detailed("RollupConfiguration", "rollup", raw, ConfigurationKind::Rollup)
        })
        .register("created_time", |raw| {
            plain("CreatedTimeConfiguration", raw, ConfigurationKind::CreatedTime)
        })
        .register("created_by", |raw| {
            plain("CreatedByConfiguration", raw, ConfigurationKind::CreatedBy)
        })
        .register("last_edited_time", |raw| {
            plain("LastEditedTimeConfiguration", raw, ConfigurationKind::LastEditedTime)
        })
        .register("last_edited_by", |raw| {
            plain("LastEditedByConfiguration", raw, ConfigurationKind::LastEditedBy)
        })
        .register("unique_id", |raw| {
            detailed("UniqueIdConfiguration", "unique_id", raw, ConfigurationKind::UniqueId)
        })
        .unsupported(UNSUPPORTED_PROPERTY_TYPES)
});

impl Discriminated for PropertyConfiguration {
    fn registry() -> &'static Registry<Self> {
        &CONFIGURATIONS
    }
}
