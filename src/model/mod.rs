// src/model/mod.rs
//! The typed object model decoded from Notion's wire format.
//!
//! Every response body is a `TaggedObject`, selected by its `object` field.
//! Pages and databases are terminal types; lists, property items, and
//! blocks dispatch once more on their `type` field through their own
//! registries.

mod block;
mod configuration;
mod pagination;
mod property;
pub mod registry;

pub use block::*;
pub use configuration::*;
pub use pagination::{Envelope, ListItem, Pagination, PropertyItemSummary};
pub use property::{
    FormulaValue, PropertyItem, PropertyValue, RollupSummary, RollupValue,
    UNSUPPORTED_PROPERTY_TYPES,
};
pub use registry::{decode, Discriminated};

use crate::error::AppError;
use crate::types::{
    join_rich_text, DatabaseId, FileSource, Icon, PageId, Parent, RichTextItem, User,
};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use registry::{construct, Registry};
use serde::Deserialize;
use serde_json::Value;

/// Any decoded response object.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedObject {
    Page(Page),
    Database(Database),
    List(Pagination),
    PropertyItem(PropertyItem),
    Block(Block),
    User(User),
}

impl TaggedObject {
    pub fn object_kind(&self) -> &'static str {
        match self {
            Self::Page(_) => "page",
            Self::Database(_) => "database",
            Self::List(_) => "list",
            Self::PropertyItem(_) => "property_item",
            Self::Block(_) => "block",
            Self::User(_) => "user",
        }
    }

    pub fn into_page(self) -> Result<Page, AppError> {
        match self {
            Self::Page(page) => Ok(page),
            other => Err(unexpected("page", &other)),
        }
    }

    pub fn into_database(self) -> Result<Database, AppError> {
        match self {
            Self::Database(database) => Ok(database),
            other => Err(unexpected("database", &other)),
        }
    }

    pub fn into_block(self) -> Result<Block, AppError> {
        match self {
            Self::Block(block) => Ok(block),
            other => Err(unexpected("block", &other)),
        }
    }

    pub fn into_user(self) -> Result<User, AppError> {
        match self {
            Self::User(user) => Ok(user),
            other => Err(unexpected("user", &other)),
        }
    }
}

fn unexpected(expected: &'static str, found: &TaggedObject) -> AppError {
    AppError::UnexpectedObject {
        expected,
        found: found.object_kind().to_string(),
    }
}

static TAGGED_OBJECTS: Lazy<Registry<TaggedObject>> = Lazy::new(|| {
    Registry::new("TaggedObject", "object")
        .register("page", |raw| Page::from_wire(raw).map(|p| Some(TaggedObject::Page(p))))
        .register("database", |raw| {
            Database::from_wire(raw).map(|d| Some(TaggedObject::Database(d)))
        })
        .register("list", |raw| Ok(decode::<Pagination>(raw)?.map(TaggedObject::List)))
        .register("property_item", |raw| {
            Ok(decode::<PropertyItem>(raw)?.map(TaggedObject::PropertyItem))
        })
        .register("block", |raw| Ok(decode::<Block>(raw)?.map(TaggedObject::Block)))
        .register("user", |raw| construct::<User>("User", raw).map(|u| Some(TaggedObject::User(u))))
});

impl Discriminated for TaggedObject {
    fn registry() -> &'static Registry<Self> {
        &TAGGED_OBJECTS
    }
}

/// A property as embedded in a page: identity, type, and decoded value.
///
/// `item` is `None` for property kinds this client does not model.
#[derive(Debug, Clone, PartialEq)]
pub struct PageProperty {
    pub id: String,
    pub property_type: String,
    pub item: Option<PropertyItem>,
}

/// A Notion page
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: PageId,
    pub created_time: String,
    pub last_edited_time: String,
    pub archived: bool,
    pub url: Option<String>,
    pub parent: Parent,
    pub icon: Option<Icon>,
    pub cover: Option<FileSource>,
    pub properties: IndexMap<String, PageProperty>,
}

#[derive(Deserialize)]
struct PageWire {
    id: PageId,
    #[serde(default)]
    created_time: String,
    #[serde(default)]
    last_edited_time: String,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    url: Option<String>,
    parent: Parent,
    #[serde(default)]
    icon: Option<Icon>,
    #[serde(default)]
    cover: Option<FileSource>,
    #[serde(default)]
    properties: IndexMap<String, Value>,
}

#[derive(Deserialize)]
struct PropertyHeader {
    id: String,
    #[serde(rename = "type")]
    property_type: String,
}

impl Page {
    pub fn from_wire(raw: &Value) -> Result<Self, AppError> {
        let wire: PageWire = construct("Page", raw)?;

        let mut properties = IndexMap::with_capacity(wire.properties.len());
        for (name, value) in wire.properties {
            let header: PropertyHeader = construct("PageProperty", &value)?;
            let item = decode::<PropertyItem>(&value)?;
            properties.insert(
                name,
                PageProperty {
                    id: header.id,
                    property_type: header.property_type,
                    item,
                },
            );
        }

        Ok(Self {
            id: wire.id,
            created_time: wire.created_time,
            last_edited_time: wire.last_edited_time,
            archived: wire.archived,
            url: wire.url,
            parent: wire.parent,
            icon: wire.icon,
            cover: wire.cover,
            properties,
        })
    }

    /// Looks a property up by name, falling back to its id.
    pub fn property(&self, key: &str) -> Option<(&str, &PageProperty)> {
        if let Some((name, property)) = self.properties.get_key_value(key) {
            return Some((name.as_str(), property));
        }
        self.properties
            .iter()
            .find(|(_, property)| property.id == key)
            .map(|(name, property)| (name.as_str(), property))
    }

    /// The plain text of the title property, empty when there is none.
    pub fn title(&self) -> String {
        self.properties
            .values()
            .find_map(|property| match &property.item {
                Some(PropertyItem {
                    value: PropertyValue::Title(runs),
                    ..
                }) => Some(join_rich_text(runs)),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn database_id(&self) -> Option<&DatabaseId> {
        match &self.parent {
            Parent::DatabaseId { database_id } => Some(database_id),
            _ => None,
        }
    }
}

/// A Notion database and its column configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    pub id: DatabaseId,
    pub title: Vec<RichTextItem>,
    pub description: Vec<RichTextItem>,
    pub url: Option<String>,
    pub archived: bool,
    pub is_inline: bool,
    pub parent: Parent,
    pub icon: Option<Icon>,
    pub properties: IndexMap<String, PropertyConfiguration>,
}

#[derive(Deserialize)]
struct DatabaseWire {
    id: DatabaseId,
    #[serde(default)]
    title: Vec<RichTextItem>,
    #[serde(default)]
    description: Vec<RichTextItem>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    is_inline: bool,
    parent: Parent,
    #[serde(default)]
    icon: Option<Icon>,
    #[serde(default)]
    properties: IndexMap<String, Value>,
}

impl Database {
    pub fn from_wire(raw: &Value) -> Result<Self, AppError> {
        let wire: DatabaseWire = construct("Database", raw)?;

        let mut properties = IndexMap::with_capacity(wire.properties.len());
        for (name, value) in wire.properties {
            match decode::<PropertyConfiguration>(&value)? {
                Some(configuration) => {
                    properties.insert(name, configuration);
                }
                None => log::debug!("Database column '{}' has an unsupported type", name),
            }
        }

        Ok(Self {
            id: wire.id,
            title: wire.title,
            description: wire.description,
            url: wire.url,
            archived: wire.archived,
            is_inline: wire.is_inline,
            parent: wire.parent,
            icon: wire.icon,
            properties,
        })
    }

    pub fn title_text(&self) -> String {
        join_rich_text(&self.title)
    }

    /// Looks a column up by name, falling back to its id.
    pub fn property(&self, key: &str) -> Option<(&str, &PropertyConfiguration)> {
        if let Some((name, configuration)) = self.properties.get_key_value(key) {
            return Some((name.as_str(), configuration));
        }
        self.properties
            .iter()
            .find(|(_, configuration)| configuration.id == key)
            .map(|(name, configuration)| (name.as_str(), configuration))
    }

    /// Columns that relate to another database.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationConfiguration)> {
        self.properties
            .iter()
            .filter_map(|(name, configuration)| match &configuration.kind {
                ConfigurationKind::Relation(relation) => Some((name.as_str(), relation)),
                _ => None,
            })
    }
}
