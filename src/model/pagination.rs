// src/model/pagination.rs
//! List envelopes returned by paginated endpoints.

use super::registry::{construct, decode, Discriminated, Registry};
use super::{Database, Page, PropertyItem, RollupSummary, TaggedObject};
use crate::error::AppError;
use crate::model::Block;
use crate::types::User;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::Value;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub results: Vec<T>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    /// Present on property-item lists; carries the rollup sub-envelope.
    pub property_item: Option<PropertyItemSummary>,
}

/// The `property_item` object attached to a paginated property response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyItemSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub next_url: Option<String>,
    #[serde(default)]
    pub rollup: Option<RollupSummary>,
}

/// A decoded list, tagged by what its results are.
#[derive(Debug, Clone, PartialEq)]
pub enum Pagination {
    PropertyItem(Envelope<PropertyItem>),
    Page(Envelope<Page>),
    Block(Envelope<Block>),
    Database(Envelope<Database>),
    User(Envelope<User>),
    PageOrDatabase(Envelope<TaggedObject>),
}

impl Pagination {
    pub fn list_type(&self) -> &'static str {
        match self {
            Self::PropertyItem(_) => "property_item",
            Self::Page(_) => "page",
            Self::Block(_) => "block",
            Self::Database(_) => "database",
            Self::User(_) => "user",
            Self::PageOrDatabase(_) => "page_or_database",
        }
    }
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    results: Vec<Value>,
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
    #[serde(default)]
    property_item: Option<PropertyItemSummary>,
}

fn envelope<T>(
    type_name: &'static str,
    raw: &Value,
    item: fn(&Value) -> Result<Option<T>, AppError>,
    wrap: fn(Envelope<T>) -> Pagination,
) -> Result<Option<Pagination>, AppError> {
    let header: EnvelopeHeader = construct(type_name, raw)?;

    if header.has_more != header.next_cursor.is_some() {
        return Err(AppError::invalid_payload(
            type_name,
            "next_cursor must be present exactly when has_more is true",
            raw,
        ));
    }

    let mut results = Vec::with_capacity(header.results.len());
    for value in &header.results {
        match item(value)? {
            Some(decoded) => results.push(decoded),
            None => log::debug!("{} dropped an unsupported result", type_name),
        }
    }

    Ok(Some(wrap(Envelope {
        results,
        has_more: header.has_more,
        next_cursor: header.next_cursor,
        property_item: header.property_item,
    })))
}

static PAGINATIONS: Lazy<Registry<Pagination>> = Lazy::new(|| {
    Registry::new("Pagination", "type")
        .register("property_item", |raw| {
            envelope("PropertyItemPagination", raw, decode::<PropertyItem>, Pagination::PropertyItem)
        })
        .register("page", |raw| {
            envelope("PagePagination", raw, |v| Page::from_wire(v).map(Some), Pagination::Page)
        })
        .register("block", |raw| {
            envelope("BlockPagination", raw, decode::<Block>, Pagination::Block)
        })
        .register("database", |raw| {
            envelope("DatabasePagination", raw, |v| Database::from_wire(v).map(Some), Pagination::Database)
        })
        .register("user", |raw| {
            envelope("UserPagination", raw, |v| construct::<User>("User", v).map(Some), Pagination::User)
        })
        .register("page_or_database", |raw| {
            envelope("PageOrDatabasePagination", raw, decode::<TaggedObject>, Pagination::PageOrDatabase)
        })
});

impl Discriminated for Pagination {
    fn registry() -> &'static Registry<Self> {
        &PAGINATIONS
    }
}

/// Items a list endpoint can yield, recovered from the decoded list.
pub trait ListItem: Sized + Send + 'static {
    /// Human-readable list kind for error messages.
    const LIST_KIND: &'static str;

    fn from_pagination(list: Pagination) -> Option<Envelope<Self>>;

    fn from_object(object: TaggedObject) -> Result<Envelope<Self>, AppError> {
        match object {
            TaggedObject::List(list) => {
                let found = list.list_type();
                Self::from_pagination(list).ok_or_else(|| AppError::UnexpectedObject {
                    expected: Self::LIST_KIND,
                    found: format!("{} list", found),
                })
            }
            other => Err(AppError::UnexpectedObject {
                expected: Self::LIST_KIND,
                found: other.object_kind().to_string(),
            }),
        }
    }
}

impl ListItem for PropertyItem {
    const LIST_KIND: &'static str = "property_item list";

    fn from_pagination(list: Pagination) -> Option<Envelope<Self>> {
        match list {
            Pagination::PropertyItem(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl ListItem for Page {
    const LIST_KIND: &'static str = "page list";

    fn from_pagination(list: Pagination) -> Option<Envelope<Self>> {
        match list {
            Pagination::Page(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl ListItem for Block {
    const LIST_KIND: &'static str = "block list";

    fn from_pagination(list: Pagination) -> Option<Envelope<Self>> {
        match list {
            Pagination::Block(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl ListItem for Database {
    const LIST_KIND: &'static str = "database list";

    fn from_pagination(list: Pagination) -> Option<Envelope<Self>> {
        match list {
            Pagination::Database(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl ListItem for User {
    const LIST_KIND: &'static str = "user list";

    fn from_pagination(list: Pagination) -> Option<Envelope<Self>> {
        match list {
            Pagination::User(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl ListItem for TaggedObject {
    const LIST_KIND: &'static str = "page_or_database list";

    fn from_pagination(list: Pagination) -> Option<Envelope<Self>> {
        match list {
            Pagination::PageOrDatabase(envelope) => Some(envelope),
            _ => None,
        }
    }
}
