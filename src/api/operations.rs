// src/api/operations.rs
//! Request construction and response handling shared by the async and
//! blocking object wrappers.
//!
//! Nothing here performs I/O. Each wrapper method builds its request here,
//! sends it through its own client, and hands the response back here.

use super::request::ApiRequest;
use crate::codec::{from_plain, read, read_rollup, to_wire, PropertyInput, SimpleValue};
use crate::error::AppError;
use crate::model::{
    Block, Database, Envelope, ListItem, Page, PropertyItem, PropertyValue, RollupValue,
    TaggedObject,
};
use crate::pagination::{Drain, ListRequest, RollupDrain};
use crate::types::{BlockId, DatabaseId, PageId, ValidatedUrl};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// How `get` may answer from the page's embedded values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetOptions {
    /// Serve embedded values when they are complete.
    pub cache: bool,
    /// Also serve embedded formula and rollup values, which may be stale.
    pub safety_off: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            cache: true,
            safety_off: false,
        }
    }
}

impl GetOptions {
    /// Always ask the properties endpoint.
    pub fn fresh() -> Self {
        Self {
            cache: false,
            safety_off: false,
        }
    }

    pub fn with_safety_off(mut self) -> Self {
        self.safety_off = true;
        self
    }
}

/// Where a property read will be answered from.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyFetch {
    Embedded(SimpleValue),
    Remote { name: String, property_id: String },
}

/// Decides whether the embedded value of `key` can be served.
///
/// Formulas and rollups are computed lazily by Notion and are refetched
/// unless `safety_off`. A list the server truncated (`has_more`) is never
/// served from the embedded copy.
pub fn plan_get(page: &Page, key: &str, options: GetOptions) -> Result<PropertyFetch, AppError> {
    let (name, property) = page
        .property(key)
        .ok_or_else(|| AppError::UnknownProperty(key.to_string()))?;

    let computed = matches!(property.property_type.as_str(), "formula" | "rollup");
    let remote = || PropertyFetch::Remote {
        name: name.to_string(),
        property_id: property.id.clone(),
    };

    if !options.cache || (computed && !options.safety_off) {
        return Ok(remote());
    }

    match &property.item {
        None => Ok(PropertyFetch::Embedded(SimpleValue::Null)),
        Some(item) if item.has_more => Ok(remote()),
        Some(item) => {
            log::debug!("Serving '{}' from the page object", name);
            Ok(PropertyFetch::Embedded(read(item)?))
        }
    }
}

pub fn page_request(id: &PageId) -> ApiRequest {
    ApiRequest::get(format!("pages/{}", id))
}

pub fn database_request(id: &DatabaseId) -> ApiRequest {
    ApiRequest::get(format!("databases/{}", id))
}

pub fn block_request(id: &BlockId) -> ApiRequest {
    ApiRequest::get(format!("blocks/{}", id))
}

pub fn me_request() -> ApiRequest {
    ApiRequest::get("users/me")
}

fn property_endpoint(page_id: &PageId, property_id: &str) -> String {
    format!("pages/{}/properties/{}", page_id, property_id)
}

/// Every call of a property read, the first one included.
pub fn property_list(page_id: &PageId, property_id: &str) -> ListRequest {
    ListRequest::get(property_endpoint(page_id, property_id))
}

pub fn children_list(block_id: &str) -> ListRequest {
    ListRequest::get(format!("blocks/{}/children", block_id))
}

/// A raw property read.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedProperty {
    /// A single-item response.
    Item(PropertyItem),
    /// Every item of a paginated list property, in order.
    List {
        property_id: String,
        property_type: String,
        items: Vec<PropertyItem>,
    },
    /// A paginated rollup, already resolved.
    Rollup(RollupValue),
    /// A property kind this client does not model.
    Unsupported,
}

impl FetchedProperty {
    /// Reduces the fetched items to one value.
    pub fn read(&self) -> Result<SimpleValue, AppError> {
        match self {
            FetchedProperty::Item(item) => read(item),
            FetchedProperty::Rollup(value) => read_rollup(value.clone()),
            FetchedProperty::Unsupported => Ok(SimpleValue::Null),
            FetchedProperty::List {
                property_id,
                property_type,
                items,
            } => {
                let merged = concat(property_type, items)?;
                read(&PropertyItem {
                    id: Some(property_id.clone()),
                    has_more: false,
                    next_url: None,
                    value: merged,
                })
            }
        }
    }
}

/// Joins the one-element values of a paginated list property.
fn concat(property_type: &str, items: &[PropertyItem]) -> Result<PropertyValue, AppError> {
    let mut runs = Vec::new();
    let mut users = Vec::new();
    let mut refs = Vec::new();
    for item in items {
        match &item.value {
            PropertyValue::Title(r) | PropertyValue::RichText(r) => runs.extend(r.iter().cloned()),
            PropertyValue::People(u) => users.extend(u.iter().cloned()),
            PropertyValue::Relation(r) => refs.extend(r.iter().cloned()),
            other => {
                return Err(AppError::UnexpectedObject {
                    expected: "list-valued property item",
                    found: other.property_type().to_string(),
                })
            }
        }
    }

    match property_type {
        "title" => Ok(PropertyValue::Title(runs)),
        "rich_text" => Ok(PropertyValue::RichText(runs)),
        "people" => Ok(PropertyValue::People(users)),
        "relation" => Ok(PropertyValue::Relation(refs)),
        other => Err(AppError::UnexpectedObject {
            expected: "list-valued property",
            found: other.to_string(),
        }),
    }
}

/// What the first response of a property read says to do next.
pub enum PropertyStart {
    Done(FetchedProperty),
    Paginated {
        drain: PropertyDrain,
        cursor: Option<String>,
    },
}

/// Interprets the first response of a property read.
pub fn start_property(
    property_id: &str,
    object: Option<TaggedObject>,
) -> Result<PropertyStart, AppError> {
    match object {
        None => Ok(PropertyStart::Done(FetchedProperty::Unsupported)),
        Some(TaggedObject::PropertyItem(item)) => Ok(PropertyStart::Done(FetchedProperty::Item(item))),
        Some(list @ TaggedObject::List(_)) => {
            let envelope = PropertyItem::from_object(list)?;
            let cursor = envelope.next_cursor.clone();
            let mut drain = PropertyDrain::new(property_id);
            drain.push(envelope);
            Ok(PropertyStart::Paginated { drain, cursor })
        }
        Some(other) => Err(AppError::UnexpectedObject {
            expected: "property_item",
            found: other.object_kind().to_string(),
        }),
    }
}

/// Collects the pages of a property read. Rollups go through a
/// `RollupDrain`; other list properties keep their items.
#[derive(Debug, Clone)]
pub struct PropertyDrain {
    property_id: String,
    state: DrainState,
}

#[derive(Debug, Clone)]
enum DrainState {
    Pending,
    Rollup(RollupDrain),
    List {
        property_type: String,
        items: Vec<PropertyItem>,
    },
}

impl PropertyDrain {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            state: DrainState::Pending,
        }
    }
}

impl Drain for PropertyDrain {
    type Output = FetchedProperty;

    fn push(&mut self, envelope: Envelope<PropertyItem>) {
        if let DrainState::Pending = self.state {
            let property_type = envelope
                .property_item
                .as_ref()
                .map(|summary| summary.property_type.clone())
                .or_else(|| envelope.results.first().map(|item| item.property_type().to_string()));
            self.state = match property_type.as_deref() {
                Some("rollup") => DrainState::Rollup(RollupDrain::new(self.property_id.clone())),
                Some(other) => DrainState::List {
                    property_type: other.to_string(),
                    items: Vec::new(),
                },
                None => DrainState::Pending,
            };
        }

        match &mut self.state {
            DrainState::Rollup(drain) => drain.push(envelope),
            DrainState::List { items, .. } => items.extend(envelope.results),
            DrainState::Pending => {}
        }
    }

    fn finish(self) -> Result<FetchedProperty, AppError> {
        match self.state {
            DrainState::Rollup(drain) => Ok(FetchedProperty::Rollup(drain.finish()?)),
            DrainState::List {
                property_type,
                items,
            } => Ok(FetchedProperty::List {
                property_id: self.property_id,
                property_type,
                items,
            }),
            DrainState::Pending => Err(AppError::MalformedResponse(format!(
                "Property '{}' list carried neither a type nor any items",
                self.property_id
            ))),
        }
    }
}

/// Converts `input` for the property `key` of `page`.
pub fn resolve_write(
    page: &Page,
    key: &str,
    input: PropertyInput,
) -> Result<(String, PropertyValue), AppError> {
    let (name, property) = page
        .property(key)
        .ok_or_else(|| AppError::UnknownProperty(key.to_string()))?;
    let value = from_plain(&property.property_type, input)?;
    Ok((name.to_string(), value))
}

fn properties_body(values: &[(String, PropertyValue)]) -> Result<Map<String, Value>, AppError> {
    let mut properties = Map::new();
    for (name, value) in values {
        properties.insert(name.clone(), to_wire(value)?);
    }
    Ok(properties)
}

/// PATCH `pages/{id}` with new property values.
pub fn update_request(
    page_id: &PageId,
    values: &[(String, PropertyValue)],
) -> Result<ApiRequest, AppError> {
    let properties = properties_body(values)?;
    Ok(ApiRequest::patch(
        format!("pages/{}", page_id),
        json!({ "properties": properties }),
    ))
}

pub fn archive_request(page_id: &PageId, archived: bool) -> ApiRequest {
    ApiRequest::patch(format!("pages/{}", page_id), json!({ "archived": archived }))
}

/// Converts each input against the database's column configuration.
pub fn resolve_create<K, I>(
    database: &Database,
    inputs: impl IntoIterator<Item = (K, I)>,
) -> Result<Vec<(String, PropertyValue)>, AppError>
where
    K: AsRef<str>,
    I: Into<PropertyInput>,
{
    inputs
        .into_iter()
        .map(|(key, input)| {
            let key = key.as_ref();
            let (name, configuration) = database
                .property(key)
                .ok_or_else(|| AppError::UnknownProperty(key.to_string()))?;
            let value = from_plain(configuration.config_type(), input.into())?;
            Ok((name.to_string(), value))
        })
        .collect()
}

/// POST `pages` with a database parent.
pub fn create_request(
    database_id: &DatabaseId,
    values: &[(String, PropertyValue)],
    cover_url: Option<&str>,
) -> Result<ApiRequest, AppError> {
    let mut body = Map::new();
    body.insert("parent".to_string(), json!({ "database_id": database_id }));
    body.insert("properties".to_string(), Value::Object(properties_body(values)?));
    if let Some(url) = cover_url {
        let url = ValidatedUrl::parse(url)?;
        body.insert(
            "cover".to_string(),
            json!({"type": "external", "external": {"url": url.as_str()}}),
        );
    }
    Ok(ApiRequest::post("pages", Value::Object(body)))
}

/// POST the query endpoint of a database.
pub fn query_list(database_id: &DatabaseId, body: Value) -> ListRequest {
    ListRequest::post(format!("databases/{}/query", database_id), body)
}

/// PATCH `blocks/{id}/children` with new blocks.
pub fn append_request(parent_id: &str, blocks: &[Block]) -> Result<ApiRequest, AppError> {
    let children = blocks
        .iter()
        .map(Block::to_wire)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiRequest::patch(
        format!("blocks/{}/children", parent_id),
        json!({ "children": children }),
    ))
}

/// PATCH `blocks/{id}` with the block's content.
pub fn block_update_request(block_id: &BlockId, block: &Block) -> Result<ApiRequest, AppError> {
    let mut body = Map::new();
    body.insert(block.block_type().to_string(), block.payload()?);
    Ok(ApiRequest::patch(format!("blocks/{}", block_id), Value::Object(body)))
}

/// The blocks created by an append call.
pub fn appended_blocks(object: Option<TaggedObject>) -> Result<Vec<Block>, AppError> {
    match object {
        Some(object) => Ok(Block::from_object(object)?.results),
        None => Ok(Vec::new()),
    }
}

/// Expects a page back, e.g. from a write.
pub fn expect_page(object: Option<TaggedObject>) -> Result<Page, AppError> {
    expect(object, "page")?.into_page()
}

pub fn expect_database(object: Option<TaggedObject>) -> Result<Database, AppError> {
    expect(object, "database")?.into_database()
}

pub fn expect_block(object: Option<TaggedObject>) -> Result<Block, AppError> {
    expect(object, "block")?.into_block()
}

pub fn expect_user(object: Option<TaggedObject>) -> Result<crate::types::User, AppError> {
    expect(object, "user")?.into_user()
}

fn expect(object: Option<TaggedObject>, expected: &'static str) -> Result<TaggedObject, AppError> {
    object.ok_or_else(|| AppError::UnexpectedObject {
        expected,
        found: "unsupported object".to_string(),
    })
}

/// Which properties `properties()` includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyFilter {
    pub include_relations: bool,
    pub relations_only: bool,
}

impl PropertyFilter {
    pub fn admits(&self, property_type: &str) -> bool {
        let relation = property_type == "relation";
        if self.relations_only {
            relation
        } else {
            self.include_relations || !relation
        }
    }
}

/// Page property names selected by `filter`, in page order.
pub fn selected_properties(page: &Page, filter: PropertyFilter) -> Vec<String> {
    page.properties
        .iter()
        .filter(|(_, property)| filter.admits(&property.property_type))
        .map(|(name, _)| name.clone())
        .collect()
}

/// Result map of `properties()`.
pub type PropertyMap = IndexMap<String, SimpleValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyItemSummary;
    use serde_json::json;

    const PAGE: &str = "b55c9c91-384d-452b-81db-d1ef79372b75";

    fn page() -> Page {
        Page::from_wire(&json!({
            "object": "page",
            "id": PAGE,
            "parent": {"type": "database_id", "database_id": "d9824bdc-8445-4327-be8b-5b47500af6ce"},
            "properties": {
                "Name": {"id": "title", "type": "title", "title": [{"type": "text", "text": {"content": "Task"}, "plain_text": "Task"}]},
                "Status": {"id": "st%3A", "type": "status", "status": {"name": "Todo"}},
                "Score": {"id": "f1", "type": "formula", "formula": {"type": "number", "number": 3}},
                "Owners": {"id": "ppl", "type": "people", "people": [], "has_more": true},
                "Links": {"id": "rel", "type": "relation", "relation": [], "has_more": false},
                "Go": {"id": "btn", "type": "button", "button": {}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_plain_values_are_served_from_cache() {
        let page = page();
        assert_eq!(
            plan_get(&page, "Status", GetOptions::default()).unwrap(),
            PropertyFetch::Embedded(SimpleValue::Text("Todo".to_string()))
        );
        assert_eq!(
            plan_get(&page, "st%3A", GetOptions::fresh()).unwrap(),
            PropertyFetch::Remote {
                name: "Status".to_string(),
                property_id: "st%3A".to_string()
            }
        );
    }

    #[test]
    fn test_formulas_refetch_unless_safety_off() {
        let page = page();
        assert!(matches!(
            plan_get(&page, "Score", GetOptions::default()).unwrap(),
            PropertyFetch::Remote { .. }
        ));
        assert_eq!(
            plan_get(&page, "Score", GetOptions::default().with_safety_off()).unwrap(),
            PropertyFetch::Embedded(SimpleValue::Number(3.0))
        );
    }

    #[test]
    fn test_truncated_lists_are_fetched() {
        let page = page();
        assert!(matches!(
            plan_get(&page, "Owners", GetOptions::default()).unwrap(),
            PropertyFetch::Remote { .. }
        ));
        assert!(matches!(
            plan_get(&page, "Go", GetOptions::default()).unwrap(),
            PropertyFetch::Embedded(SimpleValue::Null)
        ));
        assert!(matches!(
            plan_get(&page, "Nope", GetOptions::default()),
            Err(AppError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_update_body() {
        let page = page();
        let write = resolve_write(&page, "Status", "Done".into()).unwrap();
        let request = update_request(&page.id, &[write]).unwrap();
        assert_eq!(request.endpoint, format!("pages/{}", PAGE));
        assert_eq!(
            request.body,
            Some(json!({"properties": {"Status": {"status": {"name": "Done"}}}}))
        );
    }

    #[test]
    fn test_property_selection() {
        let page = page();
        let relations = PropertyFilter {
            include_relations: false,
            relations_only: true,
        };
        assert_eq!(selected_properties(&page, relations), vec!["Links".to_string()]);
        assert!(!selected_properties(&page, PropertyFilter::default()).contains(&"Links".to_string()));
    }

    #[test]
    fn test_paginated_title_is_joined() {
        let mut drain = PropertyDrain::new("title");
        for (text, more) in [("Hello ", true), ("world", false)] {
            let item = crate::model::decode::<PropertyItem>(&json!({
                "object": "property_item", "id": "title", "type": "title",
                "title": {"type": "text", "text": {"content": text}, "plain_text": text}
            }))
            .unwrap()
            .unwrap();
            drain.push(Envelope {
                results: vec![item],
                has_more: more,
                next_cursor: more.then(|| "c".to_string()),
                property_item: Some(PropertyItemSummary {
                    id: Some("title".to_string()),
                    property_type: "title".to_string(),
                    next_url: None,
                    rollup: None,
                }),
            });
        }
        assert_eq!(drain.finish().unwrap().read().unwrap(), "Hello world");
    }

    #[test]
    fn test_append_body_uses_block_write_shape() {
        let request = append_request("parent", &[Block::paragraph("hi")]).unwrap();
        let children = &request.body.unwrap()["children"];
        assert_eq!(children[0]["type"], "paragraph");
        assert_eq!(children[0]["paragraph"]["rich_text"][0]["text"]["content"], "hi");
    }
}
