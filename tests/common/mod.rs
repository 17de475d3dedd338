// tests/common/mod.rs
//! Scripted transports and wire fixtures shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use notion_typed::api::{
    BlockingTransport, HttpRequest, RawResponse, RetryStrategy, Transport, TransportError,
};
use notion_typed::{ApiKey, BlockingNotionApi, ClientConfig, NotionApi};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;

pub const API_KEY: &str = "secret_abcdefghijklmnopqrstuvwxyz";
pub const PAGE_ID: &str = "b55c9c91-384d-452b-81db-d1ef79372b75";
pub const DATABASE_ID: &str = "d9824bdc-8445-4327-be8b-5b47500af6ce";
pub const BLOCK_ID: &str = "c02fc1d3-db8b-45c5-a222-27595b15aea7";

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<RawResponse, TransportError>>,
    requests: Vec<HttpRequest>,
}

/// Answers requests from a queue of canned replies and records what was sent.
///
/// Clones share the same script, so a test keeps one handle and gives
/// another to the client.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, body: Value) -> &Self {
        self.reply_status(200, body)
    }

    pub fn reply_status(&self, status: u16, body: Value) -> &Self {
        let response = RawResponse::new(status, body.to_string().into_bytes());
        self.script.lock().replies.push_back(Ok(response));
        self
    }

    /// A failure that already used up the transport's retries.
    pub fn fail(&self) -> &Self {
        self.script
            .lock()
            .replies
            .push_back(Err(TransportError::RetriesExhausted {
                url: "scripted".to_string(),
                attempts: 4,
                status: Some(504),
            }));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.lock().requests.clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().replies.len()
    }

    fn answer(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let mut script = self.script.lock();
        let url = request.url.clone();
        script.requests.push(request);
        match script.replies.pop_front() {
            Some(reply) => reply,
            None => panic!("unscripted request to {}", url),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        self.answer(request)
    }
}

impl BlockingTransport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        self.answer(request)
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(ApiKey::new(API_KEY).unwrap())
        .unwrap()
        .with_retry(RetryStrategy::none())
}

pub fn async_api(transport: &ScriptedTransport) -> NotionApi {
    NotionApi::new(config(), transport.clone())
}

pub fn blocking_api(transport: &ScriptedTransport) -> BlockingNotionApi {
    BlockingNotionApi::new(config(), transport.clone())
}

pub fn async_api_with_page_size(transport: &ScriptedTransport, page_size: u32) -> NotionApi {
    NotionApi::new(config().with_page_size(page_size).unwrap(), transport.clone())
}

pub fn blocking_api_with_page_size(transport: &ScriptedTransport, page_size: u32) -> BlockingNotionApi {
    BlockingNotionApi::new(config().with_page_size(page_size).unwrap(), transport.clone())
}

// ---------------------------------------------------------------------------
// Wire fixtures
// ---------------------------------------------------------------------------

pub fn text_run(text: &str) -> Value {
    json!({"type": "text", "text": {"content": text}, "plain_text": text})
}

pub fn page_json(properties: Value) -> Value {
    json!({
        "object": "page",
        "id": PAGE_ID,
        "created_time": "2024-01-01T00:00:00.000Z",
        "last_edited_time": "2024-01-02T00:00:00.000Z",
        "archived": false,
        "parent": {"type": "database_id", "database_id": DATABASE_ID},
        "properties": properties
    })
}

/// A page with a row-like set of properties.
pub fn task_page(status: &str) -> Value {
    page_json(json!({
        "Name": {"id": "title", "type": "title", "title": [text_run("Write report")]},
        "Status": {"id": "st%3A", "type": "status", "status": {"name": status}},
        "Estimate": {"id": "est", "type": "number", "number": 3},
        "Score": {"id": "f1", "type": "formula", "formula": {"type": "number", "number": 1}},
        "Total": {"id": "r1", "type": "rollup", "rollup": {"type": "number", "number": 5, "function": "sum"}},
        "Notes": {"id": "nt", "type": "rich_text", "rich_text": [], "has_more": true},
        "Tasks": {"id": "rel", "type": "relation", "relation": [], "has_more": false}
    }))
}

pub fn database_json() -> Value {
    json!({
        "object": "database",
        "id": DATABASE_ID,
        "title": [text_run("Tasks")],
        "parent": {"type": "workspace", "workspace": true},
        "properties": {
            "Name": {"id": "title", "name": "Name", "type": "title", "title": {}},
            "Status": {"id": "st%3A", "name": "Status", "type": "status", "status": {"options": [], "groups": []}},
            "Estimate": {"id": "est", "name": "Estimate", "type": "number", "number": {"format": "number"}},
            "Done": {"id": "dn", "name": "Done", "type": "checkbox", "checkbox": {}}
        }
    })
}

pub fn list_json(list_type: &str, results: Vec<Value>, next_cursor: Option<&str>) -> Value {
    json!({
        "object": "list",
        "type": list_type,
        list_type: {},
        "results": results,
        "has_more": next_cursor.is_some(),
        "next_cursor": next_cursor
    })
}

pub fn paragraph_json(id: &str, text: &str) -> Value {
    json!({
        "object": "block",
        "id": id,
        "type": "paragraph",
        "has_children": false,
        "paragraph": {"rich_text": [text_run(text)]}
    })
}

/// A list of blocks whose ids and texts are numbered from `first`.
pub fn paragraph_page(first: usize, count: usize, next_cursor: Option<&str>) -> Value {
    let results = (first..first + count)
        .map(|n| paragraph_json(&format!("00000000-0000-0000-0000-{:012}", n), &format!("p{}", n)))
        .collect();
    list_json("block", results, next_cursor)
}

pub fn property_item(property_type: &str, id: &str, payload: Value) -> Value {
    json!({
        "object": "property_item",
        "id": id,
        "type": property_type,
        property_type: payload
    })
}

/// One page of a paginated property read.
pub fn property_list(
    property_type: &str,
    id: &str,
    results: Vec<Value>,
    next_cursor: Option<&str>,
    rollup: Option<Value>,
) -> Value {
    let mut summary = json!({"id": id, "type": property_type, "next_url": null});
    if let Some(rollup) = rollup {
        summary["rollup"] = rollup;
    }
    json!({
        "object": "list",
        "type": "property_item",
        "property_item": summary,
        "results": results,
        "has_more": next_cursor.is_some(),
        "next_cursor": next_cursor
    })
}

pub fn not_found() -> Value {
    json!({
        "object": "error",
        "status": 404,
        "code": "object_not_found",
        "message": "Could not find page."
    })
}
