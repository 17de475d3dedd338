// tests/rollup.rs
//! Paginated rollups resolved through a page's properties endpoint.

mod common;

use common::*;
use notion_typed::api::FetchedProperty;
use notion_typed::types::PageId;
use notion_typed::{AppError, GetOptions, RollupValue, SimpleValue};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn incomplete() -> Value {
    json!({"type": "incomplete", "incomplete": {}, "function": "sum"})
}

fn page_id() -> PageId {
    PageId::parse(PAGE_ID).unwrap()
}

fn script_number_rollup(transport: &ScriptedTransport) {
    transport
        .reply(task_page("Todo"))
        .reply(property_list("rollup", "r1", vec![], Some("c1"), Some(incomplete())))
        .reply(property_list("rollup", "r1", vec![], Some("c2"), Some(incomplete())))
        .reply(property_list(
            "rollup",
            "r1",
            vec![],
            None,
            Some(json!({"type": "number", "number": 10, "function": "sum"})),
        ));
}

fn script_array_rollup(transport: &ScriptedTransport) {
    let number = |n: i64| property_item("number", "r1", json!(n));
    transport
        .reply(task_page("Todo"))
        .reply(property_list(
            "rollup",
            "r1",
            vec![number(1), number(2)],
            Some("c1"),
            Some(json!({"type": "array", "array": [], "function": "show_original"})),
        ))
        .reply(property_list(
            "rollup",
            "r1",
            vec![number(3)],
            None,
            Some(json!({"type": "array", "array": [], "function": "show_original"})),
        ));
}

#[tokio::test]
async fn test_number_rollup_waits_for_the_last_page() {
    let transport = ScriptedTransport::new();
    script_number_rollup(&transport);

    let page = async_api(&transport).page(&page_id()).await.unwrap();
    let total = page.get("Total", GetOptions::default()).await.unwrap();

    assert_eq!(total, SimpleValue::Number(10.0));
    assert_eq!(transport.remaining(), 0);

    let requests = transport.requests();
    assert!(requests[1].url.ends_with(&format!("pages/{}/properties/r1", PAGE_ID)));
    assert_eq!(requests[2].query_param("start_cursor"), Some("c1"));
    assert_eq!(requests[3].query_param("start_cursor"), Some("c2"));
}

fn script_rollup_after_failure(transport: &ScriptedTransport) {
    transport.reply(task_page("Todo")).fail().reply(property_list(
        "rollup",
        "r1",
        vec![],
        None,
        Some(json!({"type": "number", "number": 10, "function": "sum"})),
    ));
}

fn property_page_sizes(transport: &ScriptedTransport) -> Vec<Option<String>> {
    transport.requests()[1..]
        .iter()
        .map(|request| request.query_param("page_size").map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_first_rollup_page_is_retried_at_half_size() {
    let transport = ScriptedTransport::new();
    script_rollup_after_failure(&transport);

    let page = async_api(&transport).page(&page_id()).await.unwrap();
    let total = page.get("Total", GetOptions::default()).await.unwrap();

    assert_eq!(total, SimpleValue::Number(10.0));
    assert_eq!(transport.remaining(), 0);
    assert_eq!(
        property_page_sizes(&transport),
        vec![Some("20".to_string()), Some("10".to_string())]
    );
    assert!(transport.requests()[2].query_param("start_cursor").is_none());
}

#[tokio::test]
async fn test_array_rollup_keeps_every_item() {
    let transport = ScriptedTransport::new();
    script_array_rollup(&transport);

    let page = async_api(&transport).page(&page_id()).await.unwrap();
    let fetched = page.get_item("Total").await.unwrap();

    match &fetched {
        FetchedProperty::Rollup(RollupValue::Array(items)) => assert_eq!(items.len(), 3),
        other => panic!("expected an array rollup, got {:?}", other),
    }
    assert_eq!(
        fetched.read().unwrap(),
        SimpleValue::List(vec![
            SimpleValue::Number(1.0),
            SimpleValue::Number(2.0),
            SimpleValue::Number(3.0)
        ])
    );
}

#[tokio::test]
async fn test_rollup_still_incomplete_at_the_end_is_an_error() {
    let transport = ScriptedTransport::new();
    transport
        .reply(task_page("Todo"))
        .reply(property_list("rollup", "r1", vec![], None, Some(incomplete())));

    let page = async_api(&transport).page(&page_id()).await.unwrap();
    let err = page.get("Total", GetOptions::default()).await.unwrap_err();

    assert!(matches!(err, AppError::RollupIncomplete { ref property_id } if property_id == "r1"));
}

#[tokio::test]
async fn test_embedded_rollup_is_served_with_safety_off() {
    let transport = ScriptedTransport::new();
    transport.reply(task_page("Todo"));

    let page = async_api(&transport).page(&page_id()).await.unwrap();
    let total = page
        .get("Total", GetOptions::default().with_safety_off())
        .await
        .unwrap();

    assert_eq!(total, SimpleValue::Number(5.0));
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_blocking_number_rollup() {
    let transport = ScriptedTransport::new();
    script_number_rollup(&transport);

    let page = blocking_api(&transport).page(&page_id()).unwrap();
    assert_eq!(
        page.get("r1", GetOptions::default()).unwrap(),
        SimpleValue::Number(10.0)
    );
    assert_eq!(transport.remaining(), 0);
}

#[test]
fn test_blocking_first_rollup_page_is_retried_at_half_size() {
    let transport = ScriptedTransport::new();
    script_rollup_after_failure(&transport);

    let page = blocking_api(&transport).page(&page_id()).unwrap();
    assert_eq!(
        page.get("Total", GetOptions::default()).unwrap(),
        SimpleValue::Number(10.0)
    );
    assert_eq!(
        property_page_sizes(&transport),
        vec![Some("20".to_string()), Some("10".to_string())]
    );
}

#[test]
fn test_blocking_array_rollup() {
    let transport = ScriptedTransport::new();
    script_array_rollup(&transport);

    let page = blocking_api(&transport).page(&page_id()).unwrap();
    let value = page.get("Total", GetOptions::fresh()).unwrap();
    assert_eq!(value.as_list().map(<[SimpleValue]>::len), Some(3));
}
