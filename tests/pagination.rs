// tests/pagination.rs
//! Cursor pagination and page-size halving, through both client flavors.

mod common;

use common::*;
use futures::{StreamExt, TryStreamExt};
use notion_typed::types::join_rich_text;
use notion_typed::{AppError, Block, ListRequest};
use pretty_assertions::assert_eq;

fn children() -> ListRequest {
    ListRequest::get(format!("blocks/{}/children", BLOCK_ID))
}

fn texts(blocks: &[Block]) -> Vec<String> {
    blocks
        .iter()
        .map(|block| join_rich_text(block.rich_text().unwrap_or_default()))
        .collect()
}

fn sent_page_sizes(transport: &ScriptedTransport) -> Vec<String> {
    transport
        .requests()
        .iter()
        .map(|request| request.query_param("page_size").unwrap_or("-").to_string())
        .collect()
}

fn sent_cursors(transport: &ScriptedTransport) -> Vec<Option<String>> {
    transport
        .requests()
        .iter()
        .map(|request| request.query_param("start_cursor").map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_items_span_pages_in_order() {
    let transport = ScriptedTransport::new();
    transport
        .reply(paragraph_page(1, 2, Some("c1")))
        .reply(paragraph_page(3, 2, Some("c2")))
        .reply(paragraph_page(5, 1, None));

    let api = async_api_with_page_size(&transport, 2);
    let blocks: Vec<Block> = api.items(children()).try_collect().await.unwrap();

    assert_eq!(texts(&blocks), vec!["p1", "p2", "p3", "p4", "p5"]);
    assert_eq!(
        sent_cursors(&transport),
        vec![None, Some("c1".to_string()), Some("c2".to_string())]
    );
    assert_eq!(sent_page_sizes(&transport), vec!["2", "2", "2"]);
}

#[tokio::test]
async fn test_empty_list_yields_nothing() {
    let transport = ScriptedTransport::new();
    transport.reply(list_json("block", vec![], None));

    let api = async_api(&transport);
    let blocks: Vec<Block> = api.items(children()).try_collect().await.unwrap();

    assert!(blocks.is_empty());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_transient_failures_halve_the_page_size() {
    let transport = ScriptedTransport::new();
    transport
        .reply(paragraph_page(1, 20, Some("c1")))
        .fail()
        .fail()
        .reply(paragraph_page(21, 5, None));

    let api = async_api(&transport);
    let blocks: Vec<Block> = api.items(children()).try_collect().await.unwrap();

    assert_eq!(blocks.len(), 25);
    assert_eq!(sent_page_sizes(&transport), vec!["20", "20", "10", "5"]);
    // The failed page is replayed from the same cursor.
    assert_eq!(
        sent_cursors(&transport)[1..].to_vec(),
        vec![Some("c1".to_string()); 3]
    );
}

#[tokio::test]
async fn test_failure_at_page_size_one_propagates_and_ends_the_stream() {
    let transport = ScriptedTransport::new();
    transport.fail().fail();

    let api = async_api_with_page_size(&transport, 2);
    let mut stream = api.items::<Block>(children());

    let first = stream.next().await.unwrap();
    assert!(matches!(first, Err(AppError::Transport(_))));
    assert!(stream.next().await.is_none());
    assert_eq!(sent_page_sizes(&transport), vec!["2", "1"]);
}

#[tokio::test]
async fn test_api_errors_are_not_retried_by_halving() {
    let transport = ScriptedTransport::new();
    transport.reply_status(404, not_found());

    let api = async_api(&transport);
    let mut stream = api.items::<Block>(children());

    match stream.next().await {
        Some(Err(AppError::RequestFailed { status, code, .. })) => {
            assert_eq!(status, 404);
            assert!(code.is_not_found());
        }
        other => panic!("expected a request failure, got {:?}", other),
    }
    assert!(stream.next().await.is_none());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_dropped_stream_sends_no_more_requests() {
    let transport = ScriptedTransport::new();
    transport
        .reply(paragraph_page(1, 2, Some("c1")))
        .reply(paragraph_page(3, 2, None));

    let api = async_api_with_page_size(&transport, 2);
    let first: Vec<Block> = api.items(children()).take(1).try_collect().await.unwrap();

    assert_eq!(texts(&first), vec!["p1"]);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.remaining(), 1);
}

#[test]
fn test_blocking_items_span_pages_and_halve() {
    let transport = ScriptedTransport::new();
    transport
        .reply(paragraph_page(1, 4, Some("c1")))
        .fail()
        .reply(paragraph_page(5, 2, None));

    let api = blocking_api_with_page_size(&transport, 4);
    let blocks = api
        .items::<Block>(children())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(texts(&blocks), vec!["p1", "p2", "p3", "p4", "p5", "p6"]);
    assert_eq!(sent_page_sizes(&transport), vec!["4", "4", "2"]);
}

#[test]
fn test_blocking_pages_are_fused_after_an_error() {
    let transport = ScriptedTransport::new();
    transport.fail();

    let api = blocking_api_with_page_size(&transport, 1);
    let mut pages = api.pages::<Block>(children());

    assert!(matches!(pages.next(), Some(Err(AppError::Transport(_)))));
    assert!(pages.next().is_none());
    assert!(pages.state().is_finished());
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_dropped_iterator_sends_no_more_requests() {
    let transport = ScriptedTransport::new();
    transport
        .reply(paragraph_page(1, 2, Some("c1")))
        .reply(paragraph_page(3, 2, None));

    let api = blocking_api_with_page_size(&transport, 2);
    let first = api
        .items::<Block>(children())
        .take(1)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(texts(&first), vec!["p1"]);
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.remaining(), 1);
}

#[tokio::test]
async fn test_post_lists_page_through_the_body() {
    let transport = ScriptedTransport::new();
    transport
        .reply(list_json("page", vec![task_page("Todo")], Some("c1")))
        .reply(list_json("page", vec![task_page("Done")], None));

    let api = async_api_with_page_size(&transport, 1);
    let list = ListRequest::post(
        format!("databases/{}/query", DATABASE_ID),
        serde_json::json!({"filter": {"property": "Done", "checkbox": {"equals": true}}}),
    );
    let pages: Vec<notion_typed::Page> = api.items(list).try_collect().await.unwrap();
    assert_eq!(pages.len(), 2);

    let bodies: Vec<_> = transport
        .requests()
        .iter()
        .map(|request| request.json_body().unwrap())
        .collect();
    assert_eq!(
        bodies[0],
        serde_json::json!({"filter": {"property": "Done", "checkbox": {"equals": true}}, "page_size": 1})
    );
    assert_eq!(bodies[1]["start_cursor"], "c1");
    assert_eq!(bodies[1]["filter"], bodies[0]["filter"]);
    assert!(transport.requests()[0].query_param("page_size").is_none());
}
