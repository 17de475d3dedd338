// src/api/mod.rs
//! Notion API interaction.
//!
//! Layered bottom-up: `transport` moves bytes and retries transient
//! failures, `request` turns endpoint calls into HTTP requests and decodes
//! the answers, `operations` holds the I/O-free logic of every high-level
//! call, and the `client`, `page`, `database` and `block` wrappers wire the
//! two together for async and blocking callers.

pub mod block;
pub mod client;
pub mod database;
pub mod http;
pub mod operations;
pub mod page;
pub mod request;
pub mod transport;

pub use block::{BlockingBlock, NotionBlock};
pub use client::{BlockingNotionApi, NotionApi};
pub use database::{BlockingDatabase, NotionDatabase};
pub use http::{ReqwestBlockingTransport, ReqwestTransport};
pub use operations::{FetchedProperty, GetOptions, PropertyFilter, PropertyMap};
pub use page::{BlockingPage, NotionPage};
pub use request::ApiRequest;
pub use transport::{
    BlockingTransport, HttpRequest, Method, RawResponse, RetryStrategy, Transport, TransportError,
};
