// src/lib.rs
//! notion-typed: a typed model layer over the Notion REST API.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `NotionErrorCode`, `ValidationError`
//! - **Configuration**: `ClientConfig`
//! - **Object model**: `TaggedObject`, `Page`, `Database`, `Block`, `PropertyItem`
//! - **Domain types**: `PageId`, `DatabaseId`, `BlockId`, `UserId`, `ApiKey`, etc.
//! - **Values**: `PropertyInput` for writes, `SimpleValue` for reads
//! - **API client**: `NotionApi`, `BlockingNotionApi` and the object wrappers
//! - **Pagination**: cursor streams and iterators with page-size halving
//! - **Queries**: `QueryRequest`, `Filter`, `Sort`

pub mod api;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod pagination;
pub mod query;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::ClientConfig;

// --- Object Model ---
pub use crate::model::{
    decode, Block, BlockKind, Database, Envelope, ListItem, Page, PropertyConfiguration,
    PropertyItem, PropertyValue, RollupValue, TaggedObject,
};

// --- Domain Types ---
pub use crate::types::{
    ApiKey, BlockId, DatabaseId, DateInstant, DateValue, FileReference, NotionId, PageId,
    PageSize, RichTextItem, SelectOption, User, UserId, ValidatedUrl,
};

// --- Values ---
pub use crate::codec::{PropertyInput, SimpleValue};

// --- API Client ---
pub use crate::api::{
    BlockingBlock, BlockingDatabase, BlockingNotionApi, BlockingPage, FetchedProperty,
    GetOptions, NotionApi, NotionBlock, NotionDatabase, NotionPage, PropertyFilter, RetryStrategy,
};

// --- Pagination ---
pub use crate::pagination::{resolve_rollup, BlockingItems, BlockingPages, CursorState, ListRequest};

// --- Queries ---
pub use crate::query::{Direction, Filter, Operator, PropertyCondition, QueryRequest, Sort, Timestamp};
