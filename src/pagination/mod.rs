// src/pagination/mod.rs
//! Cursor pagination with adaptive page size.
//!
//! `CursorState` is the whole algorithm: which cursor and page size to ask
//! for next, how an envelope moves the cursor, and how an exhausted
//! transport failure shrinks the page size. The blocking iterator and the
//! async stream are thin loops around it, each driven by an executor that
//! turns an `ApiRequest` into a decoded object.

mod blocking;
pub mod rollup;
mod stream;

pub use blocking::{BlockingItems, BlockingPages};
pub use rollup::{resolve_rollup, Drain, RollupDrain};
pub use stream::{items, pages};

use crate::api::request::ApiRequest;
use crate::api::transport::Method;
use crate::error::AppError;
use crate::model::{Envelope, ListItem, TaggedObject};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Sends one request and decodes the response, from async code.
#[async_trait]
pub trait RequestExecutor: Clone + Send + Sync + 'static {
    async fn execute(&self, request: ApiRequest) -> Result<Option<TaggedObject>, AppError>;
}

/// Sends one request and decodes the response, blocking the caller.
pub trait BlockingRequestExecutor {
    fn execute(&self, request: ApiRequest) -> Result<Option<TaggedObject>, AppError>;
}

/// What to ask for on the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<String>,
    pub page_size: u32,
}

/// Cursor, remaining-pages flag, and current page size of one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorState {
    cursor: Option<String>,
    has_more: bool,
    page_size: u32,
}

impl CursorState {
    pub fn new(page_size: u32) -> Self {
        Self {
            cursor: None,
            has_more: true,
            page_size,
        }
    }

    /// Continues after an envelope that was fetched outside the iterator.
    pub fn resume(cursor: Option<String>, page_size: u32) -> Self {
        Self {
            has_more: cursor.is_some(),
            cursor,
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        !self.has_more
    }

    /// `None` once the last page has been seen or an error was propagated.
    pub fn next_request(&self) -> Option<PageRequest> {
        self.has_more.then(|| self.current())
    }

    fn current(&self) -> PageRequest {
        PageRequest {
            cursor: self.cursor.clone(),
            page_size: self.page_size,
        }
    }

    pub fn advance<T>(&mut self, envelope: &Envelope<T>) {
        self.has_more = envelope.has_more;
        self.cursor = envelope.next_cursor.clone();
    }

    /// Answers a failed fetch. Returns `Ok` when the same cursor should be
    /// retried at the new, halved page size; otherwise finishes the state
    /// and hands the error back.
    pub fn shrink(&mut self, err: AppError) -> Result<(), AppError> {
        if !err.is_exhausted_transient() {
            self.has_more = false;
            return Err(err);
        }

        let halved = self.page_size / 2;
        if halved == 0 {
            log::error!("Page size cannot shrink below 1, giving up: {}", err);
            self.has_more = false;
            return Err(err);
        }

        log::warn!(
            "Fetch failed at page size {} ({}), retrying at {}",
            self.page_size,
            err,
            halved
        );
        self.page_size = halved;
        Ok(())
    }
}

/// Sends the first call of a list endpoint that may answer with a single
/// object instead of an envelope. Halves `state`'s page size like the
/// iterators do; on success the caller resumes from the response.
pub async fn first_page<E: RequestExecutor>(
    executor: &E,
    list: &ListRequest,
    state: &mut CursorState,
) -> Result<Option<TaggedObject>, AppError> {
    loop {
        match executor.execute(list.request(&state.current())).await {
            Ok(object) => return Ok(object),
            Err(err) => state.shrink(err)?,
        }
    }
}

/// Blocking form of [`first_page`].
pub fn first_page_blocking<E: BlockingRequestExecutor>(
    executor: &E,
    list: &ListRequest,
    state: &mut CursorState,
) -> Result<Option<TaggedObject>, AppError> {
    loop {
        match executor.execute(list.request(&state.current())) {
            Ok(object) => return Ok(object),
            Err(err) => state.shrink(err)?,
        }
    }
}

/// One list endpoint, able to build the request for any page of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    method: Method,
    endpoint: String,
    query: Vec<(String, String)>,
    body: Map<String, Value>,
}

impl ListRequest {
    /// A list endpoint paged through query parameters.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: Map::new(),
        }
    }

    /// A list endpoint paged through the JSON body, e.g. database queries.
    /// Anything other than an object in `body` is ignored.
    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        let body = match body {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// A fresh request for one page. The base query and body are copied,
    /// never modified.
    pub fn request(&self, page: &PageRequest) -> ApiRequest {
        match self.method {
            Method::Post | Method::Patch => {
                let mut body = self.body.clone();
                if let Some(cursor) = &page.cursor {
                    body.insert("start_cursor".to_string(), Value::from(cursor.as_str()));
                }
                body.insert("page_size".to_string(), Value::from(page.page_size));
                ApiRequest {
                    method: self.method,
                    endpoint: self.endpoint.clone(),
                    query: self.query.clone(),
                    body: Some(Value::Object(body)),
                }
            }
            Method::Get => {
                let mut request = ApiRequest::get(self.endpoint.clone());
                request.query = self.query.clone();
                if let Some(cursor) = &page.cursor {
                    request = request.with_query("start_cursor", cursor);
                }
                request.with_query("page_size", page.page_size)
            }
        }
    }
}

/// Recovers the typed envelope from a list response.
pub(crate) fn into_envelope<T: ListItem>(
    object: Option<TaggedObject>,
) -> Result<Envelope<T>, AppError> {
    match object {
        Some(object) => T::from_object(object),
        None => Err(AppError::UnexpectedObject {
            expected: T::LIST_KIND,
            found: "unsupported object".to_string(),
        }),
    }
}
