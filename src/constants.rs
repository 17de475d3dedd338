// src/constants.rs
//! Domain constants that define the operational boundaries of the client.
//!
//! Each constant is named for the API concept it constrains. Reading these
//! should tell you how the client talks to Notion: which version, how much
//! it asks for per call, and how patiently it retries.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// The API version sent in the `Notion-Version` header.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// Base URL every endpoint path is resolved against. The trailing slash
/// matters: without it `Url::join` would drop the `v1` segment.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1/";

/// Page size requested from list endpoints unless configured otherwise.
///
/// Kept small so that a single page rarely trips the server's time budget;
/// the pagination iterator halves it further on repeated failures.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// The largest `page_size` the Notion API accepts.
pub const NOTION_API_MAX_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Retry budget (per request, owned by the transport)
// ---------------------------------------------------------------------------

/// Retries after the first attempt before the transport gives up.
pub const RETRY_TOTAL: u32 = 3;

/// Base delay in seconds, doubled on each further attempt.
pub const RETRY_BACKOFF_FACTOR_SECS: f64 = 1.0;

/// Upper bound on a single backoff delay.
pub const RETRY_MAX_BACKOFF_SECS: u64 = 30;

/// HTTP statuses worth retrying: rate limiting and server-side failures.
pub const RETRY_STATUS_FORCELIST: [u16; 5] = [429, 500, 502, 503, 504];

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing response bodies and payloads
/// in error messages.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 500;
