// src/api/client.rs
//! The API roots: authenticated handles that send requests and decode
//! responses.
//!
//! `NotionApi` and `BlockingNotionApi` are cheap to clone; clones share the
//! configuration and the transport. Everything above them (object
//! wrappers, pagination) talks to Notion only through `request`.

use super::block::{BlockingBlock, NotionBlock};
use super::database::{BlockingDatabase, NotionDatabase};
use super::http::{ReqwestBlockingTransport, ReqwestTransport};
use super::operations::{expect_user, me_request};
use super::page::{BlockingPage, NotionPage};
use super::request::{interpret, prepare, ApiRequest};
use super::transport::{BlockingTransport, Transport};
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::model::{Envelope, ListItem, TaggedObject};
use crate::pagination::{
    self, BlockingItems, BlockingPages, BlockingRequestExecutor, CursorState, ListRequest,
    RequestExecutor,
};
use crate::types::{BlockId, DatabaseId, PageId, User};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Async entry point to the Notion API.
#[derive(Clone)]
pub struct NotionApi {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl NotionApi {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    /// A client over the default reqwest transport.
    pub fn from_config(config: ClientConfig) -> Result<Self, AppError> {
        let transport = ReqwestTransport::new(config.retry.clone())?;
        Ok(Self::new(config, transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size.get()
    }

    /// Sends one request. `None` when the response is an object kind this
    /// client does not model.
    pub async fn request(&self, request: ApiRequest) -> Result<Option<TaggedObject>, AppError> {
        let http = prepare(&self.config, &request)?;
        let url = http.url.clone();
        let response = self.transport.send(http).await?;
        interpret(&url, response)
    }

    pub async fn page(&self, id: &PageId) -> Result<NotionPage, AppError> {
        NotionPage::load(self, id).await
    }

    pub async fn database(&self, id: &DatabaseId) -> Result<NotionDatabase, AppError> {
        NotionDatabase::load(self, id).await
    }

    pub async fn block(&self, id: &BlockId) -> Result<NotionBlock, AppError> {
        NotionBlock::load(self, id).await
    }

    /// The bot user behind the API key.
    pub async fn me(&self) -> Result<User, AppError> {
        expect_user(self.request(me_request()).await?)
    }

    /// Envelopes of any list endpoint at the configured page size.
    pub fn pages<T: ListItem>(
        &self,
        list: ListRequest,
    ) -> BoxStream<'static, Result<Envelope<T>, AppError>> {
        pagination::pages(self.clone(), list, CursorState::new(self.page_size()))
    }

    /// Results of any list endpoint at the configured page size.
    pub fn items<T: ListItem>(&self, list: ListRequest) -> BoxStream<'static, Result<T, AppError>> {
        pagination::items(self.clone(), list, CursorState::new(self.page_size()))
    }
}

#[async_trait]
impl RequestExecutor for NotionApi {
    async fn execute(&self, request: ApiRequest) -> Result<Option<TaggedObject>, AppError> {
        self.request(request).await
    }
}

/// Blocking entry point to the Notion API.
#[derive(Clone)]
pub struct BlockingNotionApi {
    config: Arc<ClientConfig>,
    transport: Arc<dyn BlockingTransport>,
}

impl BlockingNotionApi {
    pub fn new(config: ClientConfig, transport: impl BlockingTransport + 'static) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, AppError> {
        let transport = ReqwestBlockingTransport::new(config.retry.clone())?;
        Ok(Self::new(config, transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size.get()
    }

    pub fn request(&self, request: ApiRequest) -> Result<Option<TaggedObject>, AppError> {
        let http = prepare(&self.config, &request)?;
        let url = http.url.clone();
        let response = self.transport.send(http)?;
        interpret(&url, response)
    }

    pub fn page(&self, id: &PageId) -> Result<BlockingPage, AppError> {
        BlockingPage::load(self, id)
    }

    pub fn database(&self, id: &DatabaseId) -> Result<BlockingDatabase, AppError> {
        BlockingDatabase::load(self, id)
    }

    pub fn block(&self, id: &BlockId) -> Result<BlockingBlock, AppError> {
        BlockingBlock::load(self, id)
    }

    pub fn me(&self) -> Result<User, AppError> {
        expect_user(self.request(me_request())?)
    }

    pub fn pages<T: ListItem>(&self, list: ListRequest) -> BlockingPages<T, BlockingNotionApi> {
        BlockingPages::new(self.clone(), list, CursorState::new(self.page_size()))
    }

    pub fn items<T: ListItem>(&self, list: ListRequest) -> BlockingItems<T, BlockingNotionApi> {
        self.pages(list).items()
    }
}

impl BlockingRequestExecutor for BlockingNotionApi {
    fn execute(&self, request: ApiRequest) -> Result<Option<TaggedObject>, AppError> {
        self.request(request)
    }
}
