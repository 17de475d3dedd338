// src/api/database.rs
//! Database wrappers: schema access, queries and page creation.

use super::client::{BlockingNotionApi, NotionApi};
use super::operations::{
    create_request, database_request, expect_database, expect_page, query_list, resolve_create,
};
use super::page::{BlockingPage, NotionPage};
use crate::codec::PropertyInput;
use crate::error::AppError;
use crate::model::{Database, Page, PropertyConfiguration, RelationConfiguration};
use crate::pagination::BlockingItems;
use crate::query::QueryRequest;
use crate::types::DatabaseId;
use futures::stream::{BoxStream, StreamExt};

/// A database driven from async code.
#[derive(Clone)]
pub struct NotionDatabase {
    api: NotionApi,
    database: Database,
}

impl NotionDatabase {
    pub async fn load(api: &NotionApi, id: &DatabaseId) -> Result<Self, AppError> {
        let database = expect_database(api.request(database_request(id)).await?)?;
        Ok(Self {
            api: api.clone(),
            database,
        })
    }

    pub fn id(&self) -> &DatabaseId {
        &self.database.id
    }

    pub fn object(&self) -> &Database {
        &self.database
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.database = expect_database(self.api.request(database_request(&self.database.id)).await?)?;
        Ok(())
    }

    pub fn title(&self) -> String {
        self.database.title_text()
    }

    /// Column configurations in schema order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyConfiguration)> {
        self.database.properties.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// Looks a column up by name or id.
    pub fn property(&self, key: &str) -> Option<(&str, &PropertyConfiguration)> {
        self.database.property(key)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationConfiguration)> {
        self.database.relations()
    }

    /// Pages matching `query`, fetched lazily.
    pub fn query(&self, query: &QueryRequest) -> BoxStream<'static, Result<NotionPage, AppError>> {
        let api = self.api.clone();
        self.api
            .items::<Page>(query_list(&self.database.id, query.to_body()))
            .map(move |page| page.map(|page| NotionPage::from_page(api.clone(), page)))
            .boxed()
    }

    /// Creates a page in this database. Keys are column names or ids.
    pub async fn create_page<K, I>(
        &self,
        inputs: impl IntoIterator<Item = (K, I)>,
        cover_url: Option<&str>,
    ) -> Result<NotionPage, AppError>
    where
        K: AsRef<str>,
        I: Into<PropertyInput>,
    {
        let values = resolve_create(&self.database, inputs)?;
        let request = create_request(&self.database.id, &values, cover_url)?;
        let page = expect_page(self.api.request(request).await?)?;
        log::debug!("Created page {} in database {}", page.id, self.database.id);
        Ok(NotionPage::from_page(self.api.clone(), page))
    }
}

/// A database driven from blocking code.
#[derive(Clone)]
pub struct BlockingDatabase {
    api: BlockingNotionApi,
    database: Database,
}

impl BlockingDatabase {
    pub fn load(api: &BlockingNotionApi, id: &DatabaseId) -> Result<Self, AppError> {
        let database = expect_database(api.request(database_request(id))?)?;
        Ok(Self {
            api: api.clone(),
            database,
        })
    }

    pub fn id(&self) -> &DatabaseId {
        &self.database.id
    }

    pub fn object(&self) -> &Database {
        &self.database
    }

    pub fn reload(&mut self) -> Result<(), AppError> {
        self.database = expect_database(self.api.request(database_request(&self.database.id))?)?;
        Ok(())
    }

    pub fn title(&self) -> String {
        self.database.title_text()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyConfiguration)> {
        self.database.properties.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn property(&self, key: &str) -> Option<(&str, &PropertyConfiguration)> {
        self.database.property(key)
    }

    pub fn relations(&self) -> impl Iterator<Item = (&str, &RelationConfiguration)> {
        self.database.relations()
    }

    pub fn query(
        &self,
        query: &QueryRequest,
    ) -> impl Iterator<Item = Result<BlockingPage, AppError>> {
        let api = self.api.clone();
        let pages: BlockingItems<Page, BlockingNotionApi> =
            self.api.items(query_list(&self.database.id, query.to_body()));
        pages.map(move |page| page.map(|page| BlockingPage::from_page(api.clone(), page)))
    }

    pub fn create_page<K, I>(
        &self,
        inputs: impl IntoIterator<Item = (K, I)>,
        cover_url: Option<&str>,
    ) -> Result<BlockingPage, AppError>
    where
        K: AsRef<str>,
        I: Into<PropertyInput>,
    {
        let values = resolve_create(&self.database, inputs)?;
        let request = create_request(&self.database.id, &values, cover_url)?;
        let page = expect_page(self.api.request(request)?)?;
        log::debug!("Created page {} in database {}", page.id, self.database.id);
        Ok(BlockingPage::from_page(self.api.clone(), page))
    }
}
