// src/api/page.rs
//! Page wrappers: a loaded page plus the client that loaded it.
//!
//! Writes never patch the held page in place. The response to every write
//! is a full page object, and it replaces the old one.

use super::client::{BlockingNotionApi, NotionApi};
use super::operations::{
    append_request, appended_blocks, archive_request, children_list, expect_page, page_request,
    plan_get, property_list, resolve_write, selected_properties, start_property,
    update_request, FetchedProperty, GetOptions, PropertyFetch, PropertyFilter, PropertyMap,
    PropertyStart,
};
use crate::codec::{PropertyInput, SimpleValue};
use crate::error::AppError;
use crate::model::{Block, Page, PropertyItem, PropertyValue};
use crate::pagination::rollup::{drain_blocking, drain_stream};
use crate::pagination::{self, BlockingItems, CursorState};
use crate::types::{DatabaseId, PageId};
use futures::stream::BoxStream;

/// A page driven from async code.
#[derive(Clone)]
pub struct NotionPage {
    api: NotionApi,
    page: Page,
}

impl NotionPage {
    pub async fn load(api: &NotionApi, id: &PageId) -> Result<Self, AppError> {
        let page = expect_page(api.request(page_request(id)).await?)?;
        Ok(Self::from_page(api.clone(), page))
    }

    pub fn from_page(api: NotionApi, page: Page) -> Self {
        Self { api, page }
    }

    pub fn id(&self) -> &PageId {
        &self.page.id
    }

    /// The page object as last loaded or written.
    pub fn object(&self) -> &Page {
        &self.page
    }

    pub fn parent_database_id(&self) -> Option<&DatabaseId> {
        self.page.database_id()
    }

    pub fn title(&self) -> String {
        self.page.title()
    }

    pub fn is_alive(&self) -> bool {
        !self.page.archived
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.page = expect_page(self.api.request(page_request(&self.page.id)).await?)?;
        Ok(())
    }

    /// Reads a property by name or id.
    pub async fn get(&self, key: &str, options: GetOptions) -> Result<SimpleValue, AppError> {
        match plan_get(&self.page, key, options)? {
            PropertyFetch::Embedded(value) => Ok(value),
            PropertyFetch::Remote { property_id, .. } => self.fetch(&property_id).await?.read(),
        }
    }

    /// Fetches a property from the properties endpoint, without reducing it.
    pub async fn get_item(&self, key: &str) -> Result<FetchedProperty, AppError> {
        match plan_get(&self.page, key, GetOptions::fresh())? {
            PropertyFetch::Remote { property_id, .. } => self.fetch(&property_id).await,
            PropertyFetch::Embedded(_) => Err(AppError::UnknownProperty(key.to_string())),
        }
    }

    async fn fetch(&self, property_id: &str) -> Result<FetchedProperty, AppError> {
        let list = property_list(&self.page.id, property_id);
        let mut state = CursorState::new(self.api.page_size());
        let first = pagination::first_page(&self.api, &list, &mut state).await?;

        match start_property(property_id, first)? {
            PropertyStart::Done(fetched) => Ok(fetched),
            PropertyStart::Paginated { drain, cursor } => {
                let rest = pagination::pages::<PropertyItem, _>(
                    self.api.clone(),
                    list,
                    CursorState::resume(cursor, state.page_size()),
                );
                drain_stream(drain, rest).await
            }
        }
    }

    pub async fn set(&mut self, key: &str, input: impl Into<PropertyInput>) -> Result<(), AppError> {
        self.update([(key, input)]).await
    }

    /// Writes several properties in one call.
    pub async fn update<K, I>(&mut self, inputs: impl IntoIterator<Item = (K, I)>) -> Result<(), AppError>
    where
        K: AsRef<str>,
        I: Into<PropertyInput>,
    {
        let values = resolve_all(&self.page, inputs)?;
        let request = update_request(&self.page.id, &values)?;
        self.page = expect_page(self.api.request(request).await?)?;
        Ok(())
    }

    pub async fn archive(&mut self) -> Result<(), AppError> {
        self.set_archived(true).await
    }

    pub async fn unarchive(&mut self) -> Result<(), AppError> {
        self.set_archived(false).await
    }

    async fn set_archived(&mut self, archived: bool) -> Result<(), AppError> {
        let request = archive_request(&self.page.id, archived);
        self.page = expect_page(self.api.request(request).await?)?;
        Ok(())
    }

    /// Reads every property admitted by `filter`, in page order.
    pub async fn properties(
        &self,
        filter: PropertyFilter,
        options: GetOptions,
    ) -> Result<PropertyMap, AppError> {
        let mut values = PropertyMap::new();
        for name in selected_properties(&self.page, filter) {
            let value = self.get(&name, options).await?;
            values.insert(name, value);
        }
        Ok(values)
    }

    /// The page's child blocks.
    pub fn blocks(&self) -> BoxStream<'static, Result<Block, AppError>> {
        self.api.items(children_list(self.page.id.as_str()))
    }

    /// Appends blocks to the end of the page and returns them as created.
    pub async fn add_blocks(&self, blocks: &[Block]) -> Result<Vec<Block>, AppError> {
        let request = append_request(self.page.id.as_str(), blocks)?;
        appended_blocks(self.api.request(request).await?)
    }
}

/// A page driven from blocking code.
#[derive(Clone)]
pub struct BlockingPage {
    api: BlockingNotionApi,
    page: Page,
}

impl BlockingPage {
    pub fn load(api: &BlockingNotionApi, id: &PageId) -> Result<Self, AppError> {
        let page = expect_page(api.request(page_request(id))?)?;
        Ok(Self::from_page(api.clone(), page))
    }

    pub fn from_page(api: BlockingNotionApi, page: Page) -> Self {
        Self { api, page }
    }

    pub fn id(&self) -> &PageId {
        &self.page.id
    }

    pub fn object(&self) -> &Page {
        &self.page
    }

    pub fn parent_database_id(&self) -> Option<&DatabaseId> {
        self.page.database_id()
    }

    pub fn title(&self) -> String {
        self.page.title()
    }

    pub fn is_alive(&self) -> bool {
        !self.page.archived
    }

    pub fn reload(&mut self) -> Result<(), AppError> {
        self.page = expect_page(self.api.request(page_request(&self.page.id))?)?;
        Ok(())
    }

    pub fn get(&self, key: &str, options: GetOptions) -> Result<SimpleValue, AppError> {
        match plan_get(&self.page, key, options)? {
            PropertyFetch::Embedded(value) => Ok(value),
            PropertyFetch::Remote { property_id, .. } => self.fetch(&property_id)?.read(),
        }
    }

    pub fn get_item(&self, key: &str) -> Result<FetchedProperty, AppError> {
        match plan_get(&self.page, key, GetOptions::fresh())? {
            PropertyFetch::Remote { property_id, .. } => self.fetch(&property_id),
            PropertyFetch::Embedded(_) => Err(AppError::UnknownProperty(key.to_string())),
        }
    }

    fn fetch(&self, property_id: &str) -> Result<FetchedProperty, AppError> {
        let list = property_list(&self.page.id, property_id);
        let mut state = CursorState::new(self.api.page_size());
        let first = pagination::first_page_blocking(&self.api, &list, &mut state)?;

        match start_property(property_id, first)? {
            PropertyStart::Done(fetched) => Ok(fetched),
            PropertyStart::Paginated { drain, cursor } => {
                let rest = pagination::BlockingPages::<PropertyItem, _>::new(
                    self.api.clone(),
                    list,
                    CursorState::resume(cursor, state.page_size()),
                );
                drain_blocking(drain, rest)
            }
        }
    }

    pub fn set(&mut self, key: &str, input: impl Into<PropertyInput>) -> Result<(), AppError> {
        self.update([(key, input)])
    }

    pub fn update<K, I>(&mut self, inputs: impl IntoIterator<Item = (K, I)>) -> Result<(), AppError>
    where
        K: AsRef<str>,
        I: Into<PropertyInput>,
    {
        let values = resolve_all(&self.page, inputs)?;
        let request = update_request(&self.page.id, &values)?;
        self.page = expect_page(self.api.request(request)?)?;
        Ok(())
    }

    pub fn archive(&mut self) -> Result<(), AppError> {
        self.set_archived(true)
    }

    pub fn unarchive(&mut self) -> Result<(), AppError> {
        self.set_archived(false)
    }

    fn set_archived(&mut self, archived: bool) -> Result<(), AppError> {
        let request = archive_request(&self.page.id, archived);
        self.page = expect_page(self.api.request(request)?)?;
        Ok(())
    }

    pub fn properties(
        &self,
        filter: PropertyFilter,
        options: GetOptions,
    ) -> Result<PropertyMap, AppError> {
        let mut values = PropertyMap::new();
        for name in selected_properties(&self.page, filter) {
            let value = self.get(&name, options)?;
            values.insert(name, value);
        }
        Ok(values)
    }

    pub fn blocks(&self) -> BlockingItems<Block, BlockingNotionApi> {
        self.api.items(children_list(self.page.id.as_str()))
    }

    pub fn add_blocks(&self, blocks: &[Block]) -> Result<Vec<Block>, AppError> {
        let request = append_request(self.page.id.as_str(), blocks)?;
        appended_blocks(self.api.request(request)?)
    }
}

fn resolve_all<K, I>(
    page: &Page,
    inputs: impl IntoIterator<Item = (K, I)>,
) -> Result<Vec<(String, PropertyValue)>, AppError>
where
    K: AsRef<str>,
    I: Into<PropertyInput>,
{
    inputs
        .into_iter()
        .map(|(key, input)| resolve_write(page, key.as_ref(), input.into()))
        .collect()
}
