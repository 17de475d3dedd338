// src/api/block.rs
//! Block wrappers.

use super::client::{BlockingNotionApi, NotionApi};
use super::operations::{
    append_request, appended_blocks, block_request, block_update_request, children_list,
    expect_block,
};
use crate::error::AppError;
use crate::model::Block;
use crate::pagination::BlockingItems;
use crate::types::BlockId;
use futures::stream::BoxStream;

/// A block driven from async code.
#[derive(Clone)]
pub struct NotionBlock {
    api: NotionApi,
    id: BlockId,
    block: Block,
}

impl NotionBlock {
    pub async fn load(api: &NotionApi, id: &BlockId) -> Result<Self, AppError> {
        let block = expect_block(api.request(block_request(id)).await?)?;
        Ok(Self {
            api: api.clone(),
            id: id.clone(),
            block,
        })
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn object(&self) -> &Block {
        &self.block
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.block = expect_block(self.api.request(block_request(&self.id)).await?)?;
        Ok(())
    }

    pub fn children(&self) -> BoxStream<'static, Result<Block, AppError>> {
        self.api.items(children_list(self.id.as_str()))
    }

    pub async fn add_children(&self, blocks: &[Block]) -> Result<Vec<Block>, AppError> {
        let request = append_request(self.id.as_str(), blocks)?;
        appended_blocks(self.api.request(request).await?)
    }

    /// Replaces the block's content. The block type cannot change.
    pub async fn set(&mut self, block: &Block) -> Result<(), AppError> {
        check_same_type(&self.block, block)?;
        let request = block_update_request(&self.id, block)?;
        self.block = expect_block(self.api.request(request).await?)?;
        Ok(())
    }
}

/// A block driven from blocking code.
#[derive(Clone)]
pub struct BlockingBlock {
    api: BlockingNotionApi,
    id: BlockId,
    block: Block,
}

impl BlockingBlock {
    pub fn load(api: &BlockingNotionApi, id: &BlockId) -> Result<Self, AppError> {
        let block = expect_block(api.request(block_request(id))?)?;
        Ok(Self {
            api: api.clone(),
            id: id.clone(),
            block,
        })
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn object(&self) -> &Block {
        &self.block
    }

    pub fn reload(&mut self) -> Result<(), AppError> {
        self.block = expect_block(self.api.request(block_request(&self.id))?)?;
        Ok(())
    }

    pub fn children(&self) -> BlockingItems<Block, BlockingNotionApi> {
        self.api.items(children_list(self.id.as_str()))
    }

    pub fn add_children(&self, blocks: &[Block]) -> Result<Vec<Block>, AppError> {
        let request = append_request(self.id.as_str(), blocks)?;
        appended_blocks(self.api.request(request)?)
    }

    pub fn set(&mut self, block: &Block) -> Result<(), AppError> {
        check_same_type(&self.block, block)?;
        let request = block_update_request(&self.id, block)?;
        self.block = expect_block(self.api.request(request)?)?;
        Ok(())
    }
}

fn check_same_type(current: &Block, replacement: &Block) -> Result<(), AppError> {
    if current.block_type() == replacement.block_type() {
        return Ok(());
    }
    Err(AppError::ConfigurationMismatch {
        expected: current.block_type().to_string(),
        supplied: format!("a {} block", replacement.block_type()),
    })
}
