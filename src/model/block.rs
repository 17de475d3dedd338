// src/model/block.rs
//! Blocks: one flat tagged union over block types.

use super::registry::{construct, construct_field, Discriminated, Registry};
use crate::error::AppError;
use crate::types::{BlockId, DatabaseId, FileSource, Icon, PageId, Parent, RichTextItem};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Block kinds the API may return that this client skips.
pub const UNSUPPORTED_BLOCK_TYPES: &[&str] = &["transcription"];

/// Macro to reduce boilerplate when a method needs every kind's name and payload.
macro_rules! match_all_kinds {
    ($self:expr, $name:ident, $payload:ident => $result:expr) => {
        match $self {
            BlockKind::Paragraph($payload) => { let $name = "paragraph"; $result }
            BlockKind::Heading1($payload) => { let $name = "heading_1"; $result }
            BlockKind::Heading2($payload) => { let $name = "heading_2"; $result }
            BlockKind::Heading3($payload) => { let $name = "heading_3"; $result }
            BlockKind::BulletedListItem($payload) => { let $name = "bulleted_list_item"; $result }
            BlockKind::NumberedListItem($payload) => { let $name = "numbered_list_item"; $result }
            BlockKind::Quote($payload) => { let $name = "quote"; $result }
            BlockKind::Toggle($payload) => { let $name = "toggle"; $result }
            BlockKind::Template($payload) => { let $name = "template"; $result }
            BlockKind::ToDo($payload) => { let $name = "to_do"; $result }
            BlockKind::Callout($payload) => { let $name = "callout"; $result }
            BlockKind::Code($payload) => { let $name = "code"; $result }
            BlockKind::Equation($payload) => { let $name = "equation"; $result }
            BlockKind::Image($payload) => { let $name = "image"; $result }
            BlockKind::Video($payload) => { let $name = "video"; $result }
            BlockKind::File($payload) => { let $name = "file"; $result }
            BlockKind::Pdf($payload) => { let $name = "pdf"; $result }
            BlockKind::Embed($payload) => { let $name = "embed"; $result }
            BlockKind::Bookmark($payload) => { let $name = "bookmark"; $result }
            BlockKind::LinkPreview($payload) => { let $name = "link_preview"; $result }
            BlockKind::Divider($payload) => { let $name = "divider"; $result }
            BlockKind::Breadcrumb($payload) => { let $name = "breadcrumb"; $result }
            BlockKind::TableOfContents($payload) => { let $name = "table_of_contents"; $result }
            BlockKind::ColumnList($payload) => { let $name = "column_list"; $result }
            BlockKind::Column($payload) => { let $name = "column"; $result }
            BlockKind::Table($payload) => { let $name = "table"; $result }
            BlockKind::TableRow($payload) => { let $name = "table_row"; $result }
            BlockKind::Synced($payload) => { let $name = "synced_block"; $result }
            BlockKind::LinkToPage($payload) => { let $name = "link_to_page"; $result }
            BlockKind::ChildPage($payload) => { let $name = "child_page"; $result }
            BlockKind::ChildDatabase($payload) => { let $name = "child_database"; $result }
            BlockKind::Unsupported($payload) => { let $name = "unsupported"; $result }
        }
    };
}

/// A block with its server-assigned metadata.
///
/// Blocks built locally for an append have no id; everything else the
/// server fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: Option<BlockId>,
    pub parent: Option<Parent>,
    pub has_children: bool,
    pub archived: bool,
    pub created_time: Option<String>,
    pub last_edited_time: Option<String>,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(TextBlock),
    Heading1(HeadingBlock),
    Heading2(HeadingBlock),
    Heading3(HeadingBlock),
    BulletedListItem(TextBlock),
    NumberedListItem(TextBlock),
    Quote(TextBlock),
    Toggle(TextBlock),
    Template(TextBlock),
    ToDo(ToDoBlock),
    Callout(CalloutBlock),
    Code(CodeBlock),
    Equation(EquationBlock),
    Image(FileBlock),
    Video(FileBlock),
    File(FileBlock),
    Pdf(FileBlock),
    Embed(LinkBlock),
    Bookmark(LinkBlock),
    LinkPreview(LinkBlock),
    Divider(EmptyBlock),
    Breadcrumb(EmptyBlock),
    TableOfContents(ColoredBlock),
    ColumnList(EmptyBlock),
    Column(EmptyBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
    Synced(SyncedBlock),
    LinkToPage(LinkToPageBlock),
    ChildPage(TitledBlock),
    ChildDatabase(TitledBlock),
    Unsupported(EmptyBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub rich_text: Vec<RichTextItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingBlock {
    #[serde(default)]
    pub rich_text: Vec<RichTextItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub is_toggleable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToDoBlock {
    #[serde(default)]
    pub rich_text: Vec<RichTextItem>,
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalloutBlock {
    #[serde(default)]
    pub rich_text: Vec<RichTextItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub rich_text: Vec<RichTextItem>,
    #[serde(default)]
    pub caption: Vec<RichTextItem>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationBlock {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileBlock {
    #[serde(default)]
    pub caption: Vec<RichTextItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub source: FileSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkBlock {
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<RichTextItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmptyBlock {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColoredBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub table_width: u32,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRowBlock {
    #[serde(default)]
    pub cells: Vec<Vec<RichTextItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedBlock {
    #[serde(default)]
    pub synced_from: Option<SyncedFrom>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedFrom {
    pub block_id: BlockId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkToPageBlock {
    PageId { page_id: PageId },
    DatabaseId { database_id: DatabaseId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitledBlock {
    pub title: String,
}

impl Block {
    /// A new block ready to be appended.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: None,
            parent: None,
            has_children: false,
            archived: false,
            created_time: None,
            last_edited_time: None,
            kind,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph(TextBlock {
            rich_text: vec![RichTextItem::plain(text)],
            color: None,
        }))
    }

    pub fn to_do(text: impl Into<String>, checked: bool) -> Self {
        Self::new(BlockKind::ToDo(ToDoBlock {
            rich_text: vec![RichTextItem::plain(text)],
            checked,
            color: None,
        }))
    }

    pub fn block_type(&self) -> &'static str {
        match_all_kinds!(&self.kind, name, _payload => name)
    }

    /// The rich text a reader sees, for kinds that carry any.
    pub fn rich_text(&self) -> Option<&[RichTextItem]> {
        match &self.kind {
            BlockKind::Paragraph(b)
            | BlockKind::BulletedListItem(b)
            | BlockKind::NumberedListItem(b)
            | BlockKind::Quote(b)
            | BlockKind::Toggle(b)
            | BlockKind::Template(b) => Some(&b.rich_text),
            BlockKind::Heading1(b) | BlockKind::Heading2(b) | BlockKind::Heading3(b) => {
                Some(&b.rich_text)
            }
            BlockKind::ToDo(b) => Some(&b.rich_text),
            BlockKind::Callout(b) => Some(&b.rich_text),
            BlockKind::Code(b) => Some(&b.rich_text),
            _ => None,
        }
    }

    /// The type payload alone, as sent when updating a block.
    pub fn payload(&self) -> Result<Value, AppError> {
        match_all_kinds!(&self.kind, _name, payload => Ok(serde_json::to_value(payload)?))
    }

    /// The full write shape used when appending a block.
    pub fn to_wire(&self) -> Result<Value, AppError> {
        let block_type = self.block_type();
        let mut wire = serde_json::Map::new();
        wire.insert("object".to_string(), json!("block"));
        wire.insert("type".to_string(), json!(block_type));
        wire.insert(block_type.to_string(), self.payload()?);
        Ok(Value::Object(wire))
    }
}

#[derive(Deserialize)]
struct BlockHeader {
    #[serde(default)]
    id: Option<BlockId>,
    #[serde(default)]
    parent: Option<Parent>,
    #[serde(default)]
    has_children: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    created_time: Option<String>,
    #[serde(default)]
    last_edited_time: Option<String>,
}

/// Decodes `raw[field]` as `P` and wraps it into a block.
fn block<P: serde::de::DeserializeOwned>(
    type_name: &'static str,
    field: &'static str,
    raw: &Value,
    wrap: fn(P) -> BlockKind,
) -> Result<Option<Block>, AppError> {
    let payload = construct_field::<P>(type_name, field, raw)?;
    let header: BlockHeader = construct(type_name, raw)?;
    Ok(Some(Block {
        id: header.id,
        parent: header.parent,
        has_children: header.has_children,
        archived: header.archived,
        created_time: header.created_time,
        last_edited_time: header.last_edited_time,
        kind: wrap(payload),
    }))
}

static BLOCKS: Lazy<Registry<Block>> = Lazy::new(|| {
    Registry::new("Block", "type")
        .register("paragraph", |raw| block("ParagraphBlock", "paragraph", raw, BlockKind::Paragraph))
        .register("heading_1", |raw| block("Heading1Block", "heading_1", raw, BlockKind::Heading1))
        .register("heading_2", |raw| block("Heading2Block", "heading_2", raw, BlockKind::Heading2))
        .register("heading_3", |raw| block("Heading3Block", "heading_3", raw, BlockKind::Heading3))
        .register("bulleted_list_item", |raw| {
            block("BulletedListItemBlock", "bulleted_list_item", raw, BlockKind::BulletedListItem)
        })
        .register("numbered_list_item", |raw| {
            block("NumberedListItemBlock", "numbered_list_item", raw, BlockKind::NumberedListItem)
        })
        .register("quote", |raw| block("QuoteBlock", "quote", raw, BlockKind::Quote))
        .register("toggle", |raw| block("ToggleBlock", "toggle", raw, BlockKind::Toggle))
        .register("template", |raw| block("TemplateBlock", "template", raw, BlockKind::Template))
        .register("to_do", |raw| block("ToDoBlock", "to_do", raw, BlockKind::ToDo))
        .register("callout", |raw| block("CalloutBlock", "callout", raw, BlockKind::Callout))
        .register("code", |raw| block("CodeBlock", "code", raw, BlockKind::Code))
        .register("equation", |raw| block("EquationBlock", "equation", raw, BlockKind::Equation))
        .register("image", |raw| block("ImageBlock", "image", raw, BlockKind::Image))
        .register("video", |raw| block("VideoBlock", "video", raw, BlockKind::Video))
        .register("file", |raw| block("FileBlock", "file", raw, BlockKind::File))
        .register("pdf", |raw| block("PdfBlock", "pdf", raw, BlockKind::Pdf))
        .register("embed", |raw| block("EmbedBlock", "embed", raw, BlockKind::Embed))
        .register("bookmark", |raw| block("BookmarkBlock", "bookmark", raw, BlockKind::Bookmark))
        .register("link_preview", |raw| {
            block("LinkPreviewBlock", "link_preview", raw, BlockKind::LinkPreview)
        })
        .register("divider", |raw| block("DividerBlock", "divider", raw, BlockKind::Divider))
        .register("breadcrumb", |raw| {
            block("BreadcrumbBlock", "breadcrumb", raw, BlockKind::Breadcrumb)
        })
        .register("table_of_contents", |raw| {
            block("TableOfContentsBlock", "table_of_contents", raw, BlockKind::TableOfContents)
        })
        .register("column_list", |raw| {
            block("ColumnListBlock", "column_list", raw, BlockKind::ColumnList)
        })
        .register("column", |raw| block("ColumnBlock", "column", raw, BlockKind::Column))
        .register("table", |raw| block("TableBlock", "table", raw, BlockKind::Table))
        .register("table_row", |raw| block("TableRowBlock", "table_row", raw, BlockKind::TableRow))
        .register("synced_block", |raw| {
            block("SyncedBlock", "synced_block", raw, BlockKind::Synced)
        })
        .register("link_to_page", |raw| {
            block("LinkToPageBlock", "link_to_page", raw, BlockKind::LinkToPage)
        })
        .register("child_page", |raw| {
            block("ChildPageBlock", "child_page", raw, BlockKind::ChildPage)
        })
        .register("child_database", |raw| {
            block("ChildDatabaseBlock", "child_database", raw, BlockKind::ChildDatabase)
        })
        .register("unsupported", |raw| {
            block("UnsupportedBlock", "unsupported", raw, BlockKind::Unsupported)
        })
        .unsupported(UNSUPPORTED_BLOCK_TYPES)
});

impl Discriminated for Block {
    fn registry() -> &'static Registry<Self> {
        &BLOCKS
    }
}
