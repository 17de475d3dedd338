// src/types/common.rs
//! Value objects shared by properties, blocks, and configurations.

use super::{BlockId, DatabaseId, PageId, UserId, ValidationError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One run of rich text.
///
/// Reads tolerate every run kind (text, mention, equation) and keep
/// `plain_text` as the rendering fallback. `plain_text` and `href` are
/// server-computed and never written back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichTextItem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<EquationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
    #[serde(default, skip_serializing)]
    pub plain_text: String,
    #[serde(default, skip_serializing)]
    pub href: Option<String>,
}

impl RichTextItem {
    /// A plain text run with default annotations.
    pub fn plain(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            kind: Some("text".to_string()),
            text: Some(TextContent {
                content: text.clone(),
                link: None,
            }),
            plain_text: text,
            ..Self::default()
        }
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("text")
    }

    /// The text a reader sees for this run.
    pub fn display_text(&self) -> &str {
        if !self.plain_text.is_empty() {
            return &self.plain_text;
        }
        if let Some(text) = &self.text {
            return &text.content;
        }
        if let Some(equation) = &self.equation {
            return &equation.expression;
        }
        ""
    }
}

/// Concatenates the display text of every run.
pub fn join_rich_text(items: &[RichTextItem]) -> String {
    items.iter().map(RichTextItem::display_text).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(default)]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationData {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: String,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: "default".to_string(),
        }
    }
}

/// A select, multi-select, or status option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SelectOption {
    /// An option referenced by name, the form used in writes.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: None,
        }
    }
}

/// A calendar date, a local date-time, or an offset date-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInstant {
    Date(NaiveDate),
    Local(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl FromStr for DateInstant {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(zoned) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Zoned(zoned));
        }
        if let Ok(local) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::Local(local));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::Date)
            .map_err(|e| ValidationError::InvalidDate {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for DateInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Local(local) => write!(f, "{}", local.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Zoned(zoned) => write!(f, "{}", zoned.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        }
    }
}

impl Serialize for DateInstant {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateInstant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<NaiveDate> for DateInstant {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<NaiveDateTime> for DateInstant {
    fn from(local: NaiveDateTime) -> Self {
        Self::Local(local)
    }
}

impl From<DateTime<FixedOffset>> for DateInstant {
    fn from(zoned: DateTime<FixedOffset>) -> Self {
        Self::Zoned(zoned)
    }
}

impl From<DateTime<Utc>> for DateInstant {
    fn from(utc: DateTime<Utc>) -> Self {
        Self::Zoned(utc.fixed_offset())
    }
}

/// A date property value: start, optional end, optional IANA time zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: DateInstant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateInstant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl DateValue {
    pub fn starting(start: impl Into<DateInstant>) -> Self {
        Self {
            start: start.into(),
            end: None,
            time_zone: None,
        }
    }

    pub fn with_end(mut self, end: impl Into<DateInstant>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }
}

/// A workspace member or bot. Partial users carry only the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<PersonInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonInfo {
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// A bare reference, the form used in `people` writes.
    pub fn reference(id: UserId) -> Self {
        Self {
            id,
            name: None,
            avatar_url: None,
            user_type: None,
            person: None,
        }
    }

    /// Name, then email, then id.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.person.as_ref().and_then(|p| p.email.clone()))
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// An attached file in a `files` property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub source: FileSource,
}

impl FileReference {
    pub fn external(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            source: FileSource::External {
                external: ExternalFile { url: url.into() },
            },
        }
    }

    /// The URL the file can be fetched from, if the source has one.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            FileSource::External { external } => Some(&external.url),
            FileSource::File { file } => Some(&file.url),
            FileSource::FileUpload { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileSource {
    External { external: ExternalFile },
    File { file: HostedFile },
    FileUpload { file_upload: FileUploadRef },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedFile {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: PageId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueIdValue {
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub prefix: Option<String>,
}

impl fmt::Display for UniqueIdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, self.number) {
            (Some(prefix), Some(number)) => write!(f, "{}-{}", prefix, number),
            (None, Some(number)) => write!(f, "{}", number),
            (Some(prefix), None) => write!(f, "{}", prefix),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    External { external: ExternalFile },
    File { file: HostedFile },
    #[serde(other)]
    Other,
}

/// Where a page, database, or block lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    DatabaseId { database_id: DatabaseId },
    PageId { page_id: PageId },
    BlockId { block_id: BlockId },
    Workspace {
        #[serde(default)]
        workspace: bool,
    },
}
