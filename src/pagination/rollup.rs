// src/pagination/rollup.rs
//! Rollup resolution.
//!
//! A paginated rollup only says what it is on its last page: earlier pages
//! may report `incomplete` while Notion is still computing. So the pages
//! are drained first, keeping every item and the latest summary, and only
//! then interpreted.

use crate::error::AppError;
use crate::model::{decode, Envelope, PropertyItem, RollupSummary, RollupValue};
use futures::{Stream, TryStreamExt};

/// Interprets the final rollup summary together with the retained items.
pub fn resolve_rollup(
    property_id: &str,
    items: Vec<PropertyItem>,
    summary: Option<&RollupSummary>,
) -> Result<RollupValue, AppError> {
    let Some(summary) = summary else {
        return Err(AppError::UnknownRollupVariant {
            variant: "missing".to_string(),
        });
    };

    match summary.rollup_type.as_str() {
        "incomplete" => Err(AppError::RollupIncomplete {
            property_id: property_id.to_string(),
        }),
        "unsupported" => Err(AppError::RollupUnsupported {
            property_id: property_id.to_string(),
        }),
        "array" => Ok(RollupValue::Array(items)),
        "number" => Ok(RollupValue::Number(summary.number)),
        "date" => Ok(RollupValue::Date(summary.date.clone())),
        other => Err(AppError::UnknownRollupVariant {
            variant: other.to_string(),
        }),
    }
}

/// Resolves a rollup embedded in a page, whose array elements are still raw.
pub fn resolve_embedded(property_id: &str, summary: &RollupSummary) -> Result<RollupValue, AppError> {
    let mut items = Vec::new();
    for raw in summary.array.iter().flatten() {
        match decode::<PropertyItem>(raw)? {
            Some(item) => items.push(item),
            None => log::debug!("Rollup '{}' dropped an unsupported element", property_id),
        }
    }
    resolve_rollup(property_id, items, Some(summary))
}

/// An eager consumer of property-item envelopes.
pub trait Drain {
    type Output;

    fn push(&mut self, envelope: Envelope<PropertyItem>);

    fn finish(self) -> Result<Self::Output, AppError>;
}

/// Pulls every envelope from a blocking iterator into `drain`.
pub fn drain_blocking<D, I>(mut drain: D, pages: I) -> Result<D::Output, AppError>
where
    D: Drain,
    I: IntoIterator<Item = Result<Envelope<PropertyItem>, AppError>>,
{
    for envelope in pages {
        drain.push(envelope?);
    }
    drain.finish()
}

/// Pulls every envelope from a stream into `drain`.
pub async fn drain_stream<D, S>(drain: D, pages: S) -> Result<D::Output, AppError>
where
    D: Drain,
    S: Stream<Item = Result<Envelope<PropertyItem>, AppError>>,
{
    pages
        .try_fold(drain, |mut drain, envelope| async move {
            drain.push(envelope);
            Ok(drain)
        })
        .await?
        .finish()
}

/// Collects a paginated rollup.
#[derive(Debug, Clone)]
pub struct RollupDrain {
    property_id: String,
    items: Vec<PropertyItem>,
    summary: Option<RollupSummary>,
}

impl RollupDrain {
    pub fn new(property_id: impl Into<String>) -> Self {
        Self {
            property_id: property_id.into(),
            items: Vec::new(),
            summary: None,
        }
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }
}

impl Drain for RollupDrain {
    type Output = RollupValue;

    fn push(&mut self, envelope: Envelope<PropertyItem>) {
        if let Some(rollup) = envelope.property_item.and_then(|summary| summary.rollup) {
            self.summary = Some(rollup);
        }
        self.items.extend(envelope.results);
    }

    fn finish(self) -> Result<RollupValue, AppError> {
        resolve_rollup(&self.property_id, self.items, self.summary.as_ref())
    }
}
