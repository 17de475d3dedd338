// src/query.rs
//! Database query filters and sorts.
//!
//! Builders for the `filter` and `sorts` members of a database query body.
//! `Filter::raw` covers anything the builders don't.

use crate::types::{DateInstant, PageId, UserId};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
    IsEmpty,
    IsNotEmpty,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::DoesNotEqual => "does_not_equal",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does_not_contain",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Operator::LessThanOrEqualTo => "less_than_or_equal_to",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::OnOrBefore => "on_or_before",
            Operator::OnOrAfter => "on_or_after",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
        }
    }
}

/// One condition on one property type, e.g. `{"status": {"equals": "Done"}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCondition {
    property_type: &'static str,
    operator: Operator,
    value: Value,
}

impl PropertyCondition {
    pub fn new(property_type: &'static str, operator: Operator, value: Value) -> Self {
        let value = match operator {
            Operator::IsEmpty | Operator::IsNotEmpty => Value::Bool(true),
            _ => value,
        };
        Self {
            property_type,
            operator,
            value,
        }
    }

    pub fn title(operator: Operator, text: impl Into<String>) -> Self {
        Self::new("title", operator, Value::String(text.into()))
    }

    pub fn rich_text(operator: Operator, text: impl Into<String>) -> Self {
        Self::new("rich_text", operator, Value::String(text.into()))
    }

    pub fn number(operator: Operator, number: f64) -> Self {
        Self::new("number", operator, json!(number))
    }

    pub fn checkbox(checked: bool) -> Self {
        Self::new("checkbox", Operator::Equals, Value::Bool(checked))
    }

    pub fn select(operator: Operator, name: impl Into<String>) -> Self {
        Self::new("select", operator, Value::String(name.into()))
    }

    pub fn multi_select(operator: Operator, name: impl Into<String>) -> Self {
        Self::new("multi_select", operator, Value::String(name.into()))
    }

    pub fn status(operator: Operator, name: impl Into<String>) -> Self {
        Self::new("status", operator, Value::String(name.into()))
    }

    pub fn date(operator: Operator, date: impl Into<DateInstant>) -> Self {
        Self::new("date", operator, Value::String(date.into().to_string()))
    }

    pub fn people(operator: Operator, user: &UserId) -> Self {
        Self::new("people", operator, Value::String(user.to_string()))
    }

    pub fn relation(operator: Operator, page: &PageId) -> Self {
        Self::new("relation", operator, Value::String(page.to_string()))
    }

    pub fn is_empty(property_type: &'static str) -> Self {
        Self::new(property_type, Operator::IsEmpty, Value::Null)
    }

    pub fn is_not_empty(property_type: &'static str) -> Self {
        Self::new(property_type, Operator::IsNotEmpty, Value::Null)
    }

    fn to_json(&self) -> Value {
        let mut inner = Map::new();
        inner.insert(self.operator.as_str().to_string(), self.value.clone());
        let mut outer = Map::new();
        outer.insert(self.property_type.to_string(), Value::Object(inner));
        Value::Object(outer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    CreatedTime,
    LastEditedTime,
}

impl Timestamp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timestamp::CreatedTime => "created_time",
            Timestamp::LastEditedTime => "last_edited_time",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Property {
        property: String,
        condition: PropertyCondition,
    },
    Timestamp {
        timestamp: Timestamp,
        operator: Operator,
        date: DateInstant,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Raw(Value),
}

impl Filter {
    pub fn property(name: impl Into<String>, condition: PropertyCondition) -> Self {
        Filter::Property {
            property: name.into(),
            condition,
        }
    }

    pub fn timestamp(timestamp: Timestamp, operator: Operator, date: impl Into<DateInstant>) -> Self {
        Filter::Timestamp {
            timestamp,
            operator,
            date: date.into(),
        }
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn raw(value: Value) -> Self {
        Filter::Raw(value)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Filter::Property {
                property,
                condition,
            } => {
                let mut object = match condition.to_json() {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                object.insert("property".to_string(), Value::String(property.clone()));
                Value::Object(object)
            }
            Filter::Timestamp {
                timestamp,
                operator,
                date,
            } => {
                let key = timestamp.as_str();
                json!({
                    "timestamp": key,
                    key: {operator.as_str(): date.to_string()}
                })
            }
            Filter::And(filters) => json!({"and": filters.iter().map(Filter::to_json).collect::<Vec<_>>()}),
            Filter::Or(filters) => json!({"or": filters.iter().map(Filter::to_json).collect::<Vec<_>>()}),
            Filter::Raw(value) => value.clone(),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sort {
    Property { property: String, direction: Direction },
    Timestamp { timestamp: Timestamp, direction: Direction },
}

impl Sort {
    pub fn property(name: impl Into<String>, direction: Direction) -> Self {
        Sort::Property {
            property: name.into(),
            direction,
        }
    }

    pub fn timestamp(timestamp: Timestamp, direction: Direction) -> Self {
        Sort::Timestamp {
            timestamp,
            direction,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Sort::Property {
                property,
                direction,
            } => json!({"property": property, "direction": direction.as_str()}),
            Sort::Timestamp {
                timestamp,
                direction,
            } => json!({"timestamp": timestamp.as_str(), "direction": direction.as_str()}),
        }
    }
}

impl Serialize for Sort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// The body of a database query, minus pagination fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if let Some(filter) = &self.filter {
            body.insert("filter".to_string(), filter.to_json());
        }
        if !self.sorts.is_empty() {
            body.insert(
                "sorts".to_string(),
                Value::Array(self.sorts.iter().map(Sort::to_json).collect()),
            );
        }
        Value::Object(body)
    }
}
