// src/model/registry.rs
//! Discriminator-driven decoding.
//!
//! Every base type that the wire format expresses as a tagged union owns a
//! `Registry`: a table from discriminator value to construction function,
//! built once on first use. Decoding reads the discriminator, dispatches, and
//! either returns the constructed value, an explicit `None` for kinds this
//! client knowingly skips, or an error naming the base type and the value.

use crate::error::{preview, AppError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Builds one concrete variant from the raw payload that selected it.
pub type Constructor<T> = fn(&Value) -> Result<Option<T>, AppError>;

pub struct Registry<T> {
    base: &'static str,
    field: &'static str,
    constructors: HashMap<&'static str, Constructor<T>>,
    unsupported: &'static [&'static str],
}

impl<T> Registry<T> {
    /// A registry for `base`, dispatching on the wire field `field`.
    pub fn new(base: &'static str, field: &'static str) -> Self {
        Self {
            base,
            field,
            constructors: HashMap::new(),
            unsupported: &[],
        }
    }

    /// Registers the constructor for one discriminator value.
    ///
    /// Panics on a duplicate value: registries are static tables and a
    /// collision is a programming error caught on first use.
    pub fn register(mut self, value: &'static str, constructor: Constructor<T>) -> Self {
        let previous = self.constructors.insert(value, constructor);
        assert!(
            previous.is_none(),
            "{} registers '{}' twice",
            self.base,
            value
        );
        self
    }

    /// Kinds that decode to `None` instead of failing.
    pub fn unsupported(mut self, values: &'static [&'static str]) -> Self {
        self.unsupported = values;
        self
    }

    pub fn base(&self) -> &'static str {
        self.base
    }

    pub fn is_registered(&self, value: &str) -> bool {
        self.constructors.contains_key(value)
    }

    /// Registered discriminator values, in no particular order.
    pub fn values(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }

    pub fn decode(&self, raw: &Value) -> Result<Option<T>, AppError> {
        let value = raw
            .get(self.field)
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::MissingDiscriminator {
                base: self.base,
                field: self.field,
                payload: preview(&raw.to_string()),
            })?;

        match self.constructors.get(value) {
            Some(construct) => construct(raw),
            None if self.unsupported.contains(&value) => {
                log::debug!("Skipping {} of unsupported kind '{}'", self.base, value);
                Ok(None)
            }
            None => Err(AppError::UnknownDiscriminator {
                base: self.base,
                value: value.to_string(),
            }),
        }
    }
}

/// A base type whose wire form is a tagged union.
pub trait Discriminated: Sized + 'static {
    fn registry() -> &'static Registry<Self>;
}

/// Decodes `raw` as `T`, dispatching on its discriminator.
pub fn decode<T: Discriminated>(raw: &Value) -> Result<Option<T>, AppError> {
    T::registry().decode(raw)
}

/// Decodes a list, dropping the entries that resolve to an unsupported kind.
pub fn decode_all<T: Discriminated>(raw: &[Value]) -> Result<Vec<T>, AppError> {
    let mut decoded = Vec::with_capacity(raw.len());
    for item in raw {
        if let Some(value) = decode::<T>(item)? {
            decoded.push(value);
        }
    }
    Ok(decoded)
}

/// Constructs a terminal type from the whole payload.
pub fn construct<T: DeserializeOwned>(type_name: &'static str, raw: &Value) -> Result<T, AppError> {
    T::deserialize(raw).map_err(|e| AppError::invalid_payload(type_name, e, raw))
}

/// Constructs the payload stored under `field`.
///
/// The field must be present. A JSON `null` is handed to `T`, so nullable
/// payloads decode as `Option<_>` while non-nullable ones fail.
pub fn construct_field<T: DeserializeOwned>(
    type_name: &'static str,
    field: &str,
    raw: &Value,
) -> Result<T, AppError> {
    let payload = raw.get(field).ok_or_else(|| {
        AppError::invalid_payload(type_name, format!("missing field `{}`", field), raw)
    })?;
    T::deserialize(payload).map_err(|e| AppError::invalid_payload(type_name, e, raw))
}

/// Accepts either a single object or an array of them.
///
/// Property items embedded in a page carry arrays (`"title": [...]`), while
/// the paginated property endpoint returns one element per item.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    enum Shape {
        Circle(f64),
        Square(f64),
    }

    fn shapes() -> Registry<Shape> {
        Registry::new("Shape", "kind")
            .register("circle", |raw| {
                construct_field::<f64>("Circle", "radius", raw).map(|r| Some(Shape::Circle(r)))
            })
            .register("square", |raw| {
                construct_field::<f64>("Square", "side", raw).map(|s| Some(Shape::Square(s)))
            })
            .unsupported(&["hexagon"])
    }

    #[test]
    fn test_dispatches_on_discriminator() {
        let registry = shapes();
        let decoded = registry
            .decode(&json!({"kind": "circle", "radius": 2.0, "extra": true}))
            .unwrap();
        assert_eq!(decoded, Some(Shape::Circle(2.0)));
        assert!(registry.is_registered("square"));
        assert_eq!(registry.base(), "Shape");
    }

    #[test]
    fn test_unknown_value_names_base_and_value() {
        let err = shapes().decode(&json!({"kind": "star"})).unwrap_err();
        match err {
            AppError::UnknownDiscriminator { base, value } => {
                assert_eq!(base, "Shape");
                assert_eq!(value, "star");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_allow_listed_value_is_explicit_none() {
        assert_eq!(shapes().decode(&json!({"kind": "hexagon"})).unwrap(), None);
    }

    #[test]
    fn test_missing_field_names_subtype() {
        let err = shapes().decode(&json!({"kind": "square"})).unwrap_err();
        assert!(err.to_string().contains("Square"));
        assert!(err.to_string().contains("side"));
    }

    #[test]
    fn test_missing_discriminator() {
        let err = shapes().decode(&json!({"radius": 1.0})).unwrap_err();
        assert!(matches!(err, AppError::MissingDiscriminator { field: "kind", .. }));
    }

    #[test]
    #[should_panic(expected = "registers 'circle' twice")]
    fn test_duplicate_registration_panics() {
        let _ = shapes().register("circle", |_| Ok(None));
    }

    #[test]
    fn test_one_or_many() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "one_or_many")]
            items: Vec<u32>,
        }
        let one: Holder = serde_json::from_value(json!({"items": 1})).unwrap();
        let many: Holder = serde_json::from_value(json!({"items": [1, 2]})).unwrap();
        assert_eq!(one.items, vec![1]);
        assert_eq!(many.items, vec![1, 2]);
    }
}
