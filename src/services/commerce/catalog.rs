//! Typed view over a product's stored variant definitions.
//!
//! A product stores its variants as a JSON array of flat objects. Every key of
//! an object is a selectable attribute except the two pricing keys,
//! [`PRICE_KEY`] and [`DISCOUNT_KEY`].

use crate::errors::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Requested or stored attribute selection, e.g. `{"color": "red", "size": "M"}`.
///
/// Ordered so that equality and the canonical key are independent of the order
/// in which a client sent the attributes.
pub type AttributeMap = BTreeMap<String, String>;

pub const PRICE_KEY: &str = "price";
pub const DISCOUNT_KEY: &str = "discountPercentage";

/// Price and optional discount stamped onto a variant line at first add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantPricing {
    pub price: Decimal,
    pub discount_percentage: Option<Decimal>,
}

/// One entry of a product's variant catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantDefinition {
    fields: Map<String, Value>,
}

impl VariantDefinition {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Parses the stored `variants` column. `null` reads as an empty catalog.
    pub fn parse_list(value: &Value) -> Result<Vec<Self>, ServiceError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(entries) => entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| match entry {
                    Value::Object(fields) => Ok(Self::new(fields.clone())),
                    other => Err(ServiceError::CatalogCorrupt(format!(
                        "variant #{} is not an object: {}",
                        idx, other
                    ))),
                })
                .collect(),
            other => Err(ServiceError::CatalogCorrupt(format!(
                "variants column is not an array: {}",
                other
            ))),
        }
    }

    /// Attribute entries, pricing keys excluded.
    pub fn selectable_attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields
            .iter()
            .filter(|(key, _)| !is_pricing_key(key))
    }

    pub fn selectable_count(&self) -> usize {
        self.selectable_attributes().count()
    }

    /// True when the selectable attributes equal `requested` exactly.
    ///
    /// Stored values that are not JSON strings never equal a requested value.
    pub fn matches(&self, requested: &AttributeMap) -> bool {
        if self.selectable_count() != requested.len() {
            return false;
        }
        requested.iter().all(|(key, wanted)| {
            matches!(self.fields.get(key), Some(Value::String(stored)) if stored == wanted)
        })
    }

    /// The selectable attributes as strings, when every one of them is a string.
    pub fn attribute_map(&self) -> Option<AttributeMap> {
        self.selectable_attributes()
            .map(|(key, value)| value.as_str().map(|s| (key.clone(), s.to_string())))
            .collect()
    }

    /// Reads the pricing fields. The error string names the broken field.
    pub fn pricing(&self) -> Result<VariantPricing, String> {
        let price = match self.fields.get(PRICE_KEY) {
            None | Some(Value::Null) => return Err(format!("missing `{}`", PRICE_KEY)),
            Some(value) => {
                decimal_from_json(value).ok_or_else(|| format!("non-numeric `{}`", PRICE_KEY))?
            }
        };

        let discount_percentage = match self.fields.get(DISCOUNT_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                decimal_from_json(value)
                    .ok_or_else(|| format!("non-numeric `{}`", DISCOUNT_KEY))?,
            ),
        };

        Ok(VariantPricing {
            price,
            discount_percentage,
        })
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.fields)
    }
}

pub fn is_pricing_key(key: &str) -> bool {
    key == PRICE_KEY || key == DISCOUNT_KEY
}

/// Converts a JSON number into a decimal. Strings and other types yield `None`.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        _ => None,
    }
}

/// Canonical text of an attribute selection, used as part of the line identity.
///
/// Empty selections map to the empty string; otherwise the keys are emitted in
/// sorted order as a compact JSON object.
pub fn variant_key(attributes: &AttributeMap) -> String {
    if attributes.is_empty() {
        return String::new();
    }
    attributes_to_json(attributes).to_string()
}

pub fn attributes_to_json(attributes: &AttributeMap) -> Value {
    Value::Object(
        attributes
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}
