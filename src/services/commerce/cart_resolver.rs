//! Decides which single row mutation an add or remove request needs.

use super::catalog::{AttributeMap, VariantPricing};
use super::variant_matcher::{check_attribute_shape, match_variant};
use crate::errors::ServiceError;
use crate::repositories::{CartId, CartStore, LineItemId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Add,
    Remove,
}

/// The one storage mutation a request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineMutation {
    CreateLine {
        cart_id: CartId,
        product_id: i64,
        attributes: AttributeMap,
        pricing: Option<VariantPricing>,
    },
    IncrementLine {
        line_item_id: LineItemId,
    },
    DecrementLine {
        line_item_id: LineItemId,
    },
    DeleteLine {
        line_item_id: LineItemId,
    },
}

#[derive(Clone)]
pub struct CartLineResolver {
    store: Arc<dyn CartStore>,
}

impl CartLineResolver {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        cart_id: CartId,
        product_id: i64,
        action: CartAction,
        attributes: &AttributeMap,
    ) -> Result<LineMutation, ServiceError> {
        match action {
            CartAction::Add => self.resolve_add(cart_id, product_id, attributes).await,
            CartAction::Remove => self.resolve_remove(cart_id, product_id, attributes).await,
        }
    }

    /// An existing line is incremented without re-reading the catalog price:
    /// a variant line keeps the price stamped at its first add.
    async fn resolve_add(
        &self,
        cart_id: CartId,
        product_id: i64,
        attributes: &AttributeMap,
    ) -> Result<LineMutation, ServiceError> {
        let definitions = self.store.get_variant_definitions(product_id).await?;
        check_attribute_shape(&definitions, attributes)?;

        if let Some(line) = self
            .store
            .find_line_item(cart_id, product_id, attributes)
            .await?
        {
            debug!(line_item_id = %line.id, quantity = line.quantity, "incrementing existing line");
            return Ok(LineMutation::IncrementLine {
                line_item_id: line.id,
            });
        }

        let pricing = match_variant(&definitions, attributes)?;
        Ok(LineMutation::CreateLine {
            cart_id,
            product_id,
            attributes: attributes.clone(),
            pricing,
        })
    }

    async fn resolve_remove(
        &self,
        cart_id: CartId,
        product_id: i64,
        attributes: &AttributeMap,
    ) -> Result<LineMutation, ServiceError> {
        let definitions = self.store.get_variant_definitions(product_id).await?;
        check_attribute_shape(&definitions, attributes)?;

        let line = self
            .store
            .find_line_item(cart_id, product_id, attributes)
            .await?
            .ok_or_else(|| {
                ServiceError::InvalidRequest(format!(
                    "product {} with the given variant is not in the cart",
                    product_id
                ))
            })?;

        if line.quantity > 1 {
            Ok(LineMutation::DecrementLine {
                line_item_id: line.id,
            })
        } else {
            Ok(LineMutation::DeleteLine {
                line_item_id: line.id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::cart_store::{LineItem, MockCartStore};
    use crate::services::commerce::catalog::VariantDefinition;
    use assert_matches::assert_matches;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use uuid::Uuid;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn colors() -> Vec<VariantDefinition> {
        VariantDefinition::parse_list(&json!([
            {"color": "red", "price": 15},
            {"color": "blue", "price": 18},
        ]))
        .unwrap()
    }

    fn line(cart_id: CartId, attributes: AttributeMap, quantity: i32) -> LineItem {
        LineItem {
            id: Uuid::new_v4(),
            cart_id,
            product_id: 1,
            attributes,
            quantity,
            price: Some(dec!(18)),
            discount_percentage: None,
        }
    }

    fn resolver(store: MockCartStore) -> CartLineResolver {
        CartLineResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn add_new_variant_line_stamps_matched_price() {
        let cart_id = Uuid::new_v4();
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .with(eq(1))
            .returning(|_| Ok(colors()));
        store
            .expect_find_line_item()
            .times(1)
            .returning(|_, _, _| Ok(None));

        let mutation = resolver(store)
            .resolve(cart_id, 1, CartAction::Add, &attrs(&[("color", "blue")]))
            .await
            .unwrap();

        assert_eq!(
            mutation,
            LineMutation::CreateLine {
                cart_id,
                product_id: 1,
                attributes: attrs(&[("color", "blue")]),
                pricing: Some(VariantPricing {
                    price: dec!(18),
                    discount_percentage: None
                }),
            }
        );
    }

    #[tokio::test]
    async fn add_new_plain_line_has_no_pricing() {
        let cart_id = Uuid::new_v4();
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(Vec::new()));
        store.expect_find_line_item().returning(|_, _, _| Ok(None));

        let mutation = resolver(store)
            .resolve(cart_id, 1, CartAction::Add, &AttributeMap::new())
            .await
            .unwrap();

        assert_matches!(mutation, LineMutation::CreateLine { pricing: None, ref attributes, .. } if attributes.is_empty());
    }

    #[tokio::test]
    async fn add_existing_line_increments_without_matching() {
        let cart_id = Uuid::new_v4();
        let existing = line(cart_id, attrs(&[("color", "blue")]), 1);
        let existing_id = existing.id;

        let mut store = MockCartStore::new();
        // The catalog no longer offers blue; the stamped line still increments.
        store
            .expect_get_variant_definitions()
            .returning(|_| {
                Ok(VariantDefinition::parse_list(&json!([{"color": "red", "price": 15}])).unwrap())
            });
        store
            .expect_find_line_item()
            .returning(move |_, _, _| Ok(Some(existing.clone())));

        let mutation = resolver(store)
            .resolve(cart_id, 1, CartAction::Add, &attrs(&[("color", "blue")]))
            .await
            .unwrap();

        assert_eq!(
            mutation,
            LineMutation::IncrementLine {
                line_item_id: existing_id
            }
        );
    }

    #[tokio::test]
    async fn add_attributes_to_plain_product_is_rejected_before_lookup() {
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(Vec::new()));
        store.expect_find_line_item().never();

        let err = resolver(store)
            .resolve(Uuid::new_v4(), 1, CartAction::Add, &attrs(&[("size", "M")]))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidRequest(_));
    }

    #[tokio::test]
    async fn add_variant_product_without_attributes_is_rejected() {
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(colors()));
        store.expect_find_line_item().never();

        let err = resolver(store)
            .resolve(Uuid::new_v4(), 1, CartAction::Add, &AttributeMap::new())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidRequest(_));
    }

    #[tokio::test]
    async fn add_unknown_combination_is_variant_not_found() {
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(colors()));
        store.expect_find_line_item().returning(|_, _, _| Ok(None));

        let err = resolver(store)
            .resolve(
                Uuid::new_v4(),
                1,
                CartAction::Add,
                &attrs(&[("color", "green")]),
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::VariantNotFound(_));
    }

    #[tokio::test]
    async fn add_missing_product_is_not_found() {
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|id| Err(ServiceError::NotFound(format!("product {} not found", id))));

        let err = resolver(store)
            .resolve(Uuid::new_v4(), 99, CartAction::Add, &AttributeMap::new())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(_));
    }

    #[tokio::test]
    async fn remove_absent_line_is_invalid_request() {
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(Vec::new()));
        store.expect_find_line_item().returning(|_, _, _| Ok(None));

        let err = resolver(store)
            .resolve(Uuid::new_v4(), 1, CartAction::Remove, &AttributeMap::new())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidRequest(_));
    }

    #[tokio::test]
    async fn remove_missing_product_is_not_found() {
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|id| Err(ServiceError::NotFound(format!("product {} not found", id))));
        store.expect_find_line_item().never();

        let err = resolver(store)
            .resolve(Uuid::new_v4(), 999, CartAction::Remove, &AttributeMap::new())
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(_));
    }

    #[tokio::test]
    async fn remove_attributes_from_plain_product_is_rejected_before_lookup() {
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(Vec::new()));
        store.expect_find_line_item().never();

        let err = resolver(store)
            .resolve(
                Uuid::new_v4(),
                1,
                CartAction::Remove,
                &attrs(&[("size", "M")]),
            )
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidRequest(_));
    }

    #[tokio::test]
    async fn remove_picks_decrement_or_delete_by_quantity() {
        let cart_id = Uuid::new_v4();
        let several = line(cart_id, AttributeMap::new(), 3);
        let several_id = several.id;
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(Vec::new()));
        store
            .expect_find_line_item()
            .returning(move |_, _, _| Ok(Some(several.clone())));
        assert_eq!(
            resolver(store)
                .resolve(cart_id, 1, CartAction::Remove, &AttributeMap::new())
                .await
                .unwrap(),
            LineMutation::DecrementLine {
                line_item_id: several_id
            }
        );

        let single = line(cart_id, AttributeMap::new(), 1);
        let single_id = single.id;
        let mut store = MockCartStore::new();
        store
            .expect_get_variant_definitions()
            .returning(|_| Ok(Vec::new()));
        store
            .expect_find_line_item()
            .returning(move |_, _, _| Ok(Some(single.clone())));
        assert_eq!(
            resolver(store)
                .resolve(cart_id, 1, CartAction::Remove, &AttributeMap::new())
                .await
                .unwrap(),
            LineMutation::DeleteLine {
                line_item_id: single_id
            }
        );
    }

    #[test]
    fn action_parses_from_lowercase() {
        let add: CartAction = serde_json::from_str("\"add\"").unwrap();
        let remove: CartAction = serde_json::from_str("\"remove\"").unwrap();
        assert_eq!(add, CartAction::Add);
        assert_eq!(remove, CartAction::Remove);
        assert!(serde_json::from_str::<CartAction>("\"clear\"").is_err());
    }
}
