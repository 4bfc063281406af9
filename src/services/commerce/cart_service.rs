use super::{
    cart_assembly::{CartAssembler, CartView},
    cart_mutation::{CartMutationExecutor, MutationOutcome},
    cart_resolver::{CartAction, CartLineResolver, LineMutation},
    catalog::AttributeMap,
};
use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{CartId, CartStore, LineItemId},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// One add or remove request against a user's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartUpdate {
    pub action: CartAction,
    pub product_id: i64,
    /// Empty for products without variants.
    pub attributes: AttributeMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartUpdateOutcome {
    pub cart_id: CartId,
    pub line_item_id: LineItemId,
    /// Quantity left on the line; 0 when the line was deleted.
    pub quantity: i32,
}

/// Shopping cart service: lazily created per-user carts, variant-aware line
/// mutation, priced reads and checkout.
///
/// A request flows catalog → matcher → resolver → executor. No lock is taken
/// around that sequence; the storage uniqueness constraint on the line key and
/// the executor's conflict fallback keep lines unique under concurrent adds.
///
/// # Examples
///
/// ```ignore
/// let service = CartService::new(store, event_sender);
/// service
///     .update_cart(42, CartUpdate {
///         action: CartAction::Add,
///         product_id: 7,
///         attributes: [("color".to_string(), "blue".to_string())].into(),
///     })
///     .await?;
/// let cart = service.fetch_cart(42).await?;
/// ```
#[derive(Clone)]
pub struct CartService {
    store: Arc<dyn CartStore>,
    resolver: CartLineResolver,
    executor: CartMutationExecutor,
    assembler: CartAssembler,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(store: Arc<dyn CartStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            resolver: CartLineResolver::new(store.clone()),
            executor: CartMutationExecutor::new(store.clone()),
            assembler: CartAssembler::new(store.clone()),
            store,
            event_sender,
        }
    }

    /// Returns the user's cart, creating it on first access.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: i64) -> Result<CartId, ServiceError> {
        if let Some(cart_id) = self.store.get_cart_id(user_id).await? {
            return Ok(cart_id);
        }

        let cart_id = self.store.create_cart(user_id).await?;
        self.event_sender
            .send_or_log(Event::CartCreated { cart_id, user_id })
            .await;

        info!("Created cart {} for user {}", cart_id, user_id);
        Ok(cart_id)
    }

    /// Priced contents of the user's cart.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self, user_id: i64) -> Result<CartView, ServiceError> {
        let cart_id = self.get_or_create_cart(user_id).await?;
        self.assembler.assemble(cart_id).await
    }

    /// Adds one unit of a product (variant) to the cart, or removes one.
    #[instrument(skip(self))]
    pub async fn update_cart(
        &self,
        user_id: i64,
        update: CartUpdate,
    ) -> Result<CartUpdateOutcome, ServiceError> {
        let cart_id = self.get_or_create_cart(user_id).await?;

        let mutation = self
            .resolver
            .resolve(
                cart_id,
                update.product_id,
                update.action,
                &update.attributes,
            )
            .await?;
        let creating = matches!(mutation, LineMutation::CreateLine { .. });
        let outcome = self.executor.execute(mutation).await?;

        let event = match outcome {
            MutationOutcome::Created { line_item_id } => Event::CartItemAdded {
                cart_id,
                product_id: update.product_id,
                line_item_id,
            },
            MutationOutcome::QuantityChanged {
                line_item_id,
                quantity,
            } => Event::CartItemUpdated {
                cart_id,
                product_id: update.product_id,
                line_item_id,
                quantity,
            },
            MutationOutcome::Deleted { line_item_id } => Event::CartItemRemoved {
                cart_id,
                product_id: update.product_id,
                line_item_id,
            },
        };
        self.event_sender.send_or_log(event).await;

        info!(
            %cart_id,
            product_id = update.product_id,
            action = ?update.action,
            creating,
            quantity = outcome.quantity(),
            "cart updated"
        );

        Ok(CartUpdateOutcome {
            cart_id,
            line_item_id: outcome.line_item_id(),
            quantity: outcome.quantity(),
        })
    }

    /// Places the order for the user's cart: returns its priced contents and
    /// deletes the cart together with its lines. The next access starts a
    /// fresh, empty cart.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: i64) -> Result<CartView, ServiceError> {
        let cart_id = self
            .store
            .get_cart_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {} has no cart", user_id)))?;

        let view = self.assembler.assemble(cart_id).await?;

        if !self.store.delete_cart(cart_id).await? {
            return Err(ServiceError::NotFound(format!(
                "cart {} was removed concurrently",
                cart_id
            )));
        }

        self.event_sender
            .send_or_log(Event::CartCheckedOut { cart_id, user_id })
            .await;

        info!("Checked out cart {} for user {}", cart_id, user_id);
        Ok(view)
    }
}
