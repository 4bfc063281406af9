use super::cart_resolver::LineMutation;
use crate::errors::ServiceError;
use crate::repositories::{CartStore, InsertOutcome, LineItemId};
use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Insert attempts before a create that keeps colliding with vanishing rows
/// is reported as a storage failure.
const MAX_CREATE_ATTEMPTS: usize = 3;

/// What a mutation left behind in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Created { line_item_id: LineItemId },
    QuantityChanged { line_item_id: LineItemId, quantity: i32 },
    Deleted { line_item_id: LineItemId },
}

impl MutationOutcome {
    pub fn line_item_id(&self) -> LineItemId {
        match *self {
            MutationOutcome::Created { line_item_id }
            | MutationOutcome::QuantityChanged { line_item_id, .. }
            | MutationOutcome::Deleted { line_item_id } => line_item_id,
        }
    }

    /// Line quantity after the mutation; 0 once the row is gone.
    pub fn quantity(&self) -> i32 {
        match *self {
            MutationOutcome::Created { .. } => 1,
            MutationOutcome::QuantityChanged { quantity, .. } => quantity,
            MutationOutcome::Deleted { .. } => 0,
        }
    }
}

/// Applies one [`LineMutation`]. Every storage call is its own unit of work.
#[derive(Clone)]
pub struct CartMutationExecutor {
    store: Arc<dyn CartStore>,
}

impl CartMutationExecutor {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, mutation: LineMutation) -> Result<MutationOutcome, ServiceError> {
        match mutation {
            LineMutation::CreateLine {
                cart_id,
                product_id,
                attributes,
                pricing,
            } => {
                for _ in 0..MAX_CREATE_ATTEMPTS {
                    match self
                        .store
                        .insert_line_item(cart_id, product_id, &attributes, pricing)
                        .await?
                    {
                        InsertOutcome::Inserted(line_item_id) => {
                            return Ok(MutationOutcome::Created { line_item_id });
                        }
                        InsertOutcome::Duplicate => {
                            counter!("storefront_cart.create_conflict_fallback", 1);
                            info!(%cart_id, product_id, "line created concurrently; incrementing instead");
                        }
                    }

                    // The racing writer's row is incremented as if this
                    // request had found it during resolution.
                    if let Some(line) = self
                        .store
                        .find_line_item(cart_id, product_id, &attributes)
                        .await?
                    {
                        return self.increment(line.id).await;
                    }
                }

                Err(ServiceError::storage_message(format!(
                    "cart line for product {} kept conflicting on insert",
                    product_id
                )))
            }
            LineMutation::IncrementLine { line_item_id } => self.increment(line_item_id).await,
            LineMutation::DecrementLine { line_item_id } => {
                let quantity = self
                    .store
                    .update_line_item_quantity(line_item_id, -1)
                    .await?;
                if quantity <= 0 {
                    warn!(%line_item_id, quantity, "decrement emptied line; deleting row");
                    self.store.delete_line_item(line_item_id).await?;
                    return Ok(MutationOutcome::Deleted { line_item_id });
                }
                Ok(MutationOutcome::QuantityChanged {
                    line_item_id,
                    quantity,
                })
            }
            LineMutation::DeleteLine { line_item_id } => {
                self.store.delete_line_item(line_item_id).await?;
                Ok(MutationOutcome::Deleted { line_item_id })
            }
        }
    }

    async fn increment(&self, line_item_id: LineItemId) -> Result<MutationOutcome, ServiceError> {
        let quantity = self
            .store
            .update_line_item_quantity(line_item_id, 1)
            .await?;
        Ok(MutationOutcome::QuantityChanged {
            line_item_id,
            quantity,
        })
    }
}
