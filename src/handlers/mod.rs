pub mod commerce;
pub mod common;
pub mod health;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::repositories::{CartStore, ProductRepository, SeaOrmCartStore};
use crate::services::commerce::{CartService, ProductCatalogService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub product_catalog: Arc<ProductCatalogService>,
    pub cart: Arc<CartService>,
}

impl AppServices {
    /// Wires the services over the shared connection pool.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let store: Arc<dyn CartStore> = Arc::new(SeaOrmCartStore::new(db_pool.clone()));

        let product_catalog = Arc::new(ProductCatalogService::new(
            ProductRepository::new(db_pool),
            event_sender.clone(),
        ));
        let cart = Arc::new(CartService::new(store, event_sender));

        Self {
            product_catalog,
            cart,
        }
    }
}
