/// Cart engine and product catalog
pub mod cart_assembly;
pub mod cart_mutation;
pub mod cart_resolver;
pub mod cart_service;
pub mod catalog;
pub mod product_catalog_service;
pub mod variant_matcher;

// Re-export services for convenience
pub use cart_assembly::{CartAssembler, CartProductView, CartView};
pub use cart_mutation::{CartMutationExecutor, MutationOutcome};
pub use cart_resolver::{CartAction, CartLineResolver, LineMutation};
pub use cart_service::{CartService, CartUpdate, CartUpdateOutcome};
pub use catalog::{AttributeMap, VariantDefinition, VariantPricing};
pub use product_catalog_service::{NewProduct, Product, ProductCatalogService};
