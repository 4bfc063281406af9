//! Persistence models for the catalog and carts.

pub mod cart;
pub mod cart_item;
pub mod product;
