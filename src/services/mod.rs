//! Business services: the cart engine and the product catalog.

pub mod commerce;
