use super::catalog::{AttributeMap, VariantDefinition, VariantPricing};
use crate::errors::ServiceError;
use metrics::counter;
use tracing::{debug, error};

/// Rejects attribute selections whose shape cannot fit the catalog.
///
/// A product without variants takes no attributes, and a product with
/// variants requires them.
pub fn check_attribute_shape(
    definitions: &[VariantDefinition],
    requested: &AttributeMap,
) -> Result<(), ServiceError> {
    match (definitions.is_empty(), requested.is_empty()) {
        (true, false) => Err(ServiceError::InvalidRequest(
            "product has no variants; variant attributes are not allowed".to_string(),
        )),
        (false, true) => Err(ServiceError::InvalidRequest(
            "variant attributes are required for this product".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Finds the definition matching `requested` and returns its pricing.
///
/// Definitions are scanned in stored order and the first hit wins. Returns
/// `Ok(None)` for a product without variants and an empty selection.
pub fn match_variant(
    definitions: &[VariantDefinition],
    requested: &AttributeMap,
) -> Result<Option<VariantPricing>, ServiceError> {
    check_attribute_shape(definitions, requested)?;
    if definitions.is_empty() {
        return Ok(None);
    }

    let Some((position, definition)) = definitions
        .iter()
        .enumerate()
        .find(|(_, definition)| definition.matches(requested))
    else {
        counter!("storefront_cart.variant_not_found", 1);
        debug!(?requested, "no variant matches requested attributes");
        return Err(ServiceError::VariantNotFound(format!(
            "no variant matches {}",
            describe(requested)
        )));
    };

    definition.pricing().map(Some).map_err(|reason| {
        counter!("storefront_cart.catalog_corrupt", 1);
        error!(
            variant_position = position,
            %reason,
            "matched variant has unusable pricing"
        );
        ServiceError::CatalogCorrupt(format!("variant #{}: {}", position, reason))
    })
}

fn describe(requested: &AttributeMap) -> String {
    let pairs: Vec<String> = requested
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect();
    format!("{{{}}}", pairs.join(", "))
}
