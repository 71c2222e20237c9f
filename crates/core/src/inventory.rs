//! Input rules for products and sales.

/// Maximum product name length.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Maximum unit label length (e.g. `pcs`, `box`, `kg`).
pub const MAX_UNIT_LEN: usize = 20;

/// Upper bound for a stock level or a single sale. Stock is an `INTEGER`
/// column, so this leaves headroom for units returned by deleted sales.
pub const MAX_STOCK_QUANTITY: i32 = 1_000_000_000;

/// Validate the editable fields of a product.
pub fn validate_product_fields(name: &str, unit: &str, quantity: i32) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty".into());
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(format!(
            "name must be at most {MAX_PRODUCT_NAME_LEN} characters"
        ));
    }
    if unit.trim().is_empty() {
        return Err("unit must not be empty".into());
    }
    if unit.chars().count() > MAX_UNIT_LEN {
        return Err(format!("unit must be at most {MAX_UNIT_LEN} characters"));
    }
    if quantity < 0 {
        return Err(format!("quantity must not be negative, got {quantity}"));
    }
    if quantity > MAX_STOCK_QUANTITY {
        return Err(format!(
            "quantity must be at most {MAX_STOCK_QUANTITY}, got {quantity}"
        ));
    }
    Ok(())
}

/// A sale must move at least one unit.
pub fn validate_sale_quantity(quantity: i32) -> Result<(), String> {
    if quantity <= 0 {
        return Err(format!("quantity must be greater than 0, got {quantity}"));
    }
    if quantity > MAX_STOCK_QUANTITY {
        return Err(format!(
            "quantity must be at most {MAX_STOCK_QUANTITY}, got {quantity}"
        ));
    }
    Ok(())
}

/// Whether `available` units cover a sale of `requested` units.
pub fn covers(available: i32, requested: i32) -> bool {
    requested <= available
}
