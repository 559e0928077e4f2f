//! Field rules shared by every entity. Lengths count characters, not bytes.

use rust_decimal::Decimal;

use crate::errors::ModelError;

pub const NAME_MAX: usize = 50;
pub const SKU_MAX: usize = 20;
pub const DESCRIPTION_MAX: usize = 50;
pub const IMAGE_MAX: usize = 50;

/// Field must be non-blank and at most `max` characters long.
pub fn required(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ModelError::Validation(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

/// Largest price every backend's price column can hold: 14 integer digits, 2 decimals.
pub fn price_max() -> Decimal {
    Decimal::new(9_999_999_999_999_999, 2)
}

pub fn at_most(field: &str, value: Decimal, max: Decimal) -> Result<(), ModelError> {
    if value > max {
        return Err(ModelError::Validation(format!("{field} must be at most {max}")));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: Decimal) -> Result<(), ModelError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ModelError::Validation(format!("{field} must not be negative")));
    }
    Ok(())
}
