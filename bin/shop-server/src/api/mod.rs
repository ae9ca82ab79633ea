pub mod cart;
pub mod deposit_settings;
pub mod orders;
pub mod products;

use crate::error::{ShopServerError, ShopServerResult};
use shop_models::ParseStatusError;
use std::str::FromStr;

/// Status fields accept either the wire tag or the console label.
fn parse_status<T>(value: &str) -> ShopServerResult<T>
where
    T: FromStr<Err = ParseStatusError>,
{
    value.parse().map_err(|e: ParseStatusError| ShopServerError::Validation {
        message: e.to_string(),
    })
}

fn require_non_empty(field: &str, value: &str) -> ShopServerResult<()> {
    if value.trim().is_empty() {
        return Err(ShopServerError::Validation {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}
