use crate::error::ProviderError;
use alloy_primitives::{U256, utils};

/// Number of decimals of ether: 1 ether is `10^18` wei.
pub const ETHER_DECIMALS: u8 = 18;

/// parse a JSON-RPC quantity (`0x` prefixed, no leading zeros required)
pub fn from_quantity(quantity: &str) -> Result<U256, ProviderError> {
    let digits = quantity
        .strip_prefix("0x")
        .filter(|digits| !digits.is_empty())
        .ok_or_else(|| ProviderError::internal(format!("Invalid quantity `{quantity}'")))?;

    U256::from_str_radix(digits, 16)
        .map_err(|error| ProviderError::internal(format!("Invalid quantity `{quantity}': {error}")))
}

/// human readable decimal representation of `amount`, with `decimals` digits
/// of scale
///
/// Always keeps at least one fractional digit and drops the trailing zeros
/// after it: `2.5`, `1.0`, `0.0`.
pub fn format_units(amount: U256, decimals: u8) -> Result<String, ProviderError> {
    let formatted = utils::format_units(amount, decimals).map_err(|error| {
        ProviderError::internal(format!("Couldn't format {amount} with {decimals} decimals: {error}"))
    })?;

    let Some((whole, fraction)) = formatted.split_once('.') else {
        return Ok(format!("{formatted}.0"));
    };
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        Ok(format!("{whole}.0"))
    } else {
        Ok(format!("{whole}.{fraction}"))
    }
}

pub fn format_ether(amount: U256) -> Result<String, ProviderError> {
    format_units(amount, ETHER_DECIMALS)
}
