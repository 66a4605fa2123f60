/// Fixed-point mileage amounts as reported by the shop ledger.
///
/// Amounts travel as decimal strings in the smallest unit. For display they
/// are scaled by a fixed exponent (9 for the point currency).
use crate::errors::{WalletError, WalletResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AmountValue {
    /// Magnitude in the smallest unit
    base_units: u128,
    /// Decimal exponent applied when displaying
    decimals: u8,
}

impl AmountValue {
    /// Exponent used by the mileage currency
    pub const MILEAGE_DECIMALS: u8 = 9;
    /// Largest exponent whose scale still fits in a u128
    pub const MAX_DECIMALS: u8 = 38;

    pub fn new(base_units: u128, decimals: u8) -> WalletResult<Self> {
        if decimals > Self::MAX_DECIMALS {
            return Err(WalletError::InvalidAmount(format!(
                "Unsupported decimal exponent {}",
                decimals
            )));
        }
        Ok(AmountValue {
            base_units,
            decimals,
        })
    }

    /// Parse a smallest-unit integer string such as `"1500000000"`.
    pub fn from_base_units_str(value: &str, decimals: u8) -> WalletResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(WalletError::InvalidAmount(
                "Amount cannot be empty".to_string(),
            ));
        }
        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(WalletError::InvalidAmount(format!(
                "Invalid number format: {}",
                trimmed
            )));
        }

        let base_units = trimmed
            .parse::<u128>()
            .map_err(|_| WalletError::InvalidAmount("Amount overflow".to_string()))?;
        Self::new(base_units, decimals)
    }

    pub fn base_units(&self) -> u128 {
        self.base_units
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.base_units == 0
    }

    /// Whole part, a point, then the fraction with trailing zeros removed.
    /// The fraction is always present (`"3.0"`), so callers can cut it
    /// with [`crate::format::to_fix`].
    pub fn to_display_string(&self) -> String {
        if self.decimals == 0 {
            return format!("{}.0", self.base_units);
        }

        let scale = 10_u128.pow(self.decimals as u32);
        let whole = self.base_units / scale;
        let fractional = self.base_units % scale;
        let frac_str = format!("{:0width$}", fractional, width = self.decimals as usize);
        let frac_str = frac_str.trim_end_matches('0');
        if frac_str.is_empty() {
            format!("{}.0", whole)
        } else {
            format!("{}.{}", whole, frac_str)
        }
    }
}

impl fmt::Display for AmountValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}
