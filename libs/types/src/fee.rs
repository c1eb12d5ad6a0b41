//! Fee calculation types
//!
//! Fee rates are expressed in parts-per-million of the gross amount and
//! always round the fee down.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::NumericError;
use crate::numeric::mul_div;

/// Denominator for every percentage-style rate (1_000_000 = 100%).
pub const PERCENT_DENOMINATOR: u128 = 1_000_000;

/// Operation a fee was charged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeType {
    /// Vault deposit (base asset in, vault units out)
    DepositFee,
    /// Vault withdrawal (vault units in, base asset out)
    WithdrawFee,
    /// Claim-token redemption on a market
    RedemptionFee,
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeeType::DepositFee => "deposit",
            FeeType::WithdrawFee => "withdraw",
            FeeType::RedemptionFee => "redemption",
        };
        f.write_str(label)
    }
}

/// A fee rate in parts-per-million.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeeRate(u32);

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate(0);

    /// Default immutable ceiling for vault and market fees: 10%.
    pub const DEFAULT_LIMIT: FeeRate = FeeRate(100_000);

    pub const fn from_ppm(ppm: u32) -> Self {
        Self(ppm)
    }

    /// Convenience constructor from basis points (1 bp = 100 ppm).
    /// Saturates at `u32::MAX` ppm.
    pub const fn from_bps(bps: u32) -> Self {
        Self(bps.saturating_mul(100))
    }

    pub const fn ppm(&self) -> u32 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Fee owed on `amount`, rounded down.
    pub fn fee_on(&self, amount: u128) -> Result<u128, NumericError> {
        mul_div(amount, u128::from(self.0), PERCENT_DENOMINATOR)
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ppm", self.0)
    }
}

/// Fee split of a gross amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub amount_before_fee: u128,
    pub fee: u128,
    pub amount_after_fee: u128,
}

impl FeeSplit {
    /// Split `gross` under `rate`. The fee never exceeds the gross amount
    /// because rates are bounded by 100%.
    pub fn compute(gross: u128, rate: FeeRate) -> Result<Self, NumericError> {
        let fee = rate.fee_on(gross)?;
        let amount_after_fee = gross.checked_sub(fee).ok_or(NumericError::Overflow)?;
        Ok(Self {
            amount_before_fee: gross,
            fee,
            amount_after_fee,
        })
    }

    /// A positive rate that rounds the fee down to zero lets dust operations
    /// skip the fee hook entirely.
    pub fn is_dust(&self, rate: FeeRate) -> bool {
        !rate.is_zero() && self.fee == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_rate_calculation() {
        let rate = FeeRate::from_ppm(25_000); // 2.5%
        assert_eq!(rate.fee_on(100_000).unwrap(), 2_500);
        assert_eq!(rate.fee_on(39).unwrap(), 0);
    }

    #[test]
    fn test_from_bps() {
        assert_eq!(FeeRate::from_bps(50), FeeRate::from_ppm(5_000));
    }

    #[test]
    fn test_from_bps_saturates() {
        assert_eq!(FeeRate::from_bps(u32::MAX).ppm(), u32::MAX);
        assert_eq!(FeeRate::from_bps(u32::MAX / 100 + 1).ppm(), u32::MAX);
    }

    #[test]
    fn test_fee_split() {
        let split = FeeSplit::compute(1_000, FeeRate::from_ppm(10_000)).unwrap();
        assert_eq!(split.fee, 10);
        assert_eq!(split.amount_after_fee, 990);
        assert!(!split.is_dust(FeeRate::from_ppm(10_000)));
    }

    #[test]
    fn test_fee_split_dust() {
        let rate = FeeRate::from_ppm(10_000);
        let split = FeeSplit::compute(99, rate).unwrap();
        assert_eq!(split.fee, 0);
        assert!(split.is_dust(rate));
        assert!(!split.is_dust(FeeRate::ZERO));
    }

    #[test]
    fn test_fee_type_serialization() {
        let json = serde_json::to_string(&FeeType::RedemptionFee).unwrap();
        assert_eq!(json, "\"REDEMPTION_FEE\"");
    }
}
