//! Integer fixed-point helpers for token amounts
//!
//! Token amounts are raw `u128` units of a token with a fixed number of
//! decimals. All ledger math is integer math with floor rounding; `Decimal`
//! only appears at the display edge.

use rust_decimal::Decimal;

use crate::errors::NumericError;

/// Largest number of decimals a token may declare.
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// Largest scale `rust_decimal` can represent.
const MAX_DECIMAL_SCALE: u8 = 28;

const LOW_MASK: u128 = u64::MAX as u128;

/// `10^exp` with overflow detection.
pub fn pow10(exp: u32) -> Result<u128, NumericError> {
    10u128.checked_pow(exp).ok_or(NumericError::Overflow)
}

/// Full 256-bit product of two `u128` values as `(high, low)`.
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a1, a0) = (a >> 64, a & LOW_MASK);
    let (b1, b0) = (b >> 64, b & LOW_MASK);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);
    let low = (p00 & LOW_MASK) | ((mid & LOW_MASK) << 64);
    let high = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (high, low)
}

/// `floor(a * b / denominator)` computed without intermediate overflow.
///
/// Fails only when the quotient itself does not fit in a `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, NumericError> {
    if denominator == 0 {
        return Err(NumericError::DivisionByZero);
    }
    let (high, low) = widening_mul(a, b);
    if high == 0 {
        return Ok(low / denominator);
    }
    if high >= denominator {
        return Err(NumericError::Overflow);
    }

    // Shift-subtract long division of the 256-bit product.
    let mut remainder = high;
    let mut quotient = 0u128;
    for bit in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((low >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || remainder >= denominator {
            remainder = remainder.wrapping_sub(denominator);
            quotient |= 1;
        }
    }
    Ok(quotient)
}

/// Convert an amount between two precisions.
///
/// Multiplies when the target precision is higher, floor-divides when it is
/// lower and passes the amount through unchanged when they match.
pub fn scale_amount(amount: u128, from_decimals: u8, to_decimals: u8) -> Result<u128, NumericError> {
    check_decimals(from_decimals)?;
    check_decimals(to_decimals)?;

    if to_decimals > from_decimals {
        let factor = pow10(u32::from(to_decimals - from_decimals))?;
        amount.checked_mul(factor).ok_or(NumericError::Overflow)
    } else if to_decimals < from_decimals {
        let factor = pow10(u32::from(from_decimals - to_decimals))?;
        Ok(amount / factor)
    } else {
        Ok(amount)
    }
}

/// Render a raw amount as a `Decimal` in whole-token units.
pub fn to_decimal(amount: u128, decimals: u8) -> Result<Decimal, NumericError> {
    if decimals > MAX_DECIMAL_SCALE {
        return Err(NumericError::DecimalsOutOfRange { decimals });
    }
    let mantissa = i128::try_from(amount).map_err(|_| NumericError::Overflow)?;
    Decimal::try_from_i128_with_scale(mantissa, u32::from(decimals))
        .map_err(|_| NumericError::Overflow)
}

/// Ratio `numerator / denominator` as a `Decimal`, truncated to 18 places.
pub fn ratio_to_decimal(numerator: u128, denominator: u128) -> Result<Decimal, NumericError> {
    let scaled = mul_div(numerator, pow10(18)?, denominator)?;
    to_decimal(scaled, 18)
}

fn check_decimals(decimals: u8) -> Result<(), NumericError> {
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(NumericError::DecimalsOutOfRange { decimals });
    }
    Ok(())
}
