// 2.0: fixed point math. every economic quantity in the engine is a Decimal
// normalized to 18 fraction digits, and every transcendental op here rounds
// in a stated direction so callers can pick the side that favors the protocol.
// 2.1 exp, 2.2 log, 2.3 pow, 2.4 sub_floor/sqrt.

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use thiserror::Error;

/// Fraction digits carried by all fixed point results.
pub const FIXED_DECIMALS: u32 = 18;

/// Largest exponent e^x can take before the result leaves the representable
/// range (Decimal tops out near 7.9e28, ln of that is ~66.5).
pub const EXP_MAX_INPUT: Decimal = dec!(66);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("exp input {0} above domain ceiling")]
    ExpOverflow(Decimal),

    #[error("log argument out of domain: value {value}, base {base}")]
    LogDomain { value: Decimal, base: Decimal },

    #[error("pow argument out of domain: base {base}, exponent {exponent}")]
    PowDomain { base: Decimal, exponent: Decimal },

    #[error("sqrt of negative value {0}")]
    SqrtDomain(Decimal),
}

fn round_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FIXED_DECIMALS, RoundingStrategy::ToPositiveInfinity)
}

fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FIXED_DECIMALS, RoundingStrategy::ToNegativeInfinity)
}

// 2.1: e^x with directional rounding. inputs past the ceiling are a hard error,
// inputs below the negative ceiling underflow to zero at 18 fraction digits.
pub fn exp_up(x: Decimal) -> Result<Decimal, MathError> {
    Ok(round_up(exp_raw(x)?))
}

pub fn exp_down(x: Decimal) -> Result<Decimal, MathError> {
    Ok(round_down(exp_raw(x)?))
}

fn exp_raw(x: Decimal) -> Result<Decimal, MathError> {
    if x > EXP_MAX_INPUT {
        return Err(MathError::ExpOverflow(x));
    }
    if x < -EXP_MAX_INPUT {
        return Ok(Decimal::ZERO);
    }
    x.checked_exp().ok_or(MathError::ExpOverflow(x))
}

// 2.2: log_base(value) = ln(value)/ln(base). both arguments must be positive
// and the base must not be 1 (zero log denominator).
pub fn log_up(value: Decimal, base: Decimal) -> Result<Decimal, MathError> {
    Ok(round_up(log_raw(value, base)?))
}

pub fn log_down(value: Decimal, base: Decimal) -> Result<Decimal, MathError> {
    Ok(round_down(log_raw(value, base)?))
}

fn log_raw(value: Decimal, base: Decimal) -> Result<Decimal, MathError> {
    let domain_err = MathError::LogDomain { value, base };
    if value <= Decimal::ZERO || base <= Decimal::ZERO || base == Decimal::ONE {
        return Err(domain_err);
    }
    let num = value.checked_ln().ok_or_else(|| domain_err.clone())?;
    let den = base.checked_ln().ok_or_else(|| domain_err.clone())?;
    num.checked_div(den).ok_or(domain_err)
}

// 2.3: base^exponent = exp(exponent * ln(base)).
// edge cases pinned: 0^e = 0 for e > 0, 0^0 = 1, 1^e = 1.
pub fn pow_up(base: Decimal, exponent: Decimal) -> Result<Decimal, MathError> {
    Ok(round_up(pow_raw(base, exponent)?))
}

pub fn pow_down(base: Decimal, exponent: Decimal) -> Result<Decimal, MathError> {
    Ok(round_down(pow_raw(base, exponent)?))
}

fn pow_raw(base: Decimal, exponent: Decimal) -> Result<Decimal, MathError> {
    if base == Decimal::ONE || exponent.is_zero() {
        return Ok(Decimal::ONE);
    }
    if base.is_zero() {
        if exponent > Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        // 0^negative has no finite value
        return Err(MathError::PowDomain { base, exponent });
    }
    if base < Decimal::ZERO {
        return Err(MathError::PowDomain { base, exponent });
    }
    let ln_base = base
        .checked_ln()
        .ok_or(MathError::PowDomain { base, exponent })?;
    let arg = exponent
        .checked_mul(ln_base)
        .ok_or(MathError::ExpOverflow(exponent))?;
    exp_raw(arg)
}

// 2.4: saturating subtraction. pnl floors and aggregate removals use this so
// rounding dust can never drive a balance negative.
pub fn sub_floor(a: Decimal, b: Decimal) -> Decimal {
    if a > b {
        a - b
    } else {
        Decimal::ZERO
    }
}

pub fn sqrt(x: Decimal) -> Result<Decimal, MathError> {
    x.sqrt().ok_or(MathError::SqrtDomain(x))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Decimal, b: Decimal, tol: Decimal) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn exp_of_zero_is_one() {
        assert_eq!(exp_up(Decimal::ZERO).unwrap(), Decimal::ONE);
        assert_eq!(exp_down(Decimal::ZERO).unwrap(), Decimal::ONE);
    }

    #[test]
    fn exp_rounding_direction() {
        let x = dec!(1);
        let up = exp_up(x).unwrap();
        let down = exp_down(x).unwrap();
        assert!(up >= down);
        assert!(close(down, dec!(2.718281828459045235), dec!(0.000001)));
    }

    #[test]
    fn exp_negative_is_reciprocal() {
        let up = exp_up(dec!(-1)).unwrap();
        assert!(close(up, dec!(0.367879441171442322), dec!(0.000001)));
    }

    #[test]
    fn exp_past_ceiling_fails() {
        assert!(matches!(exp_up(dec!(67)), Err(MathError::ExpOverflow(_))));
        assert!(matches!(exp_down(dec!(100)), Err(MathError::ExpOverflow(_))));
    }

    #[test]
    fn exp_deep_negative_underflows_to_zero() {
        assert_eq!(exp_down(dec!(-100)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn log_of_power() {
        let l = log_down(dec!(8), dec!(2)).unwrap();
        assert!(close(l, dec!(3), dec!(0.000001)));
        assert!(log_up(dec!(8), dec!(2)).unwrap() >= l);
    }

    #[test]
    fn log_rejects_zero_arguments() {
        assert!(log_down(Decimal::ZERO, dec!(2)).is_err());
        assert!(log_down(dec!(2), Decimal::ZERO).is_err());
        assert!(log_down(dec!(2), Decimal::ONE).is_err());
    }

    #[test]
    fn pow_edge_cases() {
        assert_eq!(pow_up(Decimal::ZERO, dec!(3)).unwrap(), Decimal::ZERO);
        assert_eq!(pow_up(Decimal::ZERO, Decimal::ZERO).unwrap(), Decimal::ONE);
        assert_eq!(pow_up(Decimal::ONE, dec!(17.5)).unwrap(), Decimal::ONE);
        assert!(pow_up(Decimal::ZERO, dec!(-1)).is_err());
        assert!(pow_up(dec!(-2), dec!(2)).is_err());
    }

    #[test]
    fn pow_matches_exp_log_composition() {
        let p = pow_down(dec!(1.0001), dec!(100)).unwrap();
        // 1.0001^100 ~ 1.01005
        assert!(close(p, dec!(1.010050), dec!(0.00001)));
    }

    #[test]
    fn sub_floor_clamps_at_zero() {
        assert_eq!(sub_floor(dec!(5), dec!(3)), dec!(2));
        assert_eq!(sub_floor(dec!(3), dec!(5)), Decimal::ZERO);
        assert_eq!(sub_floor(dec!(3), dec!(3)), Decimal::ZERO);
    }

    #[test]
    fn sqrt_of_negative_fails() {
        assert_eq!(sqrt(dec!(9)).unwrap(), dec!(3));
        assert!(sqrt(dec!(-1)).is_err());
    }
}
