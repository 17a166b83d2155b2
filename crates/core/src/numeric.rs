//! Coercion of stored values into numbers.
//!
//! Quote records come out of storage with loosely typed columns: blanks, nulls,
//! numbers written as text, the odd stray word. Every calculator reads its inputs
//! through this module so that junk degrades to zero instead of poisoning the math.
//! The same rule covers results: a sum or product that leaves the `Decimal` range
//! comes back as zero rather than aborting the pricing run.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Converts any stored value into a decimal, yielding zero for anything that is
/// not a finite number.
pub fn safe_number(value: &Value) -> Decimal {
    parse_number(value).unwrap_or(Decimal::ZERO)
}

/// Textual counterpart of [`safe_number`].
pub fn safe_number_str(raw: &str) -> Decimal {
    parse_numeric_str(raw).unwrap_or(Decimal::ZERO)
}

/// Like [`safe_number`] but keeps "not a number" distinguishable from zero.
pub fn parse_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Null => None,
        Value::Bool(flag) => Some(if *flag { Decimal::ONE } else { Decimal::ZERO }),
        Value::Number(number) => number_to_decimal(number),
        Value::String(raw) => {
            if raw.trim().is_empty() {
                Some(Decimal::ZERO)
            } else {
                parse_numeric_str(raw)
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Reads a stored installment count. Absent, non-numeric and negative values
/// come back as `None`; fractions are truncated.
pub fn parse_count(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(_) => parse_number(value)?,
        Value::String(raw) if !raw.trim().is_empty() => parse_numeric_str(raw)?,
        _ => return None,
    };

    if number.is_sign_negative() && !number.is_zero() {
        return None;
    }
    number.trunc().to_u32()
}

pub fn parse_flag(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(_) => parse_number(value).map(|number| !number.is_zero()).unwrap_or(false),
        Value::String(raw) => {
            matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "sim" | "s")
        }
        _ => false,
    }
}

/// Product of every factor, or zero when it overflows.
pub fn checked_product(factors: &[Decimal]) -> Decimal {
    factors
        .iter()
        .try_fold(Decimal::ONE, |product, factor| product.checked_mul(*factor))
        .unwrap_or(Decimal::ZERO)
}

/// Sum of every term, or zero when it overflows. Subtract by passing a negated term.
pub fn checked_sum(terms: &[Decimal]) -> Decimal {
    terms
        .iter()
        .try_fold(Decimal::ZERO, |sum, term| sum.checked_add(*term))
        .unwrap_or(Decimal::ZERO)
}

/// `amount * rate / 100`, or zero when it overflows.
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    amount
        .checked_mul(rate)
        .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Even split of `amount` into `parts`; zero parts or overflow yield zero.
pub fn checked_share(amount: Decimal, parts: u32) -> Decimal {
    amount.checked_div(Decimal::from(parts)).unwrap_or(Decimal::ZERO)
}

fn number_to_decimal(number: &serde_json::Number) -> Option<Decimal> {
    if let Some(value) = number.as_i64() {
        return Some(Decimal::from(value));
    }
    if let Some(value) = number.as_u64() {
        return Some(Decimal::from(value));
    }
    number.as_f64().filter(|value| value.is_finite()).and_then(Decimal::from_f64)
}

fn parse_numeric_str(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // "1_000" would slip through `from_str`
    if !trimmed.chars().all(|ch| ch.is_ascii_digit() || matches!(ch, '+' | '-' | '.' | 'e' | 'E')) {
        return None;
    }

    Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)).ok()
}

/// `deserialize_with` adapters applying the coercion rules at the storage
/// boundary.
pub mod lenient {
    use super::*;

    pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(safe_number(&value))
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(parse_flag(&value))
    }

    pub fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(text) if !text.trim().is_empty() => Some(text),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        })
    }
}
