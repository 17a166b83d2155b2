use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY_SYMBOL: &str = "R$";
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Locale knobs for money rendering. Defaults to Brazilian Real.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
        }
    }
}

impl CurrencyFormat {
    pub fn with_symbol(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), ..Self::default() }
    }

    pub fn format(&self, value: Decimal) -> String {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = format!("{:.2}", rounded.abs());
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

        let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
        for (index, ch) in integer.chars().enumerate() {
            if index > 0 && (integer.len() - index) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }

        let sign = if negative { "-" } else { "" };
        format!("{sign}{} {grouped}{}{fraction}", self.symbol, self.decimal_separator)
    }
}

pub fn format_brl(value: Decimal) -> String {
    CurrencyFormat::default().format(value)
}

/// `None` when the pattern is malformed or asks for fields a calendar date
/// does not carry (`%H`, `%M`, `%z`).
pub fn format_date(date: NaiveDate, pattern: &str) -> Option<String> {
    let mut rendered = String::new();
    write!(rendered, "{}", date.format(pattern)).ok()?;
    Some(rendered)
}
