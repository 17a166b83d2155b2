//! Payment-plan wording shown next to each subtotal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::Installments;
use crate::format::CurrencyFormat;
use crate::numeric::checked_share;

pub const NOT_CHARGED: &str = "Sem cobrança";
pub const CASH: &str = "À vista";
pub const THIRTY_DAYS: &str = "30dd";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentLine {
    Labor,
    Material,
}

pub fn describe_installments(
    line: PaymentLine,
    subtotal: Decimal,
    installments: Installments,
    cash_override: bool,
    currency: &CurrencyFormat,
) -> String {
    if installments.is_not_billed() {
        return NOT_CHARGED.to_string();
    }

    let count = installments.multiplier();
    let cash_override = cash_override && line == PaymentLine::Material;

    if cash_override || (count == 1 && line == PaymentLine::Labor) {
        return format!("{CASH} - {}", currency.format(subtotal));
    }
    if count == 1 {
        return format!("{THIRTY_DAYS} - {}", currency.format(subtotal));
    }

    let per_installment = checked_share(subtotal, count);
    format!("{count}x de {}", currency.format(per_installment))
}

pub fn describe_labor(
    subtotal: Decimal,
    installments: Installments,
    currency: &CurrencyFormat,
) -> String {
    describe_installments(PaymentLine::Labor, subtotal, installments, false, currency)
}

pub fn describe_material(
    subtotal: Decimal,
    installments: Installments,
    paid_upfront: bool,
    currency: &CurrencyFormat,
) -> String {
    describe_installments(PaymentLine::Material, subtotal, installments, paid_upfront, currency)
}
