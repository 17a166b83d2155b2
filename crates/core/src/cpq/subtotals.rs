use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::surcharges::Surcharges;
use crate::cpq::taxes::Taxes;
use crate::domain::quote::Quote;
use crate::numeric::checked_sum;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtotals {
    pub labor: Decimal,
    pub material: Decimal,
}

impl Subtotals {
    pub fn compute(quote: &Quote, surcharges: &Surcharges, taxes: &Taxes) -> Self {
        Self {
            labor: labor_subtotal(quote, surcharges, taxes),
            material: material_subtotal(quote, surcharges, taxes),
        }
    }

    pub fn combined(&self) -> Decimal {
        checked_sum(&[self.labor, self.material])
    }
}

/// Zero when the labor line is not billed at all.
pub fn labor_subtotal(quote: &Quote, surcharges: &Surcharges, taxes: &Taxes) -> Decimal {
    if quote.parcelamento_mdo.is_not_billed() {
        return Decimal::ZERO;
    }

    checked_sum(&[
        quote.valor_mao_obra,
        -quote.desconto_mdo_valor,
        surcharges.travel_cost,
        surcharges.boleto_fee_labor,
        taxes.service_tax,
    ])
}

/// Travel normally rides on the labor line; when labor is not billed it moves
/// here so it is still charged.
pub fn material_subtotal(quote: &Quote, surcharges: &Surcharges, taxes: &Taxes) -> Decimal {
    let moved_travel = if quote.parcelamento_mdo.is_not_billed() {
        surcharges.travel_cost
    } else {
        Decimal::ZERO
    };

    checked_sum(&[
        quote.valor_material,
        surcharges.financing_interest,
        surcharges.boleto_fee_material,
        taxes.material_tax,
        moved_travel,
    ])
}
