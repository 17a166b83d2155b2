use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::ROUND_TRIP;
use crate::domain::quote::Quote;
use crate::numeric::{checked_product, checked_sum, percent_of};

/// Ancillary costs added on top of the raw labor and material values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surcharges {
    pub travel_cost: Decimal,
    pub financing_interest: Decimal,
    pub boleto_fee_labor: Decimal,
    pub boleto_fee_material: Decimal,
}

impl Surcharges {
    pub fn compute(quote: &Quote, valor_por_km: Decimal) -> Self {
        Self {
            travel_cost: travel_cost(quote, valor_por_km),
            financing_interest: financing_interest(quote),
            boleto_fee_labor: boleto_fee_labor(quote),
            boleto_fee_material: boleto_fee_material(quote),
        }
    }
}

/// Round trip to the site, once per billable day.
pub fn travel_cost(quote: &Quote, valor_por_km: Decimal) -> Decimal {
    checked_product(&[quote.distancia_km, ROUND_TRIP, valor_por_km, quote.prazo_dias])
}

/// Flat interest on the material value, charged once for every installment
/// beyond the first across both payment lines. Labor value is never financed.
pub fn financing_interest(quote: &Quote) -> Decimal {
    let extra_installments = checked_sum(&[
        Decimal::from(quote.parcelamento_mdo.multiplier()),
        Decimal::from(quote.parcelamento_material.multiplier()),
        -Decimal::ONE,
    ]);

    percent_of(checked_product(&[extra_installments, quote.valor_material]), quote.juros_am)
}

pub fn boleto_fee_labor(quote: &Quote) -> Decimal {
    checked_product(&[Decimal::from(quote.parcelamento_mdo.multiplier()), quote.valor_boleto])
}

pub fn boleto_fee_material(quote: &Quote) -> Decimal {
    checked_product(&[Decimal::from(quote.parcelamento_material.multiplier()), quote.valor_boleto])
}
