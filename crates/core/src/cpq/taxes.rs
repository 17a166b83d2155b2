use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::surcharges::Surcharges;
use crate::domain::quote::Quote;
use crate::numeric::{checked_sum, percent_of};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxes {
    pub service_tax_base: Decimal,
    pub service_tax: Decimal,
    pub material_tax_base: Decimal,
    pub material_tax: Decimal,
}

impl Taxes {
    pub fn compute(quote: &Quote, surcharges: &Surcharges) -> Self {
        let service_tax_base = service_tax_base(quote, surcharges);
        let material_tax_base = material_tax_base(quote, surcharges);

        Self {
            service_tax_base,
            service_tax: percent_of(service_tax_base, quote.imposto_servico),
            material_tax_base,
            material_tax: percent_of(material_tax_base, quote.imposto_material),
        }
    }
}

/// Labor net of its discount, plus the ancillary costs billed with it.
pub fn service_tax_base(quote: &Quote, surcharges: &Surcharges) -> Decimal {
    checked_sum(&[
        quote.valor_mao_obra,
        -quote.desconto_mdo_valor,
        surcharges.travel_cost,
        surcharges.boleto_fee_labor,
    ])
}

pub fn material_tax_base(quote: &Quote, surcharges: &Surcharges) -> Decimal {
    checked_sum(&[
        quote.valor_material,
        surcharges.financing_interest,
        surcharges.boleto_fee_material,
    ])
}

pub fn service_tax(quote: &Quote, surcharges: &Surcharges) -> Decimal {
    percent_of(service_tax_base(quote, surcharges), quote.imposto_servico)
}

pub fn material_tax(quote: &Quote, surcharges: &Surcharges) -> Decimal {
    percent_of(material_tax_base(quote, surcharges), quote.imposto_material)
}
