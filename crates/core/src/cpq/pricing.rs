use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cpq::subtotals::Subtotals;
use crate::cpq::surcharges::Surcharges;
use crate::cpq::taxes::Taxes;
use crate::domain::quote::{Quote, QuoteId};
use crate::numeric::checked_sum;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub quote_id: QuoteId,
    pub valor_por_km: Decimal,
    pub steps: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub surcharges: Surcharges,
    pub taxes: Taxes,
    pub subtotals: Subtotals,
    /// Labor plus material, less the overall discount.
    pub computed_total: Decimal,
    /// `valor_total` as stored; never recomputed here.
    pub stored_total: Decimal,
    pub trace: PricingTrace,
}

impl PricingResult {
    pub fn stored_total_matches(&self) -> bool {
        self.computed_total.round_dp(2) == self.stored_total.round_dp(2)
    }
}

pub trait PricingEngine: Send + Sync {
    fn price(&self, quote: &Quote, valor_por_km: Decimal) -> PricingResult;
}

#[derive(Default)]
pub struct DeterministicPricingEngine;

impl PricingEngine for DeterministicPricingEngine {
    fn price(&self, quote: &Quote, valor_por_km: Decimal) -> PricingResult {
        price_quote_with_trace(quote, valor_por_km)
    }
}

/// Runs surcharges, taxes and subtotals in that order.
pub fn price_quote_with_trace(quote: &Quote, valor_por_km: Decimal) -> PricingResult {
    let surcharges = Surcharges::compute(quote, valor_por_km);
    let taxes = Taxes::compute(quote, &surcharges);
    let subtotals = Subtotals::compute(quote, &surcharges, &taxes);
    let computed_total = checked_sum(&[subtotals.combined(), -quote.desconto]);

    let labor_not_billed = quote.parcelamento_mdo.is_not_billed();
    let steps = vec![
        step("travel_cost", "distancia_km * 2 * valor_por_km * prazo_dias", surcharges.travel_cost),
        step(
            "financing_interest",
            "(parcelas_mdo + parcelas_material - 1) * juros_am * valor_material / 100",
            surcharges.financing_interest,
        ),
        step("boleto_fee_labor", "parcelas_mdo * valor_boleto", surcharges.boleto_fee_labor),
        step(
            "boleto_fee_material",
            "parcelas_material * valor_boleto",
            surcharges.boleto_fee_material,
        ),
        step(
            "service_tax",
            "(valor_mao_obra - desconto_mdo_valor + travel + boleto_mdo) * imposto_servico / 100",
            taxes.service_tax,
        ),
        step(
            "material_tax",
            "(valor_material + interest + boleto_material) * imposto_material / 100",
            taxes.material_tax,
        ),
        step(
            "labor_subtotal",
            if labor_not_billed {
                "labor not billed"
            } else {
                "labor - discount + travel + boleto_mdo + service_tax"
            },
            subtotals.labor,
        ),
        step(
            "material_subtotal",
            if labor_not_billed {
                "material + interest + boleto_material + material_tax + travel"
            } else {
                "material + interest + boleto_material + material_tax"
            },
            subtotals.material,
        ),
        step("computed_total", "labor_subtotal + material_subtotal - desconto", computed_total),
    ];

    PricingResult {
        surcharges,
        taxes,
        subtotals,
        computed_total,
        stored_total: quote.valor_total,
        trace: PricingTrace { quote_id: quote.id.clone(), valor_por_km, steps },
    }
}

fn step(stage: &str, detail: &str, amount: Decimal) -> PricingTraceStep {
    PricingTraceStep { stage: stage.to_string(), detail: detail.to_string(), amount }
}
