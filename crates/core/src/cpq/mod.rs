pub mod installments;
pub mod pricing;
pub mod subtotals;
pub mod surcharges;
pub mod taxes;
pub mod validity;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::Quote;
use crate::format::{CurrencyFormat, DEFAULT_DATE_FORMAT};

use self::{
    installments::{describe_labor, describe_material},
    pricing::{DeterministicPricingEngine, PricingEngine, PricingResult},
    validity::{calculate_validity_date, DEFAULT_VALIDITY_DAYS},
};

/// Fallback rate per kilometre when pricing settings are unavailable.
pub const DEFAULT_VALOR_POR_KM: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

pub(crate) const ROUND_TRIP: Decimal = Decimal::TWO;

/// Everything outside the quote record that the calculators depend on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricingContext {
    pub valor_por_km: Decimal,
    pub validity_days: u32,
    pub currency: CurrencyFormat,
    pub date_format: String,
}

impl Default for PricingContext {
    fn default() -> Self {
        Self {
            valor_por_km: DEFAULT_VALOR_POR_KM,
            validity_days: DEFAULT_VALIDITY_DAYS,
            currency: CurrencyFormat::default(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl PricingContext {
    pub fn with_valor_por_km(valor_por_km: Decimal) -> Self {
        Self { valor_por_km, ..Self::default() }
    }
}

/// What the quote page and the printed budget show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteEvaluation {
    pub pricing: PricingResult,
    pub labor_payment: String,
    pub material_payment: String,
    pub valid_until: Option<String>,
}

pub trait CpqRuntime: Send + Sync {
    fn evaluate_quote(&self, quote: &Quote, context: &PricingContext) -> QuoteEvaluation;
}

pub struct DeterministicCpqRuntime<P> {
    pricing_engine: P,
}

impl<P> DeterministicCpqRuntime<P> {
    pub fn new(pricing_engine: P) -> Self {
        Self { pricing_engine }
    }
}

impl Default for DeterministicCpqRuntime<DeterministicPricingEngine> {
    fn default() -> Self {
        Self::new(DeterministicPricingEngine)
    }
}

impl<P> CpqRuntime for DeterministicCpqRuntime<P>
where
    P: PricingEngine,
{
    fn evaluate_quote(&self, quote: &Quote, context: &PricingContext) -> QuoteEvaluation {
        let pricing = self.pricing_engine.price(quote, context.valor_por_km);

        let labor_payment =
            describe_labor(pricing.subtotals.labor, quote.parcelamento_mdo, &context.currency);
        let material_payment = describe_material(
            pricing.subtotals.material,
            quote.parcelamento_material,
            quote.material_a_vista,
            &context.currency,
        );
        let valid_until = quote.data_orcamento.as_deref().and_then(|raw| {
            calculate_validity_date(raw, context.validity_days, &context.date_format)
        });

        QuoteEvaluation { pricing, labor_payment, material_payment, valid_until }
    }
}
