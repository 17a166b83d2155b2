//! Assembles the priced quote sheet the way the quote page and the print
//! view consume it: fetch the record and the live pricing settings, then run
//! the calculators over the resolved snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cpq::pricing::DeterministicPricingEngine;
use crate::cpq::{CpqRuntime, DeterministicCpqRuntime, PricingContext, QuoteEvaluation};
use crate::domain::quote::{Quote, QuoteId};
use crate::errors::{ApplicationError, DomainError};
use crate::repositories::{PricingSettingsProvider, QuoteRepository, RepositoryError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Settings,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteSheet {
    pub quote: Quote,
    pub evaluation: QuoteEvaluation,
    pub valor_por_km: Decimal,
    pub valor_por_km_source: RateSource,
}

pub struct QuoteSheetService<R, S, C = DeterministicCpqRuntime<DeterministicPricingEngine>> {
    quotes: R,
    settings: S,
    runtime: C,
    context: PricingContext,
}

impl<R, S> QuoteSheetService<R, S>
where
    R: QuoteRepository,
    S: PricingSettingsProvider,
{
    pub fn new(quotes: R, settings: S, context: PricingContext) -> Self {
        Self::with_runtime(quotes, settings, DeterministicCpqRuntime::default(), context)
    }
}

impl<R, S, C> QuoteSheetService<R, S, C>
where
    R: QuoteRepository,
    S: PricingSettingsProvider,
    C: CpqRuntime,
{
    pub fn with_runtime(quotes: R, settings: S, runtime: C, context: PricingContext) -> Self {
        Self { quotes, settings, runtime, context }
    }

    pub async fn render(&self, id: &QuoteId) -> Result<QuoteSheet, ApplicationError> {
        if id.as_str().trim().is_empty() {
            return Err(DomainError::InvariantViolation("quote id must not be blank".to_owned())
                .into());
        }

        let (quote, rate) = tokio::join!(self.quotes.find_by_id(id), self.settings.valor_por_km());

        let quote = quote.map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        let Some(quote) = quote else {
            warn!(event_name = "quote.sheet.not_found", quote_id = %id, "quote not found");
            return Err(DomainError::QuoteNotFound(id.clone()).into());
        };

        let (valor_por_km, valor_por_km_source) =
            resolve_valor_por_km(rate, self.context.valor_por_km);
        let context = PricingContext { valor_por_km, ..self.context.clone() };
        let evaluation = self.runtime.evaluate_quote(&quote, &context);

        info!(
            event_name = "quote.sheet.rendered",
            quote_id = %id,
            valor_por_km = %valor_por_km,
            labor_subtotal = %evaluation.pricing.subtotals.labor,
            material_subtotal = %evaluation.pricing.subtotals.material,
            "quote sheet rendered"
        );

        Ok(QuoteSheet { quote, evaluation, valor_por_km, valor_por_km_source })
    }
}

/// Live setting when it is usable, configured fallback otherwise.
pub fn resolve_valor_por_km(
    live: Result<Option<Decimal>, RepositoryError>,
    fallback: Decimal,
) -> (Decimal, RateSource) {
    match live {
        Ok(Some(value)) if value > Decimal::ZERO => (value, RateSource::Settings),
        Ok(Some(value)) => {
            warn!(
                event_name = "pricing.settings.invalid_rate",
                valor_por_km = %value,
                fallback = %fallback,
                "ignoring non-positive rate per km"
            );
            (fallback, RateSource::Fallback)
        }
        Ok(None) => (fallback, RateSource::Fallback),
        Err(error) => {
            warn!(
                event_name = "pricing.settings.unavailable",
                error = %error,
                fallback = %fallback,
                "pricing settings unavailable, using fallback rate per km"
            );
            (fallback, RateSource::Fallback)
        }
    }
}
