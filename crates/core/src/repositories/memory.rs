use std::collections::HashMap;

use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::quote::{Quote, QuoteId};

use super::{PricingSettingsProvider, QuoteRepository, RepositoryError};

#[derive(Default)]
pub struct InMemoryQuoteRepository {
    quotes: RwLock<HashMap<String, Quote>>,
}

impl InMemoryQuoteRepository {
    pub fn with_quotes(quotes: impl IntoIterator<Item = Quote>) -> Self {
        let quotes = quotes.into_iter().map(|quote| (quote.id.0.clone(), quote)).collect();
        Self { quotes: RwLock::new(quotes) }
    }

    /// Loads an export of stored quote records: either a JSON array or a
    /// single object.
    pub fn from_json(raw: &str) -> Result<Self, RepositoryError> {
        let document: Value =
            serde_json::from_str(raw).map_err(|error| RepositoryError::Decode(error.to_string()))?;

        let records = match document {
            Value::Array(records) => records,
            record @ Value::Object(_) => vec![record],
            other => {
                return Err(RepositoryError::Decode(format!(
                    "expected a quote object or an array of quotes, found `{other}`"
                )))
            }
        };

        let quotes = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value::<Quote>(record).map_err(|error| {
                    RepositoryError::Decode(format!("quote record #{index}: {error}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_quotes(quotes))
    }
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteRepository {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let quotes = self.quotes.read().await;
        Ok(quotes.get(&id.0).cloned())
    }

    async fn save(&self, quote: Quote) -> Result<(), RepositoryError> {
        let mut quotes = self.quotes.write().await;
        quotes.insert(quote.id.0.clone(), quote);
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaticPricingSettings {
    valor_por_km: Option<Decimal>,
}

impl StaticPricingSettings {
    pub fn new(valor_por_km: Option<Decimal>) -> Self {
        Self { valor_por_km }
    }
}

#[async_trait::async_trait]
impl PricingSettingsProvider for StaticPricingSettings {
    async fn valor_por_km(&self) -> Result<Option<Decimal>, RepositoryError> {
        Ok(self.valor_por_km)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::quote::{Installments, Quote, QuoteId};
    use crate::repositories::{
        InMemoryQuoteRepository, PricingSettingsProvider, QuoteRepository, RepositoryError,
        StaticPricingSettings,
    };

    #[tokio::test]
    async fn in_memory_quote_repository_round_trip() {
        let repository = InMemoryQuoteRepository::default();
        let quote = Quote {
            id: QuoteId("ORC-1".to_owned()),
            valor_mao_obra: Decimal::from(450),
            parcelamento_mdo: Installments::new(2),
            ..Quote::default()
        };

        repository.save(quote.clone()).await.expect("save");
        let loaded = repository.find_by_id(&quote.id).await.expect("find");
        assert_eq!(loaded, Some(quote));

        let missing = repository.find_by_id(&QuoteId("ORC-2".to_owned())).await.expect("find");
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn loads_arrays_and_single_records_from_json() {
        let many = InMemoryQuoteRepository::from_json(
            r#"[{"id": 1, "valor_material": "100"}, {"id": "2", "valor_material": null}]"#,
        )
        .expect("array export should load");
        let first = many.find_by_id(&QuoteId("1".to_owned())).await.expect("find");
        assert_eq!(first.map(|quote| quote.valor_material), Some(Decimal::from(100)));
        assert!(many.find_by_id(&QuoteId("2".to_owned())).await.expect("find").is_some());

        let single = InMemoryQuoteRepository::from_json(r#"{"id": "ORC-9"}"#)
            .expect("single record should load");
        assert!(single.find_by_id(&QuoteId("ORC-9".to_owned())).await.expect("find").is_some());
    }

    #[test]
    fn rejects_documents_that_are_not_quote_records() {
        assert!(matches!(
            InMemoryQuoteRepository::from_json("42"),
            Err(RepositoryError::Decode(_))
        ));
        assert!(matches!(
            InMemoryQuoteRepository::from_json(r#"[{"valor_material": 10}]"#),
            Err(RepositoryError::Decode(message)) if message.contains("#0")
        ));
        assert!(matches!(
            InMemoryQuoteRepository::from_json("not json"),
            Err(RepositoryError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn static_settings_return_configured_rate() {
        let settings = StaticPricingSettings::new(Some(Decimal::new(175, 2)));
        assert_eq!(settings.valor_por_km().await, Ok(Some(Decimal::new(175, 2))));
        assert_eq!(StaticPricingSettings::default().valor_por_km().await, Ok(None));
    }
}
