use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::quote::{Quote, QuoteId};

pub mod memory;

pub use memory::{InMemoryQuoteRepository, StaticPricingSettings};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn save(&self, quote: Quote) -> Result<(), RepositoryError>;
}

/// Source of the live rate per kilometre. `Ok(None)` means the setting has
/// never been stored.
#[async_trait]
pub trait PricingSettingsProvider: Send + Sync {
    async fn valor_por_km(&self) -> Result<Option<Decimal>, RepositoryError>;
}
