pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod format;
pub mod numeric;
pub mod repositories;
pub mod service;

pub use cpq::pricing::{DeterministicPricingEngine, PricingEngine, PricingResult};
pub use cpq::{CpqRuntime, DeterministicCpqRuntime, PricingContext, QuoteEvaluation};
pub use domain::quote::{Installments, Quote, QuoteId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use numeric::safe_number;
pub use service::{QuoteSheet, QuoteSheetService, RateSource};
