use thiserror::Error;

use crate::domain::quote::QuoteId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("quote `{0}` was not found")]
    QuoteNotFound(QuoteId),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "Não foi possível processar a solicitação. Revise os dados."
            }
            Self::NotFound { .. } => "Orçamento não encontrado.",
            Self::ServiceUnavailable { .. } => {
                "Serviço temporariamente indisponível. Tente novamente em instantes."
            }
            Self::Internal { .. } => "Ocorreu um erro interno inesperado.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(DomainError::QuoteNotFound(id)) => Self::NotFound {
                message: format!("quote `{id}` was not found"),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Domain(DomainError::InvariantViolation(_)) => Self::BadRequest {
                message: "domain validation failed".to_owned(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::quote::QuoteId;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};

    #[test]
    fn missing_quote_maps_to_not_found() {
        let interface =
            ApplicationError::from(DomainError::QuoteNotFound(QuoteId("ORC-404".to_owned())))
                .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::NotFound { ref message, ref correlation_id }
                if message.contains("ORC-404") && correlation_id == "req-1"
        ));
        assert_eq!(interface.user_message(), "Orçamento não encontrado.");
    }

    #[test]
    fn invariant_violation_maps_to_bad_request() {
        let interface = ApplicationError::from(DomainError::InvariantViolation(
            "missing quote id".to_owned(),
        ))
        .into_interface("req-2");

        assert!(matches!(interface, InterfaceError::BadRequest { .. }));
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface =
            ApplicationError::Persistence("quote store offline".to_owned()).into_interface("req-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(
            interface.user_message(),
            "Serviço temporariamente indisponível. Tente novamente em instantes."
        );
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = ApplicationError::Configuration("valor_por_km must be positive".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "Ocorreu um erro interno inesperado.");
    }
}
