use thiserror::Error;

use crate::domain::cart::CartId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("cart {cart_id} has no lines to check out")]
    EmptyCart { cart_id: CartId },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures reported by store backends.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflicting concurrent modification: {0}")]
    Conflict(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("caller is not authenticated")]
    Unauthenticated,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("{resource} belongs to another user")]
    Forbidden { resource: String },
    #[error("{resource} was not found")]
    NotFound { resource: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ApplicationError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn forbidden(resource: impl Into<String>) -> Self {
        Self::Forbidden { resource: resource.into() }
    }
}

impl From<StoreError> for ApplicationError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::Backend(message) | StoreError::Decode(message) => {
                Self::Persistence(message)
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("forbidden: {message}")]
    Forbidden { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("unprocessable: {message}")]
    Unprocessable { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Unauthorized { .. } => "Authentication is required.",
            Self::Forbidden { .. } => "You do not have access to this resource.",
            Self::NotFound { .. } => "The requested resource does not exist.",
            Self::Conflict { .. } => "The resource was modified concurrently. Please retry.",
            Self::Unprocessable { .. } => "The request cannot be applied in the current state.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::Conflict { message, .. }
            | Self::Unprocessable { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unauthorized { correlation_id, .. }
            | Self::Forbidden { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::Unprocessable { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }

    /// Server-side failures whose detail must not be shown to callers.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. } | Self::Internal { .. })
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. }
            | InterfaceError::Forbidden { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Unprocessable { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Unauthenticated => {
                Self::Unauthorized { message: "Invalid token".to_owned(), correlation_id }
            }
            ApplicationError::InvalidCredentials => Self::Unauthorized {
                message: "Invalid username/password".to_owned(),
                correlation_id,
            },
            error @ ApplicationError::Forbidden { .. } => {
                Self::Forbidden { message: error.to_string(), correlation_id }
            }
            error @ ApplicationError::NotFound { .. } => {
                Self::NotFound { message: error.to_string(), correlation_id }
            }
            ApplicationError::Conflict(message) => Self::Conflict { message, correlation_id },
            ApplicationError::Domain(error @ DomainError::EmptyCart { .. }) => {
                Self::Unprocessable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Domain(DomainError::InvalidInput(message)) => {
                Self::BadRequest { message, correlation_id }
            }
            ApplicationError::Domain(error @ DomainError::InvariantViolation(_)) => {
                Self::Internal { message: error.to_string(), correlation_id }
            }
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::cart::CartId;
    use crate::errors::{ApplicationError, DomainError, InterfaceError, StoreError};

    #[test]
    fn unauthenticated_maps_to_invalid_token() {
        let interface = ApplicationError::Unauthenticated.into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::Unauthorized { ref message, ref correlation_id }
                if message == "Invalid token" && correlation_id == "req-1"
        ));
    }

    #[test]
    fn empty_cart_maps_to_unprocessable() {
        let interface =
            ApplicationError::from(DomainError::EmptyCart { cart_id: CartId(4) }).into_interface("req-2");

        assert!(matches!(interface, InterfaceError::Unprocessable { .. }));
        assert!(interface.message().contains("cart 4"));
        assert!(!interface.is_server_fault());
    }

    #[test]
    fn ownership_errors_keep_their_category() {
        let forbidden = ApplicationError::forbidden("cart 9").into_interface("req-3");
        let missing = ApplicationError::not_found("order 2").into_interface("req-4");

        assert!(matches!(forbidden, InterfaceError::Forbidden { .. }));
        assert_eq!(forbidden.message(), "cart 9 belongs to another user");
        assert!(matches!(missing, InterfaceError::NotFound { .. }));
        assert_eq!(missing.correlation_id(), "req-4");
    }

    #[test]
    fn store_conflict_surfaces_as_conflict() {
        let application = ApplicationError::from(StoreError::Conflict("cart 1 changed".to_owned()));
        assert_eq!(application, ApplicationError::Conflict("cart 1 changed".to_owned()));

        let interface = application.into_interface("req-5");
        assert!(matches!(interface, InterfaceError::Conflict { .. }));
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface = ApplicationError::from(StoreError::Backend("database is locked".to_owned()))
            .into_interface("req-6");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert!(interface.is_server_fault());
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn invariant_violation_maps_to_internal() {
        let interface = ApplicationError::from(DomainError::InvariantViolation(
            "order 3 holds 1 of 2 planned lines".to_owned(),
        ))
        .into_interface("req-7");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert!(interface.is_server_fault());
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
