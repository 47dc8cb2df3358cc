//! Error types for StayDesk Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed required fields
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Check-in is not strictly before check-out
    #[error("Invalid date range: check-in {check_in} must be before check-out {check_out}")]
    InvalidRange {
        check_in: chrono::NaiveDate,
        check_out: chrono::NaiveDate,
    },

    /// A request body references a record that does not exist
    #[error("Unknown {kind} reference: {id}")]
    UnknownReference { kind: &'static str, id: String },

    /// Requested stay overlaps an existing reservation for the room
    #[error("Room {room_id} is already booked between {check_in} and {check_out}")]
    Conflict {
        room_id: String,
        check_in: chrono::NaiveDate,
        check_out: chrono::NaiveDate,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Illegal state transition or business rule violation
    #[error("{0}")]
    Domain(String),

    // Multi-tenancy errors
    #[error("Invalid tenant: {0}")]
    InvalidTenant(String),

    #[error("Tenant required: {0}")]
    TenantRequired(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable label, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Serialization(_) => "serialization",
            Error::Validation(_) => "validation",
            Error::InvalidRange { .. } => "invalid_range",
            Error::UnknownReference { .. } => "unknown_reference",
            Error::Conflict { .. } => "conflict",
            Error::NotFound { .. } => "not_found",
            Error::Domain(_) => "domain",
            Error::InvalidTenant(_) => "invalid_tenant",
            Error::TenantRequired(_) => "tenant_required",
            Error::Config(_) => "config",
            Error::Database(_) => "database",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
