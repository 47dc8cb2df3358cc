//! Loosely-typed request bodies
//!
//! Clients (including offline sync queues) send snake_case or camelCase
//! fields, and identifiers as strings or numbers. Every field is optional
//! here so missing fields surface as `Error::Validation` from the workflow
//! rather than as deserialization failures.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use staydesk_core::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequest {
    #[serde(default, deserialize_with = "id_string")]
    pub id: Option<String>,
    #[serde(default, alias = "roomId", deserialize_with = "id_string")]
    pub room_id: Option<String>,
    #[serde(default, alias = "guestId", deserialize_with = "id_string")]
    pub guest_id: Option<String>,
    #[serde(default, alias = "checkIn")]
    pub check_in: Option<String>,
    #[serde(default, alias = "checkOut")]
    pub check_out: Option<String>,
    #[serde(default, alias = "totalPrice")]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRequest {
    #[serde(default, deserialize_with = "id_string")]
    pub id: Option<String>,
    #[serde(default, alias = "bookingId", deserialize_with = "id_string")]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default, alias = "transactionId")]
    pub transaction_id: Option<String>,
}

/// Accept `"12"`, `12` or `null` for identifier fields
fn id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Raw::Int(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Treat blank strings as absent
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a stay date from `YYYY-MM-DD` or an RFC 3339 timestamp
pub(crate) fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| {
            Error::Validation(format!(
                "{} must be a date (YYYY-MM-DD), got '{}'",
                field, raw
            ))
        })
}
