//! Tenant (company) scoping
//!
//! Every record lives inside a tenant partition. Requests carry the tenant as
//! a `company_id` query parameter; when it is absent the server runs the
//! request in the default (single-tenant) partition unless tenancy is
//! required by configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Maximum accepted length of a tenant identifier
pub const MAX_TENANT_ID_LEN: usize = 64;

/// Partition key used in storage for requests without a tenant.
pub const DEFAULT_PARTITION: &str = "default";

/// Identifier of a tenant (company) in multi-tenant deployments.
///
/// Identifiers are short opaque strings made of ASCII alphanumerics, `-`
/// and `_`, so they can be embedded in storage keys and URLs unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Parse a tenant ID from a string
    pub fn from_string(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidTenant("tenant ID must not be empty".to_string()));
        }
        if s.len() > MAX_TENANT_ID_LEN {
            return Err(Error::InvalidTenant(format!(
                "tenant ID longer than {} characters",
                MAX_TENANT_ID_LEN
            )));
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(Error::InvalidTenant(format!(
                "invalid character {:?} in tenant ID",
                bad
            )));
        }
        if s == DEFAULT_PARTITION {
            return Err(Error::InvalidTenant(format!(
                "'{}' is reserved",
                DEFAULT_PARTITION
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl TryFrom<String> for TenantId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::from_string(&s)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// Storage partition key for an optional tenant
pub fn partition_key(tenant_id: Option<&TenantId>) -> &str {
    tenant_id.map(TenantId::as_str).unwrap_or(DEFAULT_PARTITION)
}
