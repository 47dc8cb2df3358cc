//! Shared handler state and request extractors

use axum::{
    extract::{FromRequest, FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;
use staydesk_booking::BookingService;
use staydesk_core::{Error, TenantId};
use staydesk_observability::Metrics;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub service: BookingService,
    pub metrics: Arc<Metrics>,
    /// Reject requests that carry no `company_id`
    pub require_tenant: bool,
}

impl AppState {
    pub fn new(service: BookingService, metrics: Arc<Metrics>) -> Self {
        Self {
            service,
            metrics,
            require_tenant: false,
        }
    }

    pub fn with_require_tenant(mut self, require_tenant: bool) -> Self {
        self.require_tenant = require_tenant;
        self
    }

    /// Count the request and its latency, or the failure by error kind
    pub(crate) fn observe<T>(
        &self,
        operation: &str,
        started: Instant,
        result: &ApiResult<T>,
    ) {
        match result {
            Ok(_) => self
                .metrics
                .record_request(operation, started.elapsed().as_secs_f64()),
            Err(err) => {
                if matches!(err, ApiError::Core(Error::Conflict { .. })) {
                    self.metrics.record_conflict();
                }
                self.metrics.record_failure(operation, err.kind());
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompanyQuery {
    #[serde(default, alias = "companyId")]
    company_id: Option<String>,
}

/// Tenant scope taken from the `?company_id=` query parameter
#[derive(Debug, Clone, Default)]
pub struct Tenant(pub Option<TenantId>);

impl Tenant {
    pub fn id(&self) -> Option<&TenantId> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for Tenant {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<CompanyQuery>::from_request_parts(parts, state).await?;
        let tenant = query
            .company_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TenantId::from_string)
            .transpose()?;

        if tenant.is_none() && state.require_tenant {
            return Err(Error::TenantRequired("company_id query parameter is required".to_string()).into());
        }
        Ok(Tenant(tenant))
    }
}

/// JSON body extractor whose rejections use the API error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
