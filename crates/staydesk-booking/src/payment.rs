//! Queued payment processing
//!
//! Payments reference an existing booking that is not cancelled. The store
//! checks the booking in the same atomic step as the write. Recording a
//! payment leaves the booking's status untouched.

use chrono::Utc;
use serde::Deserialize;
use staydesk_core::{
    Error, Payment, PaymentStatus, ResourceKind, Result, TenantId,
    booking_store::decode,
    types::{DEFAULT_CURRENCY, new_record_id},
};
use tracing::info;

use crate::request::{PaymentRequest, present};
use crate::service::BookingService;

fn parse_currency(raw: Option<&str>) -> Result<String> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_CURRENCY.to_string());
    };
    let code = raw.to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Validation(format!(
            "currency must be a 3-letter code, got '{}'",
            raw
        )));
    }
    Ok(code)
}

fn parse_payment_status(raw: Option<&str>) -> Result<PaymentStatus> {
    let Some(raw) = raw else {
        return Ok(PaymentStatus::default());
    };
    PaymentStatus::deserialize(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| Error::Validation(format!("unknown payment status '{}'", raw)))
}

fn positive_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::Validation(
            "amount must be a positive number".to_string(),
        ));
    }
    Ok(amount)
}

impl BookingService {
    /// Record a payment against a booking.
    ///
    /// # Errors
    /// - `Error::Validation` if `booking_id` or `amount` is missing, or the
    ///   amount is not a positive number
    /// - `Error::UnknownReference` if the booking does not exist
    /// - `Error::Domain` if the booking is cancelled
    pub async fn record_payment(
        &self,
        tenant_id: Option<&TenantId>,
        request: PaymentRequest,
    ) -> Result<Payment> {
        let booking_id = present(&request.booking_id);
        let (Some(booking_id), Some(amount)) = (booking_id, request.amount) else {
            let missing: Vec<&str> = [
                ("booking_id", booking_id.is_none()),
                ("amount", request.amount.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(Error::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };
        let amount = positive_amount(amount)?;
        let currency = parse_currency(present(&request.currency))?;
        let status = parse_payment_status(present(&request.status))?;

        let payment = Payment {
            id: present(&request.id)
                .map(str::to_string)
                .unwrap_or_else(new_record_id),
            booking_id: booking_id.to_string(),
            amount,
            currency,
            status,
            method: present(&request.method).map(str::to_string),
            transaction_id: present(&request.transaction_id).map(str::to_string),
            created_at: Utc::now(),
        };
        let (payment, booking) = self.store.insert_payment(tenant_id, payment).await?;

        info!(
            payment_id = %payment.id,
            booking_id = %payment.booking_id,
            amount = payment.amount,
            currency = %payment.currency,
            "Payment recorded"
        );
        self.notify(self.notifications.payment_received(&payment, &booking))
            .await;
        Ok(payment)
    }

    /// Merge `changes` over a stored payment and write it back.
    ///
    /// Fields absent from `changes` keep their stored value. The merged
    /// payment must still carry a positive amount and point at a booking
    /// that exists and is not cancelled.
    ///
    /// # Errors
    /// - `Error::NotFound` if the payment does not exist
    /// - `Error::Validation` for a mismatched id, a non-positive amount, or a
    ///   bad currency or status
    /// - `Error::UnknownReference` if the booking does not exist
    /// - `Error::Domain` if the booking is cancelled
    pub async fn amend_payment(
        &self,
        tenant_id: Option<&TenantId>,
        payment_id: &str,
        changes: PaymentRequest,
    ) -> Result<Payment> {
        let current: Payment = self
            .store
            .get_record(tenant_id, ResourceKind::Payments, payment_id)
            .await?
            .map(decode)
            .transpose()?
            .ok_or_else(|| Error::not_found("Payment", payment_id))?;

        if let Some(id) = present(&changes.id)
            && id != payment_id
        {
            return Err(Error::Validation(format!(
                "Body id '{}' does not match payment {}",
                id, payment_id
            )));
        }

        let mut next = current;
        if let Some(booking_id) = present(&changes.booking_id) {
            next.booking_id = booking_id.to_string();
        }
        if let Some(amount) = changes.amount {
            next.amount = positive_amount(amount)?;
        }
        if let Some(raw) = present(&changes.currency) {
            next.currency = parse_currency(Some(raw))?;
        }
        if let Some(raw) = present(&changes.status) {
            next.status = parse_payment_status(Some(raw))?;
        }
        if let Some(method) = present(&changes.method) {
            next.method = Some(method.to_string());
        }
        if let Some(transaction_id) = present(&changes.transaction_id) {
            next.transaction_id = Some(transaction_id.to_string());
        }

        let (payment, _) = self.store.replace_payment(tenant_id, next).await?;
        info!(
            payment_id,
            booking_id = %payment.booking_id,
            amount = payment.amount,
            status = ?payment.status,
            "Payment amended"
        );
        Ok(payment)
    }
}
