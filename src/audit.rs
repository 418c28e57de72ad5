use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Mutations that leave a row in `audit_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    BookingCreate,
    BookingUpdate,
    BookingConfirm,
    BookingCancel,
    BookingCheckIn,
    BookingCheckOut,
    BookingPaymentStatus,
    CustomerCreate,
    InvoiceCreate,
    InvoiceItemAdd,
    PaymentAdd,
    UserCreate,
    UserLogin,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::BookingCreate => "booking_create",
            AuditAction::BookingUpdate => "booking_update",
            AuditAction::BookingConfirm => "booking_confirm",
            AuditAction::BookingCancel => "booking_cancel",
            AuditAction::BookingCheckIn => "booking_check_in",
            AuditAction::BookingCheckOut => "booking_check_out",
            AuditAction::BookingPaymentStatus => "booking_payment_status",
            AuditAction::CustomerCreate => "customer_create",
            AuditAction::InvoiceCreate => "invoice_create",
            AuditAction::InvoiceItemAdd => "invoice_item_add",
            AuditAction::PaymentAdd => "payment_add",
            AuditAction::UserCreate => "user_create",
            AuditAction::UserLogin => "user_login",
        }
    }

    /// Table the action touches.
    pub fn resource(&self) -> &'static str {
        match self {
            AuditAction::BookingCreate
            | AuditAction::BookingUpdate
            | AuditAction::BookingConfirm
            | AuditAction::BookingCancel
            | AuditAction::BookingCheckIn
            | AuditAction::BookingCheckOut
            | AuditAction::BookingPaymentStatus => "bookings",
            AuditAction::CustomerCreate => "customers",
            AuditAction::InvoiceCreate | AuditAction::InvoiceItemAdd => "invoices",
            AuditAction::PaymentAdd => "payments",
            AuditAction::UserCreate | AuditAction::UserLogin => "users",
        }
    }
}

async fn insert_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Value,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit rows are written after the business transaction commits; a failed
/// write is logged and otherwise ignored. `user_id` is `None` for guests and
/// payment callbacks.
pub async fn record(pool: &DbPool, user_id: Option<Uuid>, action: AuditAction, metadata: Value) {
    if let Err(err) = insert_audit(pool, user_id, action, metadata).await {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stay_actions_are_filed_under_bookings() {
        for action in [
            AuditAction::BookingCheckIn,
            AuditAction::BookingCheckOut,
            AuditAction::BookingPaymentStatus,
        ] {
            assert_eq!(action.resource(), "bookings");
        }
        assert_eq!(AuditAction::PaymentAdd.resource(), "payments");
        assert_eq!(AuditAction::BookingCheckOut.as_str(), "booking_check_out");
    }
}
