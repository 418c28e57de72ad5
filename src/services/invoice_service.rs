use chrono::{Days, NaiveDate, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    config::BookingPolicy,
    db::DbPool,
    domain::{CodeKind, InvoiceStatus, InvoiceTotals, checked_sum, nights},
    dto::invoices::{
        AddInvoiceItemRequest, AddPaymentRequest, CreateInvoiceRequest, InvoiceDetail,
        InvoiceList, PaymentList, RevenueQuery, RevenueReport,
    },
    entity::{
        bookings::{Entity as Bookings, Model as BookingModel},
        customers::Entity as Customers,
        invoice_items::{
            ActiveModel as InvoiceItemActive, Column as ItemCol, Entity as InvoiceItems,
        },
        invoices::{
            ActiveModel as InvoiceActive, Column as InvoiceCol, Entity as Invoices,
            Model as InvoiceModel,
        },
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, BILLING_ROLES, CASHIER_ROLES, ensure_any_role, ensure_staff},
    response::{ApiResponse, Meta},
    routes::params::InvoiceListQuery,
    services::{
        identifier_service::next_code,
        mapping::{invoice_from_entity, invoice_item_from_entity, payment_from_entity},
    },
    state::AppState,
};

fn due_date(policy: &BookingPolicy, invoice_date: NaiveDate) -> NaiveDate {
    invoice_date
        .checked_add_days(Days::new(policy.invoice_due_days.max(0) as u64))
        .unwrap_or(invoice_date)
}

pub fn room_charge_name(room_number: &str, check_in: NaiveDate, check_out: NaiveDate) -> String {
    format!("Room {room_number} ({check_in} to {check_out})")
}

/// Bill a finished stay: one draft invoice whose subtotal is the booking
/// total, plus a single room-charge line. Runs inside the checkout
/// transaction.
pub async fn derive_on_checkout<C>(
    conn: &C,
    policy: &BookingPolicy,
    booking: &BookingModel,
    room_number: &str,
    staff_id: Option<Uuid>,
) -> AppResult<InvoiceModel>
where
    C: ConnectionTrait,
{
    let today = policy.today();
    let totals = InvoiceTotals::compute(booking.total_amount, 0, policy.vat_percent)?;
    let invoice_number = next_code(conn, CodeKind::Invoice, today).await?;

    let invoice = InvoiceActive {
        id: Set(Uuid::new_v4()),
        invoice_number: Set(invoice_number),
        customer_id: Set(booking.customer_id),
        booking_id: Set(Some(booking.id)),
        invoice_date: Set(today),
        due_date: Set(due_date(policy, today)),
        subtotal: Set(totals.subtotal),
        tax_amount: Set(totals.tax_amount),
        discount_amount: Set(totals.discount_amount),
        total_amount: Set(totals.total_amount),
        status: Set(InvoiceStatus::derive(totals.total_amount, 0).as_str().to_string()),
        notes: Set(Some(format!("Checkout of booking {}", booking.booking_code))),
        created_by: Set(staff_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;

    let stay = nights(booking.check_in_date, booking.check_out_date);
    InvoiceItemActive {
        id: Set(Uuid::new_v4()),
        invoice_id: Set(invoice.id),
        item_type: Set("room".into()),
        item_name: Set(room_charge_name(
            room_number,
            booking.check_in_date,
            booking.check_out_date,
        )),
        description: Set(Some(format!("{stay} night(s)"))),
        quantity: Set(1),
        unit_price: Set(booking.total_amount),
        total_price: Set(booking.total_amount),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;

    Ok(invoice)
}

async fn paid_amount<C>(conn: &C, invoice_id: Uuid) -> AppResult<i64>
where
    C: ConnectionTrait,
{
    let amounts: Vec<i64> = Payments::find()
        .select_only()
        .column(PaymentCol::Amount)
        .filter(PaymentCol::InvoiceId.eq(invoice_id))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(checked_sum(amounts)?)
}

async fn items_subtotal<C>(conn: &C, invoice_id: Uuid) -> AppResult<i64>
where
    C: ConnectionTrait,
{
    let totals: Vec<i64> = InvoiceItems::find()
        .select_only()
        .column(ItemCol::TotalPrice)
        .filter(ItemCol::InvoiceId.eq(invoice_id))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(checked_sum(totals)?)
}

async fn lock_invoice<C>(conn: &C, id: Uuid) -> AppResult<InvoiceModel>
where
    C: ConnectionTrait,
{
    Invoices::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Invoice"))
}

/// Re-derive the invoice status from the sum of its payments and persist it
/// when it changed. Call after every payment write, inside the same
/// transaction that holds the invoice lock.
pub async fn recompute_status<C>(conn: &C, invoice: InvoiceModel) -> AppResult<InvoiceModel>
where
    C: ConnectionTrait,
{
    let paid = paid_amount(conn, invoice.id).await?;
    let status = InvoiceStatus::derive(invoice.total_amount, paid);
    if invoice.status == status.as_str() {
        return Ok(invoice);
    }

    let mut active: InvoiceActive = invoice.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

pub async fn invoice_detail<C>(conn: &C, invoice: InvoiceModel) -> AppResult<InvoiceDetail>
where
    C: ConnectionTrait,
{
    let items = InvoiceItems::find()
        .filter(ItemCol::InvoiceId.eq(invoice.id))
        .order_by_asc(ItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(invoice_item_from_entity)
        .collect();
    let payments = Payments::find()
        .filter(PaymentCol::InvoiceId.eq(invoice.id))
        .order_by_asc(PaymentCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(payment_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let paid_amount = checked_sum(payments.iter().map(|p| p.amount))?;
    let balance = (invoice.total_amount - paid_amount).max(0);
    Ok(InvoiceDetail {
        invoice: invoice_from_entity(invoice)?,
        items,
        payments,
        paid_amount,
        balance,
    })
}

pub async fn create_invoice(
    state: &AppState,
    user: &AuthUser,
    payload: CreateInvoiceRequest,
) -> AppResult<ApiResponse<InvoiceDetail>> {
    ensure_any_role(user, BILLING_ROLES)?;
    let policy = state.policy();

    let discount = payload.discount_amount.unwrap_or(0);
    if discount < 0 {
        return Err(AppError::Validation("discount_amount cannot be negative".into()));
    }
    let invoice_date = payload.invoice_date.unwrap_or_else(|| policy.today());
    let due = payload.due_date.unwrap_or_else(|| due_date(policy, invoice_date));
    if due < invoice_date {
        return Err(AppError::Validation("due_date cannot precede invoice_date".into()));
    }

    let txn = state.orm.begin().await?;
    Customers::find_by_id(payload.customer_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    if let Some(booking_id) = payload.booking_id {
        let booking = Bookings::find_by_id(booking_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound("Booking"))?;
        if booking.customer_id != payload.customer_id {
            return Err(AppError::Validation(
                "booking belongs to a different customer".into(),
            ));
        }
    }

    let totals = InvoiceTotals::compute(0, discount, policy.vat_percent)?;
    let invoice_number = next_code(&txn, CodeKind::Invoice, policy.today()).await?;
    let invoice = InvoiceActive {
        id: Set(Uuid::new_v4()),
        invoice_number: Set(invoice_number),
        customer_id: Set(payload.customer_id),
        booking_id: Set(payload.booking_id),
        invoice_date: Set(invoice_date),
        due_date: Set(due),
        subtotal: Set(totals.subtotal),
        tax_amount: Set(totals.tax_amount),
        discount_amount: Set(totals.discount_amount),
        total_amount: Set(totals.total_amount),
        status: Set(InvoiceStatus::derive(totals.total_amount, 0).as_str().to_string()),
        notes: Set(payload.notes),
        created_by: Set(Some(user.user_id)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::InvoiceCreate,
        serde_json::json!({ "invoice_id": invoice.id, "number": invoice.invoice_number }),
    )
    .await;

    let detail = invoice_detail(&state.orm, invoice).await?;
    Ok(ApiResponse::single("Invoice created", detail))
}

/// Append a line and re-total the invoice from all of its lines.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    invoice_id: Uuid,
    payload: AddInvoiceItemRequest,
) -> AppResult<ApiResponse<InvoiceDetail>> {
    ensure_any_role(user, BILLING_ROLES)?;
    if payload.item_name.trim().is_empty() || payload.item_type.trim().is_empty() {
        return Err(AppError::Validation("item_type and item_name are required".into()));
    }
    if payload.quantity <= 0 {
        return Err(AppError::Validation("quantity must be positive".into()));
    }
    if payload.unit_price < 0 {
        return Err(AppError::Validation("unit_price cannot be negative".into()));
    }
    let line_total = payload
        .unit_price
        .checked_mul(payload.quantity as i64)
        .ok_or_else(|| AppError::Validation("line total is too large".into()))?;

    let txn = state.orm.begin().await?;
    let invoice = lock_invoice(&txn, invoice_id).await?;

    InvoiceItemActive {
        id: Set(Uuid::new_v4()),
        invoice_id: Set(invoice.id),
        item_type: Set(payload.item_type.trim().to_string()),
        item_name: Set(payload.item_name.trim().to_string()),
        description: Set(payload.description),
        quantity: Set(payload.quantity),
        unit_price: Set(payload.unit_price),
        total_price: Set(line_total),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let subtotal = items_subtotal(&txn, invoice.id).await?;
    let totals =
        InvoiceTotals::compute(subtotal, invoice.discount_amount, state.policy().vat_percent)?;
    let paid = paid_amount(&txn, invoice.id).await?;

    let mut active: InvoiceActive = invoice.into();
    active.subtotal = Set(totals.subtotal);
    active.tax_amount = Set(totals.tax_amount);
    active.total_amount = Set(totals.total_amount);
    active.status = Set(InvoiceStatus::derive(totals.total_amount, paid).as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let invoice = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::InvoiceItemAdd,
        serde_json::json!({ "invoice_id": invoice.id, "line_total": line_total }),
    )
    .await;

    let detail = invoice_detail(&state.orm, invoice).await?;
    Ok(ApiResponse::single("Item added", detail))
}

/// Record a payment against an invoice. The invoice row stays locked while
/// the paid sum is re-read, so concurrent payments cannot both pass the
/// balance check.
pub async fn add_payment(
    state: &AppState,
    user: &AuthUser,
    invoice_id: Uuid,
    payload: AddPaymentRequest,
) -> AppResult<ApiResponse<InvoiceDetail>> {
    ensure_any_role(user, CASHIER_ROLES)?;
    if payload.amount <= 0 {
        return Err(AppError::Validation("payment amount must be positive".into()));
    }
    let today = state.policy().today();

    let txn = state.orm.begin().await?;
    let invoice = lock_invoice(&txn, invoice_id).await?;
    let paid = paid_amount(&txn, invoice.id).await?;
    let remaining = (invoice.total_amount - paid).max(0);
    if payload.amount > remaining {
        return Err(AppError::Overpayment { remaining });
    }

    let payment_number = next_code(&txn, CodeKind::Payment, today).await?;
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        payment_number: Set(payment_number),
        invoice_id: Set(invoice.id),
        payment_date: Set(payload.payment_date.unwrap_or(today)),
        amount: Set(payload.amount),
        payment_method: Set(payload.payment_method.as_str().to_string()),
        reference_number: Set(payload.reference_number),
        notes: Set(payload.notes),
        processed_by: Set(Some(user.user_id)),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let invoice = recompute_status(&txn, invoice).await?;
    txn.commit().await?;

    tracing::info!(
        invoice = %invoice.invoice_number,
        payment = %payment.payment_number,
        amount = payment.amount,
        status = %invoice.status,
        "payment recorded"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::PaymentAdd,
        serde_json::json!({
            "invoice_id": invoice.id,
            "payment_id": payment.id,
            "amount": payment.amount,
        }),
    )
    .await;

    let detail = invoice_detail(&state.orm, invoice).await?;
    Ok(ApiResponse::single("Payment recorded", detail))
}

pub async fn get_invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<InvoiceDetail>> {
    ensure_staff(user)?;
    let invoice = Invoices::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;
    Ok(ApiResponse::single("OK", invoice_detail(&state.orm, invoice).await?))
}

pub async fn list_invoices(
    state: &AppState,
    user: &AuthUser,
    query: InvoiceListQuery,
) -> AppResult<ApiResponse<InvoiceList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(InvoiceCol::Status.eq(status.as_str()));
    }
    let finder = Invoices::find()
        .filter(condition)
        .order_by_desc(InvoiceCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(invoice_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Invoices",
        InvoiceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn invoices_for_customer(
    state: &AppState,
    user: &AuthUser,
    customer_id: Uuid,
) -> AppResult<ApiResponse<InvoiceList>> {
    ensure_staff(user)?;
    Customers::find_by_id(customer_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

    let items = Invoices::find()
        .filter(InvoiceCol::CustomerId.eq(customer_id))
        .order_by_desc(InvoiceCol::InvoiceDate)
        .order_by_desc(InvoiceCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(invoice_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Customer invoices", InvoiceList { items }, Some(meta)))
}

pub async fn list_payments(
    state: &AppState,
    user: &AuthUser,
    invoice_id: Uuid,
) -> AppResult<ApiResponse<PaymentList>> {
    ensure_staff(user)?;
    Invoices::find_by_id(invoice_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Invoice"))?;

    let items = Payments::find()
        .filter(PaymentCol::InvoiceId.eq(invoice_id))
        .order_by_desc(PaymentCol::PaymentDate)
        .order_by_desc(PaymentCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(payment_from_entity)
        .collect::<AppResult<Vec<_>>>()?;
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Payments", PaymentList { items }, Some(meta)))
}

async fn fetch_revenue(pool: &DbPool, start: NaiveDate, end: NaiveDate) -> AppResult<RevenueReport> {
    let report = sqlx::query_as::<_, RevenueReport>(
        r#"
        SELECT
            COUNT(*)::BIGINT AS total_invoices,
            COALESCE(SUM(total_amount), 0)::BIGINT AS total_revenue,
            COALESCE(SUM(total_amount) FILTER (WHERE status = 'paid'), 0)::BIGINT AS paid_revenue,
            COALESCE(SUM(total_amount) FILTER (WHERE status = 'partial'), 0)::BIGINT AS partial_revenue,
            COALESCE(SUM(total_amount) FILTER (WHERE status = 'draft'), 0)::BIGINT AS pending_revenue,
            COALESCE((
                SELECT SUM(p.amount)
                FROM payments p
                JOIN invoices i ON i.id = p.invoice_id
                WHERE i.invoice_date BETWEEN $1 AND $2
            ), 0)::BIGINT AS collected
        FROM invoices
        WHERE invoice_date BETWEEN $1 AND $2
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(report)
}

pub async fn revenue_report(
    state: &AppState,
    user: &AuthUser,
    query: RevenueQuery,
) -> AppResult<ApiResponse<RevenueReport>> {
    ensure_any_role(user, BILLING_ROLES)?;
    if query.end_date < query.start_date {
        return Err(AppError::Validation("end_date cannot precede start_date".into()));
    }
    let report = fetch_revenue(&state.pool, query.start_date, query.end_date).await?;
    Ok(ApiResponse::single("Revenue report", report))
}
