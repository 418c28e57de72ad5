use chrono::NaiveDate;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    domain::CodeKind,
    dto::customers::{CreateCustomerRequest, CustomerBookings, CustomerList, CustomerSearchQuery},
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        customers::{ActiveModel as CustomerActive, Column as CustomerCol, Entity as Customers, Model as CustomerModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Customer,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{
        identifier_service::{advisory_xact_lock, next_code},
        mapping::{booking_from_entity, customer_from_entity},
    },
    state::AppState,
};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_contact(payload: &CreateCustomerRequest) -> AppResult<()> {
    if payload.first_name.trim().is_empty() || payload.last_name.trim().is_empty() {
        return Err(AppError::Validation("first and last name are required".into()));
    }
    let email = payload.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::Validation(format!("invalid email `{email}`"))),
    }
}

/// Serialize registrations of one email until the transaction ends, so a
/// concurrent registration sees the committed row instead of racing the
/// unique index.
async fn lock_email<C>(conn: &C, email: &str) -> AppResult<()>
where
    C: ConnectionTrait,
{
    advisory_xact_lock(conn, &format!("customer-email:{}", normalize_email(email))).await
}

pub async fn find_by_email<C>(conn: &C, email: &str) -> AppResult<Option<CustomerModel>>
where
    C: ConnectionTrait,
{
    let customer = Customers::find()
        .filter(CustomerCol::Email.eq(normalize_email(email)))
        .one(conn)
        .await?;
    Ok(customer)
}

async fn insert_customer<C>(
    conn: &C,
    payload: CreateCustomerRequest,
    today: NaiveDate,
) -> AppResult<CustomerModel>
where
    C: ConnectionTrait,
{
    let customer_code = next_code(conn, CodeKind::Customer, today).await?;
    let customer = CustomerActive {
        id: Set(Uuid::new_v4()),
        customer_code: Set(customer_code),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        email: Set(normalize_email(&payload.email)),
        phone: Set(payload.phone),
        address: Set(payload.address),
        nationality: Set(payload.nationality),
        notes: Set(payload.notes),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(customer)
}

/// Reuse the customer registered under the contact email, or register a new
/// one. Returns the customer and whether it was created. Must run inside a
/// transaction.
pub async fn find_or_create_by_email<C>(
    conn: &C,
    payload: CreateCustomerRequest,
    today: NaiveDate,
) -> AppResult<(CustomerModel, bool)>
where
    C: ConnectionTrait,
{
    validate_contact(&payload)?;
    lock_email(conn, &payload.email).await?;
    if let Some(existing) = find_by_email(conn, &payload.email).await? {
        return Ok((existing, false));
    }
    let created = insert_customer(conn, payload, today).await?;
    Ok((created, true))
}

pub async fn create_customer(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCustomerRequest,
) -> AppResult<ApiResponse<Customer>> {
    ensure_staff(user)?;
    validate_contact(&payload)?;

    let txn = state.orm.begin().await?;
    lock_email(&txn, &payload.email).await?;
    if find_by_email(&txn, &payload.email).await?.is_some() {
        return Err(AppError::Validation("email is already registered".into()));
    }
    let customer = insert_customer(&txn, payload, state.policy().today()).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::CustomerCreate,
        serde_json::json!({ "customer_id": customer.id, "code": customer.customer_code }),
    )
    .await;

    Ok(ApiResponse::single("Customer created", customer_from_entity(customer)))
}

pub async fn get_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Customer>> {
    ensure_staff(user)?;
    let customer = Customers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    Ok(ApiResponse::single("OK", customer_from_entity(customer)))
}

pub async fn search_customers(
    state: &AppState,
    user: &AuthUser,
    query: CustomerSearchQuery,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = Pagination {
        page: query.page,
        per_page: query.per_page,
    }
    .normalize();

    let mut condition = Condition::all();
    if let Some(term) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", term.to_lowercase());
        let mut any = Condition::any();
        for column in [
            CustomerCol::FirstName,
            CustomerCol::LastName,
            CustomerCol::Email,
            CustomerCol::Phone,
        ] {
            any = any.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone()));
        }
        condition = condition.add(any);
    }

    let finder = Customers::find()
        .filter(condition)
        .order_by_desc(CustomerCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(customer_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn booking_history(
    state: &AppState,
    user: &AuthUser,
    customer_id: Uuid,
) -> AppResult<ApiResponse<CustomerBookings>> {
    ensure_staff(user)?;
    let customer = Customers::find_by_id(customer_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;

    let bookings = Bookings::find()
        .filter(BookingCol::CustomerId.eq(customer.id))
        .order_by_desc(BookingCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::all(bookings.len());
    Ok(ApiResponse::success(
        "Booking history",
        CustomerBookings {
            customer: customer_from_entity(customer),
            bookings,
        },
        Some(meta),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(email: &str) -> CreateCustomerRequest {
        CreateCustomerRequest {
            first_name: "Lan".into(),
            last_name: "Nguyen".into(),
            email: email.into(),
            phone: None,
            address: None,
            nationality: None,
            notes: None,
        }
    }

    #[test]
    fn contact_validation() {
        assert!(validate_contact(&contact("guest@example.com")).is_ok());
        assert!(validate_contact(&contact("guest.example.com")).is_err());
        assert!(validate_contact(&contact("@example.com")).is_err());

        let mut nameless = contact("guest@example.com");
        nameless.first_name = "  ".into();
        assert!(matches!(validate_contact(&nameless), Err(AppError::Validation(_))));
    }

    #[test]
    fn emails_match_case_insensitively() {
        assert_eq!(normalize_email("  Guest@Example.COM "), "guest@example.com");
    }
}
