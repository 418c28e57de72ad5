use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        customers::{CreateCustomerRequest, CustomerBookings, CustomerList, CustomerSearchQuery},
        invoices::InvoiceList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Customer,
    response::ApiResponse,
    services::{customer_service, invoice_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_customers).post(create_customer))
        .route("/{id}", get(get_customer))
        .route("/{id}/bookings", get(customer_bookings))
        .route("/{id}/invoices", get(customer_invoices))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Customer registered", body = ApiResponse<Customer>),
        (status = 400, description = "Invalid contact or email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCustomerRequest>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp = customer_service::create_customer(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/customers",
    params(CustomerSearchQuery),
    responses(
        (status = 200, description = "Customers matching name, email or phone", body = ApiResponse<CustomerList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Customers"
)]
pub async fn search_customers(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<CustomerSearchQuery>,
) -> AppResult<Json<ApiResponse<CustomerList>>> {
    let resp = customer_service::search_customers(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer", body = ApiResponse<Customer>),
        (status = 404, description = "Customer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp = customer_service::get_customer(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/bookings",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Booking history, newest first", body = ApiResponse<CustomerBookings>)
    ),
    security(("bearer_auth" = [])),
    tag = "Customers"
)]
pub async fn customer_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CustomerBookings>>> {
    let resp = customer_service::booking_history(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}/invoices",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Invoices issued to the customer", body = ApiResponse<InvoiceList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Customers"
)]
pub async fn customer_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InvoiceList>>> {
    let resp = invoice_service::invoices_for_customer(&state, &user, id).await?;
    Ok(Json(resp))
}
