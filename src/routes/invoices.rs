use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::invoices::{
        AddInvoiceItemRequest, AddPaymentRequest, CreateInvoiceRequest, InvoiceDetail,
        InvoiceList, PaymentList, RevenueQuery, RevenueReport,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::InvoiceListQuery,
    services::invoice_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/revenue-report", get(revenue_report))
        .route("/{id}", get(get_invoice))
        .route("/{id}/items", post(add_item))
        .route("/{id}/payments", get(list_payments).post(add_payment))
}

#[utoipa::path(
    get,
    path = "/api/invoices",
    params(InvoiceListQuery),
    responses(
        (status = 200, description = "Invoices, newest first", body = ApiResponse<InvoiceList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InvoiceListQuery>,
) -> AppResult<Json<ApiResponse<InvoiceList>>> {
    let resp = invoice_service::list_invoices(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 200, description = "Draft invoice", body = ApiResponse<InvoiceDetail>),
        (status = 404, description = "Customer or booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateInvoiceRequest>,
) -> AppResult<Json<ApiResponse<InvoiceDetail>>> {
    let resp = invoice_service::create_invoice(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/invoices/revenue-report",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Revenue by invoice status for the date range", body = ApiResponse<RevenueReport>)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn revenue_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RevenueQuery>,
) -> AppResult<Json<ApiResponse<RevenueReport>>> {
    let resp = invoice_service::revenue_report(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice with items and payments", body = ApiResponse<InvoiceDetail>),
        (status = 404, description = "Invoice not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InvoiceDetail>>> {
    let resp = invoice_service::get_invoice(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/items",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = AddInvoiceItemRequest,
    responses(
        (status = 200, description = "Item added and totals recomputed", body = ApiResponse<InvoiceDetail>),
        (status = 400, description = "Invalid quantity or price")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddInvoiceItemRequest>,
) -> AppResult<Json<ApiResponse<InvoiceDetail>>> {
    let resp = invoice_service::add_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Payments, newest first", body = ApiResponse<PaymentList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentList>>> {
    let resp = invoice_service::list_payments(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = AddPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<InvoiceDetail>),
        (status = 400, description = "Non-positive amount"),
        (status = 422, description = "Amount exceeds the remaining balance")
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn add_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddPaymentRequest>,
) -> AppResult<Json<ApiResponse<InvoiceDetail>>> {
    let resp = invoice_service::add_payment(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
