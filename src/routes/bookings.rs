use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    dto::bookings::{
        BookingCreated, BookingDetail, BookingList, BookingSummary, CheckInRequest, CheckInResult,
        CheckOutResult, CreateBookingRequest, GuestCancelRequest, PaymentNotification,
        UpdateBookingRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, PaymentNotifier},
    models::Booking,
    response::ApiResponse,
    routes::params::BookingListQuery,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/payment-notify", post(payment_notify))
        .route("/by-date/{date}", get(bookings_on_date))
        .route("/code/{code}", get(get_booking_by_code))
        .route("/code/{code}/cancel", post(guest_cancel))
        .route("/{id}", get(get_booking).put(update_booking))
        .route("/{id}/confirm", post(confirm_booking))
        .route("/{id}/cancel", post(cancel_booking))
        .route("/{id}/check-in", post(check_in))
        .route("/{id}/check-out", post(check_out))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Pending booking with computed totals", body = ApiResponse<BookingCreated>),
        (status = 400, description = "Invalid dates, occupants or contact"),
        (status = 404, description = "Customer or room not found"),
        (status = 409, description = "Room unavailable for the stay")
    ),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<ApiResponse<BookingCreated>>> {
    let resp = booking_service::create_booking(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings", body = ApiResponse<BookingList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_bookings(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/by-date/{date}",
    params(("date" = NaiveDate, Path, description = "Night to look up, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Bookings staying over that night", body = ApiResponse<BookingList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn bookings_on_date(
    State(state): State<AppState>,
    user: AuthUser,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::bookings_on_date(&state, &user, date).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/code/{code}",
    params(("code" = String, Path, description = "Booking code, e.g. BK2405070001")),
    responses(
        (status = 200, description = "Booking and room, without customer contact details", body = ApiResponse<BookingSummary>),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings"
)]
pub async fn get_booking_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<BookingSummary>>> {
    let resp = booking_service::get_booking_by_code(&state, &code).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/code/{code}/cancel",
    params(("code" = String, Path, description = "Booking code")),
    request_body = GuestCancelRequest,
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<Booking>),
        (status = 403, description = "Email does not match the booking"),
        (status = 409, description = "Booking already checked in or out")
    ),
    tag = "Bookings"
)]
pub async fn guest_cancel(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<GuestCancelRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::cancel_by_code(&state, &code, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking detail", body = ApiResponse<BookingDetail>),
        (status = 404, description = "Booking not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn get_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingDetail>>> {
    let resp = booking_service::get_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 200, description = "Booking updated", body = ApiResponse<Booking>),
        (status = 409, description = "Booking no longer editable or room unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn update_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookingRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::update_booking(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/confirm",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking confirmed", body = ApiResponse<Booking>),
        (status = 409, description = "Not pending, or room taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::confirm_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking cancelled", body = ApiResponse<Booking>),
        (status = 409, description = "Booking already checked in or out")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::cancel_booking(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/check-in",
    params(("id" = Uuid, Path, description = "Booking ID")),
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Guest checked in", body = ApiResponse<CheckInResult>),
        (status = 409, description = "Booking is not confirmed")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn check_in(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CheckInRequest>,
) -> AppResult<Json<ApiResponse<CheckInResult>>> {
    let resp = booking_service::check_in(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/check-out",
    params(("id" = Uuid, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Guest checked out and invoice issued", body = ApiResponse<CheckOutResult>),
        (status = 409, description = "Booking is not checked in")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookings"
)]
pub async fn check_out(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CheckOutResult>>> {
    let resp = booking_service::check_out(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/bookings/payment-notify",
    request_body = PaymentNotification,
    responses(
        (status = 200, description = "Notification applied or ignored as a repeat", body = ApiResponse<Booking>),
        (status = 401, description = "Missing x-payment-notify-secret header"),
        (status = 403, description = "Wrong notification secret"),
        (status = 404, description = "Booking not found")
    ),
    tag = "Bookings"
)]
pub async fn payment_notify(
    State(state): State<AppState>,
    _notifier: PaymentNotifier,
    Json(payload): Json<PaymentNotification>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::mark_payment_status(&state, payload).await?;
    Ok(Json(resp))
}
