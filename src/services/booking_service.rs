use chrono::{NaiveDate, Utc};
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
    domain::{
        BookingPaymentStatus, BookingStatus, CodeKind, PaymentMethod, RoomStatus, nights,
        percent_of, stay_total, validate_stay,
    },
    dto::bookings::{
        BookingCreated, BookingDetail, BookingList, BookingSummary, CheckInRequest, CheckInResult,
        CheckOutResult, CreateBookingRequest, GuestCancelRequest, PaymentNotification,
        UpdateBookingRequest,
    },
    entity::{
        bookings::{
            ActiveModel as BookingActive, Column as BookingCol, Entity as Bookings,
            Model as BookingModel,
        },
        check_ins::{ActiveModel as CheckInActive, Column as CheckInCol, Entity as CheckIns},
        customers::Entity as Customers,
        rooms::{ActiveModel as RoomActive, Model as RoomModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, FRONT_DESK_ROLES, ensure_any_role, ensure_staff},
    models::Booking,
    response::{ApiResponse, Meta},
    routes::params::{BookingListQuery, SortOrder},
    services::{
        customer_service::{find_or_create_by_email, normalize_email},
        identifier_service::next_code,
        invoice_service::{derive_on_checkout, invoice_detail},
        mapping::{booking_from_entity, check_in_from_entity, customer_from_entity, room_from_entity},
        room_service::{has_no_conflicts, load_room, lock_room},
    },
    state::AppState,
};

pub fn deposit_for(
    policy: &BookingPolicy,
    total_amount: i64,
    method: PaymentMethod,
) -> AppResult<i64> {
    Ok(percent_of(total_amount, policy.deposit_percent(method))?)
}

fn validate_occupants(adults: i32, children: i32, max_occupancy: i32) -> AppResult<()> {
    if adults < 1 {
        return Err(AppError::Validation("at least one adult is required".into()));
    }
    if children < 0 {
        return Err(AppError::Validation("children cannot be negative".into()));
    }
    if adults + children > max_occupancy {
        return Err(AppError::Validation(format!(
            "room holds at most {max_occupancy} guests"
        )));
    }
    Ok(())
}

/// Status an update may move a booking to. Arrival and departure have their
/// own operations and cannot be reached through an update.
fn resolve_update_status(
    current: BookingStatus,
    requested: Option<BookingStatus>,
) -> AppResult<BookingStatus> {
    let Some(next) = requested.filter(|next| *next != current) else {
        return Ok(current);
    };
    if matches!(next, BookingStatus::CheckedIn | BookingStatus::CheckedOut) {
        return Err(AppError::StateConflict(format!(
            "status {next} is set by the check-in and check-out operations"
        )));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::StateConflict(format!(
            "cannot move booking from {current} to {next}"
        )));
    }
    Ok(next)
}

/// New `(total, deposit)` for an update. An explicit amount wins, then a
/// reprice caused by a room or date change, then the stored value. The
/// deposit follows the payment method whenever the total moved.
fn resolve_amounts(
    policy: &BookingPolicy,
    method: PaymentMethod,
    current: (i64, i64),
    requested: (Option<i64>, Option<i64>),
    repriced: Option<i64>,
) -> AppResult<(i64, i64)> {
    let total = requested.0.or(repriced).unwrap_or(current.0);
    if total < 0 {
        return Err(AppError::Validation("total_amount cannot be negative".into()));
    }
    let deposit = match requested.1 {
        Some(deposit) => deposit,
        None if total != current.0 => deposit_for(policy, total, method)?,
        None => current.1,
    };
    if deposit < 0 || deposit > total {
        return Err(AppError::Validation(
            "deposit_amount must be between 0 and total_amount".into(),
        ));
    }
    Ok((total, deposit))
}

fn parse_status(booking: &BookingModel) -> AppResult<BookingStatus> {
    Ok(booking.status.parse()?)
}

async fn ensure_room_free<C>(
    conn: &C,
    room: &RoomModel,
    check_in: NaiveDate,
    check_out: NaiveDate,
    exclude_booking: Option<Uuid>,
) -> AppResult<()>
where
    C: ConnectionTrait,
{
    if !has_no_conflicts(conn, room.id, check_in, check_out, exclude_booking).await? {
        return Err(AppError::AvailabilityConflict(format!(
            "room {} is already booked between {check_in} and {check_out}",
            room.room_number
        )));
    }
    Ok(())
}

async fn lock_booking<C>(conn: &C, id: Uuid) -> AppResult<BookingModel>
where
    C: ConnectionTrait,
{
    Bookings::find_by_id(id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Booking"))
}

async fn lock_booking_by_code<C>(conn: &C, code: &str) -> AppResult<BookingModel>
where
    C: ConnectionTrait,
{
    Bookings::find()
        .filter(BookingCol::BookingCode.eq(code.trim()))
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Booking"))
}

async fn set_booking_status<C>(
    conn: &C,
    booking: BookingModel,
    status: BookingStatus,
) -> AppResult<BookingModel>
where
    C: ConnectionTrait,
{
    let mut active: BookingActive = booking.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

async fn set_room_status<C>(conn: &C, room: RoomModel, status: RoomStatus) -> AppResult<RoomModel>
where
    C: ConnectionTrait,
{
    let mut active: RoomActive = room.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

async fn booking_detail<C>(conn: &C, booking: BookingModel) -> AppResult<BookingDetail>
where
    C: ConnectionTrait,
{
    let customer = Customers::find_by_id(booking.customer_id)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    let (room, room_type) = load_room(conn, booking.room_id).await?;
    let check_in = CheckIns::find()
        .filter(CheckInCol::BookingId.eq(booking.id))
        .one(conn)
        .await?
        .map(check_in_from_entity);

    Ok(BookingDetail {
        booking: booking_from_entity(booking)?,
        customer: customer_from_entity(customer),
        room: room_from_entity(room, room_type)?,
        check_in,
    })
}

/// Create a pending booking. Staff book for an existing `customer_id`;
/// guests pass contact details and are matched to a customer by email.
///
/// The room row is locked while availability is re-checked and the booking
/// inserted, so two requests for the same room are decided one after the
/// other.
pub async fn create_booking(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<BookingCreated>> {
    let policy = state.policy();
    let today = policy.today();
    validate_stay(payload.check_in_date, payload.check_out_date, Some(today))
        .map_err(AppError::Validation)?;

    let txn = state.orm.begin().await?;

    let customer = match (payload.customer_id, payload.guest) {
        (Some(customer_id), _) => {
            let staff = user.ok_or(AppError::Unauthorized)?;
            ensure_staff(staff)?;
            Customers::find_by_id(customer_id)
                .one(&txn)
                .await?
                .ok_or(AppError::NotFound("Customer"))?
        }
        (None, Some(guest)) => find_or_create_by_email(&txn, guest, today).await?.0,
        (None, None) => {
            return Err(AppError::Validation(
                "either customer_id or guest details are required".into(),
            ));
        }
    };

    let (room, room_type) = lock_room(&txn, payload.room_id).await?;
    let room_status: RoomStatus = room.status.parse()?;
    if room_status != RoomStatus::Available {
        return Err(AppError::AvailabilityConflict(format!(
            "room {} is {room_status}",
            room.room_number
        )));
    }
    let adults = payload.adults.unwrap_or(1);
    let children = payload.children.unwrap_or(0);
    validate_occupants(adults, children, room_type.max_occupancy)?;
    ensure_room_free(
        &txn,
        &room,
        payload.check_in_date,
        payload.check_out_date,
        None,
    )
    .await?;

    let stay = nights(payload.check_in_date, payload.check_out_date);
    let total_amount = stay_total(room_type.base_price, stay)?;
    let payment_method = payload.payment_method.unwrap_or_default();
    let deposit_amount = deposit_for(policy, total_amount, payment_method)?;
    let booking_code = next_code(&txn, CodeKind::Booking, today).await?;

    let booking = BookingActive {
        id: Set(Uuid::new_v4()),
        booking_code: Set(booking_code),
        customer_id: Set(customer.id),
        room_id: Set(room.id),
        check_in_date: Set(payload.check_in_date),
        check_out_date: Set(payload.check_out_date),
        adults: Set(adults),
        children: Set(children),
        status: Set(BookingStatus::Pending.as_str().to_string()),
        payment_status: Set(BookingPaymentStatus::Unpaid.as_str().to_string()),
        payment_method: Set(payment_method.as_str().to_string()),
        total_amount: Set(total_amount),
        deposit_amount: Set(deposit_amount),
        special_requests: Set(payload.special_requests),
        created_by: Set(user.map(|u| u.user_id)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(
        booking = %booking.booking_code,
        room = %room.room_number,
        check_in = %booking.check_in_date,
        check_out = %booking.check_out_date,
        total = booking.total_amount,
        "booking created"
    );
    audit::record(
        &state.pool,
        user.map(|u| u.user_id),
        AuditAction::BookingCreate,
        serde_json::json!({
            "booking_id": booking.id,
            "code": booking.booking_code,
            "customer_id": customer.id,
        }),
    )
    .await;

    Ok(ApiResponse::single(
        "Booking created",
        BookingCreated {
            booking: booking_from_entity(booking)?,
            room: room_from_entity(room, room_type)?,
            nights: stay,
        },
    ))
}

pub async fn get_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<BookingDetail>> {
    ensure_staff(user)?;
    let booking = Bookings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Booking"))?;
    Ok(ApiResponse::single("OK", booking_detail(&state.orm, booking).await?))
}

/// Public lookup by code. Codes are sequential, so the answer leaves out
/// the customer's contact details.
pub async fn get_booking_by_code(
    state: &AppState,
    code: &str,
) -> AppResult<ApiResponse<BookingSummary>> {
    let booking = Bookings::find()
        .filter(BookingCol::BookingCode.eq(code.trim()))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Booking"))?;
    let (room, room_type) = load_room(&state.orm, booking.room_id).await?;
    let summary = BookingSummary {
        nights: nights(booking.check_in_date, booking.check_out_date),
        booking: booking_from_entity(booking)?,
        room: room_from_entity(room, room_type)?,
    };
    Ok(ApiResponse::single("OK", summary))
}

pub async fn list_bookings(
    state: &AppState,
    user: &AuthUser,
    query: BookingListQuery,
) -> AppResult<ApiResponse<BookingList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(BookingCol::Status.eq(status.as_str()));
    }

    let mut finder = Bookings::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(BookingCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(BookingCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        BookingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Non-cancelled bookings whose stay covers the night of `date`.
pub async fn bookings_on_date(
    state: &AppState,
    user: &AuthUser,
    date: NaiveDate,
) -> AppResult<ApiResponse<BookingList>> {
    ensure_staff(user)?;
    let items = Bookings::find()
        .filter(BookingCol::CheckInDate.lte(date))
        .filter(BookingCol::CheckOutDate.gt(date))
        .filter(BookingCol::Status.ne(BookingStatus::Cancelled.as_str()))
        .order_by_asc(BookingCol::CheckInDate)
        .order_by_asc(BookingCol::BookingCode)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(booking_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Bookings", BookingList { items }, Some(meta)))
}

pub async fn update_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    ensure_any_role(user, FRONT_DESK_ROLES)?;
    let policy = state.policy();

    let txn = state.orm.begin().await?;
    let booking = lock_booking(&txn, id).await?;
    let current = parse_status(&booking)?;
    if !current.is_editable() {
        return Err(AppError::StateConflict(format!(
            "booking {} is {current} and can no longer be changed",
            booking.booking_code
        )));
    }
    let next = resolve_update_status(current, payload.status)?;

    let room_id = payload.room_id.unwrap_or(booking.room_id);
    let check_in = payload.check_in_date.unwrap_or(booking.check_in_date);
    let check_out = payload.check_out_date.unwrap_or(booking.check_out_date);
    let room_changed = room_id != booking.room_id;
    let dates_changed = check_in != booking.check_in_date || check_out != booking.check_out_date;

    let today = (check_in != booking.check_in_date).then(|| policy.today());
    validate_stay(check_in, check_out, today).map_err(AppError::Validation)?;

    let (room, room_type) = lock_room(&txn, room_id).await?;
    if room_changed {
        let room_status: RoomStatus = room.status.parse()?;
        if room_status != RoomStatus::Available {
            return Err(AppError::AvailabilityConflict(format!(
                "room {} is {room_status}",
                room.room_number
            )));
        }
    }

    let adults = payload.adults.unwrap_or(booking.adults);
    let children = payload.children.unwrap_or(booking.children);
    validate_occupants(adults, children, room_type.max_occupancy)?;

    if next.occupies_room() {
        ensure_room_free(&txn, &room, check_in, check_out, Some(booking.id)).await?;
    }

    let method: PaymentMethod = booking.payment_method.parse()?;
    let repriced = (room_changed || dates_changed)
        .then(|| stay_total(room_type.base_price, nights(check_in, check_out)))
        .transpose()?;
    let (total_amount, deposit_amount) = resolve_amounts(
        policy,
        method,
        (booking.total_amount, booking.deposit_amount),
        (payload.total_amount, payload.deposit_amount),
        repriced,
    )?;

    let code = booking.booking_code.clone();
    let mut active: BookingActive = booking.into();
    active.room_id = Set(room.id);
    active.check_in_date = Set(check_in);
    active.check_out_date = Set(check_out);
    active.adults = Set(adults);
    active.children = Set(children);
    active.status = Set(next.as_str().to_string());
    active.total_amount = Set(total_amount);
    active.deposit_amount = Set(deposit_amount);
    if let Some(requests) = payload.special_requests {
        active.special_requests = Set(Some(requests));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(booking = %code, from = %current, to = %next, "booking updated");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::BookingUpdate,
        serde_json::json!({
            "booking_id": updated.id,
            "from": current.as_str(),
            "to": next.as_str(),
            "room_id": updated.room_id,
        }),
    )
    .await;

    Ok(ApiResponse::single("Booking updated", booking_from_entity(updated)?))
}

/// `pending -> confirmed` once the room is re-checked under its lock. The
/// caller must hold the booking lock.
async fn confirm_locked<C>(conn: &C, booking: BookingModel) -> AppResult<BookingModel>
where
    C: ConnectionTrait,
{
    let current = parse_status(&booking)?;
    if !current.can_transition_to(BookingStatus::Confirmed) {
        return Err(AppError::StateConflict(format!(
            "booking {} is {current}, only pending bookings can be confirmed",
            booking.booking_code
        )));
    }
    let (room, _) = lock_room(conn, booking.room_id).await?;
    ensure_room_free(
        conn,
        &room,
        booking.check_in_date,
        booking.check_out_date,
        Some(booking.id),
    )
    .await?;
    set_booking_status(conn, booking, BookingStatus::Confirmed).await
}

pub async fn confirm_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    ensure_any_role(user, FRONT_DESK_ROLES)?;
    let txn = state.orm.begin().await?;
    let booking = lock_booking(&txn, id).await?;
    let confirmed = confirm_locked(&txn, booking).await?;
    txn.commit().await?;

    tracing::info!(booking = %confirmed.booking_code, "booking confirmed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::BookingConfirm,
        serde_json::json!({ "booking_id": confirmed.id }),
    )
    .await;

    Ok(ApiResponse::single("Booking confirmed", booking_from_entity(confirmed)?))
}

/// Returns the booking and whether it changed; cancelling a cancelled booking
/// is a no-op.
async fn cancel_locked<C>(conn: &C, booking: BookingModel) -> AppResult<(BookingModel, bool)>
where
    C: ConnectionTrait,
{
    let current = parse_status(&booking)?;
    if current == BookingStatus::Cancelled {
        return Ok((booking, false));
    }
    if !current.is_cancellable() {
        return Err(AppError::StateConflict(format!(
            "booking {} is {current} and cannot be cancelled",
            booking.booking_code
        )));
    }
    let cancelled = set_booking_status(conn, booking, BookingStatus::Cancelled).await?;
    Ok((cancelled, true))
}

pub async fn cancel_booking(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Booking>> {
    ensure_any_role(user, FRONT_DESK_ROLES)?;
    let txn = state.orm.begin().await?;
    let booking = lock_booking(&txn, id).await?;
    let (booking, changed) = cancel_locked(&txn, booking).await?;
    txn.commit().await?;

    if changed {
        tracing::info!(booking = %booking.booking_code, "booking cancelled");
        audit::record(
            &state.pool,
            Some(user.user_id),
            AuditAction::BookingCancel,
            serde_json::json!({ "booking_id": booking.id }),
        )
        .await;
    }
    Ok(ApiResponse::single("Booking cancelled", booking_from_entity(booking)?))
}

/// Self-service cancellation: the caller proves ownership with the email the
/// booking's customer registered.
pub async fn cancel_by_code(
    state: &AppState,
    code: &str,
    payload: GuestCancelRequest,
) -> AppResult<ApiResponse<Booking>> {
    let txn = state.orm.begin().await?;
    let booking = lock_booking_by_code(&txn, code).await?;
    let customer = Customers::find_by_id(booking.customer_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Customer"))?;
    if customer.email != normalize_email(&payload.email) {
        return Err(AppError::Forbidden);
    }
    let (booking, changed) = cancel_locked(&txn, booking).await?;
    txn.commit().await?;

    if changed {
        tracing::info!(booking = %booking.booking_code, "booking cancelled by guest");
        audit::record(
            &state.pool,
            None,
            AuditAction::BookingCancel,
            serde_json::json!({ "booking_id": booking.id, "by": "guest" }),
        )
        .await;
    }
    Ok(ApiResponse::single("Booking cancelled", booking_from_entity(booking)?))
}

/// Booking, room and arrival record change together or not at all.
pub async fn check_in(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CheckInRequest,
) -> AppResult<ApiResponse<CheckInResult>> {
    ensure_any_role(user, FRONT_DESK_ROLES)?;

    let txn = state.orm.begin().await?;
    let booking = lock_booking(&txn, id).await?;
    let current = parse_status(&booking)?;
    if current != BookingStatus::Confirmed {
        return Err(AppError::StateConflict(format!(
            "booking {} is {current}, only confirmed bookings can check in",
            booking.booking_code
        )));
    }
    let existing = CheckIns::find()
        .filter(CheckInCol::BookingId.eq(booking.id))
        .count(&txn)
        .await?;
    if existing > 0 {
        return Err(AppError::StateConflict(format!(
            "booking {} already has an arrival record",
            booking.booking_code
        )));
    }

    let (room, room_type) = lock_room(&txn, booking.room_id).await?;
    let actual_adults = payload.actual_adults.unwrap_or(booking.adults);
    let actual_children = payload.actual_children.unwrap_or(booking.children);
    validate_occupants(actual_adults, actual_children, room_type.max_occupancy)?;

    let now = Utc::now();
    let booking = set_booking_status(&txn, booking, BookingStatus::CheckedIn).await?;
    let room = set_room_status(&txn, room, RoomStatus::Occupied).await?;
    let record = CheckInActive {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking.id),
        room_id: Set(room.id),
        actual_adults: Set(actual_adults),
        actual_children: Set(actual_children),
        check_in_time: Set(now.into()),
        check_out_time: Set(None),
        checked_in_by: Set(Some(user.user_id)),
        checked_out_by: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!(booking = %booking.booking_code, room = %room.room_number, "guest checked in");
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::BookingCheckIn,
        serde_json::json!({ "booking_id": booking.id, "check_in_id": record.id }),
    )
    .await;

    Ok(ApiResponse::single(
        "Checked in",
        CheckInResult {
            booking_id: booking.id,
            check_in_id: record.id,
            check_in_time: now,
        },
    ))
}

/// Close the stay and bill it in one transaction: booking, room, departure
/// record and the derived invoice.
pub async fn check_out(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CheckOutResult>> {
    ensure_any_role(user, FRONT_DESK_ROLES)?;
    let policy = state.policy();

    let txn = state.orm.begin().await?;
    let booking = lock_booking(&txn, id).await?;
    let current = parse_status(&booking)?;
    if current != BookingStatus::CheckedIn {
        return Err(AppError::StateConflict(format!(
            "booking {} is {current}, only checked-in bookings can check out",
            booking.booking_code
        )));
    }
    let record = CheckIns::find()
        .filter(CheckInCol::BookingId.eq(booking.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::StateConflict(format!(
                "booking {} has no arrival record",
                booking.booking_code
            ))
        })?;

    let (room, _) = lock_room(&txn, booking.room_id).await?;
    let booking = set_booking_status(&txn, booking, BookingStatus::CheckedOut).await?;
    let room = set_room_status(&txn, room, RoomStatus::Cleaning).await?;

    let mut record: CheckInActive = record.into();
    record.check_out_time = Set(Some(Utc::now().into()));
    record.checked_out_by = Set(Some(user.user_id));
    let record = record.update(&txn).await?;

    let invoice =
        derive_on_checkout(&txn, policy, &booking, &room.room_number, Some(user.user_id)).await?;
    let invoice = invoice_detail(&txn, invoice).await?;
    txn.commit().await?;

    tracing::info!(
        booking = %booking.booking_code,
        room = %room.room_number,
        invoice = %invoice.invoice.invoice_number,
        total = invoice.invoice.total_amount,
        "guest checked out"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::BookingCheckOut,
        serde_json::json!({ "booking_id": booking.id, "invoice_id": invoice.invoice.id }),
    )
    .await;

    Ok(ApiResponse::single(
        "Checked out",
        CheckOutResult {
            booking: booking_from_entity(booking)?,
            check_in: check_in_from_entity(record),
            invoice,
        },
    ))
}

/// Apply a payment notification to a booking. Repeats are no-ops and `paid`
/// is never downgraded. A `paid` notice also confirms a pending booking when
/// its room is still free; otherwise the booking stays pending for staff.
pub async fn mark_payment_status(
    state: &AppState,
    payload: PaymentNotification,
) -> AppResult<ApiResponse<Booking>> {
    let txn = state.orm.begin().await?;
    let booking = lock_booking_by_code(&txn, &payload.booking_code).await?;
    let current: BookingPaymentStatus = booking.payment_status.parse()?;

    let Some(next) = current.apply_notification(payload.status) else {
        txn.commit().await?;
        tracing::debug!(booking = %booking.booking_code, status = %current, "payment notice ignored");
        return Ok(ApiResponse::single("No change", booking_from_entity(booking)?));
    };

    let mut status = parse_status(&booking)?;
    if next == BookingPaymentStatus::Paid && status == BookingStatus::Pending {
        let (room, _) = lock_room(&txn, booking.room_id).await?;
        if has_no_conflicts(
            &txn,
            room.id,
            booking.check_in_date,
            booking.check_out_date,
            Some(booking.id),
        )
        .await?
        {
            status = BookingStatus::Confirmed;
        } else {
            tracing::warn!(
                booking = %booking.booking_code,
                room = %room.room_number,
                "paid booking left pending: room taken"
            );
        }
    }

    let mut active: BookingActive = booking.into();
    active.payment_status = Set(next.as_str().to_string());
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let booking = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        booking = %booking.booking_code,
        payment_status = %next,
        status = %status,
        "payment status updated"
    );
    audit::record(
        &state.pool,
        None,
        AuditAction::BookingPaymentStatus,
        serde_json::json!({
            "booking_id": booking.id,
            "from": current.as_str(),
            "to": next.as_str(),
        }),
    )
    .await;

    Ok(ApiResponse::single(
        "Payment status updated",
        booking_from_entity(booking)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_depends_on_method() {
        let policy = BookingPolicy::default();
        assert_eq!(deposit_for(&policy, 3_000_000, PaymentMethod::Cash).unwrap(), 900_000);
        assert_eq!(deposit_for(&policy, 3_000_000, PaymentMethod::Momo).unwrap(), 3_000_000);
    }

    #[test]
    fn occupancy_limits() {
        assert!(validate_occupants(2, 1, 3).is_ok());
        assert!(validate_occupants(2, 2, 3).is_err());
        assert!(validate_occupants(0, 1, 3).is_err());
        assert!(validate_occupants(1, -1, 3).is_err());
    }

    #[test]
    fn update_cannot_skip_arrival_operations() {
        use BookingStatus::*;
        assert_eq!(resolve_update_status(Pending, None).unwrap(), Pending);
        assert_eq!(resolve_update_status(Pending, Some(Pending)).unwrap(), Pending);
        assert_eq!(resolve_update_status(Pending, Some(Confirmed)).unwrap(), Confirmed);
        assert_eq!(resolve_update_status(Confirmed, Some(Cancelled)).unwrap(), Cancelled);
        assert!(matches!(
            resolve_update_status(Confirmed, Some(CheckedIn)),
            Err(AppError::StateConflict(_))
        ));
        assert!(matches!(
            resolve_update_status(Confirmed, Some(Pending)),
            Err(AppError::StateConflict(_))
        ));
    }

    #[test]
    fn amounts_follow_reprice_unless_given() {
        let policy = BookingPolicy::default();
        let current = (3_000_000, 900_000);

        let kept = resolve_amounts(&policy, PaymentMethod::Cash, current, (None, None), None);
        assert_eq!(kept.unwrap(), current);

        let repriced =
            resolve_amounts(&policy, PaymentMethod::Cash, current, (None, None), Some(4_000_000));
        assert_eq!(repriced.unwrap(), (4_000_000, 1_200_000));

        let explicit = resolve_amounts(
            &policy,
            PaymentMethod::Cash,
            current,
            (Some(2_500_000), Some(500_000)),
            Some(4_000_000),
        );
        assert_eq!(explicit.unwrap(), (2_500_000, 500_000));

        let too_much =
            resolve_amounts(&policy, PaymentMethod::Cash, current, (None, Some(3_500_000)), None);
        assert!(matches!(too_much, Err(AppError::Validation(_))));

        let huge = resolve_amounts(
            &policy,
            PaymentMethod::Cash,
            current,
            (Some(i64::MAX / 2), None),
            None,
        );
        assert!(matches!(huge, Err(AppError::Validation(_))));
    }
}
