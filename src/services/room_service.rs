use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, LockType, Query};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    domain::{BookingStatus, RoomStatus, validate_stay},
    dto::rooms::{AvailabilityQuery, RoomList, RoomStatistics, RoomTypeList},
    entity::{
        bookings::{Column as BookingCol, Entity as Bookings},
        room_types::{Column as RoomTypeCol, Entity as RoomTypes, Model as RoomTypeModel},
        rooms::{Column as RoomCol, Entity as Rooms, Model as RoomModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Room,
    response::{ApiResponse, Meta},
    services::mapping::{room_from_entity, room_type_from_entity},
    state::AppState,
};

fn occupying_statuses() -> Vec<&'static str> {
    BookingStatus::OCCUPYING.iter().map(|s| s.as_str()).collect()
}

/// Bookings that hold their room for some night of `[check_in, check_out)`.
/// Two stays conflict unless one ends on or before the day the other starts.
pub fn conflicting_bookings(check_in: NaiveDate, check_out: NaiveDate) -> Condition {
    Condition::all()
        .add(BookingCol::Status.is_in(occupying_statuses()))
        .add(BookingCol::CheckInDate.lt(check_out))
        .add(BookingCol::CheckOutDate.gt(check_in))
}

/// Rooms that are operationally available and have no occupying booking
/// overlapping the interval, ordered by room number.
pub async fn find_available<C>(
    conn: &C,
    check_in: NaiveDate,
    check_out: NaiveDate,
    room_type_id: Option<Uuid>,
    guests: Option<i32>,
) -> AppResult<Vec<(RoomModel, RoomTypeModel)>>
where
    C: ConnectionTrait,
{
    let booked = Query::select()
        .column(BookingCol::RoomId)
        .from(Bookings)
        .cond_where(conflicting_bookings(check_in, check_out))
        .to_owned();

    let mut finder = Rooms::find()
        .find_also_related(RoomTypes)
        .filter(RoomCol::Status.eq(RoomStatus::Available.as_str()))
        .filter(RoomCol::Id.not_in_subquery(booked));
    if let Some(room_type_id) = room_type_id {
        finder = finder.filter(RoomCol::RoomTypeId.eq(room_type_id));
    }
    if let Some(guests) = guests {
        finder = finder.filter(RoomTypeCol::MaxOccupancy.gte(guests));
    }

    let rows = finder.order_by_asc(RoomCol::RoomNumber).all(conn).await?;
    rows.into_iter()
        .map(|(room, room_type)| {
            let room_type = room_type.ok_or_else(|| missing_room_type(&room))?;
            Ok((room, room_type))
        })
        .collect()
}

/// Whether `room_id` has no occupying booking overlapping the interval,
/// ignoring `exclude_booking` (the booking being edited or confirmed).
pub async fn has_no_conflicts<C>(
    conn: &C,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    exclude_booking: Option<Uuid>,
) -> AppResult<bool>
where
    C: ConnectionTrait,
{
    let mut finder = Bookings::find()
        .filter(BookingCol::RoomId.eq(room_id))
        .filter(conflicting_bookings(check_in, check_out));
    if let Some(id) = exclude_booking {
        finder = finder.filter(BookingCol::Id.ne(id));
    }
    Ok(finder.count(conn).await? == 0)
}

/// Load a room with its type, taking a row lock on the room so that
/// bookings for it are decided one at a time until the transaction ends.
pub async fn lock_room<C>(conn: &C, room_id: Uuid) -> AppResult<(RoomModel, RoomTypeModel)>
where
    C: ConnectionTrait,
{
    let room = Rooms::find_by_id(room_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Room"))?;
    let room_type = RoomTypes::find_by_id(room.room_type_id)
        .one(conn)
        .await?
        .ok_or_else(|| missing_room_type(&room))?;
    Ok((room, room_type))
}

pub async fn load_room<C>(conn: &C, room_id: Uuid) -> AppResult<(RoomModel, RoomTypeModel)>
where
    C: ConnectionTrait,
{
    let (room, room_type) = Rooms::find_by_id(room_id)
        .find_also_related(RoomTypes)
        .one(conn)
        .await?
        .ok_or(AppError::NotFound("Room"))?;
    let room_type = room_type.ok_or_else(|| missing_room_type(&room))?;
    Ok((room, room_type))
}

fn missing_room_type(room: &RoomModel) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "room {} references missing room type {}",
        room.room_number,
        room.room_type_id
    ))
}

pub async fn list_available(
    state: &AppState,
    query: AvailabilityQuery,
) -> AppResult<ApiResponse<RoomList>> {
    validate_stay(query.check_in, query.check_out, Some(state.policy().today()))
        .map_err(AppError::Validation)?;
    if query.guests.is_some_and(|g| g < 1) {
        return Err(AppError::Validation("guests must be at least 1".into()));
    }

    let items = find_available(
        &state.orm,
        query.check_in,
        query.check_out,
        query.room_type_id,
        query.guests,
    )
    .await?
    .into_iter()
    .map(|(room, room_type)| room_from_entity(room, room_type))
    .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(
        check_in = %query.check_in,
        check_out = %query.check_out,
        found = items.len(),
        "availability search"
    );

    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Available rooms", RoomList { items }, Some(meta)))
}

pub async fn get_room(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Room>> {
    let (room, room_type) = load_room(&state.orm, id).await?;
    Ok(ApiResponse::single("OK", room_from_entity(room, room_type)?))
}

pub async fn list_room_types(state: &AppState) -> AppResult<ApiResponse<RoomTypeList>> {
    let items: Vec<_> = RoomTypes::find()
        .order_by_asc(RoomTypeCol::TypeName)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(room_type_from_entity)
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Room types", RoomTypeList { items }, Some(meta)))
}

pub async fn room_statistics(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<RoomStatistics>> {
    ensure_staff(user)?;
    let rows: Vec<(String, i64)> = Rooms::find()
        .select_only()
        .column(RoomCol::Status)
        .column_as(Expr::col(RoomCol::Id).count(), "count")
        .group_by(RoomCol::Status)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let mut counts = Vec::with_capacity(rows.len());
    for (status, count) in rows {
        counts.push((status.parse::<RoomStatus>()?, count));
    }
    Ok(ApiResponse::single("Room statistics", tally(counts)))
}

fn tally(counts: impl IntoIterator<Item = (RoomStatus, i64)>) -> RoomStatistics {
    let mut stats = RoomStatistics::default();
    for (status, count) in counts {
        stats.total += count;
        let slot = match status {
            RoomStatus::Available => &mut stats.available,
            RoomStatus::Occupied => &mut stats.occupied,
            RoomStatus::Cleaning => &mut stats.cleaning,
            RoomStatus::Maintenance => &mut stats.maintenance,
            RoomStatus::OutOfOrder => &mut stats.out_of_order,
        };
        *slot += count;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_sum_to_total() {
        let stats = tally([
            (RoomStatus::Available, 7),
            (RoomStatus::Occupied, 3),
            (RoomStatus::Cleaning, 1),
        ]);
        assert_eq!(stats.total, 11);
        assert_eq!(stats.available, 7);
        assert_eq!(stats.occupied, 3);
        assert_eq!(stats.cleaning, 1);
        assert_eq!(stats.maintenance, 0);
    }

    #[test]
    fn only_occupying_statuses_block_rooms() {
        let statuses = occupying_statuses();
        assert_eq!(statuses, vec!["confirmed", "checked_in"]);
    }
}
