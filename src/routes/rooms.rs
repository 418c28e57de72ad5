use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::rooms::{AvailabilityQuery, RoomList, RoomStatistics, RoomTypeList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Room,
    response::ApiResponse,
    services::room_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/available", get(available_rooms))
        .route("/types", get(room_types))
        .route("/statistics", get(room_statistics))
        .route("/{id}", get(get_room))
}

#[utoipa::path(
    get,
    path = "/api/rooms/available",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Rooms free for the whole stay, by room number", body = ApiResponse<RoomList>),
        (status = 400, description = "Invalid dates")
    ),
    tag = "Rooms"
)]
pub async fn available_rooms(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<ApiResponse<RoomList>>> {
    let resp = room_service::list_available(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/rooms/types",
    responses(
        (status = 200, description = "Room types", body = ApiResponse<RoomTypeList>)
    ),
    tag = "Rooms"
)]
pub async fn room_types(State(state): State<AppState>) -> AppResult<Json<ApiResponse<RoomTypeList>>> {
    let resp = room_service::list_room_types(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/rooms/statistics",
    responses(
        (status = 200, description = "Room count per operational status", body = ApiResponse<RoomStatistics>)
    ),
    security(("bearer_auth" = [])),
    tag = "Rooms"
)]
pub async fn room_statistics(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<RoomStatistics>>> {
    let resp = room_service::room_statistics(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    params(("id" = Uuid, Path, description = "Room ID")),
    responses(
        (status = 200, description = "Room with its type", body = ApiResponse<Room>),
        (status = 404, description = "Room not found")
    ),
    tag = "Rooms"
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Room>>> {
    let resp = room_service::get_room(&state, id).await?;
    Ok(Json(resp))
}
