use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{Room, RoomType};

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_type_id: Option<Uuid>,
    /// Minimum occupancy the room type must accommodate.
    pub guests: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomList {
    pub items: Vec<Room>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomTypeList {
    pub items: Vec<RoomType>,
}

#[derive(Debug, Default, Serialize, ToSchema, PartialEq, Eq)]
pub struct RoomStatistics {
    pub total: i64,
    pub available: i64,
    pub occupied: i64,
    pub cleaning: i64,
    pub maintenance: i64,
    pub out_of_order: i64,
}
