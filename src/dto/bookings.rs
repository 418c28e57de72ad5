use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{BookingPaymentStatus, BookingStatus, PaymentMethod},
    dto::{customers::CreateCustomerRequest, invoices::InvoiceDetail},
    models::{Booking, CheckIn, Customer, Room},
};

/// Either `customer_id` (staff desk) or `guest` (self-service) must be set.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub customer_id: Option<Uuid>,
    pub guest: Option<CreateCustomerRequest>,
    pub room_id: Uuid,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub special_requests: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingCreated {
    pub booking: Booking,
    pub room: Room,
    pub nights: i64,
}

/// What a guest holding only the booking code may see: no customer record.
#[derive(Debug, Serialize, ToSchema)]
pub struct BookingSummary {
    pub booking: Booking,
    pub room: Room,
    pub nights: i64,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateBookingRequest {
    pub room_id: Option<Uuid>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub status: Option<BookingStatus>,
    pub total_amount: Option<i64>,
    pub deposit_amount: Option<i64>,
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CheckInRequest {
    pub actual_adults: Option<i32>,
    pub actual_children: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckInResult {
    pub booking_id: Uuid,
    pub check_in_id: Uuid,
    pub check_in_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckOutResult {
    pub booking: Booking,
    pub check_in: CheckIn,
    pub invoice: InvoiceDetail,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentNotification {
    pub booking_code: String,
    pub status: BookingPaymentStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GuestCancelRequest {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDetail {
    pub booking: Booking,
    pub customer: Customer,
    pub room: Room,
    pub check_in: Option<CheckIn>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingList {
    pub items: Vec<Booking>,
}
