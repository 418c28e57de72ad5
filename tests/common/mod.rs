#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use resort_booking_api::{
    config::{AppConfig, BookingPolicy},
    db::{create_orm_conn, run_migrations},
    dto::{
        bookings::{BookingCreated, CreateBookingRequest},
        customers::CreateCustomerRequest,
    },
    entity::{
        room_types::{ActiveModel as RoomTypeActive, Model as RoomTypeModel},
        rooms::{ActiveModel as RoomActive, Model as RoomModel},
        users::ActiveModel as UserActive,
    },
    domain::PaymentMethod,
    middleware::auth::AuthUser,
    services::booking_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

pub const NOTIFY_SECRET: &str = "integration-notify-secret";

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// State against the test database, or `None` when no database is configured.
/// Tests never truncate: every fixture uses fresh identifiers.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    let orm = create_orm_conn(&database_url).await?;
    MIGRATED
        .get_or_try_init(|| async { run_migrations(&orm).await.map(|_| ()) })
        .await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-test-secret".into(),
        payment_notify_secret: NOTIFY_SECRET.into(),
        run_migrations: false,
        booking: BookingPolicy::default(),
    };
    Ok(Some(AppState::new(orm, config)))
}

fn suffix() -> String {
    Uuid::new_v4().simple().to_string()[..10].to_string()
}

pub fn days_from_today(state: &AppState, days: u64) -> NaiveDate {
    state
        .policy()
        .today()
        .checked_add_days(Days::new(days))
        .expect("date in range")
}

pub async fn staff(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{role}-{}@resort.test", suffix())),
        password_hash: Set("not-a-real-hash".into()),
        full_name: Set(Some(format!("Test {role}"))),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn room_type(
    state: &AppState,
    base_price: i64,
    max_occupancy: i32,
) -> anyhow::Result<RoomTypeModel> {
    let room_type = RoomTypeActive {
        id: Set(Uuid::new_v4()),
        type_name: Set(format!("Type {}", suffix())),
        description: Set(None),
        base_price: Set(base_price),
        max_occupancy: Set(max_occupancy),
        amenities: Set(Some("wifi".into())),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(room_type)
}

pub async fn room(state: &AppState, room_type: &RoomTypeModel, number: &str) -> anyhow::Result<RoomModel> {
    let room = RoomActive {
        id: Set(Uuid::new_v4()),
        room_number: Set(format!("{number}-{}", suffix())),
        room_type_id: Set(room_type.id),
        floor_number: Set(Some(1)),
        status: Set("available".into()),
        notes: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(room)
}

pub fn guest_contact() -> CreateCustomerRequest {
    CreateCustomerRequest {
        first_name: "Minh".into(),
        last_name: "Tran".into(),
        email: format!("guest-{}@example.com", suffix()),
        phone: Some("0901234567".into()),
        address: None,
        nationality: Some("VN".into()),
        notes: None,
    }
}

pub fn booking_request(
    room: &RoomModel,
    guest: CreateCustomerRequest,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> CreateBookingRequest {
    CreateBookingRequest {
        customer_id: None,
        guest: Some(guest),
        room_id: room.id,
        check_in_date: check_in,
        check_out_date: check_out,
        adults: Some(2),
        children: Some(0),
        special_requests: None,
        payment_method: Some(PaymentMethod::Cash),
    }
}

/// Guest booking for `room` from `from` days ahead for `nights` nights.
pub async fn book(
    state: &AppState,
    room: &RoomModel,
    from: u64,
    nights: u64,
) -> anyhow::Result<BookingCreated> {
    let request = booking_request(
        room,
        guest_contact(),
        days_from_today(state, from),
        days_from_today(state, from + nights),
    );
    let created = booking_service::create_booking(state, None, request)
        .await?
        .data
        .expect("booking data");
    Ok(created)
}

/// Guest booking that front desk has already confirmed.
pub async fn confirmed_booking(
    state: &AppState,
    desk: &AuthUser,
    room: &RoomModel,
    from: u64,
    nights: u64,
) -> anyhow::Result<Uuid> {
    let created = book(state, room, from, nights).await?;
    booking_service::confirm_booking(state, desk, created.booking.id).await?;
    Ok(created.booking.id)
}
