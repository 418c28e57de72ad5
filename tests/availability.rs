mod common;

use resort_booking_api::{
    domain::BookingStatus,
    entity::bookings::{ActiveModel as BookingActive, Entity as Bookings},
    dto::rooms::AvailabilityQuery,
    error::AppError,
    services::{booking_service, room_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

use common::{book, confirmed_booking, days_from_today, room, room_type, setup_state, staff};

async fn available_ids(
    state: &AppState,
    room_type_id: Uuid,
    from: u64,
    to: u64,
) -> anyhow::Result<Vec<Uuid>> {
    let rooms = room_service::list_available(
        state,
        AvailabilityQuery {
            check_in: days_from_today(state, from),
            check_out: days_from_today(state, to),
            room_type_id: Some(room_type_id),
            guests: None,
        },
    )
    .await?
    .data
    .expect("room list");
    Ok(rooms.items.into_iter().map(|r| r.id).collect())
}

#[tokio::test]
async fn occupying_bookings_hide_rooms_for_overlapping_stays() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let deluxe = room_type(&state, 1_500_000, 2).await?;
    let a = room(&state, &deluxe, "A").await?;
    let b = room(&state, &deluxe, "B").await?;

    confirmed_booking(&state, &desk, &a, 10, 3).await?;
    book(&state, &b, 10, 3).await?;

    // Pending bookings do not hold a room.
    assert_eq!(available_ids(&state, deluxe.id, 12, 14).await?, vec![b.id]);
    assert_eq!(available_ids(&state, deluxe.id, 8, 11).await?, vec![b.id]);
    assert_eq!(available_ids(&state, deluxe.id, 11, 12).await?, vec![b.id]);

    // Stays that end on arrival day or start on departure day do not conflict.
    assert_eq!(available_ids(&state, deluxe.id, 13, 15).await?, vec![a.id, b.id]);
    assert_eq!(available_ids(&state, deluxe.id, 8, 10).await?, vec![a.id, b.id]);
    Ok(())
}

#[tokio::test]
async fn room_is_listed_once_despite_disjoint_bookings() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let suite = room_type(&state, 2_000_000, 4).await?;
    let a = room(&state, &suite, "S").await?;

    confirmed_booking(&state, &desk, &a, 20, 1).await?;
    confirmed_booking(&state, &desk, &a, 25, 1).await?;

    assert_eq!(available_ids(&state, suite.id, 22, 24).await?, vec![a.id]);
    assert!(available_ids(&state, suite.id, 20, 26).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn results_are_ordered_and_filtered_by_occupancy() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let family = room_type(&state, 2_500_000, 4).await?;
    let second = room(&state, &family, "F2").await?;
    let first = room(&state, &family, "F1").await?;

    let rooms = room_service::list_available(
        &state,
        AvailabilityQuery {
            check_in: days_from_today(&state, 30),
            check_out: days_from_today(&state, 31),
            room_type_id: Some(family.id),
            guests: Some(4),
        },
    )
    .await?
    .data
    .expect("room list");
    let numbers: Vec<_> = rooms.items.iter().map(|r| r.room_number.clone()).collect();
    assert_eq!(numbers, vec![first.room_number.clone(), second.room_number.clone()]);

    let too_many = room_service::list_available(
        &state,
        AvailabilityQuery {
            check_in: days_from_today(&state, 30),
            check_out: days_from_today(&state, 31),
            room_type_id: Some(family.id),
            guests: Some(5),
        },
    )
    .await?
    .data
    .expect("room list");
    assert!(too_many.items.is_empty());

    let err = room_service::list_available(
        &state,
        AvailabilityQuery {
            check_in: days_from_today(&state, 31),
            check_out: days_from_today(&state, 30),
            room_type_id: None,
            guests: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn create_rechecks_availability() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let standard = room_type(&state, 1_000_000, 2).await?;
    let a = room(&state, &standard, "R").await?;
    confirmed_booking(&state, &desk, &a, 40, 4).await?;

    let err = book(&state, &a, 42, 3).await.unwrap_err();
    let err = err.downcast::<AppError>()?;
    assert!(matches!(err, AppError::AvailabilityConflict(_)));

    book(&state, &a, 44, 2).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_confirmations_admit_exactly_one() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let standard = room_type(&state, 1_000_000, 2).await?;
    let a = room(&state, &standard, "C").await?;

    let first = book(&state, &a, 50, 3).await?.booking.id;
    let second = book(&state, &a, 51, 3).await?.booking.id;

    let (r1, r2) = tokio::join!(
        booking_service::confirm_booking(&state, &desk, first),
        booking_service::confirm_booking(&state, &desk, second),
    );
    let outcomes = [r1, r2];
    let confirmed = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(confirmed, 1);
    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(matches!(err, AppError::AvailabilityConflict(_)), "{err:?}");
        }
    }

    let winner = outcomes
        .into_iter()
        .find_map(Result::ok)
        .and_then(|resp| resp.data)
        .expect("confirmed booking");
    assert_eq!(winner.status, BookingStatus::Confirmed);
    assert!(available_ids(&state, standard.id, 52, 53).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_then_confirms_never_double_book() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let standard = room_type(&state, 1_000_000, 2).await?;
    let a = room(&state, &standard, "D").await?;

    let mut handles = Vec::new();
    for _ in 0..4 {
        let state = state.clone();
        let desk = desk.clone();
        let room = a.clone();
        handles.push(tokio::spawn(async move {
            let created = book(&state, &room, 60, 2).await?;
            booking_service::confirm_booking(&state, &desk, created.booking.id)
                .await
                .map_err(anyhow::Error::from)
        }));
    }

    let mut confirmed = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => confirmed += 1,
            Err(err) => {
                let err = err.downcast::<AppError>()?;
                assert!(matches!(err, AppError::AvailabilityConflict(_)));
            }
        }
    }
    assert_eq!(confirmed, 1);
    Ok(())
}

#[tokio::test]
async fn overlap_constraint_surfaces_as_availability_conflict() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let desk = staff(&state, "receptionist").await?;
    let standard = room_type(&state, 1_000_000, 2).await?;
    let a = room(&state, &standard, "X").await?;
    let first = book(&state, &a, 70, 3).await?;
    let second = book(&state, &a, 71, 2).await?;
    booking_service::confirm_booking(&state, &desk, first.booking.id).await?;

    // Skip the service-level check and write the occupying status directly.
    let row = Bookings::find_by_id(second.booking.id)
        .one(&state.orm)
        .await?
        .expect("second booking row");
    let mut active: BookingActive = row.into_active_model();
    active.status = Set(BookingStatus::Confirmed.as_str().to_string());
    let err = active.update(&state.orm).await.unwrap_err();
    assert!(matches!(
        AppError::from(err),
        AppError::AvailabilityConflict(_)
    ));

    let stored = Bookings::find_by_id(second.booking.id)
        .one(&state.orm)
        .await?
        .expect("second booking row");
    assert_eq!(stored.status, BookingStatus::Pending.as_str());
    Ok(())
}
