mod common;

use axum::extract::State;
use resort_booking_api::routes::health::{health_check, readiness};

use common::setup_state;

#[tokio::test]
async fn liveness_needs_no_database() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn readiness_reports_resort_day() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let today = state.policy().today();

    let response = readiness(State(state)).await?;
    let data = response.0.data.expect("readiness data");
    assert_eq!(data.database, "ok");
    assert_eq!(data.resort_today, today);
    Ok(())
}
