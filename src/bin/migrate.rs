use resort_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
};

/// Applies `migrations/*.sql` against `DATABASE_URL` and reports each file.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,resort_booking_api=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    let applied = run_migrations(&orm).await?;
    for migration in &applied {
        tracing::info!(
            file = %migration.file.display(),
            statements = migration.statements,
            "migration applied"
        );
    }
    tracing::info!(files = applied.len(), "schema is up to date");
    Ok(())
}
