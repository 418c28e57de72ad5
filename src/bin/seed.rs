use resort_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations, sqlx_pool},
    services::auth_service::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    let pool = sqlx_pool(&orm);

    let admin_id = ensure_user(&pool, "admin@resort.local", "admin12345", "admin").await?;
    let desk_id = ensure_user(&pool, "desk@resort.local", "desk12345", "receptionist").await?;
    ensure_user(&pool, "cashier@resort.local", "cashier12345", "cashier").await?;
    seed_rooms(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Front desk ID: {desk_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, full_name, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(format!("Seeded {role}"))
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_rooms(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let room_types = [
        ("Standard", "Garden view, queen bed", 1_000_000_i64, 2, "wifi,air_conditioning"),
        ("Deluxe", "Sea view, king bed, balcony", 1_800_000, 3, "wifi,minibar,balcony"),
        ("Family Suite", "Two bedrooms and a living area", 3_200_000, 5, "wifi,minibar,kitchenette"),
        ("Beach Villa", "Private pool on the beach", 6_500_000, 4, "wifi,private_pool,butler"),
    ];

    for (index, (name, description, price, occupancy, amenities)) in
        room_types.into_iter().enumerate()
    {
        let (type_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO room_types (id, type_name, description, base_price, max_occupancy, amenities)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (type_name) DO UPDATE SET base_price = EXCLUDED.base_price
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(occupancy)
        .bind(amenities)
        .fetch_one(pool)
        .await?;

        let floor = index as i32 + 1;
        for n in 1..=4 {
            sqlx::query(
                r#"
                INSERT INTO rooms (id, room_number, room_type_id, floor_number)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (room_number) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(format!("{floor}{n:02}"))
            .bind(type_id)
            .bind(floor)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded room types and rooms");
    Ok(())
}
