use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use axum_ticketing_api::{config::AppConfig, db::create_pool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin", "admin@example.com", "admin123", "admin").await?;
    let organizer_id = ensure_user(
        &pool,
        "test_organizer",
        "organizer@example.com",
        "testpass123",
        "organizer",
    )
    .await?;
    let attendee_id = ensure_user(
        &pool,
        "test_attendee",
        "attendee@example.com",
        "testpass123",
        "attendee",
    )
    .await?;

    seed_categories(&pool).await?;
    seed_events(&pool, organizer_id).await?;

    println!(
        "Seed completed. Admin ID: {admin_id}, Organizer ID: {organizer_id}, Attendee ID: {attendee_id}"
    );
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} (role={role})");
    Ok(user_id)
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let names = ["concert", "conference", "sports", "workshop", "party"];

    for name in names {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_events(pool: &sqlx::PgPool, organizer_id: Uuid) -> anyhow::Result<()> {
    // (title, description, location, days from now, price, capacity, category)
    let events = vec![
        (
            "Summer Music Festival",
            "Live music across multiple stages with top artists.",
            "Central Park Arena, New York, NY",
            30_i64,
            7500_i64,
            5000_i32,
            "concert",
        ),
        (
            "Tech Innovation Summit",
            "Talks and workshops on the latest technology trends.",
            "Convention Center, San Francisco, CA",
            45,
            12000,
            1200,
            "conference",
        ),
        (
            "City Marathon",
            "Annual marathon through the city center.",
            "Downtown, Chicago, IL",
            60,
            2500,
            10000,
            "sports",
        ),
        (
            "Pottery Workshop",
            "Hands-on introduction to wheel throwing.",
            "Arts Quarter Studio, Portland, OR",
            14,
            4000,
            12,
            "workshop",
        ),
    ];

    for (title, description, location, days, price, capacity, category) in events {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE title = $1")
            .bind(title)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        let date = Utc::now() + Duration::days(days);
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, date, location, price, capacity, organizer_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, (SELECT id FROM categories WHERE name = $9))
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(description)
        .bind(date)
        .bind(location)
        .bind(price)
        .bind(capacity)
        .bind(organizer_id)
        .bind(category)
        .execute(pool)
        .await?;
    }

    println!("Seeded events");
    Ok(())
}
