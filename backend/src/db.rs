// Database connection, migrations and seeding

use diesel::Connection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rocket::Rocket;
use rocket_db_pools::Database;
use rocket_db_pools::diesel::MysqlPool;

use crate::AppState;

/// Database connection pool for the civic platform
#[derive(Database)]
#[database("civic_db")]
pub struct CivicDB(MysqlPool);

// Embed migrations from the migrations directory
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run pending database migrations
pub async fn run_migrations(rocket: Rocket<rocket::Build>) -> Rocket<rocket::Build> {
    // Run migrations in a blocking task since MigrationHarness requires sync connection
    let result: Result<Vec<String>, String> = rocket::tokio::task::spawn_blocking(move || {
        // Establish a new synchronous connection for migrations
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let mut sync_conn = diesel::MysqlConnection::establish(&database_url)
            .map_err(|e| format!("Failed to establish connection: {}", e))?;

        let versions = sync_conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| format!("Failed to run migrations: {}", e))?
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<String>>();

        Ok(versions)
    })
    .await
    .expect("Migration task panicked");

    match result {
        Ok(versions) => {
            if versions.is_empty() {
                println!("✅ Database is up to date");
            } else {
                println!("✅ Applied {} migration(s):", versions.len());
                for version in versions {
                    println!("   - {}", version);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            panic!("Database migration failed");
        }
    }

    rocket
}

/// Seed database with an initial admin account and default settings
pub async fn run_seeding(rocket: Rocket<rocket::Build>) -> Rocket<rocket::Build> {
    let result: Result<(), String> = rocket::tokio::task::spawn_blocking(move || {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let mut sync_conn = diesel::MysqlConnection::establish(&database_url)
            .map_err(|e| format!("Failed to establish connection: {}", e))?;

        if let (Ok(admin_email), Ok(admin_pin)) =
            (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PIN"))
        {
            use crate::schema::users::dsl::*;

            let count: i64 = users.count().get_result(&mut sync_conn).unwrap_or(0);

            if count == 0 {
                let hash = bcrypt::hash(&admin_pin, bcrypt::DEFAULT_COST)
                    .map_err(|e| format!("Failed to hash admin pin: {}", e))?;
                let admin = crate::models::User {
                    id: crate::models::prefixed_id("user"),
                    name: "Administrator".to_string(),
                    email: admin_email.trim().to_lowercase(),
                    phone: None,
                    avatar: None,
                    pin_hash: hash,
                    is_admin: true,
                    is_sub_admin: false,
                    created_at: None,
                };
                diesel::insert_into(users)
                    .values(&admin)
                    .execute(&mut sync_conn)
                    .map_err(|e| format!("Failed to seed admin account: {}", e))?;
                println!("🌱 Seeded admin account {}", admin.email);
            }
        }

        {
            use crate::schema::platform_settings::dsl::*;

            let existing: i64 = platform_settings
                .filter(setting_key.eq("voting_paused"))
                .count()
                .get_result(&mut sync_conn)
                .unwrap_or(0);

            if existing == 0 {
                diesel::insert_into(platform_settings)
                    .values(&crate::models::Setting {
                        setting_key: "voting_paused".to_string(),
                        setting_value: "false".to_string(),
                    })
                    .execute(&mut sync_conn)
                    .map_err(|e| format!("Failed to seed settings: {}", e))?;
            }
        }

        Ok(())
    })
    .await
    .expect("Seeding task panicked");

    if let Err(e) = result {
        eprintln!("❌ Seeding failed: {}", e);
    }

    rocket
}

/// Load persisted runtime toggles into the shared application state
pub async fn load_runtime_settings(rocket: Rocket<rocket::Build>) -> Rocket<rocket::Build> {
    let paused: bool = rocket::tokio::task::spawn_blocking(move || {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let mut sync_conn = match diesel::MysqlConnection::establish(&database_url) {
            Ok(conn) => conn,
            Err(e) => {
                eprintln!("❌ Failed to load settings: {}", e);
                return false;
            }
        };

        use crate::schema::platform_settings::dsl::*;

        platform_settings
            .find("voting_paused")
            .select(setting_value)
            .first::<String>(&mut sync_conn)
            .map(|v| v == "true")
            .unwrap_or(false)
    })
    .await
    .expect("Settings task panicked");

    if let Some(state) = rocket.state::<AppState>() {
        state
            .voting_paused
            .store(paused, std::sync::atomic::Ordering::Relaxed);
    }

    rocket
}
