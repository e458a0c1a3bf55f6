// Main application entry point

#[macro_use]
extern crate rocket;

mod auth;
mod config;
mod cors;
mod db;
mod error;
mod models;
mod routes;
mod schema;
mod tally;

use std::sync::atomic::AtomicBool;

use rocket::fairing::AdHoc;
use rocket_db_pools::Database;

use config::AppConfig;
use db::CivicDB;

/// Shared mutable state. Everything else is per-request; correctness of the
/// voting invariant rests on the database's unique constraint, not on
/// anything held here.
pub struct AppState {
    pub voting_paused: AtomicBool,
}

#[rocket::launch]
fn rocket() -> _ {
    let app_config = AppConfig::load();

    let figment = rocket::config::Config::figment()
        .merge(("port", app_config.rocket_port))
        .merge((
            "databases.civic_db",
            rocket_db_pools::Config {
                url: app_config.database_url.clone(),
                min_connections: None,
                max_connections: 64,
                connect_timeout: 5,
                idle_timeout: None,
                extensions: None,
            },
        ));

    rocket::custom(figment)
        .manage(AppState {
            voting_paused: AtomicBool::new(false),
        })
        .attach(CivicDB::init())
        .attach(AdHoc::on_ignite("Database Migrations", db::run_migrations))
        .attach(AdHoc::on_ignite("Database Seeding", db::run_seeding))
        .attach(AdHoc::on_ignite(
            "Runtime Settings",
            db::load_runtime_settings,
        ))
        .attach(cors::Cors {
            allowed_origin: app_config.cors_origin.clone(),
        })
        .mount("/", routes![routes::preflight])
        .mount("/api", routes![routes::health])
        .mount(
            "/api/auth",
            routes![
                routes::auth::register,
                routes::auth::login,
                routes::auth::me,
                routes::auth::logout,
            ],
        )
        .mount(
            "/api/countries",
            routes![
                routes::countries::list_countries,
                routes::countries::get_country,
                routes::countries::create_country,
                routes::countries::update_country,
                routes::countries::delete_country,
            ],
        )
        .mount(
            "/api/elections",
            routes![
                routes::elections::list_elections,
                routes::elections::get_election,
                routes::elections::election_stats,
                routes::elections::create_election,
                routes::elections::update_election,
                routes::elections::delete_election,
            ],
        )
        .mount(
            "/api/candidates",
            routes![
                routes::candidates::list_candidates,
                routes::candidates::get_candidate,
                routes::candidates::create_candidate,
                routes::candidates::update_candidate,
                routes::candidates::delete_candidate,
            ],
        )
        .mount(
            "/api/votes",
            routes![
                routes::votes::cast_vote,
                routes::votes::check_vote,
                routes::votes::user_votes,
                routes::votes::total_votes,
                routes::votes::all_votes,
            ],
        )
        .mount(
            "/api/news",
            routes![
                routes::news::list_news,
                routes::news::get_news,
                routes::news::create_news,
                routes::news::update_news,
                routes::news::delete_news,
            ],
        )
        .mount(
            "/api/comments",
            routes![
                routes::comments::election_comments,
                routes::comments::create_comment,
                routes::comments::toggle_like,
                routes::comments::update_comment,
                routes::comments::delete_comment,
                routes::comments::all_comments,
                routes::comments::comment_stats,
            ],
        )
        .mount(
            "/api/chat",
            routes![
                routes::chat::list_rooms,
                routes::chat::get_room,
                routes::chat::create_room,
                routes::chat::update_room,
                routes::chat::delete_room,
                routes::chat::room_messages,
                routes::chat::post_message,
                routes::chat::update_message,
                routes::chat::delete_message,
                routes::chat::flagged_messages,
            ],
        )
        .mount(
            "/api/settings",
            routes![
                routes::settings::list_settings,
                routes::settings::get_setting,
                routes::settings::put_setting,
                routes::settings::delete_setting,
            ],
        )
        .register(
            "/",
            catchers![
                routes::bad_request,
                routes::unauthorized,
                routes::forbidden,
                routes::not_found,
                routes::unprocessable,
                routes::internal_error,
            ],
        )
}
