use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    #[serde(alias = "DATABASE_URL")]
    pub database_url: String,
    #[serde(default = "default_cors_origin", alias = "CORS_ORIGIN")]
    pub cors_origin: String,
    #[serde(default = "default_rocket_port", alias = "ROCKET_PORT")]
    pub rocket_port: u16,
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_rocket_port() -> u16 {
    8000
}

impl AppConfig {
    pub fn load() -> Self {
        Figment::new()
            .merge(Toml::file("Config.toml"))
            .merge(Toml::file("../Config.toml"))
            .merge(Env::raw().only(&["DATABASE_URL", "CORS_ORIGIN", "ROCKET_PORT"]))
            .extract()
            .expect(
                "Failed to load configuration. Ensure Config.toml exists or environment variables are set (DATABASE_URL).",
            )
    }
}
