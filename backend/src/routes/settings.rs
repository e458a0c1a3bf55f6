use rocket::State;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::Ordering;

use crate::AppState;
use crate::auth::AdminUser;
use crate::db::CivicDB;
use crate::error::ApiError;
use crate::models::{Setting, SettingResponse, UpdateSettingRequest};
use crate::schema::platform_settings;

// Route to fetch all platform settings as a key/value map
#[get("/")]
pub async fn list_settings(
    mut db: Connection<CivicDB>,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    let rows = platform_settings::table
        .select(Setting::as_select())
        .load::<Setting>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading settings", e))?;

    Ok(Json(
        rows.into_iter()
            .map(|s| (s.setting_key, s.setting_value))
            .collect(),
    ))
}

// Route to fetch a single setting
#[get("/<key>")]
pub async fn get_setting(
    mut db: Connection<CivicDB>,
    key: String,
) -> Result<Json<SettingResponse>, ApiError> {
    let setting = platform_settings::table
        .find(&key)
        .select(Setting::as_select())
        .first::<Setting>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading setting", e))?
        .ok_or_else(|| ApiError::not_found("Setting not found"))?;

    Ok(Json(SettingResponse {
        key: setting.setting_key,
        value: setting.setting_value,
    }))
}

// Admin route to create or replace a setting. The voting_paused toggle is
// mirrored into shared state so the vote route sees it without a query.
#[put("/<key>", format = "json", data = "<request>")]
pub async fn put_setting(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    state: &State<AppState>,
    key: String,
    request: Json<UpdateSettingRequest>,
) -> Result<Json<SettingResponse>, ApiError> {
    let value = request.into_inner().value.unwrap_or_default();

    diesel::replace_into(platform_settings::table)
        .values(&Setting {
            setting_key: key.clone(),
            setting_value: value.clone(),
        })
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating setting", e))?;

    if key == "voting_paused" {
        state.voting_paused.store(value == "true", Ordering::Relaxed);
    }

    Ok(Json(SettingResponse { key, value }))
}

// Admin route to delete a setting
#[delete("/<key>")]
pub async fn delete_setting(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    state: &State<AppState>,
    key: String,
) -> Result<Status, ApiError> {
    diesel::delete(platform_settings::table.find(&key))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting setting", e))?;

    if key == "voting_paused" {
        state.voting_paused.store(false, Ordering::Relaxed);
    }

    Ok(Status::NoContent)
}
