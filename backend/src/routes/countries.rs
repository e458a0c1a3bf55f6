use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;

use crate::auth::AdminUser;
use crate::db::CivicDB;
use crate::error::ApiError;
use crate::models::{Country, CreateCountryRequest, UpdateCountryRequest, prefixed_id};
use crate::schema::countries;

// Route to list countries ordered by name
#[get("/")]
pub async fn list_countries(mut db: Connection<CivicDB>) -> Result<Json<Vec<Country>>, ApiError> {
    let rows = countries::table
        .order(countries::name.asc())
        .select(Country::as_select())
        .load::<Country>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading countries", e))?;

    Ok(Json(rows))
}

// Route to get a single country
#[get("/<id>")]
pub async fn get_country(
    mut db: Connection<CivicDB>,
    id: String,
) -> Result<Json<Country>, ApiError> {
    let country = countries::table
        .find(&id)
        .select(Country::as_select())
        .first::<Country>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading country", e))?
        .ok_or_else(|| ApiError::not_found("Country not found"))?;

    Ok(Json(country))
}

// Admin route to create a country
#[post("/", format = "json", data = "<request>")]
pub async fn create_country(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    request: Json<CreateCountryRequest>,
) -> Result<status::Created<Json<Country>>, ApiError> {
    if request.name.is_empty() || request.code.is_empty() || request.flag.is_empty() {
        return Err(ApiError::bad_request("Name, flag, and code are required"));
    }

    let country = Country {
        id: prefixed_id("co"),
        name: request.name.clone(),
        code: request.code.clone(),
        flag: request.flag.clone(),
    };

    diesel::insert_into(countries::table)
        .values(&country)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("creating country", e))?;

    Ok(status::Created::new(format!("/api/countries/{}", country.id)).body(Json(country)))
}

// Admin route to update a country
#[put("/<id>", format = "json", data = "<request>")]
pub async fn update_country(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
    request: Json<UpdateCountryRequest>,
) -> Result<Json<Country>, ApiError> {
    let mut country = countries::table
        .find(&id)
        .select(Country::as_select())
        .first::<Country>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading country", e))?
        .ok_or_else(|| ApiError::not_found("Country not found"))?;

    let request = request.into_inner();
    if request.name.is_none() && request.code.is_none() && request.flag.is_none() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if let Some(name) = request.name {
        country.name = name;
    }
    if let Some(code) = request.code {
        country.code = code;
    }
    if let Some(flag) = request.flag {
        country.flag = flag;
    }

    diesel::update(countries::table.find(&id))
        .set(&country)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating country", e))?;

    Ok(Json(country))
}

// Admin route to delete a country
#[delete("/<id>")]
pub async fn delete_country(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
) -> Result<Status, ApiError> {
    diesel::delete(countries::table.find(&id))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting country", e))?;

    Ok(Status::NoContent)
}
