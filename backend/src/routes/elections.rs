use diesel::dsl::count;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::http::Status;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;

use crate::auth::AdminUser;
use crate::db::CivicDB;
use crate::error::ApiError;
use crate::models::{CreateElectionRequest, Election, UpdateElectionRequest, prefixed_id};
use crate::schema::{candidates, elections, votes};
use crate::tally::{CandidateCount, TallyRow, compute_tally};

// Route to list elections ordered by date
#[get("/")]
pub async fn list_elections(
    mut db: Connection<CivicDB>,
) -> Result<Json<Vec<Election>>, ApiError> {
    let rows = elections::table
        .order(elections::date.asc())
        .select(Election::as_select())
        .load::<Election>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading elections", e))?;

    Ok(Json(rows))
}

// Route to get a single election
#[get("/<id>")]
pub async fn get_election(
    mut db: Connection<CivicDB>,
    id: String,
) -> Result<Json<Election>, ApiError> {
    let election = elections::table
        .find(&id)
        .select(Election::as_select())
        .first::<Election>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading election", e))?
        .ok_or_else(|| ApiError::not_found("Election not found"))?;

    Ok(Json(election))
}

// Route to get the tally for an election. One grouped query yields each
// candidate's raw ledger count together with its display override; the
// arithmetic lives in the tally module.
#[get("/<id>/stats")]
pub async fn election_stats(
    mut db: Connection<CivicDB>,
    id: String,
) -> Result<Json<Vec<TallyRow>>, ApiError> {
    let exists: i64 = elections::table
        .find(&id)
        .count()
        .get_result(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading election", e))?;

    if exists == 0 {
        return Err(ApiError::not_found("Election not found"));
    }

    let counts = candidates::table
        .left_join(votes::table)
        .filter(candidates::election_id.eq(&id))
        .group_by(candidates::id)
        .select((
            candidates::id,
            candidates::name,
            candidates::color,
            candidates::vote_display_override,
            count(votes::id.nullable()),
        ))
        .load::<CandidateCount>(&mut db)
        .await
        .map_err(|e| ApiError::internal("tallying votes", e))?;

    Ok(Json(compute_tally(counts)))
}

// Admin route to create an election
#[post("/", format = "json", data = "<request>")]
pub async fn create_election(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    request: Json<CreateElectionRequest>,
) -> Result<status::Created<Json<Election>>, ApiError> {
    if request.country_id.is_empty()
        || request.election_type.is_empty()
        || request.description.is_empty()
    {
        return Err(ApiError::bad_request(
            "countryId, type, date, description required",
        ));
    }

    let election = Election {
        id: prefixed_id("e"),
        country_id: request.country_id.clone(),
        election_type: request.election_type.clone(),
        date: request.date,
        status: request
            .status
            .clone()
            .unwrap_or_else(|| "upcoming".to_string()),
        description: request.description.clone(),
    };

    diesel::insert_into(elections::table)
        .values(&election)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("creating election", e))?;

    Ok(status::Created::new(format!("/api/elections/{}", election.id)).body(Json(election)))
}

// Admin route to update an election
#[put("/<id>", format = "json", data = "<request>")]
pub async fn update_election(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
    request: Json<UpdateElectionRequest>,
) -> Result<Json<Election>, ApiError> {
    let mut election = elections::table
        .find(&id)
        .select(Election::as_select())
        .first::<Election>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading election", e))?
        .ok_or_else(|| ApiError::not_found("Election not found"))?;

    let request = request.into_inner();
    if request.country_id.is_none()
        && request.election_type.is_none()
        && request.date.is_none()
        && request.status.is_none()
        && request.description.is_none()
    {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if let Some(country_id) = request.country_id {
        election.country_id = country_id;
    }
    if let Some(election_type) = request.election_type {
        election.election_type = election_type;
    }
    if let Some(date) = request.date {
        election.date = date;
    }
    if let Some(status) = request.status {
        election.status = status;
    }
    if let Some(description) = request.description {
        election.description = description;
    }

    diesel::update(elections::table.find(&id))
        .set(&election)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating election", e))?;

    Ok(Json(election))
}

// Admin route to delete an election
#[delete("/<id>")]
pub async fn delete_election(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
) -> Result<Status, ApiError> {
    diesel::delete(elections::table.find(&id))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting election", e))?;

    Ok(Status::NoContent)
}
