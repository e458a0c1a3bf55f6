use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;

use crate::auth::AdminUser;
use crate::db::CivicDB;
use crate::error::ApiError;
use crate::models::{Candidate, CreateCandidateRequest, UpdateCandidateRequest, prefixed_id};
use crate::schema::candidates;

#[derive(FromForm)]
pub struct CandidateFilter {
    #[field(name = "electionId")]
    pub election_id: Option<String>,
}

// Route to list candidates, optionally for one election
#[get("/?<filter..>")]
pub async fn list_candidates(
    mut db: Connection<CivicDB>,
    filter: CandidateFilter,
) -> Result<Json<Vec<Candidate>>, ApiError> {
    let mut query = candidates::table
        .select(Candidate::as_select())
        .into_boxed();
    if let Some(election_id) = filter.election_id {
        query = query.filter(candidates::election_id.eq(election_id));
    }

    let rows = query
        .order(candidates::name.asc())
        .load::<Candidate>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading candidates", e))?;

    Ok(Json(rows))
}

// Route to get a single candidate
#[get("/<id>")]
pub async fn get_candidate(
    mut db: Connection<CivicDB>,
    id: String,
) -> Result<Json<Candidate>, ApiError> {
    let candidate = candidates::table
        .find(&id)
        .select(Candidate::as_select())
        .first::<Candidate>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading candidate", e))?
        .ok_or_else(|| ApiError::not_found("Candidate not found"))?;

    Ok(Json(candidate))
}

// Admin route to create a candidate
#[post("/", format = "json", data = "<request>")]
pub async fn create_candidate(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    request: Json<CreateCandidateRequest>,
) -> Result<status::Created<Json<Candidate>>, ApiError> {
    if request.election_id.is_empty()
        || request.name.is_empty()
        || request.party.is_empty()
        || request.color.is_empty()
    {
        return Err(ApiError::bad_request(
            "electionId, name, party, color required",
        ));
    }

    let candidate = Candidate {
        id: prefixed_id("c"),
        election_id: request.election_id.clone(),
        name: request.name.trim().to_string(),
        party: request.party.trim().to_string(),
        bio: request.bio.clone(),
        color: request.color.trim().to_string(),
        image: request.image.clone(),
        vote_display_override: None,
    };

    diesel::insert_into(candidates::table)
        .values(&candidate)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("creating candidate", e))?;

    Ok(status::Created::new(format!("/api/candidates/{}", candidate.id)).body(Json(candidate)))
}

// Admin route to update a candidate. This is also where the vote display
// override is set or cleared; the vote ledger itself is never touched.
#[put("/<id>", format = "json", data = "<request>")]
pub async fn update_candidate(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
    request: Json<UpdateCandidateRequest>,
) -> Result<Json<Candidate>, ApiError> {
    let mut candidate = candidates::table
        .find(&id)
        .select(Candidate::as_select())
        .first::<Candidate>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading candidate", e))?
        .ok_or_else(|| ApiError::not_found("Candidate not found"))?;

    let request = request.into_inner();
    if request.election_id.is_none()
        && request.name.is_none()
        && request.party.is_none()
        && request.bio.is_none()
        && request.color.is_none()
        && request.image.is_none()
        && request.vote_display_override.is_none()
    {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if let Some(election_id) = request.election_id {
        candidate.election_id = election_id;
    }
    if let Some(name) = request.name {
        candidate.name = name;
    }
    if let Some(party) = request.party {
        candidate.party = party;
    }
    if let Some(bio) = request.bio {
        candidate.bio = bio;
    }
    if let Some(color) = request.color {
        candidate.color = color;
    }
    if let Some(image) = request.image {
        candidate.image = image;
    }
    if let Some(vote_display_override) = request.vote_display_override {
        candidate.vote_display_override = vote_display_override;
    }

    diesel::update(candidates::table.find(&id))
        .set(&candidate)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating candidate", e))?;

    Ok(Json(candidate))
}

// Admin route to delete a candidate
#[delete("/<id>")]
pub async fn delete_candidate(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
) -> Result<Status, ApiError> {
    diesel::delete(candidates::table.find(&id))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting candidate", e))?;

    Ok(Status::NoContent)
}
