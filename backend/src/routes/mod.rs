// Routes module - organizes all HTTP route handlers

pub mod auth;
pub mod candidates;
pub mod chat;
pub mod comments;
pub mod countries;
pub mod elections;
pub mod news;
pub mod settings;
pub mod votes;

use rocket::http::Status;
use rocket::serde::json::Json;

use crate::error::ErrorBody;
use crate::models::HealthResponse;

#[get("/health")]
pub fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

// CORS preflight for any path
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}

#[catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Bad request".to_string(),
    })
}

#[catch(401)]
pub fn unauthorized() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Authorization required".to_string(),
    })
}

#[catch(403)]
pub fn forbidden() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Admin access required".to_string(),
    })
}

#[catch(404)]
pub fn not_found() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Not found".to_string(),
    })
}

#[catch(422)]
pub fn unprocessable() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Malformed request body".to_string(),
    })
}

#[catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    Json(ErrorBody {
        error: "Internal server error".to_string(),
    })
}
