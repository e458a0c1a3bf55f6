use bcrypt::{DEFAULT_COST, hash, verify};
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::db::CivicDB;
use crate::error::{ApiError, is_unique_violation};
use crate::models::{
    AuthResponse, LoginRequest, NewAuthSession, RegisterRequest, User, UserResponse, prefixed_id,
};
use crate::schema::{auth_sessions, users};

const SESSION_DAYS: i64 = 7;

async fn open_session(
    db: &mut Connection<CivicDB>,
    user_id: &str,
) -> Result<String, ApiError> {
    let token = Uuid::new_v4().to_string();
    let expires = chrono::Utc::now().naive_utc() + chrono::Duration::days(SESSION_DAYS);

    let new_session = NewAuthSession {
        token: token.clone(),
        user_id: user_id.to_string(),
        expires_at: Some(expires),
    };

    diesel::insert_into(auth_sessions::table)
        .values(&new_session)
        .execute(db)
        .await
        .map_err(|e| ApiError::internal("creating session", e))?;

    Ok(token)
}

// Route to register a new account
#[post("/register", format = "json", data = "<request>")]
pub async fn register(
    mut db: Connection<CivicDB>,
    request: Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if request.name.trim().is_empty() || request.email.trim().is_empty() || request.pin.is_empty()
    {
        return Err(ApiError::bad_request("Name, email, and pin are required"));
    }

    let pin_hash = hash(&request.pin, DEFAULT_COST)
        .map_err(|e| ApiError::internal("hashing pin", e))?;

    let user = User {
        id: prefixed_id("user"),
        name: request.name.trim().to_string(),
        email: request.email.trim().to_lowercase(),
        phone: request.phone.as_deref().map(|p| p.trim().to_string()),
        avatar: None,
        pin_hash,
        is_admin: false,
        is_sub_admin: false,
        created_at: None,
    };

    let result = diesel::insert_into(users::table)
        .values(&user)
        .execute(&mut db)
        .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::bad_request("Email already registered"));
        }
        Err(e) => return Err(ApiError::internal("registering user", e)),
    }

    let token = open_session(&mut db, &user.id).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}

// Route to log in with email and pin
#[post("/login", format = "json", data = "<request>")]
pub async fn login(
    mut db: Connection<CivicDB>,
    request: Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if request.email.trim().is_empty() || request.pin.is_empty() {
        return Err(ApiError::bad_request("Email and pin are required"));
    }

    let user = users::table
        .filter(users::email.eq(request.email.trim().to_lowercase()))
        .select(User::as_select())
        .first::<User>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading user", e))?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or pin"))?;

    if !verify(&request.pin, &user.pin_hash).unwrap_or(false) {
        return Err(ApiError::unauthorized("Invalid email or pin"));
    }

    let token = open_session(&mut db, &user.id).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(user),
        token,
    }))
}

// Route to get the authenticated account
#[get("/me")]
pub async fn me(user: AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(user.0))
}

// Route to invalidate the presented session token
#[post("/logout")]
pub async fn logout(
    mut db: Connection<CivicDB>,
    token: crate::auth::BearerToken,
) -> Result<rocket::http::Status, ApiError> {
    diesel::delete(auth_sessions::table.find(token.0))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting session", e))?;
    Ok(rocket::http::Status::Ok)
}
