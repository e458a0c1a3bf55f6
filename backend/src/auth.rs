// Bearer-token request guards
//
// Session tokens are opaque UUIDs stored in auth_sessions. Every guard
// resolves the token against the database, so a revoked or expired session
// stops working immediately.

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;

use crate::db::CivicDB;
use crate::models::User;
use crate::schema::{auth_sessions, users};

/// Any authenticated user
pub struct AuthUser(pub User);

/// Authenticated user with the admin flag set. Routes use this purely as a
/// gate, so it carries no payload; take `AuthUser` as well when the account
/// itself is needed.
pub struct AdminUser;

/// Admin or sub-admin, for content moderation routes
pub struct Moderator;

/// The raw bearer token as presented, for session invalidation
pub struct BearerToken(pub String);

pub fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

async fn user_for_request(req: &Request<'_>) -> Option<User> {
    let header = req.headers().get_one("Authorization")?;
    let token = parse_bearer(header)?;

    let mut db = match req.guard::<Connection<CivicDB>>().await {
        Outcome::Success(db) => db,
        _ => return None,
    };

    let now = chrono::Utc::now().naive_utc();
    auth_sessions::table
        .inner_join(users::table)
        .filter(auth_sessions::token.eq(token))
        .filter(
            auth_sessions::expires_at
                .is_null()
                .or(auth_sessions::expires_at.gt(now)),
        )
        .select(User::as_select())
        .first::<User>(&mut db)
        .await
        .ok()
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match user_for_request(req).await {
            Some(user) => Outcome::Success(AuthUser(user)),
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BearerToken {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = req
            .headers()
            .get_one("Authorization")
            .and_then(parse_bearer);
        match token {
            Some(token) => Outcome::Success(BearerToken(token.to_string())),
            None => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.guard::<AuthUser>().await {
            Outcome::Success(AuthUser(user)) if user.is_admin => Outcome::Success(AdminUser),
            Outcome::Success(_) => Outcome::Error((Status::Forbidden, ())),
            _ => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Moderator {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.guard::<AuthUser>().await {
            Outcome::Success(AuthUser(user)) if user.is_admin || user.is_sub_admin => {
                Outcome::Success(Moderator)
            }
            Outcome::Success(_) => Outcome::Error((Status::Forbidden, ())),
            _ => Outcome::Error((Status::Unauthorized, ())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_bearer;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(parse_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer("Bearer  abc123 "), Some("abc123"));
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(parse_bearer("abc123"), None);
        assert_eq!(parse_bearer("bearer abc123"), None);
        assert_eq!(parse_bearer("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer(""), None);
    }
}
