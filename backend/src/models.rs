use chrono::{NaiveDate, NaiveDateTime};
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use rocket_db_pools::diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::{
    auth_sessions, candidates, chat_messages, chat_rooms, comment_likes, comments, countries,
    elections, news, platform_settings, users, votes,
};

/// Deserializer for nullable update fields. Serde collapses JSON `null` into
/// the outer `Option`, so a plain `Option<Option<T>>` cannot tell "field
/// absent" from "field set to null"; this only runs when the field is present
/// and wraps whatever it finds, leaving `None` to mean absent.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Server-generated entity id: a short prefix naming the entity kind plus
/// twelve random alphanumeric characters, e.g. `v_x1GJ9qLmWb2K`.
pub fn prefixed_id(prefix: &str) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!("{}_{}", prefix, suffix)
}

// ---------------------------------------------------------------------------
// Users and sessions

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub pin_hash: String,
    pub is_admin: bool,
    pub is_sub_admin: bool,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = auth_sessions)]
pub struct NewAuthSession {
    pub token: String,
    pub user_id: String,
    pub expires_at: Option<NaiveDateTime>,
}

/// Public view of a user account; never exposes the pin hash
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub is_admin: bool,
    pub is_sub_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            avatar: user.avatar,
            is_admin: user.is_admin,
            is_sub_admin: user.is_sub_admin,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub pin: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub pin: String,
}

// ---------------------------------------------------------------------------
// Countries

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = countries)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: String,
    pub name: String,
    pub code: String,
    pub flag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCountryRequest {
    pub name: String,
    pub code: String,
    pub flag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCountryRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub flag: Option<String>,
}

// ---------------------------------------------------------------------------
// Elections

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = elections)]
#[serde(rename_all = "camelCase")]
pub struct Election {
    pub id: String,
    pub country_id: String,
    #[serde(rename = "type")]
    pub election_type: String,
    pub date: NaiveDate,
    pub status: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateElectionRequest {
    pub country_id: String,
    #[serde(rename = "type")]
    pub election_type: String,
    pub date: NaiveDate,
    pub status: Option<String>,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateElectionRequest {
    pub country_id: Option<String>,
    #[serde(rename = "type")]
    pub election_type: Option<String>,
    pub date: Option<NaiveDate>,
    pub status: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Candidates

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = candidates, treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub election_id: String,
    pub name: String,
    pub party: String,
    pub bio: Option<String>,
    pub color: String,
    pub image: Option<String>,
    pub vote_display_override: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCandidateRequest {
    pub election_id: String,
    pub name: String,
    pub party: String,
    pub bio: Option<String>,
    pub color: String,
    pub image: Option<String>,
}

/// Nullable fields use a double Option so admins can clear them:
/// absent means "leave unchanged", an explicit null means "set to NULL".
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidateRequest {
    pub election_id: Option<String>,
    pub name: Option<String>,
    pub party: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub vote_display_override: Option<Option<i32>>,
}

// ---------------------------------------------------------------------------
// Votes

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = votes)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub user_id: String,
    pub election_id: String,
    pub candidate_id: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest {
    pub election_id: String,
    pub candidate_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCheckResponse {
    pub has_voted: bool,
    pub vote: Option<Vote>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalVotesResponse {
    pub total_votes: i64,
}

// ---------------------------------------------------------------------------
// News

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = news, treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub country_id: String,
    pub election_id: Option<String>,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub priority: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub country_id: String,
    pub election_id: Option<String>,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsRequest {
    pub country_id: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub election_id: Option<Option<String>>,
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    pub priority: Option<String>,
}

// ---------------------------------------------------------------------------
// Comments

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = comments, treat_none_as_null = true)]
pub struct Comment {
    pub id: String,
    pub election_id: String,
    pub user_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub flagged: bool,
    pub approved: bool,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comment_likes)]
pub struct NewCommentLike {
    pub comment_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub election_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub likes: i64,
    pub liked_by: Vec<String>,
    pub replies: Vec<CommentResponse>,
    pub flagged: bool,
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub election_id: String,
    pub parent_comment_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub content: Option<String>,
    pub approved: Option<bool>,
    pub flagged: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLikeResponse {
    pub likes: i64,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentStatsResponse {
    pub total_comments: i64,
    pub pending_comments: i64,
}

// ---------------------------------------------------------------------------
// Chat

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = chat_rooms, treat_none_as_null = true)]
pub struct ChatRoom {
    pub id: String,
    pub room_type: String,
    pub entity_id: String,
    pub name: String,
    pub description: Option<String>,
    pub active_users: i32,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoomResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub entity_id: String,
    pub name: String,
    pub description: String,
    pub pinned_messages: Vec<String>,
    pub created_at: Option<NaiveDateTime>,
    pub active_users: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRoomRequest {
    #[serde(rename = "type")]
    pub room_type: String,
    pub entity_id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatRoomRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = chat_messages)]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub content: String,
    pub flagged: bool,
    pub deleted: bool,
    pub is_pinned: bool,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub flagged: bool,
    pub deleted: bool,
    pub is_pinned: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatMessageRequest {
    pub content: Option<String>,
    pub flagged: Option<bool>,
    pub deleted: Option<bool>,
    pub is_pinned: Option<bool>,
}

// ---------------------------------------------------------------------------
// Settings

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = platform_settings)]
pub struct Setting {
    pub setting_key: String,
    pub setting_value: String,
}

#[derive(Debug, Serialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_ids_have_prefix_and_length() {
        let id = prefixed_id("v");
        assert!(id.starts_with("v_"));
        assert_eq!(id.len(), 14);
        assert!(id[2..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn prefixed_ids_are_unlikely_to_collide() {
        let a = prefixed_id("e");
        let b = prefixed_id("e");
        assert_ne!(a, b);
    }

    #[test]
    fn cast_vote_request_uses_camel_case() {
        let req: CastVoteRequest =
            serde_json::from_str(r#"{"electionId":"e_1","candidateId":"c_1"}"#).unwrap();
        assert_eq!(req.election_id, "e_1");
        assert_eq!(req.candidate_id, "c_1");
    }

    #[test]
    fn vote_serializes_to_camel_case() {
        let vote = Vote {
            id: "v_abc".to_string(),
            user_id: "user_1".to_string(),
            election_id: "e_1".to_string(),
            candidate_id: "c_1".to_string(),
            timestamp: NaiveDate::from_ymd_opt(2025, 7, 12)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        };
        let json = serde_json::to_value(&vote).unwrap();
        assert_eq!(json["userId"], "user_1");
        assert_eq!(json["electionId"], "e_1");
        assert_eq!(json["candidateId"], "c_1");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn override_update_distinguishes_absent_from_null() {
        let absent: UpdateCandidateRequest = serde_json::from_str(r#"{"name":"A"}"#).unwrap();
        assert!(absent.vote_display_override.is_none());

        let cleared: UpdateCandidateRequest =
            serde_json::from_str(r#"{"voteDisplayOverride":null}"#).unwrap();
        assert_eq!(cleared.vote_display_override, Some(None));

        let set: UpdateCandidateRequest =
            serde_json::from_str(r#"{"voteDisplayOverride":100}"#).unwrap();
        assert_eq!(set.vote_display_override, Some(Some(100)));
    }

    #[test]
    fn nullable_update_fields_distinguish_absent_from_null() {
        let candidate: UpdateCandidateRequest =
            serde_json::from_str(r#"{"bio":null,"image":"pic.png"}"#).unwrap();
        assert_eq!(candidate.bio, Some(None));
        assert_eq!(candidate.image, Some(Some("pic.png".to_string())));
        assert!(candidate.vote_display_override.is_none());

        let news: UpdateNewsRequest =
            serde_json::from_str(r#"{"electionId":null,"image":null}"#).unwrap();
        assert_eq!(news.election_id, Some(None));
        assert_eq!(news.image, Some(None));
        assert!(news.country_id.is_none());

        let room: UpdateChatRoomRequest =
            serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(room.description, Some(None));
        assert!(room.name.is_none());
    }

    #[test]
    fn election_type_round_trips_as_type() {
        let election = Election {
            id: "e_1".to_string(),
            country_id: "co_1".to_string(),
            election_type: "Presidential".to_string(),
            date: NaiveDate::from_ymd_opt(2027, 2, 25).unwrap(),
            status: "upcoming".to_string(),
            description: "General election".to_string(),
        };
        let json = serde_json::to_value(&election).unwrap();
        assert_eq!(json["type"], "Presidential");
        assert_eq!(json["countryId"], "co_1");
    }

    #[test]
    fn user_response_hides_pin_hash() {
        let user = User {
            id: "user_1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            avatar: None,
            pin_hash: "$2b$10$secret".to_string(),
            is_admin: false,
            is_sub_admin: false,
            created_at: None,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("pinHash").is_none());
        assert!(json.get("pin_hash").is_none());
        assert_eq!(json["isAdmin"], false);
    }
}
