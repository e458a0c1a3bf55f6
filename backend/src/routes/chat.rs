use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;

use crate::auth::{AdminUser, AuthUser};
use crate::db::CivicDB;
use crate::error::ApiError;
use crate::models::{
    ChatMessage, ChatMessageResponse, ChatRoom, ChatRoomResponse, CreateChatMessageRequest,
    CreateChatRoomRequest, UpdateChatMessageRequest, UpdateChatRoomRequest, prefixed_id,
};
use crate::schema::{chat_messages, chat_rooms, users};

const DEFAULT_HISTORY: i64 = 50;
const MAX_HISTORY: i64 = 100;

async fn room_response(
    db: &mut Connection<CivicDB>,
    room: ChatRoom,
) -> Result<ChatRoomResponse, ApiError> {
    let pinned = chat_messages::table
        .filter(chat_messages::room_id.eq(&room.id))
        .filter(chat_messages::is_pinned.eq(true))
        .select(chat_messages::id)
        .load::<String>(db)
        .await
        .map_err(|e| ApiError::internal("loading pinned messages", e))?;

    Ok(ChatRoomResponse {
        id: room.id,
        room_type: room.room_type,
        entity_id: room.entity_id,
        name: room.name,
        description: room.description.unwrap_or_default(),
        pinned_messages: pinned,
        created_at: room.created_at,
        active_users: room.active_users,
    })
}

async fn message_response(
    db: &mut Connection<CivicDB>,
    message: ChatMessage,
) -> Result<ChatMessageResponse, ApiError> {
    let author = users::table
        .find(&message.user_id)
        .select((users::name, users::avatar))
        .first::<(String, Option<String>)>(db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading message author", e))?;

    let (user_name, user_avatar) = author.unwrap_or(("Unknown".to_string(), None));

    Ok(ChatMessageResponse {
        id: message.id,
        room_id: message.room_id,
        user_id: message.user_id,
        user_name,
        user_avatar,
        content: message.content,
        timestamp: message.timestamp,
        flagged: message.flagged,
        deleted: message.deleted,
        is_pinned: message.is_pinned,
    })
}

#[derive(FromForm)]
pub struct RoomFilter {
    #[field(name = "type")]
    pub room_type: Option<String>,
    #[field(name = "entityId")]
    pub entity_id: Option<String>,
}

// Route to list chat rooms
#[get("/rooms?<filter..>")]
pub async fn list_rooms(
    mut db: Connection<CivicDB>,
    filter: RoomFilter,
) -> Result<Json<Vec<ChatRoomResponse>>, ApiError> {
    let mut query = chat_rooms::table.select(ChatRoom::as_select()).into_boxed();
    if let Some(room_type) = filter.room_type {
        query = query.filter(chat_rooms::room_type.eq(room_type));
    }
    if let Some(entity_id) = filter.entity_id {
        query = query.filter(chat_rooms::entity_id.eq(entity_id));
    }

    let rows = query
        .order(chat_rooms::name.asc())
        .load::<ChatRoom>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading rooms", e))?;

    let mut out = Vec::with_capacity(rows.len());
    for room in rows {
        out.push(room_response(&mut db, room).await?);
    }

    Ok(Json(out))
}

// Route to get a single chat room
#[get("/rooms/<id>")]
pub async fn get_room(
    mut db: Connection<CivicDB>,
    id: String,
) -> Result<Json<ChatRoomResponse>, ApiError> {
    let room = chat_rooms::table
        .find(&id)
        .select(ChatRoom::as_select())
        .first::<ChatRoom>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading room", e))?
        .ok_or_else(|| ApiError::not_found("Room not found"))?;

    Ok(Json(room_response(&mut db, room).await?))
}

// Admin route to create a chat room. Room ids are deterministic so each
// entity gets at most one room per type.
#[post("/rooms", format = "json", data = "<request>")]
pub async fn create_room(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    request: Json<CreateChatRoomRequest>,
) -> Result<status::Created<Json<ChatRoomResponse>>, ApiError> {
    if request.room_type.is_empty() || request.entity_id.is_empty() || request.name.is_empty() {
        return Err(ApiError::bad_request("type, entityId, name required"));
    }

    let room = ChatRoom {
        id: format!("{}_{}", request.room_type, request.entity_id),
        room_type: request.room_type.clone(),
        entity_id: request.entity_id.clone(),
        name: request.name.clone(),
        description: request.description.clone(),
        active_users: 0,
        created_at: None,
    };

    diesel::insert_into(chat_rooms::table)
        .values(&room)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("creating room", e))?;

    let location = format!("/api/chat/rooms/{}", room.id);
    Ok(status::Created::new(location).body(Json(room_response(&mut db, room).await?)))
}

// Admin route to update a chat room
#[put("/rooms/<id>", format = "json", data = "<request>")]
pub async fn update_room(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
    request: Json<UpdateChatRoomRequest>,
) -> Result<Json<ChatRoomResponse>, ApiError> {
    let mut room = chat_rooms::table
        .find(&id)
        .select(ChatRoom::as_select())
        .first::<ChatRoom>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading room", e))?
        .ok_or_else(|| ApiError::not_found("Room not found"))?;

    let request = request.into_inner();
    if request.name.is_none() && request.description.is_none() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if let Some(name) = request.name {
        room.name = name;
    }
    if let Some(description) = request.description {
        room.description = description;
    }

    diesel::update(chat_rooms::table.find(&id))
        .set(&room)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating room", e))?;

    Ok(Json(room_response(&mut db, room).await?))
}

// Admin route to delete a chat room
#[delete("/rooms/<id>")]
pub async fn delete_room(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
) -> Result<Status, ApiError> {
    diesel::delete(chat_rooms::table.find(&id))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting room", e))?;

    Ok(Status::NoContent)
}

#[derive(FromForm)]
pub struct HistoryFilter {
    pub limit: Option<i64>,
}

// Route to fetch a room's recent messages, oldest first. Clients poll this;
// there is no push transport.
#[get("/rooms/<id>/messages?<filter..>")]
pub async fn room_messages(
    mut db: Connection<CivicDB>,
    id: String,
    filter: HistoryFilter,
) -> Result<Json<Vec<ChatMessageResponse>>, ApiError> {
    let limit = filter
        .limit
        .unwrap_or(DEFAULT_HISTORY)
        .clamp(1, MAX_HISTORY);

    let mut rows = chat_messages::table
        .filter(chat_messages::room_id.eq(&id))
        .filter(chat_messages::deleted.eq(false))
        .order(chat_messages::timestamp.desc())
        .limit(limit)
        .select(ChatMessage::as_select())
        .load::<ChatMessage>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading messages", e))?;

    rows.reverse();

    let mut out = Vec::with_capacity(rows.len());
    for message in rows {
        out.push(message_response(&mut db, message).await?);
    }

    Ok(Json(out))
}

// Route to post a message to a room
#[post("/rooms/<id>/messages", format = "json", data = "<request>")]
pub async fn post_message(
    mut db: Connection<CivicDB>,
    user: AuthUser,
    id: String,
    request: Json<CreateChatMessageRequest>,
) -> Result<status::Created<Json<ChatMessageResponse>>, ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::bad_request("Content required"));
    }

    let room_exists: i64 = chat_rooms::table
        .find(&id)
        .count()
        .get_result(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading room", e))?;
    if room_exists == 0 {
        return Err(ApiError::not_found("Room not found"));
    }

    let message = ChatMessage {
        id: prefixed_id("msg"),
        room_id: id,
        user_id: user.0.id,
        content: request.content.trim().to_string(),
        flagged: false,
        deleted: false,
        is_pinned: false,
        timestamp: chrono::Utc::now().naive_utc(),
    };

    diesel::insert_into(chat_messages::table)
        .values(&message)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("sending message", e))?;

    let location = format!("/api/chat/messages/{}", message.id);
    Ok(status::Created::new(location).body(Json(message_response(&mut db, message).await?)))
}

fn requests_moderation(request: &UpdateChatMessageRequest) -> bool {
    request.flagged.is_some() || request.deleted.is_some() || request.is_pinned.is_some()
}

// Route to edit a message. Authors may change their own content; flagging,
// pinning and undeleting are admin-only.
#[put("/messages/<id>", format = "json", data = "<request>")]
pub async fn update_message(
    mut db: Connection<CivicDB>,
    user: AuthUser,
    id: String,
    request: Json<UpdateChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, ApiError> {
    let mut message = chat_messages::table
        .find(&id)
        .select(ChatMessage::as_select())
        .first::<ChatMessage>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading message", e))?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;

    let request = request.into_inner();
    if request.content.is_none()
        && request.flagged.is_none()
        && request.deleted.is_none()
        && request.is_pinned.is_none()
    {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if requests_moderation(&request) && !user.0.is_admin {
        return Err(ApiError::forbidden("Admin required"));
    }

    if let Some(content) = request.content {
        if message.user_id != user.0.id && !user.0.is_admin {
            return Err(ApiError::forbidden("Forbidden"));
        }
        message.content = content;
    }
    if let Some(flagged) = request.flagged {
        message.flagged = flagged;
    }
    if let Some(deleted) = request.deleted {
        message.deleted = deleted;
    }
    if let Some(is_pinned) = request.is_pinned {
        message.is_pinned = is_pinned;
    }

    diesel::update(chat_messages::table.find(&id))
        .set(&message)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating message", e))?;

    Ok(Json(message_response(&mut db, message).await?))
}

// Route to remove a message (author or admin). Messages are soft-deleted so
// moderators can still review them.
#[delete("/messages/<id>")]
pub async fn delete_message(
    mut db: Connection<CivicDB>,
    user: AuthUser,
    id: String,
) -> Result<Status, ApiError> {
    let message = chat_messages::table
        .find(&id)
        .select(ChatMessage::as_select())
        .first::<ChatMessage>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading message", e))?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;

    if message.user_id != user.0.id && !user.0.is_admin {
        return Err(ApiError::forbidden("Forbidden"));
    }

    diesel::update(chat_messages::table.find(&id))
        .set(chat_messages::deleted.eq(true))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting message", e))?;

    Ok(Status::NoContent)
}

// Admin route to list flagged messages, newest first
#[get("/messages/flagged")]
pub async fn flagged_messages(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
) -> Result<Json<Vec<ChatMessageResponse>>, ApiError> {
    let rows = chat_messages::table
        .filter(chat_messages::flagged.eq(true))
        .order(chat_messages::timestamp.desc())
        .select(ChatMessage::as_select())
        .load::<ChatMessage>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading flagged messages", e))?;

    let mut out = Vec::with_capacity(rows.len());
    for message in rows {
        out.push(message_response(&mut db, message).await?);
    }

    Ok(Json(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_fields_are_detected() {
        let content_only = UpdateChatMessageRequest {
            content: Some("hi".to_string()),
            flagged: None,
            deleted: None,
            is_pinned: None,
        };
        assert!(!requests_moderation(&content_only));

        let flag = UpdateChatMessageRequest {
            content: None,
            flagged: Some(true),
            deleted: None,
            is_pinned: None,
        };
        assert!(requests_moderation(&flag));

        let unpin = UpdateChatMessageRequest {
            content: None,
            flagged: None,
            deleted: None,
            is_pinned: Some(false),
        };
        assert!(requests_moderation(&unpin));
    }
}
