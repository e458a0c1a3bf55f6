use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;

use crate::auth::{AuthUser, Moderator};
use crate::db::CivicDB;
use crate::error::{ApiError, is_unique_violation};
use crate::models::{
    Comment, CommentLikeResponse, CommentResponse, CommentStatsResponse, CreateCommentRequest,
    NewCommentLike, UpdateCommentRequest, prefixed_id,
};
use crate::schema::{comment_likes, comments, users};

// Attach author and like metadata to a comment row. Replies are filled in
// separately by the listing route.
async fn comment_with_meta(
    db: &mut Connection<CivicDB>,
    comment: Comment,
) -> Result<CommentResponse, ApiError> {
    let author = users::table
        .find(&comment.user_id)
        .select((users::name, users::avatar))
        .first::<(String, Option<String>)>(db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading comment author", e))?;

    let (user_name, user_avatar) = author.unwrap_or(("Unknown".to_string(), None));

    let liked_by = comment_likes::table
        .filter(comment_likes::comment_id.eq(&comment.id))
        .select(comment_likes::user_id)
        .load::<String>(db)
        .await
        .map_err(|e| ApiError::internal("loading comment likes", e))?;

    Ok(CommentResponse {
        id: comment.id,
        election_id: comment.election_id,
        user_id: comment.user_id,
        user_name,
        user_avatar,
        parent_comment_id: comment.parent_comment_id,
        content: comment.content,
        timestamp: comment.timestamp,
        likes: liked_by.len() as i64,
        liked_by,
        replies: Vec::new(),
        flagged: comment.flagged,
        approved: comment.approved,
    })
}

#[derive(FromForm)]
pub struct ListFilter {
    #[field(name = "includeReplies", default = true)]
    pub include_replies: bool,
}

// Route to list an election's top-level comments, newest first, with one
// level of replies in chronological order
#[get("/election/<election_id>?<filter..>")]
pub async fn election_comments(
    mut db: Connection<CivicDB>,
    election_id: String,
    filter: ListFilter,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let top_level = comments::table
        .filter(comments::election_id.eq(&election_id))
        .filter(comments::parent_comment_id.is_null())
        .order(comments::timestamp.desc())
        .select(Comment::as_select())
        .load::<Comment>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading comments", e))?;

    let mut out = Vec::with_capacity(top_level.len());
    for comment in top_level {
        let comment_id = comment.id.clone();
        let mut response = comment_with_meta(&mut db, comment).await?;

        if filter.include_replies {
            let replies = comments::table
                .filter(comments::parent_comment_id.eq(&comment_id))
                .order(comments::timestamp.asc())
                .select(Comment::as_select())
                .load::<Comment>(&mut db)
                .await
                .map_err(|e| ApiError::internal("loading replies", e))?;

            for reply in replies {
                response.replies.push(comment_with_meta(&mut db, reply).await?);
            }
        }

        out.push(response);
    }

    Ok(Json(out))
}

// Route to post a comment or a reply
#[post("/", format = "json", data = "<request>")]
pub async fn create_comment(
    mut db: Connection<CivicDB>,
    user: AuthUser,
    request: Json<CreateCommentRequest>,
) -> Result<status::Created<Json<CommentResponse>>, ApiError> {
    if request.content.trim().is_empty() {
        return Err(ApiError::bad_request("Content required"));
    }
    if request.election_id.is_empty() {
        return Err(ApiError::bad_request("electionId is required"));
    }

    let comment = Comment {
        id: prefixed_id("cm"),
        election_id: request.election_id.clone(),
        user_id: user.0.id,
        parent_comment_id: request.parent_comment_id.clone(),
        content: request.content.trim().to_string(),
        flagged: false,
        approved: true,
        timestamp: chrono::Utc::now().naive_utc(),
    };

    diesel::insert_into(comments::table)
        .values(&comment)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("creating comment", e))?;

    let location = format!("/api/comments/{}", comment.id);
    let response = comment_with_meta(&mut db, comment).await?;

    Ok(status::Created::new(location).body(Json(response)))
}

// Route to toggle a like on a comment
#[post("/<id>/like")]
pub async fn toggle_like(
    mut db: Connection<CivicDB>,
    user: AuthUser,
    id: String,
) -> Result<Json<CommentLikeResponse>, ApiError> {
    let existing: i64 = comment_likes::table
        .filter(comment_likes::comment_id.eq(&id))
        .filter(comment_likes::user_id.eq(&user.0.id))
        .count()
        .get_result(&mut db)
        .await
        .map_err(|e| ApiError::internal("checking like", e))?;

    let liked = if existing > 0 {
        diesel::delete(
            comment_likes::table
                .filter(comment_likes::comment_id.eq(&id))
                .filter(comment_likes::user_id.eq(&user.0.id)),
        )
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("removing like", e))?;
        false
    } else {
        let result = diesel::insert_into(comment_likes::table)
            .values(&NewCommentLike {
                comment_id: id.clone(),
                user_id: user.0.id.clone(),
            })
            .execute(&mut db)
            .await;
        match result {
            Ok(_) => {}
            // A double-click raced us; the like already exists.
            Err(e) if is_unique_violation(&e) => {}
            Err(e) => return Err(ApiError::internal("adding like", e)),
        }
        true
    };

    let likes: i64 = comment_likes::table
        .filter(comment_likes::comment_id.eq(&id))
        .count()
        .get_result(&mut db)
        .await
        .map_err(|e| ApiError::internal("counting likes", e))?;

    Ok(Json(CommentLikeResponse { likes, liked }))
}

// Route to edit a comment. Authors may change their own content; approval
// and flagging are reserved for moderators.
#[put("/<id>", format = "json", data = "<request>")]
pub async fn update_comment(
    mut db: Connection<CivicDB>,
    user: AuthUser,
    id: String,
    request: Json<UpdateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let mut comment = comments::table
        .find(&id)
        .select(Comment::as_select())
        .first::<Comment>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading comment", e))?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    let can_moderate = user.0.is_admin || user.0.is_sub_admin;
    let request = request.into_inner();

    if request.content.is_none() && request.approved.is_none() && request.flagged.is_none() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if let Some(content) = request.content {
        if comment.user_id != user.0.id && !can_moderate {
            return Err(ApiError::forbidden("Forbidden"));
        }
        comment.content = content;
    }
    if request.approved.is_some() || request.flagged.is_some() {
        if !can_moderate {
            return Err(ApiError::forbidden("Admin or sub-admin required"));
        }
        if let Some(approved) = request.approved {
            comment.approved = approved;
        }
        if let Some(flagged) = request.flagged {
            comment.flagged = flagged;
        }
    }

    diesel::update(comments::table.find(&id))
        .set(&comment)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating comment", e))?;

    let response = comment_with_meta(&mut db, comment).await?;
    Ok(Json(response))
}

// Route to delete a comment (author or moderator)
#[delete("/<id>")]
pub async fn delete_comment(
    mut db: Connection<CivicDB>,
    user: AuthUser,
    id: String,
) -> Result<Status, ApiError> {
    let comment = comments::table
        .find(&id)
        .select(Comment::as_select())
        .first::<Comment>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading comment", e))?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    let can_moderate = user.0.is_admin || user.0.is_sub_admin;
    if comment.user_id != user.0.id && !can_moderate {
        return Err(ApiError::forbidden("Forbidden"));
    }

    diesel::delete(comments::table.find(&id))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting comment", e))?;

    Ok(Status::NoContent)
}

#[derive(FromForm)]
pub struct ModerationFilter {
    pub filter: Option<String>,
}

// Moderator route to list all comments with an optional status filter
#[get("/admin/all?<filter..>")]
pub async fn all_comments(
    mut db: Connection<CivicDB>,
    _moderator: Moderator,
    filter: ModerationFilter,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let mut query = comments::table.select(Comment::as_select()).into_boxed();
    match filter.filter.as_deref() {
        Some("pending") => query = query.filter(comments::approved.eq(false)),
        Some("approved") => query = query.filter(comments::approved.eq(true)),
        Some("flagged") => query = query.filter(comments::flagged.eq(true)),
        _ => {}
    }

    let rows = query
        .order(comments::timestamp.desc())
        .load::<Comment>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading comments", e))?;

    let mut out = Vec::with_capacity(rows.len());
    for comment in rows {
        out.push(comment_with_meta(&mut db, comment).await?);
    }

    Ok(Json(out))
}

// Moderator route to get comment totals
#[get("/admin/stats")]
pub async fn comment_stats(
    mut db: Connection<CivicDB>,
    _moderator: Moderator,
) -> Result<Json<CommentStatsResponse>, ApiError> {
    let total: i64 = comments::table
        .count()
        .get_result(&mut db)
        .await
        .map_err(|e| ApiError::internal("counting comments", e))?;

    let pending: i64 = comments::table
        .filter(comments::approved.eq(false))
        .count()
        .get_result(&mut db)
        .await
        .map_err(|e| ApiError::internal("counting pending comments", e))?;

    Ok(Json(CommentStatsResponse {
        total_comments: total,
        pending_comments: pending,
    }))
}
