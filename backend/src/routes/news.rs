use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket_db_pools::Connection;
use rocket_db_pools::diesel::prelude::*;

use crate::auth::AdminUser;
use crate::db::CivicDB;
use crate::error::ApiError;
use crate::models::{CreateNewsRequest, NewsItem, UpdateNewsRequest, prefixed_id};
use crate::schema::news;

#[derive(FromForm)]
pub struct NewsFilter {
    #[field(name = "countryId")]
    pub country_id: Option<String>,
    pub priority: Option<String>,
}

// Route to list news, newest first
#[get("/?<filter..>")]
pub async fn list_news(
    mut db: Connection<CivicDB>,
    filter: NewsFilter,
) -> Result<Json<Vec<NewsItem>>, ApiError> {
    let mut query = news::table.select(NewsItem::as_select()).into_boxed();
    if let Some(country_id) = filter.country_id {
        query = query.filter(news::country_id.eq(country_id));
    }
    if let Some(priority) = filter.priority {
        query = query.filter(news::priority.eq(priority));
    }

    let rows = query
        .order(news::timestamp.desc())
        .load::<NewsItem>(&mut db)
        .await
        .map_err(|e| ApiError::internal("loading news", e))?;

    Ok(Json(rows))
}

// Route to get a single news item
#[get("/<id>")]
pub async fn get_news(
    mut db: Connection<CivicDB>,
    id: String,
) -> Result<Json<NewsItem>, ApiError> {
    let item = news::table
        .find(&id)
        .select(NewsItem::as_select())
        .first::<NewsItem>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading news", e))?
        .ok_or_else(|| ApiError::not_found("News not found"))?;

    Ok(Json(item))
}

// Admin route to publish a news item
#[post("/", format = "json", data = "<request>")]
pub async fn create_news(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    request: Json<CreateNewsRequest>,
) -> Result<status::Created<Json<NewsItem>>, ApiError> {
    if request.country_id.is_empty() || request.title.is_empty() || request.content.is_empty() {
        return Err(ApiError::bad_request("countryId, title, content required"));
    }

    let item = NewsItem {
        id: prefixed_id("n"),
        country_id: request.country_id.clone(),
        election_id: request.election_id.clone(),
        title: request.title.trim().to_string(),
        content: request.content.trim().to_string(),
        image: request.image.clone(),
        priority: request
            .priority
            .clone()
            .unwrap_or_else(|| "general".to_string()),
        timestamp: chrono::Utc::now().naive_utc(),
    };

    diesel::insert_into(news::table)
        .values(&item)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("creating news", e))?;

    Ok(status::Created::new(format!("/api/news/{}", item.id)).body(Json(item)))
}

// Admin route to update a news item
#[put("/<id>", format = "json", data = "<request>")]
pub async fn update_news(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
    request: Json<UpdateNewsRequest>,
) -> Result<Json<NewsItem>, ApiError> {
    let mut item = news::table
        .find(&id)
        .select(NewsItem::as_select())
        .first::<NewsItem>(&mut db)
        .await
        .optional()
        .map_err(|e| ApiError::internal("loading news", e))?
        .ok_or_else(|| ApiError::not_found("News not found"))?;

    let request = request.into_inner();
    if request.country_id.is_none()
        && request.election_id.is_none()
        && request.title.is_none()
        && request.content.is_none()
        && request.image.is_none()
        && request.priority.is_none()
    {
        return Err(ApiError::bad_request("No fields to update"));
    }

    if let Some(country_id) = request.country_id {
        item.country_id = country_id;
    }
    if let Some(election_id) = request.election_id {
        item.election_id = election_id;
    }
    if let Some(title) = request.title {
        item.title = title;
    }
    if let Some(content) = request.content {
        item.content = content;
    }
    if let Some(image) = request.image {
        item.image = image;
    }
    if let Some(priority) = request.priority {
        item.priority = priority;
    }

    diesel::update(news::table.find(&id))
        .set(&item)
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("updating news", e))?;

    Ok(Json(item))
}

// Admin route to delete a news item
#[delete("/<id>")]
pub async fn delete_news(
    mut db: Connection<CivicDB>,
    _admin: AdminUser,
    id: String,
) -> Result<Status, ApiError> {
    diesel::delete(news::table.find(&id))
        .execute(&mut db)
        .await
        .map_err(|e| ApiError::internal("deleting news", e))?;

    Ok(Status::NoContent)
}
