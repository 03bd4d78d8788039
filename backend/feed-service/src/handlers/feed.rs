use actix_web::{get, web, HttpResponse};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::AppState;
use crate::cache::{CacheError, CacheKey};
use crate::error::{AppError, Result};
use crate::models::RankedEntry;
use crate::utils::with_timeout;

const MAX_GLOBAL_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
pub struct FeedQueryParams {
    pub viewer_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GlobalFeedParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// GET /api/v2/feed?viewer_id=
///
/// Always 200 for a well-formed viewer id: upstream failures only shrink the feed.
#[get("")]
pub async fn get_feed(
    query: web::Query<FeedQueryParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let viewer_id = query
        .viewer_id
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("viewer_id is required".to_string()))
        .and_then(|raw| {
            Uuid::parse_str(raw.trim())
                .map_err(|_| AppError::BadRequest(format!("invalid viewer_id: {}", raw)))
        })?;

    let response = state.assembler.assemble(viewer_id).await;
    debug!(viewer_id = %viewer_id, posts = response.posts.len(), "Serving feed");

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v2/feed/global?limit=
///
/// Top of the relationship-agnostic ranked cache.
#[get("/global")]
pub async fn get_global_feed(
    query: web::Query<GlobalFeedParams>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let limit = query.limit.clamp(1, MAX_GLOBAL_LIMIT);
    let cache = state.cache.as_ref().ok_or(CacheError::Unavailable)?;

    let members = with_timeout(
        state.cache_timeout,
        cache.top_members(&CacheKey::global_feed(), limit),
    )
    .await?;

    let entries: Vec<RankedEntry> = members
        .into_iter()
        .map(|(post_id, score)| RankedEntry { post_id, score })
        .collect();

    Ok(HttpResponse::Ok().json(entries))
}
