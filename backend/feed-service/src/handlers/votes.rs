use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::VoteKind;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub voter_id: Uuid,
    pub kind: VoteKind,
}

/// POST /api/v2/posts/{post_id}/votes
#[post("/api/v2/posts/{post_id}/votes")]
pub async fn cast_vote(
    path: web::Path<String>,
    body: web::Json<VoteRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let post_id = Uuid::parse_str(&path)
        .map_err(|_| AppError::BadRequest(format!("invalid post id: {}", path)))?;
    let VoteRequest { voter_id, kind } = body.into_inner();

    let outcome = state.votes.cast_vote(post_id, voter_id, kind).await?;

    Ok(HttpResponse::Ok().json(outcome))
}
