use actix_web::{http::header, post, web, HttpRequest, HttpResponse};
use serde::Serialize;
use tracing::warn;

use super::AppState;
use crate::jobs::cache_janitor::EvictionReport;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: Option<EvictionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanupResponse {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(error.into()),
        }
    }
}

/// POST /api/v1/jobs/cache-cleanup
///
/// Scheduler entry point for ranked-cache eviction. Requires
/// `Authorization: Bearer <CRON_SECRET>`; always answers with a JSON body.
#[post("/api/v1/jobs/cache-cleanup")]
pub async fn run_cache_cleanup(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if !is_authorized(&req, &state.cron_secret) {
        warn!("Rejected cache cleanup call with missing or invalid token");
        return HttpResponse::Unauthorized().json(CleanupResponse::failed("Unauthorized"));
    }

    match state.janitor.run_once().await {
        Ok(report) => HttpResponse::Ok().json(CleanupResponse {
            success: true,
            report: Some(report),
            error: None,
        }),
        Err(e) => HttpResponse::InternalServerError().json(CleanupResponse::failed(e.to_string())),
    }
}

fn is_authorized(req: &HttpRequest, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim() == secret)
        .unwrap_or(false)
}
