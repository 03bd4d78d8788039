pub mod feed;
pub mod jobs;
pub mod votes;

use actix_web::{get, web, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::FeedCache;
use crate::jobs::cache_janitor::CacheJanitor;
use crate::services::{FeedAssembler, VoteService};

pub use feed::{get_feed, get_global_feed};
pub use jobs::run_cache_cleanup;
pub use votes::cast_vote;

/// Shared handler state, built once in `main` and cloned into every worker.
pub struct AppState {
    pub assembler: FeedAssembler,
    pub votes: VoteService,
    pub janitor: Arc<CacheJanitor>,
    pub cache: Option<Arc<dyn FeedCache>>,
    pub cache_timeout: Duration,
    pub cron_secret: String,
}

#[get("/api/v1/health/ready")]
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ready",
        "rankedCache": state.cache.is_some(),
    }))
}

async fn liveness() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Routes shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(liveness))
        .route("/api/v1/health", web::get().to(liveness))
        .route("/api/v1/health/live", web::get().to(liveness))
        .service(readiness)
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .service(
            web::scope("/api/v2/feed")
                .service(get_global_feed)
                .service(get_feed),
        )
        .service(cast_vote)
        .service(run_cache_cleanup);
}
