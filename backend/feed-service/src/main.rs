use actix_web::{dev::Service, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_service::cache::{FeedCache, RedisFeedCache};
use feed_service::config::Config;
use feed_service::handlers::{self, AppState};
use feed_service::jobs::cache_janitor::{start_cache_janitor, CacheJanitor};
use feed_service::services::{FeedAssembler, Scorer, SpotlightService, VoteService};
use feed_service::store::{FeedStore, PgFeedStore};
use feed_service::utils::{Clock, SystemClock};

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Starting feed-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        max_connections = config.database.max_connections,
        "Database pool created"
    );

    // Redis is optional: without it the feed still works, votes skip the
    // ranked cache and the spotlight is read straight from the store.
    let cache: Option<Arc<dyn FeedCache>> = match RedisFeedCache::connect(&config.redis.url).await
    {
        Ok(redis) => match redis.ping().await {
            Ok(()) => {
                info!("Ranked cache connected");
                Some(Arc::new(redis))
            }
            Err(e) => {
                tracing::warn!("Ranked cache disabled - Redis ping failed: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Ranked cache disabled - failed to connect to Redis: {}", e);
            None
        }
    };

    let store: Arc<dyn FeedStore> = Arc::new(PgFeedStore::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scorer = Scorer::default();

    let spotlight = SpotlightService::new(
        store.clone(),
        cache.clone(),
        config.redis.spotlight_ttl_secs,
        config.store_timeout(),
        config.cache_timeout(),
    );
    let assembler = FeedAssembler::new(
        store.clone(),
        spotlight,
        clock.clone(),
        scorer.clone(),
        config.feed_settings(),
    );
    let votes = VoteService::new(
        store.clone(),
        cache.clone(),
        scorer,
        clock,
        config.store_timeout(),
        config.cache_timeout(),
    );
    let janitor = Arc::new(CacheJanitor::new(
        cache.clone(),
        config.eviction_policy(),
        config.cache_timeout(),
    ));

    if config.jobs.cron_secret.is_empty() {
        tracing::warn!("CRON_SECRET not set - cache cleanup endpoint will reject every call");
    }

    match (config.janitor_interval(), cache.is_some()) {
        (Some(interval), true) => {
            let loop_janitor = janitor.clone();
            tokio::spawn(async move {
                start_cache_janitor(loop_janitor, interval).await;
            });
            info!("Cache janitor background job started");
        }
        (Some(_), false) => info!("Cache janitor loop skipped - no ranked cache"),
        (None, _) => info!("Cache janitor loop disabled by configuration"),
    }

    let state = web::Data::new(AppState {
        assembler,
        votes,
        janitor,
        cache,
        cache_timeout: config.cache_timeout(),
        cron_secret: config.jobs.cron_secret.clone(),
    });

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    info!("HTTP server listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = feed_service::metrics::route_label(req.match_pattern());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => {
                            feed_service::metrics::observe_http_request(
                                &method,
                                &path,
                                res.status().as_u16(),
                                start.elapsed(),
                            );
                            Ok(res)
                        }
                        Err(err) => {
                            feed_service::metrics::observe_http_request(
                                &method,
                                &path,
                                500,
                                start.elapsed(),
                            );
                            Err(err)
                        }
                    }
                }
            })
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
