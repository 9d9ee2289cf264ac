use std::{process, sync::Arc};

use racconto::{
    application::{
        error::AppError,
        feed::FeedService,
        repos::{CommentsRepo, PostsRepo, TagsRepo},
    },
    cache::{InMemoryCache, ReadCache, RedisCache},
    config,
    infra::{db::PostgresRepositories, error::InfraError, http, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(
        &settings.database.url,
        settings.database.max_connections,
    )
    .await
    .map_err(|err| InfraError::database(err.to_string()))?;

    if settings.database.run_migrations {
        PostgresRepositories::run_migrations(&pool)
            .await
            .map_err(|err| InfraError::database(format!("migrations failed: {err}")))?;
    }

    let repositories = PostgresRepositories::new(pool);
    let cache = build_cache(&settings.cache).await;

    let posts: Arc<dyn PostsRepo> = Arc::new(repositories.clone());
    let tags: Arc<dyn TagsRepo> = Arc::new(repositories.clone());
    let comments: Arc<dyn CommentsRepo> = Arc::new(repositories.clone());

    let feed = FeedService::new(
        posts,
        tags,
        comments,
        cache,
        settings.cache.ttl(),
        settings.feed.page_size,
    );

    let router = http::build_router(http::HttpState {
        feed: Arc::new(feed),
        db: repositories,
    });

    let addr = settings
        .server
        .addr()
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    info!(%addr, "starting racconto");
    http::serve(router, addr).await.map_err(InfraError::from)?;

    Ok(())
}

/// Build the injected read-path cache handle. The cache is an accelerator,
/// never a dependency: a missing or unreachable backend degrades to an
/// in-process store (or nothing) and the site keeps serving.
async fn build_cache(settings: &racconto::config::CacheSettings) -> Option<Arc<dyn ReadCache>> {
    if !settings.enabled {
        info!("read-path cache disabled by configuration");
        return None;
    }

    match &settings.url {
        Some(url) => match RedisCache::connect(url, settings.connect_timeout()).await {
            Ok(cache) => Some(Arc::new(cache)),
            Err(err) => {
                warn!(error = %err, "cache backend unreachable, using in-process fallback");
                Some(Arc::new(InMemoryCache::new()))
            }
        },
        None => {
            info!("no cache URL configured, using in-process cache");
            Some(Arc::new(InMemoryCache::new()))
        }
    }
}
