use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use axum::{routing::get, Router};
use http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foi_services::config::Config;
use foi_services::services::init;
use foi_services::{middleware, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foi_services=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting FOI services");

    let pool = init::init_db(&config).await?;
    let country_messages = init::init_country_messages(&config)?;

    let app_state = Arc::new(AppState {
        db: pool,
        country_messages,
        trust_forwarded_headers: config.server.trust_forwarded_headers,
    });

    if !config.server.trust_forwarded_headers {
        tracing::info!("Ignoring X-Forwarded-For / X-Real-IP; using the socket peer address");
    }

    let thread_shutdown = Arc::new(AtomicBool::new(false));

    let country_message_limit = middleware::rate_limit::country_message_limit(
        &config.rate_limit,
        config.server.trust_forwarded_headers,
    )?;

    // Background cleanup for rate limiter storage
    let limiter_cleaner = {
        let limiter = country_message_limit.config.limiter().clone();
        let interval = Duration::from_secs(60);
        let flag = thread_shutdown.clone();
        std::thread::spawn(move || {
            // Use smaller sleep granularity to allow quick shutdown.
            let tick = Duration::from_secs(1);
            loop {
                for _ in 0..interval.as_secs() {
                    if flag.load(Ordering::SeqCst) {
                        tracing::info!("Rate limiter cleanup thread exiting");
                        return;
                    }
                    std::thread::sleep(tick);
                }
                tracing::debug!("rate limiter size: {}", limiter.len());
                limiter.retain_recent();
            }
        })
    };

    let frontend_origin = config
        .server
        .frontend_url
        .parse::<HeaderValue>()
        .map_err(|e| anyhow::anyhow!("Invalid FRONTEND_URL for CORS: {}", e))?;

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest(
            "/services",
            routes::services::router().layer(country_message_limit),
        )
        .fallback(routes::not_found)
        .with_state(app_state.clone())
        .layer(axum::middleware::from_fn(
            middleware::security_headers::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        // The main site fetches the fragment from the browser.
        .layer(
            CorsLayer::new()
                .allow_origin(frontend_origin)
                .allow_methods([http::Method::GET, http::Method::OPTIONS])
                .allow_headers([http::header::ACCEPT, http::header::ACCEPT_LANGUAGE]),
        );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let shutdown_flag = thread_shutdown.clone();
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, draining connections");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .await;

    if let Err(e) = served {
        tracing::error!("Server error: {}", e);
    }

    thread_shutdown.store(true, Ordering::SeqCst);
    if let Err(e) = limiter_cleaner.join() {
        tracing::warn!("Rate limiter cleanup thread join failed: {:?}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = term.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to bind SIGTERM: {}", e);
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;
}
