//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, metrics, timeout, body limit, CORS,
//!   request ID)
//! - Gate the subscription endpoint behind the rate limiter
//! - Apply hot-reloaded runtime settings
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::http::{header, Method};
use axum::{middleware, routing::get, routing::post, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::analytics::handler::{ingest_event, page_view_stats, track_page_view};
use crate::config::schema::{RateLimitConfig, SubscriptionConfig};
use crate::config::ApiConfig;
use crate::health::{database_health, database_health_head};
use crate::observability::metrics;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::store::Store;
use crate::subscriptions::handler::{subscribe, subscription_stats};

/// Settings handlers re-read on every request, swapped atomically when
/// the config file changes.
#[derive(Debug)]
pub struct RuntimeSettings {
    pub rate_limit: RateLimitConfig,
    pub subscriptions: SubscriptionConfig,
}

impl From<&ApiConfig> for RuntimeSettings {
    fn from(config: &ApiConfig) -> Self {
        Self {
            rate_limit: config.rate_limit.clone(),
            subscriptions: config.subscriptions.clone(),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub limiter: RateLimiter,
    pub config: Arc<ApiConfig>,
    pub runtime: Arc<ArcSwap<RuntimeSettings>>,
}

/// HTTP server for the waitlist API.
pub struct HttpServer {
    router: Router,
    config: ApiConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and store.
    pub fn new(config: ApiConfig, store: Store) -> Self {
        let runtime = Arc::new(ArcSwap::from_pointee(RuntimeSettings::from(&config)));

        let state = AppState {
            store,
            limiter: RateLimiter::new(),
            config: Arc::new(config.clone()),
            runtime,
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ApiConfig, state: AppState) -> Router {
        // The limiter gates the subscription endpoint only; page view
        // beacons fire on every navigation and would starve under a
        // 5-per-minute window.
        let subscription_routes = Router::new()
            .route("/api/subscribe", post(subscribe).get(subscription_stats))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ));

        let analytics_routes = Router::new()
            .route("/api/analytics", post(ingest_event))
            .route(
                "/api/analytics/page-view",
                post(track_page_view).get(page_view_stats),
            );

        let health_routes = Router::new().route(
            "/health/db",
            get(database_health).head(database_health_head),
        );

        let mut router = Router::new()
            .merge(subscription_routes)
            .merge(analytics_routes)
            .merge(health_routes)
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(admin::admin_router(state));
        }

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .max_age(Duration::from_secs(60 * 60));

        router
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(cors)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// `config_updates` delivers validated configs from the file watcher;
    /// only the runtime-tunable subset is applied without a restart.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ApiConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = self.config.environment.as_str(),
            "HTTP server starting"
        );

        // Sweeper runs even while the limiter is disabled: the map may
        // still hold windows from before a hot-reload flipped it off.
        let sweeper = self.state.limiter.clone();
        let sweeper_shutdown = shutdown.resubscribe();
        let sweep_interval = self.config.rate_limit.sweep_interval_secs;
        tokio::spawn(async move {
            sweeper.run_sweeper(sweep_interval, sweeper_shutdown).await;
        });

        let runtime = self.state.runtime.clone();
        let applier_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            apply_config_updates(runtime, config_updates, applier_shutdown).await;
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Apply validated config updates to the runtime settings until the
/// channel closes or shutdown fires.
async fn apply_config_updates(
    runtime: Arc<ArcSwap<RuntimeSettings>>,
    mut config_updates: mpsc::UnboundedReceiver<ApiConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = config_updates.recv() => {
                match update {
                    Some(new_config) => {
                        runtime.store(Arc::new(RuntimeSettings::from(&new_config)));
                        tracing::info!(
                            rate_limit = new_config.rate_limit.limit,
                            window_ms = new_config.rate_limit.window_ms,
                            duplicate_policy = ?new_config.subscriptions.duplicate_policy,
                            "Runtime settings updated"
                        );
                    }
                    None => break,
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}
