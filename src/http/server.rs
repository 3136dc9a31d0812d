//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the route table and the handler sets behind it
//! - Wrap the router in the request pipeline (rate limit, headers, CORS,
//!   sanitize) so every stage runs before routing
//! - Serve on a bound listener until shutdown
//! - Periodically drop expired rate-limit windows

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Request},
    middleware::{self, map_response},
    response::Response,
    Router, ServiceExt,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{util::BoxCloneService, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::{require_auth, TokenKeys};
use crate::config::AppConfig;
use crate::handlers;
use crate::http::error::{ensure_envelope, not_found, panic_response};
use crate::observability::{logging::request_span, metrics};
use crate::routing::{RouteKind, RouteTable, RouteTableError};
use crate::security::{
    cors::cors_layer,
    headers::security_headers_middleware,
    rate_limit::rate_limit_middleware,
    sanitize::sanitize_middleware,
    RateLimiter, SecurityHeaders,
};
use crate::storage::Storage;

/// The fully assembled service: pipeline plus router.
pub type AppService = BoxCloneService<Request<Body>, Response, Infallible>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub tokens: Arc<TokenKeys>,
    pub routes: Arc<RouteTable>,
}

/// HTTP server for the jobs API.
pub struct HttpServer {
    service: AppService,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Assemble the pipeline and handler sets over connected storage.
    pub fn new(config: &AppConfig, storage: Storage) -> Result<Self, RouteTableError> {
        let routes = Arc::new(RouteTable::new(
            &config.routes.api_prefix,
            &config.routes.docs_path,
        )?);
        let tokens = Arc::new(TokenKeys::new(
            &config.auth.jwt_secret,
            Duration::from_secs(config.auth.token_lifetime_secs),
        ));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        let state = AppState {
            storage,
            tokens,
            routes,
        };

        let router = Self::build_router(state);
        let service = Self::build_pipeline(config, limiter.clone(), router);

        Ok(Self { service, limiter })
    }

    /// Mount one handler set per route table entry. Entries that require
    /// authentication get the guard on everything under their prefix.
    fn build_router(state: AppState) -> Router {
        let mut router = Router::new();

        for entry in state.routes.entries() {
            router = match entry.kind {
                RouteKind::Root => router.merge(handlers::root::router()),
                RouteKind::Docs => router.merge(handlers::docs::router(&entry.prefix)),
                RouteKind::Auth | RouteKind::Jobs => {
                    let mut set = match entry.kind {
                        RouteKind::Auth => handlers::auth::router(),
                        _ => handlers::jobs::router(),
                    }
                    .fallback(not_found);

                    if entry.requires_auth {
                        set = set.layer(middleware::from_fn_with_state(
                            state.tokens.clone(),
                            require_auth,
                        ));
                    }

                    router.nest_service(&entry.prefix, set.with_state(state.clone()))
                }
            };
            tracing::debug!(
                kind = entry.kind.as_str(),
                prefix = %entry.prefix,
                guarded = entry.requires_auth,
                "Mounted handler set"
            );
        }

        router
            .fallback(not_found)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
    }

    /// Wrap the router in the pipeline, outermost stage first.
    fn build_pipeline(config: &AppConfig, limiter: Arc<RateLimiter>, router: Router) -> AppService {
        let headers = Arc::new(if config.security.enable_headers {
            SecurityHeaders::standard()
        } else {
            SecurityHeaders::disabled()
        });

        let pipeline = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(map_response(ensure_envelope))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
            .layer(middleware::from_fn_with_state(
                headers,
                security_headers_middleware,
            ))
            .layer(cors_layer(&config.security))
            .layer(DefaultBodyLimit::max(config.security.max_body_bytes))
            .layer(middleware::from_fn_with_state(
                config.security.max_body_bytes,
                sanitize_middleware,
            ))
            .service(router);

        BoxCloneService::new(pipeline)
    }

    /// A clone of the assembled service, for in-process dispatch.
    pub fn service(&self) -> AppService {
        self.service.clone()
    }

    /// Serve connections from `listener` until `shutdown` fires. In-flight
    /// requests are allowed to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = spawn_sweeper(self.limiter.clone());

        let app = ServiceExt::<Request<Body>>::into_make_service_with_connect_info::<SocketAddr>(
            self.service,
        );

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        result
    }
}

/// Drop expired rate-limit windows once per window.
fn spawn_sweeper(limiter: Arc<RateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if limiter.window().is_zero() {
            return;
        }
        let mut interval = tokio::time::interval(limiter.window());
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = limiter.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = limiter.tracked_keys(), "Purged rate-limit windows");
            }
        }
    })
}
