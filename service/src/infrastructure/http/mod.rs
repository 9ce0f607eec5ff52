use anyhow::Context;
use axum::Router;
use axum::extract::Request;
use axum::routing::{get, post, put};
use axum_prometheus::PrometheusMetricLayer;
use tokio::net;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::domain::AppState;
use handlers::analytics::{portfolio_visits, project_views, track};
use handlers::health_check;
use handlers::portfolio::{get_portfolio, get_portfolio_project, list_portfolios};
use handlers::projects::{
    create_project, delete_project, get_project, list_projects, publish_project,
    unpublish_project, update_project,
};
use handlers::users::{me, register, update_profile, upgrade_to_creator};

mod api;
mod handlers;
pub mod identity;
mod querystring;

pub use identity::USER_ID_HEADER;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
}

/// The application's HTTP server. The underlying HTTP package is opaque to module consumers.
pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(state: impl AppState, config: HttpServerConfig<'_>) -> anyhow::Result<Self> {
        // see: https://github.com/Ptrskay3/axum-prometheus
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let router = router(state)
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self { router, listener })
    }

    /// Runs the HTTP server.
    pub async fn run(self) -> anyhow::Result<()> {
        let address = self
            .listener
            .local_addr()
            .context("listener has no local address")?;
        tracing::info!("listening on {}", address);
        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

/// Application routes with tracing and request ids, without the metrics endpoint
pub fn router<S: AppState>(state: S) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        let uri = request.uri().to_string();
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        tracing::info_span!("http_request", method = ?request.method(), uri, request_id)
    });

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(trace_layer)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

fn api_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route("/users/register", post(register::<S>))
        .route("/users/me", get(me::<S>))
        .route("/users/profile", put(update_profile::<S>))
        .route("/users/upgrade-to-creator", post(upgrade_to_creator::<S>))
        .route("/portfolios", get(list_portfolios::<S>))
        .route("/portfolio/{username}", get(get_portfolio::<S>))
        .route(
            "/portfolio/{username}/projects/{project_id}",
            get(get_portfolio_project::<S>),
        )
        .route(
            "/projects",
            post(create_project::<S>).get(list_projects::<S>),
        )
        .route(
            "/projects/{id}",
            get(get_project::<S>)
                .put(update_project::<S>)
                .delete(delete_project::<S>),
        )
        .route("/projects/{id}/publish", post(publish_project::<S>))
        .route("/projects/{id}/unpublish", post(unpublish_project::<S>))
        .route("/analytics/project-views", get(project_views::<S>))
        .route("/analytics/portfolio-visits", get(portfolio_visits::<S>))
        .route("/analytics/{kind}", post(track::<S>))
}
