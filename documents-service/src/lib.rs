pub mod config;
pub mod dtos;
pub mod engine;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    routing::{get, post, put},
    Router,
};
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

use config::Config;
use services::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

pub struct Application {
    port: u16,
    router: Router,
}

impl Application {
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;

        db.run_migrations().await?;

        let state = AppState {
            db,
            config: config.clone(),
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            // Document endpoints
            .route(
                "/documents",
                post(handlers::documents::create_document)
                    .get(handlers::documents::list_documents),
            )
            .route("/documents/:id", get(handlers::documents::get_document))
            .route(
                "/documents/:id/line-items",
                put(handlers::documents::replace_line_items),
            )
            // Lifecycle transitions
            .route(
                "/documents/:id/send",
                post(handlers::documents::send_document),
            )
            .route(
                "/documents/:id/accept",
                post(handlers::documents::accept_quote),
            )
            .route(
                "/documents/:id/reject",
                post(handlers::documents::reject_quote),
            )
            .route(
                "/documents/:id/cancel",
                post(handlers::documents::cancel_document),
            )
            // Revisions
            .route(
                "/documents/:id/revisions",
                post(handlers::revisions::create_revision)
                    .get(handlers::revisions::list_revisions),
            )
            // Payments
            .route(
                "/documents/:id/payments",
                post(handlers::payments::record_payment)
                    .get(handlers::payments::list_payments),
            )
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        user_id = tracing::field::Empty,
                        actor_role = tracing::field::Empty,
                    )
                }),
            )
            .with_state(state);

        Ok(Self {
            port: config.server.port,
            router,
        })
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!("Listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;

        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}
