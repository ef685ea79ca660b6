pub mod domain;
pub mod handlers;
pub mod shared;
pub mod usecases;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use axum::{
        routing::{get, post},
        Router,
    };
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("backend.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                // Keep application logs, quiet down the SQL layer
                "info,sqlx=warn,sea_orm=warn".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    async fn request_logger(req: Request<Body>, next: Next) -> Response {
        let start = std::time::Instant::now();
        let method = req.method().clone();
        let uri = req.uri().clone();

        let response = next.run(req).await;

        tracing::info!(
            "{} {} -> {} in {}ms",
            method,
            uri.path(),
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
        response
    }

    let config = shared::config::load_config()?;

    shared::data::db::initialize_database(Some(&shared::config::get_database_path(&config)?))
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        // Condominium handlers
        .route(
            "/api/condominium",
            get(handlers::a001_condominium::list_all).post(handlers::a001_condominium::upsert),
        )
        .route(
            "/api/condominium/:id",
            get(handlers::a001_condominium::get_by_id).delete(handlers::a001_condominium::delete),
        )
        // Block handlers
        .route(
            "/api/block",
            get(handlers::a002_block::list_by_condominium).post(handlers::a002_block::upsert),
        )
        .route(
            "/api/block/:id",
            get(handlers::a002_block::get_by_id).delete(handlers::a002_block::delete),
        )
        // Apartment handlers
        .route(
            "/api/apartment",
            get(handlers::a003_apartment::list_by_block).post(handlers::a003_apartment::upsert),
        )
        .route(
            "/api/apartment/:id",
            get(handlers::a003_apartment::get_by_id).delete(handlers::a003_apartment::delete),
        )
        // Resident handlers
        .route(
            "/api/resident",
            get(handlers::a004_resident::list_by_apartment).post(handlers::a004_resident::upsert),
        )
        .route(
            "/api/resident/:id",
            get(handlers::a004_resident::get_by_id).delete(handlers::a004_resident::delete),
        )
        // UseCase u501: bulk resident import
        .route(
            "/api/u501/import/session",
            post(handlers::usecases::u501_create_session),
        )
        .route(
            "/api/u501/import/:session_id",
            get(handlers::usecases::u501_get_snapshot),
        )
        .route(
            "/api/u501/import/:session_id/upload",
            post(handlers::usecases::u501_upload_file),
        )
        .route(
            "/api/u501/import/:session_id/edit",
            post(handlers::usecases::u501_edit_field),
        )
        .route(
            "/api/u501/import/:session_id/remove",
            post(handlers::usecases::u501_remove_row),
        )
        .route(
            "/api/u501/import/:session_id/start",
            post(handlers::usecases::u501_start_import),
        )
        .route(
            "/api/u501/import/:session_id/cancel",
            post(handlers::usecases::u501_cancel_import),
        )
        .route(
            "/api/u501/import/:session_id/reset",
            post(handlers::usecases::u501_reset_session),
        )
        .route(
            "/api/u501/import/:session_id/progress",
            get(handlers::usecases::u501_get_progress),
        )
        .route(
            "/api/u501/template/:condominium_id",
            get(handlers::usecases::u501_download_template),
        )
        .layer(middleware::from_fn(request_logger))
        .layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], config.server.port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server successfully bound to {}", addr);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Port {} is already in use. Please ensure no other process is using it.",
                    config.server.port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", config.server.port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
