use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

mod broadcast;
mod error;
mod handlers;
mod history;
mod logic;
mod membership;
mod rooms;
mod state;
mod undo;

use crate::handlers::{health_handler, stats_handler, ws_handler};
use crate::state::{
    AppState, RoomLimits, DEFAULT_CAPACITY, DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_CAPACITY,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
    /// Directory with the drawing client's static files.
    #[arg(long, env = "PUBLIC_DIR")]
    public_dir: Option<PathBuf>,
    /// Maximum events kept per room before the oldest are evicted.
    #[arg(long, env = "HISTORY_LIMIT", default_value_t = DEFAULT_HISTORY_LIMIT)]
    history_limit: usize,
    #[arg(long, env = "MAX_ROOM_CAPACITY", default_value_t = DEFAULT_MAX_CAPACITY)]
    max_capacity: usize,
    /// Capacity used when a host does not ask for one.
    #[arg(long, env = "DEFAULT_ROOM_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    default_capacity: usize,
    /// Allowed CORS origin. Any origin when unset or `*`.
    #[arg(long, env = "CORS_ORIGIN")]
    cors_origin: Option<String>,
    #[arg(long, env = "TLS_CERT", requires = "tls_key")]
    tls_cert: Option<PathBuf>,
    #[arg(long, env = "TLS_KEY", requires = "tls_cert")]
    tls_key: Option<PathBuf>,
}

impl Args {
    fn limits(&self) -> RoomLimits {
        let max_capacity = self.max_capacity.max(1);
        RoomLimits {
            history_limit: self.history_limit.max(1),
            max_capacity,
            default_capacity: self.default_capacity.clamp(1, max_capacity),
        }
    }
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    match origin
        .filter(|origin| *origin != "*")
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

fn app(state: AppState, public_dir: PathBuf, cors_origin: Option<&str>) -> Router {
    let static_files = ServeDir::new(public_dir).append_index_html_on_directories(true);
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .fallback_service(static_files)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let limits = args.limits();
    let public_dir = args
        .public_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));
    let router = app(AppState::new(limits), public_dir, args.cors_origin.as_deref());
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    if let (Some(cert), Some(key)) = (&args.tls_cert, &args.tls_key) {
        let config = match axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key).await {
            Ok(config) => config,
            Err(error) => {
                tracing::error!(%error, "failed to load TLS certificate or key");
                return ExitCode::FAILURE;
            }
        };
        let handle = axum_server::Handle::new();
        let shutdown = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
        });
        tracing::info!(%addr, ?limits, "inkroom listening (tls)");
        if let Err(error) = axum_server::bind_rustls(addr, config)
            .handle(handle)
            .serve(router.into_make_service())
            .await
        {
            tracing::error!(%error, "server failed");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%addr, %error, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(%addr, ?limits, "inkroom listening");
    if let Err(error) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
