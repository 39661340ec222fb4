use askama::Template;
use axum::Router;
use axum::http::StatusCode;
use axum::response::Html;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::todo::api::TodoState;
use crate::todo::{MongoTodoStore, TodoStore};

pub mod api;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub todos: Arc<TodoState>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn TodoStore>) -> Self {
        Self {
            config: Arc::new(config),
            todos: Arc::new(TodoState::new(store)),
        }
    }
}

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Failed to render page: {:?}", self);
        let user_facing_error_message =
            "An unexpected error occurred while processing your request. Please try again later.";
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Internal Server Error</h1><p>{}</p>",
                user_facing_error_message
            )),
        )
            .into_response()
    }
}

/// Routes that serve HTML or plain text rather than the JSON API.
pub fn create_public_router() -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .route("/", axum::routing::get(home_handler))
}

/// Builds the full application: public pages, the todo API, request
/// logging and the read/write timeouts from `state.config`.
pub fn create_app(state: AppState) -> Router {
    let app = Router::new()
        .merge(create_public_router())
        .merge(api::create_api_router(state.todos.clone()));
    with_http_layers(app, &state.config)
}

fn with_http_layers(router: Router, config: &Config) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyTimeoutLayer::new(config.read_timeout()))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.write_timeout(),
            )),
    )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let store = match MongoTodoStore::connect(&config).await {
        Ok(store) => store,
        Err(err) => {
            tracing::error!("Could not connect to MongoDB: {}", err);
            return Err(err.into());
        }
    };

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let grace = config.shutdown_grace();
    let app = create_app(AppState::new(config, Arc::new(store.clone())));
    match serve_until_shutdown(listener, app, shutdown_signal(), grace).await? {
        ShutdownOutcome::Drained => {
            store.shutdown().await;
            tracing::info!("Server gracefully stopped");
        }
        // Abandoned requests may still hold sessions the client would wait on.
        ShutdownOutcome::Forced => {
            tracing::warn!("Server stopped without closing the MongoDB client");
        }
    }
    Ok(())
}

/// How `serve_until_shutdown` finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every in-flight request completed within the grace period.
    Drained,
    /// The grace period ran out and remaining requests were dropped.
    Forced,
}

/// Serves `app` until `signal` completes, then gives in-flight requests at
/// most `grace` to finish before dropping them.
pub async fn serve_until_shutdown<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> std::io::Result<ShutdownOutcome>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        signal.await;
        let _ = signalled_tx.send(());
    });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => result.map(|()| ShutdownOutcome::Drained),
        _ = signalled_rx => {
            tracing::info!("Shutting down server...");
            match tokio::time::timeout(grace, server).await {
                Ok(result) => result.map(|()| ShutdownOutcome::Drained),
                Err(_) => {
                    tracing::warn!(
                        "Requests still running after {:?}, forcing shutdown",
                        grace
                    );
                    Ok(ShutdownOutcome::Forced)
                }
            }
        }
    }
}

/// Resolves on Ctrl+C, or on SIGTERM where available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument]
pub async fn home_handler() -> Result<Html<String>, WebError> {
    let template = HomeTemplate::new();
    template.render().map(Html).map_err(WebError::from)
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    app_name: &'static str,
}

impl HomeTemplate {
    pub fn new() -> Self {
        Self {
            app_name: "Todo",
        }
    }
}
