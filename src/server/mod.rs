// Web server module
// Serves the search widget and a small JSON API on top of the engine

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use crate::BookrecError;
use crate::engine::{Engine, Recommendation};
use crate::output::{format_authors, short_description};

const WIDGET_HTML: &str = include_str!("widget.html");

#[derive(Clone)]
struct SharedState {
    engine: Arc<Engine>,
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    top_k: Option<usize>,
    min_rating: Option<f32>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<BookCard>,
}

/// One result card as rendered by the widget.
#[derive(Debug, Serialize)]
struct BookCard {
    isbn13: i64,
    title: String,
    authors: String,
    description: String,
    average_rating: f32,
    published_year: Option<i32>,
    thumbnail: Option<String>,
    similarity: f32,
}

impl From<&Recommendation> for BookCard {
    fn from(rec: &Recommendation) -> Self {
        Self {
            isbn13: rec.book.isbn13,
            title: rec.book.title.clone(),
            authors: format_authors(&rec.book.authors),
            description: short_description(&rec.book.description),
            average_rating: rec.book.average_rating,
            published_year: rec.book.published_year,
            thumbnail: rec.book.thumbnail.clone(),
            similarity: rec.similarity,
        }
    }
}

#[derive(Debug)]
struct HttpError(BookrecError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            BookrecError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            BookrecError::Store(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "error": self.0.to_string() }).to_string();
        (status, body).into_response()
    }
}

async fn widget() -> Html<&'static str> {
    Html(WIDGET_HTML)
}

async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "books": state.engine.catalog().len(),
    }))
}

async fn search(
    State(state): State<SharedState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, HttpError> {
    let recommendations = state
        .engine
        .recommend(&request.query, request.top_k, request.min_rating)
        .await
        .map_err(HttpError)?;

    let results = recommendations.iter().map(BookCard::from).collect();
    Ok(Json(SearchResponse { results }))
}

fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/", get(widget))
        .route("/health", get(health))
        .route("/api/search", post(search))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(SharedState { engine })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Serve the widget and API until interrupted.
#[inline]
pub async fn run(engine: Engine, host: &str, port: u16) -> Result<()> {
    let app = router(Arc::new(engine));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
