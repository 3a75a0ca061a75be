pub mod auth;
pub mod error;
mod extract;
mod proxy;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Uploaded documents and voice recordings go through the multipart routes.
const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Saved startup form
        .route("/api/crew/get-form", get(routes::forms::get_form))
        .route("/api/crew/save-form", post(routes::forms::save_form))
        // Crew pipelines
        .route(
            "/api/crew/{kind}",
            post(routes::crew::submit_analysis).get(routes::crew::get_results),
        )
        .route(
            "/api/crew/{kind}/stream",
            get(routes::crew::stream_progress),
        )
        // RAG chat persistence
        .route(
            "/api/rag/chats",
            get(routes::chats::list_chats)
                .post(routes::chats::save_chat)
                .delete(routes::chats::delete_all_chats),
        )
        .route(
            "/api/rag/chats/{id}",
            get(routes::chats::get_chat).delete(routes::chats::delete_chat),
        )
        // RAG service
        .route("/api/rag/upload", post(routes::rag::upload_documents))
        .route("/api/rag/ask-text", post(routes::rag::ask_text))
        .route("/api/rag/ask-voice", post(routes::rag::ask_voice))
        .route(
            "/api/rag/session/{id}",
            get(routes::rag::get_session).delete(routes::rag::delete_session),
        )
        .route(
            "/api/rag/session/{id}/clear",
            post(routes::rag::clear_session),
        )
        // Pitch workflow
        .route("/api/pitcher/start", post(routes::pitcher::start_pitch))
        .route(
            "/api/pitcher/approve/{session_id}",
            post(routes::pitcher::approve_pitch),
        )
        .route(
            "/api/pitcher/final/{session_id}",
            get(routes::pitcher::final_pitch),
        )
        .route(
            "/api/pitcher/session/{session_id}",
            axum::routing::delete(routes::pitcher::delete_pitch_session),
        )
        // Single-shot services
        .route("/api/predict", post(routes::predict::predict))
        .route("/api/enhance", post(routes::enhance::enhance))
        .route("/api/investor", post(routes::investor::submit_investor))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the launchpad server.
pub async fn serve(app_state: AppState, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener, open_browser).await
}

/// Start the launchpad server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    if app_state.config.session_secret().is_none() {
        tracing::warn!("SESSION_SECRET not set; authenticated routes will fail");
    }
    let app = build_router(app_state);

    tracing::info!("launchpad server listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/health");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
