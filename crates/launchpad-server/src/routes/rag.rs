use axum::extract::{Multipart, Path, State};
use axum::Json;
use launchpad_core::config::Service;
use launchpad_core::validate;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::proxy::{self, Failure};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Multipart intake
// ---------------------------------------------------------------------------

/// Files and the optional session id pulled from an incoming form.
#[derive(Default)]
struct Upload {
    files: Vec<Part>,
    session_id: Option<String>,
}

/// Read every field of `multipart`, keeping file fields named `file_field`.
async fn read_upload(mut multipart: Multipart, file_field: &str) -> Result<Upload, AppError> {
    let mut upload = Upload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let file_name = field.file_name().unwrap_or(file_field).to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::bad_request(format!("invalid multipart body: {e}")))?;
            let part = Part::bytes(bytes.to_vec())
                .file_name(file_name)
                .mime_str(&content_type)
                .map_err(|e| AppError::bad_request(format!("invalid content type: {e}")))?;
            upload.files.push(part);
        } else if name == "session_id" {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::bad_request(format!("invalid multipart body: {e}")))?;
            if !value.is_empty() {
                upload.session_id = Some(value);
            }
        }
    }
    Ok(upload)
}

// ---------------------------------------------------------------------------
// Query handlers
// ---------------------------------------------------------------------------

/// POST /api/rag/upload — forward documents to the RAG service.
pub async fn upload_documents(
    State(app): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let upload = read_upload(multipart, "files").await?;
    if upload.files.is_empty() {
        return Err(AppError::bad_request("No files provided"));
    }
    let base = app.config.require(Service::Rag)?;

    let count = upload.files.len();
    let mut form = Form::new();
    for part in upload.files {
        form = form.part("files", part);
    }
    if let Some(session_id) = upload.session_id {
        form = form.text("session_id", session_id);
    }

    tracing::info!(files = count, "uploading documents");
    let resp = proxy::send(
        app.http_client
            .post(format!("{base}/upload-document"))
            .multipart(form),
        "Document upload failed",
    )
    .await?;
    proxy::relay_json(resp, Failure::Fixed("Document upload failed")).await
}

/// POST /api/rag/ask-text — JSON in, form-urlencoded out.
pub async fn ask_text(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<Value>, AppError> {
    let question = validate::text_question(&body)?;
    let base = app.config.require(Service::Rag)?;

    let mut params = vec![("question", question.question)];
    if let Some(session_id) = question.session_id {
        params.push(("session_id", session_id));
    }

    let resp = proxy::send(
        app.http_client
            .post(format!("{base}/ask-text"))
            .form(&params),
        "Query failed",
    )
    .await?;
    proxy::relay_json(resp, Failure::Fixed("Query failed")).await
}

/// POST /api/rag/ask-voice — forward a recorded question.
pub async fn ask_voice(
    State(app): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let upload = read_upload(multipart, "audio").await?;
    let Some(audio) = upload.files.into_iter().next() else {
        return Err(AppError::bad_request("Audio file is required"));
    };
    let base = app.config.require(Service::Rag)?;

    let mut form = Form::new().part("audio", audio);
    if let Some(session_id) = upload.session_id {
        form = form.text("session_id", session_id);
    }

    let resp = proxy::send(
        app.http_client
            .post(format!("{base}/ask-voice"))
            .multipart(form),
        "Voice query failed",
    )
    .await?;
    proxy::relay_json(resp, Failure::Fixed("Voice query failed")).await
}

// ---------------------------------------------------------------------------
// Session handlers
// ---------------------------------------------------------------------------

/// GET /api/rag/session/{id}
pub async fn get_session(
    State(app): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let base = app.config.require(Service::Rag)?;
    let resp = proxy::send(
        app.http_client.get(proxy::upstream_url(base, &["session", session_id.as_str()])?),
        "Failed to get session info",
    )
    .await?;
    proxy::relay_json(resp, Failure::Fixed("Failed to get session info")).await
}

/// DELETE /api/rag/session/{id}
pub async fn delete_session(
    State(app): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let base = app.config.require(Service::Rag)?;
    let resp = proxy::send(
        app.http_client.delete(proxy::upstream_url(base, &["session", session_id.as_str()])?),
        "Failed to delete session",
    )
    .await?;
    proxy::relay_json(resp, Failure::Fixed("Failed to delete session")).await
}

/// POST /api/rag/session/{id}/clear — drop the conversation memory but
/// keep the uploaded documents.
pub async fn clear_session(
    State(app): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let base = app.config.require(Service::Rag)?;
    let resp = proxy::send(
        app.http_client
            .post(proxy::upstream_url(base, &["clear-memory", session_id.as_str()])?),
        "Failed to clear memory",
    )
    .await?;
    proxy::relay_json(resp, Failure::Fixed("Failed to clear memory")).await
}

/// Release a remote RAG session after its last chat is gone. Failures are
/// logged and swallowed.
pub(crate) async fn release_session(app: &AppState, session_id: &str) {
    let Some(base) = app.config.get(Service::Rag) else {
        tracing::debug!(session_id, "RAG service not configured, skipping session release");
        return;
    };
    let url = match proxy::upstream_url(base, &["session", session_id]) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(session_id, error = %e.0, "remote session release skipped");
            return;
        }
    };
    match app.http_client.delete(url).send().await {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!(session_id, "remote session released");
        }
        Ok(resp) => {
            tracing::warn!(session_id, status = resp.status().as_u16(), "remote session release rejected");
        }
        Err(e) => {
            tracing::warn!(session_id, error = %e, "remote session release failed");
        }
    }
}
