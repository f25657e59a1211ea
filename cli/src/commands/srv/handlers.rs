//! # ZipDeploy Relay Server Handlers
//!
//! File: cli/src/commands/srv/handlers.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Request handlers of the relay server.
//!
//! `POST /apps/{app_name}/deploys` receives the dashboard's drag-and-drop
//! form (`filecontent` = base64 ZIP archive) and runs the full pipeline:
//!
//! 1. decode the base64 payload;
//! 2. convert the ZIP to `.tar.gz` on the blocking pool, with the local/UTC
//!    time shift captured once for the request;
//! 3. upload the archive to the platform, forwarding the caller's
//!    `Authorization` header;
//! 4. stream the platform's output back, each line terminated with `<br>`.
//!
//! Failures before the upload starts are answered with a plain-text error
//! and a status code that tells the caller whose fault it was (400 for bad
//! input, 500 for local failures, 502 when the platform is unreachable).
//!
use crate::common::archive::{self, TimeShift, TranscodeError};
use crate::common::deploy::{
    client::validate_app_name, decode_filecontent, relay_lines, DeployClient, LineTerminator,
};
use crate::common::ui::human_readable_size;
use crate::core::error::ZipDeployError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: DeployClient,
}

/// Form body posted by the drag-and-drop widget.
#[derive(Debug, Deserialize)]
pub struct DeployForm {
    pub filecontent: String,
}

/// Error response of the deploy handler.
#[derive(Debug)]
pub struct DeployFailure {
    status: StatusCode,
    message: String,
}

impl From<ZipDeployError> for DeployFailure {
    fn from(err: ZipDeployError) -> Self {
        let status = match &err {
            ZipDeployError::Payload(_)
            | ZipDeployError::ArgumentParsing(_)
            | ZipDeployError::Transcode(TranscodeError::MalformedArchive(_)) => {
                StatusCode::BAD_REQUEST
            }
            ZipDeployError::Transcode(TranscodeError::IoFailure { .. })
            | ZipDeployError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ZipDeployError::Upload { .. } => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            error!("Deploy request failed: {}", err);
        } else {
            warn!("Deploy request rejected: {}", err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for DeployFailure {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// # Deploy Uploaded Archive (`deploy_archive`)
///
/// Handler for `POST /apps/{app_name}/deploys`. On success the response is a
/// `text/html` stream of the platform's output lines.
pub async fn deploy_archive(
    State(state): State<Arc<AppState>>,
    Path(app_name): Path<String>,
    headers: HeaderMap,
    Form(form): Form<DeployForm>,
) -> Result<Response, DeployFailure> {
    validate_app_name(&app_name)?;
    let zip_bytes = decode_filecontent(&form.filecontent).map_err(ZipDeployError::from)?;
    info!(
        "Received {} ZIP archive for app '{}'",
        human_readable_size(zip_bytes.len() as u64),
        app_name
    );

    let shift = TimeShift::from_host();
    let tar_gz = tokio::task::spawn_blocking(move || archive::convert(&zip_bytes, shift))
        .await
        .map_err(|join_err| DeployFailure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Archive conversion task failed: {}", join_err),
        })?
        .map_err(ZipDeployError::from)?;

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let upstream = state
        .client
        .upload(&app_name, authorization, tar_gz.into_inner())
        .await?;

    let body = Body::from_stream(relay_lines(
        upstream.bytes_stream(),
        LineTerminator::HtmlBreak,
    ));
    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response())
}

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok"
}
