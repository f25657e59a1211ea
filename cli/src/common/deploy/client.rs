//! # ZipDeploy Platform Deploy Client (`common::deploy::client`)
//!
//! File: cli/src/common/deploy/client.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Uploads a converted `.tar.gz` archive to the platform API's deploy
//! endpoint:
//!
//! ```text
//! POST {platform_host}/apps/{app}/deploy?origin={origin}
//! Content-Type: multipart/form-data  (one part named "file")
//! Authorization: <forwarded from the caller, if any>
//! ```
//!
//! The response is returned as-is so the caller can relay its body while the
//! platform is still producing it. No retries happen here.
//!
//! ## Usage
//!
//! ```rust
//! let client = DeployClient::new("https://paas.example.com", DEFAULT_ORIGIN)?;
//! let response = client.upload("my-app", Some("bearer abc"), tar_gz_bytes).await?;
//! let lines = relay_lines(response.bytes_stream(), LineTerminator::Newline);
//! ```
//!
use crate::core::error::ZipDeployError;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use tracing::{info, warn};

/// `origin` query value recorded by the platform for dashboard uploads.
pub const DEFAULT_ORIGIN: &str = "drag-and-drop";

/// Multipart field (and file name) carrying the archive.
const ARCHIVE_PART: &str = "file";

/// Client for the platform deploy endpoint.
#[derive(Debug, Clone)]
pub struct DeployClient {
    http: Client,
    platform_host: String,
    origin: String,
}

impl DeployClient {
    /// Creates a client for `platform_host` (scheme and host, optionally a
    /// base path; a trailing `/` is ignored).
    pub fn new(
        platform_host: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<Self, ZipDeployError> {
        let platform_host = platform_host.into().trim_end_matches('/').to_string();
        if !(platform_host.starts_with("http://") || platform_host.starts_with("https://")) {
            return Err(ZipDeployError::Config(format!(
                "Platform host '{}' must start with http:// or https://",
                platform_host
            )));
        }
        let http = Client::builder()
            .user_agent(concat!("zipdeploy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ZipDeployError::Upload {
                url: platform_host.clone(),
                source,
            })?;
        Ok(Self {
            http,
            platform_host,
            origin: origin.into(),
        })
    }

    /// Builds the deploy URL for `app`.
    pub fn deploy_url(&self, app: &str) -> Result<Url, ZipDeployError> {
        validate_app_name(app)?;
        let base = format!("{}/apps/{}/deploy", self.platform_host, app);
        Url::parse_with_params(&base, &[("origin", self.origin.as_str())]).map_err(|e| {
            ZipDeployError::Config(format!("Invalid deploy URL '{}': {}", base, e))
        })
    }

    /// # Upload Archive (`upload`)
    ///
    /// Sends `archive` as the single multipart part `file` and returns the
    /// streaming response. Non-success statuses are logged but still returned,
    /// since the platform explains failures in the response body.
    ///
    /// ## Errors
    ///
    /// `ZipDeployError::ArgumentParsing` for an invalid app name, and
    /// `ZipDeployError::Upload` when the request cannot be sent.
    pub async fn upload(
        &self,
        app: &str,
        authorization: Option<&str>,
        archive: Vec<u8>,
    ) -> Result<Response, ZipDeployError> {
        let url = self.deploy_url(app)?;
        let size = archive.len();
        let form = Form::new().part(ARCHIVE_PART, Part::bytes(archive).file_name(ARCHIVE_PART));

        let mut request = self.http.post(url.clone()).multipart(form);
        if let Some(token) = authorization {
            request = request.header(AUTHORIZATION, token);
        }

        info!("Uploading {} byte archive to {}", size, url);
        let response = request
            .send()
            .await
            .map_err(|source| ZipDeployError::Upload {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            warn!(
                "Deploy endpoint {} answered with status {}",
                url,
                response.status()
            );
        }
        Ok(response)
    }
}

/// App names are used as a URL path segment; only the characters the platform
/// allows in app names are accepted.
pub fn validate_app_name(app: &str) -> Result<(), ZipDeployError> {
    let valid = !app.is_empty()
        && app
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid || app.starts_with('.') {
        return Err(ZipDeployError::ArgumentParsing(format!(
            "Invalid app name: '{}'",
            app
        )));
    }
    Ok(())
}
