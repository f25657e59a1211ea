//! # ZipDeploy Relay Server Implementation
//!
//! File: cli/src/commands/srv/server_logic.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module implements the HTTP server behind `zipdeploy srv`: it accepts
//! drag-and-drop deploys from the dashboard, converts them and relays them to
//! the platform API.
//! - Port availability checking with automatic fallback
//! - Request body size limit
//! - CORS configuration
//! - Graceful shutdown handling
//!
//! ## Architecture
//!
//! The server implementation uses Axum and follows these steps:
//! 1. Build the deploy client from the configuration
//! 2. Set up the Axum router with appropriate middleware
//! 3. Find an available port if requested one is in use
//! 4. Start the server with graceful shutdown handlers
//!
//! Routes:
//! - `POST /apps/{app_name}/deploys` - convert and deploy a base64 ZIP upload
//! - `GET /healthz` - liveness probe
//!
use super::config::ServerConfig;
use super::handlers::{self, AppState};
use crate::common::deploy::DeployClient;
use crate::common::ui::human_readable_size;
use crate::core::error::Result;
use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::{error, info, warn, Level};

/// # Run HTTP Server (`run_server`)
///
/// Initializes and starts the relay server according to `config` and serves
/// until Ctrl+C or SIGTERM.
///
/// ## Errors
///
/// - The platform host is not a valid http(s) URL.
/// - No available port is found within the allowed attempts.
/// - Binding the `TcpListener` fails or the server hits a fatal error.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let client = DeployClient::new(config.platform_host.clone(), config.origin.clone())?;

    let max_port_attempts = 10;
    let addr = find_available_port(config.host, config.port, max_port_attempts).await?;

    let app = create_app(&config, client);

    println!("\n=================================================================");
    println!("🚀 Relaying deploys to: {}", config.platform_host);
    println!("🌐 Local URL:           http://localhost:{}", addr.port());
    println!("⚙️  Binding to address:  {}", addr);
    println!("🏷️  Deploy origin:       {}", config.origin);
    println!(
        "📦 Max upload size:     {}",
        human_readable_size(config.max_body_bytes as u64)
    );
    println!("🔒 CORS enabled:        {}", config.enable_cors);
    println!("=================================================================\n");

    info!(
        "Starting relay server on {} for platform {}",
        addr, config.platform_host
    );
    println!("Server starting! Press Ctrl+C to stop.");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener to address {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    println!("\nServer shutdown complete.");
    Ok(())
}

/// # Handle Shutdown Signal (`shutdown_signal`)
///
/// Resolves when Ctrl+C or (on Unix) SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                error!(
                    "Failed to install SIGTERM handler: {}. Shutdown on SIGTERM might not work.",
                    e
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// # Find Available Port (`find_available_port`)
///
/// Tries `start_port` and up to `max_attempts - 1` following ports, returning
/// the first address that can be bound.
async fn find_available_port(
    req_host: std::net::IpAddr,
    start_port: u16,
    max_attempts: u8,
) -> Result<SocketAddr> {
    let mut current_port = start_port;

    for attempt in 0..max_attempts {
        let addr = SocketAddr::new(req_host, current_port);

        match TcpListener::bind(addr).await {
            Ok(listener) => {
                drop(listener);
                if attempt > 0 {
                    info!(
                        "Port {} was unavailable, successfully bound to available port {}.",
                        start_port, current_port
                    );
                }
                return Ok(addr);
            }
            Err(e) => {
                warn!(
                    "Attempt {}: Port {} on host {} is unavailable (Error: {}). Trying next port...",
                    attempt + 1,
                    current_port,
                    req_host,
                    e
                );
                current_port = match current_port.checked_add(1) {
                    Some(port) => port,
                    None => break,
                };
            }
        }
    }

    anyhow::bail!(
        "Could not find an available port on host {} starting from port {} after trying {} ports.",
        req_host,
        start_port,
        max_attempts
    )
}

/// # Create Axum Application (`create_app`)
///
/// Builds the router with the deploy and health routes, the body size limit,
/// request tracing and (optionally) permissive CORS.
fn create_app(config: &ServerConfig, client: DeployClient) -> Router {
    let cors_layer = if config.enable_cors {
        info!("CORS middleware enabled (permissive).");
        CorsLayer::permissive()
    } else {
        info!("CORS middleware disabled.");
        CorsLayer::new()
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::default().include_headers(false))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let state = Arc::new(AppState { client });

    Router::new()
        .route("/apps/{app_name}/deploys", post(handlers::deploy_archive))
        .route("/healthz", get(handlers::healthz))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(cors_layer),
        )
}

// --- Unit Tests ---

/// # Unit Tests for Server Logic
///
/// Router tests run against an in-process mock of the platform deploy
/// endpoint bound to an ephemeral localhost port.
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::extract::{Multipart, Query};
    use axum::http::{header, HeaderMap, Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use flate2::read::GzDecoder;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use std::net::{IpAddr, Ipv4Addr};
    use tower::ServiceExt;

    /// Mock platform endpoint: unpacks the uploaded archive and answers with
    /// a few lines describing what it received.
    async fn mock_deploy(
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> String {
        let mut names = Vec::new();
        let mut file_name = String::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() != Some("file") {
                continue;
            }
            file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.unwrap();
            let mut archive = ::tar::Archive::new(GzDecoder::new(&data[..]));
            for entry in archive.entries().unwrap() {
                let entry = entry.unwrap();
                names.push(String::from_utf8_lossy(&entry.path_bytes()).to_string());
            }
        }
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");
        format!(
            "origin={}\nauth={}\nfile={}\r\nentries={}\n\nOK",
            query.get("origin").cloned().unwrap_or_default(),
            auth,
            file_name,
            names.join(",")
        )
    }

    /// Starts the mock platform and returns its base URL.
    async fn spawn_mock_platform() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/apps/{app}/deploy", post(mock_deploy));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn test_config(platform_host: &str) -> ServerConfig {
        ServerConfig {
            port: 0,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            platform_host: platform_host.to_string(),
            origin: "drag-and-drop".to_string(),
            enable_cors: true,
            max_body_bytes: 1024 * 1024,
        }
    }

    fn test_app(config: &ServerConfig) -> Router {
        let client = DeployClient::new(config.platform_host.clone(), config.origin.clone()).unwrap();
        create_app(config, client)
    }

    fn sample_zip() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        writer.add_directory("app/", options).unwrap();
        writer.start_file("app/main.go", options).unwrap();
        writer.write_all(b"package main\n").unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// URL-encodes a base64 string for an `application/x-www-form-urlencoded` body.
    fn form_body(encoded: &str) -> String {
        let escaped = encoded
            .replace('+', "%2B")
            .replace('/', "%2F")
            .replace('=', "%3D");
        format!("filecontent={}", escaped)
    }

    fn deploy_request(app: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/apps/{}/deploys", app))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::AUTHORIZATION, "bearer secret-token")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_deploy_relays_platform_output() {
        let platform = spawn_mock_platform().await;
        let app = test_app(&test_config(&platform));

        let body = form_body(&STANDARD.encode(sample_zip()));
        let response = app.oneshot(deploy_request("my-app", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            body_text(response).await,
            "origin=drag-and-drop<br>auth=bearer secret-token<br>file=file<br>\
             entries=app/,app/main.go<br><br>OK<br>"
        );
    }

    #[tokio::test]
    async fn test_deploy_rejects_malformed_archive() {
        let app = test_app(&test_config("http://127.0.0.1:9"));
        let body = form_body(&STANDARD.encode(b"this is not a zip archive"));
        let response = app.oneshot(deploy_request("my-app", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("malformed zip archive"));
    }

    #[tokio::test]
    async fn test_deploy_rejects_invalid_base64() {
        let app = test_app(&test_config("http://127.0.0.1:9"));
        let response = app
            .oneshot(deploy_request("my-app", "filecontent=%21%21%21".to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("not valid base64"));
    }

    #[tokio::test]
    async fn test_deploy_rejects_invalid_app_name() {
        let app = test_app(&test_config("http://127.0.0.1:9"));
        let body = form_body(&STANDARD.encode(sample_zip()));
        let response = app.oneshot(deploy_request("bad%20app", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deploy_reports_unreachable_platform() {
        // Bind and release a port so nothing is listening on it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let app = test_app(&test_config(&format!("http://{}", addr)));
        let body = form_body(&STANDARD.encode(sample_zip()));
        let response = app.oneshot(deploy_request("my-app", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_body_limit_is_enforced() {
        let mut config = test_config("http://127.0.0.1:9");
        config.max_body_bytes = 64;
        let app = test_app(&config);
        let body = form_body(&STANDARD.encode(vec![0u8; 1024]));
        let response = app.oneshot(deploy_request("my-app", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = test_app(&test_config("http://127.0.0.1:9"));
        let request = Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");
    }

    /// Test finding an available port when the start port is free.
    #[tokio::test]
    async fn test_find_available_port_start_is_free() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 50000;
        let addr = find_available_port(host, start_port, 5).await?;
        assert_eq!(addr.port(), start_port);
        assert_eq!(addr.ip(), host);
        Ok(())
    }

    /// Test finding an available port when the start port is occupied.
    #[tokio::test]
    async fn test_find_available_port_start_occupied() -> Result<()> {
        let host = Ipv4Addr::LOCALHOST.into();
        let start_port = 51000;
        let _listener = TcpListener::bind(SocketAddr::new(host, start_port)).await?;

        let addr = find_available_port(host, start_port, 5).await?;
        assert!(addr.port() > start_port);
        assert!(addr.port() < start_port + 5);
        Ok(())
    }
}
