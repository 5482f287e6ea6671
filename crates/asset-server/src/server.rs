//! HTTP server for asset endpoints
//!
//! Provides /health, GET /assets/{id} (JSON envelope), GET /assets/{id}/raw
//! (byte stream), and POST /assets (upload).

use crate::content_type::{content_type_for, inline_disposition};
use crate::error::AppError;
use crate::retrieval::{AssetRetriever, Retrieved};
use crate::store::AssetStore;
use crate::types::{AssetEnvelope, HealthResponse, UploadRequest, UploadResponse, UploadedAsset};
use crate::upload::decode_upload;
use asset_cache::CacheStore;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state for the HTTP server
pub struct ServerState {
    pub retriever: AssetRetriever,
    pub store: Arc<dyn AssetStore>,
    /// Include diagnostic detail in error bodies
    pub expose_error_details: bool,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        store: Arc<dyn AssetStore>,
        cache: Arc<dyn CacheStore>,
        ttl_secs: u64,
        expose_error_details: bool,
    ) -> Self {
        Self {
            retriever: AssetRetriever::new(store.clone(), cache, ttl_secs),
            store,
            expose_error_details,
            started_at: Utc::now(),
        }
    }

    fn error_response(&self, err: AppError) -> Response {
        err.into_response_with(self.expose_error_details)
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/assets", axum::routing::post(upload_asset))
        .route("/assets/{id}", get(get_asset))
        .route("/assets/{id}/raw", get(get_asset_raw))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16, max_body_bytes: usize) -> std::io::Result<()> {
    let router = create_router(state, max_body_bytes);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;
    info!(%method, %path, status = response.status().as_u16(), "Request");
    response
}

async fn root() -> &'static str {
    "API is running!"
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: state.retriever.stats(),
    })
}

fn cache_headers(retrieved: &Retrieved, ttl_secs: u64) -> [(header::HeaderName, String); 2] {
    let cache_header = if retrieved.from_cache { "HIT" } else { "MISS" };
    [
        (header::CACHE_CONTROL, format!("public, max-age={}", ttl_secs)),
        (header::HeaderName::from_static("x-cache"), cache_header.to_string()),
    ]
}

/// Get an asset with its metadata as JSON
async fn get_asset(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match state.retriever.retrieve(&id).await {
        Ok(retrieved) => {
            let headers = cache_headers(&retrieved, state.retriever.ttl_secs());
            (headers, Json(AssetEnvelope::from(&retrieved.asset))).into_response()
        }
        Err(e) => state.error_response(e),
    }
}

/// Get an asset's bytes verbatim
async fn get_asset_raw(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let retrieved = match state.retriever.retrieve(&id).await {
        Ok(retrieved) => retrieved,
        Err(e) => return state.error_response(e),
    };

    let [cache_control, x_cache] = cache_headers(&retrieved, state.retriever.ttl_secs());
    let asset = retrieved.asset;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&asset.filename))
        .header(header::CONTENT_DISPOSITION, inline_disposition(&asset.filename))
        .header(cache_control.0, cache_control.1)
        .header(x_cache.0, x_cache.1)
        .body(Body::from(asset.content))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Store a new asset from a base64 upload
async fn upload_asset(
    State(state): State<SharedState>,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return rejection.into_response()
        }
        Err(rejection) => {
            return state.error_response(AppError::InvalidInput(rejection.body_text()))
        }
    };

    let new_asset = match decode_upload(req) {
        Ok(asset) => asset,
        Err(e) => return state.error_response(e),
    };
    let filename = new_asset.filename.clone();
    let size = new_asset.content.len();

    match state.store.insert(new_asset).await {
        Ok(id) => {
            info!(asset_id = id, filename = %filename, size, "Asset uploaded");
            (
                StatusCode::CREATED,
                Json(UploadResponse {
                    success: true,
                    message: "Image added successfully".to_string(),
                    data: UploadedAsset { id, filename, size },
                }),
            )
                .into_response()
        }
        Err(e) => state.error_response(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::DEFAULT_TTL_SECS;
    use crate::store::testing::{row, MemoryAssetStore};
    use crate::store::StoredAsset;
    use asset_cache::{AssetMetadata, DiskCache, MemoryCache};
    use axum::http::Request;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tempfile::tempdir;
    use tower::ServiceExt;

    const BODY_LIMIT: usize = 10 * 1024 * 1024;

    fn create_test_app(
        store: MemoryAssetStore,
        expose_error_details: bool,
    ) -> (Router, Arc<MemoryAssetStore>) {
        let store = Arc::new(store);
        let state = Arc::new(ServerState::new(
            store.clone(),
            Arc::new(MemoryCache::new()),
            DEFAULT_TTL_SECS,
            expose_error_details,
        ));
        (create_router(state, BODY_LIMIT), store)
    }

    async fn send_get(router: &Router, uri: &str) -> Response {
        router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_json(router: &Router, uri: &str, body: String) -> Response {
        router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let (router, _) = create_test_app(MemoryAssetStore::new(), false);
        let response = send_get(&router, "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"API is running!".to_vec());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (router, _) = create_test_app(MemoryAssetStore::new(), false);

        let response = send_get(&router, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].as_u64().is_some());
        assert_eq!(json["cache"]["hits"], 0);
        assert_eq!(json["cache"]["write_errors"], 0);
    }

    #[tokio::test]
    async fn test_raw_endpoint_serves_bytes_and_headers() {
        let bytes = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10];
        let store = MemoryAssetStore::new()
            .with_row(7, row("Beleg 7.jpg", &bytes))
            .await;
        let (router, store) = create_test_app(store, false);

        let response = send_get(&router, "/assets/7/raw").await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "inline; filename=\"Beleg%207.jpg\""
        );
        assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=3600");
        assert_eq!(headers["x-cache"], "MISS");
        assert_eq!(body_bytes(response).await, bytes);

        let response = send_get(&router, "/assets/7/raw").await;
        assert_eq!(response.headers()["x-cache"], "HIT");
        assert_eq!(body_bytes(response).await, bytes);
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_raw_endpoint_pdf_and_unknown_types() {
        let store = MemoryAssetStore::new()
            .with_row(1, row("auszug.PDF", b"%PDF-1.7"))
            .await
            .with_row(2, row("export.xlsx", b"PK\x03\x04"))
            .await;
        let (router, _) = create_test_app(store, false);

        let response = send_get(&router, "/assets/1/raw").await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");

        let response = send_get(&router, "/assets/2/raw").await;
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn test_json_endpoint_envelope() {
        let mut stored = row("scan.png", b"\x89PNG");
        stored
            .metadata
            .insert("klassifikation1".into(), "Kontoauszug".into());
        stored
            .metadata
            .insert("final_cnt_fk_kon_person".into(), 3.into());
        let store = MemoryAssetStore::new().with_row(21, stored).await;
        let (router, _) = create_test_app(store, false);

        let response = send_get(&router, "/assets/21").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=3600");

        let json = body_json(response).await;
        assert_eq!(json["file"]["filename"], "scan.png");
        assert_eq!(json["file"]["contentType"], "image/png");
        assert_eq!(
            STANDARD
                .decode(json["file"]["content"].as_str().unwrap())
                .unwrap(),
            b"\x89PNG".to_vec()
        );
        assert_eq!(json["metadata"]["klassifikation1"], "Kontoauszug");
        assert_eq!(json["metadata"]["final_cnt_fk_kon_person"], 3);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let (router, store) = create_test_app(MemoryAssetStore::new(), false);

        for uri in ["/assets/abc", "/assets/abc/raw", "/assets/-3"] {
            let response = send_get(&router, uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
        assert_eq!(store.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_asset_is_not_found() {
        let (router, _) = create_test_app(MemoryAssetStore::new(), false);

        let response = send_get(&router, "/assets/999999").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Image not found");

        let response = send_get(&router, "/assets/999999/raw").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_content_is_not_found_with_invalid_data() {
        let store = MemoryAssetStore::new().with_row(5, row("a.png", b"")).await;
        let (router, _) = create_test_app(store, false);

        let response = send_get(&router, "/assets/5/raw").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid asset data");
    }

    #[tokio::test]
    async fn test_store_unavailable_is_503() {
        let store = MemoryAssetStore::new();
        store.set_unavailable(true);
        let (router, _) = create_test_app(store, false);

        let response = send_get(&router, "/assets/1").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Database unavailable");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_development_mode_includes_details() {
        let store = MemoryAssetStore::new();
        store.set_unavailable(true);
        let (router, _) = create_test_app(store, true);

        let json = body_json(send_get(&router, "/assets/1/raw").await).await;
        assert_eq!(json["details"], "connection refused");
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_falls_back_to_store() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(DiskCache::new(dir.path().to_path_buf()));
        cache.init().await.unwrap();
        std::fs::write(cache.entry_path(8), b"{\"id\":8,\"content\":").unwrap();

        let store = Arc::new(MemoryAssetStore::new().with_row(8, row("h.gif", b"GIF89a")).await);
        let state = Arc::new(ServerState::new(store.clone(), cache, DEFAULT_TTL_SECS, false));
        let router = create_router(state, BODY_LIMIT);

        let response = send_get(&router, "/assets/8/raw").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"GIF89a".to_vec());
        assert_eq!(store.fetch_count(), 1);

        let json = body_json(send_get(&router, "/health").await).await;
        assert_eq!(json["cache"]["read_errors"], 1);
    }

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let (router, store) = create_test_app(MemoryAssetStore::new(), false);
        let body = serde_json::json!({
            "description": "Tankquittung",
            "files": [{ "name": "quittung.png", "data": "data:image/png;base64,iVBORw==" }]
        });

        let response = post_json(&router, "/assets", body.to_string()).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["filename"], "quittung.png");
        assert_eq!(json["data"]["size"], 4);
        let id = json["data"]["id"].as_i64().unwrap();

        let response = send_get(&router, &format!("/assets/{}/raw", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"\x89PNG".to_vec());
        assert_eq!(store.fetch_count(), 1);

        let json = body_json(send_get(&router, &format!("/assets/{}", id)).await).await;
        assert_eq!(json["metadata"]["klassifikation1"], "Tankquittung");
        assert_eq!(json["metadata"]["klassifikation2"], "Landscape");
    }

    #[tokio::test]
    async fn test_upload_validation_errors() {
        let (router, _) = create_test_app(MemoryAssetStore::new(), false);

        let missing = serde_json::json!({ "files": [{ "name": "a.png" }] });
        let response = post_json(&router, "/assets", missing.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Image data and filename are required");

        let bad = serde_json::json!({ "files": [{ "name": "a.png", "data": "***" }] });
        let response = post_json(&router, "/assets", bad.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = post_json(&router, "/assets", "{not json".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_store_unavailable() {
        let store = MemoryAssetStore::new();
        store.set_unavailable(true);
        let (router, _) = create_test_app(store, false);

        let body = serde_json::json!({ "files": [{ "name": "a.gif", "data": "R0lGODlh" }] });
        let response = post_json(&router, "/assets", body.to_string()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_row_without_filename_is_invalid_data() {
        let stored = StoredAsset {
            content: Some(b"x".to_vec()),
            filename: None,
            metadata: AssetMetadata::new(),
        };
        let store = MemoryAssetStore::new().with_row(2, stored).await;
        let (router, _) = create_test_app(store, true);

        let response = send_get(&router, "/assets/2").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid asset data");
        assert!(json["details"].as_str().unwrap().contains("asset 2"));
    }

    #[test]
    fn test_server_state_new() {
        let state = ServerState::new(
            Arc::new(MemoryAssetStore::new()),
            Arc::new(MemoryCache::new()),
            DEFAULT_TTL_SECS,
            false,
        );

        // started_at should be close to now
        let diff = (Utc::now() - state.started_at).num_seconds();
        assert!((0..5).contains(&diff));
        assert_eq!(state.retriever.ttl_secs(), 3600);
    }
}
