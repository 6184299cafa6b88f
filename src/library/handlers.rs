use super::resolver::LibraryResolver;
use super::types::{
    AssetErrorResponse, AssetNotFoundResponse, DeliveryError, DeliveryOptions, ResolveError,
    ResolvedAsset,
};

use axum::body::Body;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

pub const ASSET_ROUTE_PREFIX: &str = "/api/roms/";

const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// GET/HEAD `/api/roms/*path`
///
/// The tail is taken from the raw URI so the resolver performs the only
/// percent-decoding pass. Rejections and misses share one 404 body.
pub async fn handle_get_asset(
    Extension(resolver): Extension<Arc<LibraryResolver>>,
    Extension(delivery): Extension<Arc<DeliveryOptions>>,
    uri: Uri,
) -> Response {
    let requested = uri
        .path()
        .strip_prefix(ASSET_ROUTE_PREFIX)
        .unwrap_or_default()
        .to_string();

    let lookup = requested.clone();
    match tokio::task::spawn_blocking(move || resolver.resolve(&lookup)).await {
        Ok(resolved) => respond(resolved, &delivery, requested).await,
        Err(err) => internal_error(&requested, &DeliveryError::from(err)),
    }
}

/// Turns a resolution outcome into the endpoint's response.
///
/// Validation rejections and misses both become the same 404.
pub(crate) async fn respond(
    resolved: Result<ResolvedAsset, ResolveError>,
    delivery: &DeliveryOptions,
    requested: String,
) -> Response {
    match resolved {
        Ok(asset) => match stream_asset(&asset, delivery).await {
            Ok(response) => response,
            Err(err) => internal_error(&requested, &err),
        },
        Err(ResolveError::Rejected(_) | ResolveError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(AssetNotFoundResponse {
                error: "ROM not found".to_string(),
                file_name: requested,
            }),
        )
            .into_response(),
    }
}

/// The body never names the path; it only goes to the log.
fn internal_error(requested: &str, err: &DeliveryError) -> Response {
    tracing::error!("Failed to serve asset {:?}: {}", requested, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AssetErrorResponse {
            error: "Failed to serve ROM file".to_string(),
        }),
    )
        .into_response()
}

async fn stream_asset(
    asset: &ResolvedAsset,
    delivery: &DeliveryOptions,
) -> Result<Response, DeliveryError> {
    let io_error = |source| DeliveryError::Io {
        path: asset.path.clone(),
        source,
    };

    let file = tokio::fs::File::open(&asset.path).await.map_err(io_error)?;
    let length = file.metadata().await.map_err(io_error)?.len();

    tracing::debug!(
        "Serving {} ({} bytes) from shard {:?}",
        asset.name,
        length,
        asset.shard
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, asset.kind.content_type())
        .header(header::CONTENT_LENGTH, length)
        .header(header::CACHE_CONTROL, IMMUTABLE_CACHE)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, delivery.allow_origin.clone())
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Body::from_stream(ReaderStream::new(file)))?;

    Ok(response)
}
