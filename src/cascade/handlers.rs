use super::candidates::is_priority;
use super::cartridge::CartridgeCascade;
use super::cover_art::build_cover_candidates;
use super::failures::FailureSet;
use super::probe::LocalProbe;
use super::types::{
    CartridgeSourceError, CartridgeSourceResponse, CoverCandidatesResponse, CoverQuery,
    MarkFailedError, MarkFailedRequest, MarkFailedResponse, NextCandidate, NextCoverResponse,
};

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

/// Failure set shared by the cover-art endpoints.
#[derive(Clone)]
pub struct CoverFailures(pub Arc<FailureSet>);

/// GET `/api/covers/candidates?name=&known=`
pub async fn handle_cover_candidates(
    Query(query): Query<CoverQuery>,
) -> Json<CoverCandidatesResponse> {
    let list = build_cover_candidates(&query.name, query.known.as_deref());

    Json(CoverCandidatesResponse {
        name: query.name,
        candidates: list.urls().to_vec(),
    })
}

/// GET `/api/covers/next?name=&known=&after=`
///
/// Exhaustion is a normal answer: the UI renders its placeholder.
pub async fn handle_next_cover(
    Query(query): Query<CoverQuery>,
    Extension(CoverFailures(failures)): Extension<CoverFailures>,
) -> Json<NextCoverResponse> {
    let list = build_cover_candidates(&query.name, query.known.as_deref());

    let response = match list.next_candidate(query.after, &failures) {
        NextCandidate::Candidate { index, url } => NextCoverResponse::Candidate {
            index,
            url,
            priority: is_priority(index),
        },
        NextCandidate::Exhausted => {
            tracing::debug!("Cover candidates exhausted for {:?}", query.name);
            NextCoverResponse::Exhausted { exhausted: true }
        }
    };

    Json(response)
}

/// POST `/api/covers/failed`
///
/// The candidate list is rebuilt from `name` and `known`; URLs that are not
/// on it are refused so the shared set only ever holds real candidates.
pub async fn handle_mark_cover_failed(
    Extension(CoverFailures(failures)): Extension<CoverFailures>,
    Json(req): Json<MarkFailedRequest>,
) -> Result<Json<MarkFailedResponse>, (StatusCode, Json<MarkFailedError>)> {
    let list = build_cover_candidates(&req.name, req.known.as_deref());
    if !list.contains(&req.url) {
        tracing::debug!("Ignoring failure report for non-candidate {:?}", req.url);
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(MarkFailedError {
                error: "URL is not a cover candidate for this name".to_string(),
                url: req.url,
            }),
        ));
    }

    let newly_marked = failures.mark_failed(&req.url);
    Ok(Json(MarkFailedResponse {
        url: req.url,
        newly_marked,
    }))
}

/// GET `/api/cartridges/source/*path`
pub async fn handle_cartridge_source(
    Path(path): Path<String>,
    Extension(cascade): Extension<Arc<CartridgeCascade>>,
    Extension(probe): Extension<Arc<LocalProbe>>,
) -> Result<Json<CartridgeSourceResponse>, (StatusCode, Json<CartridgeSourceError>)> {
    match cascade.resolve(&path, probe.as_ref()).await {
        Ok(source) => {
            let location = source
                .found
                .flatten()
                .map(|asset| asset.relative_path());

            Ok(Json(CartridgeSourceResponse {
                path,
                url: source.url,
                mode: source.mode,
                location,
            }))
        }
        Err(err) => {
            tracing::debug!("{}", err);
            Err((
                StatusCode::NOT_FOUND,
                Json(CartridgeSourceError {
                    error: "No source available for cartridge".to_string(),
                    path,
                }),
            ))
        }
    }
}
