//! HTTP router assembly shared by the binary and the router tests.

use crate::admission::gate::AdmissionGate;
use crate::admission::identity::IdentityPolicy;
use crate::admission::middleware::{AdmissionState, admit, security_headers};
use crate::cascade::cartridge::CartridgeCascade;
use crate::cascade::failures::FailureSet;
use crate::cascade::handlers::{
    CoverFailures, handle_cartridge_source, handle_cover_candidates, handle_mark_cover_failed,
    handle_next_cover,
};
use crate::cascade::probe::LocalProbe;
use crate::config::AppConfig;
use crate::library::handlers::handle_get_asset;
use crate::library::resolver::LibraryResolver;
use crate::library::types::DeliveryOptions;

use anyhow::Result;
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde_json::{Value, json};
use std::sync::Arc;

/// Long-lived state, constructed once at start-up and injected into handlers.
#[derive(Clone)]
pub struct Services {
    pub gate: Arc<AdmissionGate>,
    pub policy: Arc<IdentityPolicy>,
    pub resolver: Arc<LibraryResolver>,
    pub delivery: Arc<DeliveryOptions>,
    pub cartridges: Arc<CartridgeCascade>,
    pub local_probe: Arc<LocalProbe>,
    pub cover_failures: Arc<FailureSet>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let policy = IdentityPolicy::from_proxies(config.trusted_proxies.clone());
        if policy == IdentityPolicy::TrustForwardedHeaders {
            tracing::warn!(
                "TRUSTED_PROXIES is not set: forwarded-address headers are trusted from any peer \
                 and rate-limit identities can be spoofed"
            );
        }

        let resolver = LibraryResolver::new(config.library.clone())?;
        let local_probe = LocalProbe::new(resolver.clone(), config.probe_origin.as_deref());

        Ok(Self {
            gate: AdmissionGate::new(config.limits),
            policy: Arc::new(policy),
            resolver,
            delivery: Arc::new(DeliveryOptions::new(config.site_url.as_deref())?),
            cartridges: CartridgeCascade::new(config.remote_storage_url.as_deref()),
            local_probe: Arc::new(local_probe),
            cover_failures: FailureSet::new(),
        })
    }
}

pub fn router(services: &Services) -> Router {
    let admission = AdmissionState {
        gate: services.gate.clone(),
        policy: services.policy.clone(),
    };

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/roms/*path", get(handle_get_asset))
        .route("/api/cartridges/source/*path", get(handle_cartridge_source))
        .route("/api/covers/candidates", get(handle_cover_candidates))
        .route("/api/covers/next", get(handle_next_cover))
        .route("/api/covers/failed", post(handle_mark_cover_failed))
        .layer(Extension(services.resolver.clone()))
        .layer(Extension(services.delivery.clone()))
        .layer(Extension(services.cartridges.clone()))
        .layer(Extension(services.local_probe.clone()))
        .layer(Extension(CoverFailures(services.cover_failures.clone())))
        .layer(middleware::from_fn_with_state(admission, admit))
        .layer(middleware::from_fn(security_headers))
}

async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
