//! Cheap existence checks used by the cartridge cascade.

use super::cartridge::LOCAL_ROUTE_PREFIX;
use crate::library::resolver::LibraryResolver;
use crate::library::types::ResolvedAsset;

use std::future::Future;
use std::sync::Arc;

/// Answers "does this candidate URL currently serve something?".
///
/// `Some` carries whatever the probe learned about the hit; network
/// failures count as "no".
pub trait SourceProbe: Send + Sync {
    type Found: Send;

    fn probe(&self, url: &str) -> impl Future<Output = Option<Self::Found>> + Send;
}

/// Probes over HTTP with a `HEAD` request.
///
/// Relative candidate URLs (the same-origin library endpoint) are joined onto `origin`.
pub struct HttpProbe {
    origin: String,
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with('/') {
            format!("{}{}", self.origin, url)
        } else {
            url.to_string()
        }
    }
}

impl SourceProbe for HttpProbe {
    type Found = ();

    async fn probe(&self, url: &str) -> Option<()> {
        let target = self.absolute(url);
        match self.client.head(&target).send().await {
            Ok(response) if response.status().is_success() => Some(()),
            Ok(response) => {
                tracing::debug!("Probe of {} answered {}", target, response.status());
                None
            }
            Err(err) => {
                tracing::debug!("Probe of {} failed: {}", target, err);
                None
            }
        }
    }
}

/// Probes the local library in-process, without a network round trip.
pub struct LibraryProbe {
    resolver: Arc<LibraryResolver>,
}

impl LibraryProbe {
    pub fn new(resolver: Arc<LibraryResolver>) -> Self {
        Self { resolver }
    }
}

impl SourceProbe for LibraryProbe {
    type Found = ResolvedAsset;

    async fn probe(&self, url: &str) -> Option<ResolvedAsset> {
        let requested = url
            .strip_prefix(LOCAL_ROUTE_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))?
            .to_string();

        let resolver = self.resolver.clone();
        tokio::task::spawn_blocking(move || resolver.resolve(&requested).ok())
            .await
            .ok()
            .flatten()
    }
}

/// Probe used by the cartridge source endpoint.
///
/// In-process by default. With a public origin configured, the local tier is
/// checked through that origin instead, so a broken front proxy route falls
/// through to remote storage.
pub enum LocalProbe {
    Library(LibraryProbe),
    Http(HttpProbe),
}

impl LocalProbe {
    pub fn new(resolver: Arc<LibraryResolver>, public_origin: Option<&str>) -> Self {
        match public_origin {
            Some(origin) => {
                tracing::info!("Probing local cartridges through {}", origin);
                LocalProbe::Http(HttpProbe::new(origin))
            }
            None => LocalProbe::Library(LibraryProbe::new(resolver)),
        }
    }
}

impl SourceProbe for LocalProbe {
    /// The resolved file, when the library was probed in-process.
    type Found = Option<ResolvedAsset>;

    async fn probe(&self, url: &str) -> Option<Option<ResolvedAsset>> {
        match self {
            LocalProbe::Library(probe) => probe.probe(url).await.map(Some),
            LocalProbe::Http(probe) => probe.probe(url).await.map(|()| None),
        }
    }
}
