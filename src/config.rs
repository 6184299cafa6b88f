//! Service Configuration
//!
//! Read from environment variables at start-up, then overridden by the
//! `--bind` and `--library` command-line flags.

use crate::admission::types::{
    AdmissionLimits, DEFAULT_MAX_REQUESTS, DEFAULT_SWEEP_THRESHOLD, DEFAULT_WINDOW,
};
use crate::library::types::LibraryLayout;

use anyhow::{Context, Result, bail};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_LIBRARY_ROOT: &str = "LibraryNes";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub library: LibraryLayout,
    /// Origin allowed to fetch assets cross-origin; `*` when unset.
    pub site_url: Option<String>,
    /// Object-storage base URL for the remote cartridge tier.
    pub remote_storage_url: Option<String>,
    /// Public origin to probe local cartridges through; in-process when unset.
    pub probe_origin: Option<String>,
    pub limits: AdmissionLimits,
    /// Peers whose forwarded-address headers are trusted.
    pub trusted_proxies: Vec<IpAddr>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind = parse_or(var("BIND_ADDR"), "BIND_ADDR", || DEFAULT_BIND.parse())?;

        let root = var("LIBRARY_ROOT").unwrap_or_else(|| DEFAULT_LIBRARY_ROOT.to_string());
        let root = PathBuf::from(root);
        let library = match var("LIBRARY_SHARDS") {
            Some(list) => LibraryLayout::new(root, split_list(&list)),
            None => LibraryLayout::with_default_shards(root),
        };
        if library.shards.is_empty() {
            bail!("LIBRARY_SHARDS must name at least one shard");
        }

        let max_requests: u32 =
            parse_or(var("RATE_LIMIT_MAX"), "RATE_LIMIT_MAX", || Ok(DEFAULT_MAX_REQUESTS))?;
        if max_requests == 0 {
            bail!("RATE_LIMIT_MAX must be at least 1");
        }

        let window_secs: u64 = parse_or(var("RATE_LIMIT_WINDOW_SECS"), "RATE_LIMIT_WINDOW_SECS", || {
            Ok(DEFAULT_WINDOW.as_secs())
        })?;
        if window_secs == 0 {
            bail!("RATE_LIMIT_WINDOW_SECS must be at least 1");
        }

        let sweep_threshold: usize = parse_or(
            var("RATE_LIMIT_SWEEP_THRESHOLD"),
            "RATE_LIMIT_SWEEP_THRESHOLD",
            || Ok(DEFAULT_SWEEP_THRESHOLD),
        )?;

        let trusted_proxies = match var("TRUSTED_PROXIES") {
            Some(list) => split_list(&list)
                .iter()
                .map(|ip| {
                    ip.parse::<IpAddr>()
                        .with_context(|| format!("TRUSTED_PROXIES entry {:?} is not an IP address", ip))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            bind,
            library,
            site_url: var("SITE_URL"),
            remote_storage_url: var("REMOTE_STORAGE_URL"),
            probe_origin: var("LOCAL_PROBE_ORIGIN"),
            limits: AdmissionLimits {
                max_requests,
                window: Duration::from_secs(window_secs),
                sweep_threshold,
            },
            trusted_proxies,
        })
    }

    /// Applies `--bind <addr:port>` and `--library <dir>` overrides.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                flag @ ("--bind" | "--library") => {
                    let Some(value) = args.get(i + 1) else {
                        bail!("{} requires a value", flag);
                    };
                    if flag == "--bind" {
                        self.bind = value
                            .parse()
                            .with_context(|| format!("invalid --bind address {:?}", value))?;
                    } else {
                        self.library.root = PathBuf::from(value);
                    }
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }
        Ok(())
    }
}

fn parse_or<T, D>(value: Option<String>, key: &str, default: D) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    D: FnOnce() -> Result<T, <T as FromStr>::Err>,
{
    match value {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} has invalid value {:?}", key, raw)),
        None => Ok(default()?),
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
