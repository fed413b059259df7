//! Cache controller lifecycle and fetch strategies.
//!
//! Lifecycle: `Parsed -> Installing -> Installed -> Activating -> Active`,
//! or `Installing -> Redundant` when precaching fails.

use super::manifest::CacheManifest;
use super::request::{AssetRequest, AssetResponse, Network, NetworkError, RequestMode};
use super::storage::CacheStorage;
use super::{CacheError, CacheResult};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use url::{Origin, Url};

static CODE_ASSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(html?|m?js|css|json|webmanifest)$").expect("valid code asset regex")
});

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Parsed,
    Installing,
    /// Precached, waiting to activate.
    Installed,
    Activating,
    Active,
    /// Install failed; this controller will never serve.
    Redundant,
}

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
    OfflineShell,
}

/// Result of intercepting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request itself.
    Passthrough,
    Served {
        response: AssetResponse,
        source: ServedFrom,
    },
    /// Network and cache both unavailable for a cache-first asset.
    Failed(NetworkError),
}

/// Offline cache controller bound to one manifest generation.
pub struct CacheController<N: Network, S: CacheStorage> {
    manifest: CacheManifest,
    origin: Url,
    shell_key: String,
    network: N,
    storage: S,
    state: LifecycleState,
}

impl<N: Network, S: CacheStorage> CacheController<N, S> {
    /// Creates a controller scoped to `origin` after validating the manifest.
    ///
    /// Manifest paths resolve against `origin`, so a deployment under
    /// `https://host/app/` precaches `https://host/app/<asset>`.
    pub fn new(manifest: CacheManifest, origin: Url, network: N, storage: S) -> CacheResult<Self> {
        manifest.validate()?;
        let shell_key = origin
            .join(manifest.shell.trim())
            .map_err(|err| CacheError::InvalidOrigin(format!("{origin}: {err}")))?
            .path()
            .to_string();
        Ok(Self {
            manifest,
            origin,
            shell_key,
            network,
            storage,
            state: LifecycleState::Parsed,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn generation(&self) -> &str {
        &self.manifest.generation
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Precaches every manifest asset into the current generation.
    ///
    /// An asset whose live fetch fails keeps the copy a previous install
    /// stored under the same generation, so a restart while offline resumes
    /// from storage. All-or-nothing: when an asset has neither a live nor a
    /// stored copy, the entries added by this attempt are removed (the whole
    /// generation if this attempt created it) and the controller becomes
    /// `Redundant`.
    pub fn install(&mut self) -> CacheResult<()> {
        self.expect_state(LifecycleState::Parsed)?;
        let generation_existed = self
            .storage
            .generations()?
            .iter()
            .any(|tag| *tag == self.manifest.generation);
        self.state = LifecycleState::Installing;
        info!(
            "event=cache_install module=offline status=start generation={} assets={}",
            self.manifest.generation,
            self.manifest.assets.len()
        );

        let mut added = Vec::new();
        match self.precache_all(&mut added) {
            Ok(()) => {
                self.state = LifecycleState::Installed;
                info!(
                    "event=cache_install module=offline status=ok generation={}",
                    self.manifest.generation
                );
                Ok(())
            }
            Err(err) => {
                self.state = LifecycleState::Redundant;
                if let Err(cleanup) = self.discard_attempt(generation_existed, &added) {
                    warn!(
                        "event=cache_install module=offline status=cleanup_failed generation={} error={}",
                        self.manifest.generation, cleanup
                    );
                }
                warn!(
                    "event=cache_install module=offline status=error generation={} error={}",
                    self.manifest.generation, err
                );
                Err(err)
            }
        }
    }

    /// Deletes every generation except the current one and starts serving.
    ///
    /// Returns the deleted generation tags.
    pub fn activate(&mut self) -> CacheResult<Vec<String>> {
        self.expect_state(LifecycleState::Installed)?;
        self.state = LifecycleState::Activating;

        let mut deleted = Vec::new();
        for tag in self.storage.generations()? {
            if tag != self.manifest.generation && self.storage.delete_generation(&tag)? {
                deleted.push(tag);
            }
        }

        self.state = LifecycleState::Active;
        info!(
            "event=cache_activate module=offline status=ok generation={} deleted_generations={}",
            self.manifest.generation,
            deleted.len()
        );
        Ok(deleted)
    }

    /// Intercepts one request.
    ///
    /// Requests are passed through untouched unless the controller is
    /// `Active` and the request is a same-origin `GET`.
    pub fn handle(&self, request: &AssetRequest) -> CacheResult<FetchOutcome> {
        if self.state != LifecycleState::Active
            || !request.is_get()
            || !self.is_same_origin(&request.url)
        {
            return Ok(FetchOutcome::Passthrough);
        }

        let key = self.cache_key(&request.url);
        if self.is_code_asset(request, &key) {
            self.network_first(request, &key)
        } else {
            self.cache_first(request, &key)
        }
    }

    fn precache_all(&self, added: &mut Vec<String>) -> CacheResult<()> {
        let generation = self.manifest.generation.as_str();
        self.storage.open_generation(generation)?;
        for asset in &self.manifest.assets {
            let url = self
                .origin
                .join(asset.trim())
                .map_err(|err| CacheError::InstallFailed {
                    asset: asset.clone(),
                    reason: err.to_string(),
                })?;
            let key = self.cache_key(&url);
            let stored = self.storage.get(generation, &key)?;

            let live = match self.network.fetch(&AssetRequest::get(url)) {
                Ok(response) if response.is_success() => Ok(response),
                Ok(response) => Err(format!("status {}", response.status)),
                Err(err) => Err(err.to_string()),
            };
            match (live, stored) {
                (Ok(response), stored) => {
                    self.storage.put(generation, &key, &response)?;
                    if stored.is_none() {
                        added.push(key);
                    }
                }
                (Err(reason), Some(_)) => {
                    debug!(
                        "event=cache_install module=offline status=reuse_stored key={} error={}",
                        key, reason
                    );
                }
                (Err(reason), None) => {
                    return Err(CacheError::InstallFailed {
                        asset: asset.clone(),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    fn discard_attempt(&self, generation_existed: bool, added: &[String]) -> CacheResult<()> {
        let generation = self.manifest.generation.as_str();
        if !generation_existed {
            self.storage.delete_generation(generation)?;
            return Ok(());
        }
        for key in added {
            self.storage.delete_entry(generation, key)?;
        }
        Ok(())
    }

    fn network_first(&self, request: &AssetRequest, key: &str) -> CacheResult<FetchOutcome> {
        let generation = self.manifest.generation.as_str();
        match self.network.fetch(request) {
            Ok(response) => {
                if response.is_success() {
                    self.store_copy(key, &response);
                }
                Ok(served(response, ServedFrom::Network))
            }
            Err(err) => {
                debug!(
                    "event=cache_fetch module=offline strategy=network_first status=fallback key={} error={}",
                    key, err
                );
                if let Some(cached) = self.storage.get(generation, key)? {
                    return Ok(served(cached, ServedFrom::Cache));
                }
                match self.storage.get(generation, &self.shell_key)? {
                    Some(shell) => Ok(served(shell, ServedFrom::OfflineShell)),
                    None => Ok(FetchOutcome::Failed(err)),
                }
            }
        }
    }

    fn cache_first(&self, request: &AssetRequest, key: &str) -> CacheResult<FetchOutcome> {
        if let Some(cached) = self.storage.get(&self.manifest.generation, key)? {
            return Ok(served(cached, ServedFrom::Cache));
        }
        match self.network.fetch(request) {
            Ok(response) => {
                if response.is_success() {
                    self.store_copy(key, &response);
                }
                Ok(served(response, ServedFrom::Network))
            }
            Err(err) => {
                debug!(
                    "event=cache_fetch module=offline strategy=cache_first status=failed key={} error={}",
                    key, err
                );
                Ok(FetchOutcome::Failed(err))
            }
        }
    }

    fn store_copy(&self, key: &str, response: &AssetResponse) {
        if let Err(err) = self.storage.put(&self.manifest.generation, key, response) {
            warn!(
                "event=cache_put module=offline status=error key={} error={}",
                key, err
            );
        }
    }

    fn expect_state(&self, expected: LifecycleState) -> CacheResult<()> {
        if self.state != expected {
            return Err(CacheError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    fn is_same_origin(&self, url: &Url) -> bool {
        let origin: Origin = url.origin();
        origin.is_tuple() && origin == self.origin.origin()
    }

    /// Query string and fragment are ignored; the scope root maps to the
    /// shell.
    fn cache_key(&self, url: &Url) -> String {
        let path = url.path();
        if path == self.origin.path() {
            self.shell_key.clone()
        } else {
            path.to_string()
        }
    }

    fn is_code_asset(&self, request: &AssetRequest, key: &str) -> bool {
        request.mode == RequestMode::Navigate
            || key == self.shell_key
            || CODE_ASSET_RE.is_match(key)
    }
}

fn served(response: AssetResponse, source: ServedFrom) -> FetchOutcome {
    FetchOutcome::Served { response, source }
}
