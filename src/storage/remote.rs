//! HTTP remote cache.
//!
//! Artifacts live at
//! `{base}/api/projects/{project}/cache/{category}/{hash}/{name}` and travel
//! as zip archives. `GET` answers `404` for a miss. Requests carry a bearer
//! token when one is configured.
//!
//! Each item is fetched or uploaded in its own task on a `JoinSet`, with a
//! semaphore bounding how many run at once. Downloads are extracted into a
//! staging directory of the local cache and only published there once the
//! whole archive has been written, so an interrupted download leaves nothing
//! behind. Dropping the returned future aborts the outstanding tasks.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use super::archive;
use super::local::CacheLocalStorage;
use super::{CacheCategory, CacheStorableItem, CacheStoring, StorageFuture};
use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("graphsmith/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for a remote cache.
#[derive(Debug, Clone)]
pub struct RemoteCacheSettings {
    pub url: Url,
    pub project: String,
    pub token: Option<String>,
    /// Maximum number of requests in flight.
    pub concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct CacheRemoteStorage {
    client: Client,
    base_url: Url,
    project: String,
    token: Option<String>,
    local: CacheLocalStorage,
    concurrency: Arc<Semaphore>,
}

impl CacheRemoteStorage {
    /// `local` receives downloaded artifacts.
    pub fn new(settings: RemoteCacheSettings, local: CacheLocalStorage) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Network {
                url: settings.url.to_string(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        // Url::join replaces the last segment unless the base ends with '/'.
        let mut base_url = settings.url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            project: settings.project,
            token: settings.token,
            local,
            concurrency: Arc::new(Semaphore::new(settings.concurrency.max(1))),
        })
    }

    /// URL of one artifact.
    pub fn artifact_url(&self, item: &CacheStorableItem, category: CacheCategory) -> Result<Url> {
        let relative = format!(
            "api/projects/{}/cache/{}/{}/{}",
            self.project, category, item.hash, item.name
        );
        Ok(self.base_url.join(&relative)?)
    }

    fn request(&self) -> RequestContext {
        RequestContext {
            client: self.client.clone(),
            token: self.token.clone(),
            local: self.local.clone(),
        }
    }
}

/// What a per-item task needs, owned so the task can be `'static`.
#[derive(Clone)]
struct RequestContext {
    client: Client,
    token: Option<String>,
    local: CacheLocalStorage,
}

impl RequestContext {
    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn download(
        &self,
        url: Url,
        item: &CacheStorableItem,
        category: CacheCategory,
    ) -> Result<Option<PathBuf>> {
        let network_error = |message: String| Error::Network {
            url: url.to_string(),
            message,
        };

        let response = self
            .authorized(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| network_error(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(network_error(format!(
                "Unexpected status {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_error(e.to_string()))?;

        let local = self.local.clone();
        let item = item.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<PathBuf>> {
            let staged = local.staging_directory(category)?;
            archive::extract(&bytes, staged.path())?;
            local.publish(category, &item.hash, staged)?;
            Ok(local.lookup(&item, category))
        })
        .await
        .map_err(|e| Error::Storage {
            message: format!("Extraction task failed: {}", e),
        })?
    }

    async fn upload(&self, url: Url, paths: Vec<PathBuf>) -> Result<()> {
        let body = tokio::task::spawn_blocking(move || archive::archive(&paths))
            .await
            .map_err(|e| Error::Storage {
                message: format!("Archive task failed: {}", e),
            })??;

        let response = self
            .authorized(self.client.put(url.clone()))
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(Error::Network {
                url: url.to_string(),
                message: format!("Unexpected status {}", response.status()),
            });
        }
        Ok(())
    }
}

impl CacheStoring for CacheRemoteStorage {
    fn fetch<'a>(
        &'a self,
        items: &'a HashSet<CacheStorableItem>,
        category: CacheCategory,
    ) -> StorageFuture<'a, HashMap<CacheStorableItem, PathBuf>> {
        Box::pin(async move {
            let mut tasks = JoinSet::new();
            for item in items {
                let url = match self.artifact_url(item, category) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Skipping remote fetch of {}: {}", item, e);
                        continue;
                    }
                };
                let context = self.request();
                let semaphore = Arc::clone(&self.concurrency);
                let item = item.clone();
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let result = context.download(url, &item, category).await;
                    (item, result)
                });
            }

            let mut hits = HashMap::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((item, Ok(Some(path)))) => {
                        debug!("Remote cache hit for {}", item);
                        hits.insert(item, path);
                    }
                    Ok((item, Ok(None))) => debug!("Remote cache miss for {}", item),
                    Ok((item, Err(e))) => warn!("Failed to fetch {} from remote cache: {}", item, e),
                    Err(e) => warn!("Remote fetch task failed: {}", e),
                }
            }
            Ok(hits)
        })
    }

    fn store<'a>(
        &'a self,
        items: &'a HashMap<CacheStorableItem, Vec<PathBuf>>,
        category: CacheCategory,
    ) -> StorageFuture<'a, Vec<CacheStorableItem>> {
        Box::pin(async move {
            let mut tasks = JoinSet::new();
            for (item, paths) in items {
                let url = match self.artifact_url(item, category) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!("Skipping remote store of {}: {}", item, e);
                        continue;
                    }
                };
                let context = self.request();
                let semaphore = Arc::clone(&self.concurrency);
                let item = item.clone();
                let paths = paths.clone();
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let result = context.upload(url, paths).await;
                    (item, result)
                });
            }

            let mut stored = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((item, Ok(()))) => stored.push(item),
                    Ok((item, Err(e))) => warn!("Failed to upload {} to remote cache: {}", item, e),
                    Err(e) => warn!("Remote store task failed: {}", e),
                }
            }
            stored.sort();
            Ok(stored)
        })
    }
}
