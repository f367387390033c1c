use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http error: {0}")]
    Http(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("timeout")]
    Timeout,
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid payload: {0}")]
    Payload(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("fetch cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Connection(err.to_string())
        } else if err.is_decode() {
            StoreError::Payload(err.to_string())
        } else {
            StoreError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Payload(err.to_string())
    }
}

/// Hierarchical key-value store addressed by slash separated paths.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Reads the whole subtree at `path`; `None` when nothing is stored there.
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError>;
    /// Merges the fields of `fields` into the object at `path`.
    async fn update(&self, path: &str, fields: Value) -> Result<(), StoreError>;
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: DeviceStore + ?Sized> DeviceStore for Arc<T> {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        (**self).read(path).await
    }

    async fn update(&self, path: &str, fields: Value) -> Result<(), StoreError> {
        (**self).update(path, fields).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Firebase Realtime Database over its REST interface.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseStore {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| StoreError::Http(format!("failed to build http client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        let path = normalize_path(path);
        if path.is_empty() {
            format!("{}/.json", self.base_url)
        } else {
            format!("{}/{}.json", self.base_url, path)
        }
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.query(&[("auth", token.as_str())]),
            None => req,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_else(|_| String::from("<no body>"));
            return Err(StoreError::Unauthorized(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::from("<no body>"));
            return Err(StoreError::Http(format!("status {status}: {body}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl DeviceStore for FirebaseStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.url(path);
        debug!(%url, "reading subtree");
        let response = self.with_auth(self.client.get(&url)).send().await?;
        let value: Value = Self::check(response).await?.json().await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn update(&self, path: &str, fields: Value) -> Result<(), StoreError> {
        let url = self.url(path);
        debug!(%url, "patching subtree");
        let response = self
            .with_auth(self.client.patch(&url))
            .json(&fields)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("firebase: {}", self.base_url)
    }
}

/// A JSON document on disk with the same tree shape as the remote store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Value, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Value::Null),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Value::Null),
            Err(err) => Err(StoreError::Io(format!(
                "failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let path = normalize_path(path);
    if path.is_empty() {
        return Some(root);
    }
    path.split('/').try_fold(root, |node, key| node.get(key))
}

fn lookup_or_create<'a>(root: &'a mut Value, path: &str) -> &'a mut Value {
    let path = normalize_path(path);
    let mut node = root;
    for key in path.split('/').filter(|k| !k.is_empty()) {
        if !node.is_object() {
            *node = Value::Object(serde_json::Map::new());
        }
        node = &mut node[key];
    }
    node
}

#[async_trait]
impl DeviceStore for FileStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let root = self.load().await?;
        Ok(lookup(&root, path).filter(|v| !v.is_null()).cloned())
    }

    async fn update(&self, path: &str, fields: Value) -> Result<(), StoreError> {
        let Value::Object(fields) = fields else {
            return Err(StoreError::Payload("update expects an object".to_string()));
        };

        let _guard = self.write_lock.lock().await;
        let mut root = self.load().await?;
        let target = lookup_or_create(&mut root, path);
        if !target.is_object() {
            *target = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = target {
            for (key, value) in fields {
                if value.is_null() {
                    map.remove(&key);
                } else {
                    map.insert(key, value);
                }
            }
        }

        let bytes = serde_json::to_vec_pretty(&root)?;
        tokio::fs::write(&self.path, bytes).await.map_err(|err| {
            StoreError::Io(format!("failed to write {}: {err}", self.path.display()))
        })
    }

    fn describe(&self) -> String {
        format!("file: {}", self.path.display())
    }
}

/// Cancels in-flight reads when the view that issued them goes away.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Cancellation {
    pub fn new() -> (CancelHandle, Cancellation) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Cancellation { rx })
    }

    /// A token nothing will ever cancel.
    pub fn never() -> Cancellation {
        let (_, rx) = watch::channel(false);
        Cancellation { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled. A sender dropped without cancelling never resolves.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|c| *c).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Reads `path`, giving up early when `cancel` fires.
pub async fn read_cancellable<S: DeviceStore + ?Sized>(
    store: &S,
    path: &str,
    cancel: &Cancellation,
) -> Result<Option<Value>, StoreError> {
    if cancel.is_cancelled() {
        return Err(StoreError::Cancelled);
    }
    let mut cancel = cancel.clone();
    tokio::select! {
        result = store.read(path) => result,
        _ = cancel.cancelled() => {
            debug!(path, "read cancelled");
            Err(StoreError::Cancelled)
        }
    }
}
