use std::time::Duration;

pub const DEFAULT_COLLECTION_PATH: &str = "/GutterLocations";

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub collection_path: String,
    /// Path of a `{username, password}` record; the built-in pair is used when unset.
    pub credentials_path: Option<String>,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
    pub stale_after: Duration,
    pub inactivity_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            collection_path: DEFAULT_COLLECTION_PATH.to_string(),
            credentials_path: None,
            refresh_interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
            stale_after: Duration::from_secs(90),
            inactivity_timeout: Duration::from_secs(15 * 60),
        }
    }
}

impl DashboardConfig {
    pub fn device_path(&self, device_id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_path.trim_end_matches('/'),
            device_id.trim_matches('/')
        )
    }
}
