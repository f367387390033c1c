use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::json;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::device::{Coordinates, DeviceSnapshot};
use crate::maintenance::MaintenanceStatus;
use crate::snapshot::{DashboardSnapshot, DashboardSummary, FetchQuality, FetchStatus, Freshness};
use crate::store::{read_cancellable, Cancellation, DeviceStore, StoreError};

/// Fields of a device registered from the dashboard.
#[derive(Debug, Clone)]
pub struct NewDevice {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
}

/// Fetches the device collection on demand and keeps the last good copy so
/// a failed refresh degrades to stale data instead of an empty view.
pub struct DashboardMonitor<S: DeviceStore> {
    store: S,
    config: DashboardConfig,
    last_good: Option<DeviceSnapshot>,
    last_ok_instant: Option<Instant>,
    reads_ok: u64,
    reads_err: u64,
}

impl<S: DeviceStore> DashboardMonitor<S> {
    pub fn new(store: S, config: DashboardConfig) -> Self {
        Self {
            store,
            config,
            last_good: None,
            last_ok_instant: None,
            reads_ok: 0,
            reads_err: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn refresh_interval(&self) -> Duration {
        self.config.refresh_interval
    }

    /// One read of the whole collection, without touching the cached copy.
    pub async fn fetch_devices(&self, cancel: &Cancellation) -> Result<DeviceSnapshot, StoreError> {
        let read = read_cancellable(&self.store, &self.config.collection_path, cancel);
        let tree = timeout(self.config.fetch_timeout, read)
            .await
            .map_err(|_| StoreError::Timeout)??;
        Ok(DeviceSnapshot::from_tree(tree.as_ref(), Utc::now()))
    }

    pub async fn tick(&mut self, cancel: &Cancellation) -> DashboardSnapshot {
        let started = Instant::now();
        match self.fetch_devices(cancel).await {
            Ok(devices) => {
                self.reads_ok += 1;
                self.last_ok_instant = Some(Instant::now());
                let code = if devices.is_empty() { "EMPTY" } else { "OK" };
                if devices.is_empty() {
                    info!(path = %self.config.collection_path, "no devices stored");
                }
                self.last_good = Some(devices.clone());
                self.build_snapshot(devices, code, Vec::new(), started.elapsed())
            }
            Err(err) => {
                self.reads_err += 1;
                warn!(error = %err, source = %self.store.describe(), "device fetch failed");
                let devices = self.last_good.clone().unwrap_or_default();
                let code = if self.last_good.is_some() { "STALE" } else { "ERROR" };
                self.build_snapshot(devices, code, vec![err.to_string()], started.elapsed())
            }
        }
    }

    fn build_snapshot(
        &self,
        devices: DeviceSnapshot,
        code: &str,
        failures: Vec<String>,
        rtt: Duration,
    ) -> DashboardSnapshot {
        let age_ms = self
            .last_ok_instant
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(self.config.stale_after.as_millis());
        let stale = !failures.is_empty() || age_ms > self.config.stale_after.as_millis();

        DashboardSnapshot {
            ts: Utc::now(),
            source: self.store.describe(),
            summary: DashboardSummary::of(&devices),
            freshness: Freshness {
                rtt_ms: rtt.as_millis(),
                age_ms,
                stale,
                last_ok_ts: self.last_good.as_ref().and_then(|d| d.fetched_at),
            },
            devices,
            status: FetchStatus {
                code: code.to_string(),
                failures,
            },
            quality: FetchQuality {
                reads_ok: self.reads_ok,
                reads_err: self.reads_err,
            },
        }
    }

    /// Read-modify-write of one device's maintenance code. Concurrent edits
    /// are last-writer-wins.
    pub async fn set_maintenance(
        &self,
        device_id: &str,
        status: MaintenanceStatus,
    ) -> Result<(), StoreError> {
        let path = self.config.device_path(device_id);
        if self.store.read(&path).await?.is_none() {
            return Err(StoreError::NotFound(path));
        }
        self.store
            .update(&path, json!({ "maintenanceStatus": status.code() }))
            .await?;
        info!(device = device_id, status = status.code(), "maintenance status updated");
        Ok(())
    }

    /// Adds a device with no clog readings and no pending maintenance.
    pub async fn register_device(&self, device: &NewDevice) -> Result<(), StoreError> {
        if device.id.trim().is_empty() || device.id.contains('/') {
            return Err(StoreError::Payload(format!("invalid device id {:?}", device.id)));
        }
        let path = self.config.device_path(&device.id);
        if self.store.read(&path).await?.is_some() {
            return Err(StoreError::Payload(format!("device {} already exists", device.id)));
        }

        let mut record = json!({
            "name": device.name,
            "address": device.address,
            "maintenanceStatus": MaintenanceStatus::NoMaintenanceRequired.code(),
        });
        if let Some(c) = device.coordinates {
            record["latitude"] = json!(c.latitude);
            record["longitude"] = json!(c.longitude);
        }
        self.store.update(&path, record).await?;
        info!(device = %device.id, "device registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::history::ClogStatus;
    use crate::store::FileStore;

    fn seeded(dir: &Path) -> FileStore {
        let path = dir.join("db.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&json!({
                "GutterLocations": {
                    "dev1": {
                        "name": "Taft",
                        "address": "Taft Ave",
                        "latitude": 14.57,
                        "longitude": 120.98,
                        "maintenanceStatus": "pending",
                        "isClogged": {"01152024_143000": true, "01152024_150000": false}
                    },
                    "dev2": {
                        "name": "Quiapo",
                        "maintenanceStatus": "inprogress",
                        "isClogged": {"01152024_160000": true}
                    }
                }
            }))
            .expect("serialize"),
        )
        .expect("write");
        FileStore::new(path)
    }

    struct FailingStore;

    #[async_trait]
    impl DeviceStore for FailingStore {
        async fn read(&self, _path: &str) -> Result<Option<Value>, StoreError> {
            Err(StoreError::Connection("refused".to_string()))
        }

        async fn update(&self, _path: &str, _fields: Value) -> Result<(), StoreError> {
            Err(StoreError::Connection("refused".to_string()))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    #[tokio::test]
    async fn tick_summarises_collection() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut monitor = DashboardMonitor::new(seeded(dir.path()), DashboardConfig::default());

        let snapshot = monitor.tick(&Cancellation::never()).await;

        assert_eq!(snapshot.status.code, "OK");
        assert!(!snapshot.freshness.stale);
        assert_eq!(snapshot.summary.devices, 2);
        assert_eq!(snapshot.summary.clogged, 1);
        assert_eq!(snapshot.summary.maintenance.pending, 1);
        assert_eq!(snapshot.summary.maintenance.in_progress, 1);
        assert_eq!(
            snapshot.devices.get("dev1").map(|d| d.clog_status()),
            Some(ClogStatus::Cleared)
        );
    }

    #[tokio::test]
    async fn failed_fetch_without_history_is_an_empty_error() {
        let mut monitor = DashboardMonitor::new(FailingStore, DashboardConfig::default());

        let snapshot = monitor.tick(&Cancellation::never()).await;

        assert_eq!(snapshot.status.code, "ERROR");
        assert!(snapshot.devices.is_empty());
        assert!(snapshot.freshness.stale);
        assert_eq!(snapshot.quality.reads_err, 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_good_devices() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = seeded(dir.path());
        let db = store.path().to_path_buf();
        let mut monitor = DashboardMonitor::new(store, DashboardConfig::default());
        monitor.tick(&Cancellation::never()).await;

        std::fs::write(&db, "{ not json").expect("corrupt");
        let snapshot = monitor.tick(&Cancellation::never()).await;

        assert_eq!(snapshot.status.code, "STALE");
        assert!(snapshot.freshness.stale);
        assert_eq!(snapshot.devices.len(), 2);
        assert_eq!(snapshot.quality.reads_ok, 1);
    }

    #[tokio::test]
    async fn cancelled_tick_reports_cancellation() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut monitor = DashboardMonitor::new(seeded(dir.path()), DashboardConfig::default());
        let (handle, cancel) = Cancellation::new();
        handle.cancel();

        let snapshot = monitor.tick(&cancel).await;
        assert_eq!(snapshot.status.failures, vec![StoreError::Cancelled.to_string()]);
    }

    #[tokio::test]
    async fn maintenance_edit_rewrites_code() {
        let dir = tempfile::tempdir().expect("temp dir");
        let monitor = DashboardMonitor::new(seeded(dir.path()), DashboardConfig::default());

        monitor
            .set_maintenance("dev2", MaintenanceStatus::NoMaintenanceRequired)
            .await
            .expect("update");
        let devices = monitor.fetch_devices(&Cancellation::never()).await.expect("fetch");

        assert_eq!(devices.maintenance_counts().no_maintenance_required, 1);
        assert!(matches!(
            monitor.set_maintenance("ghost", MaintenanceStatus::Pending).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn registered_device_starts_cleared() {
        let dir = tempfile::tempdir().expect("temp dir");
        let monitor = DashboardMonitor::new(seeded(dir.path()), DashboardConfig::default());
        let new = NewDevice {
            id: "dev3".to_string(),
            name: "Ermita".to_string(),
            address: "Padre Faura St".to_string(),
            coordinates: Some(Coordinates {
                latitude: 14.58,
                longitude: 120.99,
            }),
        };

        monitor.register_device(&new).await.expect("register");
        assert!(monitor.register_device(&new).await.is_err());

        let devices = monitor.fetch_devices(&Cancellation::never()).await.expect("fetch");
        let dev = devices.get("dev3").expect("registered");
        assert_eq!(dev.clog_status(), ClogStatus::Cleared);
        assert!(dev.history.is_empty());
        assert_eq!(dev.maintenance, MaintenanceStatus::NoMaintenanceRequired);
        assert_eq!(devices.mappable().count(), 2);
    }
}
