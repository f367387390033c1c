use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::device::DeviceSnapshot;
use crate::maintenance::MaintenanceCounts;

/// What one dashboard refresh produced. On a failed fetch `devices` still
/// holds the last good data and `freshness.stale` tells how old it is.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub ts: DateTime<Utc>,
    pub source: String,
    pub devices: DeviceSnapshot,
    pub summary: DashboardSummary,
    pub freshness: Freshness,
    pub status: FetchStatus,
    pub quality: FetchQuality,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub devices: usize,
    pub clogged: usize,
    pub maintenance: MaintenanceCounts,
}

impl DashboardSummary {
    pub fn of(devices: &DeviceSnapshot) -> Self {
        Self {
            devices: devices.len(),
            clogged: devices.clogged_count(),
            maintenance: devices.maintenance_counts(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Freshness {
    pub rtt_ms: u128,
    pub age_ms: u128,
    pub stale: bool,
    pub last_ok_ts: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchStatus {
    pub code: String,
    pub failures: Vec<String>,
}

impl FetchStatus {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchQuality {
    pub reads_ok: u64,
    pub reads_err: u64,
}
