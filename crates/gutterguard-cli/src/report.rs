use std::fmt::Write as _;

use gutterguard_core::{timestamp, BucketedSeries, DashboardSummary, DeviceSnapshot};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub clog_status: String,
    pub maintenance_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub device_id: String,
    pub timestamp: String,
    pub name: String,
    pub clog_status: String,
    pub maintenance_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub clogged: bool,
    pub popup: Vec<String>,
}

pub fn device_rows(snapshot: &DeviceSnapshot) -> Vec<DeviceRow> {
    snapshot
        .devices
        .iter()
        .map(|d| DeviceRow {
            id: d.id.clone(),
            name: d.name.clone(),
            address: d.address.clone(),
            latitude: d.coordinates.map(|c| c.latitude),
            longitude: d.coordinates.map(|c| c.longitude),
            clog_status: d.clog_status().label().to_string(),
            maintenance_status: d.maintenance.label().to_string(),
        })
        .collect()
}

/// One row per event, devices in id order and events oldest first.
pub fn history_rows(snapshot: &DeviceSnapshot, device: Option<&str>) -> Vec<HistoryRow> {
    snapshot
        .devices
        .iter()
        .filter(|d| device.map_or(true, |id| d.id == id))
        .flat_map(|d| {
            d.history.events().iter().map(move |e| HistoryRow {
                device_id: d.id.clone(),
                timestamp: timestamp::display(&e.timestamp),
                name: d.name.clone(),
                clog_status: e.status.label().to_string(),
                maintenance_status: d.maintenance.label().to_string(),
            })
        })
        .collect()
}

/// Zero-based page of `rows`; an out of range page is empty.
pub fn page<T>(rows: &[T], page: usize, per_page: usize) -> &[T] {
    let per_page = per_page.max(1);
    let start = page.saturating_mul(per_page).min(rows.len());
    let end = start.saturating_add(per_page).min(rows.len());
    &rows[start..end]
}

pub fn markers(snapshot: &DeviceSnapshot) -> Vec<Marker> {
    snapshot
        .mappable()
        .map(|(d, c)| Marker {
            id: d.id.clone(),
            latitude: c.latitude,
            longitude: c.longitude,
            clogged: d.clog_status().is_clogged(),
            popup: d.popup_lines().to_vec(),
        })
        .collect()
}

fn clip(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

fn coord(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_else(|| "-".to_string())
}

pub fn device_table(rows: &[DeviceRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:<20} {:<26} {:>11} {:>11} {:<8} {}",
        "ID", "NAME", "ADDRESS", "LATITUDE", "LONGITUDE", "CLOG", "MAINTENANCE"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<14} {:<20} {:<26} {:>11} {:>11} {:<8} {}",
            clip(&row.id, 14),
            clip(&row.name, 20),
            clip(&row.address, 26),
            coord(row.latitude),
            coord(row.longitude),
            row.clog_status,
            row.maintenance_status
        );
    }
    out
}

pub fn history_table(rows: &[HistoryRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22} {:<20} {:<8} {}",
        "TIMESTAMP", "NAME", "CLOG", "MAINTENANCE"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<22} {:<20} {:<8} {}",
            row.timestamp,
            clip(&row.name, 20),
            row.clog_status,
            row.maintenance_status
        );
    }
    out
}

pub fn summary_text(summary: &DashboardSummary) -> String {
    let m = &summary.maintenance;
    format!(
        "{} devices with pending maintenance\n\
         {} devices with no maintenance requests\n\
         {} devices in progress of maintenance\n\
         {} gutters are currently clogged (of {})\n",
        m.pending, m.no_maintenance_required, m.in_progress, summary.clogged, summary.devices
    )
}

pub fn series_table(series: &BucketedSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", series.granularity.title(), series.granularity);
    let _ = writeln!(out, "{:<6} {:>8} {:>8}", "BUCKET", "CLOGGED", "CLEARED");
    for (idx, (clogged, cleared)) in series.clogged.iter().zip(&series.cleared).enumerate() {
        let _ = writeln!(
            out,
            "{:<6} {:>8} {:>8}",
            series.granularity.bucket_label(idx),
            clogged,
            cleared
        );
    }
    out
}
