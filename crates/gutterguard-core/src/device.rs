use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::history::{normalize, ClogHistory, ClogStatus, RawClogRepresentation, RawHistoryEntry};
use crate::maintenance::{MaintenanceCounts, MaintenanceStatus};

pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: 14.577694,
    longitude: 120.9856868,
};

/// One device record exactly as the store keeps it under its id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDevice {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: serde_json::Value,
    #[serde(default)]
    pub longitude: serde_json::Value,
    #[serde(default, deserialize_with = "lenient_string")]
    pub maintenance_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_event_map")]
    pub is_clogged: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, deserialize_with = "lenient_event_list")]
    pub clog_history: Option<Vec<RawHistoryEntry>>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// `isClogged` must be an object; any other shape is dropped on its own.
fn lenient_event_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, serde_json::Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Object(map) => Some(map.into_iter().collect()),
        serde_json::Value::Null => None,
        other => {
            debug!(kind = %json_kind(&other), "ignoring isClogged that is not an object");
            None
        }
    })
}

/// `clogHistory` as a list, or as the index-keyed object the database turns
/// sparse arrays into. Entries that are not objects are dropped.
fn lenient_event_list<'de, D>(deserializer: D) -> Result<Option<Vec<RawHistoryEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let entries: Vec<serde_json::Value> = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        serde_json::Value::Null => return Ok(None),
        other => {
            debug!(kind = %json_kind(&other), "ignoring clogHistory that is not a list");
            return Ok(None);
        }
    };
    Ok(Some(entries.iter().filter_map(history_entry).collect()))
}

fn history_entry(value: &serde_json::Value) -> Option<RawHistoryEntry> {
    let entry = value.as_object()?;
    let timestamp = match entry.get("timestamp") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Some(RawHistoryEntry {
        timestamp,
        status: entry.get("status").cloned().unwrap_or_default(),
    })
}

/// Accepts JSON numbers and numeric strings, like the sensors' mixed uploads.
fn coordinate(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinates: Option<Coordinates>,
    pub maintenance: MaintenanceStatus,
    pub history: ClogHistory,
}

impl Device {
    pub fn from_raw(id: impl Into<String>, raw: RawDevice) -> Self {
        let id = id.into();
        let coordinates = match (coordinate(&raw.latitude), coordinate(&raw.longitude)) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => {
                debug!(device = %id, "device has no usable coordinates");
                None
            }
        };

        Self {
            name: raw.name.unwrap_or_default(),
            address: raw.address.unwrap_or_default(),
            coordinates,
            maintenance: MaintenanceStatus::from_code(raw.maintenance_status.as_deref()),
            history: normalize(RawClogRepresentation::from_record(raw.is_clogged, raw.clog_history)),
            id,
        }
    }

    pub fn clog_status(&self) -> ClogStatus {
        self.history.current()
    }

    /// Popup text shown for the device's map marker.
    pub fn popup_lines(&self) -> [String; 4] {
        [
            self.name.clone(),
            format!("Address: {}", self.address),
            format!("Clog Status: {}", self.clog_status()),
            format!("Maintenance Status: {}", self.maintenance),
        ]
    }
}

/// Every device of one fetch, ordered by id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceSnapshot {
    pub fetched_at: Option<DateTime<Utc>>,
    pub devices: Vec<Device>,
}

impl DeviceSnapshot {
    /// Builds the snapshot from the collection subtree. Records that are not
    /// objects at all are skipped; partial records are kept with defaults.
    pub fn from_tree(tree: Option<&serde_json::Value>, fetched_at: DateTime<Utc>) -> Self {
        let mut devices = Vec::new();

        match tree {
            Some(serde_json::Value::Object(entries)) => {
                for (id, value) in entries {
                    if !value.is_object() {
                        warn!(device = %id, "skipping non-object device record");
                        continue;
                    }
                    let raw = match RawDevice::deserialize(value) {
                        Ok(raw) => raw,
                        Err(err) => {
                            warn!(device = %id, error = %err, "malformed device record, using defaults");
                            RawDevice::default()
                        }
                    };
                    devices.push(Device::from_raw(id.clone(), raw));
                }
            }
            Some(serde_json::Value::Null) | None => {}
            Some(other) => warn!(kind = %json_kind(other), "device collection is not an object"),
        }

        devices.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            fetched_at: Some(fetched_at),
            devices,
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Devices that can be placed on the map.
    pub fn mappable(&self) -> impl Iterator<Item = (&Device, Coordinates)> {
        self.devices
            .iter()
            .filter_map(|d| d.coordinates.map(|c| (d, c)))
    }

    /// First mappable device, or the deployment's default center.
    pub fn map_center(&self) -> Coordinates {
        self.mappable().next().map(|(_, c)| c).unwrap_or(DEFAULT_CENTER)
    }

    pub fn maintenance_counts(&self) -> MaintenanceCounts {
        MaintenanceCounts::tally(self.devices.iter().map(|d| d.maintenance))
    }

    pub fn clogged_count(&self) -> usize {
        self.devices
            .iter()
            .filter(|d| d.clog_status().is_clogged())
            .count()
    }

    pub fn histories(&self) -> impl Iterator<Item = &ClogHistory> {
        self.devices.iter().map(|d| &d.history)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn fetched() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn builds_devices_from_collection_tree() {
        let tree = json!({
            "dev1": {
                "name": "Taft Gutter",
                "address": "Taft Ave, Manila",
                "latitude": "14.5798",
                "longitude": 120.9856,
                "maintenanceStatus": "pending",
                "isClogged": {"01152024_143000": true, "01152024_150000": false}
            }
        });

        let snapshot = DeviceSnapshot::from_tree(Some(&tree), fetched());
        let dev = snapshot.get("dev1").expect("dev1 present");

        assert_eq!(dev.name, "Taft Gutter");
        assert_eq!(dev.maintenance, MaintenanceStatus::Pending);
        assert_eq!(dev.history.len(), 2);
        assert_eq!(dev.clog_status(), ClogStatus::Cleared);
        assert_eq!(
            dev.coordinates,
            Some(Coordinates {
                latitude: 14.5798,
                longitude: 120.9856
            })
        );
    }

    #[test]
    fn partial_records_are_kept_with_defaults() {
        let tree = json!({
            "bare": {},
            "odd": {"name": 42, "latitude": "north", "longitude": 1.0, "maintenanceStatus": "??"},
            "scalar": 17
        });

        let snapshot = DeviceSnapshot::from_tree(Some(&tree), fetched());

        assert_eq!(snapshot.len(), 2);
        let bare = snapshot.get("bare").expect("bare kept");
        assert_eq!(bare.name, "");
        assert_eq!(bare.clog_status(), ClogStatus::Cleared);
        assert!(bare.history.is_empty());

        let odd = snapshot.get("odd").expect("odd kept");
        assert_eq!(odd.name, "42");
        assert_eq!(odd.coordinates, None);
        assert_eq!(odd.maintenance, MaintenanceStatus::NoMaintenanceRequired);
    }

    #[test]
    fn map_excludes_devices_without_numeric_coordinates() {
        let tree = json!({
            "a": {"latitude": "x", "longitude": "y"},
            "b": {"latitude": 14.6, "longitude": 121.0},
        });
        let snapshot = DeviceSnapshot::from_tree(Some(&tree), fetched());

        let ids: Vec<_> = snapshot.mappable().map(|(d, _)| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(snapshot.map_center().latitude, 14.6);
    }

    #[test]
    fn empty_tree_centers_on_default() {
        let snapshot = DeviceSnapshot::from_tree(None, fetched());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.map_center(), DEFAULT_CENTER);
        assert_eq!(snapshot.maintenance_counts().total(), 0);
    }

    #[test]
    fn list_history_is_used_without_map() {
        let tree = json!({
            "dev": {"clogHistory": [
                {"timestamp": "02012024_100000", "status": false},
                {"timestamp": "02012024_110000", "status": true}
            ]}
        });
        let snapshot = DeviceSnapshot::from_tree(Some(&tree), fetched());
        assert_eq!(snapshot.clogged_count(), 1);
    }

    #[test]
    fn mistyped_history_fields_keep_the_rest_of_the_record() {
        let tree = json!({
            "dev1": {
                "name": "Taft Gutter",
                "maintenanceStatus": "pending",
                "clogHistory": [{"timestamp": 1705329000, "status": true}, "junk"]
            },
            "dev2": {
                "name": "Quiapo",
                "latitude": 14.598,
                "longitude": 120.984,
                "maintenanceStatus": "inprogress",
                "isClogged": "true"
            },
            "dev3": {
                "name": "Sampaloc",
                "clogHistory": {
                    "0": {"timestamp": "02012024_100000", "status": "Cleared"},
                    "1": {"timestamp": "02012024_110000", "status": "Clogged"}
                }
            }
        });

        let snapshot = DeviceSnapshot::from_tree(Some(&tree), fetched());

        let dev1 = snapshot.get("dev1").expect("dev1 kept");
        assert_eq!(dev1.name, "Taft Gutter");
        assert_eq!(dev1.maintenance, MaintenanceStatus::Pending);
        assert_eq!(dev1.history.len(), 1);
        assert_eq!(dev1.history.events()[0].timestamp, "1705329000");
        assert_eq!(dev1.clog_status(), ClogStatus::Clogged);

        let dev2 = snapshot.get("dev2").expect("dev2 kept");
        assert_eq!(dev2.name, "Quiapo");
        assert_eq!(dev2.maintenance, MaintenanceStatus::InProgress);
        assert!(dev2.coordinates.is_some());
        assert!(dev2.history.is_empty());

        let dev3 = snapshot.get("dev3").expect("dev3 kept");
        assert_eq!(dev3.history.len(), 2);
        assert_eq!(dev3.clog_status(), ClogStatus::Clogged);
    }

    #[test]
    fn counts_cover_every_device() {
        let tree = json!({
            "a": {"maintenanceStatus": "pending"},
            "b": {"maintenanceStatus": "inprogress"},
            "c": {},
            "d": {"maintenanceStatus": "NOMAINTENANCEREQ"}
        });
        let snapshot = DeviceSnapshot::from_tree(Some(&tree), fetched());
        let counts = snapshot.maintenance_counts();

        assert_eq!(counts.total() as usize, snapshot.len());
        assert_eq!(counts.no_maintenance_required, 2);
    }
}
