use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStatus {
    Pending,
    #[serde(rename = "inprogress")]
    InProgress,
    #[default]
    #[serde(rename = "nomaintenancereq")]
    NoMaintenanceRequired,
}

impl MaintenanceStatus {
    pub const ALL: [MaintenanceStatus; 3] = [
        MaintenanceStatus::Pending,
        MaintenanceStatus::InProgress,
        MaintenanceStatus::NoMaintenanceRequired,
    ];

    /// Unknown or missing codes count as "no maintenance required".
    pub fn from_code(code: Option<&str>) -> Self {
        let Some(code) = code else {
            return MaintenanceStatus::default();
        };
        match code.trim().to_ascii_lowercase().as_str() {
            "pending" => MaintenanceStatus::Pending,
            "inprogress" => MaintenanceStatus::InProgress,
            "nomaintenancereq" => MaintenanceStatus::NoMaintenanceRequired,
            other => {
                debug!(code = other, "unknown maintenance code");
                MaintenanceStatus::default()
            }
        }
    }

    /// Code as stored in the device record.
    pub fn code(self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::InProgress => "inprogress",
            MaintenanceStatus::NoMaintenanceRequired => "nomaintenancereq",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaintenanceStatus::Pending => "Pending",
            MaintenanceStatus::InProgress => "In progress",
            MaintenanceStatus::NoMaintenanceRequired => "No maintenance required",
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceCounts {
    pub pending: u32,
    pub in_progress: u32,
    pub no_maintenance_required: u32,
}

impl MaintenanceCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = MaintenanceStatus>,
    {
        let mut counts = Self::default();
        for status in statuses {
            counts.record(status);
        }
        counts
    }

    pub fn record(&mut self, status: MaintenanceStatus) {
        match status {
            MaintenanceStatus::Pending => self.pending += 1,
            MaintenanceStatus::InProgress => self.in_progress += 1,
            MaintenanceStatus::NoMaintenanceRequired => self.no_maintenance_required += 1,
        }
    }

    pub fn get(&self, status: MaintenanceStatus) -> u32 {
        match status {
            MaintenanceStatus::Pending => self.pending,
            MaintenanceStatus::InProgress => self.in_progress,
            MaintenanceStatus::NoMaintenanceRequired => self.no_maintenance_required,
        }
    }

    pub fn total(&self) -> u32 {
        self.pending + self.in_progress + self.no_maintenance_required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_labels() {
        assert_eq!(MaintenanceStatus::from_code(Some("pending")).label(), "Pending");
        assert_eq!(MaintenanceStatus::from_code(Some("inprogress")).label(), "In progress");
        assert_eq!(
            MaintenanceStatus::from_code(Some("nomaintenancereq")).label(),
            "No maintenance required"
        );
        assert_eq!(
            MaintenanceStatus::from_code(Some("InProgress")),
            MaintenanceStatus::InProgress
        );
    }

    #[test]
    fn unknown_and_missing_codes_default() {
        assert_eq!(
            MaintenanceStatus::from_code(Some("broken")),
            MaintenanceStatus::NoMaintenanceRequired
        );
        assert_eq!(
            MaintenanceStatus::from_code(None),
            MaintenanceStatus::NoMaintenanceRequired
        );
    }

    #[test]
    fn tally_sums_to_device_count() {
        let codes = [Some("pending"), Some("inprogress"), None, Some("???"), Some("pending")];
        let counts = MaintenanceCounts::tally(codes.iter().map(|c| MaintenanceStatus::from_code(*c)));

        assert_eq!(counts.pending, 2);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.no_maintenance_required, 2);
        assert_eq!(counts.total() as usize, codes.len());
    }

    #[test]
    fn serializes_as_record_code() {
        for status in MaintenanceStatus::ALL {
            let json = serde_json::to_string(&status).expect("serialize");
            assert_eq!(json, format!("\"{}\"", status.code()));
            assert_eq!(MaintenanceStatus::from_code(Some(status.code())), status);
        }
    }
}
