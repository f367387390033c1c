use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClogStatus {
    Clogged,
    #[default]
    Cleared,
}

impl ClogStatus {
    pub fn label(self) -> &'static str {
        match self {
            ClogStatus::Clogged => "Clogged",
            ClogStatus::Cleared => "Cleared",
        }
    }

    pub fn is_clogged(self) -> bool {
        self == ClogStatus::Clogged
    }

    /// Loose coercion of whatever the sensor wrote under a timestamp key.
    pub fn from_raw(value: &serde_json::Value) -> Self {
        use serde_json::Value;

        let clogged = match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Value::String(s) => match s.trim() {
                "1" => true,
                "0" => false,
                label => Self::from_label(label).is_clogged(),
            },
            _ => false,
        };
        if clogged {
            ClogStatus::Clogged
        } else {
            ClogStatus::Cleared
        }
    }

    /// Labels are matched case-insensitively; anything unrecognised is `Cleared`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "clogged" | "true" => ClogStatus::Clogged,
            "cleared" | "unclogged" | "clear" | "false" => ClogStatus::Cleared,
            other => {
                debug!(label = other, "unrecognised clog label, treating as cleared");
                ClogStatus::Cleared
            }
        }
    }
}

impl fmt::Display for ClogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClogEvent {
    pub timestamp: String,
    pub status: ClogStatus,
}

/// Entry of the pre-built `clogHistory` list some devices carry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHistoryEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: serde_json::Value,
}

/// The two shapes clog readings arrive in.
#[derive(Debug, Clone)]
pub enum RawClogRepresentation {
    /// `isClogged`: timestamp key to raw reading, keys unique per device.
    EventMap(BTreeMap<String, serde_json::Value>),
    /// `clogHistory`: already a list of `{timestamp, status}`.
    EventList(Vec<RawHistoryEntry>),
}

impl Default for RawClogRepresentation {
    fn default() -> Self {
        RawClogRepresentation::EventMap(BTreeMap::new())
    }
}

impl RawClogRepresentation {
    /// `isClogged` wins whenever it is present, even when empty.
    pub fn from_record(
        is_clogged: Option<BTreeMap<String, serde_json::Value>>,
        clog_history: Option<Vec<RawHistoryEntry>>,
    ) -> Self {
        match (is_clogged, clog_history) {
            (Some(map), _) => RawClogRepresentation::EventMap(map),
            (None, Some(list)) => RawClogRepresentation::EventList(list),
            (None, None) => RawClogRepresentation::default(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawClogRepresentation::EventMap(map) => map.len(),
            RawClogRepresentation::EventList(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Events of one device in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClogHistory {
    events: Vec<ClogEvent>,
}

impl ClogHistory {
    pub fn events(&self) -> &[ClogEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn current(&self) -> ClogStatus {
        self.events.last().map(|e| e.status).unwrap_or_default()
    }

    pub fn latest(&self) -> Option<&ClogEvent> {
        self.events.last()
    }
}

pub fn normalize(raw: RawClogRepresentation) -> ClogHistory {
    let mut events: Vec<ClogEvent> = match raw {
        RawClogRepresentation::EventMap(map) => map
            .into_iter()
            .map(|(timestamp, value)| ClogEvent {
                status: ClogStatus::from_raw(&value),
                timestamp,
            })
            .collect(),
        RawClogRepresentation::EventList(list) => list
            .into_iter()
            .map(|entry| ClogEvent {
                timestamp: entry.timestamp.unwrap_or_default(),
                status: match &entry.status {
                    serde_json::Value::String(label) => ClogStatus::from_label(label),
                    other => ClogStatus::from_raw(other),
                },
            })
            .collect(),
    };

    // Stable: undecodable timestamps go first and keep their relative order.
    events.sort_by_cached_key(|e| timestamp::decode(&e.timestamp));

    ClogHistory { events }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event_map(pairs: &[(&str, serde_json::Value)]) -> RawClogRepresentation {
        RawClogRepresentation::EventMap(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn map_form_yields_ordered_events_and_latest_status() {
        let history = normalize(event_map(&[
            ("01152024_143000", json!(true)),
            ("01152024_150000", json!(false)),
        ]));

        assert_eq!(
            history.events(),
            &[
                ClogEvent {
                    timestamp: "01152024_143000".into(),
                    status: ClogStatus::Clogged
                },
                ClogEvent {
                    timestamp: "01152024_150000".into(),
                    status: ClogStatus::Cleared
                },
            ]
        );
        assert_eq!(history.current(), ClogStatus::Cleared);
    }

    #[test]
    fn empty_representation_is_cleared() {
        let history = normalize(RawClogRepresentation::from_record(None, None));
        assert!(history.is_empty());
        assert_eq!(history.current(), ClogStatus::Cleared);

        let history = normalize(RawClogRepresentation::EventList(Vec::new()));
        assert_eq!(history.current(), ClogStatus::Cleared);
    }

    #[test]
    fn order_follows_decoded_time_not_key_order() {
        // Lexically "01..." < "12..." but December 2023 precedes January 2024.
        let history = normalize(event_map(&[
            ("01012024_080000", json!(false)),
            ("12312023_230000", json!(true)),
        ]));

        assert_eq!(history.events()[0].timestamp, "12312023_230000");
        assert_eq!(history.current(), ClogStatus::Cleared);

        let history = normalize(RawClogRepresentation::EventList(vec![
            RawHistoryEntry {
                timestamp: Some("01012024_080000".into()),
                status: json!("Clogged"),
            },
            RawHistoryEntry {
                timestamp: Some("12312023_230000".into()),
                status: json!("Cleared"),
            },
        ]));
        assert_eq!(history.current(), ClogStatus::Clogged);
    }

    #[test]
    fn current_is_always_last_element() {
        let history = normalize(event_map(&[
            ("03012024_100000", json!(true)),
            ("03012024_090000", json!(false)),
            ("bogus", json!(false)),
        ]));
        assert_eq!(
            history.current(),
            history.events().last().map(|e| e.status).unwrap_or_default()
        );
        assert_eq!(history.current(), ClogStatus::Clogged);
    }

    #[test]
    fn malformed_timestamps_are_kept_and_sorted_first() {
        let history = normalize(RawClogRepresentation::EventList(vec![
            RawHistoryEntry {
                timestamp: Some("02012024_100000".into()),
                status: json!(true),
            },
            RawHistoryEntry {
                timestamp: None,
                status: json!(false),
            },
            RawHistoryEntry {
                timestamp: Some("garbage".into()),
                status: json!("unclogged"),
            },
        ]));

        assert_eq!(history.len(), 3);
        assert_eq!(history.events()[0].timestamp, "");
        assert_eq!(history.events()[1].timestamp, "garbage");
        assert_eq!(history.current(), ClogStatus::Clogged);
    }

    #[test]
    fn list_labels_pass_through() {
        let history = normalize(RawClogRepresentation::EventList(vec![
            RawHistoryEntry {
                timestamp: Some("02012024_100000".into()),
                status: json!("CLOGGED"),
            },
            RawHistoryEntry {
                timestamp: Some("02012024_110000".into()),
                status: json!("Unclogged"),
            },
        ]));
        let statuses: Vec<_> = history.events().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![ClogStatus::Clogged, ClogStatus::Cleared]);
    }

    #[test]
    fn raw_values_are_coerced_loosely() {
        assert_eq!(ClogStatus::from_raw(&json!(1)), ClogStatus::Clogged);
        assert_eq!(ClogStatus::from_raw(&json!(0)), ClogStatus::Cleared);
        assert_eq!(ClogStatus::from_raw(&json!("true")), ClogStatus::Clogged);
        assert_eq!(ClogStatus::from_raw(&json!(null)), ClogStatus::Cleared);
        assert_eq!(ClogStatus::from_raw(&json!({"nested": true})), ClogStatus::Cleared);
    }

    #[test]
    fn numeric_strings_coerce_directly() {
        assert_eq!(ClogStatus::from_raw(&json!("1")), ClogStatus::Clogged);
        assert_eq!(ClogStatus::from_raw(&json!(" 1 ")), ClogStatus::Clogged);
        assert_eq!(ClogStatus::from_raw(&json!("0")), ClogStatus::Cleared);
        assert_eq!(ClogStatus::from_raw(&json!("Clogged")), ClogStatus::Clogged);
    }

    #[test]
    fn event_map_takes_precedence_over_list() {
        let raw = RawClogRepresentation::from_record(
            Some(BTreeMap::new()),
            Some(vec![RawHistoryEntry {
                timestamp: Some("02012024_100000".into()),
                status: json!(true),
            }]),
        );
        assert!(matches!(raw, RawClogRepresentation::EventMap(_)));
        assert!(raw.is_empty());
    }
}
