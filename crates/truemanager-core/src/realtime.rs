// ── Realtime statistics ──
//
// Parses `reporting.realtime` collection events into a flat snapshot.
// The payload shape moved between middleware releases: CPU usage lives
// under `cpu.average` on older builds and `cpu.cpu` on newer ones, and
// memory is either a `physical_memory_*` pair or a `classes` breakdown.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use truemanager_api::CollectionEvent;

/// Collection name the middleware publishes live stats under.
pub const REALTIME_COLLECTION: &str = "reporting.realtime";

/// Receive/transmit rate for one network interface.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct InterfaceRate {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
}

/// One realtime sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RealtimeStats {
    /// Aggregate CPU usage, 0-100.
    pub cpu_usage: Option<f64>,
    pub memory_used: Option<u64>,
    pub memory_total: Option<u64>,
    pub interfaces: BTreeMap<String, InterfaceRate>,
}

impl RealtimeStats {
    pub fn from_event(event: &CollectionEvent) -> Option<Self> {
        if event.collection != REALTIME_COLLECTION {
            return None;
        }
        event.fields.as_ref().map(Self::from_fields)
    }

    pub fn from_fields(fields: &Value) -> Self {
        let (memory_used, memory_total) = parse_memory(&fields["memory"]);
        Self {
            cpu_usage: parse_cpu(&fields["cpu"]),
            memory_used,
            memory_total,
            interfaces: parse_interfaces(&fields["interfaces"]),
        }
    }

    /// Used share of memory, 0-100.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn memory_percent(&self) -> Option<f64> {
        match (self.memory_used, self.memory_total) {
            (Some(used), Some(total)) if total > 0 => Some(used as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

fn parse_cpu(cpu: &Value) -> Option<f64> {
    ["average", "cpu"]
        .iter()
        .find_map(|key| cpu[*key]["usage"].as_f64())
}

fn parse_memory(memory: &Value) -> (Option<u64>, Option<u64>) {
    let total = memory["physical_memory_total"].as_u64();
    if let (Some(total), Some(available)) = (total, memory["physical_memory_available"].as_u64()) {
        return (Some(total.saturating_sub(available)), Some(total));
    }

    // Older builds: a breakdown by class; everything but `unused` is in use.
    if let Some(classes) = memory["classes"].as_object() {
        let used: u64 = classes
            .iter()
            .filter(|(name, _)| name.as_str() != "unused")
            .filter_map(|(_, v)| v.as_u64())
            .sum();
        let unused = classes.get("unused").and_then(Value::as_u64).unwrap_or(0);
        return (Some(used), Some(used + unused));
    }

    (None, total)
}

fn parse_interfaces(interfaces: &Value) -> BTreeMap<String, InterfaceRate> {
    let Some(map) = interfaces.as_object() else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(name, stats)| {
            let rate = InterfaceRate {
                rx_bytes_per_sec: stats["received_bytes_rate"].as_f64().unwrap_or_default(),
                tx_bytes_per_sec: stats["sent_bytes_rate"].as_f64().unwrap_or_default(),
            };
            (name.clone(), rate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use truemanager_api::ChangeKind;

    use super::*;

    #[test]
    fn parses_current_layout() {
        let stats = RealtimeStats::from_fields(&json!({
            "cpu": { "cpu": { "usage": 12.5, "temp": 41 }, "cpu0": { "usage": 20.0 } },
            "memory": {
                "physical_memory_total": 1000,
                "physical_memory_available": 250,
                "arc_size": 300
            },
            "interfaces": {
                "eno1": { "received_bytes_rate": 1024.0, "sent_bytes_rate": 512.0, "link_state": "LINK_STATE_UP" }
            }
        }));

        assert_eq!(stats.cpu_usage, Some(12.5));
        assert_eq!(stats.memory_used, Some(750));
        assert_eq!(stats.memory_total, Some(1000));
        assert_eq!(
            stats.interfaces["eno1"],
            InterfaceRate {
                rx_bytes_per_sec: 1024.0,
                tx_bytes_per_sec: 512.0
            }
        );
        assert_eq!(stats.memory_percent(), Some(75.0));
    }

    #[test]
    fn parses_class_breakdown() {
        let stats = RealtimeStats::from_fields(&json!({
            "cpu": { "average": { "usage": 3.0 } },
            "memory": { "classes": { "apps": 100, "arc": 200, "cache": 50, "unused": 650 } }
        }));
        assert_eq!(stats.cpu_usage, Some(3.0));
        assert_eq!(stats.memory_used, Some(350));
        assert_eq!(stats.memory_total, Some(1000));
        assert!(stats.interfaces.is_empty());
    }

    #[test]
    fn ignores_other_collections() {
        let event = CollectionEvent {
            kind: ChangeKind::Added,
            collection: "alert.list".into(),
            id: None,
            fields: Some(json!({})),
        };
        assert!(RealtimeStats::from_event(&event).is_none());
    }

    #[test]
    fn empty_payload_yields_empty_sample() {
        assert_eq!(RealtimeStats::from_fields(&json!({})), RealtimeStats::default());
    }
}
