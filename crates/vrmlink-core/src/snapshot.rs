// Flattening of raw diagnostics into per-device snapshots.
//
// The normalization rule is wire format: existing subscribers key off
// `<lowercased, space->underscore>` device and field names, so nothing
// beyond that one substitution may be applied.

use std::collections::BTreeMap;

use serde_json::Value;

use vrmlink_api::models::DiagnosticRecord;

/// Flattened per-poll view of one device: normalized field name → latest
/// raw value. Rebuilt from scratch every cycle; no history is kept.
pub type DeviceSnapshot = BTreeMap<String, Value>;

/// Normalize a device label or field description for topic/key use:
/// lower-case, spaces to underscores. Idempotent, and deliberately
/// nothing else -- other special characters pass through unchanged.
pub fn normalize(name: &str) -> String {
    name.replace(' ', "_").to_lowercase()
}

/// Flatten a diagnostics response into snapshots keyed by
/// `"{normalized_device}_{instance}"`.
///
/// Records sharing a device+instance pair merge into one snapshot;
/// within a cycle the last record wins for a repeated field.
pub fn flatten(records: &[DiagnosticRecord]) -> BTreeMap<String, DeviceSnapshot> {
    let mut devices: BTreeMap<String, DeviceSnapshot> = BTreeMap::new();

    for record in records {
        let key = format!("{}_{}", normalize(&record.device), record.instance);
        devices
            .entry(key)
            .or_default()
            .insert(normalize(&record.description), record.raw_value.clone());
    }

    devices
}

// ── Tests ───────────────────────────────────────────────────────────
